//! AES-256-GCM cipher for mnemonic encryption
//!
//! Current blobs use the standard 12-byte nonce. Legacy blobs were written
//! with a 64-byte IV, which GCM accepts by GHASH-ing the IV into the initial
//! counter block, so they need a separate cipher instantiation.

use aes_gcm::aead::consts::U64;
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::aes::Aes256;
use aes_gcm::{Aes256Gcm, AesGcm, Nonce};

use super::error::{KeystoreError, KeystoreResult};
use super::kdf::DERIVED_KEY_LENGTH;
use crate::secure::{IntoSecret, SecretArray, SecretBytes};

/// Nonce length of current blobs
pub const IV_LENGTH: usize = 12;

/// IV length of legacy blobs
pub const LEGACY_IV_LENGTH: usize = 64;

/// GCM authentication tag length, appended to the ciphertext
pub const TAG_LENGTH: usize = 16;

type LegacyAes256Gcm = AesGcm<Aes256, U64>;

/// Encrypt `plaintext` with AES-256-GCM
///
/// # Arguments
///
/// * `plaintext` - The secret data to encrypt
/// * `key` - 32-byte key from the KDF
/// * `iv` - 12-byte nonce, never reused with the same key
///
/// # Returns
///
/// Ciphertext with the 16-byte tag appended
pub fn encrypt_secret(
    plaintext: &[u8],
    key: &SecretArray<DERIVED_KEY_LENGTH>,
    iv: &[u8; IV_LENGTH],
) -> KeystoreResult<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(key.expose_secret())
        .map_err(|e| KeystoreError::CipherError(e.to_string()))?;

    cipher
        .encrypt(Nonce::from_slice(iv), plaintext)
        .map_err(|_| KeystoreError::CipherError("AES-GCM encryption failed".to_string()))
}

/// Decrypt and authenticate AES-256-GCM ciphertext
///
/// Any failure, including a wrong IV length, is reported as
/// [`KeystoreError::DecryptionFailed`].
pub fn decrypt_secret(
    ciphertext: &[u8],
    key: &SecretArray<DERIVED_KEY_LENGTH>,
    iv: &[u8],
) -> KeystoreResult<SecretBytes> {
    if iv.len() != IV_LENGTH {
        return Err(KeystoreError::DecryptionFailed);
    }

    let cipher = Aes256Gcm::new_from_slice(key.expose_secret())
        .map_err(|_| KeystoreError::DecryptionFailed)?;

    cipher
        .decrypt(Nonce::from_slice(iv), ciphertext)
        .map(IntoSecret::into_secret)
        .map_err(|_| KeystoreError::DecryptionFailed)
}

/// Decrypt a legacy blob payload (64-byte IV)
pub(crate) fn decrypt_legacy(
    ciphertext: &[u8],
    key: &SecretArray<DERIVED_KEY_LENGTH>,
    iv: &[u8],
) -> KeystoreResult<SecretBytes> {
    if iv.len() != LEGACY_IV_LENGTH {
        return Err(KeystoreError::DecryptionFailed);
    }

    let cipher = LegacyAes256Gcm::new_from_slice(key.expose_secret())
        .map_err(|_| KeystoreError::DecryptionFailed)?;

    cipher
        .decrypt(Nonce::<U64>::from_slice(iv), ciphertext)
        .map(IntoSecret::into_secret)
        .map_err(|_| KeystoreError::DecryptionFailed)
}

/// Legacy encryption, only needed to produce fixtures
#[cfg(test)]
pub(crate) fn encrypt_legacy(
    plaintext: &[u8],
    key: &SecretArray<DERIVED_KEY_LENGTH>,
    iv: &[u8; LEGACY_IV_LENGTH],
) -> KeystoreResult<Vec<u8>> {
    let cipher = LegacyAes256Gcm::new_from_slice(key.expose_secret())
        .map_err(|e| KeystoreError::CipherError(e.to_string()))?;

    cipher
        .encrypt(Nonce::<U64>::from_slice(iv), plaintext)
        .map_err(|_| KeystoreError::CipherError("AES-GCM encryption failed".to_string()))
}

/// Generate a random nonce
pub fn generate_iv() -> [u8; IV_LENGTH] {
    use rand::RngCore;
    let mut iv = [0u8; IV_LENGTH];
    rand::thread_rng().fill_bytes(&mut iv);
    iv
}
