//! Versioned encrypted mnemonic blobs
//!
//! Two JSON shapes are accepted:
//!
//! ```text
//! version 2: {"version":2,"ciphertext","iv","salt","keyMetadata":{"algorithm","iterations"}}
//! version 1: {"salt","iv","encrypted","version":1}
//! ```
//!
//! Only version 2 is ever written. Version 1 carries the phrase as UTF-8
//! text and an implicit iteration count; it is decrypted for migration.

use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::cipher::{decrypt_legacy, decrypt_secret, encrypt_secret, generate_iv};
use super::error::{KeystoreError, KeystoreResult};
use super::kdf::{
    generate_salt, pbkdf2_derive_key, KeyMetadata, LEGACY_PBKDF2_ITERATIONS, PBKDF2_ITERATIONS,
};
use crate::mnemonic::Mnemonic;

/// Version number written by [`encrypt_mnemonic`]
pub const CURRENT_VERSION: u8 = 2;

/// Version number of legacy blobs
pub const LEGACY_VERSION: u8 = 1;

/// Version of a decrypted blob
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MnemonicVersion {
    /// Version 1: phrase text, implicit KDF parameters
    Legacy,
    /// Version 2: index bytes, explicit KDF metadata
    Current,
}

impl MnemonicVersion {
    /// Numeric version as stored in the blob
    pub fn number(self) -> u8 {
        match self {
            MnemonicVersion::Legacy => LEGACY_VERSION,
            MnemonicVersion::Current => CURRENT_VERSION,
        }
    }

    /// Whether the caller should re-encrypt into the current format
    pub fn needs_migration(self) -> bool {
        matches!(self, MnemonicVersion::Legacy)
    }
}

/// An encrypted mnemonic in either supported format
///
/// The variant is picked from the JSON field names when deserializing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum EncryptedMnemonic {
    /// Version 2
    Current(EncryptedMnemonicV2),
    /// Version 1
    Legacy(LegacyEncryptedMnemonic),
}

/// Version 2 blob; byte fields are hex
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct EncryptedMnemonicV2 {
    /// Always 2
    pub version: u8,
    /// AES-256-GCM ciphertext with tag appended
    pub ciphertext: String,
    /// 12-byte nonce
    pub iv: String,
    /// PBKDF2 salt
    pub salt: String,
    /// KDF algorithm and parameters
    pub key_metadata: KeyMetadata,
}

/// Version 1 blob; byte fields are hex
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LegacyEncryptedMnemonic {
    /// PBKDF2 salt
    pub salt: String,
    /// 64-byte GCM IV
    pub iv: String,
    /// Ciphertext with tag appended
    pub encrypted: String,
    /// Absent in the earliest blobs
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<u8>,
}

/// Result of [`decrypt_mnemonic`]
#[derive(Debug)]
pub struct DecryptedMnemonic {
    /// The recovered mnemonic
    pub mnemonic: Mnemonic,
    /// Format the blob was stored in
    pub version: MnemonicVersion,
}

impl EncryptedMnemonic {
    /// Parse a blob from JSON
    ///
    /// # Errors
    ///
    /// `MalformedBlob` if the JSON matches neither format
    pub fn from_json(json: &str) -> KeystoreResult<Self> {
        serde_json::from_str(json).map_err(|e| KeystoreError::MalformedBlob(e.to_string()))
    }

    /// Serialize to compact JSON
    pub fn to_json(&self) -> KeystoreResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Format of this blob
    pub fn version(&self) -> MnemonicVersion {
        match self {
            EncryptedMnemonic::Current(_) => MnemonicVersion::Current,
            EncryptedMnemonic::Legacy(_) => MnemonicVersion::Legacy,
        }
    }
}

/// Encrypt a mnemonic into a version 2 blob with the default iteration count
pub fn encrypt_mnemonic(mnemonic: &Mnemonic, password: &str) -> KeystoreResult<EncryptedMnemonic> {
    encrypt_mnemonic_with_iterations(mnemonic, password, PBKDF2_ITERATIONS)
}

/// Encrypt a mnemonic into a version 2 blob
///
/// # Arguments
///
/// * `mnemonic` - Mnemonic to encrypt; its little-endian index bytes are the plaintext
/// * `password` - Password for PBKDF2
/// * `iterations` - PBKDF2 iteration count, recorded in the blob
///
/// A fresh salt and nonce are drawn for every call.
///
/// # Errors
///
/// `InvalidKdfParams` if `iterations` is below [`PBKDF2_ITERATIONS`]. Blobs
/// with lower counts are still decrypted.
pub fn encrypt_mnemonic_with_iterations(
    mnemonic: &Mnemonic,
    password: &str,
    iterations: u32,
) -> KeystoreResult<EncryptedMnemonic> {
    if iterations < PBKDF2_ITERATIONS {
        return Err(KeystoreError::InvalidKdfParams(format!(
            "encryption needs at least {} iterations, got {}",
            PBKDF2_ITERATIONS, iterations
        )));
    }
    encrypt_with_metadata(mnemonic, password, KeyMetadata::pbkdf2_sha256(iterations))
}

/// Encrypt with a cheap iteration count, for tests only
#[cfg(test)]
pub(crate) fn encrypt_with_test_iterations(
    mnemonic: &Mnemonic,
    password: &str,
    iterations: u32,
) -> KeystoreResult<EncryptedMnemonic> {
    encrypt_with_metadata(mnemonic, password, KeyMetadata::pbkdf2_sha256(iterations))
}

fn encrypt_with_metadata(
    mnemonic: &Mnemonic,
    password: &str,
    key_metadata: KeyMetadata,
) -> KeystoreResult<EncryptedMnemonic> {
    key_metadata.validate()?;
    let iterations = key_metadata.iterations;

    let salt = generate_salt();
    let iv = generate_iv();

    let key = key_metadata.derive_key(password, &salt)?;
    let plaintext = mnemonic.to_bytes();
    let ciphertext = encrypt_secret(plaintext.expose_secret(), &key, &iv)?;

    debug!(iterations, word_count = mnemonic.word_count(), "Encrypted mnemonic");

    Ok(EncryptedMnemonic::Current(EncryptedMnemonicV2 {
        version: CURRENT_VERSION,
        ciphertext: hex::encode(ciphertext),
        iv: hex::encode(iv),
        salt: hex::encode(salt),
        key_metadata,
    }))
}

/// Decrypt a blob of either version
///
/// # Errors
///
/// - `DecryptionFailed` for a wrong password, tampered ciphertext, or an
///   authenticated payload that does not decode to a valid mnemonic
/// - `MalformedBlob` / `UnsupportedKdf` / `InvalidKdfParams` when the blob's
///   own fields are unusable, which is detectable without the password
pub fn decrypt_mnemonic(
    blob: &EncryptedMnemonic,
    password: &str,
) -> KeystoreResult<DecryptedMnemonic> {
    let version = blob.version();
    debug!(version = version.number(), "Decrypting mnemonic");

    let mnemonic = match blob {
        EncryptedMnemonic::Current(blob) => decrypt_current(blob, password)?,
        EncryptedMnemonic::Legacy(blob) => decrypt_legacy_blob(blob, password)?,
    };

    Ok(DecryptedMnemonic { mnemonic, version })
}

fn decrypt_current(blob: &EncryptedMnemonicV2, password: &str) -> KeystoreResult<Mnemonic> {
    if blob.version != CURRENT_VERSION {
        return Err(KeystoreError::MalformedBlob(format!(
            "unexpected version {} for current format",
            blob.version
        )));
    }
    blob.key_metadata.validate()?;

    let salt = decode_field("salt", &blob.salt)?;
    let iv = decode_field("iv", &blob.iv)?;
    let ciphertext = decode_field("ciphertext", &blob.ciphertext)?;

    let key = blob.key_metadata.derive_key(password, &salt)?;
    let plaintext = decrypt_secret(&ciphertext, &key, &iv)?;

    Mnemonic::from_bytes(plaintext.expose_secret()).map_err(|_| KeystoreError::DecryptionFailed)
}

fn decrypt_legacy_blob(blob: &LegacyEncryptedMnemonic, password: &str) -> KeystoreResult<Mnemonic> {
    if let Some(version) = blob.version.filter(|v| *v != LEGACY_VERSION) {
        return Err(KeystoreError::MalformedBlob(format!(
            "unexpected version {} for legacy format",
            version
        )));
    }

    let salt = decode_field("salt", &blob.salt)?;
    let iv = decode_field("iv", &blob.iv)?;
    let ciphertext = decode_field("encrypted", &blob.encrypted)?;

    let key = pbkdf2_derive_key(password, &salt, LEGACY_PBKDF2_ITERATIONS);
    let plaintext = decrypt_legacy(&ciphertext, &key, &iv)?;

    let phrase = std::str::from_utf8(plaintext.expose_secret())
        .map_err(|_| KeystoreError::DecryptionFailed)?;
    Mnemonic::from_phrase(phrase).map_err(|_| KeystoreError::DecryptionFailed)
}

fn decode_field(name: &str, value: &str) -> KeystoreResult<Vec<u8>> {
    hex::decode(value)
        .map_err(|e| KeystoreError::MalformedBlob(format!("invalid {} hex: {}", name, e)))
}

/// Build a version 1 blob, for migration tests
#[cfg(test)]
pub(crate) fn encrypt_legacy_for_test(phrase: &str, password: &str) -> LegacyEncryptedMnemonic {
    use super::cipher::{encrypt_legacy, LEGACY_IV_LENGTH};
    use rand::RngCore;

    let mut salt = [0u8; 64];
    let mut iv = [0u8; LEGACY_IV_LENGTH];
    rand::thread_rng().fill_bytes(&mut salt);
    rand::thread_rng().fill_bytes(&mut iv);

    let key = pbkdf2_derive_key(password, &salt, LEGACY_PBKDF2_ITERATIONS);
    let encrypted = encrypt_legacy(phrase.as_bytes(), &key, &iv).unwrap();

    LegacyEncryptedMnemonic {
        salt: hex::encode(salt),
        iv: hex::encode(iv),
        encrypted: hex::encode(encrypted),
        version: Some(LEGACY_VERSION),
    }
}
