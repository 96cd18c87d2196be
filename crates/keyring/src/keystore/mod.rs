//! Password-based encryption of mnemonics
//!
//! Mnemonics are encrypted at rest with a key stretched from the user's
//! password:
//!
//! - PBKDF2-HMAC-SHA256 key derivation, iteration count stored in the blob
//! - AES-256-GCM authenticated encryption
//! - Versioned JSON container, with the legacy format still decryptable
//!
//! # Security Properties
//!
//! - A wrong password or any tampering fails GCM authentication
//! - Authentication failures surface as a single `DecryptionFailed` kind
//! - Salt and nonce are fresh for every encryption
//!
//! # Example
//!
//! ```rust
//! use alephium_keyring::keystore::{
//!     decrypt_mnemonic, encrypt_mnemonic, EncryptedMnemonic, MnemonicVersion,
//! };
//! use alephium_keyring::mnemonic::Mnemonic;
//!
//! let mnemonic = Mnemonic::generate(12).unwrap();
//! let blob = encrypt_mnemonic(&mnemonic, "my-strong-password").unwrap();
//! let json = blob.to_json().unwrap();
//!
//! let loaded = EncryptedMnemonic::from_json(&json).unwrap();
//! let decrypted = decrypt_mnemonic(&loaded, "my-strong-password").unwrap();
//! assert_eq!(decrypted.version, MnemonicVersion::Current);
//! assert_eq!(decrypted.mnemonic.indices(), mnemonic.indices());
//! ```

mod cipher;
mod encrypted;
mod error;
mod kdf;

pub use cipher::{
    decrypt_secret, encrypt_secret, generate_iv, IV_LENGTH, LEGACY_IV_LENGTH, TAG_LENGTH,
};
#[cfg(test)]
pub(crate) use encrypted::{encrypt_legacy_for_test, encrypt_with_test_iterations};
pub use encrypted::{
    decrypt_mnemonic, encrypt_mnemonic, encrypt_mnemonic_with_iterations, DecryptedMnemonic,
    EncryptedMnemonic, EncryptedMnemonicV2, LegacyEncryptedMnemonic, MnemonicVersion,
    CURRENT_VERSION, LEGACY_VERSION,
};
pub use error::{KeystoreError, KeystoreResult};
pub use kdf::{
    generate_salt, pbkdf2_derive_key, KeyMetadata, LEGACY_PBKDF2_ITERATIONS, MAX_PBKDF2_ITERATIONS,
    PBKDF2_ITERATIONS, PBKDF2_SHA256, SALT_LENGTH,
};
