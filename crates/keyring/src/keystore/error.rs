//! Keystore error types

use thiserror::Error;

/// Errors that can occur while encrypting or decrypting a mnemonic
#[derive(Error, Debug)]
pub enum KeystoreError {
    /// Authentication failed: wrong password, tampered ciphertext, or an
    /// authenticated payload that is not a valid mnemonic. Deliberately
    /// carries no detail.
    #[error("failed to decrypt mnemonic")]
    DecryptionFailed,

    /// Blob does not have the shape of any known version
    #[error("malformed encrypted mnemonic: {0}")]
    MalformedBlob(String),

    /// Key derivation algorithm named in the blob is not supported
    #[error("unsupported key derivation function: {0}")]
    UnsupportedKdf(String),

    /// KDF parameters out of range
    #[error("invalid KDF parameters: {0}")]
    InvalidKdfParams(String),

    /// Encryption failed
    #[error("cipher operation failed: {0}")]
    CipherError(String),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for keystore operations
pub type KeystoreResult<T> = Result<T, KeystoreError>;
