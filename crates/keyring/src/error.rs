//! Keyring error types

use thiserror::Error;

use crate::keystore::KeystoreError;
use crate::mnemonic::MnemonicError;

/// Result type for keyring operations
pub type KeyringResult<T> = Result<T, KeyringError>;

/// Errors that can occur during keyring operations
///
/// Every failing operation leaves the keyring in the state it was in before
/// the call.
#[derive(Error, Debug)]
pub enum KeyringError {
    /// Mnemonic failed wordlist, length or checksum validation
    #[error("invalid mnemonic: {0}")]
    InvalidMnemonic(#[from] MnemonicError),

    /// A mnemonic is already loaded; `clear()` must be called first
    #[error("keyring is already initialized, clear it before loading another mnemonic")]
    AlreadyInitialized,

    /// Operation requires a loaded mnemonic
    #[error("keyring is not initialized")]
    NotInitialized,

    /// Bad combination or range of request arguments
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    /// Address index beyond the non-hardened range
    #[error("invalid derivation path index: {0}")]
    InvalidPathIndex(u32),

    /// Group outside `[0, total_groups)`
    #[error("invalid group {group}, must be below {total_groups}")]
    InvalidGroup {
        /// Requested group
        group: u32,
        /// Configured number of groups
        total_groups: u32,
    },

    /// No cached key pair for this address
    #[error("address not cached: {0}")]
    AddressNotCached(String),

    /// Wrong password or tampered ciphertext
    #[error("failed to decrypt mnemonic")]
    DecryptionFailed,

    /// Encrypted mnemonic blob could not be interpreted
    #[error("encrypted mnemonic error: {0}")]
    EncryptedMnemonic(KeystoreError),

    /// Address string is not a valid P2PKH address
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// BIP32 derivation failure
    #[error("key derivation failed: {0}")]
    DerivationFailed(String),

    /// ECDSA signing or signature parsing failure
    #[error("signing failed: {0}")]
    SigningFailed(String),

    /// Network activity checker failed or misbehaved
    #[error("address activity check failed: {0}")]
    ActivityCheck(#[source] anyhow::Error),

    /// Configuration failed validation
    #[error("invalid keyring configuration: {0}")]
    InvalidConfig(String),
}

impl From<KeystoreError> for KeyringError {
    fn from(err: KeystoreError) -> Self {
        match err {
            KeystoreError::DecryptionFailed => KeyringError::DecryptionFailed,
            other => KeyringError::EncryptedMnemonic(other),
        }
    }
}
