//! Error types for mnemonic operations

use thiserror::Error;

/// Result type for mnemonic operations
pub type MnemonicResult<T> = Result<T, MnemonicError>;

/// Errors that can occur while generating, parsing or encoding mnemonics
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MnemonicError {
    /// Only 12 and 24 word mnemonics are supported
    #[error("invalid word count: {0} (must be 12 or 24)")]
    InvalidWordCount(usize),

    /// Word is not in the English BIP-39 wordlist
    #[error("unknown word at position {position}")]
    UnknownWord {
        /// Zero-based position of the offending word
        position: usize,
    },

    /// Word index outside `[0, 2047]`
    #[error("word index {0} out of range")]
    IndexOutOfRange(u16),

    /// Embedded checksum bits do not match the entropy
    #[error("checksum mismatch")]
    InvalidChecksum,

    /// Byte encoding of the index array has the wrong length
    #[error("invalid index encoding: {0}")]
    InvalidEncoding(String),
}

impl From<bip39::Error> for MnemonicError {
    fn from(err: bip39::Error) -> Self {
        match err {
            bip39::Error::BadWordCount(count) => MnemonicError::InvalidWordCount(count),
            bip39::Error::UnknownWord(position) => MnemonicError::UnknownWord { position },
            bip39::Error::InvalidChecksum => MnemonicError::InvalidChecksum,
            other => MnemonicError::InvalidEncoding(other.to_string()),
        }
    }
}
