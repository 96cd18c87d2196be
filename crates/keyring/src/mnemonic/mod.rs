//! Mnemonic-based key generation and recovery
//!
//! This module provides BIP-39 mnemonic generation, parsing and index
//! encoding, and BIP-32 hierarchical deterministic (HD) derivation of
//! Alephium address key pairs.
//!
//! # Example
//!
//! ```rust
//! use alephium_keyring::mnemonic::{derive_address, derive_master_key, Mnemonic};
//!
//! let mnemonic = Mnemonic::generate(24).unwrap();
//! let master = derive_master_key(&mnemonic, None).unwrap();
//! let first = derive_address(&master, 0, 4).unwrap();
//! println!("first address: {}", first.hash());
//! ```
//!
//! # Security
//!
//! - Mnemonic phrases should be stored securely offline
//! - The same mnemonic will always produce the same keys
//! - An optional BIP-39 passphrase yields an entirely different key tree

mod codec;
mod derive;
mod error;

pub(crate) use derive::{validate_group, AddressBranch};
pub use codec::{word_index, Mnemonic, SUPPORTED_WORD_COUNTS, WORDLIST_SIZE};
pub use derive::{
    derivation_path, derive_address, derive_address_in_group, derive_master_key,
    ACCOUNT_INDEX, ALEPHIUM_COIN_TYPE, BIP44_PURPOSE, DEFAULT_DERIVATION_PATH_PREFIX,
    EXTERNAL_CHAIN, MAX_ADDRESS_INDEX,
};
pub use error::{MnemonicError, MnemonicResult};
