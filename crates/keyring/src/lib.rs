//! Key management core for Alephium wallets
//!
//! This crate provides:
//! - BIP-39 mnemonic generation, import and index encoding
//! - Password-based mnemonic encryption (current and legacy formats)
//! - BIP-32/BIP-44 derivation along `m/44'/1234'/0'/0/i`
//! - Address encoding and shard group assignment
//! - A [`Keyring`] caching derived addresses and signing with their keys
//! - Discovery of addresses that were used on chain

pub mod address;
pub mod config;
pub mod discovery;
pub mod error;
pub mod keyring;
pub mod keystore;
pub mod mnemonic;
pub mod secp256k1;
pub mod secure;

// Address exports
pub use address::{address_from_public_key, group_of_address, AddressData, DerivedAddress};

// Configuration exports
pub use config::KeyringConfig;

// Discovery exports
pub use discovery::{
    discover_active_addresses, AddressActivityChecker, DiscoveryOptions, DiscoveryReport,
};

// Error exports
pub use error::{KeyringError, KeyringResult};

// Keyring exports
pub use keyring::{DiscoveredAddresses, GenerateAddressRequest, Keyring};

// Keystore exports
pub use keystore::{
    decrypt_mnemonic, encrypt_mnemonic, DecryptedMnemonic, EncryptedMnemonic, KeystoreError,
    MnemonicVersion,
};

// Mnemonic exports
pub use mnemonic::{
    derive_address, derive_address_in_group, derive_master_key, Mnemonic, MnemonicError,
    DEFAULT_DERIVATION_PATH_PREFIX,
};

// Signing exports
pub use secp256k1::{hash_message, verify_signature, MessageHasher};

// Secure memory exports
pub use secrecy::ExposeSecret;
pub use secure::{IntoSecret, MasterKey, SecretArray, SecretBytes, SecretString};
