//! Address encoding and shard group assignment
//!
//! A P2PKH address is the base58 encoding of `0x00 || blake2b-256(pubkey)`
//! where `pubkey` is the 33-byte compressed secp256k1 public key.
//!
//! The group an address belongs to is a pure function of the 32-byte key
//! hash: a 32-bit djb2 hash with the low bit forced, folded to one byte by
//! xoring its four bytes, modulo the number of groups.

use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use serde::{Deserialize, Serialize};

use crate::error::{KeyringError, KeyringResult};
use crate::secure::SecretArray;

/// Address type byte for pay-to-public-key-hash
pub const P2PKH_PREFIX: u8 = 0x00;

/// Length of a compressed secp256k1 public key
pub const PUBLIC_KEY_LENGTH: usize = 33;

/// Length of a secp256k1 private scalar
pub const PRIVATE_KEY_LENGTH: usize = 32;

/// Length of the blake2b key hash embedded in an address
pub const KEY_HASH_LENGTH: usize = 32;

type Blake2b256 = Blake2b<U32>;

/// blake2b with a 32-byte output
pub fn blake2b256(data: &[u8]) -> [u8; 32] {
    Blake2b256::digest(data).into()
}

/// Hash of a compressed public key as embedded in its address
pub fn public_key_hash(public_key: &[u8; PUBLIC_KEY_LENGTH]) -> [u8; KEY_HASH_LENGTH] {
    blake2b256(public_key)
}

/// Base58 P2PKH address of a compressed public key
pub fn address_from_public_key(public_key: &[u8; PUBLIC_KEY_LENGTH]) -> String {
    let mut raw = Vec::with_capacity(1 + KEY_HASH_LENGTH);
    raw.push(P2PKH_PREFIX);
    raw.extend_from_slice(&public_key_hash(public_key));
    bs58::encode(raw).into_string()
}

/// Group of a P2PKH key hash
///
/// `total_groups` must be non-zero.
pub fn group_of_key_hash(key_hash: &[u8], total_groups: u32) -> u32 {
    debug_assert!(total_groups > 0, "total_groups must be non-zero");
    let hint = djb2(key_hash) | 1;
    xor_bytes(hint) % total_groups.max(1)
}

/// Group of a base58 P2PKH address
pub fn group_of_address(address: &str, total_groups: u32) -> KeyringResult<u32> {
    let raw = bs58::decode(address)
        .into_vec()
        .map_err(|e| KeyringError::InvalidAddress(e.to_string()))?;

    match raw.split_first() {
        Some((&P2PKH_PREFIX, key_hash)) if key_hash.len() == KEY_HASH_LENGTH => {
            Ok(group_of_key_hash(key_hash, total_groups))
        }
        Some((&P2PKH_PREFIX, key_hash)) => Err(KeyringError::InvalidAddress(format!(
            "expected {} byte key hash, got {}",
            KEY_HASH_LENGTH,
            key_hash.len()
        ))),
        Some((prefix, _)) => Err(KeyringError::InvalidAddress(format!(
            "unsupported address type {prefix:#04x}"
        ))),
        None => Err(KeyringError::InvalidAddress("empty address".to_string())),
    }
}

/// 32-bit djb2 (`hash * 33 + byte`, wrapping)
fn djb2(bytes: &[u8]) -> u32 {
    bytes.iter().fold(5381u32, |hash, &b| {
        (hash << 5).wrapping_add(hash).wrapping_add(u32::from(b))
    })
}

fn xor_bytes(value: u32) -> u32 {
    let [b0, b1, b2, b3] = value.to_be_bytes();
    u32::from(b0 ^ b1 ^ b2 ^ b3)
}

/// A key pair derived at one address index, with its address and group
///
/// Created by the keyring (or discovery) and owned by it. The private key is
/// only reachable from inside the crate, through the export and signing
/// APIs, and is wiped on drop.
pub struct DerivedAddress {
    index: u32,
    group: u32,
    hash: String,
    public_key: [u8; PUBLIC_KEY_LENGTH],
    private_key: SecretArray<PRIVATE_KEY_LENGTH>,
}

impl DerivedAddress {
    pub(crate) fn new(
        index: u32,
        public_key: [u8; PUBLIC_KEY_LENGTH],
        private_key: SecretArray<PRIVATE_KEY_LENGTH>,
        total_groups: u32,
    ) -> Self {
        let key_hash = public_key_hash(&public_key);
        let group = group_of_key_hash(&key_hash, total_groups);
        Self {
            index,
            group,
            hash: address_from_public_key(&public_key),
            public_key,
            private_key,
        }
    }

    /// Derivation index (last path component)
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Shard group of the address
    pub fn group(&self) -> u32 {
        self.group
    }

    /// Base58 address
    pub fn hash(&self) -> &str {
        &self.hash
    }

    /// Compressed public key
    pub fn public_key(&self) -> &[u8; PUBLIC_KEY_LENGTH] {
        &self.public_key
    }

    pub(crate) fn private_key(&self) -> &SecretArray<PRIVATE_KEY_LENGTH> {
        &self.private_key
    }

    /// Overwrite the private key in place
    pub(crate) fn wipe(&mut self) {
        zeroize::Zeroize::zeroize(&mut self.private_key);
    }

    /// Non-sensitive view for callers outside the crate
    pub fn to_address_data(&self) -> AddressData {
        AddressData {
            index: self.index,
            group: self.group,
            hash: self.hash.clone(),
            public_key: hex::encode(self.public_key),
        }
    }
}

impl std::fmt::Debug for DerivedAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DerivedAddress")
            .field("index", &self.index)
            .field("group", &self.group)
            .field("hash", &self.hash)
            .field("private_key", &"[REDACTED]")
            .finish()
    }
}

/// Public part of a derived address, safe to hand to UI code and persist
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddressData {
    /// Derivation index
    pub index: u32,
    /// Shard group
    pub group: u32,
    /// Base58 address
    pub hash: String,
    /// Compressed public key as hex
    pub public_key: String,
}
