//! Hierarchical deterministic key derivation from mnemonic seeds
//!
//! Implements BIP-32 derivation along the BIP-44 path used by Alephium
//! wallets.
//!
//! # Derivation Path
//!
//! ```text
//! m / 44' / 1234' / 0' / 0 / address_index
//! ```
//!
//! Where:
//! - `44'` = BIP-44 purpose (hardened)
//! - `1234'` = Alephium coin type (hardened)
//! - `0'` = account (hardened)
//! - `0` = external chain (non-hardened)
//! - `address_index` = non-hardened, so at most `2^31 - 1`

use std::collections::HashSet;

use bip32::{ChildNumber, XPrv};
use zeroize::Zeroize;

use super::codec::Mnemonic;
use crate::address::{DerivedAddress, PRIVATE_KEY_LENGTH};
use crate::error::{KeyringError, KeyringResult};
use crate::secure::{MasterKey, SecretArray};

/// BIP-44 purpose
pub const BIP44_PURPOSE: u32 = 44;

/// Alephium coin type registered in SLIP-0044
pub const ALEPHIUM_COIN_TYPE: u32 = 1234;

/// Account level of the path
pub const ACCOUNT_INDEX: u32 = 0;

/// External (receiving) chain
pub const EXTERNAL_CHAIN: u32 = 0;

/// Largest non-hardened address index
pub const MAX_ADDRESS_INDEX: u32 = (1 << 31) - 1;

/// Path prefix shared by every address; the address index is appended
pub const DEFAULT_DERIVATION_PATH_PREFIX: &str = "m/44'/1234'/0'/0";

/// Full derivation path of an address index, e.g. `m/44'/1234'/0'/0/7`
pub fn derivation_path(address_index: u32) -> String {
    format!("{}/{}", DEFAULT_DERIVATION_PATH_PREFIX, address_index)
}

/// Derive the BIP-32 master key of a mnemonic
///
/// The intermediate seed is wiped before returning.
///
/// # Example
///
/// ```rust
/// use alephium_keyring::mnemonic::{derive_address, derive_master_key, Mnemonic};
///
/// let mnemonic = Mnemonic::from_phrase(
///     "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about"
/// ).unwrap();
/// let master = derive_master_key(&mnemonic, None).unwrap();
/// let address = derive_address(&master, 0, 4).unwrap();
/// assert_eq!(address.index(), 0);
/// ```
pub fn derive_master_key(
    mnemonic: &Mnemonic,
    passphrase: Option<&str>,
) -> KeyringResult<MasterKey> {
    let seed = mnemonic.to_seed(passphrase)?;
    MasterKey::from_seed(&seed)
}

/// Derive the key pair at `m/44'/1234'/0'/0/{address_index}`
///
/// # Errors
///
/// `InvalidPathIndex` if `address_index` exceeds [`MAX_ADDRESS_INDEX`]
pub fn derive_address(
    master: &MasterKey,
    address_index: u32,
    total_groups: u32,
) -> KeyringResult<DerivedAddress> {
    validate_address_index(address_index)?;
    AddressBranch::new(master, total_groups)?.derive(address_index)
}

/// Derive the first address (by increasing index, skipping `skip_indexes`)
/// that falls into `target_group`
///
/// # Errors
///
/// `InvalidGroup` if `target_group >= total_groups`
pub fn derive_address_in_group(
    master: &MasterKey,
    target_group: u32,
    skip_indexes: &[u32],
    total_groups: u32,
) -> KeyringResult<DerivedAddress> {
    let skip: HashSet<u32> = skip_indexes.iter().copied().collect();
    AddressBranch::new(master, total_groups)?.derive_in_group(target_group, &skip)
}

pub(crate) fn validate_address_index(address_index: u32) -> KeyringResult<()> {
    if address_index > MAX_ADDRESS_INDEX {
        return Err(KeyringError::InvalidPathIndex(address_index));
    }
    Ok(())
}

pub(crate) fn validate_group(group: u32, total_groups: u32) -> KeyringResult<()> {
    if group >= total_groups {
        return Err(KeyringError::InvalidGroup {
            group,
            total_groups,
        });
    }
    Ok(())
}

/// The `m/44'/1234'/0'/0` node, derived once and reused for every address
/// index below it
pub(crate) struct AddressBranch {
    node: XPrv,
    total_groups: u32,
}

impl AddressBranch {
    pub(crate) fn new(master: &MasterKey, total_groups: u32) -> KeyringResult<Self> {
        let path = [
            hardened(BIP44_PURPOSE)?,
            hardened(ALEPHIUM_COIN_TYPE)?,
            hardened(ACCOUNT_INDEX)?,
            normal(EXTERNAL_CHAIN)?,
        ];
        Ok(Self {
            node: master.derive(&path)?,
            total_groups,
        })
    }

    pub(crate) fn derive(&self, address_index: u32) -> KeyringResult<DerivedAddress> {
        validate_address_index(address_index)?;

        let child = self
            .node
            .derive_child(normal(address_index)?)
            .map_err(|e| KeyringError::DerivationFailed(e.to_string()))?;

        let mut private_bytes = child.to_bytes();
        let private_key = SecretArray::<PRIVATE_KEY_LENGTH>::new(private_bytes);
        private_bytes.zeroize();

        let public_key = child.public_key().to_bytes();

        Ok(DerivedAddress::new(
            address_index,
            public_key,
            private_key,
            self.total_groups,
        ))
    }

    pub(crate) fn derive_in_group(
        &self,
        target_group: u32,
        skip_indexes: &HashSet<u32>,
    ) -> KeyringResult<DerivedAddress> {
        validate_group(target_group, self.total_groups)?;

        for index in (0..=MAX_ADDRESS_INDEX).filter(|i| !skip_indexes.contains(i)) {
            let candidate = self.derive(index)?;
            if candidate.group() == target_group {
                return Ok(candidate);
            }
        }

        Err(KeyringError::DerivationFailed(format!(
            "no address index left in group {}",
            target_group
        )))
    }
}

fn hardened(index: u32) -> KeyringResult<ChildNumber> {
    ChildNumber::new(index, true).map_err(|e| KeyringError::DerivationFailed(e.to_string()))
}

fn normal(index: u32) -> KeyringResult<ChildNumber> {
    ChildNumber::new(index, false).map_err(|_| KeyringError::InvalidPathIndex(index))
}

#[cfg(test)]
mod tests {
    use super::*;

    // Standard test mnemonic (DO NOT USE IN PRODUCTION)
    const TEST_MNEMONIC: &str =
        "abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon abandon about";

    fn master() -> MasterKey {
        let mnemonic = Mnemonic::from_phrase(TEST_MNEMONIC).unwrap();
        derive_master_key(&mnemonic, None).unwrap()
    }

    #[test]
    fn test_derivation_path() {
        assert_eq!(derivation_path(0), "m/44'/1234'/0'/0/0");
        assert_eq!(derivation_path(42), "m/44'/1234'/0'/0/42");
    }

    #[test]
    fn test_deterministic_derivation() {
        let a = derive_address(&master(), 3, 4).unwrap();
        let b = derive_address(&master(), 3, 4).unwrap();

        assert_eq!(a.hash(), b.hash());
        assert_eq!(a.public_key(), b.public_key());
        assert_eq!(
            a.private_key().expose_secret(),
            b.private_key().expose_secret()
        );
    }

    #[test]
    fn test_different_indexes_different_keys() {
        let master = master();
        let a = derive_address(&master, 0, 4).unwrap();
        let b = derive_address(&master, 1, 4).unwrap();
        assert_ne!(a.hash(), b.hash());
        assert_ne!(a.public_key(), b.public_key());
    }

    #[test]
    fn test_passphrase_changes_keys() {
        let mnemonic = Mnemonic::from_phrase(TEST_MNEMONIC).unwrap();
        let plain = derive_master_key(&mnemonic, None).unwrap();
        let salted = derive_master_key(&mnemonic, Some("extra")).unwrap();

        assert_ne!(
            derive_address(&plain, 0, 4).unwrap().hash(),
            derive_address(&salted, 0, 4).unwrap().hash()
        );
    }

    #[test]
    fn test_max_index_boundary() {
        let master = master();
        assert!(derive_address(&master, MAX_ADDRESS_INDEX, 4).is_ok());
        assert!(matches!(
            derive_address(&master, MAX_ADDRESS_INDEX + 1, 4),
            Err(KeyringError::InvalidPathIndex(i)) if i == MAX_ADDRESS_INDEX + 1
        ));
    }

    #[test]
    fn test_derive_in_group_lands_in_group() {
        let master = master();
        for group in 0..4 {
            let address = derive_address_in_group(&master, group, &[], 4).unwrap();
            assert_eq!(address.group(), group);
        }
    }

    #[test]
    fn test_derive_in_group_returns_lowest_matching_index() {
        let master = master();
        let found = derive_address_in_group(&master, 1, &[], 4).unwrap();
        for index in 0..found.index() {
            assert_ne!(derive_address(&master, index, 4).unwrap().group(), 1);
        }
    }

    #[test]
    fn test_derive_in_group_respects_skip_list() {
        let master = master();
        let first = derive_address_in_group(&master, 2, &[], 4).unwrap();
        let second = derive_address_in_group(&master, 2, &[first.index()], 4).unwrap();

        assert_eq!(second.group(), 2);
        assert!(second.index() > first.index());
    }

    #[test]
    fn test_derive_in_group_invalid_group() {
        assert!(matches!(
            derive_address_in_group(&master(), 4, &[], 4),
            Err(KeyringError::InvalidGroup {
                group: 4,
                total_groups: 4
            })
        ));
    }

    #[test]
    fn test_single_group_configuration() {
        let address = derive_address_in_group(&master(), 0, &[], 1).unwrap();
        assert_eq!(address.index(), 0);
        assert_eq!(address.group(), 0);
    }
}
