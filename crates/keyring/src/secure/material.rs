//! Root key container with automatic memory zeroing
//!
//! `MasterKey` holds the BIP32 root derived from a mnemonic seed. It ensures
//! that:
//! - The private scalar is wiped when the struct is dropped (k256 secret keys
//!   zeroize themselves on drop)
//! - Debug output doesn't expose key material
//! - The struct cannot be accidentally cloned

use bip32::{ChildNumber, XPrv};

use super::secret::SecretArray;
use crate::error::{KeyringError, KeyringResult};

/// Size of a BIP39 seed in bytes
pub const SEED_SIZE: usize = 64;

/// BIP32 extended private key at the root of a wallet's key tree.
///
/// Only the keyring (and discovery, through a borrowed reference) ever touch
/// this value. It is never serialized.
///
/// This struct intentionally does NOT implement `Clone`.
pub struct MasterKey {
    root: XPrv,
}

impl MasterKey {
    /// Standard BIP32 master key generation from a 64-byte seed.
    pub fn from_seed(seed: &SecretArray<SEED_SIZE>) -> KeyringResult<Self> {
        let root = XPrv::new(seed.expose_secret())
            .map_err(|e| KeyringError::DerivationFailed(e.to_string()))?;
        Ok(Self { root })
    }

    /// Walk `path` from the root, one child at a time.
    pub(crate) fn derive(&self, path: &[ChildNumber]) -> KeyringResult<XPrv> {
        let mut node = self.root.clone();
        for child in path {
            node = node
                .derive_child(*child)
                .map_err(|e| KeyringError::DerivationFailed(e.to_string()))?;
        }
        Ok(node)
    }
}

impl std::fmt::Debug for MasterKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasterKey")
            .field("depth", &self.root.attrs().depth)
            .field("key", &"[REDACTED]")
            .finish()
    }
}

// Explicitly NOT implementing Clone to prevent accidental copies
// impl Clone for MasterKey { ... } - NOT IMPLEMENTED
