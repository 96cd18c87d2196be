//! The Alephium keyring
//!
//! A [`Keyring`] holds at most one wallet: the BIP-32 master key of a
//! mnemonic and the addresses derived from it so far. It is either empty or
//! active; loading a second mnemonic requires an explicit [`Keyring::clear`]
//! so keys are never replaced silently.
//!
//! # Example
//!
//! ```rust
//! use alephium_keyring::{GenerateAddressRequest, Keyring, MessageHasher};
//!
//! let mut keyring = Keyring::new();
//! let mnemonic = keyring.generate_random_mnemonic(24, None).unwrap();
//! assert_eq!(mnemonic.word_count(), 24);
//!
//! let address = keyring
//!     .generate_and_cache_address(&GenerateAddressRequest::in_group(0))
//!     .unwrap();
//! assert_eq!(address.group, 0);
//!
//! let signature = keyring
//!     .sign_message("hello", MessageHasher::Alephium, &address.hash)
//!     .unwrap();
//! assert_eq!(signature.len(), 128);
//!
//! keyring.clear();
//! assert!(!keyring.is_initialized());
//! ```
//!
//! # Thread Safety
//!
//! A `Keyring` is not synchronized. State transitions take `&mut self`, so
//! sharing one across tasks requires wrapping it in a lock; concurrent
//! `generate_random_mnemonic` and `clear` calls must be serialized by the
//! caller.

mod request;

use std::collections::{BTreeMap, HashSet};

use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

pub use request::GenerateAddressRequest;

use crate::address::{AddressData, DerivedAddress};
use crate::config::KeyringConfig;
use crate::discovery::{discover_in_branch, AddressActivityChecker, DiscoveryOptions};
use crate::error::{KeyringError, KeyringResult};
use crate::keystore::{
    decrypt_mnemonic, encrypt_mnemonic_with_iterations, EncryptedMnemonic, MnemonicVersion,
};
use crate::mnemonic::{
    derive_master_key, validate_group, AddressBranch, Mnemonic, MAX_ADDRESS_INDEX,
};
use crate::secp256k1::{hash_message, parse_hash_hex, sign_hash, MessageHasher, HASH_LENGTH};
use crate::secure::{IntoSecret, MasterKey, SecretString};

/// In-memory wallet keyring
///
/// See the [module documentation](self) for the lifecycle.
pub struct Keyring {
    config: KeyringConfig,
    state: KeyringState,
}

enum KeyringState {
    Empty,
    Active(ActiveWallet),
}

struct ActiveWallet {
    // Kept for the lifetime of the wallet; addresses are derived through `branch`
    _master: MasterKey,
    branch: AddressBranch,
    addresses: BTreeMap<u32, DerivedAddress>,
}

impl ActiveWallet {
    fn find(&self, address_hash: &str) -> KeyringResult<&DerivedAddress> {
        self.addresses
            .values()
            .find(|address| address.hash() == address_hash)
            .ok_or_else(|| KeyringError::AddressNotCached(address_hash.to_string()))
    }
}

/// Addresses cached by [`Keyring::discover_and_cache_active_addresses`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredAddresses {
    /// Active addresses found, ordered by index
    pub addresses: Vec<AddressData>,
    /// False when discovery was cancelled before finishing
    pub completed: bool,
}

impl Default for Keyring {
    fn default() -> Self {
        Self::new()
    }
}

impl Keyring {
    /// Create an empty keyring with the default configuration
    pub fn new() -> Self {
        Self {
            config: KeyringConfig::default(),
            state: KeyringState::Empty,
        }
    }

    /// Create an empty keyring
    ///
    /// # Errors
    ///
    /// `InvalidConfig` if the configuration fails validation
    pub fn with_config(config: KeyringConfig) -> KeyringResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            state: KeyringState::Empty,
        })
    }

    /// Active configuration
    pub fn config(&self) -> &KeyringConfig {
        &self.config
    }

    /// Whether a mnemonic is loaded
    pub fn is_initialized(&self) -> bool {
        matches!(self.state, KeyringState::Active(_))
    }

    /// Generate a fresh mnemonic and activate the keyring with it
    ///
    /// The mnemonic is returned so the caller can show it for backup and
    /// encrypt it for storage.
    ///
    /// # Arguments
    ///
    /// * `word_count` - 12 or 24
    /// * `passphrase` - Optional BIP-39 passphrase
    ///
    /// # Errors
    ///
    /// - `AlreadyInitialized` if a mnemonic is loaded
    /// - `InvalidMnemonic` for an unsupported word count
    pub fn generate_random_mnemonic(
        &mut self,
        word_count: usize,
        passphrase: Option<&str>,
    ) -> KeyringResult<Mnemonic> {
        self.ensure_empty()?;
        let mnemonic = Mnemonic::generate(word_count)?;
        self.activate(&mnemonic, passphrase)?;
        Ok(mnemonic)
    }

    /// Parse a user-supplied phrase and activate the keyring with it
    ///
    /// Importing and activating are one step: on success the keyring is
    /// active.
    ///
    /// # Errors
    ///
    /// - `AlreadyInitialized` if a mnemonic is loaded
    /// - `InvalidMnemonic` for an unknown word, wrong length or bad checksum
    pub fn import_mnemonic_string(
        &mut self,
        phrase: &str,
        passphrase: Option<&str>,
    ) -> KeyringResult<Mnemonic> {
        self.ensure_empty()?;
        let mnemonic = Mnemonic::from_phrase(phrase)?;
        self.activate(&mnemonic, passphrase)?;
        Ok(mnemonic)
    }

    /// Activate the keyring with an already parsed mnemonic
    pub fn init_from_mnemonic(
        &mut self,
        mnemonic: &Mnemonic,
        passphrase: Option<&str>,
    ) -> KeyringResult<()> {
        self.ensure_empty()?;
        self.activate(mnemonic, passphrase)
    }

    /// Decrypt a stored mnemonic and activate the keyring with it
    ///
    /// Returns the blob's format so the caller can re-encrypt legacy blobs.
    ///
    /// # Errors
    ///
    /// - `AlreadyInitialized` if a mnemonic is loaded
    /// - `DecryptionFailed` for a wrong password or tampered blob
    /// - `EncryptedMnemonic` if the blob's parameters are unusable
    pub fn init_from_encrypted_mnemonic(
        &mut self,
        blob: &EncryptedMnemonic,
        password: &str,
        passphrase: Option<&str>,
    ) -> KeyringResult<MnemonicVersion> {
        self.ensure_empty()?;
        let decrypted = decrypt_mnemonic(blob, password)?;
        self.activate(&decrypted.mnemonic, passphrase)?;
        info!(version = decrypted.version.number(), "Keyring unlocked from encrypted mnemonic");
        Ok(decrypted.version)
    }

    /// Encrypt a mnemonic with the configured iteration count
    pub fn encrypt_mnemonic(
        &self,
        mnemonic: &Mnemonic,
        password: &str,
    ) -> KeyringResult<EncryptedMnemonic> {
        Ok(encrypt_mnemonic_with_iterations(
            mnemonic,
            password,
            self.config.pbkdf2_iterations,
        )?)
    }

    /// Forget the wallet
    ///
    /// Every cached private key is overwritten before the state is dropped;
    /// the master key is wiped by its own destructor. A no-op when empty.
    pub fn clear(&mut self) {
        let state = std::mem::replace(&mut self.state, KeyringState::Empty);
        if let KeyringState::Active(mut wallet) = state {
            let cached = wallet.addresses.len();
            for address in wallet.addresses.values_mut() {
                address.wipe();
            }
            drop(wallet);
            info!(cached, "Keyring cleared");
        }
    }

    /// Derive an address (or return the cached one) and cache it
    ///
    /// - `address_index` set: that index
    /// - `group` set: the lowest index in the group that is neither cached
    ///   nor skipped
    /// - neither: the lowest index that is neither cached nor skipped
    ///
    /// # Errors
    ///
    /// - `NotInitialized` when empty
    /// - `InvalidArguments` if both `address_index` and `group` are set or the
    ///   index is out of range
    /// - `InvalidGroup` if `group` is not below the configured group count
    pub fn generate_and_cache_address(
        &mut self,
        request: &GenerateAddressRequest,
    ) -> KeyringResult<AddressData> {
        let total_groups = self.config.total_groups;
        let wallet = self.active_mut()?;

        let derived = match (request.address_index, request.group) {
            (Some(_), Some(_)) => {
                return Err(KeyringError::InvalidArguments(
                    "address_index and group are mutually exclusive".to_string(),
                ))
            }
            (Some(index), None) => {
                if index > MAX_ADDRESS_INDEX {
                    return Err(KeyringError::InvalidArguments(format!(
                        "address index {} exceeds {}",
                        index, MAX_ADDRESS_INDEX
                    )));
                }
                if let Some(cached) = wallet.addresses.get(&index) {
                    return Ok(cached.to_address_data());
                }
                wallet.branch.derive(index)?
            }
            (None, Some(group)) => {
                validate_group(group, total_groups)?;
                let skip = unusable_indexes(wallet, &request.skip_address_indexes);
                wallet.branch.derive_in_group(group, &skip)?
            }
            (None, None) => {
                let skip = unusable_indexes(wallet, &request.skip_address_indexes);
                let index = (0..=MAX_ADDRESS_INDEX)
                    .find(|i| !skip.contains(i))
                    .ok_or_else(|| {
                        KeyringError::DerivationFailed("no address index left".to_string())
                    })?;
                wallet.branch.derive(index)?
            }
        };

        debug!(index = derived.index(), group = derived.group(), "Cached address");
        let data = derived.to_address_data();
        wallet.addresses.insert(derived.index(), derived);
        Ok(data)
    }

    /// Private key of a cached address as lowercase hex
    pub fn export_private_key_of_address(&self, address_hash: &str) -> KeyringResult<SecretString> {
        let address = self.active()?.find(address_hash)?;
        Ok(hex::encode(address.private_key().expose_secret()).into_secret())
    }

    /// Compressed public key of a cached address as hex
    pub fn export_public_key_of_address(&self, address_hash: &str) -> KeyringResult<String> {
        let address = self.active()?.find(address_hash)?;
        Ok(hex::encode(address.public_key()))
    }

    /// Sign a transaction id with the key of a cached address
    ///
    /// # Arguments
    ///
    /// * `tx_hash_hex` - 32-byte transaction id as hex
    /// * `address_hash` - Base58 address of the signer
    ///
    /// # Returns
    ///
    /// `r || s` as 128 hex characters
    pub fn sign_transaction(&self, tx_hash_hex: &str, address_hash: &str) -> KeyringResult<String> {
        self.sign_message_hash(tx_hash_hex, address_hash)
    }

    /// Sign a hex-encoded 32-byte hash with the key of a cached address
    pub fn sign_message_hash(&self, hash_hex: &str, address_hash: &str) -> KeyringResult<String> {
        let address = self.active()?.find(address_hash)?;
        let hash = parse_hash_hex(hash_hex)?;
        self.sign_with(address, &hash)
    }

    /// Hash a message with `hasher` and sign it with the key of a cached
    /// address
    pub fn sign_message(
        &self,
        message: &str,
        hasher: MessageHasher,
        address_hash: &str,
    ) -> KeyringResult<String> {
        let address = self.active()?.find(address_hash)?;
        let hash = hash_message(message, hasher)?;
        self.sign_with(address, &hash)
    }

    /// Public view of every cached address, ordered by index
    pub fn addresses(&self) -> Vec<AddressData> {
        match &self.state {
            KeyringState::Empty => Vec::new(),
            KeyringState::Active(wallet) => wallet
                .addresses
                .values()
                .map(DerivedAddress::to_address_data)
                .collect(),
        }
    }

    /// Public view of one cached address
    pub fn address(&self, address_hash: &str) -> Option<AddressData> {
        match &self.state {
            KeyringState::Empty => None,
            KeyringState::Active(wallet) => wallet
                .find(address_hash)
                .ok()
                .map(DerivedAddress::to_address_data),
        }
    }

    /// Find the addresses of this wallet that were used on chain and cache
    /// them
    ///
    /// Already-cached indexes and `skip_indexes` are not derived again.
    /// When `cancel` fires, the addresses confirmed so far are still cached
    /// and returned with `completed == false`.
    ///
    /// # Errors
    ///
    /// - `NotInitialized` when empty
    /// - `ActivityCheck` if the checker fails; nothing is cached then
    pub async fn discover_and_cache_active_addresses(
        &mut self,
        checker: &dyn AddressActivityChecker,
        skip_indexes: &[u32],
        cancel: &CancellationToken,
    ) -> KeyringResult<DiscoveredAddresses> {
        let options = DiscoveryOptions::from(&self.config);
        let wallet = self.active_mut()?;
        let skip = unusable_indexes(wallet, skip_indexes);

        let report = discover_in_branch(&wallet.branch, checker, skip, &options, cancel).await?;

        let addresses = report
            .addresses
            .into_iter()
            .map(|address| {
                let data = address.to_address_data();
                wallet.addresses.entry(address.index()).or_insert(address);
                data
            })
            .collect();

        Ok(DiscoveredAddresses {
            addresses,
            completed: report.completed,
        })
    }

    fn sign_with(
        &self,
        address: &DerivedAddress,
        hash: &[u8; HASH_LENGTH],
    ) -> KeyringResult<String> {
        let signature = sign_hash(address.private_key(), hash)?;
        debug!(index = address.index(), "Signed hash");
        Ok(signature)
    }

    fn ensure_empty(&self) -> KeyringResult<()> {
        match self.state {
            KeyringState::Empty => Ok(()),
            KeyringState::Active(_) => Err(KeyringError::AlreadyInitialized),
        }
    }

    fn activate(&mut self, mnemonic: &Mnemonic, passphrase: Option<&str>) -> KeyringResult<()> {
        let master = derive_master_key(mnemonic, passphrase)?;
        let branch = AddressBranch::new(&master, self.config.total_groups)?;
        self.state = KeyringState::Active(ActiveWallet {
            _master: master,
            branch,
            addresses: BTreeMap::new(),
        });
        info!(word_count = mnemonic.word_count(), "Keyring activated");
        Ok(())
    }

    fn active(&self) -> KeyringResult<&ActiveWallet> {
        match &self.state {
            KeyringState::Active(wallet) => Ok(wallet),
            KeyringState::Empty => Err(KeyringError::NotInitialized),
        }
    }

    fn active_mut(&mut self) -> KeyringResult<&mut ActiveWallet> {
        match &mut self.state {
            KeyringState::Active(wallet) => Ok(wallet),
            KeyringState::Empty => Err(KeyringError::NotInitialized),
        }
    }
}

impl Drop for Keyring {
    fn drop(&mut self) {
        self.clear();
    }
}

impl std::fmt::Debug for Keyring {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cached = match &self.state {
            KeyringState::Empty => None,
            KeyringState::Active(wallet) => Some(wallet.addresses.len()),
        };
        f.debug_struct("Keyring")
            .field("config", &self.config)
            .field("cached_addresses", &cached)
            .finish()
    }
}

/// Caller's skip list plus every cached index
fn unusable_indexes(wallet: &ActiveWallet, skip_indexes: &[u32]) -> HashSet<u32> {
    let mut skip: HashSet<u32> = skip_indexes.iter().copied().collect();
    skip.extend(wallet.addresses.keys().copied());
    skip
}
