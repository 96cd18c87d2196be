//! Integration tests for the Alephium keyring
//!
//! These tests verify the complete wallet workflow including:
//! - Mnemonic generation, import and encrypted storage
//! - Deterministic address derivation against known vectors
//! - Private key export and signing
//! - Active-address discovery through the keyring
//! - Cleanup on clear

use std::collections::HashSet;
use std::sync::Mutex;

use alephium_keyring::secp256k1::Secp256k1SecretKey;
use alephium_keyring::{
    group_of_address, verify_signature, AddressActivityChecker, EncryptedMnemonic, ExposeSecret,
    GenerateAddressRequest, Keyring, KeyringConfig, KeyringError, MessageHasher, MnemonicVersion,
    SecretArray,
};
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

// Published wallet test mnemonic (DO NOT USE IN PRODUCTION)
const TEST_MNEMONIC: &str = "vault alarm sad mass witness property virus style good flower rice alpha viable evidence run glare pretty scout evil judge enroll refuse another lava";
const TEST_ADDRESS_0: &str = "1DrDyTr9RpRsQnDnXo2YRiPzPW4ooHX5LLoqXrqfMrpQH";
const TEST_PUBLIC_KEY_0: &str =
    "0381818e63bd9e35a5489b52a430accefc608fd60aa2c7c0d1b393b5239aedf6b0";
const TEST_PRIVATE_KEY_0: &str = "a642942e67258589cd2b1822c631506632db5a12aabcf413604e785300d762a5";
const TEST_ADDRESS_4: &str = "1Bf9jthiwQo74V94LHT37dwEEiV22KkpKySf4TmRDzZqf";
const TEST_PRIVATE_KEY_4: &str = "053b33e3330b4e9b6636d3062e332f47bf700104a4e18cbeb16efd2ae7cbbae1";

// Written by Node.js crypto: PBKDF2-SHA256 (10 000 rounds) and AES-256-GCM
// with a 64-byte salt and IV. Password "legacy password".
const LEGACY_FIXTURE_JSON: &str = concat!(
    r#"{"salt":""#,
    "ef16352a4840b1b10207b390a6941e8f659334a3daf7366058f4c9fe6a9d1ce3",
    "7ae653114ed372c4b16da04779426a3b290678b0db7012dc1175f67ec80c2fe1",
    r#"","iv":""#,
    "f2f517c5d725b362cb04a6745c82ff42f0b6ee265fcde5e95ae1d1954dbd0b7d",
    "04588813dbe7c30db47ccfb98373127e1ad8e133c4febbd5f56f61bc2e903887",
    r#"","encrypted":""#,
    "20222a0007bf6e4987829f65a42c080bf09ccce4d3134e8d99d357d8cef7ff35",
    "4e535ab0b5518d8b6b59cf61ef9169d88ae8939994535f642554dd3642ff8b15",
    "f6407d16355c505c122c1204ec27824cf088daf528d02eab2261ba4136db056b",
    "6fffe3e6a30d83c2352180b8c103e4112448202aa67afa0634263e1427ed6ef9",
    "fb670ed3e8f6185f5362a19da74c1a8199a45afb7cfe63a44201303d8c382810",
    "d7eb98f5c8",
    r#"","version":1}"#,
);

// Written by Node.js crypto: PBKDF2-SHA256 (1 000 rounds) and AES-256-GCM
// over the little-endian word indices. Password "correct horse".
const CURRENT_FIXTURE_JSON: &str = concat!(
    r#"{"version":2,"ciphertext":""#,
    "67b5f40791a538e68bc287adce8f8b33257c374e9aeb6134607fd63b09d9dacc",
    "d66ad5d1ae0f7a9cf70097d9a635ddacd6f5c5f0889ed40e575dba83884c3366",
    r#"","iv":"1a6d7eab2ce9cadb73e24545","salt":""#,
    "4aadd5b11990d405e1e3ed5bcc680c908defc2340021ffe899dfaf97865e4c04",
    r#"","keyMetadata":{"algorithm":"PBKDF2-SHA256","iterations":1000}}"#,
);

fn unlocked() -> Keyring {
    let mut keyring = Keyring::new();
    keyring
        .import_mnemonic_string(TEST_MNEMONIC, None)
        .expect("test mnemonic should import");
    keyring
}

/// Known mnemonic derives the documented first address
#[test]
fn test_golden_address_at_index_zero() {
    let mut keyring = unlocked();
    let address = keyring
        .generate_and_cache_address(&GenerateAddressRequest::at_index(0))
        .unwrap();

    assert_eq!(address.index, 0);
    assert_eq!(address.hash, TEST_ADDRESS_0);
    assert_eq!(address.group, group_of_address(TEST_ADDRESS_0, 4).unwrap());
    assert_eq!(address.public_key, TEST_PUBLIC_KEY_0);
}

/// Re-importing in a fresh keyring reproduces the same keys
#[test]
fn test_derivation_is_deterministic_across_keyrings() {
    let mut first = unlocked();
    let mut second = unlocked();

    for index in [0u32, 1, 4, 1_000] {
        let request = GenerateAddressRequest::at_index(index);
        let a = first.generate_and_cache_address(&request).unwrap();
        let b = second.generate_and_cache_address(&request).unwrap();
        assert_eq!(a, b);

        let key_a = first.export_private_key_of_address(&a.hash).unwrap();
        let key_b = second.export_private_key_of_address(&b.hash).unwrap();
        assert_eq!(key_a.expose_secret(), key_b.expose_secret());
    }
}

/// Exported private keys at indices 0 and 4 match the published vectors
#[test]
fn test_export_private_keys() {
    let mut keyring = unlocked();

    for (index, hash, private_key) in [
        (0u32, TEST_ADDRESS_0, TEST_PRIVATE_KEY_0),
        (4, TEST_ADDRESS_4, TEST_PRIVATE_KEY_4),
    ] {
        let address = keyring
            .generate_and_cache_address(&GenerateAddressRequest::at_index(index))
            .unwrap();
        assert_eq!(address.hash, hash);

        let private_hex = keyring.export_private_key_of_address(&address.hash).unwrap();
        assert_eq!(private_hex.expose_secret(), private_key);

        let bytes = hex::decode(private_hex.expose_secret()).unwrap();
        let secret = SecretArray::<32>::from_slice(&bytes).unwrap();
        let public = Secp256k1SecretKey::from_secret(&secret).unwrap().public_key();
        assert_eq!(hex::encode(public.to_bytes()), address.public_key);
    }
}

/// Lifecycle: generate twice fails until cleared
#[test]
fn test_lifecycle() {
    let mut keyring = Keyring::new();
    keyring.generate_random_mnemonic(24, None).unwrap();

    assert!(matches!(
        keyring.generate_random_mnemonic(24, None),
        Err(KeyringError::AlreadyInitialized)
    ));

    keyring.clear();
    assert!(!keyring.is_initialized());
    keyring.generate_random_mnemonic(12, None).unwrap();
    assert!(keyring.is_initialized());
}

/// Argument validation never mutates the cache
#[test]
fn test_constraint_violations() {
    let mut keyring = unlocked();

    let both = GenerateAddressRequest {
        address_index: Some(0),
        group: Some(0),
        skip_address_indexes: Vec::new(),
    };
    assert!(matches!(
        keyring.generate_and_cache_address(&both),
        Err(KeyringError::InvalidArguments(_))
    ));
    assert!(matches!(
        keyring.generate_and_cache_address(&GenerateAddressRequest::in_group(4)),
        Err(KeyringError::InvalidGroup { .. })
    ));
    assert!(keyring.addresses().is_empty());

    keyring
        .generate_and_cache_address(&GenerateAddressRequest::at_index(0))
        .unwrap();
    keyring
        .generate_and_cache_address(&GenerateAddressRequest::at_index(0))
        .unwrap();
    assert_eq!(keyring.addresses().len(), 1);
}

/// Every group can be targeted and the result lands in it
#[test]
fn test_group_targeting() {
    let mut keyring = unlocked();
    for group in 0..4 {
        let address = keyring
            .generate_and_cache_address(&GenerateAddressRequest::in_group(group))
            .unwrap();
        assert_eq!(address.group, group);
        assert_eq!(group_of_address(&address.hash, 4).unwrap(), group);
    }
    assert_eq!(keyring.addresses().len(), 4);
}

/// A single-group network puts every address in group 0
#[test]
fn test_single_group_config() {
    let config = KeyringConfig {
        total_groups: 1,
        ..Default::default()
    };
    let mut keyring = Keyring::with_config(config).unwrap();
    keyring.import_mnemonic_string(TEST_MNEMONIC, None).unwrap();

    let address = keyring
        .generate_and_cache_address(&GenerateAddressRequest::in_group(0))
        .unwrap();
    assert_eq!(address.index, 0);
    assert_eq!(address.group, 0);
    assert_eq!(address.hash, TEST_ADDRESS_0);
}

/// BIP-39 passphrase selects a different wallet
#[test]
fn test_passphrase_changes_wallet() {
    let mut keyring = Keyring::new();
    keyring
        .import_mnemonic_string(TEST_MNEMONIC, Some("hidden"))
        .unwrap();
    let address = keyring
        .generate_and_cache_address(&GenerateAddressRequest::at_index(0))
        .unwrap();
    assert_ne!(address.hash, TEST_ADDRESS_0);
}

/// Unlock a stored blob in a new keyring, sign
#[test]
fn test_encrypted_storage_workflow() {
    let stored = EncryptedMnemonic::from_json(CURRENT_FIXTURE_JSON).unwrap();
    let mut keyring = Keyring::new();
    assert!(matches!(
        keyring.init_from_encrypted_mnemonic(&stored, "battery staple", None),
        Err(KeyringError::DecryptionFailed)
    ));

    let version = keyring
        .init_from_encrypted_mnemonic(&stored, "correct horse", None)
        .unwrap();
    assert_eq!(version, MnemonicVersion::Current);
    assert!(!version.needs_migration());

    let address = keyring
        .generate_and_cache_address(&GenerateAddressRequest::at_index(0))
        .unwrap();
    assert_eq!(address.hash, TEST_ADDRESS_0);

    let tx_id = "0f".repeat(32);
    let signature = keyring.sign_transaction(&tx_id, &address.hash).unwrap();
    assert_eq!(signature.len(), 128);
    assert!(verify_signature(&tx_id, &signature, &address.public_key).unwrap());
}

/// Legacy blobs still unlock the same wallet and ask for migration
#[test]
fn test_legacy_blob_unlocks_wallet() {
    let stored = EncryptedMnemonic::from_json(LEGACY_FIXTURE_JSON).unwrap();
    let mut keyring = Keyring::new();
    assert!(matches!(
        keyring.init_from_encrypted_mnemonic(&stored, "not the password", None),
        Err(KeyringError::DecryptionFailed)
    ));
    assert!(!keyring.is_initialized());

    let version = keyring
        .init_from_encrypted_mnemonic(&stored, "legacy password", None)
        .unwrap();
    assert_eq!(version, MnemonicVersion::Legacy);
    assert!(version.needs_migration());

    let address = keyring
        .generate_and_cache_address(&GenerateAddressRequest::at_index(0))
        .unwrap();
    assert_eq!(address.hash, TEST_ADDRESS_0);
    assert_eq!(
        keyring.export_private_key_of_address(&address.hash).unwrap().expose_secret(),
        TEST_PRIVATE_KEY_0
    );
}

/// Message signatures verify against the hashed message
#[test]
fn test_sign_message() {
    let mut keyring = unlocked();
    let address = keyring
        .generate_and_cache_address(&GenerateAddressRequest::default())
        .unwrap();

    for hasher in [MessageHasher::Alephium, MessageHasher::Sha256, MessageHasher::Blake2b] {
        let signature = keyring.sign_message("hello alephium", hasher, &address.hash).unwrap();
        let hash = alephium_keyring::hash_message("hello alephium", hasher).unwrap();
        assert!(verify_signature(&hex::encode(hash), &signature, &address.public_key).unwrap());
    }
}

/// Clear removes all access to the keys
#[test]
fn test_clear_revokes_access() {
    let mut keyring = unlocked();
    let address = keyring
        .generate_and_cache_address(&GenerateAddressRequest::at_index(0))
        .unwrap();
    keyring.clear();

    assert!(keyring.addresses().is_empty());
    assert!(matches!(
        keyring.export_private_key_of_address(&address.hash),
        Err(KeyringError::NotInitialized)
    ));
    assert!(matches!(
        keyring.sign_transaction(&"00".repeat(32), &address.hash),
        Err(KeyringError::NotInitialized)
    ));
}

struct RecordingChecker {
    active: HashSet<String>,
    checked: Mutex<Vec<String>>,
}

#[async_trait]
impl AddressActivityChecker for RecordingChecker {
    async fn check_addresses_active(&self, addresses: &[String]) -> anyhow::Result<Vec<bool>> {
        assert!(addresses.len() <= 80);
        self.checked.lock().unwrap().extend(addresses.iter().cloned());
        Ok(addresses.iter().map(|a| self.active.contains(a)).collect())
    }
}

/// Discovery caches active addresses and skips cached ones
#[tokio::test]
async fn test_discover_and_cache_active_addresses() {
    let mut reference = unlocked();
    let used: Vec<String> = [0u32, 1, 3]
        .iter()
        .map(|&i| {
            reference
                .generate_and_cache_address(&GenerateAddressRequest::at_index(i))
                .unwrap()
                .hash
        })
        .collect();

    let checker = RecordingChecker {
        active: used.iter().cloned().collect(),
        checked: Mutex::new(Vec::new()),
    };

    let mut keyring = unlocked();
    // Index 0 is already known and must not be checked again
    let known = keyring
        .generate_and_cache_address(&GenerateAddressRequest::at_index(0))
        .unwrap();

    let discovered = keyring
        .discover_and_cache_active_addresses(&checker, &[], &CancellationToken::new())
        .await
        .unwrap();

    assert!(discovered.completed);
    let found: Vec<u32> = discovered.addresses.iter().map(|a| a.index).collect();
    assert_eq!(found, vec![1, 3]);
    assert!(!checker.checked.lock().unwrap().contains(&known.hash));

    let cached: Vec<u32> = keyring.addresses().iter().map(|a| a.index).collect();
    assert_eq!(cached, vec![0, 1, 3]);
    for hash in &used {
        assert!(keyring.address(hash).is_some());
    }
}

/// Discovery needs an unlocked keyring
#[tokio::test]
async fn test_discovery_requires_initialization() {
    let checker = RecordingChecker {
        active: HashSet::new(),
        checked: Mutex::new(Vec::new()),
    };
    let mut keyring = Keyring::new();

    let result = keyring
        .discover_and_cache_active_addresses(&checker, &[], &CancellationToken::new())
        .await;
    assert!(matches!(result, Err(KeyringError::NotInitialized)));
}
