//! Secp256k1 ECDSA signing for Alephium transactions and messages
//!
//! Signatures are made over a 32-byte hash with RFC 6979 deterministic
//! nonces, normalized to low-S, and encoded as `r || s` (64 bytes, 128 hex
//! characters).
//!
//! Uses the k256 crate for secp256k1 curve operations.

use k256::{
    ecdsa::{
        signature::hazmat::{PrehashSigner, PrehashVerifier},
        Signature as K256Signature, SigningKey, VerifyingKey,
    },
    elliptic_curve::sec1::ToEncodedPoint,
    SecretKey as K256SecretKey,
};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::address::{blake2b256, PRIVATE_KEY_LENGTH, PUBLIC_KEY_LENGTH};
use crate::error::{KeyringError, KeyringResult};
use crate::secure::SecretArray;

/// Length of the hash that gets signed
pub const HASH_LENGTH: usize = 32;

/// Length of an `r || s` signature
pub const SIGNATURE_LENGTH: usize = 64;

/// Prefix prepended to messages by [`MessageHasher::Alephium`]
pub const MESSAGE_PREFIX: &str = "Alephium Signed Message: ";

/// Secp256k1 secret key (32 bytes scalar)
pub struct Secp256k1SecretKey(K256SecretKey);

impl Secp256k1SecretKey {
    /// Load from a secret scalar
    pub fn from_secret(bytes: &SecretArray<PRIVATE_KEY_LENGTH>) -> KeyringResult<Self> {
        K256SecretKey::from_slice(bytes.expose_secret())
            .map(Self)
            .map_err(|_| KeyringError::SigningFailed("invalid secret key".to_string()))
    }

    /// Get the corresponding public key
    pub fn public_key(&self) -> Secp256k1PublicKey {
        Secp256k1PublicKey(self.0.public_key())
    }

    /// Sign a 32-byte hash as is, without hashing it again
    pub fn sign_prehash(&self, hash: &[u8; HASH_LENGTH]) -> KeyringResult<Secp256k1Signature> {
        let signing_key = SigningKey::from(&self.0);
        let sig: K256Signature = signing_key
            .sign_prehash(hash)
            .map_err(|e| KeyringError::SigningFailed(e.to_string()))?;
        Ok(Secp256k1Signature(sig.normalize_s().unwrap_or(sig)))
    }
}

impl std::fmt::Debug for Secp256k1SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Secp256k1SecretKey")
            .field("bytes", &"[REDACTED]")
            .finish()
    }
}

/// Secp256k1 public key
#[derive(Clone, PartialEq, Eq)]
pub struct Secp256k1PublicKey(k256::PublicKey);

impl Secp256k1PublicKey {
    /// Load from SEC1 bytes (33-byte compressed or 65-byte uncompressed)
    pub fn from_bytes(bytes: &[u8]) -> KeyringResult<Self> {
        k256::PublicKey::from_sec1_bytes(bytes)
            .map(Self)
            .map_err(|_| KeyringError::InvalidArguments("invalid public key".to_string()))
    }

    /// Load from hex
    pub fn from_hex(public_key_hex: &str) -> KeyringResult<Self> {
        let bytes = hex::decode(public_key_hex)
            .map_err(|e| KeyringError::InvalidArguments(format!("invalid public key hex: {}", e)))?;
        Self::from_bytes(&bytes)
    }

    /// Serialize to compressed bytes (33 bytes)
    pub fn to_bytes(&self) -> [u8; PUBLIC_KEY_LENGTH] {
        let encoded = self.0.to_encoded_point(true);
        let mut result = [0u8; PUBLIC_KEY_LENGTH];
        result.copy_from_slice(encoded.as_bytes());
        result
    }

    /// Verify a signature over a 32-byte hash
    pub fn verify_prehash(&self, hash: &[u8], sig: &Secp256k1Signature) -> bool {
        VerifyingKey::from(&self.0)
            .verify_prehash(hash, &sig.0)
            .is_ok()
    }
}

impl std::fmt::Debug for Secp256k1PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let bytes = self.to_bytes();
        write!(f, "Secp256k1PublicKey({})", hex::encode(&bytes[..8]))
    }
}

/// Secp256k1 ECDSA signature (64 bytes: r || s)
#[derive(Clone, PartialEq, Eq)]
pub struct Secp256k1Signature(K256Signature);

impl Secp256k1Signature {
    /// Load from bytes (64 bytes: r || s)
    pub fn from_bytes(bytes: &[u8]) -> KeyringResult<Self> {
        K256Signature::from_slice(bytes)
            .map(Self)
            .map_err(|_| KeyringError::InvalidArguments("invalid signature".to_string()))
    }

    /// Load from hex (128 characters)
    pub fn from_hex(signature_hex: &str) -> KeyringResult<Self> {
        let bytes = hex::decode(signature_hex)
            .map_err(|e| KeyringError::InvalidArguments(format!("invalid signature hex: {}", e)))?;
        Self::from_bytes(&bytes)
    }

    /// Serialize to bytes (64 bytes: r || s)
    pub fn to_bytes(&self) -> [u8; SIGNATURE_LENGTH] {
        self.0.to_bytes().into()
    }

    /// Lowercase hex of `r || s`
    pub fn to_hex(&self) -> String {
        hex::encode(self.to_bytes())
    }
}

impl std::fmt::Debug for Secp256k1Signature {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let bytes = self.to_bytes();
        write!(f, "Secp256k1Signature({})", hex::encode(&bytes[..8]))
    }
}

/// How a message is reduced to the 32-byte hash that gets signed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageHasher {
    /// blake2b-256 over [`MESSAGE_PREFIX`] followed by the message
    #[default]
    Alephium,
    /// sha256 over the message
    Sha256,
    /// blake2b-256 over the message
    Blake2b,
    /// The message is already a hex-encoded 32-byte hash
    Identity,
}

/// Hash a message for signing
///
/// # Errors
///
/// `InvalidArguments` if `hasher` is `Identity` and `message` is not the hex
/// encoding of exactly 32 bytes
pub fn hash_message(message: &str, hasher: MessageHasher) -> KeyringResult<[u8; HASH_LENGTH]> {
    match hasher {
        MessageHasher::Alephium => {
            let mut prefixed = Vec::with_capacity(MESSAGE_PREFIX.len() + message.len());
            prefixed.extend_from_slice(MESSAGE_PREFIX.as_bytes());
            prefixed.extend_from_slice(message.as_bytes());
            Ok(blake2b256(&prefixed))
        }
        MessageHasher::Sha256 => Ok(Sha256::digest(message.as_bytes()).into()),
        MessageHasher::Blake2b => Ok(blake2b256(message.as_bytes())),
        MessageHasher::Identity => parse_hash_hex(message),
    }
}

/// Decode a hex-encoded 32-byte hash
pub fn parse_hash_hex(hash_hex: &str) -> KeyringResult<[u8; HASH_LENGTH]> {
    let bytes = hex::decode(hash_hex)
        .map_err(|e| KeyringError::InvalidArguments(format!("invalid hash hex: {}", e)))?;
    bytes.try_into().map_err(|bytes: Vec<u8>| {
        KeyringError::InvalidArguments(format!(
            "hash must be {} bytes, got {}",
            HASH_LENGTH,
            bytes.len()
        ))
    })
}

/// Sign a 32-byte hash with a raw private key, returning `r || s` as hex
pub fn sign_hash(
    private_key: &SecretArray<PRIVATE_KEY_LENGTH>,
    hash: &[u8; HASH_LENGTH],
) -> KeyringResult<String> {
    let secret = Secp256k1SecretKey::from_secret(private_key)?;
    Ok(secret.sign_prehash(hash)?.to_hex())
}

/// Verify an `r || s` hex signature over a hex-encoded 32-byte hash
///
/// Returns `Ok(false)` for a well-formed signature that does not verify.
///
/// # Errors
///
/// `InvalidArguments` if any input fails to decode
pub fn verify_signature(
    hash_hex: &str,
    signature_hex: &str,
    public_key_hex: &str,
) -> KeyringResult<bool> {
    let hash = parse_hash_hex(hash_hex)?;
    let signature = Secp256k1Signature::from_hex(signature_hex)?;
    let public_key = Secp256k1PublicKey::from_hex(public_key_hex)?;
    Ok(public_key.verify_prehash(&hash, &signature))
}
