//! Password-based key derivation
//!
//! PBKDF2-HMAC-SHA256 producing 32-byte AES-256 keys. Current blobs record
//! the algorithm and iteration count next to the ciphertext; legacy blobs
//! imply a fixed 10 000 iterations.

use serde::{Deserialize, Serialize};
use sha2::Sha256;

use super::error::{KeystoreError, KeystoreResult};
use crate::secure::SecretArray;

/// Iteration count for newly encrypted mnemonics
pub const PBKDF2_ITERATIONS: u32 = 600_000;

/// Implicit iteration count of legacy (version 1) blobs
pub const LEGACY_PBKDF2_ITERATIONS: u32 = 10_000;

/// Upper bound accepted from a blob, so a crafted file cannot stall decryption
pub const MAX_PBKDF2_ITERATIONS: u32 = 10_000_000;

/// Algorithm identifier recorded in current blobs
pub const PBKDF2_SHA256: &str = "PBKDF2-SHA256";

/// Salt length for current blobs
pub const SALT_LENGTH: usize = 32;

/// Derived key length (AES-256)
pub const DERIVED_KEY_LENGTH: usize = 32;

/// Key-derivation metadata stored in a current blob
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct KeyMetadata {
    /// KDF identifier (only `PBKDF2-SHA256` is supported)
    pub algorithm: String,
    /// PBKDF2 iteration count
    pub iterations: u32,
}

impl KeyMetadata {
    /// PBKDF2-HMAC-SHA256 with the given iteration count
    pub fn pbkdf2_sha256(iterations: u32) -> Self {
        Self {
            algorithm: PBKDF2_SHA256.to_string(),
            iterations,
        }
    }

    /// Validate the parameters
    pub fn validate(&self) -> KeystoreResult<()> {
        if self.algorithm != PBKDF2_SHA256 {
            return Err(KeystoreError::UnsupportedKdf(self.algorithm.clone()));
        }
        if self.iterations == 0 || self.iterations > MAX_PBKDF2_ITERATIONS {
            return Err(KeystoreError::InvalidKdfParams(format!(
                "iterations must be in 1..={}, got {}",
                MAX_PBKDF2_ITERATIONS, self.iterations
            )));
        }
        Ok(())
    }

    /// Derive the encryption key for `password` and `salt`
    pub fn derive_key(
        &self,
        password: &str,
        salt: &[u8],
    ) -> KeystoreResult<SecretArray<DERIVED_KEY_LENGTH>> {
        self.validate()?;
        Ok(pbkdf2_derive_key(password, salt, self.iterations))
    }
}

/// Derive a 32-byte key with PBKDF2-HMAC-SHA256
pub fn pbkdf2_derive_key(
    password: &str,
    salt: &[u8],
    iterations: u32,
) -> SecretArray<DERIVED_KEY_LENGTH> {
    let mut key = SecretArray::<DERIVED_KEY_LENGTH>::zeroed();
    pbkdf2::pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, iterations, key.expose_secret_mut());
    key
}

/// Generate a random salt
pub fn generate_salt() -> [u8; SALT_LENGTH] {
    use rand::RngCore;
    let mut salt = [0u8; SALT_LENGTH];
    rand::thread_rng().fill_bytes(&mut salt);
    salt
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pbkdf2_sha256_vector() {
        // RFC 7914 section 11 PBKDF2-HMAC-SHA256 vector (first 32 bytes)
        let key = pbkdf2_derive_key("passwd", b"salt", 1);
        assert_eq!(
            hex::encode(key.expose_secret()),
            "55ac046e56e3089fec1691c22544b605f94185216dde0465e68b9d57c20dacbc"
        );
    }

    #[test]
    fn test_derive_key_determinism() {
        let salt = [0xAA; SALT_LENGTH];
        let a = pbkdf2_derive_key("test-password", &salt, 1000);
        let b = pbkdf2_derive_key("test-password", &salt, 1000);
        let c = pbkdf2_derive_key("different", &salt, 1000);

        assert_eq!(a.expose_secret(), b.expose_secret());
        assert_ne!(a.expose_secret(), c.expose_secret());
    }

    #[test]
    fn test_key_metadata_validation() {
        assert!(KeyMetadata::pbkdf2_sha256(PBKDF2_ITERATIONS).validate().is_ok());

        assert!(matches!(
            KeyMetadata::pbkdf2_sha256(0).validate(),
            Err(KeystoreError::InvalidKdfParams(_))
        ));
        assert!(matches!(
            KeyMetadata::pbkdf2_sha256(MAX_PBKDF2_ITERATIONS + 1).validate(),
            Err(KeystoreError::InvalidKdfParams(_))
        ));

        let scrypt = KeyMetadata {
            algorithm: "scrypt".to_string(),
            iterations: 1,
        };
        assert!(matches!(
            scrypt.validate(),
            Err(KeystoreError::UnsupportedKdf(name)) if name == "scrypt"
        ));
    }

    #[test]
    fn test_generate_salt() {
        let salt1 = generate_salt();
        let salt2 = generate_salt();
        assert_ne!(salt1, salt2);
    }

    #[test]
    fn test_key_metadata_serialization() {
        let metadata = KeyMetadata::pbkdf2_sha256(600_000);
        let json = serde_json::to_string(&metadata).unwrap();
        assert_eq!(json, r#"{"algorithm":"PBKDF2-SHA256","iterations":600000}"#);

        let parsed: KeyMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(metadata, parsed);
    }
}
