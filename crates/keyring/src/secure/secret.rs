//! Secret wrapper utilities for consistent secret handling
//!
//! Provides type aliases and utilities around the `secrecy` crate for
//! handling sensitive strings and byte arrays.

use secrecy::{SecretBox, SecretString as SecrecySecretString};
use zeroize::Zeroize;

/// A secret byte buffer that is zeroized on drop.
///
/// Used for variable-length secrets such as derived encryption keys and
/// decrypted plaintext. The inner value can only be accessed via
/// `expose_secret()`.
///
/// # Example
///
/// ```rust
/// use alephium_keyring::secure::SecretBytes;
/// use secrecy::ExposeSecret;
///
/// let secret = SecretBytes::new(Box::new(vec![1, 2, 3, 4]));
/// assert_eq!(secret.expose_secret(), &vec![1, 2, 3, 4]);
/// ```
pub type SecretBytes = SecretBox<Vec<u8>>;

/// A secret string that is zeroized on drop.
///
/// Used for mnemonic phrases, passwords and hex-encoded private keys.
pub type SecretString = SecrecySecretString;

/// A fixed-size secret byte array.
///
/// Unlike `SecretBytes`, this is for fixed-size secrets like seeds and
/// private key scalars. The backing buffer is overwritten on drop, and can
/// be wiped early with [`Zeroize::zeroize`].
#[derive(Zeroize)]
#[zeroize(drop)]
pub struct SecretArray<const N: usize> {
    inner: [u8; N],
}

impl<const N: usize> SecretArray<N> {
    /// Create a new secret array from bytes.
    ///
    /// The caller's copy of `bytes` is not wiped; prefer [`SecretArray::from_slice`]
    /// or [`SecretArray::zeroed`] when the source buffer outlives this call.
    pub fn new(bytes: [u8; N]) -> Self {
        Self { inner: bytes }
    }

    /// Create an all-zero buffer to be filled in place.
    pub fn zeroed() -> Self {
        Self { inner: [0u8; N] }
    }

    /// Copy `bytes` into a new secret array. Returns `None` on length mismatch.
    pub fn from_slice(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != N {
            return None;
        }
        let mut secret = Self::zeroed();
        secret.inner.copy_from_slice(bytes);
        Some(secret)
    }

    /// Expose the secret bytes.
    ///
    /// # Security
    ///
    /// Use this sparingly and only when necessary.
    /// The returned reference should not be stored.
    pub fn expose_secret(&self) -> &[u8; N] {
        &self.inner
    }

    /// Mutable access for in-place filling (KDF output, derivation).
    pub(crate) fn expose_secret_mut(&mut self) -> &mut [u8; N] {
        &mut self.inner
    }

    /// Whether every byte is zero (e.g. after an explicit wipe).
    pub fn is_zeroed(&self) -> bool {
        self.inner.iter().all(|&b| b == 0)
    }
}

impl<const N: usize> std::fmt::Debug for SecretArray<N> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SecretArray")
            .field("length", &N)
            .field("value", &"[REDACTED]")
            .finish()
    }
}

// Don't implement Clone to prevent accidental copies
// impl<const N: usize> Clone for SecretArray<N> { ... } - NOT IMPLEMENTED

/// Extension trait for creating secret values.
pub trait IntoSecret {
    /// The secret type this converts into.
    type Secret;

    /// Convert into a secret value.
    fn into_secret(self) -> Self::Secret;
}

impl IntoSecret for String {
    type Secret = SecretString;

    fn into_secret(self) -> Self::Secret {
        self.into()
    }
}

impl IntoSecret for Vec<u8> {
    type Secret = SecretBytes;

    fn into_secret(self) -> Self::Secret {
        SecretBox::new(Box::new(self))
    }
}
