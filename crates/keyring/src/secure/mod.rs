//! Secure memory handling for cryptographic material
//!
//! This module provides memory-safe containers for private key material with:
//! - Automatic zeroing on drop via `zeroize`
//! - Debug output masking to prevent log exposure
//! - Prevention of accidental cloning
//!
//! # Security Properties
//!
//! - Secrets are zeroized when dropped (even on panic)
//! - Debug output shows `[REDACTED]` instead of secret bytes
//! - Clone is intentionally NOT implemented to prevent accidental copies

mod material;
mod secret;

pub use material::{MasterKey, SEED_SIZE};
pub use secret::{IntoSecret, SecretArray, SecretBytes, SecretString};
