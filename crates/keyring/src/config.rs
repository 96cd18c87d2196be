//! Keyring configuration
//!
//! Network topology and security parameters of a [`Keyring`](crate::Keyring).
//! Every field has a default, so a partial (or empty) JSON object is a valid
//! configuration.
//!
//! # Example
//!
//! ```json
//! {
//!   "totalGroups": 4,
//!   "pbkdf2Iterations": 600000,
//!   "discoveryBatchSize": 80,
//!   "discoveryMinGap": 5
//! }
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{KeyringError, KeyringResult};
use crate::keystore::PBKDF2_ITERATIONS;

/// Number of shard groups on Alephium mainnet
pub const DEFAULT_TOTAL_GROUPS: u32 = 4;

/// Upper bound on the configured group count
pub const MAX_TOTAL_GROUPS: u32 = 256;

/// Largest batch the explorer backend accepts per activity query
pub const MAX_DISCOVERY_BATCH_SIZE: usize = 80;

/// Consecutive inactive addresses per group that end discovery
pub const DEFAULT_DISCOVERY_MIN_GAP: u32 = 5;

/// Upper bound on the discovery gap
pub const MAX_DISCOVERY_MIN_GAP: u32 = 1_000;

/// Keyring configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyringConfig {
    /// Number of shard groups addresses are spread over.
    #[serde(default = "default_total_groups")]
    pub total_groups: u32,

    /// PBKDF2 iteration count for newly encrypted mnemonics.
    ///
    /// Never lower than 600 000; decryption uses the count stored in each blob.
    #[serde(default = "default_pbkdf2_iterations")]
    pub pbkdf2_iterations: u32,

    /// Addresses per activity-check request.
    #[serde(default = "default_discovery_batch_size")]
    pub discovery_batch_size: usize,

    /// Inactive-address gap per group that ends discovery.
    #[serde(default = "default_discovery_min_gap")]
    pub discovery_min_gap: u32,
}

fn default_total_groups() -> u32 {
    DEFAULT_TOTAL_GROUPS
}

fn default_pbkdf2_iterations() -> u32 {
    PBKDF2_ITERATIONS
}

fn default_discovery_batch_size() -> usize {
    MAX_DISCOVERY_BATCH_SIZE
}

fn default_discovery_min_gap() -> u32 {
    DEFAULT_DISCOVERY_MIN_GAP
}

impl Default for KeyringConfig {
    fn default() -> Self {
        Self {
            total_groups: default_total_groups(),
            pbkdf2_iterations: default_pbkdf2_iterations(),
            discovery_batch_size: default_discovery_batch_size(),
            discovery_min_gap: default_discovery_min_gap(),
        }
    }
}

impl KeyringConfig {
    /// Parse and validate a JSON configuration.
    pub fn from_json(json: &str) -> KeyringResult<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| KeyringError::InvalidConfig(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Check every field against its allowed range.
    pub fn validate(&self) -> KeyringResult<()> {
        if self.total_groups == 0 || self.total_groups > MAX_TOTAL_GROUPS {
            return Err(KeyringError::InvalidConfig(format!(
                "totalGroups must be in 1..={}, got {}",
                MAX_TOTAL_GROUPS, self.total_groups
            )));
        }
        if self.pbkdf2_iterations < PBKDF2_ITERATIONS {
            return Err(KeyringError::InvalidConfig(format!(
                "pbkdf2Iterations must be at least {}, got {}",
                PBKDF2_ITERATIONS, self.pbkdf2_iterations
            )));
        }
        if self.discovery_batch_size == 0 || self.discovery_batch_size > MAX_DISCOVERY_BATCH_SIZE {
            return Err(KeyringError::InvalidConfig(format!(
                "discoveryBatchSize must be in 1..={}, got {}",
                MAX_DISCOVERY_BATCH_SIZE, self.discovery_batch_size
            )));
        }
        if self.discovery_min_gap == 0 || self.discovery_min_gap > MAX_DISCOVERY_MIN_GAP {
            return Err(KeyringError::InvalidConfig(format!(
                "discoveryMinGap must be in 1..={}, got {}",
                MAX_DISCOVERY_MIN_GAP, self.discovery_min_gap
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = KeyringConfig::default();
        assert_eq!(config.total_groups, 4);
        assert_eq!(config.pbkdf2_iterations, 600_000);
        assert_eq!(config.discovery_batch_size, 80);
        assert_eq!(config.discovery_min_gap, 5);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = KeyringConfig::from_json(r#"{"totalGroups": 2}"#).unwrap();
        assert_eq!(config.total_groups, 2);
        assert_eq!(config.pbkdf2_iterations, PBKDF2_ITERATIONS);

        let empty = KeyringConfig::from_json("{}").unwrap();
        assert_eq!(empty, KeyringConfig::default());
    }

    #[test]
    fn test_weak_iterations_rejected() {
        let result = KeyringConfig::from_json(r#"{"pbkdf2Iterations": 10000}"#);
        assert!(matches!(result, Err(KeyringError::InvalidConfig(_))));
    }

    #[test]
    fn test_out_of_range_values_rejected() {
        for json in [
            r#"{"totalGroups": 0}"#,
            r#"{"totalGroups": 257}"#,
            r#"{"totalGroups": 4294967295}"#,
            r#"{"discoveryBatchSize": 0}"#,
            r#"{"discoveryBatchSize": 81}"#,
            r#"{"discoveryMinGap": 0}"#,
            r#"{"discoveryMinGap": 1001}"#,
            r#"{"discoveryMinGap": 4294967295}"#,
            "not json",
        ] {
            assert!(
                matches!(KeyringConfig::from_json(json), Err(KeyringError::InvalidConfig(_))),
                "{json} should be rejected"
            );
        }
    }

    #[test]
    fn test_upper_bounds_accepted() {
        let config = KeyringConfig::from_json(
            r#"{"totalGroups": 256, "discoveryMinGap": 1000, "discoveryBatchSize": 80}"#,
        )
        .unwrap();
        assert_eq!(config.total_groups, MAX_TOTAL_GROUPS);
        assert_eq!(config.discovery_min_gap, MAX_DISCOVERY_MIN_GAP);
    }

    #[test]
    fn test_serialization_roundtrip() {
        let config = KeyringConfig {
            total_groups: 3,
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(json.contains("\"totalGroups\":3"));
        assert_eq!(KeyringConfig::from_json(&json).unwrap(), config);
    }
}
