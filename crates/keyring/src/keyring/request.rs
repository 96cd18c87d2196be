//! Address derivation requests

use serde::{Deserialize, Serialize};

/// Which address [`super::Keyring::generate_and_cache_address`] should
/// produce
///
/// At most one of `address_index` and `group` may be set. With neither, the
/// lowest free index is used.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateAddressRequest {
    /// Exact derivation index
    #[serde(default)]
    pub address_index: Option<u32>,
    /// Target shard group
    #[serde(default)]
    pub group: Option<u32>,
    /// Indexes that must not be picked when searching
    #[serde(default)]
    pub skip_address_indexes: Vec<u32>,
}

impl GenerateAddressRequest {
    /// Request the address at `address_index`
    pub fn at_index(address_index: u32) -> Self {
        Self {
            address_index: Some(address_index),
            ..Default::default()
        }
    }

    /// Request the first free address in `group`
    pub fn in_group(group: u32) -> Self {
        Self {
            group: Some(group),
            ..Default::default()
        }
    }

    /// Exclude `indexes` from the search
    pub fn skipping(mut self, indexes: Vec<u32>) -> Self {
        self.skip_address_indexes = indexes;
        self
    }
}
