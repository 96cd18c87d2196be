//! Active-address discovery
//!
//! Restoring a wallet from its mnemonic does not tell which addresses were
//! ever used. Discovery derives addresses group by group and asks an
//! external [`AddressActivityChecker`] which of them have transacted,
//! stopping in each group once `min_gap` consecutive inactive addresses
//! follow the last active one.
//!
//! # Algorithm
//!
//! 1. Derive `min_gap` candidates in every group and check them all.
//! 2. For each group, while the trailing gap is below `min_gap`, derive
//!    `min_gap - gap` more candidates in that group and check them.
//!
//! Each step only ever moves to higher, unvisited indices, so the loop ends
//! as soon as the checker stops reporting activity.

use std::collections::{HashSet, VecDeque};

use async_trait::async_trait;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::address::DerivedAddress;
use crate::config::{
    KeyringConfig, DEFAULT_DISCOVERY_MIN_GAP, DEFAULT_TOTAL_GROUPS, MAX_DISCOVERY_BATCH_SIZE,
    MAX_DISCOVERY_MIN_GAP, MAX_TOTAL_GROUPS,
};
use crate::error::{KeyringError, KeyringResult};
use crate::mnemonic::{AddressBranch, MAX_ADDRESS_INDEX};
use crate::secure::MasterKey;

/// Answers whether addresses have ever transacted
///
/// Implementations typically query a node or explorer backend. Retry
/// policy belongs to the implementation; errors abort discovery.
#[async_trait]
pub trait AddressActivityChecker: Send + Sync {
    /// Check a batch of base58 addresses
    ///
    /// Must return exactly one flag per address, in the same order. The
    /// batch never holds more than the configured batch size.
    async fn check_addresses_active(&self, addresses: &[String]) -> anyhow::Result<Vec<bool>>;
}

/// Discovery parameters
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiscoveryOptions {
    /// Number of shard groups
    pub total_groups: u32,
    /// Inactive-address gap that ends a group
    pub min_gap: u32,
    /// Addresses per checker call
    pub batch_size: usize,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            total_groups: DEFAULT_TOTAL_GROUPS,
            min_gap: DEFAULT_DISCOVERY_MIN_GAP,
            batch_size: MAX_DISCOVERY_BATCH_SIZE,
        }
    }
}

impl From<&KeyringConfig> for DiscoveryOptions {
    fn from(config: &KeyringConfig) -> Self {
        Self {
            total_groups: config.total_groups,
            min_gap: config.discovery_min_gap,
            batch_size: config.discovery_batch_size,
        }
    }
}

impl DiscoveryOptions {
    fn validate(&self) -> KeyringResult<()> {
        if self.total_groups == 0 || self.total_groups > MAX_TOTAL_GROUPS {
            return Err(KeyringError::InvalidArguments(format!(
                "total_groups must be in 1..={}, got {}",
                MAX_TOTAL_GROUPS, self.total_groups
            )));
        }
        if self.min_gap == 0 || self.min_gap > MAX_DISCOVERY_MIN_GAP {
            return Err(KeyringError::InvalidArguments(format!(
                "min_gap must be in 1..={}, got {}",
                MAX_DISCOVERY_MIN_GAP, self.min_gap
            )));
        }
        if self.batch_size == 0 || self.batch_size > MAX_DISCOVERY_BATCH_SIZE {
            return Err(KeyringError::InvalidArguments(format!(
                "batch_size must be in 1..={}, got {}",
                MAX_DISCOVERY_BATCH_SIZE, self.batch_size
            )));
        }
        Ok(())
    }
}

/// Outcome of a discovery run
#[derive(Debug)]
pub struct DiscoveryReport {
    /// Addresses confirmed active, ordered by index
    pub addresses: Vec<DerivedAddress>,
    /// False when the run was cancelled; `addresses` then holds what was
    /// confirmed before the stop
    pub completed: bool,
}

/// Discover the active addresses below `master`
///
/// # Arguments
///
/// * `master` - Master key of the wallet
/// * `checker` - Network activity oracle
/// * `skip_indexes` - Indexes never derived or checked
/// * `options` - Group count, gap and batch size
/// * `cancel` - Checked before every checker call
///
/// # Errors
///
/// `ActivityCheck` if the checker fails or returns the wrong number of
/// flags; no partial result is returned in that case.
pub async fn discover_active_addresses(
    master: &MasterKey,
    checker: &dyn AddressActivityChecker,
    skip_indexes: &[u32],
    options: &DiscoveryOptions,
    cancel: &CancellationToken,
) -> KeyringResult<DiscoveryReport> {
    let branch = AddressBranch::new(master, options.total_groups)?;
    let skip = skip_indexes.iter().copied().collect();
    discover_in_branch(&branch, checker, skip, options, cancel).await
}

pub(crate) async fn discover_in_branch(
    branch: &AddressBranch,
    checker: &dyn AddressActivityChecker,
    skip: HashSet<u32>,
    options: &DiscoveryOptions,
    cancel: &CancellationToken,
) -> KeyringResult<DiscoveryReport> {
    options.validate()?;

    let mut scanner = GroupScanner::new(branch, options.total_groups, skip);
    let mut gaps = vec![0u32; options.total_groups as usize];
    let mut active = Vec::new();

    let mut candidates = Vec::new();
    for group in 0..options.total_groups {
        for _ in 0..options.min_gap {
            candidates.push(scanner.next_in_group(group)?);
        }
    }

    let completed =
        check_round(checker, candidates, options, cancel, &mut gaps, &mut active).await?;
    if !completed {
        return Ok(finish(active, false));
    }

    for group in 0..options.total_groups {
        while gaps[group as usize] < options.min_gap {
            let needed = options.min_gap - gaps[group as usize];
            let mut candidates = Vec::with_capacity(needed as usize);
            for _ in 0..needed {
                candidates.push(scanner.next_in_group(group)?);
            }

            let completed =
                check_round(checker, candidates, options, cancel, &mut gaps, &mut active).await?;
            if !completed {
                return Ok(finish(active, false));
            }
        }
        debug!(group, gap = gaps[group as usize], "Group discovery finished");
    }

    Ok(finish(active, true))
}

fn finish(mut active: Vec<DerivedAddress>, completed: bool) -> DiscoveryReport {
    active.sort_by_key(DerivedAddress::index);
    info!(active = active.len(), completed, "Address discovery finished");
    DiscoveryReport {
        addresses: active,
        completed,
    }
}

/// Check `candidates` in batches, updating per-group gaps in index order
///
/// Returns false if cancelled; candidates checked before the stop are
/// still accounted for.
async fn check_round(
    checker: &dyn AddressActivityChecker,
    candidates: Vec<DerivedAddress>,
    options: &DiscoveryOptions,
    cancel: &CancellationToken,
    gaps: &mut [u32],
    active: &mut Vec<DerivedAddress>,
) -> KeyringResult<bool> {
    let mut remaining = candidates.into_iter().peekable();

    while remaining.peek().is_some() {
        if cancel.is_cancelled() {
            debug!("Address discovery cancelled");
            return Ok(false);
        }

        let batch: Vec<DerivedAddress> = remaining.by_ref().take(options.batch_size).collect();
        let hashes: Vec<String> = batch.iter().map(|a| a.hash().to_string()).collect();

        debug!(batch_len = hashes.len(), "Checking address activity");
        let flags = checker
            .check_addresses_active(&hashes)
            .await
            .map_err(KeyringError::ActivityCheck)?;

        if flags.len() != batch.len() {
            return Err(KeyringError::ActivityCheck(anyhow::anyhow!(
                "checker returned {} flags for {} addresses",
                flags.len(),
                batch.len()
            )));
        }

        for (address, is_active) in batch.into_iter().zip(flags) {
            let gap = &mut gaps[address.group() as usize];
            if is_active {
                *gap = 0;
                debug!(index = address.index(), group = address.group(), "Found active address");
                active.push(address);
            } else {
                *gap += 1;
            }
        }
    }

    Ok(true)
}

/// Hands out, per group, the lowest address index not yet handed out or
/// skipped
///
/// Indices are derived once in ascending order and queued under their
/// group, so asking for several groups never derives an index twice.
struct GroupScanner<'a> {
    branch: &'a AddressBranch,
    skip: HashSet<u32>,
    next_index: u32,
    exhausted: bool,
    pending: Vec<VecDeque<DerivedAddress>>,
}

impl<'a> GroupScanner<'a> {
    fn new(branch: &'a AddressBranch, total_groups: u32, skip: HashSet<u32>) -> Self {
        Self {
            branch,
            skip,
            next_index: 0,
            exhausted: false,
            pending: (0..total_groups).map(|_| VecDeque::new()).collect(),
        }
    }

    fn next_in_group(&mut self, group: u32) -> KeyringResult<DerivedAddress> {
        loop {
            if let Some(address) = self.pending[group as usize].pop_front() {
                return Ok(address);
            }
            if self.exhausted {
                return Err(KeyringError::DerivationFailed(format!(
                    "no address index left in group {}",
                    group
                )));
            }

            let index = self.next_index;
            if index == MAX_ADDRESS_INDEX {
                self.exhausted = true;
            } else {
                self.next_index += 1;
            }
            if self.skip.contains(&index) {
                continue;
            }

            let address = self.branch.derive(index)?;
            self.pending[address.group() as usize].push_back(address);
        }
    }
}
