//! ALFA Wallet Vault - Partition Locks
//!
//! Advisory single-writer locks for whole-partition operations (export,
//! import, account deletion) within one process.

use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use crate::error::{VaultError, VaultResult};

/// Registry of partitions currently held by a writer
#[derive(Debug, Clone, Default)]
pub struct PartitionLocks {
    held: Arc<Mutex<HashSet<String>>>,
}

impl PartitionLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take the lock for `partition` without waiting.
    ///
    /// A second writer gets `PartitionLoad` and may retry later.
    pub fn try_acquire(&self, partition: &str) -> VaultResult<PartitionGuard> {
        let mut held = self.held.lock();
        if !held.insert(partition.to_string()) {
            return Err(VaultError::PartitionLoad(format!(
                "{} is in use by another operation",
                partition
            )));
        }
        Ok(PartitionGuard {
            held: Arc::clone(&self.held),
            partition: partition.to_string(),
        })
    }

    pub fn is_held(&self, partition: &str) -> bool {
        self.held.lock().contains(partition)
    }
}

/// Releases the partition lock on drop
#[derive(Debug)]
pub struct PartitionGuard {
    held: Arc<Mutex<HashSet<String>>>,
    partition: String,
}

impl PartitionGuard {
    pub fn partition(&self) -> &str {
        &self.partition
    }
}

impl Drop for PartitionGuard {
    fn drop(&mut self) {
        self.held.lock().remove(&self.partition);
    }
}

/// Bounded retry settings for storage contention
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub attempts: u32,
    pub backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff: Duration::from_millis(50),
        }
    }
}

impl RetryPolicy {
    /// Fail on the first busy error
    pub fn none() -> Self {
        Self {
            attempts: 1,
            backoff: Duration::ZERO,
        }
    }

    pub fn run<T, F>(&self, op: F) -> VaultResult<T>
    where
        F: FnMut() -> VaultResult<T>,
    {
        retry_busy(self.attempts, self.backoff, op)
    }
}

/// Run `op`, retrying storage contention up to `attempts` times.
///
/// The wait grows linearly: `backoff`, `2 * backoff`, ... Errors other than
/// `PartitionLoad` are returned immediately.
pub fn retry_busy<T, F>(attempts: u32, backoff: Duration, mut op: F) -> VaultResult<T>
where
    F: FnMut() -> VaultResult<T>,
{
    let attempts = attempts.max(1);
    let mut attempt = 1;
    loop {
        match op() {
            Err(e) if e.is_retryable() && attempt < attempts => {
                log::warn!("Storage busy (attempt {}/{}): {}", attempt, attempts, e);
                std::thread::sleep(backoff * attempt);
                attempt += 1;
            }
            other => return other,
        }
    }
}
