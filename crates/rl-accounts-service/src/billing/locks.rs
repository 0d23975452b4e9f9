//! Per-customer mutual exclusion.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{Mutex, OwnedMutexGuard};

/// Async locks keyed by billing customer id.
///
/// Subscription changes for one customer are read-then-write sequences against
/// the provider; holding the customer's lock for the whole sequence keeps two
/// of them from interleaving inside this process.
#[derive(Default)]
pub struct CustomerLocks {
    entries: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl CustomerLocks {
    /// Create an empty lock table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Wait for and take the lock for `customer_id`.
    pub async fn acquire(&self, customer_id: &str) -> OwnedMutexGuard<()> {
        let lock = {
            let mut entries = self.entries.lock().await;
            // Entries only the table still references are idle
            entries.retain(|_, lock| Arc::strong_count(lock) > 1);
            entries
                .entry(customer_id.to_string())
                .or_default()
                .clone()
        };
        lock.lock_owned().await
    }

    /// Number of customers with a live lock entry.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    /// Whether no customer currently has a lock entry.
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}
