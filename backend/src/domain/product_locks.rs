//! Per-product async locks serialising core operations within one process.
//!
//! Operations lock every product they touch in ascending id order, so two
//! operations sharing a product never interleave and never deadlock. Entries
//! are dropped from the registry once no guard or waiter holds them.

use std::collections::BTreeSet;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::{Mutex, OwnedMutexGuard};

use crate::domain::ProductId;

/// Registry of product locks.
#[derive(Debug, Default)]
pub struct ProductLocks {
    entries: Arc<DashMap<ProductId, Arc<Mutex<()>>>>,
}

impl ProductLocks {
    /// Empty lock table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire locks for `ids` in ascending order. Duplicates are ignored.
    pub async fn acquire<I>(&self, ids: I) -> ProductLockGuard
    where
        I: IntoIterator<Item = ProductId>,
    {
        let ordered: BTreeSet<ProductId> = ids.into_iter().collect();
        let mut held = Vec::with_capacity(ordered.len());
        for id in ordered {
            let mutex = self.entries.entry(id).or_default().clone();
            let guard = mutex.lock_owned().await;
            held.push((id, guard));
        }
        ProductLockGuard {
            entries: Arc::clone(&self.entries),
            held,
        }
    }

    /// Number of products with a live lock entry.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the guard holds no locks.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Locks held for one operation; released on drop.
#[derive(Debug)]
pub struct ProductLockGuard {
    entries: Arc<DashMap<ProductId, Arc<Mutex<()>>>>,
    held: Vec<(ProductId, OwnedMutexGuard<()>)>,
}

impl ProductLockGuard {
    /// Whether `id` is covered by this guard.
    pub fn covers(&self, id: ProductId) -> bool {
        self.held.iter().any(|(held, _)| *held == id)
    }
}

impl Drop for ProductLockGuard {
    fn drop(&mut self) {
        for (id, guard) in self.held.drain(..) {
            drop(guard);
            // Only the registry's own Arc left means nobody waits on it.
            self.entries
                .remove_if(&id, |_, mutex| Arc::strong_count(mutex) == 1);
        }
    }
}
