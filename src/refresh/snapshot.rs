//! Aggregated snapshots and the cell that publishes them.
//!
//! A `SnapshotCell` holds one `Arc<Snapshot>` behind a `RwLock`. Readers
//! clone the `Arc` and drop the lock immediately; the writer builds a whole
//! new snapshot off-lock and swaps it in. A reader therefore always holds
//! either the old mapping or the new one, never a mix.

use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use uuid::Uuid;

use crate::aggregate::GroupingKey;

// ── Snapshot ────────────────────────────────────────────────────────

/// Grouped counts for one resource kind, as of one refresh cycle.
#[derive(Debug, Clone)]
pub struct Snapshot<K> {
    counts: HashMap<K, u64>,
    refresh_id: Option<Uuid>,
    refreshed_at: Option<DateTime<Utc>>,
}

impl<K> Default for Snapshot<K> {
    fn default() -> Self {
        Self {
            counts: HashMap::new(),
            refresh_id: None,
            refreshed_at: None,
        }
    }
}

impl<K: GroupingKey> Snapshot<K> {
    pub fn new(counts: HashMap<K, u64>, refresh_id: Uuid, refreshed_at: DateTime<Utc>) -> Self {
        Self {
            counts,
            refresh_id: Some(refresh_id),
            refreshed_at: Some(refreshed_at),
        }
    }

    pub fn counts(&self) -> &HashMap<K, u64> {
        &self.counts
    }

    pub fn get(&self, key: &K) -> Option<u64> {
        self.counts.get(key).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, u64)> {
        self.counts.iter().map(|(k, v)| (k, *v))
    }

    /// Number of distinct series.
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// The cycle that produced this snapshot; `None` before the first success.
    pub fn refresh_id(&self) -> Option<Uuid> {
        self.refresh_id
    }

    pub fn refreshed_at(&self) -> Option<DateTime<Utc>> {
        self.refreshed_at
    }
}

// ── Snapshot Cell ───────────────────────────────────────────────────

/// Single-writer, many-reader holder of the current snapshot.
pub struct SnapshotCell<K> {
    current: RwLock<Arc<Snapshot<K>>>,
}

impl<K> Default for SnapshotCell<K> {
    fn default() -> Self {
        Self {
            current: RwLock::new(Arc::new(Snapshot::default())),
        }
    }
}

impl<K> SnapshotCell<K> {
    pub fn new() -> Self {
        Self::default()
    }

    /// The snapshot current at call time. Never blocks beyond a swap in progress.
    pub fn load(&self) -> Arc<Snapshot<K>> {
        // The guarded value is always a whole snapshot, so a poisoned lock is still usable.
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&*guard)
    }

    /// Publish `next`, returning the snapshot it replaced.
    pub fn store(&self, next: Snapshot<K>) -> Arc<Snapshot<K>> {
        let next = Arc::new(next);
        let mut guard = self.current.write().unwrap_or_else(PoisonError::into_inner);
        std::mem::replace(&mut *guard, next)
    }
}
