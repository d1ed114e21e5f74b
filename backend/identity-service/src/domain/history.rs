//! Bounded password history.
//!
//! Each password a user sets leaves one sealed entry behind. The ledger keeps
//! at most `capacity` entries, newest append first, and on overflow evicts the
//! older entry with the smallest `created_at`. Its contents are
//! the per-user half of the token signing key, so every append or eviction
//! rotates the key.

use chrono::{DateTime, Utc};
use crypto_core::hash::sha256_hex;
use crypto_core::SealedBlob;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Number of entries kept unless configured otherwise
pub const DEFAULT_HISTORY_CAPACITY: usize = 5;

/// One sealed password digest. Immutable once created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    sealed_blob: SealedBlob,
    created_at: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn new(sealed_blob: SealedBlob, created_at: DateTime<Utc>) -> Self {
        Self {
            sealed_blob,
            created_at,
        }
    }

    pub fn sealed_blob(&self) -> &SealedBlob {
        &self.sealed_blob
    }

    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }
}

/// Capacity-bounded history for one user, most recent first
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordHistory {
    /// Ordered by append, newest first. Timestamps only decide eviction.
    entries: Vec<HistoryEntry>,
    capacity: usize,
}

impl PasswordHistory {
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    /// A capacity of 0 is raised to 1
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: Vec::with_capacity(capacity + 1),
            capacity,
        }
    }

    /// Rebuild from persisted rows in any order
    ///
    /// Rows are sorted newest first and anything beyond `capacity` is dropped.
    pub fn from_entries(mut entries: Vec<HistoryEntry>, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        entries.truncate(capacity);
        Self { entries, capacity }
    }

    /// Record a new entry as the most recent and evict if over capacity
    ///
    /// The new entry is never the one evicted: the victim is the previous
    /// entry with the smallest `created_at`, the earliest appended on ties.
    /// A `now` behind the stored timestamps (clock stepped back) therefore
    /// still changes the history.
    pub fn append(&mut self, sealed_blob: SealedBlob, now: DateTime<Utc>) -> &Self {
        self.entries.insert(0, HistoryEntry::new(sealed_blob, now));

        if self.entries.len() > self.capacity {
            let oldest = self
                .entries
                .iter()
                .enumerate()
                .skip(1)
                .rev()
                .min_by_key(|(_, entry)| entry.created_at)
                .map(|(index, _)| index);

            if let Some(index) = oldest {
                let evicted = self.entries.remove(index);
                let fingerprint = sha256_hex(evicted.sealed_blob.as_bytes());
                debug!(
                    evicted_at = %evicted.created_at,
                    fingerprint = %&fingerprint[..12],
                    "Evicted oldest password history entry"
                );
            }
        }

        self
    }

    /// Owned copy of the current state, newest first
    pub fn snapshot(&self) -> PasswordHistory {
        self.clone()
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    /// Sealed blobs in key-derivation order (newest first)
    pub fn blobs(&self) -> impl Iterator<Item = &SealedBlob> {
        self.entries.iter().map(HistoryEntry::sealed_blob)
    }

    pub fn latest(&self) -> Option<&HistoryEntry> {
        self.entries.first()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl Default for PasswordHistory {
    fn default() -> Self {
        Self::new()
    }
}
