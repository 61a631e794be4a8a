//! # Node Payload
//!
//! An append-only dictionary log. Every write is kept until the node is
//! cleaned, so the payload grows with each write even when a key is
//! overwritten or deleted.
//!
//! ```text
//! store(1, a) store(2, b) store(1, c) store(2, None)
//!   log:      [1=a, 2=b, 1=c, 2=∅]     (non-minimal)
//!   compact:  [1=c]                    (minimal)
//! ```

use super::value_objects::EntryKey;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

/// One write in the payload log. `None` deletes the key.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadEntry {
    /// Dictionary key.
    pub key: EntryKey,
    /// Value written, or `None` for a tombstone.
    pub value: Option<Vec<u8>>,
}

impl PayloadEntry {
    /// Encoded size of this entry in bytes.
    #[must_use]
    pub fn encoded_len(&self) -> u64 {
        encoded_len(self)
    }
}

/// The accumulating dictionary a node holds while materialized.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payload {
    entries: Vec<PayloadEntry>,
}

impl Payload {
    /// Creates an empty payload.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a write. Earlier writes to `key` stay in the log.
    pub fn store(&mut self, key: EntryKey, value: Option<Vec<u8>>) {
        self.entries.push(PayloadEntry { key, value });
    }

    /// Latest live value for `key`.
    #[must_use]
    pub fn get(&self, key: EntryKey) -> Option<&[u8]> {
        self.entries
            .iter()
            .rev()
            .find(|entry| entry.key == key)
            .and_then(|entry| entry.value.as_deref())
    }

    /// Raw log, oldest write first.
    #[must_use]
    pub fn entries(&self) -> &[PayloadEntry] {
        &self.entries
    }

    /// Number of writes in the log.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing was ever written (or everything was compacted away).
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Number of keys with a live value.
    #[must_use]
    pub fn live_keys(&self) -> usize {
        self.folded().len()
    }

    /// Encoded size in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        encoded_len(&self.entries)
    }

    /// A payload is minimal when no write is shadowed and no tombstone is kept.
    #[must_use]
    pub fn is_minimal(&self) -> bool {
        let mut seen = HashSet::with_capacity(self.entries.len());
        self.entries
            .iter()
            .all(|entry| entry.value.is_some() && seen.insert(entry.key))
    }

    /// Folds the log to the last live value per key, ordered by key.
    ///
    /// Returns `(size_before, size_after)`. The size strictly drops whenever
    /// the payload was not minimal.
    pub fn compact(&mut self) -> (u64, u64) {
        let before = self.size();
        self.entries = self
            .folded()
            .into_iter()
            .map(|(key, value)| PayloadEntry {
                key,
                value: Some(value),
            })
            .collect();
        (before, self.size())
    }

    fn folded(&self) -> BTreeMap<EntryKey, Vec<u8>> {
        let mut live = BTreeMap::new();
        for entry in &self.entries {
            match &entry.value {
                Some(value) => {
                    live.insert(entry.key, value.clone());
                }
                None => {
                    live.remove(&entry.key);
                }
            }
        }
        live
    }
}

fn encoded_len<T: Serialize + ?Sized>(value: &T) -> u64 {
    // Plain structs of integers and byte vectors always serialize.
    bincode::serialized_size(value).unwrap_or(u64::MAX)
}
