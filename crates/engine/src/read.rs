/// Read path: `get()` and `get_entry()`.
///
/// Sources are consulted in recency order: the active table, immutable
/// tables newest first, then each level from 0 down with its nodes newest
/// first. A tombstone is a definitive answer and ends the search.
use memtable::Entry;
use std::sync::Arc;

use crate::{Engine, Result};

impl Engine {
    /// Looks up `key`.
    ///
    /// Returns `Ok(None)` when the key was never written or its newest
    /// entry is a tombstone.
    ///
    /// # Errors
    ///
    /// Any I/O or corruption error while decoding an SSTable block aborts
    /// the lookup; it is never reported as a miss.
    pub fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.get_entry(key)?.and_then(Entry::into_value))
    }

    /// Returns the newest entry for `key`, tombstones included, or `None`
    /// if no source holds one.
    pub fn get_entry(&self, key: &str) -> Result<Option<Entry>> {
        // Snapshot while the active lock is held: a concurrent rotation is
        // seen entirely or not at all.
        let version = {
            let active = self.inner.active.read();
            if let Some(entry) = active.table.get(key) {
                return Ok(Some(entry.clone()));
            }
            Arc::clone(&self.inner.version.read())
        };

        for frozen in version.immutables.iter().rev() {
            if let Some(entry) = frozen.table.get(key) {
                return Ok(Some(entry.clone()));
            }
        }

        for level in &version.levels {
            for node in level.iter().rev() {
                if let Some(entry) = node.get(key)? {
                    return Ok(Some(entry));
                }
            }
        }
        Ok(None)
    }
}
