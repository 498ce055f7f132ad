//! # Memtable - in-memory sorted table
//!
//! [`SortedTable`] is the ordered `key -> Entry` map that buffers writes
//! before they reach disk. The same structure is used for a decoded SSTable
//! block and for the merge target during compaction, so every consumer
//! resolves collisions the same way: the entry applied **last** wins.
//!
//! Deletes are never removals. A delete stores a tombstone [`Entry`] that
//! masks any older value for the key in older tables.
//!
//! ## Serialized form
//!
//! ```text
//! [entry_len: u32 LE][entry encoding] ... repeated, ascending key order
//! ```
//!
//! See [`entry`] for the encoding of a single entry.

pub mod entry;

pub use entry::{decode_entries, Entry, EntryError, EntryKind};

use byteorder::{LittleEndian, ReadBytesExt};
use std::collections::BTreeMap;

/// Ordered in-memory table with a running value-byte counter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortedTable {
    map: BTreeMap<String, Entry>,
    approx_size: usize,
}

impl SortedTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Upserts `entry`, replacing whatever was stored for its key.
    ///
    /// The size counter moves by the value-length delta; tombstones count
    /// as zero bytes.
    pub fn set(&mut self, entry: Entry) {
        let added = entry.value_len();
        if let Some(old) = self.map.insert(entry.key().to_owned(), entry) {
            self.approx_size = self.approx_size.saturating_sub(old.value_len());
        }
        self.approx_size += added;
    }

    /// Returns the stored entry for `key`, which may be a tombstone.
    pub fn get(&self, key: &str) -> Option<&Entry> {
        self.map.get(key)
    }

    /// Sum of the value lengths currently stored. Keys are not counted;
    /// this is a flush heuristic, not a memory figure.
    pub fn approx_size(&self) -> usize {
        self.approx_size
    }

    /// Number of distinct keys, tombstones included.
    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Entries in ascending key order.
    pub fn entries(&self) -> impl Iterator<Item = &Entry> {
        self.map.values()
    }

    pub fn into_entries(self) -> impl Iterator<Item = Entry> {
        self.map.into_values()
    }

    pub fn first_key(&self) -> Option<&str> {
        self.map.keys().next().map(String::as_str)
    }

    pub fn last_key(&self) -> Option<&str> {
        self.map.keys().next_back().map(String::as_str)
    }

    /// Applies every entry of `other`, in its ascending order, via [`set`].
    ///
    /// `other` overrides `self` on collisions, so callers merging several
    /// sources must invoke this oldest source first.
    ///
    /// [`set`]: SortedTable::set
    pub fn merge(&mut self, other: &SortedTable) {
        for entry in other.entries() {
            self.set(entry.clone());
        }
    }

    /// Owned variant of [`merge`](SortedTable::merge) that avoids cloning.
    pub fn merge_owned(&mut self, other: SortedTable) {
        for entry in other.into_entries() {
            self.set(entry);
        }
    }

    /// All entries, ascending, each framed with a `u32` length prefix.
    pub fn serialize(&self) -> Vec<u8> {
        let total: usize = self.entries().map(|e| 4 + e.encoded_len()).sum();
        let mut buf = Vec::with_capacity(total);
        for entry in self.entries() {
            buf.extend_from_slice(&(entry.encoded_len() as u32).to_le_bytes());
            entry.encode_into(&mut buf);
        }
        buf
    }

    /// Replays length-prefixed entries from `data` through [`set`], so a
    /// later frame for a key overrides an earlier one.
    ///
    /// [`set`]: SortedTable::set
    pub fn deserialize(&mut self, data: &[u8]) -> Result<(), EntryError> {
        let mut rdr = data;
        while !rdr.is_empty() {
            let available = rdr.len();
            let len = rdr
                .read_u32::<LittleEndian>()
                .map_err(|_| EntryError::Truncated { needed: 4, available })?
                as usize;
            if len > rdr.len() {
                return Err(EntryError::Truncated {
                    needed: len,
                    available: rdr.len(),
                });
            }
            let (frame, rest) = rdr.split_at(len);
            self.set(Entry::decode(frame)?);
            rdr = rest;
        }
        Ok(())
    }

    pub fn from_serialized(data: &[u8]) -> Result<Self, EntryError> {
        let mut table = Self::new();
        table.deserialize(data)?;
        Ok(table)
    }
}

impl FromIterator<Entry> for SortedTable {
    fn from_iter<I: IntoIterator<Item = Entry>>(iter: I) -> Self {
        let mut table = Self::new();
        for entry in iter {
            table.set(entry);
        }
        table
    }
}

#[cfg(test)]
mod tests;
