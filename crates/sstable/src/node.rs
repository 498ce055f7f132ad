//! Lookup handle over one SSTable file.
//!
//! A [`Node`] keeps the sparse index and key range in memory and decodes
//! blocks on demand into a per-node cache. Nodes are immutable for their
//! whole lifetime, so cached blocks are never invalidated.

use memtable::{Entry, SortedTable};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;

use crate::error::{Result, SstError};
use crate::index::SparseIndexEntry;
use crate::reader::SSTableReader;

pub struct Node {
    path: PathBuf,
    start_key: String,
    end_key: String,
    index: Vec<SparseIndexEntry>,
    reader: Mutex<SSTableReader>,
    cache: Mutex<HashMap<u32, Arc<SortedTable>>>,
    /// Blocks read from disk so far (cache misses).
    decoded: AtomicUsize,
}

impl Node {
    /// Opens `path`, reads its sparse index, and derives the key range from
    /// the first and last index entries.
    ///
    /// # Errors
    ///
    /// An SSTable without blocks is [`SstError::Corrupt`].
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut reader = SSTableReader::open(&path)?;
        let index = reader.read_index()?;
        let (start_key, end_key) = match (index.first(), index.last()) {
            (Some(first), Some(last)) => (first.min_key.clone(), last.max_key.clone()),
            _ => {
                return Err(SstError::Corrupt(format!(
                    "{} has an empty sparse index",
                    path.display()
                )))
            }
        };
        Ok(Self {
            path,
            start_key,
            end_key,
            index,
            reader: Mutex::new(reader),
            cache: Mutex::new(HashMap::new()),
            decoded: AtomicUsize::new(0),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn start_key(&self) -> &str {
        &self.start_key
    }

    pub fn end_key(&self) -> &str {
        &self.end_key
    }

    pub fn index(&self) -> &[SparseIndexEntry] {
        &self.index
    }

    pub fn block_count(&self) -> usize {
        self.index.len()
    }

    /// Number of blocks decoded from disk since the node was opened.
    pub fn blocks_decoded(&self) -> usize {
        self.decoded.load(Ordering::Relaxed)
    }

    /// Point lookup.
    ///
    /// Returns `Ok(Some(entry))` when this table holds a definitive answer
    /// for `key` (a value or a tombstone) and `Ok(None)` when it has nothing
    /// for it, in which case the caller moves on to the next older source.
    ///
    /// Keys outside `[start_key, end_key]` are rejected without touching
    /// disk. Inside the range the sparse index is binary-searched: blocks are
    /// disjoint and ascending, so at most one block can hold the key.
    pub fn get(&self, key: &str) -> Result<Option<Entry>> {
        if key < self.start_key.as_str() || key > self.end_key.as_str() {
            return Ok(None);
        }
        let pos = self.index.partition_point(|e| e.max_key.as_str() < key);
        match self.index.get(pos) {
            Some(entry) if entry.covers(key) => {
                let block = self.load_block(entry)?;
                Ok(block.get(key).cloned())
            }
            _ => Ok(None),
        }
    }

    /// Decodes every block, cache first, and merges them in ascending block
    /// order into one fresh table.
    pub fn merge(&self) -> Result<SortedTable> {
        let mut merged = SortedTable::new();
        for entry in &self.index {
            let cached = self.cache.lock().get(&entry.block_index).cloned();
            match cached {
                Some(block) => merged.merge(&block),
                None => merged.merge_owned(self.read_block(entry)?),
            }
        }
        Ok(merged)
    }

    fn load_block(&self, entry: &SparseIndexEntry) -> Result<Arc<SortedTable>> {
        if let Some(block) = self.cache.lock().get(&entry.block_index) {
            return Ok(Arc::clone(block));
        }
        let block = Arc::new(self.read_block(entry)?);
        let mut cache = self.cache.lock();
        Ok(Arc::clone(cache.entry(entry.block_index).or_insert(block)))
    }

    fn read_block(&self, entry: &SparseIndexEntry) -> Result<SortedTable> {
        let block = self.reader.lock().read_block(entry.data_offset)?;
        self.decoded.fetch_add(1, Ordering::Relaxed);
        debug!(
            path = %self.path.display(),
            block = entry.block_index,
            "decoded sstable block"
        );
        Ok(block)
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Node")
            .field("path", &self.path)
            .field("start_key", &self.start_key)
            .field("end_key", &self.end_key)
            .field("blocks", &self.index.len())
            .field("cached_blocks", &self.cache.lock().len())
            .finish()
    }
}
