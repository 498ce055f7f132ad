use memtable::{Entry, SortedTable};
use std::fs::{rename, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::Path;
use tracing::debug;

use crate::block::encode_block;
use crate::error::{Result, SstError};
use crate::format::{Footer, FORMAT_VERSION};
use crate::index::SparseIndexEntry;

/// Writes a [`SortedTable`] to disk as an immutable SSTable file.
///
/// The writer is stateless and single-shot: one table in, one file out. The
/// write is crash-safe: data goes to a temporary file, is fsynced, and is
/// then atomically renamed to the final path.
pub struct SSTableWriter {}

impl SSTableWriter {
    /// Flushes `table` to a new SSTable file at `path`, grouping
    /// `records_per_block` entries per block. Returns the sparse index that
    /// was written.
    ///
    /// # File Layout
    ///
    /// ```text
    /// [BLOCKS] repeated: block_len(u32) | lz4(entry encodings)
    /// [INDEX]  repeated: entry_len(u32) | block_index(u32) | data_offset(u32)
    ///                    | min_len(u32) | min_key | max_len(u32) | max_key
    /// [FOOTER] 40 bytes, see [`Footer`]
    /// ```
    ///
    /// # Crash Safety
    ///
    /// Writes to `path.sst.tmp`, calls `sync_all()`, then renames. If the
    /// process crashes mid-write the temp file is left behind and removed on
    /// recovery.
    ///
    /// # Errors
    ///
    /// Returns [`SstError::Empty`] if the table has no entries (an SSTable
    /// must have at least one block), or any I/O failure.
    pub fn write(
        path: &Path,
        table: &SortedTable,
        records_per_block: usize,
    ) -> Result<Vec<SparseIndexEntry>> {
        if table.is_empty() {
            return Err(SstError::Empty);
        }
        let per_block = records_per_block.max(1);

        // Create temporary file next to target for atomic rename later
        let tmp_path = path.with_extension("sst.tmp");
        let raw_file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&tmp_path)?;
        let mut file = BufWriter::new(raw_file);

        let entries: Vec<&Entry> = table.entries().collect();
        let mut index: Vec<SparseIndexEntry> = Vec::with_capacity(entries.len() / per_block + 1);
        let mut offset: u64 = 0;

        // Write DATA section
        for (i, group) in entries.chunks(per_block).enumerate() {
            let payload = encode_block(group.iter().copied());
            let data_offset = u32::try_from(offset).map_err(|_| too_large("data region"))?;
            let block_len = u32::try_from(payload.len()).map_err(|_| too_large("block"))?;

            file.write_all(&block_len.to_le_bytes())?;
            file.write_all(&payload)?;

            index.push(SparseIndexEntry {
                min_key: group[0].key().to_owned(),
                max_key: group[group.len() - 1].key().to_owned(),
                block_index: i as u32,
                data_offset,
                source_file: path.to_path_buf(),
            });
            offset += 4 + payload.len() as u64;
        }
        let data_length = offset;

        // Write INDEX section
        let mut index_buf = Vec::new();
        for entry in &index {
            entry.encode_into(&mut index_buf);
        }
        file.write_all(&index_buf)?;

        let footer = Footer {
            data_offset: 0,
            data_length,
            index_offset: data_length,
            index_length: index_buf.len() as u64,
            block_key_count: u16::try_from(entries.len()).unwrap_or(u16::MAX),
            blocks_per_table: u16::try_from(per_block).unwrap_or(u16::MAX),
            version: FORMAT_VERSION,
        };
        footer.write_to(&mut file)?;

        // Flush BufWriter, then sync the underlying file
        file.flush()?;
        file.into_inner().map_err(|e| e.into_error())?.sync_all()?;

        rename(&tmp_path, path)?;

        // Fsync the parent directory so the rename itself is durable.
        if let Some(parent) = path.parent() {
            if let Ok(dir) = std::fs::File::open(parent) {
                let _ = dir.sync_all();
            }
        }

        debug!(
            path = %path.display(),
            entries = entries.len(),
            blocks = index.len(),
            "sstable written"
        );
        Ok(index)
    }
}

fn too_large(what: &str) -> SstError {
    SstError::Io(io::Error::new(
        io::ErrorKind::InvalidInput,
        format!("{} exceeds u32 offsets", what),
    ))
}
