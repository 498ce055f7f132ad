//! Data block codec.
//!
//! A block is the concatenation of the entry encodings for up to
//! `records_per_block` records, compressed as one independent LZ4 frame.
//! The compressed payload carries LZ4's own 4-byte uncompressed-size prefix
//! (`lz4_flex::compress_prepend_size`).

use memtable::{decode_entries, Entry, SortedTable};

use crate::error::{Result, SstError};

/// Encodes and compresses `entries` into one block payload.
pub fn encode_block<'a, I>(entries: I) -> Vec<u8>
where
    I: IntoIterator<Item = &'a Entry>,
{
    let mut raw = Vec::new();
    for entry in entries {
        entry.encode_into(&mut raw);
    }
    lz4_flex::compress_prepend_size(&raw)
}

/// Decompresses a block payload and replays its entries into a fresh table.
pub fn decode_block(compressed: &[u8]) -> Result<SortedTable> {
    let raw = lz4_flex::decompress_size_prepended(compressed)
        .map_err(|e| SstError::Corrupt(format!("block decompression failed: {}", e)))?;
    let mut table = SortedTable::new();
    for entry in decode_entries(&raw)? {
        table.set(entry);
    }
    Ok(table)
}
