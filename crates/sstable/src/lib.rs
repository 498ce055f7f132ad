//! # SSTable - Sorted String Table
//!
//! Immutable, on-disk tables produced when a memtable is flushed or when a
//! level is compacted. SSTables are *write-once, read-many*: once created
//! they are never modified, only superseded and deleted by compaction.
//!
//! ## File layout
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │ DATA SECTION (blocks, ascending keys)                          │
//! │                                                               │
//! │ block_len (u32) | lz4(entry | entry | ...)                     │
//! │                                                               │
//! │ ... one block per `records_per_block` entries ...              │
//! ├───────────────────────────────────────────────────────────────┤
//! │ SPARSE INDEX (one entry per block)                             │
//! │                                                               │
//! │ entry_len (u32) | block_index (u32) | data_offset (u32)        │
//! │ min_len (u32) | min_key | max_len (u32) | max_key              │
//! ├───────────────────────────────────────────────────────────────┤
//! │ FOOTER (always last 40 bytes)                                  │
//! │                                                               │
//! │ data_offset (u64) | data_length (u64)                          │
//! │ index_offset (u64) | index_length (u64)                        │
//! │ block_key_count (u16) | blocks_per_table (u16) | version (u32) │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! All integers are little-endian. Entries use the shared codec from
//! [`memtable::entry`].

mod block;
mod error;
mod format;
mod index;
mod node;
mod reader;
mod writer;

pub use block::{decode_block, encode_block};
pub use error::{Result, SstError};
pub use format::{read_footer, Footer, FOOTER_BYTES, FORMAT_VERSION};
pub use index::SparseIndexEntry;
pub use node::Node;
pub use reader::SSTableReader;
pub use writer::SSTableWriter;

#[cfg(test)]
mod tests;
