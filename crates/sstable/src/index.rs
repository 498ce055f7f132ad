//! Sparse index: one entry per data block, in block order.
//!
//! ```text
//! [entry_len: u32 LE]
//! [block_index: u32][data_offset: u32][min_len: u32][min_key][max_len: u32][max_key]
//! ```
//!
//! `data_offset` is relative to the start of the data region. The source
//! file is not stored on disk; the reader fills it in.

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Read;
use std::path::PathBuf;

use crate::error::{Result, SstError};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SparseIndexEntry {
    /// First key written into the block.
    pub min_key: String,
    /// Last key written into the block.
    pub max_key: String,
    pub block_index: u32,
    pub data_offset: u32,
    pub source_file: PathBuf,
}

impl SparseIndexEntry {
    /// Whether `key` falls inside this block's `[min_key, max_key]`.
    pub fn covers(&self, key: &str) -> bool {
        self.min_key.as_str() <= key && key <= self.max_key.as_str()
    }

    /// Encoded body length, excluding the `u32` frame prefix.
    pub fn encoded_len(&self) -> usize {
        4 + 4 + 4 + self.min_key.len() + 4 + self.max_key.len()
    }

    /// Appends the framed encoding (length prefix + body) to `buf`.
    pub fn encode_into(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&(self.encoded_len() as u32).to_le_bytes());
        buf.extend_from_slice(&self.block_index.to_le_bytes());
        buf.extend_from_slice(&self.data_offset.to_le_bytes());
        buf.extend_from_slice(&(self.min_key.len() as u32).to_le_bytes());
        buf.extend_from_slice(self.min_key.as_bytes());
        buf.extend_from_slice(&(self.max_key.len() as u32).to_le_bytes());
        buf.extend_from_slice(self.max_key.as_bytes());
    }

    /// Decodes an unframed body. The whole of `body` must be consumed.
    pub fn decode(body: &[u8], source_file: PathBuf) -> Result<Self> {
        let mut rdr = body;
        let block_index = read_u32(&mut rdr)?;
        let data_offset = read_u32(&mut rdr)?;
        let min_key = read_key(&mut rdr)?;
        let max_key = read_key(&mut rdr)?;
        if !rdr.is_empty() {
            return Err(SstError::Corrupt(format!(
                "{} trailing bytes in sparse index entry",
                rdr.len()
            )));
        }
        if min_key > max_key {
            return Err(SstError::Corrupt(format!(
                "sparse index entry for block {} has min key above max key",
                block_index
            )));
        }
        Ok(Self {
            min_key,
            max_key,
            block_index,
            data_offset,
            source_file,
        })
    }
}

fn read_u32(rdr: &mut &[u8]) -> Result<u32> {
    rdr.read_u32::<LittleEndian>()
        .map_err(|_| SstError::Corrupt("truncated sparse index entry".into()))
}

fn read_key(rdr: &mut &[u8]) -> Result<String> {
    let len = read_u32(rdr)? as usize;
    if len > rdr.len() {
        return Err(SstError::Corrupt(format!(
            "sparse index key of {} bytes exceeds {} remaining",
            len,
            rdr.len()
        )));
    }
    let mut bytes = vec![0u8; len];
    rdr.read_exact(&mut bytes)
        .map_err(|_| SstError::Corrupt("truncated sparse index entry".into()))?;
    String::from_utf8(bytes).map_err(|_| SstError::Corrupt("sparse index key is not utf-8".into()))
}
