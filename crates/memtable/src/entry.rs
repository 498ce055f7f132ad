//! Entry codec shared by the WAL and SSTable blocks.
//!
//! ```text
//! [kind: u8][key_len: u32 LE][key][val_len: u32 LE][value]   (Update)
//! [kind: u8][key_len: u32 LE][key]                            (Delete)
//! ```
//!
//! `kind` is `0` for an update and `1` for a delete. A delete carries no
//! value section at all.

use byteorder::{LittleEndian, ReadBytesExt};
use std::io::Read;
use thiserror::Error;

/// Errors raised while decoding an entry (or a stream of entries).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum EntryError {
    /// The buffer ended before the declared lengths were satisfied.
    #[error("truncated entry: needed {needed} more bytes, {available} available")]
    Truncated { needed: usize, available: usize },

    /// The kind byte is neither update nor delete.
    #[error("unknown entry kind {0:#04x}")]
    InvalidKind(u8),

    /// A single-entry frame held more bytes than the entry it encodes.
    #[error("{0} trailing bytes after entry")]
    TrailingBytes(usize),

    /// Key or value bytes are not valid UTF-8.
    #[error("entry {0} is not valid utf-8")]
    InvalidUtf8(&'static str),
}

/// Whether an entry sets a value or deletes the key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntryKind {
    Update,
    Delete,
}

impl EntryKind {
    fn as_byte(self) -> u8 {
        match self {
            EntryKind::Update => 0,
            EntryKind::Delete => 1,
        }
    }

    fn from_byte(b: u8) -> Result<Self, EntryError> {
        match b {
            0 => Ok(EntryKind::Update),
            1 => Ok(EntryKind::Delete),
            other => Err(EntryError::InvalidKind(other)),
        }
    }
}

/// The unit of data: a key plus either a value (update) or nothing (tombstone).
///
/// The constructors are the only way to build an entry, so `value()` is
/// `Some` exactly when `kind()` is [`EntryKind::Update`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    key: String,
    value: Option<String>,
}

impl Entry {
    /// An upsert of `key` to `value`.
    pub fn update(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: Some(value.into()),
        }
    }

    /// A tombstone for `key`.
    pub fn delete(key: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: None,
        }
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    pub fn kind(&self) -> EntryKind {
        if self.value.is_some() {
            EntryKind::Update
        } else {
            EntryKind::Delete
        }
    }

    pub fn is_tombstone(&self) -> bool {
        self.value.is_none()
    }

    /// Value bytes counted towards a table's size (0 for a tombstone).
    pub fn value_len(&self) -> usize {
        self.value.as_ref().map_or(0, String::len)
    }

    pub fn into_value(self) -> Option<String> {
        self.value
    }

    /// Number of bytes [`encode_into`](Entry::encode_into) will append.
    pub fn encoded_len(&self) -> usize {
        1 + 4 + self.key.len() + self.value.as_ref().map_or(0, |v| 4 + v.len())
    }

    /// Appends the binary encoding of this entry to `buf`.
    pub fn encode_into(&self, buf: &mut Vec<u8>) {
        buf.reserve(self.encoded_len());
        buf.push(self.kind().as_byte());
        buf.extend_from_slice(&(self.key.len() as u32).to_le_bytes());
        buf.extend_from_slice(self.key.as_bytes());
        if let Some(v) = &self.value {
            buf.extend_from_slice(&(v.len() as u32).to_le_bytes());
            buf.extend_from_slice(v.as_bytes());
        }
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        self.encode_into(&mut buf);
        buf
    }

    /// Decodes exactly one entry from `data`. Trailing bytes are rejected.
    pub fn decode(data: &[u8]) -> Result<Self, EntryError> {
        let (entry, used) = Self::decode_prefix(data)?;
        if used != data.len() {
            return Err(EntryError::TrailingBytes(data.len() - used));
        }
        Ok(entry)
    }

    /// Decodes one entry from the front of `data`, returning it together
    /// with the number of bytes consumed.
    pub fn decode_prefix(data: &[u8]) -> Result<(Self, usize), EntryError> {
        let mut rdr = data;
        let kind = EntryKind::from_byte(read_u8(&mut rdr)?)?;
        let key = read_string(&mut rdr, "key")?;
        let value = match kind {
            EntryKind::Update => Some(read_string(&mut rdr, "value")?),
            EntryKind::Delete => None,
        };
        let used = data.len() - rdr.len();
        Ok((Self { key, value }, used))
    }
}

/// Decodes a back-to-back concatenation of entry encodings (no framing).
pub fn decode_entries(mut data: &[u8]) -> Result<Vec<Entry>, EntryError> {
    let mut out = Vec::new();
    while !data.is_empty() {
        let (entry, used) = Entry::decode_prefix(data)?;
        out.push(entry);
        data = &data[used..];
    }
    Ok(out)
}

fn read_u8(rdr: &mut &[u8]) -> Result<u8, EntryError> {
    rdr.read_u8().map_err(|_| EntryError::Truncated {
        needed: 1,
        available: 0,
    })
}

fn read_string(rdr: &mut &[u8], what: &'static str) -> Result<String, EntryError> {
    let available = rdr.len();
    let len = rdr
        .read_u32::<LittleEndian>()
        .map_err(|_| EntryError::Truncated { needed: 4, available })? as usize;
    if len > rdr.len() {
        return Err(EntryError::Truncated {
            needed: len,
            available: rdr.len(),
        });
    }
    let mut bytes = vec![0u8; len];
    rdr.read_exact(&mut bytes)
        .map_err(|_| EntryError::Truncated { needed: len, available: rdr.len() })?;
    String::from_utf8(bytes).map_err(|_| EntryError::InvalidUtf8(what))
}
