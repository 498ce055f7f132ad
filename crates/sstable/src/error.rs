use memtable::EntryError;
use std::io;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, SstError>;

/// Errors produced while writing or reading SSTable files.
#[derive(Debug, Error)]
pub enum SstError {
    /// Open/read/write/seek/fsync failure.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// The file is readable but violates the format contract.
    #[error("corrupt sstable: {0}")]
    Corrupt(String),

    /// Writing a table with no entries was requested.
    #[error("refusing to write an empty SSTable")]
    Empty,
}

impl SstError {
    pub fn is_corruption(&self) -> bool {
        matches!(self, SstError::Corrupt(_))
    }
}

impl From<EntryError> for SstError {
    fn from(e: EntryError) -> Self {
        SstError::Corrupt(format!("bad entry in block: {}", e))
    }
}
