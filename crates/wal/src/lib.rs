//! # WAL - Write-Ahead Log
//!
//! Provides crash-safe durability for one memtable generation.
//!
//! Every mutation is encoded as an [`Entry`] and appended to the WAL, and the
//! file is fsynced **before** the corresponding in-memory update. On restart
//! the WAL is replayed into a fresh [`SortedTable`], reconstructing the last
//! state of every key.
//!
//! ## Binary Record Format
//!
//! ```text
//! [entry_len: u32 LE][entry encoding ...]
//! ```
//!
//! The entry encoding is the shared codec from [`memtable::entry`]. The log
//! ends at end-of-file, at a zero length prefix, or at a short read; a short
//! read is how a crash in the middle of an append shows up, and the partial
//! tail is dropped.
//!
//! ## Example
//!
//! ```rust,no_run
//! use memtable::{Entry, SortedTable};
//! use wal::{WalReader, WalWriter};
//!
//! let mut w = WalWriter::create("000000001.wal").unwrap();
//! w.append(&Entry::update("hello", "world")).unwrap();
//! drop(w);
//!
//! let mut table = SortedTable::new();
//! WalReader::open("000000001.wal").unwrap().replay_into(&mut table).unwrap();
//! ```

use byteorder::{LittleEndian, ReadBytesExt};
use memtable::{Entry, EntryError, SortedTable};
use std::fs::{File, OpenOptions};
use std::io::{self, BufReader, Read, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::warn;

/// Errors that can occur during WAL operations.
#[derive(Debug, Error)]
pub enum WalError {
    /// An underlying I/O error.
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// A complete frame held bytes that do not decode as an entry.
    #[error("corrupt record at offset {offset}: {source}")]
    Corrupt {
        offset: u64,
        #[source]
        source: EntryError,
    },
}

/// Append-only WAL writer.
///
/// Each record is framed in an in-memory buffer and written with a single
/// `write_all`, then the file is fsynced before [`append`](WalWriter::append)
/// returns.
pub struct WalWriter {
    file: File,
    path: PathBuf,
    /// Reusable scratch buffer to avoid allocation on every append.
    buf: Vec<u8>,
}

impl WalWriter {
    /// Opens (or creates) a WAL file in append mode.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self, WalError> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            file,
            path,
            buf: Vec::with_capacity(256),
        })
    }

    /// Encodes `entry` and appends it to the log, fsyncing before returning.
    ///
    /// Layout: `[entry_len: u32 LE][entry bytes...]`
    pub fn append(&mut self, entry: &Entry) -> Result<(), WalError> {
        let len = entry.encoded_len();
        if len > u32::MAX as usize {
            return Err(WalError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                "WAL record too large (exceeds u32::MAX bytes)",
            )));
        }

        self.buf.clear();
        self.buf.extend_from_slice(&(len as u32).to_le_bytes());
        entry.encode_into(&mut self.buf);

        self.file.write_all(&self.buf)?;
        self.file.flush()?;
        self.file.sync_all()?;
        Ok(())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Sequential WAL reader.
///
/// Generic over any `Read` implementor so tests can replay in-memory
/// buffers (`Cursor<Vec<u8>>`) as well as real files.
pub struct WalReader<R: Read> {
    rdr: BufReader<R>,
    offset: u64,
}

impl WalReader<File> {
    /// Opens an existing WAL file for sequential replay.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<WalReader<File>, WalError> {
        let f = File::open(path)?;
        Ok(WalReader::from_reader(f))
    }
}

impl<R: Read> WalReader<R> {
    pub fn from_reader(reader: R) -> Self {
        WalReader {
            rdr: BufReader::new(reader),
            offset: 0,
        }
    }

    /// Bytes of complete frames consumed so far. After a replay this is
    /// where a torn tail, if any, begins.
    pub fn valid_len(&self) -> u64 {
        self.offset
    }

    /// Replays every complete record, calling `apply` for each entry in log
    /// order. Returns the number of entries applied.
    ///
    /// # Termination
    ///
    /// - **Clean EOF** or a **zero length prefix** -> `Ok`.
    /// - **Short read** of the prefix or the body (crash mid-append) -> `Ok`
    ///   after all complete records before it.
    /// - A complete frame that fails to decode -> `Err(WalError::Corrupt)`.
    /// - Any other I/O failure -> `Err(WalError::Io)`.
    pub fn replay<F>(&mut self, mut apply: F) -> Result<usize, WalError>
    where
        F: FnMut(Entry),
    {
        let mut body = Vec::with_capacity(256);
        let mut applied = 0usize;

        loop {
            let frame_start = self.offset;
            let len = match self.rdr.read_u32::<LittleEndian>() {
                Ok(0) => return Ok(applied),
                Ok(v) => v as u64,
                Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => return Ok(applied),
                Err(e) => return Err(WalError::Io(e)),
            };

            // `take` bounds the allocation by what is actually on disk, so a
            // torn length prefix cannot trigger a huge allocation.
            body.clear();
            let read = (&mut self.rdr).take(len).read_to_end(&mut body)? as u64;
            if read < len {
                warn!(
                    offset = frame_start,
                    expected = len,
                    found = read,
                    "dropping truncated WAL tail"
                );
                return Ok(applied);
            }
            self.offset += 4 + len;

            let entry = Entry::decode(&body).map_err(|source| WalError::Corrupt {
                offset: frame_start,
                source,
            })?;
            apply(entry);
            applied += 1;
        }
    }

    /// Replays the log into `table` via [`SortedTable::set`], so the last
    /// record for a key wins.
    pub fn replay_into(&mut self, table: &mut SortedTable) -> Result<usize, WalError> {
        self.replay(|entry| table.set(entry))
    }
}
