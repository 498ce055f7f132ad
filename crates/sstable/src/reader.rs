use byteorder::{LittleEndian, ReadBytesExt};
use memtable::SortedTable;
use std::fs::File;
use std::io::{self, BufReader, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use crate::block::decode_block;
use crate::error::{Result, SstError};
use crate::format::{read_footer, Footer};
use crate::index::SparseIndexEntry;

/// Random-access reader over one SSTable file.
///
/// [`open`](SSTableReader::open) parses and validates the footer; the sparse
/// index and the blocks are read on demand.
pub struct SSTableReader {
    path: PathBuf,
    file: BufReader<File>,
    footer: Footer,
}

impl SSTableReader {
    /// Opens an SSTable file and reads its footer.
    ///
    /// # Errors
    ///
    /// I/O failures are returned as [`SstError::Io`]; a file that is too
    /// small, carries an unknown version, or whose footer regions do not fit
    /// the file is [`SstError::Corrupt`].
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut f = File::open(&path)?;
        let footer = read_footer(&mut f)?;
        Ok(Self {
            path,
            file: BufReader::new(f),
            footer,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn footer(&self) -> &Footer {
        &self.footer
    }

    /// Parses every sparse index entry between `index_offset` and
    /// `index_offset + index_length`.
    pub fn read_index(&mut self) -> Result<Vec<SparseIndexEntry>> {
        self.file.seek(SeekFrom::Start(self.footer.index_offset))?;
        let mut out = Vec::new();
        let mut consumed: u64 = 0;
        let mut body = Vec::new();

        while consumed < self.footer.index_length {
            let remaining = self.footer.index_length - consumed;
            if remaining < 4 {
                return Err(SstError::Corrupt("truncated sparse index length prefix".into()));
            }
            let len = self.file.read_u32::<LittleEndian>()? as u64;
            if len == 0 || len > remaining - 4 {
                return Err(SstError::Corrupt(format!(
                    "sparse index entry of {} bytes exceeds {} remaining",
                    len,
                    remaining - 4
                )));
            }
            body.resize(len as usize, 0);
            self.file.read_exact(&mut body)?;

            let entry = SparseIndexEntry::decode(&body, self.path.clone())?;
            if entry.block_index as usize != out.len() {
                return Err(SstError::Corrupt(format!(
                    "sparse index out of order: block {} at position {}",
                    entry.block_index,
                    out.len()
                )));
            }
            if u64::from(entry.data_offset) >= self.footer.data_length {
                return Err(SstError::Corrupt(format!(
                    "block offset {} beyond data region of {} bytes",
                    entry.data_offset, self.footer.data_length
                )));
            }
            out.push(entry);
            consumed += 4 + len;
        }
        Ok(out)
    }

    /// Reads, decompresses, and decodes the block at `data_offset` (relative
    /// to the data region).
    pub fn read_block(&mut self, data_offset: u32) -> Result<SortedTable> {
        let start = self.footer.data_offset + u64::from(data_offset);
        let data_end = self.footer.data_end();
        if start + 4 > data_end {
            return Err(SstError::Corrupt(format!(
                "block offset {} beyond data region",
                data_offset
            )));
        }
        self.file.seek(SeekFrom::Start(start))?;
        let len = self.file.read_u32::<LittleEndian>()? as u64;
        if start + 4 + len > data_end {
            return Err(SstError::Corrupt(format!(
                "block at {} claims {} bytes, {} remain in data region",
                data_offset,
                len,
                data_end - start - 4
            )));
        }
        let mut compressed = vec![0u8; len as usize];
        self.file.read_exact(&mut compressed).map_err(|e| match e.kind() {
            io::ErrorKind::UnexpectedEof => SstError::Corrupt("block shorter than its prefix".into()),
            _ => SstError::Io(e),
        })?;
        decode_block(&compressed)
    }

    /// Decodes every block, in ascending block order, into one table.
    pub fn restore(&mut self) -> Result<SortedTable> {
        let index = self.read_index()?;
        let mut table = SortedTable::new();
        for entry in &index {
            table.merge_owned(self.read_block(entry.data_offset)?);
        }
        Ok(table)
    }
}
