//! SSTable footer: a fixed-width record at the very end of every file.
//!
//! ```text
//! [data_offset: u64][data_length: u64][index_offset: u64][index_length: u64]
//! [block_key_count: u16][blocks_per_table: u16][version: u32]
//! ```
//!
//! All fields are little-endian, 40 bytes total. The footer is serialized
//! field by field; the in-memory layout of [`Footer`] is never relied on.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{self, Read, Seek, SeekFrom, Write};

use crate::error::{Result, SstError};

/// Size of the footer in bytes: 4 * u64 + 2 * u16 + u32.
pub const FOOTER_BYTES: u64 = 8 + 8 + 8 + 8 + 2 + 2 + 4;

/// Version tag written by this implementation.
pub const FORMAT_VERSION: u32 = 1;

/// Parsed SSTable footer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Footer {
    /// Absolute offset of the first block.
    pub data_offset: u64,
    /// Byte length of the block region.
    pub data_length: u64,
    /// Absolute offset of the first sparse index entry.
    pub index_offset: u64,
    /// Byte length of the sparse index region, length prefixes included.
    pub index_length: u64,
    /// Records in the table, saturated at `u16::MAX`.
    pub block_key_count: u16,
    /// Records grouped per block by the writer.
    pub blocks_per_table: u16,
    pub version: u32,
}

impl Footer {
    pub fn write_to<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_u64::<LittleEndian>(self.data_offset)?;
        w.write_u64::<LittleEndian>(self.data_length)?;
        w.write_u64::<LittleEndian>(self.index_offset)?;
        w.write_u64::<LittleEndian>(self.index_length)?;
        w.write_u16::<LittleEndian>(self.block_key_count)?;
        w.write_u16::<LittleEndian>(self.blocks_per_table)?;
        w.write_u32::<LittleEndian>(self.version)?;
        Ok(())
    }

    pub fn read_from<R: Read>(r: &mut R) -> io::Result<Self> {
        Ok(Self {
            data_offset: r.read_u64::<LittleEndian>()?,
            data_length: r.read_u64::<LittleEndian>()?,
            index_offset: r.read_u64::<LittleEndian>()?,
            index_length: r.read_u64::<LittleEndian>()?,
            block_key_count: r.read_u16::<LittleEndian>()?,
            blocks_per_table: r.read_u16::<LittleEndian>()?,
            version: r.read_u32::<LittleEndian>()?,
        })
    }

    /// Byte offset one past the block region.
    pub fn data_end(&self) -> u64 {
        self.data_offset + self.data_length
    }

    /// Checks that the regions described by this footer fit a file of
    /// `filesize` bytes and do not overlap.
    pub fn validate(&self, filesize: u64) -> Result<()> {
        if self.version != FORMAT_VERSION {
            return Err(SstError::Corrupt(format!(
                "unsupported sstable version {}",
                self.version
            )));
        }
        let body = filesize.saturating_sub(FOOTER_BYTES);
        let data_end = self.data_offset.checked_add(self.data_length);
        let index_end = self.index_offset.checked_add(self.index_length);
        match (data_end, index_end) {
            (Some(d), Some(i)) if d <= self.index_offset && i == body => Ok(()),
            _ => Err(SstError::Corrupt(format!(
                "footer regions (data {}+{}, index {}+{}) do not fit {} bytes",
                self.data_offset, self.data_length, self.index_offset, self.index_length, body
            ))),
        }
    }
}

/// Reads and validates the footer from the last [`FOOTER_BYTES`] of `r`.
///
/// No scanning is involved: the reader seeks straight to
/// `filesize - FOOTER_BYTES`.
pub fn read_footer<R: Read + Seek>(r: &mut R) -> Result<Footer> {
    let filesize = r.seek(SeekFrom::End(0))?;
    if filesize < FOOTER_BYTES {
        return Err(SstError::Corrupt(format!(
            "file of {} bytes is too small for a {} byte footer",
            filesize, FOOTER_BYTES
        )));
    }
    r.seek(SeekFrom::Start(filesize - FOOTER_BYTES))?;
    let footer = Footer::read_from(r)?;
    footer.validate(filesize)?;
    Ok(footer)
}
