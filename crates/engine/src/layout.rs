//! On-disk naming.
//!
//! ```text
//! <root>/LL_SSSSSS.sst          level (2 digits) and per-level sequence
//! <root>/wal_file/GGGGGGGGG.wal write-ahead log of one table generation
//! ```

use std::path::{Path, PathBuf};

pub(crate) const SST_EXT: &str = "sst";
pub(crate) const WAL_EXT: &str = "wal";
pub(crate) const TMP_SUFFIX: &str = ".sst.tmp";

pub(crate) fn sst_path(root: &Path, level: usize, seq: u64) -> PathBuf {
    root.join(format!("{:02}_{:06}.{}", level, seq, SST_EXT))
}

pub(crate) fn wal_path(wal_dir: &Path, generation: u64) -> PathBuf {
    wal_dir.join(format!("{:09}.{}", generation, WAL_EXT))
}

/// Parses `LL_SSSSSS` (the file stem) into `(level, seq)`.
pub(crate) fn parse_sst_stem(stem: &str) -> Option<(usize, u64)> {
    let (level, seq) = stem.split_once('_')?;
    if level.len() != 2 || seq.len() < 6 || !all_digits(level) || !all_digits(seq) {
        return None;
    }
    Some((level.parse().ok()?, seq.parse().ok()?))
}

pub(crate) fn parse_wal_stem(stem: &str) -> Option<u64> {
    if stem.len() < 9 || !all_digits(stem) {
        return None;
    }
    stem.parse().ok()
}

fn all_digits(s: &str) -> bool {
    !s.is_empty() && s.bytes().all(|b| b.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sst_names_round_trip() {
        let p = sst_path(Path::new("/db"), 3, 42);
        assert_eq!(p, PathBuf::from("/db/03_000042.sst"));
        let stem = p.file_stem().and_then(|s| s.to_str()).unwrap();
        assert_eq!(parse_sst_stem(stem), Some((3, 42)));
    }

    #[test]
    fn wal_names_round_trip() {
        let p = wal_path(Path::new("/db/wal_file"), 7);
        assert_eq!(p, PathBuf::from("/db/wal_file/000000007.wal"));
        assert_eq!(parse_wal_stem("000000007"), Some(7));
    }

    #[test]
    fn malformed_names_are_rejected() {
        for bad in ["", "0_000001", "00-000001", "00_00001", "ab_000001", "00_00000x", "00000001"] {
            assert_eq!(parse_sst_stem(bad), None, "{:?}", bad);
        }
        for bad in ["", "12345678", "00000000a", "wal"] {
            assert_eq!(parse_wal_stem(bad), None, "{:?}", bad);
        }
    }
}
