/// Cold start: temp file cleanup, SSTable discovery, and WAL replay.
///
/// Nodes are rebuilt from file names plus each file's own footer and
/// sparse index; WAL replay is only needed for tables that never reached
/// an SSTable.
use config::Config;
use memtable::SortedTable;
use sstable::Node;
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{info, warn};
use wal::{WalReader, WalWriter};

use crate::layout::{
    parse_sst_stem, parse_wal_stem, wal_path, SST_EXT, TMP_SUFFIX, WAL_EXT,
};
use crate::{Active, EngineError, FrozenTable, Result};

pub(crate) struct Replayed {
    /// Every WAL but the newest, oldest first.
    pub(crate) frozen: Vec<Arc<FrozenTable>>,
    pub(crate) active: Active,
}

/// Removes `*.sst.tmp` files left by writes interrupted before the rename.
pub(crate) fn cleanup_tmp_files(root: &Path) -> Result<()> {
    for entry in fs::read_dir(root)? {
        let entry = entry?;
        if !entry.file_type()?.is_file() {
            continue;
        }
        let path = entry.path();
        let is_tmp = path
            .file_name()
            .and_then(|n| n.to_str())
            .map_or(false, |n| n.ends_with(TMP_SUFFIX));
        if is_tmp {
            warn!(path = %path.display(), "removing leftover temporary sstable");
            fs::remove_file(&path)?;
        }
    }
    Ok(())
}

/// Opens every `LL_SSSSSS.sst` under `root`.
///
/// Returns `max_level + 1` node lists, each ordered by sequence, and the
/// next sequence number for every level.
pub(crate) fn load_levels(config: &Config) -> Result<(Vec<Vec<Arc<Node>>>, Vec<u64>)> {
    let level_count = config.max_level + 1;
    let mut found: Vec<(usize, u64, PathBuf)> = Vec::new();

    for path in files_with_ext(&config.directory, SST_EXT)? {
        let (level, seq) = stem(&path)
            .and_then(parse_sst_stem)
            .ok_or_else(|| bad_name(&path))?;
        if level >= level_count {
            return Err(EngineError::Config(format!(
                "{} is at level {} but max_level is {}",
                path.display(),
                level,
                config.max_level
            )));
        }
        found.push((level, seq, path));
    }
    found.sort();

    let mut levels = vec![Vec::new(); level_count];
    let mut next_seq = vec![0u64; level_count];
    for (level, seq, path) in found {
        levels[level].push(Arc::new(Node::open(&path)?));
        next_seq[level] = seq + 1;
    }
    Ok((levels, next_seq))
}

/// Replays every WAL under `wal_file/` in generation order.
///
/// The newest WAL is reopened for append and becomes the active table.
/// When none exist, generation 0 is started.
pub(crate) fn replay_wals(config: &Config) -> Result<Replayed> {
    let wal_dir = config.wal_dir();
    let mut generations = Vec::new();
    for path in files_with_ext(&wal_dir, WAL_EXT)? {
        let generation = stem(&path)
            .and_then(parse_wal_stem)
            .ok_or_else(|| bad_name(&path))?;
        generations.push((generation, path));
    }
    generations.sort();

    let newest = generations.pop();
    let mut frozen = Vec::with_capacity(generations.len());
    for (generation, path) in generations {
        let (table, _) = replay(&path)?;
        frozen.push(Arc::new(FrozenTable {
            generation,
            wal_path: path,
            table,
        }));
    }

    let (generation, path, table) = match newest {
        Some((generation, path)) => {
            let (table, valid) = replay(&path)?;
            // Appending after a torn tail would hide every later record
            // from the next replay.
            cut_torn_tail(&path, valid)?;
            (generation, path, table)
        }
        None => (0, wal_path(&wal_dir, 0), SortedTable::new()),
    };
    let wal = WalWriter::create(&path)?;
    Ok(Replayed {
        frozen,
        active: Active {
            table,
            wal,
            generation,
        },
    })
}

/// Returns the replayed table and the length of its complete frames.
fn replay(path: &Path) -> Result<(SortedTable, u64)> {
    let mut table = SortedTable::new();
    let mut reader = WalReader::open(path)?;
    let records = reader.replay_into(&mut table)?;
    info!(path = %path.display(), records, "replayed wal");
    Ok((table, reader.valid_len()))
}

fn cut_torn_tail(path: &Path, valid: u64) -> Result<()> {
    let file = OpenOptions::new().write(true).open(path)?;
    let len = file.metadata()?.len();
    if len > valid {
        warn!(path = %path.display(), valid, len, "truncating torn wal tail");
        file.set_len(valid)?;
        file.sync_all()?;
    }
    Ok(())
}

fn files_with_ext(dir: &Path, ext: &str) -> Result<Vec<PathBuf>> {
    let mut out = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_file() && path.extension().map_or(false, |e| e == ext) {
            out.push(path);
        }
    }
    Ok(out)
}

fn stem(path: &Path) -> Option<&str> {
    path.file_stem().and_then(|s| s.to_str())
}

fn bad_name(path: &Path) -> EngineError {
    EngineError::Corruption(format!("unrecognized file name {}", path.display()))
}
