use crate::{Config, Engine};
use anyhow::Result;
use std::fs;
use std::path::{Path, PathBuf};

/// Small thresholds so tests rotate and compact quickly.
pub fn small_config(dir: &Path) -> Config {
    Config::new(dir)
        .with_flush_threshold_bytes(64)
        .with_max_level(3)
        .with_max_nodes_per_level(3)
        .with_records_per_block(4)
}

/// Config whose threshold is never reached by tests; flushes happen only
/// through `force_flush`.
pub fn manual_config(dir: &Path) -> Config {
    small_config(dir).with_flush_threshold_bytes(usize::MAX)
}

/// Writes `keys` with `value`, then flushes and waits for the worker.
pub fn flushed_batch(engine: &Engine, keys: &[&str], value: &str) -> Result<()> {
    for k in keys {
        engine.put(*k, value)?;
    }
    engine.force_flush()?;
    engine.wait_for_background()?;
    Ok(())
}

pub fn files_with_ext(dir: &Path, ext: &str) -> Vec<PathBuf> {
    let mut out: Vec<PathBuf> = fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.path())
        .filter(|p| p.is_file() && p.extension().and_then(|s| s.to_str()) == Some(ext))
        .collect();
    out.sort();
    out
}

pub fn sst_names(dir: &Path) -> Vec<String> {
    files_with_ext(dir, "sst")
        .iter()
        .filter_map(|p| p.file_name().and_then(|n| n.to_str()).map(str::to_owned))
        .collect()
}

pub fn wal_count(dir: &Path) -> usize {
    files_with_ext(&dir.join("wal_file"), "wal").len()
}
