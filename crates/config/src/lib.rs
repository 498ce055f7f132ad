//! # Config - CascadeKV engine options
//!
//! Every tunable of the engine lives in [`Config`]. Options are set either
//! through the chainable `with_*` builders or from the environment via
//! [`Config::from_env`]:
//!
//! ```text
//! CASCADE_DIR            data directory            (required)
//! CASCADE_FLUSH_BYTES    flush threshold in bytes  (default: 1024)
//! CASCADE_MAX_LEVEL      deepest level, terminal   (default: 7)
//! CASCADE_MAX_NODES      nodes per level trigger   (default: 7)
//! CASCADE_BLOCK_RECORDS  records per sstable block (default: 10)
//! ```
//!
//! A zero for any numeric option falls back to its default.

use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_FLUSH_THRESHOLD_BYTES: usize = 1024;
pub const DEFAULT_MAX_LEVEL: usize = 7;
pub const DEFAULT_MAX_NODES_PER_LEVEL: usize = 7;
pub const DEFAULT_RECORDS_PER_BLOCK: usize = 10;

pub const ENV_DIR: &str = "CASCADE_DIR";
pub const ENV_FLUSH_BYTES: &str = "CASCADE_FLUSH_BYTES";
pub const ENV_MAX_LEVEL: &str = "CASCADE_MAX_LEVEL";
pub const ENV_MAX_NODES: &str = "CASCADE_MAX_NODES";
pub const ENV_BLOCK_RECORDS: &str = "CASCADE_BLOCK_RECORDS";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("data directory must not be empty")]
    EmptyDirectory,

    #[error("missing required option {0}")]
    Missing(&'static str),

    #[error("invalid value {value:?} for {name}")]
    Invalid { name: &'static str, value: String },

    #[error("records_per_block {0} exceeds the footer limit of 65535")]
    BlockTooLarge(usize),
}

/// Engine options.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Root of the data directory. SSTables live directly under it, WAL
    /// files under `wal_file/`.
    pub directory: PathBuf,
    /// Cumulative value bytes in the active table before it is retired.
    pub flush_threshold_bytes: usize,
    /// Deepest compaction level. It never overflows.
    pub max_level: usize,
    /// Node count at which a level below `max_level` is compacted.
    pub max_nodes_per_level: usize,
    /// Entries grouped into one SSTable block.
    pub records_per_block: usize,
}

impl Config {
    /// Options for `directory` with every other field at its default.
    pub fn new<P: AsRef<Path>>(directory: P) -> Self {
        Self {
            directory: directory.as_ref().to_path_buf(),
            flush_threshold_bytes: DEFAULT_FLUSH_THRESHOLD_BYTES,
            max_level: DEFAULT_MAX_LEVEL,
            max_nodes_per_level: DEFAULT_MAX_NODES_PER_LEVEL,
            records_per_block: DEFAULT_RECORDS_PER_BLOCK,
        }
    }

    #[must_use]
    pub fn with_flush_threshold_bytes(mut self, bytes: usize) -> Self {
        self.flush_threshold_bytes = or_default(bytes, DEFAULT_FLUSH_THRESHOLD_BYTES);
        self
    }

    #[must_use]
    pub fn with_max_level(mut self, level: usize) -> Self {
        self.max_level = or_default(level, DEFAULT_MAX_LEVEL);
        self
    }

    #[must_use]
    pub fn with_max_nodes_per_level(mut self, nodes: usize) -> Self {
        self.max_nodes_per_level = or_default(nodes, DEFAULT_MAX_NODES_PER_LEVEL);
        self
    }

    #[must_use]
    pub fn with_records_per_block(mut self, records: usize) -> Self {
        self.records_per_block = or_default(records, DEFAULT_RECORDS_PER_BLOCK);
        self
    }

    /// Directory holding the write-ahead logs.
    pub fn wal_dir(&self) -> PathBuf {
        self.directory.join("wal_file")
    }

    /// Checks the options that the builders cannot normalize.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.directory.as_os_str().is_empty() {
            return Err(ConfigError::EmptyDirectory);
        }
        if self.records_per_block > usize::from(u16::MAX) {
            return Err(ConfigError::BlockTooLarge(self.records_per_block));
        }
        Ok(())
    }

    /// Builds a validated config from the `CASCADE_*` environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Config::from_env) with an arbitrary variable
    /// source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let dir = lookup(ENV_DIR).ok_or(ConfigError::Missing(ENV_DIR))?;
        let config = Self::new(dir)
            .with_flush_threshold_bytes(parse_opt(&lookup, ENV_FLUSH_BYTES)?)
            .with_max_level(parse_opt(&lookup, ENV_MAX_LEVEL)?)
            .with_max_nodes_per_level(parse_opt(&lookup, ENV_MAX_NODES)?)
            .with_records_per_block(parse_opt(&lookup, ENV_BLOCK_RECORDS)?);
        config.validate()?;
        Ok(config)
    }
}

fn or_default(value: usize, default: usize) -> usize {
    if value == 0 {
        default
    } else {
        value
    }
}

/// Unset variables parse as 0, which the builders turn into the default.
fn parse_opt<F>(lookup: &F, name: &'static str) -> Result<usize, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        None => Ok(0),
        Some(raw) => raw.trim().parse().map_err(|_| ConfigError::Invalid {
            name,
            value: raw,
        }),
    }
}

#[cfg(test)]
mod tests;
