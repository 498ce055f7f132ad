use config::ConfigError;
use sstable::SstError;
use std::io;
use thiserror::Error;
use wal::WalError;

pub type Result<T> = std::result::Result<T, EngineError>;

/// Failures surfaced by [`Engine`](crate::Engine) operations.
///
/// A missing key is not an error: [`Engine::get`](crate::Engine::get)
/// returns `Ok(None)` for it.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("io error: {0}")]
    Io(#[from] io::Error),

    /// A WAL or SSTable file is readable but violates its format.
    #[error("corruption: {0}")]
    Corruption(String),

    /// The background worker could not finish a flush or compaction. The
    /// engine stays readable but rejects writes.
    #[error("background flush/compaction failed: {0}")]
    CompactionFailure(String),

    #[error("invalid configuration: {0}")]
    Config(String),
}

impl EngineError {
    pub fn is_corruption(&self) -> bool {
        matches!(self, EngineError::Corruption(_))
    }
}

impl From<WalError> for EngineError {
    fn from(e: WalError) -> Self {
        match e {
            WalError::Io(io) => EngineError::Io(io),
            corrupt @ WalError::Corrupt { .. } => EngineError::Corruption(corrupt.to_string()),
        }
    }
}

impl From<SstError> for EngineError {
    fn from(e: SstError) -> Self {
        match e {
            SstError::Io(io) => EngineError::Io(io),
            other => EngineError::Corruption(other.to_string()),
        }
    }
}

impl From<ConfigError> for EngineError {
    fn from(e: ConfigError) -> Self {
        EngineError::Config(e.to_string())
    }
}
