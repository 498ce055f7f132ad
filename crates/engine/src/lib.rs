//! # Engine - CascadeKV Storage Engine
//!
//! The orchestrator that ties the [`memtable`], [`wal`], and [`sstable`]
//! crates together into a leveled LSM-tree key-value store.
//!
//! ## Architecture
//!
//! ```text
//! Client
//!   |
//!   v
//! ┌─────────────────────────────────────────────────────┐
//! │                       ENGINE                        │
//! │                                                     │
//! │ write.rs → WAL append → active table insert         │
//! │              |                                      │
//! │              |  (value bytes >= threshold?)         │
//! │              v                                      │
//! │           rotate() → immutable queue → Job::Flush   │
//! │                                                     │
//! │ worker.rs (one thread)                              │
//! │   flush  → L0 SST, drop WAL                         │
//! │   level L full? → compact L into L+1, repeat        │
//! │                                                     │
//! │ read.rs → active → immutables → L0 → L1 → ... Lmax  │
//! │            (first definitive answer wins)           │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Responsibilities
//!
//! | Module       | Purpose                                                  |
//! |--------------|----------------------------------------------------------|
//! | `lib.rs`     | `Engine`, shared state, accessors, health, `Drop`         |
//! | `layout`     | SST and WAL file naming                                   |
//! | `recovery`   | tmp cleanup, SST discovery, multi-WAL replay              |
//! | `write`      | `put()`, `delete()`, `force_flush()`, table rotation      |
//! | `read`       | `get()`                                                   |
//! | `worker`     | background flush and the iterative compaction cascade     |
//!
//! ## Concurrency
//!
//! `active` (table, WAL, generation) sits behind one `RwLock`. Everything
//! the background worker mutates (the immutable queue and the per-level
//! node lists) lives in an immutable `Version` swapped copy-on-write, so
//! a reader holding a snapshot never observes a list mid-edit.
//!
//! Lock order is always `active` then `version`.
//!
//! ## Crash Safety
//!
//! Every write reaches the fsynced WAL before the in-memory table. A WAL is
//! deleted only after the table it mirrors is durable as an SSTable and
//! visible in the current version.
mod error;
mod layout;
mod read;
mod recovery;
mod worker;
mod write;

pub use config::Config;
pub use error::{EngineError, Result};

use crossbeam_channel::Sender;
use memtable::SortedTable;
use parking_lot::{Mutex, RwLock};
use sstable::Node;
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{error, info};
use wal::WalWriter;
use worker::Job;

/// Background subsystem status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Health {
    Healthy,
    /// A flush or compaction failed. The message is the first failure.
    Degraded(String),
}

/// A retired table waiting for the worker to flush it.
#[derive(Debug)]
pub(crate) struct FrozenTable {
    pub(crate) generation: u64,
    pub(crate) wal_path: PathBuf,
    pub(crate) table: SortedTable,
}

/// What the worker publishes. Both lists are ordered oldest first.
#[derive(Debug, Clone, Default)]
pub(crate) struct Version {
    pub(crate) immutables: Vec<Arc<FrozenTable>>,
    pub(crate) levels: Vec<Vec<Arc<Node>>>,
}

pub(crate) struct Active {
    pub(crate) table: SortedTable,
    pub(crate) wal: WalWriter,
    pub(crate) generation: u64,
}

pub(crate) struct Inner {
    pub(crate) config: Config,
    pub(crate) active: RwLock<Active>,
    pub(crate) version: RwLock<Arc<Version>>,
    /// Next sequence number per level. Only the worker allocates.
    pub(crate) next_seq: Mutex<Vec<u64>>,
    pub(crate) health: Mutex<Health>,
}

impl Inner {
    pub(crate) fn snapshot(&self) -> Arc<Version> {
        Arc::clone(&self.version.read())
    }

    /// Applies `edit` to a copy of the current version and publishes it.
    pub(crate) fn install<F: FnOnce(&mut Version)>(&self, edit: F) {
        let mut current = self.version.write();
        let mut next = Version::clone(&current);
        edit(&mut next);
        *current = Arc::new(next);
    }

    pub(crate) fn is_degraded(&self) -> bool {
        matches!(*self.health.lock(), Health::Degraded(_))
    }

    pub(crate) fn degrade(&self, reason: String) {
        error!(%reason, "background worker failed, engine is now read-only");
        let mut health = self.health.lock();
        if *health == Health::Healthy {
            *health = Health::Degraded(reason);
        }
    }

    pub(crate) fn check_health(&self) -> Result<()> {
        match &*self.health.lock() {
            Health::Healthy => Ok(()),
            Health::Degraded(reason) => Err(EngineError::CompactionFailure(reason.clone())),
        }
    }
}

/// The storage engine.
///
/// `Engine` is `Send + Sync`; every operation takes `&self` and may be
/// called from many threads at once.
///
/// # Write Path
///
/// 1. Append the entry to the active WAL (fsynced). On failure, stop.
/// 2. Insert it into the active table.
/// 3. If the table's value bytes reach `flush_threshold_bytes`, retire it
///    to the immutable queue behind a fresh WAL and hand it to the worker.
///
/// # Read Path
///
/// Active table, immutable tables newest to oldest, then levels `0..=max`
/// with each level's nodes newest to oldest. The first value or tombstone
/// found is the answer.
///
/// # Recovery
///
/// [`Engine::open`] loads every SSTable under the data directory and
/// replays every WAL under `wal_file/`.
pub struct Engine {
    inner: Arc<Inner>,
    jobs: Option<Sender<Job>>,
    worker: Option<JoinHandle<()>>,
}

impl Engine {
    /// Opens (or creates) the store described by `config`.
    ///
    /// # Recovery Steps
    ///
    /// 1. Create `<root>` and `<root>/wal_file`.
    /// 2. Remove leftover `.sst.tmp` files from interrupted writes.
    /// 3. Open every `LL_SSSSSS.sst` as a node of level `LL`.
    /// 4. Replay WALs in generation order; all but the newest are queued
    ///    for flushing, the newest becomes the active table.
    ///
    /// # Errors
    ///
    /// Invalid options, unparsable file names, and malformed files abort
    /// the open.
    pub fn open(config: Config) -> Result<Self> {
        config.validate()?;
        std::fs::create_dir_all(&config.directory)?;
        std::fs::create_dir_all(config.wal_dir())?;

        recovery::cleanup_tmp_files(&config.directory)?;
        let (levels, next_seq) = recovery::load_levels(&config)?;
        let replayed = recovery::replay_wals(&config)?;

        info!(
            dir = %config.directory.display(),
            nodes = levels.iter().map(Vec::len).sum::<usize>(),
            immutables = replayed.frozen.len(),
            active_entries = replayed.active.table.len(),
            generation = replayed.active.generation,
            "engine opened"
        );

        let pending = replayed.frozen.clone();
        let inner = Arc::new(Inner {
            config,
            active: RwLock::new(replayed.active),
            version: RwLock::new(Arc::new(Version {
                immutables: replayed.frozen,
                levels,
            })),
            next_seq: Mutex::new(next_seq),
            health: Mutex::new(Health::Healthy),
        });

        let (tx, rx) = crossbeam_channel::unbounded();
        let worker_inner = Arc::clone(&inner);
        let worker = thread::Builder::new()
            .name("cascade-worker".into())
            .spawn(move || worker::run(&worker_inner, rx))?;

        let engine = Self {
            inner,
            jobs: Some(tx),
            worker: Some(worker),
        };
        for frozen in pending {
            engine.submit(Job::Flush(frozen))?;
        }
        Ok(engine)
    }

    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    #[must_use]
    pub fn health(&self) -> Health {
        self.inner.health.lock().clone()
    }

    /// Node count per level, index 0 first. Always `max_level + 1` long.
    #[must_use]
    pub fn level_counts(&self) -> Vec<usize> {
        self.inner.snapshot().levels.iter().map(Vec::len).collect()
    }

    /// `(start_key, end_key)` of each node at `level`, oldest node first.
    #[must_use]
    pub fn level_key_ranges(&self, level: usize) -> Vec<(String, String)> {
        self.inner
            .snapshot()
            .levels
            .get(level)
            .map(|nodes| {
                nodes
                    .iter()
                    .map(|n| (n.start_key().to_owned(), n.end_key().to_owned()))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Retired tables not yet flushed.
    #[must_use]
    pub fn immutable_count(&self) -> usize {
        self.inner.snapshot().immutables.len()
    }

    /// Entries in the active table.
    #[must_use]
    pub fn active_len(&self) -> usize {
        self.inner.active.read().table.len()
    }

    /// Blocks until every job queued before this call has been processed.
    ///
    /// # Errors
    ///
    /// [`EngineError::CompactionFailure`] if the engine is degraded.
    pub fn wait_for_background(&self) -> Result<()> {
        let (done_tx, done_rx) = crossbeam_channel::bounded(1);
        self.submit(Job::Barrier(done_tx))?;
        done_rx.recv().map_err(|_| worker_gone())?;
        self.inner.check_health()
    }

    pub(crate) fn submit(&self, job: Job) -> Result<()> {
        let jobs = self.jobs.as_ref().ok_or_else(worker_gone)?;
        jobs.send(job).map_err(|_| worker_gone())
    }
}

fn worker_gone() -> EngineError {
    EngineError::CompactionFailure("background worker is not running".into())
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("dir", &self.inner.config.directory)
            .field("active_entries", &self.active_len())
            .field("immutables", &self.immutable_count())
            .field("levels", &self.level_counts())
            .field("health", &self.health())
            .finish()
    }
}

/// Closes the job channel and waits for the worker to drain it.
///
/// The active table is not flushed: its WAL is replayed on the next open.
impl Drop for Engine {
    fn drop(&mut self) {
        drop(self.jobs.take());
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                error!("background worker panicked");
            }
        }
    }
}

#[cfg(test)]
mod tests;
