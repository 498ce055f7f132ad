/// Write path: `put()`, `delete()`, `force_flush()`, and table rotation.
///
/// Each write is appended to the active WAL before it is applied to the
/// active table. Once the table's value bytes reach the flush threshold it
/// is retired to the immutable queue and handed to the background worker.
use memtable::{Entry, SortedTable};
use std::sync::Arc;
use tracing::{debug, warn};
use wal::WalWriter;

use crate::layout::wal_path;
use crate::worker::Job;
use crate::{Active, Engine, FrozenTable, Result};

impl Engine {
    /// Inserts or overwrites `key`.
    ///
    /// # Errors
    ///
    /// I/O errors from the WAL append, or
    /// [`EngineError::CompactionFailure`](crate::EngineError::CompactionFailure)
    /// once the engine is degraded.
    pub fn put(&self, key: impl Into<String>, value: impl Into<String>) -> Result<()> {
        self.apply(Entry::update(key, value))
    }

    /// Writes a tombstone for `key`, shadowing every older value.
    pub fn delete(&self, key: impl Into<String>) -> Result<()> {
        self.apply(Entry::delete(key))
    }

    /// Retires the active table now, regardless of its size. No-op when it
    /// is empty. The flush itself still happens in the background; pair
    /// with [`wait_for_background`](Engine::wait_for_background) to wait
    /// for it.
    pub fn force_flush(&self) -> Result<()> {
        self.inner.check_health()?;
        let mut active = self.inner.active.write();
        if active.table.is_empty() {
            return Ok(());
        }
        self.rotate(&mut active)
    }

    fn apply(&self, entry: Entry) -> Result<()> {
        self.inner.check_health()?;
        let mut active = self.inner.active.write();

        // WAL first; a failed append leaves the table untouched.
        active.wal.append(&entry)?;
        active.table.set(entry);

        if active.table.approx_size() >= self.inner.config.flush_threshold_bytes {
            // The write is already durable; a failed rotation is retried on
            // the next write.
            if let Err(e) = self.rotate(&mut active) {
                warn!(error = %e, generation = active.generation, "table rotation failed");
            }
        }
        Ok(())
    }

    /// Swaps in an empty table behind a new WAL and queues the old one.
    ///
    /// The new WAL is created before anything is swapped, so a failure
    /// leaves the active table in place. The retired table is published to
    /// the immutable queue while `active` is still write-locked.
    fn rotate(&self, active: &mut Active) -> Result<()> {
        let next_generation = active.generation + 1;
        let next_wal = WalWriter::create(wal_path(&self.inner.config.wal_dir(), next_generation))?;

        let old_wal = std::mem::replace(&mut active.wal, next_wal);
        let frozen = Arc::new(FrozenTable {
            generation: active.generation,
            wal_path: old_wal.path().to_path_buf(),
            table: std::mem::replace(&mut active.table, SortedTable::new()),
        });
        drop(old_wal);
        active.generation = next_generation;

        self.inner
            .install(|v| v.immutables.push(Arc::clone(&frozen)));
        debug!(
            retired = frozen.generation,
            entries = frozen.table.len(),
            generation = next_generation,
            "active table rotated"
        );

        if let Err(e) = self.submit(Job::Flush(Arc::clone(&frozen))) {
            self.inner.degrade(format!(
                "could not queue flush of generation {}: {}",
                frozen.generation, e
            ));
            return Err(e);
        }
        Ok(())
    }
}
