/// Background worker: flushes retired tables and compacts full levels.
///
/// Exactly one worker thread runs per engine and processes jobs in order,
/// so SSTable sequence numbers within a level are assigned monotonically.
///
/// Compaction is full-level: when level `L < max_level` holds
/// `max_nodes_per_level` nodes, all of them are merged oldest to newest
/// into one node appended to `L + 1`. The check then moves to `L + 1` and
/// repeats. `max_level` is terminal and never compacts.
use crossbeam_channel::{Receiver, Sender};
use memtable::SortedTable;
use sstable::{Node, SSTableWriter};
use std::fs;
use std::sync::Arc;
use tracing::{debug, info};

use crate::layout::sst_path;
use crate::{EngineError, FrozenTable, Inner, Result};

pub(crate) enum Job {
    Flush(Arc<FrozenTable>),
    /// Answered once every earlier job has been handled.
    Barrier(Sender<()>),
}

/// Runs until every sender is dropped.
///
/// After the first failure the engine is degraded and further flushes are
/// skipped. Their tables stay queued (still readable) and their WALs stay
/// on disk for the next open.
pub(crate) fn run(inner: &Inner, jobs: Receiver<Job>) {
    for job in jobs {
        match job {
            Job::Flush(frozen) => {
                if inner.is_degraded() {
                    debug!(generation = frozen.generation, "degraded, skipping flush");
                    continue;
                }
                if let Err(e) = flush(inner, &frozen) {
                    inner.degrade(format!("flush of generation {}: {}", frozen.generation, e));
                }
            }
            Job::Barrier(done) => {
                let _ = done.send(());
            }
        }
    }
    debug!("background worker stopped");
}

fn flush(inner: &Inner, frozen: &Arc<FrozenTable>) -> Result<()> {
    if frozen.table.is_empty() {
        inner.install(|v| v.immutables.retain(|f| !Arc::ptr_eq(f, frozen)));
        fs::remove_file(&frozen.wal_path)?;
        debug!(generation = frozen.generation, "dropped empty table");
        return Ok(());
    }

    let node = write_node(inner, 0, &frozen.table)?;
    let path = node.path().to_path_buf();
    inner.install(|v| {
        v.immutables.retain(|f| !Arc::ptr_eq(f, frozen));
        v.levels[0].push(node);
    });
    // Only now is the table durable and visible elsewhere.
    fs::remove_file(&frozen.wal_path)?;
    info!(
        generation = frozen.generation,
        entries = frozen.table.len(),
        sst = %path.display(),
        "flushed table to level 0"
    );

    compact_overflowing(inner)
}

/// Iterative cascade starting at level 0.
pub(crate) fn compact_overflowing(inner: &Inner) -> Result<()> {
    let mut level = 0;
    while level < inner.config.max_level {
        let nodes = inner.snapshot().levels[level].clone();
        if nodes.len() < inner.config.max_nodes_per_level {
            break;
        }
        compact_level(inner, level, &nodes)?;
        level += 1;
    }
    Ok(())
}

fn compact_level(inner: &Inner, level: usize, nodes: &[Arc<Node>]) -> Result<()> {
    // Ascending creation order: later nodes override earlier ones.
    let mut merged = SortedTable::new();
    for node in nodes {
        merged.merge_owned(node.merge()?);
    }

    let target = level + 1;
    let node = write_node(inner, target, &merged)?;
    let path = node.path().to_path_buf();
    inner.install(|v| {
        v.levels[level].retain(|n| !nodes.iter().any(|old| Arc::ptr_eq(n, old)));
        v.levels[target].push(node);
    });

    for old in nodes {
        fs::remove_file(old.path()).map_err(|e| {
            EngineError::CompactionFailure(format!(
                "removing compacted {}: {}",
                old.path().display(),
                e
            ))
        })?;
    }
    info!(
        level,
        target,
        inputs = nodes.len(),
        entries = merged.len(),
        sst = %path.display(),
        "compacted level"
    );
    Ok(())
}

fn write_node(inner: &Inner, level: usize, table: &SortedTable) -> Result<Arc<Node>> {
    let seq = {
        let mut next = inner.next_seq.lock();
        let seq = next[level];
        next[level] += 1;
        seq
    };
    let path = sst_path(&inner.config.directory, level, seq);
    SSTableWriter::write(&path, table, inner.config.records_per_block)?;
    Ok(Arc::new(Node::open(&path)?))
}
