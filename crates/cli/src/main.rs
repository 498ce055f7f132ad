//! # CLI - CascadeKV Interactive Shell
//!
//! A REPL over the CascadeKV engine. Reads commands from stdin, executes
//! them, and prints results to stdout. Logs go to stderr, so piping
//! commands through stdin gives clean, scriptable output.
//!
//! ## Commands
//!
//! ```text
//! PUT key value   Insert or update a key (SET is an alias)
//! GET key         Look up a key (prints value or "(nil)")
//! DEL key         Delete a key (writes a tombstone)
//! STATS           Print engine state
//! EXIT / QUIT     Shut down gracefully
//! ```
//!
//! ## Configuration
//!
//! ```text
//! CASCADE_DIR            data directory            (default: "data")
//! CASCADE_FLUSH_BYTES    flush threshold in bytes  (default: 1024)
//! CASCADE_MAX_LEVEL      deepest level             (default: 7)
//! CASCADE_MAX_NODES      nodes per level trigger   (default: 7)
//! CASCADE_BLOCK_RECORDS  records per sstable block (default: 10)
//! RUST_LOG               log filter                (default: "info")
//! ```
//!
//! ## Example
//!
//! ```text
//! $ cargo run -p cli
//! > PUT name Alice
//! OK
//! > GET name
//! Alice
//! > EXIT
//! bye
//! ```

use anyhow::Result;
use config::{Config, ENV_DIR};
use engine::Engine;
use std::io::{self, BufRead, Write};
use tracing_subscriber::EnvFilter;

const DEFAULT_DIR: &str = "data";

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(io::stderr)
        .with_target(false)
        .init();

    let config = Config::from_lookup(|name| {
        std::env::var(name)
            .ok()
            .or_else(|| (name == ENV_DIR).then(|| DEFAULT_DIR.to_string()))
    })?;
    let engine = Engine::open(config)?;
    tracing::info!(
        dir = %engine.config().directory.display(),
        flush_bytes = engine.config().flush_threshold_bytes,
        max_level = engine.config().max_level,
        max_nodes = engine.config().max_nodes_per_level,
        "CascadeKV started"
    );

    let stdin = io::stdin();
    let stdout = io::stdout();
    run(&engine, stdin.lock(), &mut stdout.lock())
}

/// Executes commands from `input` until EOF or `EXIT`.
fn run<R: BufRead, W: Write>(engine: &Engine, input: R, out: &mut W) -> Result<()> {
    write!(out, "> ")?;
    out.flush()?;

    for line in input.lines() {
        let line = line?;
        if !execute(engine, &line, out)? {
            break;
        }
        write!(out, "> ")?;
        out.flush()?;
    }
    Ok(())
}

/// Returns `false` once the session should end.
fn execute<W: Write>(engine: &Engine, line: &str, out: &mut W) -> Result<bool> {
    let mut parts = line.split_whitespace();
    let Some(cmd) = parts.next() else {
        return Ok(true);
    };

    match cmd.to_uppercase().as_str() {
        "PUT" | "SET" => match parts.next() {
            Some(k) => {
                let v = parts.collect::<Vec<&str>>().join(" ");
                if v.is_empty() {
                    writeln!(out, "ERR usage: PUT key value")?;
                } else {
                    match engine.put(k, v) {
                        Ok(()) => writeln!(out, "OK")?,
                        Err(e) => writeln!(out, "ERR put failed: {}", e)?,
                    }
                }
            }
            None => writeln!(out, "ERR usage: PUT key value")?,
        },
        "GET" => match parts.next() {
            Some(k) => match engine.get(k) {
                Ok(Some(v)) => writeln!(out, "{}", v)?,
                Ok(None) => writeln!(out, "(nil)")?,
                Err(e) => writeln!(out, "ERR read failed: {}", e)?,
            },
            None => writeln!(out, "ERR usage: GET key")?,
        },
        "DEL" | "DELETE" => match parts.next() {
            Some(k) => match engine.delete(k) {
                Ok(()) => writeln!(out, "OK")?,
                Err(e) => writeln!(out, "ERR del failed: {}", e)?,
            },
            None => writeln!(out, "ERR usage: DEL key")?,
        },
        "STATS" => {
            writeln!(out, "{:?}", engine)?;
        }
        "EXIT" | "QUIT" => {
            writeln!(out, "bye")?;
            return Ok(false);
        }
        other => {
            writeln!(out, "unknown command: {}", other)?;
        }
    }
    Ok(true)
}
