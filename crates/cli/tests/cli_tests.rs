/// End-to-end tests driving the `cli` binary over stdin.
use std::io::Write;
use std::path::Path;
use std::process::{Command, Stdio};
use tempfile::tempdir;

/// Runs one CLI session against `dir` and returns its stdout.
fn run_cli(dir: &Path, commands: &str) -> String {
    let mut child = Command::new(env!("CARGO_BIN_EXE_cli"))
        .env("CASCADE_DIR", dir)
        .env("CASCADE_FLUSH_BYTES", "64")
        .env("CASCADE_MAX_NODES", "2")
        .env("CASCADE_BLOCK_RECORDS", "4")
        .env("RUST_LOG", "warn")
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .spawn()
        .expect("failed to spawn cli");

    {
        let stdin = child.stdin.as_mut().expect("failed to open stdin");
        stdin.write_all(commands.as_bytes()).expect("write commands");
        stdin.write_all(b"EXIT\n").expect("write EXIT");
    }

    let output = child.wait_with_output().expect("failed to read output");
    assert!(output.status.success(), "cli exited with {:?}", output.status);
    String::from_utf8_lossy(&output.stdout).to_string()
}

fn lines(output: &str) -> Vec<String> {
    output
        .split("> ")
        .map(|s| s.trim_end().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}

#[test]
fn basic_put_get_delete() {
    let dir = tempdir().unwrap();
    let out = run_cli(dir.path(), "PUT a 1\nPUT a 2\nGET a\nPUT b x\nDEL b\nGET b\n");
    assert_eq!(lines(&out), vec!["OK", "OK", "2", "OK", "OK", "(nil)", "bye"]);
}

#[test]
fn data_survives_restart() {
    let dir = tempdir().unwrap();

    // enough writes to rotate, flush, and compact several times
    let mut script = String::new();
    for i in 0..60 {
        script.push_str(&format!("PUT key{:02} value-{:02}\n", i, i));
    }
    script.push_str("DEL key07\n");
    run_cli(dir.path(), &script);

    let sst_count = std::fs::read_dir(dir.path())
        .unwrap()
        .filter_map(|e| e.ok())
        .filter(|e| e.path().extension().map_or(false, |x| x == "sst"))
        .count();
    assert!(sst_count > 0, "expected flushed sstables");

    let out = run_cli(dir.path(), "GET key00\nGET key07\nGET key59\n");
    assert_eq!(lines(&out), vec!["value-00", "(nil)", "value-59", "bye"]);
}

#[test]
fn stats_reports_engine_state() {
    let dir = tempdir().unwrap();
    let out = run_cli(dir.path(), "PUT k v\nSTATS\n");
    assert!(out.contains("Engine"), "got {}", out);
    assert!(out.contains("active_entries: 1"), "got {}", out);
}

#[test]
fn invalid_option_fails_to_start() {
    let dir = tempdir().unwrap();
    let output = Command::new(env!("CARGO_BIN_EXE_cli"))
        .env("CASCADE_DIR", dir.path())
        .env("CASCADE_MAX_LEVEL", "deep")
        .stdin(Stdio::null())
        .output()
        .expect("failed to run cli");
    assert!(!output.status.success());
}
