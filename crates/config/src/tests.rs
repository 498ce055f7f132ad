use super::*;
use anyhow::Result;
use std::collections::HashMap;

fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |name| map.get(name).cloned()
}

#[test]
fn new_uses_defaults() {
    let c = Config::new("/tmp/db");
    assert_eq!(c.directory, PathBuf::from("/tmp/db"));
    assert_eq!(c.flush_threshold_bytes, 1024);
    assert_eq!(c.max_level, 7);
    assert_eq!(c.max_nodes_per_level, 7);
    assert_eq!(c.records_per_block, 10);
    assert_eq!(c.wal_dir(), PathBuf::from("/tmp/db/wal_file"));
}

#[test]
fn builders_override_and_zero_restores_default() {
    let c = Config::new("db")
        .with_flush_threshold_bytes(64)
        .with_max_level(2)
        .with_max_nodes_per_level(3)
        .with_records_per_block(4);
    assert_eq!(
        (c.flush_threshold_bytes, c.max_level, c.max_nodes_per_level, c.records_per_block),
        (64, 2, 3, 4)
    );

    let c = c
        .with_flush_threshold_bytes(0)
        .with_max_level(0)
        .with_max_nodes_per_level(0)
        .with_records_per_block(0);
    assert_eq!(c, Config::new("db"));
}

#[test]
fn validate_rejects_empty_directory() {
    assert_eq!(Config::new("").validate(), Err(ConfigError::EmptyDirectory));
}

#[test]
fn validate_rejects_oversized_blocks() {
    let c = Config::new("db").with_records_per_block(70_000);
    assert_eq!(c.validate(), Err(ConfigError::BlockTooLarge(70_000)));
    assert!(Config::new("db").with_records_per_block(65_535).validate().is_ok());
}

#[test]
fn lookup_reads_every_option() -> Result<()> {
    let c = Config::from_lookup(lookup_from(&[
        (ENV_DIR, "/data/kv"),
        (ENV_FLUSH_BYTES, "4096"),
        (ENV_MAX_LEVEL, "3"),
        (ENV_MAX_NODES, " 5 "),
        (ENV_BLOCK_RECORDS, "16"),
    ]))?;
    assert_eq!(c.directory, PathBuf::from("/data/kv"));
    assert_eq!(c.flush_threshold_bytes, 4096);
    assert_eq!(c.max_level, 3);
    assert_eq!(c.max_nodes_per_level, 5);
    assert_eq!(c.records_per_block, 16);
    Ok(())
}

#[test]
fn lookup_defaults_unset_options() -> Result<()> {
    let c = Config::from_lookup(lookup_from(&[(ENV_DIR, "kv")]))?;
    assert_eq!(c, Config::new("kv"));
    Ok(())
}

#[test]
fn lookup_requires_directory() {
    let err = Config::from_lookup(lookup_from(&[])).unwrap_err();
    assert_eq!(err, ConfigError::Missing(ENV_DIR));
}

#[test]
fn lookup_rejects_garbage() {
    let err = Config::from_lookup(lookup_from(&[(ENV_DIR, "kv"), (ENV_MAX_LEVEL, "deep")]))
        .unwrap_err();
    assert_eq!(
        err,
        ConfigError::Invalid {
            name: ENV_MAX_LEVEL,
            value: "deep".into()
        }
    );
}
