use super::*;
use anyhow::Result;

fn sample_table() -> SortedTable {
    let mut t = SortedTable::new();
    t.set(Entry::update("banana", "yellow"));
    t.set(Entry::update("apple", "red"));
    t.set(Entry::delete("cherry"));
    t.set(Entry::update("date", ""));
    t
}

// -------------------- Entry codec --------------------

#[test]
fn update_encoding_layout() {
    let bytes = Entry::update("k", "vv").encode();
    assert_eq!(bytes, vec![0, 1, 0, 0, 0, b'k', 2, 0, 0, 0, b'v', b'v']);
}

#[test]
fn delete_has_no_value_section() {
    let bytes = Entry::delete("key").encode();
    assert_eq!(bytes, vec![1, 3, 0, 0, 0, b'k', b'e', b'y']);
    assert_eq!(bytes.len(), Entry::delete("key").encoded_len());
}

#[test]
fn decode_inverts_encode() -> Result<()> {
    for e in [Entry::update("a", "1"), Entry::delete("gone"), Entry::update("", "")] {
        assert_eq!(Entry::decode(&e.encode())?, e);
    }
    Ok(())
}

#[test]
fn value_present_iff_update() {
    let u = Entry::update("k", "v");
    assert_eq!(u.kind(), EntryKind::Update);
    assert_eq!(u.value(), Some("v"));

    let d = Entry::delete("k");
    assert_eq!(d.kind(), EntryKind::Delete);
    assert!(d.value().is_none());
    assert!(d.is_tombstone());
}

#[test]
fn short_buffer_is_truncated() {
    let bytes = Entry::update("key", "value").encode();
    for cut in 0..bytes.len() {
        assert!(
            matches!(Entry::decode(&bytes[..cut]), Err(EntryError::Truncated { .. })),
            "cut at {} should be truncated",
            cut
        );
    }
}

#[test]
fn unknown_kind_rejected() {
    let mut bytes = Entry::delete("k").encode();
    bytes[0] = 7;
    assert_eq!(Entry::decode(&bytes), Err(EntryError::InvalidKind(7)));
}

#[test]
fn invalid_utf8_rejected() {
    let bytes = vec![1, 2, 0, 0, 0, 0xff, 0xfe];
    assert_eq!(Entry::decode(&bytes), Err(EntryError::InvalidUtf8("key")));
}

#[test]
fn trailing_bytes_rejected_for_single_entry() {
    let mut bytes = Entry::delete("k").encode();
    bytes.push(0);
    assert_eq!(Entry::decode(&bytes), Err(EntryError::TrailingBytes(1)));
}

#[test]
fn decode_entries_reads_concatenation() -> Result<()> {
    let mut buf = Vec::new();
    Entry::update("a", "1").encode_into(&mut buf);
    Entry::delete("b").encode_into(&mut buf);
    Entry::update("c", "3").encode_into(&mut buf);

    let entries = decode_entries(&buf)?;
    assert_eq!(
        entries,
        vec![Entry::update("a", "1"), Entry::delete("b"), Entry::update("c", "3")]
    );
    assert!(decode_entries(&[])?.is_empty());
    Ok(())
}

// -------------------- SortedTable --------------------

#[test]
fn set_replaces_and_get_returns_latest() {
    let mut t = SortedTable::new();
    t.set(Entry::update("a", "1"));
    t.set(Entry::update("a", "2"));
    assert_eq!(t.get("a").and_then(Entry::value), Some("2"));
    assert_eq!(t.len(), 1);
    assert!(t.get("missing").is_none());
}

#[test]
fn tombstone_is_retained() {
    let mut t = SortedTable::new();
    t.set(Entry::update("k", "v"));
    t.set(Entry::delete("k"));

    let e = t.get("k").expect("tombstone must be stored");
    assert!(e.is_tombstone());
    assert_eq!(t.len(), 1);
}

#[test]
fn approx_size_counts_value_bytes_only() {
    let mut t = SortedTable::new();
    assert_eq!(t.approx_size(), 0);
    t.set(Entry::update("long-key-not-counted", "aaa"));
    assert_eq!(t.approx_size(), 3);
    t.set(Entry::update("long-key-not-counted", "bb"));
    assert_eq!(t.approx_size(), 2);
    t.set(Entry::delete("long-key-not-counted"));
    assert_eq!(t.approx_size(), 0);
    t.set(Entry::delete("other"));
    assert_eq!(t.approx_size(), 0);
}

#[test]
fn entries_are_ascending() {
    let t = sample_table();
    let keys: Vec<&str> = t.entries().map(Entry::key).collect();
    assert_eq!(keys, vec!["apple", "banana", "cherry", "date"]);
    assert_eq!(t.first_key(), Some("apple"));
    assert_eq!(t.last_key(), Some("date"));
}

#[test]
fn serialize_deserialize_preserves_entries() -> Result<()> {
    let t = sample_table();
    let restored = SortedTable::from_serialized(&t.serialize())?;
    assert_eq!(
        restored.entries().collect::<Vec<_>>(),
        t.entries().collect::<Vec<_>>()
    );
    assert_eq!(restored.approx_size(), t.approx_size());
    Ok(())
}

#[test]
fn deserialize_later_frames_win() -> Result<()> {
    let mut first = SortedTable::new();
    first.set(Entry::update("k", "old"));
    let mut second = SortedTable::new();
    second.set(Entry::delete("k"));

    let mut stream = first.serialize();
    stream.extend(second.serialize());

    let t = SortedTable::from_serialized(&stream)?;
    assert!(t.get("k").expect("present").is_tombstone());
    Ok(())
}

#[test]
fn deserialize_rejects_overlong_prefix() {
    let mut stream = sample_table().serialize();
    stream.extend_from_slice(&100u32.to_le_bytes());
    stream.extend_from_slice(&[0, 1]);
    assert!(matches!(
        SortedTable::from_serialized(&stream),
        Err(EntryError::Truncated { .. })
    ));
}

#[test]
fn merge_order_decides_winner() {
    let mut older = SortedTable::new();
    older.set(Entry::update("a", "old"));
    older.set(Entry::update("b", "keep"));
    let mut newer = SortedTable::new();
    newer.set(Entry::update("a", "new"));
    newer.set(Entry::delete("c"));

    let mut merged = SortedTable::new();
    merged.merge(&older);
    merged.merge(&newer);
    assert_eq!(merged.get("a").and_then(Entry::value), Some("new"));
    assert_eq!(merged.get("b").and_then(Entry::value), Some("keep"));
    assert!(merged.get("c").expect("tombstone").is_tombstone());

    let mut reversed = SortedTable::new();
    reversed.merge_owned(newer);
    reversed.merge_owned(older);
    assert_eq!(reversed.get("a").and_then(Entry::value), Some("old"));
}

#[test]
fn collect_from_entries() {
    let t: SortedTable = vec![Entry::update("x", "1"), Entry::update("x", "22")]
        .into_iter()
        .collect();
    assert_eq!(t.len(), 1);
    assert_eq!(t.approx_size(), 2);
}

#[test]
fn many_keys_stay_sorted() {
    let mut t = SortedTable::new();
    for i in (0..1_000u32).rev() {
        t.set(Entry::update(format!("key{:05}", i), "v"));
    }
    let keys: Vec<&str> = t.entries().map(Entry::key).collect();
    let mut sorted = keys.clone();
    sorted.sort_unstable();
    assert_eq!(keys, sorted);
    assert_eq!(t.len(), 1_000);
    assert_eq!(t.approx_size(), 1_000);
}
