
use memtable::{Entry, SortedTable};

/// `count` keys `key0000..`, every fifth one a tombstone.
pub(crate) fn numbered_table(count: usize) -> SortedTable {
    (0..count)
        .map(|i| {
            let key = format!("key{:04}", i);
            if i % 5 == 4 {
                Entry::delete(key)
            } else {
                Entry::update(key, format!("value-{}", i))
            }
        })
        .collect()
}

pub(crate) fn make_sample_table() -> SortedTable {
    let mut t = SortedTable::new();
    t.set(Entry::update("a", "apple"));
    t.set(Entry::update("b", "banana"));
    t.set(Entry::update("c", ""));
    t.set(Entry::delete("d"));
    t
}
