//! Per-entry undo history.

use std::collections::HashMap;

use crate::entry::TextureEntry;

/// Snapshots of entries taken before each successful import, keyed by
/// logical index.
#[derive(Debug, Clone, Default)]
pub struct BackupStore {
    snapshots: HashMap<u32, Vec<TextureEntry>>,
}

impl BackupStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a snapshot for the entry's index.
    pub fn push(&mut self, entry: TextureEntry) {
        self.snapshots.entry(entry.index).or_default().push(entry);
    }

    /// Take the most recent snapshot for `index`.
    pub fn pop(&mut self, index: u32) -> Option<TextureEntry> {
        let stack = self.snapshots.get_mut(&index)?;
        let entry = stack.pop();
        if stack.is_empty() {
            self.snapshots.remove(&index);
        }
        entry
    }

    /// Number of snapshots held for `index`.
    pub fn depth(&self, index: u32) -> usize {
        self.snapshots.get(&index).map_or(0, Vec::len)
    }

    /// Drop every snapshot.
    pub fn clear(&mut self) {
        self.snapshots.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::tests::record;

    fn entry(index: u32, name: &[u8]) -> TextureEntry {
        let bytes = record(b"I8  ", index, 1, 1, name, &[vec![0]], None);
        TextureEntry::read(&bytes, 0).unwrap()
    }

    #[test]
    fn test_lifo_per_index() {
        let mut store = BackupStore::new();
        store.push(entry(1, b"a"));
        store.push(entry(1, b"b"));
        store.push(entry(2, b"c"));

        assert_eq!(store.depth(1), 2);
        assert_eq!(store.pop(1).unwrap().file_name, "b");
        assert_eq!(store.pop(1).unwrap().file_name, "a");
        assert!(store.pop(1).is_none());
        assert_eq!(store.depth(2), 1);

        store.clear();
        assert_eq!(store.depth(2), 0);
    }
}
