//! Hash ledger: the per-file side table of original content hashes.
//!
//! Each file the assembler decodes gets one entry keyed by its path relative
//! to the document root. The serializer compares a freshly computed hash with
//! the entry to decide whether the original bytes can be written back.

use indexmap::IndexMap;

use crate::types::ContentHash;

/// Ordered map of file key to the hash recorded when the file was loaded.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HashLedger {
    /// Entries in the order files were recorded.
    entries: IndexMap<String, ContentHash>,
}

impl HashLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        return Self::default();
    }

    /// Remove the entry for a file that no longer exists.
    pub fn forget(&mut self, key: &str) -> Option<ContentHash> {
        return self.entries.shift_remove(key);
    }

    /// The recorded hash for a file, if any.
    pub fn get(&self, key: &str) -> Option<&ContentHash> {
        return self.entries.get(key);
    }

    /// Whether no entries are recorded.
    pub fn is_empty(&self) -> bool {
        return self.entries.is_empty();
    }

    /// Iterate entries in recording order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &ContentHash)> {
        return self.entries.iter().map(|(key, hash)| return (key.as_str(), hash));
    }

    /// Number of recorded entries.
    pub fn len(&self) -> usize {
        return self.entries.len();
    }

    /// Whether `hash` equals the recorded hash for `key`.
    /// A file with no entry never matches.
    pub fn matches(&self, key: &str, hash: &ContentHash) -> bool {
        return self.entries.get(key).is_some_and(|recorded| return recorded == hash);
    }

    /// Record (or replace) the hash for a file.
    pub fn record(&mut self, key: impl Into<String>, hash: ContentHash) {
        self.entries.insert(key.into(), hash);
    }

    /// Move an entry to a new key, keeping its position.
    /// No-op if `from` has no entry.
    pub fn rename(&mut self, from: &str, to: &str) {
        let Some(index) = self.entries.get_index_of(from) else {
            return;
        };
        let Some((_, hash)) = self.entries.shift_remove_index(index) else {
            return;
        };
        self.entries.shift_remove(to);
        let at = index.min(self.entries.len());
        self.entries.shift_insert(at, to.to_string(), hash);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hasher::hash_bytes;

    #[test]
    fn matches_only_recorded_hash() {
        let mut ledger = HashLedger::new();
        ledger.record("paths/users.yaml", hash_bytes(b"one"));

        assert!(ledger.matches("paths/users.yaml", &hash_bytes(b"one")));
        assert!(!ledger.matches("paths/users.yaml", &hash_bytes(b"two")));
        assert!(!ledger.matches("paths/other.yaml", &hash_bytes(b"one")));
    }

    #[test]
    fn rename_keeps_position() {
        let mut ledger = HashLedger::new();
        ledger.record("a", hash_bytes(b"a"));
        ledger.record("b", hash_bytes(b"b"));
        ledger.record("c", hash_bytes(b"c"));

        ledger.rename("b", "z");

        let keys: Vec<&str> = ledger.iter().map(|(key, _)| return key).collect();
        assert_eq!(keys, ["a", "z", "c"]);
        assert!(ledger.matches("z", &hash_bytes(b"b")));
    }

    #[test]
    fn forget_removes_entry() {
        let mut ledger = HashLedger::new();
        ledger.record("openapi.yaml", hash_bytes(b"doc"));
        assert!(ledger.forget("openapi.yaml").is_some());
        assert!(ledger.is_empty());
    }
}
