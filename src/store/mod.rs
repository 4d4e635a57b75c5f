//! Ordered key-value store backing the Dex module.
//!
//! ## Architecture
//!
//! - **BTreeMap**: byte-ordered keys, so prefix scans visit ticks in price order
//! - **Journal**: a stack of undo frames; every write inside a frame records
//!   the previous value so the frame can be rolled back exactly
//! - **State root**: SHA-256 over every `(key, value)` pair in key order
//!
//! ## Atomicity
//!
//! ```text
//! begin()     push an empty undo frame
//! set/delete  record the old value in the top frame (first write wins)
//! commit()    pop the frame, merge it into its parent
//! rollback()  pop the frame, restore old values in reverse
//! ```
//!
//! Frames nest, which lets a simulation run inside a message.
//!
//! ## Example
//!
//! ```
//! use tick_dex::store::KvStore;
//!
//! let mut store = KvStore::new();
//! store.set(b"a/1".to_vec(), b"x".to_vec());
//!
//! store.begin();
//! store.set(b"a/2".to_vec(), b"y".to_vec());
//! store.rollback();
//!
//! assert_eq!(store.keys_with_prefix(b"a/").len(), 1);
//! ```

use std::collections::BTreeMap;
use std::ops::Bound;

use sha2::{Digest, Sha256};

pub mod codec;
pub mod keys;
mod state;

/// Undo log of one journal frame: key -> value before the frame's first write.
type UndoFrame = BTreeMap<Vec<u8>, Option<Vec<u8>>>;

/// In-memory ordered store with nested journaling.
#[derive(Debug, Default, Clone)]
pub struct KvStore {
    /// Committed and pending writes
    data: BTreeMap<Vec<u8>, Vec<u8>>,

    /// Open journal frames, innermost last
    journal: Vec<UndoFrame>,
}

impl KvStore {
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Size
    // ========================================================================

    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of open journal frames
    #[inline]
    pub fn depth(&self) -> usize {
        self.journal.len()
    }

    // ========================================================================
    // Reads and writes
    // ========================================================================

    pub fn get(&self, key: &[u8]) -> Option<&Vec<u8>> {
        self.data.get(key)
    }

    pub fn contains(&self, key: &[u8]) -> bool {
        self.data.contains_key(key)
    }

    pub fn set(&mut self, key: Vec<u8>, value: Vec<u8>) {
        let previous = self.data.insert(key.clone(), value);
        self.record(key, previous);
    }

    /// Remove `key`, returning the old value.
    pub fn delete(&mut self, key: &[u8]) -> Option<Vec<u8>> {
        let previous = self.data.remove(key);
        if previous.is_some() {
            self.record(key.to_vec(), previous.clone());
        }
        previous
    }

    fn record(&mut self, key: Vec<u8>, previous: Option<Vec<u8>>) {
        if let Some(frame) = self.journal.last_mut() {
            frame.entry(key).or_insert(previous);
        }
    }

    // ========================================================================
    // Prefix iteration
    // ========================================================================

    /// Every entry whose key starts with `prefix`, in key order.
    pub fn prefix_iter<'a>(
        &'a self,
        prefix: &'a [u8],
    ) -> impl Iterator<Item = (&'a Vec<u8>, &'a Vec<u8>)> + 'a {
        self.data
            .range::<[u8], _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(move |(k, _)| k.starts_with(prefix))
    }

    /// First entry under `prefix` strictly after `after` (or the first entry
    /// when `after` is `None`).
    pub fn next_in_prefix(
        &self,
        prefix: &[u8],
        after: Option<&[u8]>,
    ) -> Option<(Vec<u8>, Vec<u8>)> {
        let lower = match after {
            Some(key) => Bound::Excluded(key),
            None => Bound::Included(prefix),
        };
        self.data
            .range::<[u8], _>((lower, Bound::Unbounded))
            .next()
            .filter(|(k, _)| k.starts_with(prefix))
            .map(|(k, v)| (k.clone(), v.clone()))
    }

    /// Owned copy of every key under `prefix`, safe to mutate against.
    pub fn keys_with_prefix(&self, prefix: &[u8]) -> Vec<Vec<u8>> {
        self.prefix_iter(prefix).map(|(k, _)| k.clone()).collect()
    }

    // ========================================================================
    // Journal
    // ========================================================================

    pub fn begin(&mut self) {
        self.journal.push(UndoFrame::new());
    }

    /// Keep the writes of the innermost frame.
    pub fn commit(&mut self) {
        let Some(frame) = self.journal.pop() else {
            return;
        };
        if let Some(parent) = self.journal.last_mut() {
            for (key, previous) in frame {
                parent.entry(key).or_insert(previous);
            }
        }
    }

    /// Undo every write of the innermost frame.
    pub fn rollback(&mut self) {
        let Some(frame) = self.journal.pop() else {
            return;
        };
        for (key, previous) in frame.into_iter().rev() {
            match previous {
                Some(value) => {
                    self.data.insert(key, value);
                }
                None => {
                    self.data.remove(&key);
                }
            }
        }
    }

    // ========================================================================
    // Commitment
    // ========================================================================

    /// SHA-256 over `(len(k), k, len(v), v)` for every entry in key order.
    pub fn state_root(&self) -> [u8; 32] {
        let mut hasher = Sha256::new();
        for (key, value) in &self.data {
            hasher.update((key.len() as u32).to_be_bytes());
            hasher.update(key);
            hasher.update((value.len() as u32).to_be_bytes());
            hasher.update(value);
        }
        let mut root = [0u8; 32];
        root.copy_from_slice(&hasher.finalize());
        root
    }

    pub fn state_root_hex(&self) -> String {
        hex::encode(self.state_root())
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn kv(k: &str, v: &str) -> (Vec<u8>, Vec<u8>) {
        (k.as_bytes().to_vec(), v.as_bytes().to_vec())
    }

    #[test]
    fn test_prefix_iter_is_ordered_and_bounded() {
        let mut store = KvStore::new();
        for (k, v) in [kv("a/2", "2"), kv("a/1", "1"), kv("b/1", "x"), kv("a", "root")] {
            store.set(k, v);
        }
        let keys: Vec<_> = store.prefix_iter(b"a/").map(|(k, _)| k.clone()).collect();
        assert_eq!(keys, vec![b"a/1".to_vec(), b"a/2".to_vec()]);
        assert_eq!(
            store.next_in_prefix(b"a/", Some(b"a/1")).map(|(k, _)| k),
            Some(b"a/2".to_vec())
        );
        assert_eq!(store.next_in_prefix(b"a/", Some(b"a/2")), None);
    }

    #[test]
    fn test_rollback_restores_exact_state() {
        let mut store = KvStore::new();
        store.set(b"k1".to_vec(), b"v1".to_vec());
        store.set(b"k2".to_vec(), b"v2".to_vec());
        let root = store.state_root();

        store.begin();
        store.set(b"k1".to_vec(), b"changed".to_vec());
        store.set(b"k1".to_vec(), b"changed again".to_vec());
        store.delete(b"k2");
        store.set(b"k3".to_vec(), b"new".to_vec());
        assert_ne!(store.state_root(), root);
        store.rollback();

        assert_eq!(store.state_root(), root);
        assert_eq!(store.get(b"k1"), Some(&b"v1".to_vec()));
        assert!(!store.contains(b"k3"));
        assert_eq!(store.depth(), 0);
    }

    #[test]
    fn test_nested_commit_then_outer_rollback() {
        let mut store = KvStore::new();
        store.set(b"k".to_vec(), b"0".to_vec());
        let root = store.state_root();

        store.begin();
        store.set(b"k".to_vec(), b"1".to_vec());
        store.begin();
        store.set(b"k".to_vec(), b"2".to_vec());
        store.set(b"j".to_vec(), b"2".to_vec());
        store.commit();
        assert_eq!(store.get(b"k"), Some(&b"2".to_vec()));
        store.rollback();

        assert_eq!(store.state_root(), root);
        assert!(!store.contains(b"j"));
    }

    #[test]
    fn test_inner_rollback_keeps_outer_writes() {
        let mut store = KvStore::new();
        store.begin();
        store.set(b"a".to_vec(), b"1".to_vec());
        store.begin();
        store.set(b"a".to_vec(), b"2".to_vec());
        store.rollback();
        store.commit();
        assert_eq!(store.get(b"a"), Some(&b"1".to_vec()));
    }

    #[test]
    fn test_state_root_hex_len() {
        let store = KvStore::new();
        assert_eq!(store.state_root_hex().len(), 64);
    }
}
