//! Bounded cache of parsed diffs keyed by content hash.

use super::LoadedDiff;
use log::debug;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};

/// Process-wide cache handle shared by every loader.
pub type SharedDiffCache = Arc<Mutex<DiffCache>>;

/// Least-recently-inserted cache of parsed diffs.
///
/// The pinned hash (the diff on screen) is never evicted; when it is the
/// oldest entry the next oldest goes instead.
#[derive(Debug)]
pub struct DiffCache {
    capacity: usize,
    entries: HashMap<String, Arc<LoadedDiff>>,
    order: VecDeque<String>,
    pinned: Option<String>,
}

impl DiffCache {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            entries: HashMap::new(),
            order: VecDeque::new(),
            pinned: None,
        }
    }

    pub fn shared(capacity: usize) -> SharedDiffCache {
        Arc::new(Mutex::new(Self::new(capacity)))
    }

    pub fn get(&self, hash: &str) -> Option<Arc<LoadedDiff>> {
        self.entries.get(hash).cloned()
    }

    pub fn contains(&self, hash: &str) -> bool {
        self.entries.contains_key(hash)
    }

    /// Insert or replace. Replacing keeps the original insertion position.
    pub fn insert(&mut self, hash: impl Into<String>, diff: Arc<LoadedDiff>) {
        let hash = hash.into();
        if self.entries.insert(hash.clone(), diff).is_none() {
            self.order.push_back(hash);
        }
        self.evict();
    }

    pub fn pin(&mut self, hash: Option<&str>) {
        self.pinned = hash.map(str::to_string);
    }

    pub fn pinned(&self) -> Option<&str> {
        self.pinned.as_deref()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    fn evict(&mut self) {
        while self.entries.len() > self.capacity {
            let victim = self
                .order
                .iter()
                .position(|hash| Some(hash.as_str()) != self.pinned.as_deref());
            let Some(position) = victim else {
                break;
            };
            if let Some(hash) = self.order.remove(position) {
                debug!("Evicting cached diff {}", hash);
                self.entries.remove(&hash);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ParsedDiff;
    use crate::navigation::NavigableIndex;

    fn loaded() -> Arc<LoadedDiff> {
        Arc::new(LoadedDiff {
            diff: ParsedDiff::default(),
            navigable: Arc::new(NavigableIndex::default()),
            new_content: None,
        })
    }

    #[test]
    fn test_evicts_oldest_insert() {
        let mut cache = DiffCache::new(2);
        cache.insert("a", loaded());
        cache.insert("b", loaded());
        // Reads do not refresh an entry
        let _ = cache.get("a");
        cache.insert("c", loaded());

        assert!(!cache.contains("a"));
        assert!(cache.contains("b"));
        assert!(cache.contains("c"));
    }

    #[test]
    fn test_pinned_entry_survives() {
        let mut cache = DiffCache::new(2);
        cache.insert("a", loaded());
        cache.pin(Some("a"));
        cache.insert("b", loaded());
        cache.insert("c", loaded());

        assert!(cache.contains("a"));
        assert!(!cache.contains("b"));
        assert!(cache.contains("c"));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn test_replace_keeps_position() {
        let mut cache = DiffCache::new(2);
        cache.insert("a", loaded());
        cache.insert("b", loaded());
        cache.insert("a", loaded());
        cache.insert("c", loaded());

        assert!(!cache.contains("a"));
        assert_eq!(cache.len(), 2);
    }
}
