//! Best-effort persistence of session slices.
//!
//! Reads fall back to defaults on absence or corruption; write failures are
//! logged and otherwise ignored.

use crate::model::{PendingComment, SessionKey};
use crate::state::DiffViewMode;
use log::warn;
use review_config::KeyValueStore;
use serde::de::DeserializeOwned;
use std::collections::BTreeSet;
use std::sync::Arc;

/// Process-wide key of the diff view preference.
pub const VIEW_MODE_KEY: &str = "diff-view-mode";

pub struct SessionStorage {
    backend: Arc<dyn KeyValueStore>,
    prefix: String,
}

impl SessionStorage {
    pub fn new(backend: Arc<dyn KeyValueStore>, key: &SessionKey) -> Self {
        Self {
            backend,
            prefix: key.storage_prefix(),
        }
    }

    pub fn viewed_key(&self) -> String {
        format!("{}:viewed", self.prefix)
    }

    pub fn pending_key(&self) -> String {
        format!("{}:pending", self.prefix)
    }

    pub fn review_body_key(&self) -> String {
        format!("{}:review-body", self.prefix)
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.backend.get(key) {
            Ok(value) => value,
            Err(e) => {
                warn!("Failed to read {}: {:#}", key, e);
                None
            }
        }
    }

    fn read_json<T: DeserializeOwned + Default>(&self, key: &str) -> T {
        let Some(raw) = self.read(key) else {
            return T::default();
        };
        serde_json::from_str(&raw).unwrap_or_else(|e| {
            warn!("Ignoring corrupt {}: {}", key, e);
            T::default()
        })
    }

    fn write(&self, key: &str, value: &str) {
        if let Err(e) = self.backend.set(key, value) {
            warn!("Failed to persist {}: {:#}", key, e);
        }
    }

    fn write_json<T: serde::Serialize + ?Sized>(&self, key: &str, value: &T) {
        match serde_json::to_string(value) {
            Ok(json) => self.write(key, &json),
            Err(e) => warn!("Failed to serialize {}: {}", key, e),
        }
    }

    pub fn load_viewed(&self) -> BTreeSet<String> {
        self.read_json(&self.viewed_key())
    }

    pub fn load_pending(&self) -> Vec<PendingComment> {
        self.read_json(&self.pending_key())
    }

    pub fn load_review_body(&self) -> String {
        self.read(&self.review_body_key()).unwrap_or_default()
    }

    pub fn load_view_mode(&self) -> Option<DiffViewMode> {
        match self.read(VIEW_MODE_KEY)?.as_str() {
            "unified" => Some(DiffViewMode::Unified),
            "split" => Some(DiffViewMode::Split),
            other => {
                warn!("Ignoring unknown diff view mode {:?}", other);
                None
            }
        }
    }

    pub fn save_viewed(&self, viewed: &BTreeSet<String>) {
        self.write_json(&self.viewed_key(), viewed);
    }

    pub fn save_pending(&self, pending: &[PendingComment]) {
        self.write_json(&self.pending_key(), pending);
    }

    pub fn save_review_body(&self, body: &str) {
        let key = self.review_body_key();
        if body.is_empty() {
            if let Err(e) = self.backend.remove(&key) {
                warn!("Failed to clear {}: {:#}", key, e);
            }
        } else {
            self.write(&key, body);
        }
    }

    pub fn save_view_mode(&self, mode: DiffViewMode) {
        self.write(VIEW_MODE_KEY, mode.as_str());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::LineRef;
    use pretty_assertions::assert_eq;
    use review_config::MemoryStore;

    fn storage() -> (Arc<MemoryStore>, SessionStorage) {
        let backend = Arc::new(MemoryStore::new());
        let storage = SessionStorage::new(backend.clone(), &SessionKey::new("acme", "widgets", 7));
        (backend, storage)
    }

    #[test]
    fn test_keys_use_session_prefix() {
        let (_, storage) = storage();
        assert_eq!(storage.viewed_key(), "acme-widgets-7:viewed");
        assert_eq!(storage.pending_key(), "acme-widgets-7:pending");
        assert_eq!(storage.review_body_key(), "acme-widgets-7:review-body");
    }

    #[test]
    fn test_round_trip_slices() {
        let (_, storage) = storage();
        let viewed: BTreeSet<String> = ["a.rs".to_string()].into_iter().collect();
        let pending = vec![PendingComment::new("a.rs", LineRef::right(3), "hm")];

        storage.save_viewed(&viewed);
        storage.save_pending(&pending);
        storage.save_review_body("draft");
        storage.save_view_mode(DiffViewMode::Split);

        assert_eq!(storage.load_viewed(), viewed);
        assert_eq!(storage.load_pending(), pending);
        assert_eq!(storage.load_review_body(), "draft");
        assert_eq!(storage.load_view_mode(), Some(DiffViewMode::Split));
    }

    #[test]
    fn test_viewed_stored_as_json_array() {
        let (backend, storage) = storage();
        storage.save_viewed(&["b".to_string(), "a".to_string()].into_iter().collect());
        assert_eq!(
            backend.get("acme-widgets-7:viewed").unwrap().as_deref(),
            Some(r#"["a","b"]"#)
        );
    }

    #[test]
    fn test_corrupt_values_fall_back() {
        let (backend, storage) = storage();
        backend.set("acme-widgets-7:viewed", "{not json").unwrap();
        backend.set("acme-widgets-7:pending", "42").unwrap();
        backend.set(VIEW_MODE_KEY, "sideways").unwrap();

        assert!(storage.load_viewed().is_empty());
        assert!(storage.load_pending().is_empty());
        assert_eq!(storage.load_view_mode(), None);
    }

    #[test]
    fn test_write_failure_is_swallowed() {
        let (backend, storage) = storage();
        backend.set_fail_writes(true);
        storage.save_review_body("lost");
        assert_eq!(storage.load_review_body(), "");
    }
}
