//! Trait for writing deep links into a navigation history.

use std::sync::Mutex;

/// Navigation history the deep link is written to.
pub trait HistoryWriter: Send + Sync {
    /// Append a new entry, dropping any forward entries.
    fn push(&self, entry: &str);

    /// Overwrite the current entry.
    fn replace(&self, entry: &str);
}

#[derive(Debug, Default)]
struct HistoryInner {
    entries: Vec<String>,
    cursor: usize,
}

/// In-memory history with back/forward, used by the headless driver and tests.
#[derive(Debug, Default)]
pub struct MemoryHistory {
    inner: Mutex<HistoryInner>,
}

impl MemoryHistory {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HistoryInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// The entry the cursor points at.
    pub fn current(&self) -> Option<String> {
        let inner = self.lock();
        inner.entries.get(inner.cursor).cloned()
    }

    /// Step back, returning the entry to navigate to.
    pub fn back(&self) -> Option<String> {
        let mut inner = self.lock();
        if inner.cursor == 0 || inner.entries.is_empty() {
            return None;
        }
        inner.cursor -= 1;
        inner.entries.get(inner.cursor).cloned()
    }

    /// Step forward, returning the entry to navigate to.
    pub fn forward(&self) -> Option<String> {
        let mut inner = self.lock();
        if inner.cursor + 1 >= inner.entries.len() {
            return None;
        }
        inner.cursor += 1;
        inner.entries.get(inner.cursor).cloned()
    }

    pub fn entries(&self) -> Vec<String> {
        self.lock().entries.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl HistoryWriter for MemoryHistory {
    fn push(&self, entry: &str) {
        let mut inner = self.lock();
        if !inner.entries.is_empty() {
            let keep = inner.cursor + 1;
            inner.entries.truncate(keep);
        }
        inner.entries.push(entry.to_string());
        inner.cursor = inner.entries.len() - 1;
    }

    fn replace(&self, entry: &str) {
        let mut inner = self.lock();
        let cursor = inner.cursor;
        match inner.entries.get_mut(cursor) {
            Some(current) => *current = entry.to_string(),
            None => inner.entries.push(entry.to_string()),
        }
    }
}
