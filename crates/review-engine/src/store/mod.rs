//! Review session store.
//!
//! Holds the current [`ReviewState`] snapshot and runs the dispatch loop:
//! reduce, swap the snapshot, persist changed slices, notify subscribers.

mod persistence;

pub use persistence::{SessionStorage, VIEW_MODE_KEY};

use crate::action::ReviewAction;
use crate::model::SessionKey;
use crate::reducer::reduce;
use crate::state::{DiffViewMode, ReviewState};
use log::debug;
use review_config::KeyValueStore;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, Weak};

/// Callback invoked with the new snapshot after every dispatch.
pub type Listener = Arc<dyn Fn(&ReviewState) + Send + Sync>;

struct StoreInner {
    state: Mutex<Arc<ReviewState>>,
    listeners: Mutex<Vec<(u64, Listener)>>,
    next_listener_id: AtomicU64,
    storage: Option<SessionStorage>,
}

impl StoreInner {
    fn lock_state(&self) -> MutexGuard<'_, Arc<ReviewState>> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_listeners(&self) -> MutexGuard<'_, Vec<(u64, Listener)>> {
        self.listeners.lock().unwrap_or_else(|e| e.into_inner())
    }
}

/// Shared handle to a review session store.
#[derive(Clone)]
pub struct ReviewStore {
    inner: Arc<StoreInner>,
}

impl ReviewStore {
    /// Create a store for `key`, restoring persisted slices from `backend`.
    pub fn new(
        key: SessionKey,
        default_view_mode: DiffViewMode,
        backend: Option<Arc<dyn KeyValueStore>>,
    ) -> Self {
        let storage = backend.map(|backend| SessionStorage::new(backend, &key));
        let mut state = ReviewState::new(key);
        state.diff_view_mode = default_view_mode;

        if let Some(storage) = &storage {
            state.viewed_files = Arc::new(storage.load_viewed());
            state.pending_comments = Arc::new(storage.load_pending());
            state.review_body = storage.load_review_body();
            if let Some(mode) = storage.load_view_mode() {
                state.diff_view_mode = mode;
            }
            debug!(
                "Restored {} viewed files and {} pending comments",
                state.viewed_files.len(),
                state.pending_comments.len()
            );
        }

        Self {
            inner: Arc::new(StoreInner {
                state: Mutex::new(Arc::new(state)),
                listeners: Mutex::new(Vec::new()),
                next_listener_id: AtomicU64::new(0),
                storage,
            }),
        }
    }

    /// The current snapshot.
    pub fn get_snapshot(&self) -> Arc<ReviewState> {
        self.inner.lock_state().clone()
    }

    /// Register `listener`; it stays registered while the returned
    /// subscription is alive.
    #[must_use = "dropping the subscription unsubscribes the listener"]
    pub fn subscribe(&self, listener: impl Fn(&ReviewState) + Send + Sync + 'static) -> Subscription {
        let id = self.inner.next_listener_id.fetch_add(1, Ordering::Relaxed);
        self.inner.lock_listeners().push((id, Arc::new(listener)));
        Subscription {
            store: Arc::downgrade(&self.inner),
            id,
        }
    }

    /// Apply `action` and notify every subscriber before returning.
    pub fn dispatch(&self, action: ReviewAction) {
        let (previous, next) = {
            let mut state = self.inner.lock_state();
            let previous = state.clone();
            let next = Arc::new(reduce(&previous, &action));
            *state = next.clone();
            (previous, next)
        };

        self.persist(&previous, &next);

        let listeners: Vec<Listener> = self
            .inner
            .lock_listeners()
            .iter()
            .map(|(_, listener)| listener.clone())
            .collect();
        for listener in listeners {
            listener(&next);
        }
    }

    fn persist(&self, previous: &ReviewState, next: &ReviewState) {
        let Some(storage) = &self.inner.storage else {
            return;
        };
        if !Arc::ptr_eq(&previous.viewed_files, &next.viewed_files) {
            storage.save_viewed(&next.viewed_files);
        }
        if !Arc::ptr_eq(&previous.pending_comments, &next.pending_comments) {
            storage.save_pending(&next.pending_comments);
        }
        if previous.review_body != next.review_body {
            storage.save_review_body(&next.review_body);
        }
        if previous.diff_view_mode != next.diff_view_mode {
            storage.save_view_mode(next.diff_view_mode);
        }
    }

    pub fn listener_count(&self) -> usize {
        self.inner.lock_listeners().len()
    }
}

/// Keeps a listener registered. Dropping it unsubscribes.
pub struct Subscription {
    store: Weak<StoreInner>,
    id: u64,
}

impl Subscription {
    pub fn unsubscribe(self) {
        drop(self);
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(store) = self.store.upgrade() {
            store.lock_listeners().retain(|(id, _)| *id != self.id);
        }
    }
}
