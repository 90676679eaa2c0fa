//! Two-way binding between the store and the navigation history.

use super::codec::{DeepLink, LinkFocus};
use crate::action::ReviewAction;
use crate::state::ReviewState;
use crate::store::{ReviewStore, Subscription};
use crate::traits::HistoryWriter;
use log::debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

/// Writes the current position to history and applies incoming links.
///
/// History is written only when the encoding changes: a new entry when the
/// file changes, a replaced entry otherwise. State changes caused by an
/// incoming link are not written back.
pub struct HashSynchronizer {
    store: ReviewStore,
    history: Arc<dyn HistoryWriter>,
    applying: AtomicBool,
    /// `(path, encoded link)` last written or applied.
    last_written: Mutex<Option<(String, String)>>,
    subscription: Mutex<Option<Subscription>>,
}

impl HashSynchronizer {
    pub fn attach(store: ReviewStore, history: Arc<dyn HistoryWriter>) -> Arc<Self> {
        let sync = Arc::new(Self {
            store: store.clone(),
            history,
            applying: AtomicBool::new(false),
            last_written: Mutex::new(None),
            subscription: Mutex::new(None),
        });

        let weak = Arc::downgrade(&sync);
        let subscription = store.subscribe(move |state: &ReviewState| {
            if let Some(sync) = weak.upgrade() {
                sync.on_state(state);
            }
        });
        *sync
            .subscription
            .lock()
            .unwrap_or_else(|e| e.into_inner()) = Some(subscription);

        sync.on_state(&store.get_snapshot());
        sync
    }

    /// Stop writing history. Incoming links still apply.
    pub fn detach(&self) {
        let subscription = self
            .subscription
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .take();
        if let Some(subscription) = subscription {
            subscription.unsubscribe();
        }
    }

    fn lock_last(&self) -> MutexGuard<'_, Option<(String, String)>> {
        self.last_written.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// The link last written to or applied from history.
    pub fn current_link(&self) -> Option<String> {
        self.lock_last().as_ref().map(|(_, encoded)| encoded.clone())
    }

    fn on_state(&self, state: &ReviewState) {
        if self.applying.load(Ordering::SeqCst) {
            return;
        }
        let Some(link) = DeepLink::from_state(state) else {
            return;
        };
        let encoded = link.encode();

        let mut last = self.lock_last();
        match last.as_ref() {
            Some((_, previous)) if *previous == encoded => return,
            Some((path, _)) if *path == link.path => self.history.replace(&encoded),
            _ => self.history.push(&encoded),
        }
        *last = Some((link.path, encoded));
    }

    /// Parse and apply a fragment. Returns `false`, leaving state untouched,
    /// when the link is malformed or points at something that is not there.
    pub fn navigate_from_hash(&self, hash: &str) -> bool {
        match DeepLink::parse(hash) {
            Ok(link) => self.navigate_to(&link),
            Err(e) => {
                debug!("Ignoring deep link {:?}: {}", hash, e);
                false
            }
        }
    }

    pub fn navigate_to(&self, link: &DeepLink) -> bool {
        let snapshot = self.store.get_snapshot();
        if snapshot.file(&link.path).is_none() {
            debug!("Deep link file {} is not part of this pull request", link.path);
            return false;
        }
        let target_exists = match link.focus {
            LinkFocus::Comment(id) => snapshot
                .comment(id)
                .is_some_and(|c| c.path == link.path),
            LinkFocus::Pending(id) => snapshot
                .pending_comment(id)
                .is_some_and(|c| c.path == link.path),
            LinkFocus::None | LinkFocus::Line(_) | LinkFocus::Range(..) => true,
        };
        if !target_exists {
            debug!("Deep link target in {} no longer exists", link.path);
            return false;
        }

        self.applying.store(true, Ordering::SeqCst);
        self.store.dispatch(ReviewAction::ApplyDeepLink {
            path: link.path.clone(),
            focus: link.focus,
        });
        self.applying.store(false, Ordering::SeqCst);

        if let Some(applied) = DeepLink::from_state(&self.store.get_snapshot()) {
            let encoded = applied.encode();
            *self.lock_last() = Some((applied.path, encoded));
        }
        true
    }
}
