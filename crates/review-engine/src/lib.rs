//! # review-engine
//!
//! The state engine behind a pull-request review session: diff parsing and
//! caching, cursor navigation across lines and comments, the flat row
//! projection a renderer draws, and deep links that encode the cursor
//! position.
//!
//! ## Design Principles
//!
//! The engine is **instrumented**: it never talks to a network or a terminal
//! itself. Code-host access comes in through
//! [`review_host::CodeHostClient`], patch parsing through [`DiffParser`] and
//! location history through [`HistoryWriter`].
//!
//! ## Action-Based Architecture
//!
//! All state lives in one immutable [`ReviewState`] snapshot held by a
//! [`ReviewStore`]. Changes happen only by dispatching a [`ReviewAction`],
//! which a pure [`reduce`] function turns into the next snapshot.
//! Subscribers are notified after every dispatch. Slices that did not
//! change keep their `Arc`, so consumers can skip work by pointer
//! comparison.
//!
//! ```text
//!  ReviewSession ──(fetch, load, write)──► CodeHostClient
//!        │
//!        ▼ dispatch(ReviewAction)
//!  ReviewStore ── reduce ──► ReviewState ──► subscribers
//!                                 │            (RowProjector, HashSynchronizer)
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use review_engine::{ReviewSession, ReviewStore, SessionConfig, UnifiedDiffParser};
//!
//! let store = ReviewStore::new(key, DiffViewMode::Unified, Some(storage));
//! let session = ReviewSession::new(store, client, Arc::new(UnifiedDiffParser::new()),
//!     DiffCache::shared(32), SessionConfig::default());
//!
//! session.open().await?;
//! session.select_file("src/lib.rs").await;
//! session.store().dispatch(ReviewAction::Navigate(NavRequest::step(Direction::Down)));
//!
//! let rows = RowProjector::new().project(&session.store().get_snapshot());
//! ```

pub mod action;
pub mod deep_link;
pub mod error;
pub mod highlight;
pub mod loader;
pub mod model;
pub mod navigation;
pub mod parser;
pub mod reducer;
pub mod rows;
pub mod session;
pub mod state;
pub mod store;
pub mod traits;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use action::ReviewAction;
pub use deep_link::{DeepLink, HashSynchronizer, LinkFocus};
pub use error::{DeepLinkError, LoadError, ParseError};
pub use highlight::DiffHighlighter;
pub use loader::{DiffCache, DiffLoader, LoadedDiff, LoaderConfig, SharedDiffCache};
pub use model::{
    Comment, DiffLine, DiffSide, FileEntry, FileStatus, LineKind, LineRef, ParsedDiff,
    PendingComment, ReviewEvent, SessionKey,
};
pub use navigation::{Direction, NavRequest, NavigableIndex};
pub use parser::UnifiedDiffParser;
pub use reducer::reduce;
pub use rows::{Row, RowKey, RowProjector};
pub use session::{ReviewSession, SessionConfig};
pub use state::{DiffLoadState, DiffViewMode, EditTarget, Focus, ReviewState};
pub use store::{ReviewStore, Subscription};
pub use traits::{DiffParser, HistoryWriter, MemoryHistory};
