//! Code-host client interface for pr-review
//!
//! The review engine never talks HTTP itself. It consumes the
//! [`CodeHostClient`] trait defined here; authentication and transport live
//! in whatever implements it.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │             CodeHostClient trait                 │
//! │  - reads: PR, files, comments, threads, content  │
//! │  - writes: comments, replies, threads, reviews   │
//! └─────────────────────────────────────────────────┘
//!                        │
//!        ┌───────────────┴───────────────┐
//!        ▼                               ▼
//! ┌─────────────────┐         ┌─────────────────────┐
//! │ FixtureClient   │         │ (remote client,     │
//! │ (in-memory)     │         │  outside this repo) │
//! └─────────────────┘         └─────────────────────┘
//! ```

pub mod client;
pub mod fixture_client;
pub mod types;

pub use client::CodeHostClient;
pub use fixture_client::{FixtureClient, PullRequestFixture, SubmittedReview};
pub use types::{
    ChangedFile, CommentSide, FileChangeStatus, NewReviewComment, PendingReview, PullRequest,
    ReviewComment, ReviewEvent, ReviewThread,
};
