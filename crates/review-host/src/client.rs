//! Code-host client trait
//!
//! This module defines the `CodeHostClient` trait that every code-host
//! implementation must satisfy. The review engine only ever talks to the
//! remote service through it.

use crate::types::{
    ChangedFile, NewReviewComment, PendingReview, PullRequest, ReviewComment, ReviewEvent,
    ReviewThread,
};
use async_trait::async_trait;

/// Code-host API client trait
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync` to allow sharing across
/// async tasks and threads.
///
/// # Example
///
/// ```rust,ignore
/// use review_host::{CodeHostClient, ReviewComment};
///
/// async fn comments(client: &dyn CodeHostClient) -> anyhow::Result<Vec<ReviewComment>> {
///     client.fetch_review_comments("rust-lang", "rust", 42).await
/// }
/// ```
#[async_trait]
pub trait CodeHostClient: Send + Sync {
    // === Reads ===

    /// Fetch a single pull request by number
    async fn fetch_pull_request(
        &self,
        owner: &str,
        repo: &str,
        pr_number: u64,
    ) -> anyhow::Result<PullRequest>;

    /// Fetch the files changed by a pull request, including per-file patches
    async fn fetch_changed_files(
        &self,
        owner: &str,
        repo: &str,
        pr_number: u64,
    ) -> anyhow::Result<Vec<ChangedFile>>;

    /// Fetch all review (line) comments on a pull request
    async fn fetch_review_comments(
        &self,
        owner: &str,
        repo: &str,
        pr_number: u64,
    ) -> anyhow::Result<Vec<ReviewComment>>;

    /// Fetch review threads with their resolution state
    async fn fetch_review_threads(
        &self,
        owner: &str,
        repo: &str,
        pr_number: u64,
    ) -> anyhow::Result<Vec<ReviewThread>>;

    /// Fetch a file's content at a git ref
    ///
    /// # Returns
    ///
    /// `Ok(None)` when the file does not exist at that ref.
    async fn fetch_file_content(
        &self,
        owner: &str,
        repo: &str,
        path: &str,
        git_ref: &str,
    ) -> anyhow::Result<Option<String>>;

    // === Comment writes ===

    /// Create a standalone review comment on a line or line range
    ///
    /// # Arguments
    ///
    /// * `commit_id` - The SHA of the commit to comment on (usually head SHA)
    /// * `comment` - Position and body of the new comment
    async fn create_review_comment(
        &self,
        owner: &str,
        repo: &str,
        pr_number: u64,
        commit_id: &str,
        comment: &NewReviewComment,
    ) -> anyhow::Result<ReviewComment>;

    /// Replace the body of an existing review comment
    async fn update_review_comment(
        &self,
        owner: &str,
        repo: &str,
        comment_id: u64,
        body: &str,
    ) -> anyhow::Result<ReviewComment>;

    /// Delete a review comment
    async fn delete_review_comment(
        &self,
        owner: &str,
        repo: &str,
        comment_id: u64,
    ) -> anyhow::Result<()>;

    /// Reply to an existing review comment
    async fn reply_to_review_comment(
        &self,
        owner: &str,
        repo: &str,
        pr_number: u64,
        comment_id: u64,
        body: &str,
    ) -> anyhow::Result<ReviewComment>;

    /// Mark a review thread as resolved
    async fn resolve_review_thread(&self, thread_id: &str) -> anyhow::Result<()>;

    /// Mark a review thread as unresolved
    async fn unresolve_review_thread(&self, thread_id: &str) -> anyhow::Result<()>;

    // === Reviews ===

    /// Create the caller's pending review, or replace its comments and body
    /// if one already exists
    async fn upsert_pending_review(
        &self,
        owner: &str,
        repo: &str,
        pr_number: u64,
        commit_id: &str,
        body: Option<&str>,
        comments: &[NewReviewComment],
    ) -> anyhow::Result<PendingReview>;

    /// Submit a review with all its comments
    #[allow(clippy::too_many_arguments)]
    async fn submit_review(
        &self,
        owner: &str,
        repo: &str,
        pr_number: u64,
        commit_id: &str,
        event: ReviewEvent,
        body: Option<&str>,
        comments: &[NewReviewComment],
    ) -> anyhow::Result<()>;
}
