//! In-memory code-host client backed by a JSON fixture
//!
//! `FixtureClient` serves a single pull request from a [`PullRequestFixture`]
//! and applies writes to its in-memory copy, so a whole review session can be
//! replayed without network access. Every call is counted per method, and
//! reads or writes can be forced to fail.

use crate::client::CodeHostClient;
use crate::types::{
    ChangedFile, NewReviewComment, PendingReview, PullRequest, ReviewComment, ReviewEvent,
    ReviewThread,
};
use anyhow::{anyhow, bail, Context};
use async_trait::async_trait;
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

/// Serialized form of a pull request and everything the review engine reads
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PullRequestFixture {
    pub owner: String,
    pub repo: String,
    pub pull_request: PullRequest,
    #[serde(default)]
    pub files: Vec<ChangedFile>,
    #[serde(default)]
    pub comments: Vec<ReviewComment>,
    #[serde(default)]
    pub threads: Vec<ReviewThread>,
    /// File contents keyed by `"{git_ref}:{path}"`
    #[serde(default)]
    pub contents: HashMap<String, String>,
}

impl PullRequestFixture {
    /// Parse a fixture from JSON text
    pub fn from_json(json: &str) -> anyhow::Result<Self> {
        serde_json::from_str(json).context("Failed to parse pull request fixture")
    }

    /// Load a fixture from a JSON file
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read fixture {}", path.display()))?;
        Self::from_json(&content)
    }

    fn content_key(git_ref: &str, path: &str) -> String {
        format!("{git_ref}:{path}")
    }
}

/// A review that was submitted through [`CodeHostClient::submit_review`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedReview {
    pub event: ReviewEvent,
    pub body: Option<String>,
    pub comment_ids: Vec<u64>,
}

#[derive(Debug)]
struct FixtureState {
    fixture: PullRequestFixture,
    next_id: u64,
    pending_review: Option<PendingReview>,
    submitted: Vec<SubmittedReview>,
}

impl FixtureState {
    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn insert_comment(
        &mut self,
        comment: &NewReviewComment,
        review_id: Option<u64>,
    ) -> ReviewComment {
        let id = self.allocate_id();
        let created = ReviewComment {
            id,
            path: comment.path.clone(),
            line: Some(comment.line),
            start_line: comment.start_line,
            side: Some(comment.side),
            body: comment.body.clone(),
            author: "you".to_string(),
            created_at: chrono::Utc::now(),
            in_reply_to_id: None,
            pull_request_review_id: review_id,
        };
        self.fixture.comments.push(created.clone());
        self.fixture.threads.push(ReviewThread {
            id: format!("thread-{id}"),
            is_resolved: false,
            comment_ids: vec![id],
        });
        created
    }
}

/// Fixture-backed implementation of [`CodeHostClient`]
///
/// Cloning is cheap and clones share state, so a test can keep one handle
/// for assertions while the engine owns another.
#[derive(Debug, Clone)]
pub struct FixtureClient {
    state: Arc<Mutex<FixtureState>>,
    calls: Arc<Mutex<HashMap<&'static str, usize>>>,
    fail_reads: Arc<AtomicBool>,
    fail_writes: Arc<AtomicBool>,
    content_delay: Option<Duration>,
}

impl FixtureClient {
    pub fn new(fixture: PullRequestFixture) -> Self {
        let next_id = fixture.comments.iter().map(|c| c.id).max().unwrap_or(0) + 1;
        Self {
            state: Arc::new(Mutex::new(FixtureState {
                fixture,
                next_id,
                pending_review: None,
                submitted: Vec::new(),
            })),
            calls: Arc::new(Mutex::new(HashMap::new())),
            fail_reads: Arc::new(AtomicBool::new(false)),
            fail_writes: Arc::new(AtomicBool::new(false)),
            content_delay: None,
        }
    }

    /// Delay every `fetch_file_content` call, to make in-flight loads observable
    pub fn with_content_delay(mut self, delay: Duration) -> Self {
        self.content_delay = Some(delay);
        self
    }

    /// Make every read fail until reset
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Make every write fail until reset
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of times the named trait method has been called
    pub fn call_count(&self, method: &str) -> usize {
        self.lock_calls().get(method).copied().unwrap_or(0)
    }

    /// Current server-side comments
    pub fn comments(&self) -> Vec<ReviewComment> {
        self.lock_state().fixture.comments.clone()
    }

    /// Current server-side threads
    pub fn threads(&self) -> Vec<ReviewThread> {
        self.lock_state().fixture.threads.clone()
    }

    pub fn pending_review(&self) -> Option<PendingReview> {
        self.lock_state().pending_review.clone()
    }

    pub fn submitted_reviews(&self) -> Vec<SubmittedReview> {
        self.lock_state().submitted.clone()
    }

    pub fn owner(&self) -> String {
        self.lock_state().fixture.owner.clone()
    }

    pub fn repo(&self) -> String {
        self.lock_state().fixture.repo.clone()
    }

    pub fn pr_number(&self) -> u64 {
        self.lock_state().fixture.pull_request.number
    }

    fn lock_state(&self) -> MutexGuard<'_, FixtureState> {
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_calls(&self) -> MutexGuard<'_, HashMap<&'static str, usize>> {
        self.calls.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn record(&self, method: &'static str) {
        *self.lock_calls().entry(method).or_insert(0) += 1;
    }

    fn read(&self, method: &'static str) -> anyhow::Result<()> {
        self.record(method);
        if self.fail_reads.load(Ordering::SeqCst) {
            bail!("{method}: simulated read failure");
        }
        Ok(())
    }

    fn write(&self, method: &'static str) -> anyhow::Result<()> {
        self.record(method);
        if self.fail_writes.load(Ordering::SeqCst) {
            bail!("{method}: simulated write failure");
        }
        Ok(())
    }

    fn check_pr(state: &FixtureState, pr_number: u64) -> anyhow::Result<()> {
        if state.fixture.pull_request.number != pr_number {
            bail!("Pull request #{pr_number} not found");
        }
        Ok(())
    }
}

#[async_trait]
impl CodeHostClient for FixtureClient {
    async fn fetch_pull_request(
        &self,
        _owner: &str,
        _repo: &str,
        pr_number: u64,
    ) -> anyhow::Result<PullRequest> {
        self.read("fetch_pull_request")?;
        let state = self.lock_state();
        Self::check_pr(&state, pr_number)?;
        Ok(state.fixture.pull_request.clone())
    }

    async fn fetch_changed_files(
        &self,
        _owner: &str,
        _repo: &str,
        pr_number: u64,
    ) -> anyhow::Result<Vec<ChangedFile>> {
        self.read("fetch_changed_files")?;
        let state = self.lock_state();
        Self::check_pr(&state, pr_number)?;
        Ok(state.fixture.files.clone())
    }

    async fn fetch_review_comments(
        &self,
        _owner: &str,
        _repo: &str,
        pr_number: u64,
    ) -> anyhow::Result<Vec<ReviewComment>> {
        self.read("fetch_review_comments")?;
        let state = self.lock_state();
        Self::check_pr(&state, pr_number)?;
        Ok(state.fixture.comments.clone())
    }

    async fn fetch_review_threads(
        &self,
        _owner: &str,
        _repo: &str,
        pr_number: u64,
    ) -> anyhow::Result<Vec<ReviewThread>> {
        self.read("fetch_review_threads")?;
        let state = self.lock_state();
        Self::check_pr(&state, pr_number)?;
        Ok(state.fixture.threads.clone())
    }

    async fn fetch_file_content(
        &self,
        _owner: &str,
        _repo: &str,
        path: &str,
        git_ref: &str,
    ) -> anyhow::Result<Option<String>> {
        self.read("fetch_file_content")?;
        if let Some(delay) = self.content_delay {
            tokio::time::sleep(delay).await;
        }
        let key = PullRequestFixture::content_key(git_ref, path);
        debug!("Fixture content lookup: {}", key);
        Ok(self.lock_state().fixture.contents.get(&key).cloned())
    }

    async fn create_review_comment(
        &self,
        _owner: &str,
        _repo: &str,
        pr_number: u64,
        _commit_id: &str,
        comment: &NewReviewComment,
    ) -> anyhow::Result<ReviewComment> {
        self.write("create_review_comment")?;
        let mut state = self.lock_state();
        Self::check_pr(&state, pr_number)?;
        Ok(state.insert_comment(comment, None))
    }

    async fn update_review_comment(
        &self,
        _owner: &str,
        _repo: &str,
        comment_id: u64,
        body: &str,
    ) -> anyhow::Result<ReviewComment> {
        self.write("update_review_comment")?;
        let mut state = self.lock_state();
        let comment = state
            .fixture
            .comments
            .iter_mut()
            .find(|c| c.id == comment_id)
            .ok_or_else(|| anyhow!("Comment {comment_id} not found"))?;
        comment.body = body.to_string();
        Ok(comment.clone())
    }

    async fn delete_review_comment(
        &self,
        _owner: &str,
        _repo: &str,
        comment_id: u64,
    ) -> anyhow::Result<()> {
        self.write("delete_review_comment")?;
        let mut state = self.lock_state();
        let before = state.fixture.comments.len();
        state.fixture.comments.retain(|c| c.id != comment_id);
        if state.fixture.comments.len() == before {
            bail!("Comment {comment_id} not found");
        }
        for thread in &mut state.fixture.threads {
            thread.comment_ids.retain(|id| *id != comment_id);
        }
        state.fixture.threads.retain(|t| !t.comment_ids.is_empty());
        Ok(())
    }

    async fn reply_to_review_comment(
        &self,
        _owner: &str,
        _repo: &str,
        pr_number: u64,
        comment_id: u64,
        body: &str,
    ) -> anyhow::Result<ReviewComment> {
        self.write("reply_to_review_comment")?;
        let mut state = self.lock_state();
        Self::check_pr(&state, pr_number)?;
        let parent = state
            .fixture
            .comments
            .iter()
            .find(|c| c.id == comment_id)
            .cloned()
            .ok_or_else(|| anyhow!("Comment {comment_id} not found"))?;
        let root_id = parent.in_reply_to_id.unwrap_or(parent.id);

        let id = state.allocate_id();
        let reply = ReviewComment {
            id,
            path: parent.path,
            line: parent.line,
            start_line: None,
            side: None,
            body: body.to_string(),
            author: "you".to_string(),
            created_at: chrono::Utc::now(),
            in_reply_to_id: Some(root_id),
            pull_request_review_id: None,
        };
        state.fixture.comments.push(reply.clone());
        if let Some(thread) = state
            .fixture
            .threads
            .iter_mut()
            .find(|t| t.comment_ids.first() == Some(&root_id))
        {
            thread.comment_ids.push(id);
        }
        Ok(reply)
    }

    async fn resolve_review_thread(&self, thread_id: &str) -> anyhow::Result<()> {
        self.write("resolve_review_thread")?;
        let mut state = self.lock_state();
        let thread = state
            .fixture
            .threads
            .iter_mut()
            .find(|t| t.id == thread_id)
            .ok_or_else(|| anyhow!("Thread {thread_id} not found"))?;
        thread.is_resolved = true;
        Ok(())
    }

    async fn unresolve_review_thread(&self, thread_id: &str) -> anyhow::Result<()> {
        self.write("unresolve_review_thread")?;
        let mut state = self.lock_state();
        let thread = state
            .fixture
            .threads
            .iter_mut()
            .find(|t| t.id == thread_id)
            .ok_or_else(|| anyhow!("Thread {thread_id} not found"))?;
        thread.is_resolved = false;
        Ok(())
    }

    async fn upsert_pending_review(
        &self,
        _owner: &str,
        _repo: &str,
        pr_number: u64,
        _commit_id: &str,
        _body: Option<&str>,
        comments: &[NewReviewComment],
    ) -> anyhow::Result<PendingReview> {
        self.write("upsert_pending_review")?;
        let mut state = self.lock_state();
        Self::check_pr(&state, pr_number)?;
        let review_id = match &state.pending_review {
            Some(existing) => existing.id,
            None => state.allocate_id(),
        };
        let comment_ids = comments.iter().map(|_| state.allocate_id()).collect();
        let review = PendingReview {
            id: review_id,
            comment_ids,
        };
        state.pending_review = Some(review.clone());
        Ok(review)
    }

    async fn submit_review(
        &self,
        _owner: &str,
        _repo: &str,
        pr_number: u64,
        _commit_id: &str,
        event: ReviewEvent,
        body: Option<&str>,
        comments: &[NewReviewComment],
    ) -> anyhow::Result<()> {
        self.write("submit_review")?;
        let mut state = self.lock_state();
        Self::check_pr(&state, pr_number)?;
        let review_id = match state.pending_review.take() {
            Some(pending) => pending.id,
            None => state.allocate_id(),
        };
        let comment_ids = comments
            .iter()
            .map(|c| state.insert_comment(c, Some(review_id)).id)
            .collect();
        state.submitted.push(SubmittedReview {
            event,
            body: body.map(str::to_string),
            comment_ids,
        });
        Ok(())
    }
}
