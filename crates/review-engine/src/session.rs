//! Review session orchestration.
//!
//! [`ReviewSession`] owns the store and performs the side effects the pure
//! reducer cannot: fetching the pull request, loading diffs through the
//! cache, expanding skip blocks and writing comments back to the code host.
//! Every result flows into the store as a [`ReviewAction`].

use crate::action::ReviewAction;
use crate::loader::{DiffLoader, LoaderConfig, SharedDiffCache};
use crate::model::{sort_as_tree, Comment, DiffLine, FileEntry, PendingComment, ReviewEvent};
use crate::rows::{CommentTarget, LineAnnotations};
use crate::state::{DiffLoadState, EditTarget};
use crate::store::ReviewStore;
use crate::traits::DiffParser;
use anyhow::{anyhow, bail, Context};
use log::{debug, error, info, warn};
use review_config::AppConfig;
use review_host::{CodeHostClient, NewReviewComment};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task::JoinHandle;
use uuid::Uuid;

/// Tunables for a session, usually taken from [`AppConfig`].
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Files on each side of the selection to prefetch.
    pub prefetch_radius: usize,
    pub fetch_full_content: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self::from(&AppConfig::default())
    }
}

impl From<&AppConfig> for SessionConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            prefetch_radius: config.prefetch_radius,
            fetch_full_content: config.fetch_full_content,
        }
    }
}

pub struct ReviewSession {
    store: ReviewStore,
    client: Arc<dyn CodeHostClient>,
    parser: Arc<dyn DiffParser>,
    cache: SharedDiffCache,
    config: SessionConfig,
    loader: Mutex<Option<DiffLoader>>,
    prefetch: Mutex<Option<JoinHandle<()>>>,
}

impl ReviewSession {
    pub fn new(
        store: ReviewStore,
        client: Arc<dyn CodeHostClient>,
        parser: Arc<dyn DiffParser>,
        cache: SharedDiffCache,
        config: SessionConfig,
    ) -> Self {
        Self {
            store,
            client,
            parser,
            cache,
            config,
            loader: Mutex::new(None),
            prefetch: Mutex::new(None),
        }
    }

    pub fn store(&self) -> &ReviewStore {
        &self.store
    }

    fn lock_loader(&self) -> MutexGuard<'_, Option<DiffLoader>> {
        self.loader.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_prefetch(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.prefetch.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn diff_loader(&self) -> Option<DiffLoader> {
        self.lock_loader().clone()
    }

    /// Fetch the pull request, its files, comments and threads.
    ///
    /// Any failed read fails the whole open: the session error is set and
    /// nothing partial is shown.
    pub async fn open(&self) -> anyhow::Result<()> {
        let key = self.store.get_snapshot().key.clone();
        let (owner, repo, number) = (key.owner.as_str(), key.repo.as_str(), key.number);

        let result = tokio::try_join!(
            self.client.fetch_pull_request(owner, repo, number),
            self.client.fetch_changed_files(owner, repo, number),
            self.client.fetch_review_comments(owner, repo, number),
            self.client.fetch_review_threads(owner, repo, number),
        );
        let (pull_request, files, comments, threads) = match result {
            Ok(loaded) => loaded,
            Err(e) => {
                error!("Failed to load {}/{}#{}: {:#}", owner, repo, number, e);
                self.store
                    .dispatch(ReviewAction::SessionLoadFailed(format!("{e:#}")));
                return Err(e.context(format!("Failed to open {owner}/{repo}#{number}")));
            }
        };

        let files = sort_as_tree(files.into_iter().map(FileEntry::from).collect());
        info!(
            "Opened {}/{}#{} with {} files and {} comments",
            owner,
            repo,
            number,
            files.len(),
            comments.len()
        );

        *self.lock_loader() = Some(DiffLoader::new(
            self.client.clone(),
            self.parser.clone(),
            self.cache.clone(),
            LoaderConfig {
                owner: key.owner.clone(),
                repo: key.repo.clone(),
                head_sha: pull_request.head_sha.clone(),
                fetch_full_content: self.config.fetch_full_content,
            },
        ));

        self.store.dispatch(ReviewAction::SessionLoaded {
            pull_request,
            files,
            comments: comments.into_iter().map(Comment::from).collect(),
            threads,
        });
        Ok(())
    }

    /// Select `path` and load its diff. A cached diff is shown immediately.
    ///
    /// Returns `false` when the path is not part of the pull request or the
    /// session is not open.
    pub async fn select_file(&self, path: &str) -> bool {
        let snapshot = self.store.get_snapshot();
        let Some(entry) = snapshot.file(path).cloned() else {
            debug!("Ignoring selection of unknown file {}", path);
            return false;
        };
        let Some(loader) = self.diff_loader() else {
            warn!("Cannot select {} before the session is open", path);
            return false;
        };

        loader.set_active(Some(&entry.content_hash));
        let cached = loader.cached(&entry.content_hash);
        let hit = cached.is_some();
        self.store.dispatch(ReviewAction::SelectFile {
            path: entry.path.clone(),
            loaded: cached,
        });

        self.prefetch_around(&loader, &entry.path);
        if !hit {
            self.load_entry(&loader, &entry).await;
        }
        true
    }

    /// Load the selected file's diff if it is still missing, as after a
    /// deep link selected it.
    pub async fn load_selected(&self) {
        let snapshot = self.store.get_snapshot();
        let DiffLoadState::Loading { path } = &snapshot.diff else {
            return;
        };
        let (Some(entry), Some(loader)) = (snapshot.file(path).cloned(), self.diff_loader())
        else {
            return;
        };

        loader.set_active(Some(&entry.content_hash));
        self.prefetch_around(&loader, &entry.path);
        self.load_entry(&loader, &entry).await;
    }

    pub async fn select_next_file(&self) -> bool {
        let snapshot = self.store.get_snapshot();
        match snapshot.next_file_path() {
            Some(path) => self.select_file(path).await,
            None => false,
        }
    }

    pub async fn select_previous_file(&self) -> bool {
        let snapshot = self.store.get_snapshot();
        match snapshot.previous_file_path() {
            Some(path) => self.select_file(path).await,
            None => false,
        }
    }

    pub async fn select_next_unviewed_file(&self) -> bool {
        let snapshot = self.store.get_snapshot();
        match snapshot.next_unviewed_file_path() {
            Some(path) => self.select_file(path).await,
            None => false,
        }
    }

    async fn load_entry(&self, loader: &DiffLoader, entry: &FileEntry) {
        match loader.load(entry).await {
            Ok(diff) => self.store.dispatch(ReviewAction::DiffLoaded {
                path: entry.path.clone(),
                diff,
            }),
            Err(e) if e.is_cancelled() => debug!("Load of {} was superseded", entry.path),
            Err(e) => {
                warn!("Failed to load diff for {}: {}", entry.path, e);
                self.store.dispatch(ReviewAction::DiffLoadFailed {
                    path: entry.path.clone(),
                    error: e.to_string(),
                });
            }
        }
    }

    /// Warm the cache for the neighbours of `path`, nearest first.
    fn prefetch_around(&self, loader: &DiffLoader, path: &str) {
        let radius = self.config.prefetch_radius;
        let snapshot = self.store.get_snapshot();
        let Some(position) = snapshot.files.iter().position(|f| f.path == path) else {
            return;
        };

        let mut neighbours = Vec::new();
        for distance in 1..=radius {
            let candidates = [
                position.checked_add(distance),
                position.checked_sub(distance),
            ];
            for index in candidates.into_iter().flatten() {
                if let Some(file) = snapshot.files.get(index) {
                    if loader.cached(&file.content_hash).is_none() {
                        neighbours.push(file.clone());
                    }
                }
            }
        }
        if neighbours.is_empty() {
            return;
        }

        debug!("Prefetching {} files around {}", neighbours.len(), path);
        let handle = loader.prefetch(neighbours);
        if let Some(previous) = self.lock_prefetch().replace(handle) {
            previous.abort();
        }
    }

    /// Reveal the lines hidden by skip block `index` of the selected file.
    pub async fn expand_skip_block(&self, index: usize) -> anyhow::Result<()> {
        let snapshot = self.store.get_snapshot();
        let (Some(entry), Some(loaded)) = (snapshot.selected_entry(), snapshot.loaded_diff())
        else {
            bail!("No diff is loaded");
        };
        if snapshot.expanded_skips.contains_key(&index) {
            return Ok(());
        }
        let skip = *loaded
            .diff
            .skip_block(index)
            .ok_or_else(|| anyhow!("{} has no skip block {}", entry.path, index))?;

        let content: Arc<str> = match &loaded.new_content {
            Some(content) => content.clone(),
            None => {
                let head_sha = snapshot
                    .pull_request
                    .as_ref()
                    .map(|pr| pr.head_sha.clone())
                    .ok_or_else(|| anyhow!("Session is not open"))?;
                let key = &snapshot.key;
                self.client
                    .fetch_file_content(&key.owner, &key.repo, &entry.path, &head_sha)
                    .await
                    .with_context(|| format!("Failed to fetch {} at {}", entry.path, head_sha))?
                    .ok_or_else(|| anyhow!("{} does not exist at {}", entry.path, head_sha))?
                    .into()
            }
        };

        let parser = self.parser.clone();
        let path = entry.path.clone();
        let lines = tokio::task::spawn_blocking(move || {
            parser.highlight_range(&content, &path, skip.new_start, skip.count)
        })
        .await
        .context("Highlight task failed")?;

        let lines: Vec<DiffLine> = lines
            .into_iter()
            .zip(skip.old_start..)
            .map(|(mut line, old_line)| {
                line.old_line = Some(old_line);
                line
            })
            .collect();
        debug!(
            "Expanded skip block {} of {} ({} lines)",
            index,
            entry.path,
            lines.len()
        );

        self.store.dispatch(ReviewAction::SkipBlockExpanded {
            path: entry.path.clone(),
            index,
            lines,
        });
        Ok(())
    }

    /// Log a failed write, surface it in the state and hand it back.
    fn write_failed(&self, what: &str, e: anyhow::Error) -> anyhow::Error {
        error!("Failed to {}: {:#}", what, e);
        self.store
            .dispatch(ReviewAction::SetWriteError(format!("Failed to {what}: {e:#}")));
        e.context(format!("Failed to {what}"))
    }

    fn head_sha(&self) -> anyhow::Result<String> {
        self.store
            .get_snapshot()
            .pull_request
            .as_ref()
            .map(|pr| pr.head_sha.clone())
            .ok_or_else(|| anyhow!("Session is not open"))
    }

    /// Post a pending comment as a standalone comment, or as a reply when it
    /// answers one. The pending comment stays if the write fails.
    pub async fn post_pending_comment(&self, id: Uuid) -> anyhow::Result<()> {
        let snapshot = self.store.get_snapshot();
        let pending = snapshot
            .pending_comment(id)
            .cloned()
            .ok_or_else(|| anyhow!("Pending comment {id} not found"))?;
        let head_sha = self.head_sha()?;
        let key = &snapshot.key;

        let result = match pending.in_reply_to {
            Some(parent) => {
                self.client
                    .reply_to_review_comment(&key.owner, &key.repo, key.number, parent, &pending.body)
                    .await
            }
            None => {
                self.client
                    .create_review_comment(
                        &key.owner,
                        &key.repo,
                        key.number,
                        &head_sha,
                        &pending.to_new_review_comment(),
                    )
                    .await
            }
        };

        match result {
            Ok(created) => {
                info!("Posted comment {} on {}", created.id, created.path);
                self.store.dispatch(ReviewAction::PendingCommentPublished {
                    pending_id: id,
                    comment: created.into(),
                });
                self.refresh_threads().await;
                Ok(())
            }
            Err(e) => Err(self.write_failed("post comment", e)),
        }
    }

    /// Reply to a server comment. The reply is shown as pending until the
    /// code host accepts it.
    pub async fn reply(&self, comment_id: u64, body: &str) -> anyhow::Result<()> {
        let snapshot = self.store.get_snapshot();
        let parent = snapshot
            .comment(comment_id)
            .ok_or_else(|| anyhow!("Comment {comment_id} not found"))?;
        let anchor = LineAnnotations::build(&parent.path, &snapshot.comments, &[])
            .owner_of(CommentTarget::Comment(comment_id))
            .or_else(|| parent.anchor())
            .ok_or_else(|| anyhow!("Comment {comment_id} is not on a line"))?;

        let pending = PendingComment::reply(&parent.path, anchor, comment_id, body);
        let id = pending.id;
        self.store.dispatch(ReviewAction::AddPendingComment(pending));
        self.post_pending_comment(id).await
    }

    /// Change a comment's body. Pending comments are edited locally; server
    /// comments are updated optimistically and then written.
    pub async fn edit_comment(&self, target: EditTarget, body: &str) -> anyhow::Result<()> {
        let id = match target {
            EditTarget::Pending(id) => {
                self.store.dispatch(ReviewAction::UpdatePendingComment {
                    id,
                    body: body.to_string(),
                });
                return Ok(());
            }
            EditTarget::Comment(id) => id,
        };

        let snapshot = self.store.get_snapshot();
        let mut edited = snapshot
            .comment(id)
            .cloned()
            .ok_or_else(|| anyhow!("Comment {id} not found"))?;
        edited.body = body.to_string();
        self.store.dispatch(ReviewAction::CommentUpdated(edited));

        let key = &snapshot.key;
        match self
            .client
            .update_review_comment(&key.owner, &key.repo, id, body)
            .await
        {
            Ok(updated) => {
                self.store
                    .dispatch(ReviewAction::CommentUpdated(updated.into()));
                Ok(())
            }
            Err(e) => Err(self.write_failed("update comment", e)),
        }
    }

    pub async fn delete_comment(&self, id: u64) -> anyhow::Result<()> {
        let snapshot = self.store.get_snapshot();
        if snapshot.comment(id).is_none() {
            bail!("Comment {id} not found");
        }
        self.store.dispatch(ReviewAction::CommentDeleted(id));

        let key = &snapshot.key;
        match self
            .client
            .delete_review_comment(&key.owner, &key.repo, id)
            .await
        {
            Ok(()) => {
                self.refresh_threads().await;
                Ok(())
            }
            Err(e) => Err(self.write_failed("delete comment", e)),
        }
    }

    /// Drop a pending comment without writing anything.
    pub fn discard_pending_comment(&self, id: Uuid) {
        self.store.dispatch(ReviewAction::RemovePendingComment(id));
    }

    pub async fn resolve_thread(&self, thread_id: &str) -> anyhow::Result<()> {
        self.store
            .dispatch(ReviewAction::ResolveThread(thread_id.to_string()));
        self.client
            .resolve_review_thread(thread_id)
            .await
            .map_err(|e| self.write_failed("resolve thread", e))
    }

    pub async fn unresolve_thread(&self, thread_id: &str) -> anyhow::Result<()> {
        self.store
            .dispatch(ReviewAction::UnresolveThread(thread_id.to_string()));
        self.client
            .unresolve_review_thread(thread_id)
            .await
            .map_err(|e| self.write_failed("unresolve thread", e))
    }

    /// Pending comments that belong in a review, with their payloads.
    fn review_comments(pending: &[PendingComment]) -> (Vec<Uuid>, Vec<NewReviewComment>) {
        pending
            .iter()
            .filter(|c| !c.is_reply())
            .map(|c| (c.id, c.to_new_review_comment()))
            .unzip()
    }

    /// Mirror the local pending comments and review body into the code
    /// host's pending review.
    pub async fn sync_pending_review(&self) -> anyhow::Result<()> {
        let snapshot = self.store.get_snapshot();
        let head_sha = self.head_sha()?;
        let (ids, payload) = Self::review_comments(&snapshot.pending_comments);
        let body = Some(snapshot.review_body.as_str()).filter(|b| !b.is_empty());
        let key = &snapshot.key;

        match self
            .client
            .upsert_pending_review(&key.owner, &key.repo, key.number, &head_sha, body, &payload)
            .await
        {
            Ok(review) => {
                debug!(
                    "Synced pending review {} with {} comments",
                    review.id,
                    review.comment_ids.len()
                );
                self.store.dispatch(ReviewAction::PendingReviewSynced {
                    review_id: review.id,
                    server_ids: ids.into_iter().zip(review.comment_ids).collect(),
                });
                Ok(())
            }
            Err(e) => Err(self.write_failed("sync pending review", e)),
        }
    }

    /// Submit the review with every pending comment and the review body.
    pub async fn submit_review(&self, event: ReviewEvent) -> anyhow::Result<()> {
        self.store.dispatch(ReviewAction::SetReviewEvent(event));
        let snapshot = self.store.get_snapshot();
        let head_sha = self.head_sha()?;
        let (ids, payload) = Self::review_comments(&snapshot.pending_comments);
        let body = Some(snapshot.review_body.as_str()).filter(|b| !b.is_empty());
        let key = &snapshot.key;

        if let Err(e) = self
            .client
            .submit_review(
                &key.owner, &key.repo, key.number, &head_sha, event, body, &payload,
            )
            .await
        {
            return Err(self.write_failed("submit review", e));
        }

        info!(
            "Submitted {} review with {} comments",
            event.as_str(),
            payload.len()
        );
        self.store
            .dispatch(ReviewAction::ReviewSubmitted { submitted: ids });
        if let Err(e) = self.refresh_comments().await {
            warn!("Review submitted but comments could not be refreshed: {:#}", e);
        }
        Ok(())
    }

    /// Re-read comments and threads from the code host.
    pub async fn refresh_comments(&self) -> anyhow::Result<()> {
        let key = self.store.get_snapshot().key.clone();
        let (comments, threads) = tokio::try_join!(
            self.client
                .fetch_review_comments(&key.owner, &key.repo, key.number),
            self.client
                .fetch_review_threads(&key.owner, &key.repo, key.number),
        )?;
        self.store.dispatch(ReviewAction::SetComments(
            comments.into_iter().map(Comment::from).collect(),
        ));
        self.store.dispatch(ReviewAction::SetThreads(threads));
        Ok(())
    }

    async fn refresh_threads(&self) {
        let key = self.store.get_snapshot().key.clone();
        match self
            .client
            .fetch_review_threads(&key.owner, &key.repo, key.number)
            .await
        {
            Ok(threads) => self.store.dispatch(ReviewAction::SetThreads(threads)),
            Err(e) => warn!("Failed to refresh review threads: {:#}", e),
        }
    }

    /// Wait for the current prefetch to finish.
    #[cfg(test)]
    async fn settle_prefetch(&self) {
        let handle = self.lock_prefetch().take();
        if let Some(handle) = handle {
            let _ = handle.await;
        }
    }
}
