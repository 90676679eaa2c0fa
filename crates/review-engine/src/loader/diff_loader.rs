//! Diff loading with coalescing, cancellation and prefetch.

use super::cache::{DiffCache, SharedDiffCache};
use super::LoadedDiff;
use crate::error::LoadError;
use crate::model::{FileEntry, FileStatus, ParsedDiff};
use crate::traits::DiffParser;
use futures::future::{BoxFuture, FutureExt, Shared};
use log::debug;
use review_host::CodeHostClient;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

type LoadResult = Result<Arc<LoadedDiff>, LoadError>;
type LoadFuture = Shared<BoxFuture<'static, LoadResult>>;

/// Where file content is read from.
#[derive(Debug, Clone)]
pub struct LoaderConfig {
    pub owner: String,
    pub repo: String,
    /// Ref the new file content is fetched at.
    pub head_sha: String,
    /// Fetch full new content so trailing unchanged lines become a skip block.
    pub fetch_full_content: bool,
}

struct InFlight {
    future: LoadFuture,
    cancel: CancellationToken,
    generation: u64,
}

struct LoaderInner {
    client: Arc<dyn CodeHostClient>,
    parser: Arc<dyn DiffParser>,
    cache: SharedDiffCache,
    config: LoaderConfig,
    in_flight: Mutex<HashMap<String, InFlight>>,
    generation: AtomicU64,
}

/// Loads parsed diffs through the shared cache.
///
/// Concurrent loads of one content hash share a single fetch. Activating a
/// file cancels in-flight loads of every other file.
#[derive(Clone)]
pub struct DiffLoader {
    inner: Arc<LoaderInner>,
}

impl DiffLoader {
    pub fn new(
        client: Arc<dyn CodeHostClient>,
        parser: Arc<dyn DiffParser>,
        cache: SharedDiffCache,
        config: LoaderConfig,
    ) -> Self {
        Self {
            inner: Arc::new(LoaderInner {
                client,
                parser,
                cache,
                config,
                in_flight: Mutex::new(HashMap::new()),
                generation: AtomicU64::new(0),
            }),
        }
    }

    pub fn cached(&self, hash: &str) -> Option<Arc<LoadedDiff>> {
        self.inner.lock_cache().get(hash)
    }

    pub fn is_in_flight(&self, hash: &str) -> bool {
        self.inner.lock_in_flight().contains_key(hash)
    }

    /// Load the diff for `file`, from cache when possible.
    pub async fn load(&self, file: &FileEntry) -> LoadResult {
        if let Some(hit) = self.cached(&file.content_hash) {
            debug!("Cache HIT for {} ({})", file.path, file.content_hash);
            return Ok(hit);
        }

        let future = {
            let mut in_flight = self.inner.lock_in_flight();
            match in_flight.get(&file.content_hash) {
                Some(entry) if !entry.cancel.is_cancelled() => {
                    debug!("Joining in-flight load for {}", file.path);
                    entry.future.clone()
                }
                _ => {
                    debug!("Cache MISS for {} ({})", file.path, file.content_hash);
                    let cancel = CancellationToken::new();
                    let generation = self.inner.generation.fetch_add(1, Ordering::Relaxed);
                    let future = self.start(file.clone(), cancel.clone(), generation);
                    in_flight.insert(
                        file.content_hash.clone(),
                        InFlight {
                            future: future.clone(),
                            cancel,
                            generation,
                        },
                    );
                    future
                }
            }
        };

        future.await
    }

    fn start(&self, file: FileEntry, cancel: CancellationToken, generation: u64) -> LoadFuture {
        let inner = self.inner.clone();
        async move {
            let result = inner.fetch_and_parse(&file, &cancel).await;
            inner.finish(&file.content_hash, generation, &result);
            result
        }
        .boxed()
        .shared()
    }

    /// Make `hash` the displayed diff: pin it in the cache and cancel every
    /// other in-flight load.
    pub fn set_active(&self, hash: Option<&str>) {
        self.inner.lock_cache().pin(hash);

        let mut in_flight = self.inner.lock_in_flight();
        in_flight.retain(|key, entry| {
            if Some(key.as_str()) == hash {
                return true;
            }
            debug!("Cancelling in-flight load {}", key);
            entry.cancel.cancel();
            false
        });
    }

    /// Warm the cache for `files` one after another. Failures are ignored.
    pub fn prefetch(&self, files: Vec<FileEntry>) -> JoinHandle<()> {
        let loader = self.clone();
        tokio::spawn(async move {
            for file in files {
                if loader.cached(&file.content_hash).is_some() {
                    continue;
                }
                if let Err(e) = loader.load(&file).await {
                    debug!("Prefetch of {} skipped: {}", file.path, e);
                }
            }
        })
    }
}

impl LoaderInner {
    fn lock_cache(&self) -> MutexGuard<'_, DiffCache> {
        self.cache.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn lock_in_flight(&self) -> MutexGuard<'_, HashMap<String, InFlight>> {
        self.in_flight.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn finish(&self, hash: &str, generation: u64, result: &LoadResult) {
        {
            let mut in_flight = self.lock_in_flight();
            if in_flight.get(hash).is_some_and(|e| e.generation == generation) {
                in_flight.remove(hash);
            }
        }
        if let Ok(diff) = result {
            self.lock_cache().insert(hash, diff.clone());
        }
    }

    async fn fetch_and_parse(&self, file: &FileEntry, cancel: &CancellationToken) -> LoadResult {
        let Some(patch) = file.patch.clone() else {
            debug!("{} has no patch, showing an empty diff", file.path);
            return Ok(Arc::new(LoadedDiff::empty()));
        };

        let new_content = if self.config.fetch_full_content && file.status != FileStatus::Removed {
            tokio::select! {
                _ = cancel.cancelled() => return Err(LoadError::Cancelled),
                fetched = self.client.fetch_file_content(
                    &self.config.owner,
                    &self.config.repo,
                    &file.path,
                    &self.config.head_sha,
                ) => fetched.map_err(|e| LoadError::Fetch(format!("{e:#}")))?,
            }
        } else {
            None
        };

        if cancel.is_cancelled() {
            return Err(LoadError::Cancelled);
        }

        let new_content: Option<Arc<str>> = new_content.map(Arc::from);
        let parser = self.parser.clone();
        let path = file.path.clone();
        let previous_path = file.previous_path.clone();
        let content = new_content.clone();
        let diff: ParsedDiff = tokio::task::spawn_blocking(move || {
            parser.parse(
                &patch,
                &path,
                previous_path.as_deref(),
                None,
                content.as_deref(),
            )
        })
        .await
        .map_err(|e| LoadError::Join(e.to_string()))??;

        if cancel.is_cancelled() {
            debug!("Discarding parsed diff of {}, load was cancelled", file.path);
            return Err(LoadError::Cancelled);
        }

        Ok(Arc::new(LoadedDiff::new(diff, new_content)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::UnifiedDiffParser;
    use crate::test_support;
    use pretty_assertions::assert_eq;
    use review_host::FixtureClient;
    use std::time::Duration;

    fn loader(client: FixtureClient, capacity: usize) -> DiffLoader {
        DiffLoader::new(
            Arc::new(client),
            Arc::new(UnifiedDiffParser::new()),
            DiffCache::shared(capacity),
            LoaderConfig {
                owner: "acme".to_string(),
                repo: "widgets".to_string(),
                head_sha: "head1".to_string(),
                fetch_full_content: true,
            },
        )
    }

    fn files() -> Vec<FileEntry> {
        test_support::fixture()
            .files
            .into_iter()
            .map(FileEntry::from)
            .collect()
    }

    #[tokio::test]
    async fn test_load_parses_and_caches() {
        let client = test_support::client();
        let loader = loader(client.clone(), 10);
        let app = files().remove(0);

        let loaded = loader.load(&app).await.unwrap();
        assert_eq!(loaded.diff.skip_blocks().count(), 1);
        assert_eq!(loaded.navigable.len(), 5);
        assert_eq!(loaded.new_content.as_deref(), Some("a\nB\nc\nd\ne\nf\n"));

        let again = loader.load(&app).await.unwrap();
        assert!(Arc::ptr_eq(&loaded, &again));
        assert_eq!(client.call_count("fetch_file_content"), 1);
    }

    #[tokio::test]
    async fn test_concurrent_loads_coalesce() {
        let client = test_support::client().with_content_delay(Duration::from_millis(50));
        let loader = loader(client.clone(), 10);
        let app = files().remove(0);

        let (first, second) = tokio::join!(loader.load(&app), loader.load(&app));

        let first = first.unwrap();
        let second = second.unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(client.call_count("fetch_file_content"), 1);
        assert!(!loader.is_in_flight(&app.content_hash));
    }

    #[tokio::test]
    async fn test_set_active_cancels_other_loads() {
        let client = test_support::client().with_content_delay(Duration::from_millis(200));
        let loader = loader(client, 10);
        let all = files();
        let app = all[0].clone();
        let readme = all[1].clone();

        let pending = tokio::spawn({
            let loader = loader.clone();
            async move { loader.load(&app).await }
        });
        tokio::time::sleep(Duration::from_millis(20)).await;
        loader.set_active(Some(&readme.content_hash));

        let result = pending.await.unwrap();
        assert_eq!(result.map(|_| ()), Err(LoadError::Cancelled));
        assert!(loader.cached("sha-app").is_none());
    }

    #[tokio::test]
    async fn test_set_active_keeps_active_load() {
        let client = test_support::client().with_content_delay(Duration::from_millis(50));
        let loader = loader(client, 10);
        let app = files().remove(0);

        let pending = tokio::spawn({
            let loader = loader.clone();
            let app = app.clone();
            async move { loader.load(&app).await }
        });
        tokio::time::sleep(Duration::from_millis(10)).await;
        loader.set_active(Some(&app.content_hash));

        assert!(pending.await.unwrap().is_ok());
        assert!(loader.cached(&app.content_hash).is_some());
    }

    #[tokio::test]
    async fn test_fetch_failure_surfaces_as_fetch_error() {
        let client = test_support::client();
        client.set_fail_reads(true);
        let loader = loader(client, 10);

        let result = loader.load(&files()[0]).await;
        assert!(matches!(result, Err(LoadError::Fetch(_))));
    }

    #[tokio::test]
    async fn test_prefetch_warms_cache() {
        let client = test_support::client();
        let loader = loader(client, 10);

        loader.prefetch(files()).await.unwrap();

        for file in files() {
            assert!(loader.cached(&file.content_hash).is_some(), "{} not cached", file.path);
        }
    }

    #[tokio::test]
    async fn test_displayed_diff_never_evicted() {
        let client = test_support::client();
        let loader = loader(client, 1);
        let all = files();

        loader.set_active(Some(&all[0].content_hash));
        loader.load(&all[0]).await.unwrap();
        loader.load(&all[1]).await.unwrap();

        assert!(loader.cached(&all[0].content_hash).is_some());
    }
}
