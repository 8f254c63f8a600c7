//! Query/cache coordinator for the article collection.
//!
//! The coordinator is the single source of truth for which articles the
//! reader believes exist. Reads are served from the [`QueryCache`]; at most
//! one collection fetch runs per key and every concurrent reader attaches to
//! it. A successful creation invalidates the collection and refetches it so
//! the new record shows up without a manual reload.

use std::sync::Arc;

use blogdesk_shared::{Article, ArticleDraft, ArticleId};
use chrono::Utc;
use futures::FutureExt;
use tokio::{sync::watch, time::Instant};

use crate::{
    api::ArticleStore,
    config::QueryConfig,
    error::FetchError,
    query::{CacheEntry, FetchOutcome, InFlight, QueryCache, QueryKey, QueryStatus, Settled},
};

/// Observable state of the last `create_article` call.
#[derive(Debug, Clone, Default)]
pub enum MutationState {
    /// No creation submitted yet.
    #[default]
    Idle,
    /// The store has not answered yet.
    Pending,
    /// The store's version of the created article.
    Success(Article),
    /// The creation failed; the cache was left untouched.
    Error(FetchError),
}

impl MutationState {
    /// Whether a creation is awaiting the store.
    pub fn is_pending(&self) -> bool {
        matches!(self, MutationState::Pending)
    }

    /// Whether the last creation failed.
    pub fn is_error(&self) -> bool {
        matches!(self, MutationState::Error(_))
    }
}

/// Coordinates reads and creations against one [`ArticleStore`].
///
/// Cloning is cheap and every clone shares the same cache. Methods that may
/// start a fetch spawn it on the current tokio runtime, so they must be
/// called from within one.
#[derive(Clone)]
pub struct ArticleCoordinator {
    inner: Arc<CoordinatorInner>,
}

struct CoordinatorInner {
    store: Arc<dyn ArticleStore>,
    cache: Arc<QueryCache>,
    config: QueryConfig,
    mutation: watch::Sender<MutationState>,
}

impl ArticleCoordinator {
    /// Coordinator over `store`, caching into `cache`.
    pub fn new(store: Arc<dyn ArticleStore>, cache: Arc<QueryCache>, config: QueryConfig) -> Self {
        let (mutation, _) = watch::channel(MutationState::Idle);
        Self {
            inner: Arc::new(CoordinatorInner {
                store,
                cache,
                config,
                mutation,
            }),
        }
    }

    /// Cache the coordinator writes to.
    pub fn cache(&self) -> &Arc<QueryCache> {
        &self.inner.cache
    }

    /// Retry and freshness policy in use.
    pub fn config(&self) -> &QueryConfig {
        &self.inner.config
    }

    /// Current collection entry, returned without waiting.
    ///
    /// Starts the first fetch when nothing was ever loaded, and a background
    /// refetch when the data is older than the freshness window or was
    /// invalidated; the stale data is still returned in that case. An entry
    /// in the error state is returned as is until [`Self::retry`].
    pub fn get_articles(&self) -> CacheEntry {
        let entry = self.inner.cache.snapshot(QueryKey::BLOGS);
        let should_fetch = match entry.status {
            QueryStatus::Idle => true,
            QueryStatus::Success => entry.is_stale(self.inner.config.stale_after, Instant::now()),
            QueryStatus::Loading | QueryStatus::Error => false,
        };
        if !should_fetch {
            return entry;
        }

        if entry.status == QueryStatus::Success {
            tracing::debug!("article collection is stale; revalidating in background");
        }
        drop(self.start_fetch());
        self.inner.cache.snapshot(QueryKey::BLOGS)
    }

    /// Fresh collection: the cached one when still fresh, otherwise the
    /// result of the fetch in flight or of a new one.
    pub async fn fetch_articles(&self) -> Result<Vec<Article>, FetchError> {
        let entry = self.inner.cache.snapshot(QueryKey::BLOGS);
        if entry.is_success() && !entry.is_stale(self.inner.config.stale_after, Instant::now()) {
            return Ok(entry.articles().to_vec());
        }

        let articles = self.start_fetch().await?;
        Ok(articles.as_ref().clone())
    }

    /// Manual retry. The only way out of the error state.
    pub fn retry(&self) -> CacheEntry {
        tracing::info!("retrying article collection fetch");
        drop(self.start_fetch());
        self.inner.cache.snapshot(QueryKey::BLOGS)
    }

    /// Mark the collection stale and refetch it. A fetch already in flight
    /// runs again once it completes, so its result never hides the
    /// invalidation.
    ///
    /// An entry in the error state is only marked stale; it leaves that
    /// state through [`Self::retry`] or an explicit [`Self::fetch_articles`].
    pub fn invalidate(&self) {
        let in_flight = self.inner.cache.invalidate(QueryKey::BLOGS);
        let status = self.inner.cache.snapshot(QueryKey::BLOGS).status;
        tracing::debug!(in_flight, ?status, "article collection invalidated");
        if status == QueryStatus::Error {
            return;
        }
        drop(self.start_fetch());
    }

    /// Submit a draft.
    ///
    /// The id is `count(cached collection) + 1` and the timestamp is now.
    /// Two creations issued before the refetch between them lands compute
    /// the same id; the store is not asked for a unique one. The store's
    /// response is returned. Creation is never retried, and a failure leaves
    /// the cached collection untouched.
    ///
    /// A success invalidates the collection, which refetches it unless the
    /// entry is in the error state. With no cached collection the id is 1,
    /// whatever the store already holds.
    pub async fn create_article(&self, draft: ArticleDraft) -> Result<Article, FetchError> {
        let cached_len = self
            .inner
            .cache
            .data(QueryKey::BLOGS)
            .map_or(0, |articles| articles.len());
        let id = ArticleId::next_after(cached_len);
        let envelope = draft.into_article(id, Utc::now());

        self.inner.mutation.send_replace(MutationState::Pending);
        tracing::info!(%id, title = %envelope.title, "creating article");

        match self.inner.store.create(&envelope).await {
            Ok(created) => {
                tracing::info!(id = %created.id, "article created");
                self.inner
                    .mutation
                    .send_replace(MutationState::Success(created.clone()));
                self.invalidate();
                Ok(created)
            },
            Err(err) => {
                tracing::warn!(%id, "article creation failed: {err}");
                self.inner
                    .mutation
                    .send_replace(MutationState::Error(err.clone()));
                Err(err)
            },
        }
    }

    /// State of the last creation.
    pub fn mutation_state(&self) -> MutationState {
        self.inner.mutation.borrow().clone()
    }

    /// Notified whenever the collection entry changes.
    pub fn subscribe(&self) -> watch::Receiver<CacheEntry> {
        self.inner.cache.subscribe(QueryKey::BLOGS)
    }

    /// Notified whenever the mutation state changes.
    pub fn subscribe_mutation(&self) -> watch::Receiver<MutationState> {
        self.inner.mutation.subscribe()
    }

    /// Attach to the collection fetch in flight or start one. A new fetch is
    /// spawned so it completes even if every waiter goes away.
    fn start_fetch(&self) -> InFlight {
        let (handle, started) = self.inner.cache.begin_fetch(QueryKey::BLOGS, || {
            let inner = self.inner.clone();
            async move { inner.run_fetch(QueryKey::BLOGS).await }
                .boxed()
                .shared()
        });
        if started {
            tokio::spawn(handle.clone());
        }
        handle
    }
}

impl CoordinatorInner {
    async fn run_fetch(&self, key: QueryKey) -> FetchOutcome {
        loop {
            let generation = self.cache.generation(key);
            tracing::debug!(%key, "fetching article collection");

            let outcome = self.fetch_with_retry().await.map(Arc::new);
            match &outcome {
                Ok(articles) => tracing::debug!(%key, count = articles.len(), "fetch succeeded"),
                Err(err) => tracing::warn!(%key, "fetch failed: {err}"),
            }

            match self.cache.settle(key, generation, &outcome, Instant::now()) {
                Settled::Done => return outcome,
                Settled::Superseded => {
                    tracing::debug!(%key, "invalidated during fetch; fetching again");
                },
            }
        }
    }

    async fn fetch_with_retry(&self) -> Result<Vec<Article>, FetchError> {
        let mut attempt = 0;
        loop {
            match self.store.fetch_all().await {
                Ok(articles) => return Ok(articles),
                Err(err) if attempt < self.config.retry_count => {
                    attempt += 1;
                    tracing::warn!(
                        attempt,
                        retries = self.config.retry_count,
                        "fetch failed, retrying: {err}"
                    );
                    if !self.config.retry_delay.is_zero() {
                        tokio::time::sleep(self.config.retry_delay).await;
                    }
                },
                Err(err) => return Err(err),
            }
        }
    }
}
