//! Explicit query cache: one slot per [`QueryKey`] holding the current
//! [`CacheEntry`] and the handle of the fetch in flight, if any.

use std::{collections::HashMap, fmt, sync::Arc, time::Duration};

use blogdesk_shared::Article;
use futures::future::{BoxFuture, Shared};
use parking_lot::Mutex;
use tokio::{sync::watch, time::Instant};

use crate::error::FetchError;

/// Result of one collection fetch, shared by every caller attached to it.
pub type FetchOutcome = Result<Arc<Vec<Article>>, FetchError>;

/// Handle of a fetch in flight. Cloning attaches another waiter.
pub type InFlight = Shared<BoxFuture<'static, FetchOutcome>>;

/// Name of a cached query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct QueryKey(&'static str);

impl QueryKey {
    /// The article collection served by `GET /blogs`.
    pub const BLOGS: QueryKey = QueryKey("blogs");

    /// Key name, as used in logs.
    pub fn as_str(&self) -> &'static str {
        self.0
    }
}

impl fmt::Display for QueryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

/// Lifecycle of a cache entry: `idle -> loading -> success | error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QueryStatus {
    /// Never fetched.
    Idle,
    /// A fetch is in flight.
    Loading,
    /// The last fetch succeeded.
    Success,
    /// The last fetch failed after its retries.
    Error,
}

/// What the reader currently believes about one remote collection.
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Where the entry is in its lifecycle.
    pub status: QueryStatus,
    /// Last successfully fetched collection. Kept through refetches and
    /// failed refetches.
    pub data: Option<Arc<Vec<Article>>>,
    /// Failure of the last settled fetch, set only in [`QueryStatus::Error`].
    /// Cleared when a new fetch starts.
    pub error: Option<FetchError>,
    /// When the last successful fetch completed.
    pub updated_at: Option<Instant>,
    /// Set by an invalidation, cleared by the next successful fetch.
    pub invalidated: bool,
}

impl CacheEntry {
    fn idle() -> Self {
        Self {
            status: QueryStatus::Idle,
            data: None,
            error: None,
            updated_at: None,
            invalidated: false,
        }
    }

    /// Cached articles, empty when nothing was fetched yet.
    pub fn articles(&self) -> &[Article] {
        self.data.as_deref().map(Vec::as_slice).unwrap_or_default()
    }

    /// Loading with nothing to show yet.
    pub fn is_loading(&self) -> bool {
        self.status == QueryStatus::Loading && self.data.is_none()
    }

    /// A fetch is in flight, with or without data to show.
    pub fn is_fetching(&self) -> bool {
        self.status == QueryStatus::Loading
    }

    /// Whether the last fetch succeeded.
    pub fn is_success(&self) -> bool {
        self.status == QueryStatus::Success
    }

    /// Whether the last fetch failed.
    pub fn is_error(&self) -> bool {
        self.status == QueryStatus::Error
    }

    /// Human-readable failure message for the error state.
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_ref().map(FetchError::message)
    }

    /// Whether the data should be refreshed before being trusted.
    pub fn is_stale(&self, stale_after: Duration, now: Instant) -> bool {
        if self.invalidated {
            return true;
        }
        match self.updated_at {
            Some(at) => now.saturating_duration_since(at) >= stale_after,
            None => true,
        }
    }
}

/// How a fetch left its slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settled {
    /// The entry now holds the outcome and the in-flight handle is gone.
    Done,
    /// The key was invalidated while the request was out; the fetch must run
    /// again and stays in flight.
    Superseded,
}

struct Slot {
    entry: watch::Sender<CacheEntry>,
    in_flight: Option<InFlight>,
    generation: u64,
}

impl Slot {
    fn new() -> Self {
        let (entry, _) = watch::channel(CacheEntry::idle());
        Self {
            entry,
            in_flight: None,
            generation: 0,
        }
    }
}

/// Cache store shared by the coordinator and whoever observes it.
///
/// Lives as long as the reader session that owns it; nothing is persisted.
#[derive(Default)]
pub struct QueryCache {
    slots: Mutex<HashMap<QueryKey, Slot>>,
}

impl QueryCache {
    /// Empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current entry for `key`.
    pub fn snapshot(&self, key: QueryKey) -> CacheEntry {
        self.with_slot(key, |slot| slot.entry.borrow().clone())
    }

    /// Last fetched collection for `key`, even when stale or refetching.
    pub fn data(&self, key: QueryKey) -> Option<Arc<Vec<Article>>> {
        self.with_slot(key, |slot| slot.entry.borrow().data.clone())
    }

    /// Change notifications for `key`.
    pub fn subscribe(&self, key: QueryKey) -> watch::Receiver<CacheEntry> {
        self.with_slot(key, |slot| slot.entry.subscribe())
    }

    /// Handle of the fetch in flight for `key`.
    pub fn in_flight(&self, key: QueryKey) -> Option<InFlight> {
        self.with_slot(key, |slot| slot.in_flight.clone())
    }

    /// Invalidation counter of `key`; a fetch compares it before and after
    /// its request to detect invalidations that raced with it.
    pub fn generation(&self, key: QueryKey) -> u64 {
        self.with_slot(key, |slot| slot.generation)
    }

    /// Attach to the fetch in flight for `key`, or register the one built by
    /// `start` and move the entry to loading.
    ///
    /// Returns the handle and whether it was newly registered. `start` runs
    /// under the cache lock and must only build the future.
    pub fn begin_fetch(&self, key: QueryKey, start: impl FnOnce() -> InFlight) -> (InFlight, bool) {
        self.with_slot(key, |slot| {
            if let Some(handle) = slot.in_flight.as_ref() {
                return (handle.clone(), false);
            }

            let handle = start();
            slot.in_flight = Some(handle.clone());
            slot.entry.send_modify(|entry| {
                entry.status = QueryStatus::Loading;
                entry.error = None;
            });
            (handle, true)
        })
    }

    /// Record the outcome of a fetch that started at `generation`.
    pub fn settle(
        &self,
        key: QueryKey,
        generation: u64,
        outcome: &FetchOutcome,
        now: Instant,
    ) -> Settled {
        self.with_slot(key, |slot| {
            if slot.generation != generation {
                if let Ok(articles) = outcome {
                    slot.entry.send_modify(|entry| {
                        entry.data = Some(articles.clone());
                    });
                }
                return Settled::Superseded;
            }

            slot.in_flight = None;
            slot.entry.send_modify(|entry| match outcome {
                Ok(articles) => {
                    entry.status = QueryStatus::Success;
                    entry.data = Some(articles.clone());
                    entry.error = None;
                    entry.updated_at = Some(now);
                    entry.invalidated = false;
                },
                Err(err) => {
                    entry.status = QueryStatus::Error;
                    entry.error = Some(err.clone());
                },
            });
            Settled::Done
        })
    }

    /// Mark `key` stale. Returns whether a fetch is in flight for it.
    pub fn invalidate(&self, key: QueryKey) -> bool {
        self.with_slot(key, |slot| {
            slot.generation = slot.generation.wrapping_add(1);
            slot.entry.send_modify(|entry| {
                entry.invalidated = true;
            });
            slot.in_flight.is_some()
        })
    }

    fn with_slot<R>(&self, key: QueryKey, f: impl FnOnce(&mut Slot) -> R) -> R {
        let mut slots = self.slots.lock();
        f(slots.entry(key).or_insert_with(Slot::new))
    }
}

#[cfg(test)]
mod tests {
    use blogdesk_shared::ArticleId;
    use futures::FutureExt;

    use super::*;
    use crate::mock::sample_article;

    fn ready(outcome: FetchOutcome) -> InFlight {
        futures::future::ready(outcome).boxed().shared()
    }

    fn collection(ids: &[u64]) -> Arc<Vec<Article>> {
        Arc::new(ids.iter().map(|id| sample_article(*id, "Post")).collect())
    }

    #[test]
    fn new_key_starts_idle() {
        let cache = QueryCache::new();
        let entry = cache.snapshot(QueryKey::BLOGS);
        assert_eq!(entry.status, QueryStatus::Idle);
        assert!(entry.articles().is_empty());
        assert!(cache.in_flight(QueryKey::BLOGS).is_none());
    }

    #[test]
    fn begin_fetch_registers_once_and_marks_loading() {
        let cache = QueryCache::new();
        let (_, started) = cache.begin_fetch(QueryKey::BLOGS, || ready(Ok(collection(&[1]))));
        assert!(started);
        assert!(cache.snapshot(QueryKey::BLOGS).is_loading());

        let (_, started_again) =
            cache.begin_fetch(QueryKey::BLOGS, || panic!("second fetch must attach"));
        assert!(!started_again);
    }

    #[test]
    fn settle_success_stores_data_and_clears_in_flight() {
        let cache = QueryCache::new();
        let _ = cache.begin_fetch(QueryKey::BLOGS, || ready(Ok(collection(&[1]))));
        let generation = cache.generation(QueryKey::BLOGS);

        let now = Instant::now();
        let settled = cache.settle(QueryKey::BLOGS, generation, &Ok(collection(&[1, 2])), now);

        assert_eq!(settled, Settled::Done);
        let entry = cache.snapshot(QueryKey::BLOGS);
        assert!(entry.is_success());
        assert_eq!(entry.articles().len(), 2);
        assert_eq!(entry.updated_at, Some(now));
        assert!(cache.in_flight(QueryKey::BLOGS).is_none());
    }

    #[test]
    fn failed_refetch_keeps_previous_data() {
        let cache = QueryCache::new();
        let generation = cache.generation(QueryKey::BLOGS);
        cache.settle(QueryKey::BLOGS, generation, &Ok(collection(&[1])), Instant::now());

        let _ = cache.begin_fetch(QueryKey::BLOGS, || ready(Ok(collection(&[]))));
        let err = FetchError::transport("Network error: connection refused");
        cache.settle(QueryKey::BLOGS, generation, &Err(err), Instant::now());

        let entry = cache.snapshot(QueryKey::BLOGS);
        assert!(entry.is_error());
        assert_eq!(entry.error_message(), Some("Network error: connection refused"));
        assert_eq!(entry.articles()[0].id, ArticleId(1));
    }

    #[test]
    fn new_fetch_clears_the_previous_error() {
        let cache = QueryCache::new();
        let _ = cache.begin_fetch(QueryKey::BLOGS, || ready(Ok(collection(&[1]))));
        let generation = cache.generation(QueryKey::BLOGS);
        let err = FetchError::transport("Network error: connection refused");
        cache.settle(QueryKey::BLOGS, generation, &Err(err), Instant::now());
        assert!(cache.snapshot(QueryKey::BLOGS).error_message().is_some());

        let _ = cache.begin_fetch(QueryKey::BLOGS, || ready(Ok(collection(&[1]))));

        let entry = cache.snapshot(QueryKey::BLOGS);
        assert!(entry.is_fetching());
        assert!(entry.error.is_none());
        assert_eq!(entry.error_message(), None);
    }

    #[test]
    fn invalidation_during_flight_supersedes_the_outcome() {
        let cache = QueryCache::new();
        let _ = cache.begin_fetch(QueryKey::BLOGS, || ready(Ok(collection(&[1]))));
        let generation = cache.generation(QueryKey::BLOGS);

        assert!(cache.invalidate(QueryKey::BLOGS));
        let settled =
            cache.settle(QueryKey::BLOGS, generation, &Ok(collection(&[1])), Instant::now());

        assert_eq!(settled, Settled::Superseded);
        let entry = cache.snapshot(QueryKey::BLOGS);
        assert!(entry.is_fetching());
        assert!(entry.invalidated);
        assert!(cache.in_flight(QueryKey::BLOGS).is_some());
    }

    #[test]
    fn staleness_follows_age_and_invalidation() {
        let cache = QueryCache::new();
        let start = Instant::now();
        let generation = cache.generation(QueryKey::BLOGS);
        cache.settle(QueryKey::BLOGS, generation, &Ok(collection(&[1])), start);

        let window = Duration::from_secs(120);
        let entry = cache.snapshot(QueryKey::BLOGS);
        assert!(!entry.is_stale(window, start + Duration::from_secs(119)));
        assert!(entry.is_stale(window, start + Duration::from_secs(120)));

        cache.invalidate(QueryKey::BLOGS);
        assert!(cache.snapshot(QueryKey::BLOGS).is_stale(window, start));
    }
}
