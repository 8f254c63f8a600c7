//! In-memory [`ArticleStore`] with scripted failures, for tests and demos.

use std::{
    collections::VecDeque,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc,
    },
};

use async_trait::async_trait;
use blogdesk_shared::{Article, ArticleId};
use parking_lot::Mutex;
use tokio::sync::Semaphore;

use crate::{api::ArticleStore, error::FetchError};

/// Build a complete article with predictable fields.
pub fn sample_article(id: u64, title: &str) -> Article {
    Article {
        id: ArticleId(id),
        title: title.to_string(),
        description: format!("About {title}"),
        category: vec!["TECH".to_string()],
        date: "2026-01-11T09:12:45.120Z".to_string(),
        cover_image: format!("https://images.example.com/{id}.jpeg"),
        content: format!("{title} opens here.\n\n{title} closes here."),
    }
}

/// Store that keeps the collection in memory and behaves like a plain JSON
/// REST server: created records are appended verbatim.
#[derive(Default)]
pub struct MockArticleStore {
    articles: Mutex<Vec<Article>>,
    received: Mutex<Vec<Article>>,
    fetch_failures: Mutex<VecDeque<FetchError>>,
    create_failures: Mutex<VecDeque<FetchError>>,
    fetch_gate: Mutex<Option<Arc<Semaphore>>>,
    fetch_calls: AtomicUsize,
    create_calls: AtomicUsize,
}

impl MockArticleStore {
    /// Store whose remote collection starts as `articles`.
    pub fn with_articles(articles: Vec<Article>) -> Self {
        Self {
            articles: Mutex::new(articles),
            ..Self::default()
        }
    }

    /// Fail the next `fetch_all` with `err`. Queued failures are consumed in
    /// order before any success.
    pub fn fail_next_fetch(&self, err: FetchError) {
        self.fetch_failures.lock().push_back(err);
    }

    /// Fail the next `create` with `err`.
    pub fn fail_next_create(&self, err: FetchError) {
        self.create_failures.lock().push_back(err);
    }

    /// Block every later `fetch_all` until [`Self::release_fetches`] lets it
    /// through.
    pub fn hold_fetches(&self) {
        *self.fetch_gate.lock() = Some(Arc::new(Semaphore::new(0)));
    }

    /// Let `count` held fetches through.
    pub fn release_fetches(&self, count: usize) {
        if let Some(gate) = self.fetch_gate.lock().as_ref() {
            gate.add_permits(count);
        }
    }

    /// Change the remote collection behind the reader's back.
    pub fn push_remote(&self, article: Article) {
        self.articles.lock().push(article);
    }

    /// Number of `fetch_all` calls so far.
    pub fn fetch_calls(&self) -> usize {
        self.fetch_calls.load(Ordering::SeqCst)
    }

    /// Number of `create` calls so far.
    pub fn create_calls(&self) -> usize {
        self.create_calls.load(Ordering::SeqCst)
    }

    /// Envelopes received by `create`, in arrival order.
    pub fn received(&self) -> Vec<Article> {
        self.received.lock().clone()
    }
}

#[async_trait]
impl ArticleStore for MockArticleStore {
    async fn fetch_all(&self) -> Result<Vec<Article>, FetchError> {
        self.fetch_calls.fetch_add(1, Ordering::SeqCst);
        tokio::task::yield_now().await;

        let gate = self.fetch_gate.lock().clone();
        if let Some(gate) = gate {
            if let Ok(permit) = gate.acquire().await {
                permit.forget();
            }
        }

        if let Some(err) = self.fetch_failures.lock().pop_front() {
            return Err(err);
        }
        Ok(self.articles.lock().clone())
    }

    async fn create(&self, envelope: &Article) -> Result<Article, FetchError> {
        self.create_calls.fetch_add(1, Ordering::SeqCst);
        self.received.lock().push(envelope.clone());
        tokio::task::yield_now().await;

        if let Some(err) = self.create_failures.lock().pop_front() {
            return Err(err);
        }
        self.articles.lock().push(envelope.clone());
        Ok(envelope.clone())
    }
}
