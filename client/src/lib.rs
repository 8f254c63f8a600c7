//! Client for the blog article store: the `/blogs` HTTP client and the
//! query coordinator that caches, revalidates and refetches the collection.

pub mod api;
pub mod config;
pub mod coordinator;
pub mod error;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod query;

pub use api::{ArticleStore, HttpArticleStore};
pub use config::{ClientConfig, QueryConfig};
pub use coordinator::{ArticleCoordinator, MutationState};
pub use error::{FetchError, FetchErrorKind};
pub use query::{CacheEntry, QueryCache, QueryKey, QueryStatus};
