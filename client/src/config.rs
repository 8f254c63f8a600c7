//! Runtime configuration for the store client and the query coordinator.

use std::{env, time::Duration};

/// Base URL of the article store. Read at compile time from
/// `BLOGDESK_API_BASE`, falling back to the local development server.
pub const API_BASE: &str = match option_env!("BLOGDESK_API_BASE") {
    Some(url) => url,
    None => "http://localhost:3001",
};

const DEFAULT_HTTP_TIMEOUT_SECONDS: u64 = 30;
const MIN_HTTP_TIMEOUT_SECONDS: u64 = 3;

/// Connection settings for [`crate::api::HttpArticleStore`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Store base URL; `/blogs` is appended to it.
    pub api_base: String,
    /// Whole-request timeout.
    pub timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base: API_BASE.to_string(),
            timeout: Duration::from_secs(DEFAULT_HTTP_TIMEOUT_SECONDS),
        }
    }
}

impl ClientConfig {
    /// Read `BLOGDESK_API_BASE` and `BLOGDESK_HTTP_TIMEOUT_SECONDS`.
    pub fn from_env() -> Self {
        let api_base = env::var("BLOGDESK_API_BASE")
            .ok()
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| API_BASE.to_string());
        let timeout = env::var("BLOGDESK_HTTP_TIMEOUT_SECONDS")
            .ok()
            .and_then(|value| value.trim().parse::<u64>().ok())
            .unwrap_or(DEFAULT_HTTP_TIMEOUT_SECONDS);

        Self {
            api_base,
            timeout: Duration::from_secs(timeout),
        }
        .normalized()
    }

    /// Clamp the timeout and drop trailing slashes from the base URL.
    pub fn normalized(mut self) -> Self {
        self.api_base = self.api_base.trim_end_matches('/').to_string();
        self.timeout = self
            .timeout
            .max(Duration::from_secs(MIN_HTTP_TIMEOUT_SECONDS));
        self
    }
}

/// Retry and freshness policy of the article query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueryConfig {
    /// Extra attempts after a failed collection fetch.
    pub retry_count: u32,
    /// Age after which a successful entry is refetched in the background.
    pub stale_after: Duration,
    /// Pause before each retry attempt.
    pub retry_delay: Duration,
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            retry_count: 1,
            stale_after: Duration::from_millis(120_000),
            retry_delay: Duration::from_secs(1),
        }
    }
}

impl QueryConfig {
    /// Defaults overridden by `BLOGDESK_RETRY_COUNT` and
    /// `BLOGDESK_STALE_AFTER_SECONDS` when set.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(retry_count) = parse_env::<u32>("BLOGDESK_RETRY_COUNT") {
            config.retry_count = retry_count;
        }
        if let Some(seconds) = parse_env::<u64>("BLOGDESK_STALE_AFTER_SECONDS") {
            config.stale_after = Duration::from_secs(seconds);
        }
        config
    }
}

fn parse_env<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key)
        .ok()
        .and_then(|value| value.trim().parse::<T>().ok())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn query_defaults_match_documented_policy() {
        let config = QueryConfig::default();
        assert_eq!(config.retry_count, 1);
        assert_eq!(config.stale_after, Duration::from_secs(120));
    }

    #[test]
    fn normalized_trims_base_and_clamps_timeout() {
        let config = ClientConfig {
            api_base: "http://localhost:3001///".to_string(),
            timeout: Duration::from_secs(1),
        }
        .normalized();

        assert_eq!(config.api_base, "http://localhost:3001");
        assert_eq!(config.timeout, Duration::from_secs(3));
    }
}
