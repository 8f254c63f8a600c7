//! HTTP client for the `/blogs` article resource.

use anyhow::Context;
use async_trait::async_trait;
use blogdesk_shared::Article;
use reqwest::{header, Response, StatusCode};
use serde_json::Value;

use crate::{config::ClientConfig, error::FetchError};

/// Message of a rejected `POST /blogs`.
pub const CREATE_FAILED: &str = "Failed to create blog";

/// Remote collection of articles.
#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Read the whole collection.
    async fn fetch_all(&self) -> Result<Vec<Article>, FetchError>;

    /// Submit `envelope` (draft plus client id and timestamp). The returned
    /// record is the store's version and wins over the envelope.
    async fn create(&self, envelope: &Article) -> Result<Article, FetchError>;
}

/// [`ArticleStore`] backed by the `/blogs` HTTP resource.
#[derive(Clone)]
pub struct HttpArticleStore {
    client: reqwest::Client,
    api_base: String,
}

impl HttpArticleStore {
    /// Build a store with its own client honouring the configured timeout.
    pub fn from_config(config: &ClientConfig) -> anyhow::Result<Self> {
        let config = config.clone().normalized();
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .context("failed to build article store http client")?;

        Ok(Self::with_client(client, config.api_base))
    }

    /// Store over an existing client. Trailing slashes of `api_base` are
    /// dropped.
    pub fn with_client(client: reqwest::Client, api_base: impl Into<String>) -> Self {
        let api_base = api_base.into().trim_end_matches('/').to_string();
        Self {
            client,
            api_base,
        }
    }

    /// Base URL requests are sent under.
    pub fn api_base(&self) -> &str {
        &self.api_base
    }

    fn blogs_url(&self) -> String {
        format!("{}/blogs", self.api_base)
    }
}

#[async_trait]
impl ArticleStore for HttpArticleStore {
    async fn fetch_all(&self) -> Result<Vec<Article>, FetchError> {
        let url = self.blogs_url();
        tracing::debug!("GET {url}");

        let response = self
            .client
            .get(&url)
            .header(header::CACHE_CONTROL, "no-cache, no-store, max-age=0")
            .header(header::PRAGMA, "no-cache")
            .send()
            .await?;

        let body = success_body(response, FetchError::protocol).await?;
        decode_collection(&body)
    }

    async fn create(&self, envelope: &Article) -> Result<Article, FetchError> {
        let url = self.blogs_url();
        tracing::debug!("POST {url} id={}", envelope.id);

        let response = self.client.post(&url).json(envelope).send().await?;

        let body =
            success_body(response, |status| FetchError::rejected(status, CREATE_FAILED)).await?;
        decode_article(&body)
    }
}

async fn success_body(
    response: Response,
    on_failure: impl FnOnce(StatusCode) -> FetchError,
) -> Result<Vec<u8>, FetchError> {
    let status = response.status();
    if !status.is_success() {
        return Err(on_failure(status));
    }
    Ok(response.bytes().await?.to_vec())
}

/// Decode a `GET /blogs` body. Anything but a JSON array of article records
/// is a shape error.
pub fn decode_collection(body: &[u8]) -> Result<Vec<Article>, FetchError> {
    let value = parse_json(body)?;
    if !value.is_array() {
        return Err(FetchError::shape("Invalid data format received from server"));
    }
    serde_json::from_value(value).map_err(|err| {
        FetchError::shape(format!("Invalid article record received from server: {err}"))
            .with_cause(err)
    })
}

/// Decode the record returned by `POST /blogs`.
pub fn decode_article(body: &[u8]) -> Result<Article, FetchError> {
    let value = parse_json(body)?;
    serde_json::from_value(value).map_err(|err| {
        FetchError::shape(format!("Invalid article record received from server: {err}"))
            .with_cause(err)
    })
}

fn parse_json(body: &[u8]) -> Result<Value, FetchError> {
    serde_json::from_slice(body)
        .map_err(|err| FetchError::shape("Invalid JSON received from server").with_cause(err))
}
