//! Error taxonomy of store requests.

use std::{error::Error as StdError, sync::Arc};

use reqwest::StatusCode;
use thiserror::Error;

/// Where a store request failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    /// The request could not complete (connection, timeout, body read).
    Transport,
    /// The store answered with a non-success status.
    Protocol,
    /// The body did not have the expected structure.
    Shape,
}

/// Uniform failure of a store request.
///
/// Readers only look at the message; the kind, status and cause are kept
/// for logging and tests.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct FetchError {
    kind: FetchErrorKind,
    message: String,
    status: Option<u16>,
    #[source]
    cause: Option<Arc<dyn StdError + Send + Sync>>,
}

impl FetchError {
    /// The request could not complete.
    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::Transport, message)
    }

    /// Non-success status, rendered as `HTTP Error: 500 Internal Server Error`.
    pub fn protocol(status: StatusCode) -> Self {
        let reason = status.canonical_reason().unwrap_or_default();
        let message = format!("HTTP Error: {} {}", status.as_u16(), reason);
        Self::rejected(status, message.trim_end())
    }

    /// Non-success status reported with a request-specific message.
    pub fn rejected(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status: Some(status.as_u16()),
            ..Self::new(FetchErrorKind::Protocol, message)
        }
    }

    /// The body did not decode into the expected records.
    pub fn shape(message: impl Into<String>) -> Self {
        Self::new(FetchErrorKind::Shape, message)
    }

    /// Attach the underlying error.
    pub fn with_cause<E>(mut self, cause: E) -> Self
    where
        E: StdError + Send + Sync + 'static,
    {
        self.cause = Some(Arc::new(cause));
        self
    }

    fn new(kind: FetchErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            status: None,
            cause: None,
        }
    }

    /// Failure category.
    pub fn kind(&self) -> FetchErrorKind {
        self.kind
    }

    /// Message shown to the reader.
    pub fn message(&self) -> &str {
        &self.message
    }

    /// HTTP status for protocol failures.
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    /// Whether the request never completed.
    pub fn is_transport(&self) -> bool {
        self.kind == FetchErrorKind::Transport
    }

    /// Whether the store answered with a failure status.
    pub fn is_protocol(&self) -> bool {
        self.kind == FetchErrorKind::Protocol
    }

    /// Whether the body was malformed.
    pub fn is_shape(&self) -> bool {
        self.kind == FetchErrorKind::Shape
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::transport(format!("Network error: {err}")).with_cause(err)
    }
}
