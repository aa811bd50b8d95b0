//! Spire AIS connector error types.

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// HTTP failure details captured from reqwest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpErrorInfo {
    /// Error message.
    pub message: String,
    /// HTTP status code (if available).
    pub status_code: Option<u16>,
    /// Whether the request timed out.
    pub is_timeout: bool,
    /// Whether the connection could not be established.
    pub is_connect: bool,
}

impl From<reqwest::Error> for HttpErrorInfo {
    fn from(err: reqwest::Error) -> Self {
        Self {
            message: err.to_string(),
            status_code: err.status().map(|status| status.as_u16()),
            is_timeout: err.is_timeout(),
            is_connect: err.is_connect(),
        }
    }
}

/// GraphQL error entry from a response `errors` array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphqlError {
    /// Human-readable error message.
    pub message: String,
    /// Extensions metadata (error codes and the like).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extensions: Option<serde_json::Value>,
}

/// Failure of a single GraphQL request/response exchange.
#[derive(Debug, Clone, Error)]
pub enum GraphqlClientError {
    /// Network-level failure.
    #[error("HTTP error: {}", .0.message)]
    Http(HttpErrorInfo),

    /// Non-success HTTP status.
    #[error("HTTP status {status} with body: {body}")]
    HttpStatus {
        /// HTTP status code.
        status: StatusCode,
        /// Response body (truncated).
        body: String,
    },

    /// Response body was not the expected JSON.
    #[error("JSON error: {0}")]
    Json(String),

    /// The server answered with GraphQL errors.
    #[error("GraphQL errors: {}", join_messages(.errors))]
    GraphqlErrors {
        /// GraphQL error list.
        errors: Vec<GraphqlError>,
    },

    /// Response had neither `data` nor `errors`.
    #[error("GraphQL protocol error: {message}")]
    Protocol {
        /// Details.
        message: String,
    },
}

fn join_messages(errors: &[GraphqlError]) -> String {
    errors
        .iter()
        .map(|err| err.message.as_str())
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<reqwest::Error> for GraphqlClientError {
    fn from(err: reqwest::Error) -> Self {
        Self::Http(HttpErrorInfo::from(err))
    }
}

impl From<serde_json::Error> for GraphqlClientError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err.to_string())
    }
}

/// Connector errors surfaced to the host.
#[derive(Error, Debug)]
pub enum AisError {
    /// Missing or invalid configuration.
    #[error("invalid config: {0}")]
    Config(String),

    /// A page could not be fetched within the retry budget.
    #[error("error making GraphQL request after {attempts} attempts: {source}")]
    Fetch {
        /// Attempts made.
        attempts: u32,
        /// Failure of the last attempt.
        #[source]
        source: GraphqlClientError,
    },

    /// A vessel could not be turned into a record.
    #[error("error wrapping vessel {id} as a record: {message}")]
    Transform {
        /// Vessel identifier.
        id: String,
        /// Details.
        message: String,
    },

    /// Saved position could not be decoded.
    #[error("invalid position: {0}")]
    InvalidPosition(String),

    /// No data available right now; the host should retry later.
    #[error("no data available, retry later")]
    BackoffRetry,

    /// `open` called before `configure`.
    #[error("connector not configured")]
    NotConfigured,

    /// `read` called before `open`.
    #[error("connector not opened")]
    NotOpened,

    /// Malformed host request.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl AisError {
    /// Whether this is the non-fatal "nothing to read yet" signal.
    #[must_use]
    pub const fn is_backoff(&self) -> bool {
        matches!(self, Self::BackoffRetry)
    }

    /// Stable error code for the host protocol.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "invalid_config",
            Self::Fetch { .. } => "fetch_failed",
            Self::Transform { .. } => "transform_failed",
            Self::InvalidPosition(_) => "invalid_position",
            Self::BackoffRetry => "backoff_retry",
            Self::NotConfigured => "not_configured",
            Self::NotOpened => "not_opened",
            Self::InvalidRequest(_) => "invalid_request",
        }
    }
}

/// Result type for connector operations.
pub type AisResult<T> = Result<T, AisError>;
