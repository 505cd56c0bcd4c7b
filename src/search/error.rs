//! Error types for search operations

use crate::error::AppError;
use reqwest::StatusCode;

/// Result type for search operations
pub type SearchResult<T> = std::result::Result<T, SearchError>;

/// Errors that can occur during search operations.
///
/// Validation variants are raised before any network call. The rest carry the
/// name of the engine operation that failed.
#[derive(Debug, thiserror::Error)]
pub enum SearchError {
    /// Asset or document ID is empty
    #[error("asset id is empty")]
    EmptyId,

    /// Asset URN is empty
    #[error("asset urn is empty")]
    EmptyUrn,

    /// Asset type outside the supported set
    #[error("unknown asset type: {0:?}")]
    UnknownType(String),

    /// Search text is empty or whitespace
    #[error("search text cannot be empty")]
    EmptySearchText,

    /// Namespace has no usable name
    #[error("namespace cannot be empty")]
    EmptyNamespace,

    /// Asset or binding names no service
    #[error("service name cannot be empty")]
    EmptyService,

    /// Service name collides with a name the subsystem manages itself
    #[error("index name {0:?} is reserved")]
    ReservedIndexName(String),

    /// Request never produced a response (connect, timeout, body read)
    #[error("{op}: transport error: {source}")]
    Transport {
        op: &'static str,
        #[source]
        source: reqwest::Error,
    },

    /// Engine answered with a non-success status
    #[error("{op}: engine returned {status}: {reason}")]
    Response {
        op: &'static str,
        status: StatusCode,
        reason: String,
    },

    /// Success response missing an expected structural key
    #[error("{op}: unexpected response: {message}")]
    Contract { op: &'static str, message: String },

    /// Namespace directory lookup failed
    #[error("{op}: namespace lookup failed: {message}")]
    Directory { op: &'static str, message: String },

    /// Response body or request payload could not be (de)serialized
    #[error("{op}: {source}")]
    Decode {
        op: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

impl SearchError {
    /// Whether the error was detected before reaching the engine
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            SearchError::EmptyId
                | SearchError::EmptyUrn
                | SearchError::UnknownType(_)
                | SearchError::EmptySearchText
                | SearchError::EmptyNamespace
                | SearchError::EmptyService
                | SearchError::ReservedIndexName(_)
        )
    }

    pub(crate) fn transport(op: &'static str) -> impl FnOnce(reqwest::Error) -> Self {
        move |source| SearchError::Transport { op, source }
    }

    pub(crate) fn decode(op: &'static str) -> impl FnOnce(serde_json::Error) -> Self {
        move |source| SearchError::Decode { op, source }
    }
}

impl From<SearchError> for AppError {
    fn from(err: SearchError) -> Self {
        if err.is_validation() {
            return AppError::Validation(err.to_string());
        }
        match &err {
            SearchError::Transport { source, .. } if source.is_timeout() => {
                AppError::Timeout(err.to_string())
            }
            _ => AppError::Internal(err.to_string()),
        }
    }
}
