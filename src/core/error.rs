//! Core Error Types
//!
//! Unified error handling for the search pipeline.

use thiserror::Error;

/// Core module result type
pub type SearchResult<T> = Result<T, SearchError>;

/// Core error type
///
/// Executor failures are carried as `Backend` and are never rewrapped by the
/// pipeline: whatever the selected executor returns reaches the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SearchError {
    /// Table or related table could not be resolved
    #[error("Not found: {0}")]
    NotFound(String),

    /// Request could not be interpreted at all
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Failure raised by a row executor
    #[error("Backend error ({engine}): {message}")]
    Backend { engine: String, message: String },

    /// Configuration or table definition problem
    #[error("Configuration error: {0}")]
    Config(String),
}

impl SearchError {
    /// Create a not found error
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound(resource.into())
    }

    /// Create an invalid request error
    pub fn invalid_request(msg: impl Into<String>) -> Self {
        Self::InvalidRequest(msg.into())
    }

    /// Create a backend error tagged with the engine that raised it
    pub fn backend(engine: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Backend {
            engine: engine.into(),
            message: msg.into(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Get error code for API responses
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::InvalidRequest(_) => "INVALID_REQUEST",
            Self::Backend { .. } => "BACKEND_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
        }
    }

    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::InvalidRequest(_) => 400,
            Self::Backend { .. } => 500,
            Self::Config(_) => 500,
        }
    }
}

impl From<serde_json::Error> for SearchError {
    fn from(e: serde_json::Error) -> Self {
        Self::InvalidRequest(e.to_string())
    }
}
