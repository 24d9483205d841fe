//! Error types for readstack.
//!
//! Library crates use [`ReadstackError`] via `thiserror`.
//! The server binary wraps this with `color-eyre` for rich diagnostics.

/// Top-level error type for all readstack operations.
#[derive(Debug, thiserror::Error)]
pub enum ReadstackError {
    /// Configuration loading or validation error.
    #[error("config error: {message}")]
    Config { message: String },

    /// A submitted URL could not be parsed. Caller error; nothing persisted.
    #[error("invalid URL: {url}")]
    InvalidUrl { url: String },

    /// Hacker News lookup error. Non-fatal to ingestion: the worker logs it
    /// and persists the article without a discussion link.
    #[error("enrichment error: {0}")]
    Enrichment(String),

    /// Database or storage layer error. Fails the offending submission only.
    #[error("storage error: {0}")]
    Storage(String),

    /// Site build or upload error. Logged by the worker; never surfaced to a
    /// submission caller.
    #[error("publish error: {0}")]
    Publish(String),

    /// Data validation error (missing field, bad format).
    #[error("validation error: {message}")]
    Validation { message: String },

    /// The ingestion worker is no longer accepting jobs.
    #[error("ingestion queue closed")]
    QueueClosed,

    /// The bounded wait on a submission's completion signal elapsed.
    #[error("timed out waiting for the ingestion worker")]
    SubmitTimeout,
}

/// Convenience alias used throughout the codebase.
pub type Result<T> = std::result::Result<T, ReadstackError>;

impl ReadstackError {
    /// Create a config error from any displayable message.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config {
            message: msg.into(),
        }
    }

    /// Create an invalid-URL error for the given raw URL.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Create a validation error from any displayable message.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation {
            message: msg.into(),
        }
    }
}
