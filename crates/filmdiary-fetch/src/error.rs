use thiserror::Error;

/// Errors raised while building the HTTP session, before any attempt runs.
///
/// Failures during an attempt are never errors at this level; they are
/// classified into [`crate::AttemptOutcome`] and absorbed by the retry loop.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid header {name:?}: {reason}")]
    InvalidHeader { name: String, reason: String },
}
