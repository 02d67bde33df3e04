//! Client error types.

use thiserror::Error;

/// Errors surfaced to callers of [`crate::LoggingClient`].
///
/// Logging never adds variants here: hook and identity failures are logged
/// and swallowed.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Error from the underlying transport (connect, timeout, redirects, body read).
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Response body did not decode as the requested type.
    #[error("decode error: {0}")]
    Decode(#[from] serde_json::Error),
}

impl ClientError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, ClientError::Transport(e) if e.is_timeout())
    }

    pub fn is_connect(&self) -> bool {
        matches!(self, ClientError::Transport(e) if e.is_connect())
    }
}

pub type ClientResult<T> = Result<T, ClientError>;
