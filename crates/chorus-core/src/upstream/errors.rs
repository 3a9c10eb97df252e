//! Error types for worker communication.
//!
//! Network failures are collapsed into coarse categories before they reach
//! logs or replies. The worker URI travels separately in reply metadata, so
//! the messages here never need to carry addresses or response fragments.

use thiserror::Error;

/// Errors from a single HTTP exchange with one worker.
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum WorkerCallError {
    /// The connect or request phase exceeded its deadline.
    #[error("connection timed out")]
    Timeout,

    /// TCP connect was refused or the host is unreachable.
    #[error("connection refused or unreachable")]
    Unreachable,

    /// The request could not be sent.
    #[error("request failed")]
    Request,

    /// The response body could not be read.
    #[error("response body error")]
    Body,

    /// Anything reqwest reports that fits no category above.
    #[error("network error")]
    Network,

    /// The shared HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    Build(String),
}

impl WorkerCallError {
    /// Maps a reqwest error onto the sanitized categories.
    #[must_use]
    pub fn from_reqwest(error: &reqwest::Error) -> Self {
        if error.is_timeout() {
            Self::Timeout
        } else if error.is_connect() {
            Self::Unreachable
        } else if error.is_request() {
            Self::Request
        } else if error.is_body() || error.is_decode() {
            Self::Body
        } else {
            Self::Network
        }
    }

    /// Returns whether the call died waiting rather than failing outright.
    #[must_use]
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }
}
