//! Failure taxonomy for calls to the remote alert service

use thiserror::Error;

/// Everything that can go wrong talking to the remote service
#[derive(Debug, Error)]
pub enum RemoteError {
    /// No response received (connection refused, DNS, timeout...)
    #[error("transport error: {0}")]
    Transport(String),

    /// The service does not know this device token
    #[error("device not found")]
    NotFound,

    /// Non-success status other than not-found
    #[error("remote rejected request with status {status}")]
    Rejected { status: u16 },

    /// Response body did not match the expected shape
    #[error("malformed response body: {0}")]
    Parse(#[from] serde_json::Error),
}

impl From<reqwest::Error> for RemoteError {
    fn from(e: reqwest::Error) -> Self {
        RemoteError::Transport(e.to_string())
    }
}

impl RemoteError {
    pub fn kind(&self) -> FailureKind {
        match self {
            RemoteError::Transport(_) => FailureKind::Transport,
            RemoteError::NotFound => FailureKind::NotFound,
            RemoteError::Rejected { status } => FailureKind::Rejected(*status),
            RemoteError::Parse(_) => FailureKind::Parse,
        }
    }

    /// Status-based classification shared by every endpoint
    pub fn from_status(status: u16) -> Self {
        if status == 404 {
            RemoteError::NotFound
        } else {
            RemoteError::Rejected { status }
        }
    }
}

/// Cloneable classification of a [`RemoteError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureKind {
    Transport,
    NotFound,
    Rejected(u16),
    Parse,
}

/// Outcome of a fire-and-forget operation.
///
/// Failures are already logged by the time this is returned, so callers are
/// free to drop it.
#[derive(Debug, Clone, PartialEq)]
pub enum BestEffort<T> {
    Completed(T),
    Failed(FailureKind),
}

impl<T> BestEffort<T> {
    pub fn is_completed(&self) -> bool {
        matches!(self, BestEffort::Completed(_))
    }

    pub fn completed(self) -> Option<T> {
        match self {
            BestEffort::Completed(value) => Some(value),
            BestEffort::Failed(_) => None,
        }
    }
}

impl<T> From<Result<T, RemoteError>> for BestEffort<T> {
    fn from(result: Result<T, RemoteError>) -> Self {
        match result {
            Ok(value) => BestEffort::Completed(value),
            Err(e) => BestEffort::Failed(e.kind()),
        }
    }
}
