use campus_auth::AuthError;
use thiserror::Error;

pub type SessionResult<T> = Result<T, SessionError>;

/// Raised by the storage collaborator when it rejects an operation.
#[derive(Debug, Error)]
#[error("storage rejected {operation}: {reason}")]
pub struct StorageError {
    pub operation: &'static str,
    pub reason: String,
}

impl StorageError {
    pub fn new(operation: &'static str, reason: impl Into<String>) -> Self {
        Self {
            operation,
            reason: reason.into(),
        }
    }
}

/// Failures reported by the authentication backend.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("{0}")]
    InvalidCredentials(String),
    #[error("request rejected: {0}")]
    Rejected(String),
    #[error("request failed: {0}")]
    Transport(String),
    #[error("response could not be decoded: {0}")]
    Decode(String),
    #[error("backend returned HTTP {0}")]
    Status(u16),
}

#[derive(Debug, Error)]
pub enum SessionError {
    /// Login rejected; user-facing and retryable from the form.
    #[error("{0}")]
    InvalidCredentials(String),
    /// Fatal to the in-progress operation; the UI offers a retry.
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error("authentication backend unavailable: {0}")]
    Backend(String),
    /// The attempt was abandoned by a newer login or a logout.
    #[error("login attempt superseded")]
    Superseded,
    #[error("session refresh is not available")]
    RefreshUnavailable,
    /// The backend confirmed an identity this client cannot represent.
    #[error("unusable identity: {0}")]
    Claims(#[from] AuthError),
}
