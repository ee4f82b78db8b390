//! Errors returned by the API client.
//!
//! [`Unauthenticated`] and [`SessionExpired`] are not meant to be shown
//! inline: they are handed to the [`Navigator`](crate::navigation::Navigator),
//! which sends the user back to the login screen.
//!
//!  [`Unauthenticated`]: ClientError::Unauthenticated
//!  [`SessionExpired`]: ClientError::SessionExpired
use engine::EngineError;
use reqwest::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("not signed in")]
    Unauthenticated,
    #[error("session expired, please sign in again")]
    SessionExpired,
    #[error("invalid server response: {0}")]
    InvalidServerResponse(String),
    #[error("{0}")]
    Validation(String),
    #[error("{succeeded} transaction(s) imported, {failed} could not be imported")]
    PartialImportFailure { succeeded: usize, failed: usize },
    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("{message} ({status})")]
    Server { status: StatusCode, message: String },
    #[error("local storage error: {0}")]
    Storage(String),
}

impl ClientError {
    /// Errors that require a new login.
    pub fn is_auth(&self) -> bool {
        matches!(self, Self::Unauthenticated | Self::SessionExpired)
    }
}

impl From<EngineError> for ClientError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::Validation(msg)
            | EngineError::InvalidAmount(msg)
            | EngineError::InvalidDate(msg) => Self::Validation(msg),
            EngineError::KeyNotFound(key) => Self::Validation(format!("\"{key}\" not found")),
            EngineError::Storage(msg) => Self::Storage(msg),
            EngineError::Json(err) => Self::Storage(err.to_string()),
            EngineError::Io(err) => Self::Storage(err.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, ClientError>;
