use client::ClientError;
use engine::EngineError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AppError>;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(#[from] config::ConfigError),
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("unknown timezone: {0}")]
    InvalidTimezone(String),
    #[error("{0}")]
    Input(String),
}

/// Message shown to the user for a failed command.
pub fn message_for_error(err: &AppError) -> String {
    match err {
        AppError::Client(ClientError::Unauthenticated) => {
            "Not signed in. Run `budgetdesk login` first.".to_string()
        }
        AppError::Client(ClientError::SessionExpired) => {
            "Session expired. Run `budgetdesk login` again.".to_string()
        }
        AppError::Client(ClientError::Server { message, .. }) => format!("Server error: {message}"),
        AppError::Client(ClientError::Network(err)) => format!("Server unreachable: {err}"),
        AppError::Client(ClientError::Validation(message))
        | AppError::Engine(EngineError::Validation(message))
        | AppError::Engine(EngineError::InvalidAmount(message))
        | AppError::Engine(EngineError::InvalidDate(message)) => {
            format!("Invalid input: {message}")
        }
        AppError::Client(ClientError::PartialImportFailure { succeeded, failed }) => format!(
            "{succeeded} transaction(s) imported, {failed} failed. The failed rows stay in the session."
        ),
        AppError::Engine(EngineError::KeyNotFound(key)) => format!("Not found: {key}"),
        other => other.to_string(),
    }
}
