//! Orchestrator-specific error types

use generator::GeneratorError;
use shared::BotError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum OrchestratorError {
    #[error("Configuration error: {message}")]
    ConfigurationError { message: String },

    #[error("Missing required environment variables: {}", keys.join(", "))]
    MissingKeys { keys: Vec<String> },

    #[error("Chat transport error: {message}")]
    TransportError { message: String },

    #[error("News feed error: {message}")]
    NewsError { message: String },

    #[error("Usage store error: {message}")]
    StoreError { message: String },

    #[error("Auto-update error: {message}")]
    AutoUpdateError { message: String },

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    JsonError(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("Generator setup failed: {0}")]
    Generator(#[from] GeneratorError),

    #[error(transparent)]
    Bot(#[from] BotError),
}

pub type OrchestratorResult<T> = Result<T, OrchestratorError>;
