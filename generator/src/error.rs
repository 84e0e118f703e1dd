//! Generator error types

use thiserror::Error;

/// Result type for generator setup operations
pub type GeneratorResult<T> = Result<T, GeneratorError>;

/// Errors raised while wiring the generator, as opposed to per-request
/// failures which are classified as `ApiFailure`
#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),
}
