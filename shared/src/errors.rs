//! User-facing error taxonomy shared by the generator and orchestrator

use std::time::Duration;
use thiserror::Error;

use crate::types::RequesterId;

/// Errors surfaced to the requester, either before work begins or
/// attached to individual report entries
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BotError {
    #[error("requester {requester} is not allowed to use this bot")]
    Unauthorized { requester: RequesterId },

    #[error("unknown content type '{input}'")]
    InvalidContentType { input: String },

    #[error("unknown campaign phase '{input}'")]
    InvalidPhase { input: String },

    #[error("generation failed: {reason}")]
    Generation { reason: String },

    #[error("rate limited by the generative API")]
    RateLimited,

    #[error("timed out after {}s", budget.as_secs_f64())]
    Timeout { budget: Duration },

    #[error("publish failed: {message}")]
    Publish { message: String },
}

impl BotError {
    /// Empty or unparseable model output
    pub fn malformed(detail: impl std::fmt::Display) -> Self {
        BotError::Generation {
            reason: format!("malformed completion: {detail}"),
        }
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, BotError::Generation { reason } if reason.starts_with("malformed"))
    }
}

pub type BotResult<T> = Result<T, BotError>;

impl From<crate::types::ApiFailure> for BotError {
    fn from(failure: crate::types::ApiFailure) -> Self {
        use crate::types::ApiFailure;
        match failure {
            ApiFailure::RateLimitExceeded { .. } => BotError::RateLimited,
            ApiFailure::EmptyCompletion => BotError::malformed("empty completion"),
            other => BotError::Generation { reason: other.to_string() },
        }
    }
}

impl BotError {
    /// Turn a still-retryable error into its terminal form once no attempts remain
    pub fn escalate(self, attempts: u32) -> Self {
        match self {
            BotError::RateLimited => BotError::Generation {
                reason: format!("rate limited: retries exhausted after {attempts} attempts"),
            },
            BotError::Generation { reason } => BotError::Generation {
                reason: format!("{reason} (gave up after {attempts} attempts)"),
            },
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ApiFailure;

    #[test]
    fn test_rate_limit_escalates_to_generation_error() {
        let err = BotError::from(ApiFailure::RateLimitExceeded { retry_after: None });
        assert_eq!(err, BotError::RateLimited);

        let escalated = err.escalate(4);
        assert!(matches!(escalated, BotError::Generation { ref reason } if reason.contains("4 attempts")));
    }

    #[test]
    fn test_empty_completion_is_malformed() {
        let err = BotError::from(ApiFailure::EmptyCompletion);
        assert!(err.is_malformed());
        assert!(!BotError::Generation { reason: "server error".into() }.is_malformed());
    }

    #[test]
    fn test_unauthorized_names_the_requester() {
        let err = BotError::Unauthorized { requester: RequesterId(99) };
        assert_eq!(err.to_string(), "requester 99 is not allowed to use this bot");
    }
}
