//! Generator-specific types

use serde::{Deserialize, Serialize};

use crate::core::RetryPolicy;

/// Default model for every completion
pub const DEFAULT_MODEL: &str = "claude-sonnet-4-20250514";

/// Default completion length limit
pub const DEFAULT_MAX_TOKENS: u32 = 2000;

/// One request to the generative API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompletionRequest {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: Option<f32>,
    pub system: String,
    pub user: String,
}

/// Text returned by the generative API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Completion {
    pub text: String,
    pub input_tokens: u32,
    pub output_tokens: u32,
    pub model: String,
}

/// Model parameters and retry policy for the generation client
#[derive(Debug, Clone, PartialEq)]
pub struct ClientSettings {
    pub model: String,
    pub max_tokens: u32,
    pub temperature: Option<f32>,
    pub retry: RetryPolicy,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.to_string(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: None,
            retry: RetryPolicy::default(),
        }
    }
}
