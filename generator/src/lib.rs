//! Generator library for the campaign content bot
//!
//! Turns a content request into a model completion: phase-aware prompt
//! construction, the generative API boundary, and a retrying client that
//! classifies failures and parses the structured payload.

pub mod core;
pub mod error;
pub mod services;
pub mod traits;
pub mod types;

// Re-export main types
pub use crate::core::{
    headline_selection, news_post, GenerationClient, Prompt, PromptBuilder, RetryDecision, RetryPolicy, RetryState,
};
pub use error::{GeneratorError, GeneratorResult};
pub use services::*;
pub use traits::*;
pub use types::*;
