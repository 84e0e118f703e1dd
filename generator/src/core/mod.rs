//! Generator core business logic
//!
//! Prompt construction, retry policy and payload parsing are pure; the
//! client drives them against an injected API.

pub mod client;
pub mod payload;
pub mod prompt;
pub mod retry;

pub use client::GenerationClient;
pub use payload::{extract_json, parse_json, parse_payload};
pub use prompt::{headline_selection, news_post, system_prompt, Prompt, PromptBuilder, PromptKind};
pub use retry::{RetryDecision, RetryPolicy, RetryState};
