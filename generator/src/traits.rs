//! Generator trait definitions for dependency injection

use std::time::Duration;

use async_trait::async_trait;
use shared::{ApiFailure, CampaignPhase, ContentType};

use crate::types::{Completion, CompletionRequest};

/// Generative API boundary
#[mockall::automock]
#[async_trait]
pub trait CompletionApi: Send + Sync {
    /// Send one completion request. `timeout` bounds this attempt only.
    async fn complete(&self, request: &CompletionRequest, timeout: Duration) -> Result<Completion, ApiFailure>;
}

/// Source of a topic when the requester did not give one
#[mockall::automock]
pub trait TopicSource: Send + Sync {
    /// Pick a topic suitable for the content type in the given phase
    fn suggest(&self, content_type: ContentType, phase: CampaignPhase) -> String;
}
