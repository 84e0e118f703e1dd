//! Generation client
//!
//! Wraps a [`CompletionApi`] with the retry state machine and an overall
//! time budget that covers every attempt and every backoff sleep.

use std::sync::Arc;
use std::time::Duration;

use rand::Rng;
use serde::de::DeserializeOwned;
use shared::{component_debug, component_warn, ApiFailure, BotError, BotResult, Component, ContentPayload, ContentType};
use tokio::time::Instant;

use crate::core::payload;
use crate::core::prompt::Prompt;
use crate::core::retry::{RetryDecision, RetryState};
use crate::traits::CompletionApi;
use crate::types::{ClientSettings, Completion, CompletionRequest};

pub struct GenerationClient<A: CompletionApi> {
    api: Arc<A>,
    settings: ClientSettings,
}

impl<A: CompletionApi> GenerationClient<A> {
    pub fn new(api: Arc<A>, settings: ClientSettings) -> Self {
        Self { api, settings }
    }

    pub fn settings(&self) -> &ClientSettings {
        &self.settings
    }

    /// Run a prompt to completion, retrying transient failures.
    ///
    /// `budget` bounds the whole call; when it runs out the result is
    /// `BotError::Timeout` regardless of which attempt was in progress.
    pub async fn generate(&self, prompt: &Prompt, budget: Duration) -> BotResult<Completion> {
        let started = Instant::now();

        match tokio::time::timeout(budget, self.run_attempts(prompt, budget, started)).await {
            Ok(result) => result,
            Err(_) => {
                component_warn!(Component::Generator, "⏰ Generation exceeded its {:?} budget", budget);
                Err(BotError::Timeout { budget })
            }
        }
    }

    /// Generate and parse the payload for a content type
    pub async fn generate_payload(
        &self,
        content_type: ContentType,
        prompt: &Prompt,
        budget: Duration,
    ) -> BotResult<ContentPayload> {
        let completion = self.generate(prompt, budget).await?;
        payload::parse_payload(content_type, &completion.text)
    }

    /// Generate and parse an auxiliary JSON response
    pub async fn generate_json<T: DeserializeOwned>(&self, prompt: &Prompt, budget: Duration) -> BotResult<T> {
        let completion = self.generate(prompt, budget).await?;
        payload::parse_json(&completion.text)
    }

    async fn run_attempts(&self, prompt: &Prompt, budget: Duration, started: Instant) -> BotResult<Completion> {
        let request = CompletionRequest {
            model: self.settings.model.clone(),
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
            system: prompt.system.clone(),
            user: prompt.user.clone(),
        };
        let mut state = RetryState::new(self.settings.retry.clone(), budget);

        loop {
            let attempt = state.next_attempt();
            let remaining = state.remaining(started.elapsed());
            component_debug!(Component::Generator, "📤 Attempt {} ({:?} left)", attempt, remaining);

            let failure = match self.api.complete(&request, remaining).await {
                Ok(completion) if completion.text.trim().is_empty() => ApiFailure::EmptyCompletion,
                Ok(completion) => return Ok(completion),
                Err(failure) => failure,
            };

            let jitter_sample: f64 = rand::thread_rng().gen();
            match state.on_failure(&failure, started.elapsed(), jitter_sample) {
                RetryDecision::Retry { attempt, delay } => {
                    component_warn!(
                        Component::Generator,
                        "🔄 {} on attempt {}, retrying attempt {} in {:?}",
                        failure,
                        attempt - 1,
                        attempt,
                        delay
                    );
                    tokio::time::sleep(delay).await;
                }
                RetryDecision::GiveUp(error) => {
                    component_warn!(Component::Generator, "❌ Giving up after {} attempt(s): {}", state.failures(), error);
                    return Err(error);
                }
            }
        }
    }
}
