//! Shared fixtures for generator integration tests

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use generator::{ClientSettings, Completion, CompletionApi, CompletionRequest, RetryPolicy};
use shared::ApiFailure;

pub fn completion(text: &str) -> Completion {
    Completion {
        text: text.to_string(),
        input_tokens: 10,
        output_tokens: 20,
        model: "test-model".to_string(),
    }
}

pub fn settings(max_attempts: u32) -> ClientSettings {
    ClientSettings {
        model: "test-model".to_string(),
        retry: RetryPolicy {
            max_attempts,
            ..RetryPolicy::default()
        },
        ..ClientSettings::default()
    }
}

/// Completion API that replays a fixed script of outcomes, optionally
/// sleeping before each answer. Once the script is exhausted the last entry
/// repeats.
pub struct ScriptedApi {
    script: Mutex<VecDeque<Result<Completion, ApiFailure>>>,
    last: Mutex<Option<Result<Completion, ApiFailure>>>,
    delay: Duration,
    calls: AtomicUsize,
}

impl ScriptedApi {
    pub fn new(script: Vec<Result<Completion, ApiFailure>>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            last: Mutex::new(None),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn next(&self) -> Result<Completion, ApiFailure> {
        let mut script = self.script.lock().unwrap();
        let mut last = self.last.lock().unwrap();
        match script.pop_front() {
            Some(outcome) => {
                *last = Some(outcome.clone());
                outcome
            }
            None => last.clone().expect("script must not be empty"),
        }
    }
}

#[async_trait]
impl CompletionApi for ScriptedApi {
    async fn complete(&self, _request: &CompletionRequest, _timeout: Duration) -> Result<Completion, ApiFailure> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let outcome = self.next();
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        outcome
    }
}
