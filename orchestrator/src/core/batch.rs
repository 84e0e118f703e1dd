//! Batch orchestration
//!
//! Fans a batch out to one task per item, bounded by a semaphore, and
//! collects completions from a channel into a buffer indexed by original
//! position. Each task reads the campaign phase only once it holds a permit,
//! so an override made mid-batch reaches every item not yet dispatched.
//!
//! A wall-clock deadline bounds the whole batch: when it passes, unfinished
//! tasks are aborted and their slots are filled with failures.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use generator::{CompletionApi, GenerationClient, PromptBuilder};
use shared::{
    component_info, component_warn, BatchReport, BotError, Component, ContentRequest, GenerationOutcome,
    GenerationResult, RequestState,
};
use tokio::sync::{mpsc, Semaphore};
use tokio::time::Instant;

use crate::core::phase::PhaseTracker;
use crate::core::usage::UsageTracker;
use crate::traits::{BatchRunner, Clock};
use crate::types::BatchSpec;

/// Concurrency and time limits for batches
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchSettings {
    /// Maximum simultaneous generation calls
    pub concurrency: usize,
    /// Budget for one item, covering all of its retries
    pub request_timeout: Duration,
    /// Budget for a whole batch
    pub batch_deadline: Duration,
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            concurrency: 3,
            request_timeout: Duration::from_secs(90),
            batch_deadline: Duration::from_secs(600),
        }
    }
}

enum BatchEvent {
    Dispatched(usize),
    Finished(GenerationResult),
}

pub struct BatchOrchestrator<A: CompletionApi + 'static> {
    client: Arc<GenerationClient<A>>,
    prompts: PromptBuilder,
    phase: Arc<PhaseTracker>,
    usage: Arc<UsageTracker>,
    clock: Arc<dyn Clock>,
    settings: BatchSettings,
}

impl<A: CompletionApi + 'static> BatchOrchestrator<A> {
    pub fn new(
        client: Arc<GenerationClient<A>>,
        prompts: PromptBuilder,
        phase: Arc<PhaseTracker>,
        usage: Arc<UsageTracker>,
        clock: Arc<dyn Clock>,
        settings: BatchSettings,
    ) -> Self {
        Self {
            client,
            prompts,
            phase,
            usage,
            clock,
            settings,
        }
    }

    pub fn settings(&self) -> &BatchSettings {
        &self.settings
    }

    /// Run every item of the batch and return one entry per item, in order
    pub async fn run(&self, spec: BatchSpec) -> BatchReport {
        let started = Instant::now();
        let deadline = started + self.settings.batch_deadline;
        let count = spec.count;

        component_info!(
            Component::Orchestrator,
            "📦 Batch of {} {} (concurrency {})",
            count,
            spec.content_type,
            self.settings.concurrency
        );

        let requests: Vec<ContentRequest> = (0..count)
            .map(|index| ContentRequest {
                content_type: spec.content_type,
                topic: spec.topic_for(index),
                requester: spec.requester,
            })
            .collect();

        let (tx, mut rx) = mpsc::unbounded_channel::<BatchEvent>();
        let semaphore = Arc::new(Semaphore::new(self.settings.concurrency.max(1)));
        let mut handles = Vec::with_capacity(count);

        for (index, request) in requests.iter().cloned().enumerate() {
            let semaphore = semaphore.clone();
            let client = self.client.clone();
            let prompts = self.prompts.clone();
            let phase = self.phase.clone();
            let tx = tx.clone();
            let budget = self.settings.request_timeout;

            handles.push(tokio::spawn(async move {
                let Ok(_permit) = semaphore.acquire_owned().await else {
                    return;
                };
                let _ = tx.send(BatchEvent::Dispatched(index));

                let current_phase = phase.current_phase().await;
                let prompt = prompts.build(request.content_type, request.topic.as_deref(), current_phase);
                let item_started = Instant::now();
                let outcome = match client.generate_payload(request.content_type, &prompt, budget).await {
                    Ok(payload) => GenerationOutcome::Succeeded(payload),
                    Err(error) => GenerationOutcome::Failed(error),
                };

                let _ = tx.send(BatchEvent::Finished(GenerationResult {
                    index,
                    request,
                    outcome,
                    latency: item_started.elapsed(),
                }));
            }));
        }
        drop(tx);

        let mut states = vec![RequestState::Pending; count];
        let mut slots: Vec<Option<GenerationResult>> = vec![None; count];
        let mut outstanding = count;

        while outstanding > 0 {
            match tokio::time::timeout_at(deadline, rx.recv()).await {
                Ok(Some(BatchEvent::Dispatched(index))) => states[index] = RequestState::InFlight,
                Ok(Some(BatchEvent::Finished(result))) => {
                    let index = result.index;
                    states[index] = result.state();
                    if let GenerationOutcome::Failed(error) = &result.outcome {
                        component_warn!(
                            Component::Orchestrator,
                            "⚠️ {} {}/{} failed: {}",
                            spec.content_type,
                            index + 1,
                            count,
                            error
                        );
                    }
                    self.record_usage(&result).await;
                    slots[index] = Some(result);
                    outstanding -= 1;
                }
                Ok(None) => break,
                Err(_) => {
                    component_warn!(
                        Component::Orchestrator,
                        "⏰ Batch deadline of {:?} passed with {} item(s) unfinished",
                        self.settings.batch_deadline,
                        outstanding
                    );
                    break;
                }
            }
        }

        for handle in &handles {
            handle.abort();
        }

        let mut results = Vec::with_capacity(count);
        for (index, slot) in slots.into_iter().enumerate() {
            let result = match slot {
                Some(result) => result,
                None => {
                    let result = self.abandoned(index, requests[index].clone(), states[index], started.elapsed());
                    self.record_usage(&result).await;
                    result
                }
            };
            results.push(result);
        }

        let report = BatchReport::from_results(spec.content_type, results, started.elapsed());
        component_info!(
            Component::Orchestrator,
            "✅ Batch of {} done: {}/{} succeeded ({})",
            spec.content_type,
            report.succeeded,
            report.total(),
            report.status
        );
        report
    }

    fn abandoned(&self, index: usize, request: ContentRequest, state: RequestState, elapsed: Duration) -> GenerationResult {
        // terminal states always have a slot; reaching here means the task vanished
        let error = if state.is_terminal() {
            BotError::Generation {
                reason: "generation task ended without a result".to_string(),
            }
        } else {
            BotError::Timeout {
                budget: self.settings.batch_deadline,
            }
        };

        GenerationResult {
            index,
            request,
            outcome: GenerationOutcome::Failed(error),
            latency: elapsed,
        }
    }

    async fn record_usage(&self, result: &GenerationResult) {
        let today = self.clock.now().date();
        let content_type = result.request.content_type;
        let recorded = if result.is_success() {
            self.usage.record_success(content_type, today).await
        } else {
            self.usage.record_failure(content_type, today).await
        };
        if let Err(e) = recorded {
            component_warn!(Component::Usage, "⚠️ Could not persist usage: {}", e);
        }
    }
}

#[async_trait]
impl<A: CompletionApi + 'static> BatchRunner for BatchOrchestrator<A> {
    async fn run_batch(&self, spec: BatchSpec) -> BatchReport {
        self.run(spec).await
    }
}
