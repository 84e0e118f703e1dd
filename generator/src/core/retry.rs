//! Retry state machine for generative API calls
//!
//! The state machine is pure: it is fed each failure together with the
//! elapsed time and a jitter sample, and answers whether to wait and retry or
//! give up with a terminal error. The client owns the clock and the sleeping.

use std::time::Duration;

use shared::{ApiFailure, BotError};

/// Retry limits and backoff shape
#[derive(Debug, Clone, PartialEq)]
pub struct RetryPolicy {
    /// Total attempts including the first one
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
    /// Relative jitter applied to each backoff, 0.1 means ±10%
    pub jitter: f64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            base_delay: Duration::from_millis(1000),
            max_delay: Duration::from_secs(30),
            jitter: 0.1,
        }
    }
}

impl RetryPolicy {
    /// Exponential backoff for the n-th failed attempt (1-based).
    ///
    /// `jitter_sample` is expected in `[0, 1]`; 0.5 yields the exact
    /// exponential value.
    pub fn backoff(&self, failed_attempt: u32, jitter_sample: f64) -> Duration {
        let exponent = failed_attempt.saturating_sub(1).min(16);
        let base_ms = self.base_delay.as_millis() as f64 * f64::from(1u32 << exponent);
        let factor = 1.0 + self.jitter * (2.0 * jitter_sample.clamp(0.0, 1.0) - 1.0);
        let delay = Duration::from_millis((base_ms * factor).round() as u64);
        delay.min(self.max_delay)
    }
}

/// What to do after a failed attempt
#[derive(Debug, Clone, PartialEq)]
pub enum RetryDecision {
    /// Sleep for `delay`, then make attempt number `attempt`
    Retry { attempt: u32, delay: Duration },
    /// Stop and report this error
    GiveUp(BotError),
}

/// Per-request retry bookkeeping
#[derive(Debug, Clone)]
pub struct RetryState {
    policy: RetryPolicy,
    budget: Duration,
    failures: u32,
}

impl RetryState {
    pub fn new(policy: RetryPolicy, budget: Duration) -> Self {
        Self {
            policy,
            budget,
            failures: 0,
        }
    }

    pub fn failures(&self) -> u32 {
        self.failures
    }

    /// Attempt number of the next call (1-based)
    pub fn next_attempt(&self) -> u32 {
        self.failures + 1
    }

    /// Time left in the overall budget
    pub fn remaining(&self, elapsed: Duration) -> Duration {
        self.budget.saturating_sub(elapsed)
    }

    /// Record a failed attempt and decide the next step
    pub fn on_failure(&mut self, failure: &ApiFailure, elapsed: Duration, jitter_sample: f64) -> RetryDecision {
        self.failures += 1;
        let error = BotError::from(failure.clone());

        if !failure.is_retryable() {
            return RetryDecision::GiveUp(error);
        }

        if self.failures >= self.policy.max_attempts {
            return RetryDecision::GiveUp(error.escalate(self.failures));
        }

        // a server-supplied wait is honored as is; only the budget can refuse it
        let delay = failure
            .retry_after()
            .unwrap_or_else(|| self.policy.backoff(self.failures, jitter_sample));

        if elapsed + delay >= self.budget {
            return RetryDecision::GiveUp(BotError::Timeout { budget: self.budget });
        }

        RetryDecision::Retry {
            attempt: self.failures + 1,
            delay,
        }
    }
}
