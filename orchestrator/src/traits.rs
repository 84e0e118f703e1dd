//! Trait definitions for dependency injection and testing

use async_trait::async_trait;
use chrono::NaiveDateTime;
use shared::{BatchReport, BotResult, NewsArticle};

use crate::core::auto_update::AutoUpdateState;
use crate::core::usage::UsageLedger;
use crate::error::OrchestratorResult;
use crate::types::{BatchSpec, InboundUpdate};

/// Wall-clock source in local time
#[mockall::automock]
pub trait Clock: Send + Sync {
    fn now(&self) -> NaiveDateTime;
}

/// Backing storage for usage counters
#[mockall::automock]
#[async_trait]
pub trait UsageStore: Send + Sync {
    /// Load the ledger, or an empty one when nothing was stored yet
    async fn load(&self) -> OrchestratorResult<UsageLedger>;

    /// Persist the full ledger
    async fn save(&self, ledger: &UsageLedger) -> OrchestratorResult<()>;
}

/// Chat transport used by the polling loop
#[mockall::automock]
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Long-poll for updates after `offset`
    async fn fetch_updates(&self, offset: Option<i64>) -> OrchestratorResult<Vec<InboundUpdate>>;

    /// Send one text block (already within the transport length limit)
    async fn send_message(&self, chat_id: i64, text: &str) -> OrchestratorResult<()>;
}

/// Reads and writes files in a content repository
#[mockall::automock]
#[async_trait]
pub trait Publisher: Send + Sync {
    /// Create or update `path` in `repo`; failures are `BotError::Publish`
    async fn publish(&self, repo: &str, path: &str, content: &str, message: &str) -> BotResult<()>;

    /// Current text of `path`, or `None` when the file does not exist
    async fn fetch(&self, repo: &str, path: &str) -> BotResult<Option<String>>;
}

/// Persistence for the auto-publish run's seen headlines
#[mockall::automock]
#[async_trait]
pub trait UpdateStateStore: Send + Sync {
    /// Load the state, or an empty one when nothing was stored yet
    async fn load(&self) -> OrchestratorResult<AutoUpdateState>;

    async fn save(&self, state: &AutoUpdateState) -> OrchestratorResult<()>;
}

/// Source of recent headlines
#[mockall::automock]
#[async_trait]
pub trait NewsSource: Send + Sync {
    async fn latest(&self) -> OrchestratorResult<Vec<NewsArticle>>;
}

/// Runs one batch to completion; never fails as a whole
#[mockall::automock]
#[async_trait]
pub trait BatchRunner: Send + Sync {
    async fn run_batch(&self, spec: BatchSpec) -> BatchReport;
}
