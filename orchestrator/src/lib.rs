//! Orchestrator library for the campaign content bot
//!
//! Receives chat commands, checks them against the team allow-list, fans
//! generation work out with bounded concurrency, and renders the results back
//! to the chat. Phase and usage state live here; prompt construction and the
//! generative API client live in the `generator` crate.

pub mod bot;
pub mod config;
pub mod core;
pub mod error;
pub mod runner;
pub mod services;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use crate::bot::{BotServices, BotSettings, ContentBot, BUSY_REPLY};
pub use crate::config::BotConfig;
pub use crate::core::{
    AccessGuard, ArticleCache, AutoPublisher, AutoUpdateReport, AutoUpdateSettings, BatchOrchestrator, BatchSettings, CampaignCalendar, PhaseTracker, UsageTracker,
    WeeklyComposer,
};
pub use crate::error::{OrchestratorError, OrchestratorResult};
pub use crate::runner::BotRunner;
pub use crate::traits::{BatchRunner, ChatTransport, Clock, NewsSource, Publisher, UpdateStateStore, UsageStore};
pub use crate::types::{BatchSpec, InboundCommand, InboundMessage, InboundUpdate, WeeklyReport};
