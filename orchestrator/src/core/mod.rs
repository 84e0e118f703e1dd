//! Core business logic modules
//!
//! Phase and usage state, the batch and weekly orchestration, the scheduled
//! auto-publish run, and the command, rendering and publishing helpers. I/O only happens through the
//! injected traits, so everything here runs against mocks in tests.

pub mod access;
pub mod articles;
pub mod auto_update;
pub mod batch;
pub mod commands;
pub mod phase;
pub mod publishing;
pub mod render;
pub mod usage;
pub mod weekly;

pub use access::{AccessGuard, UNAUTHORIZED_REPLY};
pub use articles::ArticleCache;
pub use auto_update::{
    AutoPublisher, AutoUpdateReport, AutoUpdateServices, AutoUpdateSettings, AutoUpdateState, SkipReason,
};
pub use batch::{BatchOrchestrator, BatchSettings};
pub use commands::{lookup, resolve_topic, ArgShape, BatchPreset, CommandAction, CommandSpec, COMMANDS};
pub use phase::{CampaignCalendar, PhaseTracker};
pub use publishing::{PublishRepos, PublishTarget};
pub use render::{split_message, ArticleIds, StatsView, TELEGRAM_MAX_LEN};
pub use usage::{UsageLedger, UsageSnapshot, UsageTracker};
pub use weekly::{weekly_plan, WeeklyComposer, WeeklySection};
