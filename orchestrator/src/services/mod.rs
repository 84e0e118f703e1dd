//! Service implementations
//!
//! Real implementations of the orchestrator traits. These are the only
//! modules that touch the network, the file system or the wall clock.

pub mod clock;
pub mod github;
pub mod news;
pub mod telegram;
pub mod update_state;
pub mod usage_store;

#[cfg(test)]
pub mod tests;

pub use clock::RealClock;
pub use github::RealGithubPublisher;
pub use news::{RealNewsSource, RssParser};
pub use telegram::RealTelegramTransport;
pub use update_state::{InMemoryUpdateStateStore, JsonFileUpdateStateStore, RepoUpdateStateStore};
pub use usage_store::{InMemoryUsageStore, JsonFileUsageStore};
