//! Common test utilities and infrastructure
//!
//! Shared fixtures and builders used across the orchestrator test suites.
//! Not every suite uses every helper.
#![allow(dead_code)]

pub mod fixtures;
pub mod helpers;

pub use fixtures::{payload_json, FakeApi, FixedClock, TestFixtures};
pub use helpers::{BotBuilder, TestHelpers};
