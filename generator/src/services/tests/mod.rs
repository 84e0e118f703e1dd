//! Tests for generator services
//!
//! The Anthropic client is exercised against a wiremock server; the topic
//! source is checked with fixed seeds.
