//! Service-specific tests
//!
//! HTTP services run against wiremock servers; the file-backed stores
//! run in a temporary directory.

mod github;
