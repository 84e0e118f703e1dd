//! Shared types for the campaign content bot
//!
//! Domain vocabulary used by both the generator and the orchestrator:
//! content formats, campaign phases, payload schemas, batch reports and the
//! user-facing error taxonomy.

pub mod content;
pub mod errors;
pub mod logging;
pub mod types;

pub use content::*;
pub use errors::*;
pub use types::*;
