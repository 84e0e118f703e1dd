//! Generator services implementations

pub mod anthropic;
pub mod topics;

#[cfg(test)]
pub mod tests;

pub use anthropic::*;
pub use topics::*;
