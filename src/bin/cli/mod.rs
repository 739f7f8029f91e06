//! CLI Module Organization
//!
//! - args: CLI argument structures
//! - commands: Command execution logic
//! - config_layer: Configuration layer management and merging
//! - messages: Localized summary strings
//! - output: Console summaries and progress display

pub mod args;
pub mod commands;
pub mod config_layer;
pub mod messages;
pub mod output;

// Re-export commonly used items for convenience
pub use args::*;
pub use commands::*;
