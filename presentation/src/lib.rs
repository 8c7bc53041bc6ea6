//! Presentation layer for tiered-assistant
//!
//! This crate contains the CLI definition, streamed console output
//! and the interactive chat interface.

pub mod chat;
pub mod cli;
pub mod output;

// Re-export commonly used types
pub use chat::{ChatRepl, ask_interruptible};
pub use cli::commands::Cli;
pub use output::console::ConsoleReply;
