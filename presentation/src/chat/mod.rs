//! Interactive chat module
//!
//! Provides a line-editor based chat interface over the ask use case.

mod repl;

pub use repl::{ChatRepl, CommandAction, ask_interruptible};
