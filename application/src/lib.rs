//! Application layer for tiered-assistant
//!
//! This crate contains the cascade orchestrator, the chat-session use case
//! and the port definitions they depend on. It depends only on the domain
//! layer.

pub mod ports;
pub mod use_cases;

// Re-export commonly used types
pub use ports::{
    event_logger::{CascadeEvent, EventLogger, NoEventLogger},
    reply_progress::{NoReplyProgress, ReplyProgress},
    response_cache::ResponseCache,
    text_generator::{ChunkStream, GeneratorError, TextGenerator},
};
pub use use_cases::ask::{AskOutcome, AskUseCase};
pub use use_cases::respond::{CascadeOrchestrator, CascadeReport, ReplyStream};
