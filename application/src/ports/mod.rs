//! Port definitions (interfaces for external adapters)
//!
//! Ports define the contracts that infrastructure adapters must implement.

pub mod event_logger;
pub mod reply_progress;
pub mod response_cache;
pub mod text_generator;
