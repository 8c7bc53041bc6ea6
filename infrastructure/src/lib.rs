//! Infrastructure layer for tiered-assistant
//!
//! This crate contains adapters that implement the ports defined
//! in the application layer: the two network generation tiers, the
//! response cache, the JSONL event log, plus corpus and configuration
//! file loading.

pub mod cache;
pub mod config;
pub mod corpus;
pub mod logging;
pub mod providers;

// Re-export commonly used types
pub use cache::InMemoryResponseCache;
pub use config::{ConfigError, ConfigLoader, FileConfig};
pub use corpus::{CorpusLoadError, CorpusLoader};
pub use logging::JsonlEventLogger;
pub use providers::{
    hosted::HostedGenerator,
    line_stream::{LineBuffer, LineOutcome, ProtocolError},
    local::LocalGenerator,
};
