//! Domain layer for tiered-assistant
//!
//! This crate contains the core logic and value objects of the response
//! cascade. It has no dependencies on infrastructure or presentation concerns.
//!
//! # Core Concepts
//!
//! ## Tiers
//!
//! Answers come from three ordered tiers. The two network tiers may fail or
//! stay silent; the last one, [`KeywordMatcher`], scores the static [`Corpus`]
//! and always answers.
//!
//! ## Cascade
//!
//! [`CascadeState`] only moves forward. A tier that fails or finishes without
//! output ([`ProviderOutcome`]) hands over to the next one.

pub mod cascade;
pub mod core;
pub mod corpus;
pub mod session;
pub mod settings;

// Re-export commonly used types
pub use cascade::{
    outcome::{Demotion, DemotionReason, ProviderOutcome},
    tier::{CascadeState, Tier},
};
pub use core::{
    error::DomainError,
    query::{Query, normalize_key},
};
pub use corpus::{
    entities::{Corpus, DEFAULT_ANSWER, DEFAULT_OFF_TOPIC, QaEntry},
    matcher::{KeywordMatcher, MatchKind, MatchResult},
};
pub use session::entities::{
    APOLOGY_MESSAGE, AnswerSource, PENDING_PLACEHOLDER, Sender, SessionMessage,
};
pub use settings::{
    CascadeSettings, DEFAULT_SYSTEM_INSTRUCTION, GeneratorSettings, HostedSettings, LocalSettings,
};
