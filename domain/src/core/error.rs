//! Domain error types

use thiserror::Error;

/// Domain-level errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum DomainError {
    #[error("Corpus answer cannot be empty (entry {0})")]
    EmptyAnswer(usize),

    #[error("Corpus entry {0} has no keywords")]
    NoKeywords(usize),

    #[error("Fixed corpus message `{0}` cannot be empty")]
    EmptyFixedMessage(&'static str),

    #[error("Invalid setting `{field}`: {reason}")]
    InvalidSetting { field: &'static str, reason: String },
}
