//! How a single tier's stream ended, as seen by the orchestrator.

use super::tier::Tier;
use std::fmt;

/// Result of draining one tier.
///
/// The three cases are deliberately distinct: a tier that finishes quietly
/// with no output is not a success, even though it raised nothing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderOutcome {
    /// At least one chunk was forwarded. `interrupted` carries the error if
    /// the stream failed after output had started.
    Success {
        chunks: usize,
        interrupted: Option<String>,
    },
    /// The stream ended cleanly without a single chunk.
    EmptyCompletion,
    /// The tier failed before producing anything.
    Failure(String),
}

impl ProviderOutcome {
    /// Whether the cascade stops at this tier.
    pub fn delivered(&self) -> bool {
        matches!(self, ProviderOutcome::Success { .. })
    }

    /// Why the cascade must move on, or `None` if it stops here.
    pub fn demotion_reason(&self) -> Option<DemotionReason> {
        match self {
            ProviderOutcome::Success { .. } => None,
            ProviderOutcome::EmptyCompletion => Some(DemotionReason::Empty),
            ProviderOutcome::Failure(error) => Some(DemotionReason::Error(error.clone())),
        }
    }
}

/// Why a tier was skipped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DemotionReason {
    /// The tier raised an error before any output.
    Error(String),
    /// The tier finished with zero chunks.
    Empty,
}

impl DemotionReason {
    pub fn kind(&self) -> &'static str {
        match self {
            DemotionReason::Error(_) => "error",
            DemotionReason::Empty => "empty",
        }
    }
}

impl fmt::Display for DemotionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DemotionReason::Error(e) => write!(f, "error: {}", e),
            DemotionReason::Empty => f.write_str("completed without output"),
        }
    }
}

/// A recorded demotion, kept for the run summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Demotion {
    pub tier: Tier,
    pub reason: DemotionReason,
}
