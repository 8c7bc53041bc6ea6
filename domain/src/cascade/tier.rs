//! Tiers of the response cascade and the states the cascade moves through.

use std::fmt;

/// One of the three ordered response strategies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Tier {
    /// Hosted streaming generation service.
    Primary,
    /// Local streaming generation service.
    Secondary,
    /// Keyword matcher over the static corpus. Never fails.
    Tertiary,
}

impl Tier {
    /// Tiers in priority order.
    pub const ALL: [Tier; 3] = [Tier::Primary, Tier::Secondary, Tier::Tertiary];

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Primary => "primary",
            Tier::Secondary => "secondary",
            Tier::Tertiary => "tertiary",
        }
    }

    /// The tier tried after this one fails, if any.
    pub fn next(&self) -> Option<Tier> {
        match self {
            Tier::Primary => Some(Tier::Secondary),
            Tier::Secondary => Some(Tier::Tertiary),
            Tier::Tertiary => None,
        }
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Position of a single cascade run.
///
/// Transitions only move forward: `Trying(Primary) -> Trying(Secondary) ->
/// Trying(Tertiary) -> Done`, or straight to `Done` once a tier delivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CascadeState {
    Trying(Tier),
    Done { served_by: Option<Tier> },
}

impl CascadeState {
    pub fn start() -> Self {
        CascadeState::Trying(Tier::Primary)
    }

    /// Move to the next tier after the current one produced nothing.
    pub fn demote(self) -> Self {
        match self {
            CascadeState::Trying(tier) => match tier.next() {
                Some(next) => CascadeState::Trying(next),
                None => CascadeState::Done { served_by: None },
            },
            done => done,
        }
    }

    /// Finish at the current tier because it delivered output.
    pub fn deliver(self) -> Self {
        match self {
            CascadeState::Trying(tier) => CascadeState::Done {
                served_by: Some(tier),
            },
            done => done,
        }
    }

    pub fn is_done(&self) -> bool {
        matches!(self, CascadeState::Done { .. })
    }
}
