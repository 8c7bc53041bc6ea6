//! Cascade vocabulary: tiers, run states and per-tier outcomes.

pub mod outcome;
pub mod tier;
