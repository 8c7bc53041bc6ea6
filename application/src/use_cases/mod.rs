//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod ask;
pub mod respond;
