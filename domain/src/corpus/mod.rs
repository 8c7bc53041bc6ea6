//! Keyword corpus and the matcher that answers from it.

pub mod entities;
pub mod matcher;
