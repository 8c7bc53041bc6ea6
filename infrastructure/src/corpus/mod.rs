//! Corpus file loading for the keyword tier.

mod loader;

pub use loader::{CorpusLoadError, CorpusLoader};
