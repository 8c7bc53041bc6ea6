//! Process-local response cache.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};
use tiered_application::ResponseCache;
use tiered_domain::normalize_key;
use tracing::trace;

/// Unbounded in-memory cache keyed by normalized query text.
///
/// Lives for the whole session and is shared between tasks behind an `Arc`.
#[derive(Debug, Default)]
pub struct InMemoryResponseCache {
    entries: RwLock<HashMap<String, String>>,
}

impl InMemoryResponseCache {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ResponseCache for InMemoryResponseCache {
    fn get(&self, query: &str) -> Option<String> {
        let entries = self.entries.read().unwrap_or_else(PoisonError::into_inner);
        entries.get(&normalize_key(query)).cloned()
    }

    fn set(&self, query: &str, answer: String) {
        let key = normalize_key(query);
        trace!("cache: storing {} chars for {:?}", answer.len(), key);
        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        entries.insert(key, answer);
    }

    fn len(&self) -> usize {
        self.entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
