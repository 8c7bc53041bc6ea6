//! Response cache port
//!
//! Exact-match store of completed answers, keyed by normalized query text.

/// Store of completed answers.
///
/// Both operations normalize the key the same way (trimmed, lowercased), so
/// `set("Qué es reciclar", v)` is found by `get(" qué es reciclar ")`.
/// Entries never expire.
pub trait ResponseCache: Send + Sync {
    /// Cached answer for `query`, if any.
    fn get(&self, query: &str) -> Option<String>;

    /// Store `answer` for `query`, replacing any previous value.
    fn set(&self, query: &str, answer: String);

    /// Number of cached answers.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
