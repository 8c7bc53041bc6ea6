//! Query value object

use serde::{Deserialize, Serialize};

/// Characters stripped from either end of a token when matching keywords.
const TOKEN_PUNCTUATION: &[char] = &[
    '¿', '?', '¡', '!', '.', ',', ';', ':', '"', '\'', '(', ')', '[', ']', '«', '»',
];

/// Normalize text for use as a cache key: trimmed, lowercased.
pub fn normalize_key(raw: &str) -> String {
    raw.trim().to_lowercase()
}

/// Raw user text as typed (Value Object).
///
/// The text is kept verbatim; normalization only happens at the cache
/// boundary ([`normalize_key`]) and when tokenizing for keyword scoring
/// ([`Query::tokens`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Query {
    raw: String,
}

impl Query {
    /// Create a query. Empty text is allowed: the keyword tier still answers it.
    pub fn new(raw: impl Into<String>) -> Self {
        Self { raw: raw.into() }
    }

    /// The text exactly as the user sent it
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Lowercased whitespace-separated tokens, in order.
    pub fn tokens(&self) -> Vec<String> {
        self.raw
            .split_whitespace()
            .map(|t| t.to_lowercase())
            .collect()
    }

    /// Number of whitespace-separated tokens.
    pub fn token_count(&self) -> usize {
        self.raw.split_whitespace().count()
    }

    /// Short single-line preview for log messages (UTF-8 safe).
    pub fn preview(&self, max_chars: usize) -> String {
        let flat: String = self.raw.split_whitespace().collect::<Vec<_>>().join(" ");
        if flat.chars().count() <= max_chars {
            flat
        } else {
            let cut: String = flat.chars().take(max_chars).collect();
            format!("{}...", cut)
        }
    }
}

/// Strip surrounding punctuation from a token (`¿qué` -> `qué`).
pub fn bare_token(token: &str) -> &str {
    token.trim_matches(TOKEN_PUNCTUATION)
}

impl std::fmt::Display for Query {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl From<&str> for Query {
    fn from(s: &str) -> Self {
        Query::new(s)
    }
}

impl From<String> for Query {
    fn from(s: String) -> Self {
        Query::new(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_key_ignores_case_and_outer_whitespace() {
        assert_eq!(normalize_key("  Qué es Reciclar "), "qué es reciclar");
        assert_eq!(
            normalize_key("Qué es reciclar"),
            normalize_key(" qué es reciclar ")
        );
    }

    #[test]
    fn test_raw_is_preserved() {
        let q = Query::new("  Hola ");
        assert_eq!(q.raw(), "  Hola ");
    }

    #[test]
    fn test_tokens_are_lowercased() {
        let q = Query::new("¿Qué  es\tRECICLAR?");
        assert_eq!(q.tokens(), vec!["¿qué", "es", "reciclar?"]);
        assert_eq!(q.token_count(), 3);
    }

    #[test]
    fn test_empty_query_has_no_tokens() {
        assert!(Query::new("   ").tokens().is_empty());
        assert_eq!(Query::new("").token_count(), 0);
    }

    #[test]
    fn test_bare_token_strips_spanish_punctuation() {
        assert_eq!(bare_token("¿qué"), "qué");
        assert_eq!(bare_token("reciclar?"), "reciclar");
        assert_eq!(bare_token("¡hola!"), "hola");
        assert_eq!(bare_token("plain"), "plain");
    }

    #[test]
    fn test_preview_truncates_on_char_boundary() {
        let q = Query::new("ñandú ñandú ñandú");
        assert_eq!(q.preview(5), "ñandú...");
        assert_eq!(q.preview(100), "ñandú ñandú ñandú");
    }
}
