//! Static question/answer corpus used by the keyword tier.

use crate::core::error::DomainError;

/// Fallback answer when no corpus entry matches.
pub const DEFAULT_ANSWER: &str =
    "I'm not sure I understood. Could you rephrase your question with a few more details?";

/// Fallback answer when the query is confidently unrelated to the corpus.
pub const DEFAULT_OFF_TOPIC: &str =
    "That seems outside what I can help with here. Try asking about one of the topics I know.";

/// One keyword-to-answer entry (immutable once loaded).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QaEntry {
    keywords: Vec<String>,
    answer: String,
}

impl QaEntry {
    /// Create an entry. Keywords are lowercased and deduplicated, keeping
    /// first-seen order.
    pub fn new<I, S>(keywords: I, answer: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut normalized: Vec<String> = Vec::new();
        for keyword in keywords {
            let keyword = keyword.as_ref().trim().to_lowercase();
            if !keyword.is_empty() && !normalized.contains(&keyword) {
                normalized.push(keyword);
            }
        }
        Self {
            keywords: normalized,
            answer: answer.into(),
        }
    }

    pub fn keywords(&self) -> &[String] {
        &self.keywords
    }

    pub fn answer(&self) -> &str {
        &self.answer
    }
}

/// The full corpus: ordered entries plus the two fixed messages.
///
/// Entry order matters: ties in keyword score resolve to the earliest entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Corpus {
    entries: Vec<QaEntry>,
    default: String,
    off_topic: String,
}

impl Corpus {
    pub fn new(
        entries: Vec<QaEntry>,
        default: impl Into<String>,
        off_topic: impl Into<String>,
    ) -> Self {
        Self {
            entries,
            default: default.into(),
            off_topic: off_topic.into(),
        }
    }

    pub fn entries(&self) -> &[QaEntry] {
        &self.entries
    }

    /// Answer used when nothing matched.
    pub fn default_answer(&self) -> &str {
        &self.default
    }

    /// Answer used when the query looks unrelated to every entry.
    pub fn off_topic(&self) -> &str {
        &self.off_topic
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Check that every answer the keyword tier could return is non-empty,
    /// so the tier always produces visible output.
    pub fn validate(&self) -> Result<(), DomainError> {
        if self.default.trim().is_empty() {
            return Err(DomainError::EmptyFixedMessage("default"));
        }
        if self.off_topic.trim().is_empty() {
            return Err(DomainError::EmptyFixedMessage("off_topic"));
        }
        for (idx, entry) in self.entries.iter().enumerate() {
            if entry.keywords.is_empty() {
                return Err(DomainError::NoKeywords(idx));
            }
            if entry.answer.trim().is_empty() {
                return Err(DomainError::EmptyAnswer(idx));
            }
        }
        Ok(())
    }
}

impl Default for Corpus {
    fn default() -> Self {
        Self::new(Vec::new(), DEFAULT_ANSWER, DEFAULT_OFF_TOPIC)
    }
}
