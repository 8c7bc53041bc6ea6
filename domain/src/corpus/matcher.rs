//! Keyword-scoring responder over the static corpus (the terminal tier).
//!
//! Scoring is deterministic and total: every query gets exactly one answer.
//!
//! 1. Tokenize the query on whitespace, case-insensitively.
//! 2. Score each entry by the number of its keywords found among the tokens.
//! 3. Keep the first entry with the highest score (stable argmax).
//! 4. A long query (more than [`OFF_TOPIC_MIN_TOKENS`] tokens) whose best score
//!    is below [`CONFIDENT_SCORE`] is answered with the off-topic message.
//! 5. Otherwise the best entry answers if it scored at all, else the default.

use super::entities::{Corpus, QaEntry};
use crate::core::query::{Query, bare_token};
use std::collections::HashSet;

/// Minimum score for a match to be trusted on a long query.
pub const CONFIDENT_SCORE: usize = 2;

/// Queries with more tokens than this are checked against [`CONFIDENT_SCORE`].
pub const OFF_TOPIC_MIN_TOKENS: usize = 3;

/// Which branch of the scoring rules produced an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// A corpus entry matched.
    Entry { index: usize, score: usize },
    /// Nothing matched.
    Default,
    /// A long query matched too weakly to be trusted.
    OffTopic { best_score: usize },
}

/// Result of matching a query against the corpus.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchResult {
    pub kind: MatchKind,
    pub answer: String,
}

/// Deterministic keyword matcher. Cannot fail.
#[derive(Debug, Clone, Default)]
pub struct KeywordMatcher {
    corpus: Corpus,
}

impl KeywordMatcher {
    pub fn new(corpus: Corpus) -> Self {
        Self { corpus }
    }

    pub fn corpus(&self) -> &Corpus {
        &self.corpus
    }

    /// Answer text for `query`.
    pub fn answer(&self, query: &Query) -> String {
        self.evaluate(query).answer
    }

    /// Score `query` and report which rule produced the answer.
    pub fn evaluate(&self, query: &Query) -> MatchResult {
        let vocabulary = token_vocabulary(query);

        let mut best: Option<(usize, usize)> = None;
        for (index, entry) in self.corpus.entries().iter().enumerate() {
            let score = score_entry(entry, &vocabulary);
            // Strict `>` keeps the earliest entry on ties.
            if best.is_none_or(|(_, best_score)| score > best_score) {
                best = Some((index, score));
            }
        }

        let best_score = best.map(|(_, score)| score).unwrap_or(0);

        if best_score < CONFIDENT_SCORE && query.token_count() > OFF_TOPIC_MIN_TOKENS {
            return MatchResult {
                kind: MatchKind::OffTopic { best_score },
                answer: self.corpus.off_topic().to_string(),
            };
        }

        match best {
            Some((index, score)) if score > 0 => MatchResult {
                kind: MatchKind::Entry { index, score },
                answer: self.corpus.entries()[index].answer().to_string(),
            },
            _ => MatchResult {
                kind: MatchKind::Default,
                answer: self.corpus.default_answer().to_string(),
            },
        }
    }
}

/// All forms a keyword may match: each lowercased token verbatim, and the
/// same token with surrounding punctuation removed.
fn token_vocabulary(query: &Query) -> HashSet<String> {
    let mut vocabulary = HashSet::new();
    for token in query.tokens() {
        let bare = bare_token(&token);
        if !bare.is_empty() && bare != token {
            vocabulary.insert(bare.to_string());
        }
        vocabulary.insert(token);
    }
    vocabulary
}

fn score_entry(entry: &QaEntry, vocabulary: &HashSet<String>) -> usize {
    entry
        .keywords()
        .iter()
        .filter(|keyword| vocabulary.contains(keyword.as_str()))
        .count()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEFAULT: &str = "No entiendo la pregunta.";
    const OFF_TOPIC: &str = "Eso no tiene que ver con el reciclaje.";

    fn matcher(entries: Vec<QaEntry>) -> KeywordMatcher {
        KeywordMatcher::new(Corpus::new(entries, DEFAULT, OFF_TOPIC))
    }

    #[test]
    fn test_two_keyword_hit_beats_one_keyword_hit() {
        let m = matcher(vec![
            QaEntry::new(["reciclar", "vidrio"], "El vidrio va al contenedor verde."),
            QaEntry::new(["qué", "reciclar"], "Reciclar es transformar residuos."),
        ]);

        let result = m.evaluate(&Query::new("¿qué es reciclar?"));
        assert_eq!(result.answer, "Reciclar es transformar residuos.");
        assert_eq!(result.kind, MatchKind::Entry { index: 1, score: 2 });
    }

    #[test]
    fn test_long_query_with_weak_match_is_off_topic() {
        let m = matcher(vec![QaEntry::new(["reciclar", "plástico"], "Plástico al amarillo.")]);

        // 5 tokens, best score 1
        let result = m.evaluate(&Query::new("cómo puedo reciclar mi coche"));
        assert_eq!(result.answer, OFF_TOPIC);
        assert_eq!(result.kind, MatchKind::OffTopic { best_score: 1 });
    }

    #[test]
    fn test_long_query_with_no_match_is_off_topic() {
        let m = matcher(vec![QaEntry::new(["reciclar"], "x")]);
        assert_eq!(m.answer(&Query::new("quién ganó el partido ayer")), OFF_TOPIC);
    }

    #[test]
    fn test_short_query_with_single_hit_returns_entry() {
        let m = matcher(vec![QaEntry::new(["compost", "orgánico"], "El compost usa restos orgánicos.")]);
        // 3 tokens: threshold does not apply
        assert_eq!(
            m.answer(&Query::new("hacer compost casero")),
            "El compost usa restos orgánicos."
        );
    }

    #[test]
    fn test_short_query_without_match_returns_default() {
        let m = matcher(vec![QaEntry::new(["reciclar"], "x")]);
        assert_eq!(m.answer(&Query::new("hola")), DEFAULT);
        assert_eq!(m.evaluate(&Query::new("hola")).kind, MatchKind::Default);
    }

    #[test]
    fn test_ties_resolve_to_first_entry() {
        let m = matcher(vec![
            QaEntry::new(["papel", "cartón"], "first"),
            QaEntry::new(["cartón", "papel"], "second"),
        ]);
        for _ in 0..10 {
            assert_eq!(m.answer(&Query::new("papel y cartón")), "first");
        }
    }

    #[test]
    fn test_matching_is_case_insensitive() {
        let m = matcher(vec![QaEntry::new(["Pilas", "baterías"], "Punto limpio.")]);
        assert_eq!(m.answer(&Query::new("PILAS BATERÍAS")), "Punto limpio.");
    }

    #[test]
    fn test_keyword_with_punctuation_matches_verbatim_token() {
        let m = matcher(vec![QaEntry::new(["¿qué", "reciclar?"], "verbatim")]);
        assert_eq!(m.answer(&Query::new("¿qué es reciclar?")), "verbatim");
    }

    #[test]
    fn test_keyword_must_match_whole_token() {
        let m = matcher(vec![QaEntry::new(["cicla"], "partial")]);
        assert_eq!(m.answer(&Query::new("reciclar")), DEFAULT);
    }

    #[test]
    fn test_empty_corpus_and_empty_query() {
        let m = matcher(vec![]);
        assert_eq!(m.answer(&Query::new("")), DEFAULT);
        assert_eq!(m.answer(&Query::new("una pregunta bastante larga aquí")), OFF_TOPIC);
    }
}
