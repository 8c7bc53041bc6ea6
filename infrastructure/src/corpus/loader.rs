//! Load the question/answer corpus from TOML or JSON.
//!
//! ```toml
//! default = "No lo sé."
//! off_topic = "Eso no es de este tema."
//!
//! [[entries]]
//! keywords = ["reciclar", "basura"]
//! answer = "Separa los residuos."
//! ```
//!
//! The JSON form has the same shape. Missing `default`/`off_topic` fall back
//! to the built-in messages.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tiered_domain::{Corpus, DEFAULT_ANSWER, DEFAULT_OFF_TOPIC, DomainError, QaEntry};
use tracing::info;

#[derive(Error, Debug)]
pub enum CorpusLoadError {
    #[error("Failed to read corpus {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid TOML in corpus {path}: {message}")]
    Toml { path: PathBuf, message: String },

    #[error("Invalid JSON in corpus {path}: {message}")]
    Json { path: PathBuf, message: String },

    #[error("Invalid corpus {path}: {source}")]
    Invalid {
        path: PathBuf,
        #[source]
        source: DomainError,
    },
}

#[derive(Debug, Deserialize)]
struct RawCorpus {
    default: Option<String>,
    off_topic: Option<String>,
    #[serde(default)]
    entries: Vec<RawEntry>,
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    keywords: Vec<String>,
    answer: String,
}

impl RawCorpus {
    fn into_corpus(self) -> Corpus {
        let entries = self
            .entries
            .into_iter()
            .map(|e| QaEntry::new(e.keywords, e.answer))
            .collect();
        Corpus::new(
            entries,
            self.default.unwrap_or_else(|| DEFAULT_ANSWER.to_string()),
            self.off_topic.unwrap_or_else(|| DEFAULT_OFF_TOPIC.to_string()),
        )
    }
}

/// Reads corpus files.
pub struct CorpusLoader;

impl CorpusLoader {
    /// Load and validate the corpus at `path`.
    ///
    /// Files ending in `.json` are parsed as JSON, anything else as TOML.
    pub fn load(path: &Path) -> Result<Corpus, CorpusLoadError> {
        let content = std::fs::read_to_string(path).map_err(|source| CorpusLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));

        let raw: RawCorpus = if is_json {
            serde_json::from_str(&content).map_err(|e| CorpusLoadError::Json {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?
        } else {
            toml::from_str(&content).map_err(|e| CorpusLoadError::Toml {
                path: path.to_path_buf(),
                message: e.to_string(),
            })?
        };

        let corpus = raw.into_corpus();
        corpus.validate().map_err(|source| CorpusLoadError::Invalid {
            path: path.to_path_buf(),
            source,
        })?;

        info!("Loaded {} corpus entries from {}", corpus.len(), path.display());
        Ok(corpus)
    }

    /// Load `path` if given, otherwise the built-in corpus.
    pub fn load_or_default(path: Option<&Path>) -> Result<Corpus, CorpusLoadError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Corpus::default()),
        }
    }
}
