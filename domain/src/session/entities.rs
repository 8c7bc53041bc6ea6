//! Session domain entities

use crate::cascade::tier::Tier;
use serde::{Deserialize, Serialize};

/// Placeholder text shown while the assistant has not produced anything yet.
pub const PENDING_PLACEHOLDER: &str = "…";

/// Shown instead of an answer if the cascade itself breaks.
pub const APOLOGY_MESSAGE: &str =
    "Sorry, something went wrong while preparing an answer. Please try again.";

/// Who wrote a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sender {
    User,
    Assistant,
}

/// Where the final text of an assistant message came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerSource {
    /// Served from the response cache; the cascade did not run.
    Cache,
    /// Streamed by this tier of the cascade.
    Tier(Tier),
    /// The cascade broke and the apology message was substituted.
    Apology,
    /// The run was cancelled before it finished.
    Cancelled,
}

impl AnswerSource {
    /// Whether the answer may be written to the cache.
    pub fn is_cacheable(&self) -> bool {
        matches!(self, AnswerSource::Tier(_))
    }
}

/// A message in a chat session (Entity)
///
/// An assistant message starts out pending with [`PENDING_PLACEHOLDER`] as its
/// text. The first chunk replaces the placeholder, later chunks are appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionMessage {
    id: u64,
    sender: Sender,
    text: String,
    pending: bool,
}

impl SessionMessage {
    /// A complete message typed by the user.
    pub fn user(id: u64, text: impl Into<String>) -> Self {
        Self {
            id,
            sender: Sender::User,
            text: text.into(),
            pending: false,
        }
    }

    /// An assistant message waiting for its first chunk.
    pub fn pending(id: u64) -> Self {
        Self {
            id,
            sender: Sender::Assistant,
            text: PENDING_PLACEHOLDER.to_string(),
            pending: true,
        }
    }

    /// An assistant message that arrived whole (e.g. from the cache).
    pub fn complete(id: u64, text: impl Into<String>) -> Self {
        Self {
            id,
            sender: Sender::Assistant,
            text: text.into(),
            pending: false,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn sender(&self) -> Sender {
        self.sender
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Apply one streamed chunk.
    pub fn apply_chunk(&mut self, chunk: &str) {
        if self.pending {
            self.text.clear();
            self.pending = false;
        }
        self.text.push_str(chunk);
    }

    /// Replace whatever was accumulated with `text` and mark it complete.
    pub fn replace(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.pending = false;
    }

    /// Text that was actually received, excluding the placeholder.
    pub fn received_text(&self) -> &str {
        if self.pending { "" } else { &self.text }
    }
}
