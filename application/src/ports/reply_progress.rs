//! Reply progress port
//!
//! Defines how a chat front end is told about an answer as it streams in.

use tiered_domain::{AnswerSource, SessionMessage};

/// Callback for updates while an answer is produced.
///
/// Implementations live in the presentation layer.
pub trait ReplyProgress: Send + Sync {
    /// The assistant message was created and shows the pending placeholder.
    fn on_pending(&self, _message: &SessionMessage) {}

    /// A chunk arrived. `message` already includes it.
    fn on_chunk(&self, _chunk: &str, _message: &SessionMessage) {}

    /// The message is final.
    fn on_complete(&self, message: &SessionMessage, source: AnswerSource);
}

/// No-op progress for when nobody is watching.
pub struct NoReplyProgress;

impl ReplyProgress for NoReplyProgress {
    fn on_complete(&self, _message: &SessionMessage, _source: AnswerSource) {}
}
