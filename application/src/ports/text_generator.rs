//! Text generator port
//!
//! Defines the interface for the two network tiers (hosted and local
//! generation services).

use async_trait::async_trait;
use futures::stream::BoxStream;
use thiserror::Error;

/// Errors a generation tier can raise. All of them demote the tier if they
/// happen before the first chunk.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeneratorError {
    #[error("Connection error: {0}")]
    Transport(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("Service error (status {status}): {message}")]
    Service { status: u16, message: String },

    #[error("Service reported an error mid-stream: {0}")]
    Remote(String),

    #[error("Response has no readable body")]
    MissingBody,

    #[error("Timeout")]
    Timeout,
}

/// Lazy, finite, non-restartable sequence of text chunks.
///
/// Each item is pulled on demand. `Ok(chunk)` is output, `Err` ends the stream
/// with a failure, and the end of the stream is a clean completion (which may
/// come before any chunk at all).
pub type ChunkStream = BoxStream<'static, Result<String, GeneratorError>>;

/// A streaming generation backend.
///
/// Implementations (adapters) live in the infrastructure layer.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Short name used in logs (e.g. "hosted", "local").
    fn name(&self) -> &str;

    /// Start generating an answer for `prompt`.
    ///
    /// Returning `Err` means the request could not even be started. Dropping
    /// the returned stream must abort the underlying request.
    async fn generate(&self, prompt: &str) -> Result<ChunkStream, GeneratorError>;
}
