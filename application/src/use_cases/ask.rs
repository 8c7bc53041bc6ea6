//! Ask use case: the chat session side of the cascade.
//!
//! 1. Look the raw query up in the [`ResponseCache`]; a hit is returned as a
//!    complete message and the cascade does not run.
//! 2. Otherwise create a pending assistant message and stream the cascade
//!    into it: the first chunk replaces the placeholder, later chunks append.
//! 3. When the stream ends with text, store it in the cache under the raw
//!    query (the cache normalizes the key itself).
//!
//! If the cascade breaks anyway (it should not: the keyword tier cannot
//! fail, but the run task could still panic), the message gets
//! [`APOLOGY_MESSAGE`] and nothing is cached.

use crate::ports::event_logger::{CascadeEvent, EventLogger, NoEventLogger};
use crate::ports::reply_progress::ReplyProgress;
use crate::ports::response_cache::ResponseCache;
use crate::use_cases::respond::{CascadeOrchestrator, ReplyStream};
use futures::StreamExt;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use tiered_domain::{APOLOGY_MESSAGE, AnswerSource, Query, SessionMessage};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

/// Result of one [`AskUseCase::execute`] call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AskOutcome {
    /// The user's message as recorded for the session.
    pub question: SessionMessage,
    /// The final assistant message.
    pub message: SessionMessage,
    /// Where its text came from.
    pub source: AnswerSource,
}

/// Use case answering one chat query with caching.
pub struct AskUseCase {
    cache: Arc<dyn ResponseCache>,
    orchestrator: CascadeOrchestrator,
    event_logger: Arc<dyn EventLogger>,
    next_id: AtomicU64,
}

impl AskUseCase {
    pub fn new(cache: Arc<dyn ResponseCache>, orchestrator: CascadeOrchestrator) -> Self {
        Self {
            cache,
            orchestrator,
            event_logger: Arc::new(NoEventLogger),
            next_id: AtomicU64::new(1),
        }
    }

    /// Create with an event logger.
    pub fn with_event_logger(mut self, logger: Arc<dyn EventLogger>) -> Self {
        self.event_logger = logger;
        self
    }

    pub fn cache(&self) -> &Arc<dyn ResponseCache> {
        &self.cache
    }

    fn next_message_id(&self) -> u64 {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }

    /// Answer `query`, reporting the message as it fills in.
    pub async fn execute(&self, query: &str, progress: &dyn ReplyProgress) -> AskOutcome {
        self.execute_with_cancellation(query, progress, CancellationToken::new())
            .await
    }

    /// Like [`execute`](Self::execute), stopping when `cancel` fires.
    pub async fn execute_with_cancellation(
        &self,
        query: &str,
        progress: &dyn ReplyProgress,
        cancel: CancellationToken,
    ) -> AskOutcome {
        let question = SessionMessage::user(self.next_message_id(), query);
        let id = self.next_message_id();

        if let Some(cached) = self.cache.get(query) {
            info!("Cache hit: {}", Query::new(query).preview(80));
            self.event_logger.log(CascadeEvent::new(
                "cache_hit",
                serde_json::json!({ "bytes": cached.len() }),
            ));
            let message = SessionMessage::complete(id, cached);
            progress.on_complete(&message, AnswerSource::Cache);
            return AskOutcome {
                question,
                message,
                source: AnswerSource::Cache,
            };
        }

        let mut message = SessionMessage::pending(id);
        progress.on_pending(&message);

        let mut stream: ReplyStream = self
            .orchestrator
            .respond_with_cancellation(query, cancel.clone());

        while let Some(chunk) = stream.next().await {
            message.apply_chunk(&chunk);
            progress.on_chunk(&chunk, &message);
        }

        if cancel.is_cancelled() {
            debug!("Ask cancelled after {} bytes", message.received_text().len());
            progress.on_complete(&message, AnswerSource::Cancelled);
            return AskOutcome {
                question,
                message,
                source: AnswerSource::Cancelled,
            };
        }

        let source = match stream.report() {
            Some(report) if !message.received_text().is_empty() => {
                AnswerSource::Tier(report.served_by)
            }
            _ => {
                error!("Cascade ended without an answer; answering with apology");
                return self.apologize(question, message, progress);
            }
        };

        if source.is_cacheable() {
            self.cache.set(query, message.received_text().to_string());
        }
        progress.on_complete(&message, source);

        AskOutcome {
            question,
            message,
            source,
        }
    }

    fn apologize(
        &self,
        question: SessionMessage,
        mut message: SessionMessage,
        progress: &dyn ReplyProgress,
    ) -> AskOutcome {
        self.event_logger.log(CascadeEvent::new(
            "cascade_failed",
            serde_json::json!({ "message_id": message.id() }),
        ));
        message.replace(APOLOGY_MESSAGE);
        progress.on_complete(&message, AnswerSource::Apology);
        AskOutcome {
            question,
            message,
            source: AnswerSource::Apology,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::text_generator::{ChunkStream, GeneratorError, TextGenerator};
    use async_trait::async_trait;
    use futures::stream;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::sync::atomic::AtomicUsize;
    use tiered_domain::{
        CascadeSettings, Corpus, KeywordMatcher, PENDING_PLACEHOLDER, QaEntry, Sender, Tier,
        normalize_key,
    };

    // ==================== Test Mocks ====================

    struct ScriptedGenerator {
        chunks: Option<Vec<&'static str>>,
        calls: AtomicUsize,
    }

    impl ScriptedGenerator {
        /// `None` fails on open.
        fn new(chunks: Option<Vec<&'static str>>) -> Arc<Self> {
            Arc::new(Self {
                chunks,
                calls: AtomicUsize::new(0),
            })
        }

        fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl TextGenerator for ScriptedGenerator {
        fn name(&self) -> &str {
            "scripted"
        }

        async fn generate(&self, _prompt: &str) -> Result<ChunkStream, GeneratorError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match &self.chunks {
                Some(chunks) => {
                    let items: Vec<Result<String, GeneratorError>> =
                        chunks.iter().map(|c| Ok(c.to_string())).collect();
                    Ok(stream::iter(items).boxed())
                }
                None => Err(GeneratorError::Transport("unreachable".into())),
            }
        }
    }

    struct PanickingGenerator;

    #[async_trait]
    impl TextGenerator for PanickingGenerator {
        fn name(&self) -> &str {
            "panicking"
        }

        async fn generate(&self, _prompt: &str) -> Result<ChunkStream, GeneratorError> {
            panic!("generator bug");
        }
    }

    #[derive(Default)]
    struct MapCache {
        entries: Mutex<HashMap<String, String>>,
    }

    impl ResponseCache for MapCache {
        fn get(&self, query: &str) -> Option<String> {
            self.entries
                .lock()
                .unwrap()
                .get(&normalize_key(query))
                .cloned()
        }

        fn set(&self, query: &str, answer: String) {
            self.entries
                .lock()
                .unwrap()
                .insert(normalize_key(query), answer);
        }

        fn len(&self) -> usize {
            self.entries.lock().unwrap().len()
        }
    }

    /// Records every callback as a string.
    #[derive(Default)]
    struct RecordingProgress {
        calls: Mutex<Vec<String>>,
    }

    impl ReplyProgress for RecordingProgress {
        fn on_pending(&self, message: &SessionMessage) {
            self.calls
                .lock()
                .unwrap()
                .push(format!("pending:{}", message.text()));
        }

        fn on_chunk(&self, chunk: &str, message: &SessionMessage) {
            self.calls
                .lock()
                .unwrap()
                .push(format!("chunk:{}|{}", chunk, message.text()));
        }

        fn on_complete(&self, message: &SessionMessage, source: AnswerSource) {
            self.calls
                .lock()
                .unwrap()
                .push(format!("complete:{}|{:?}", message.text(), source));
        }
    }

    fn use_case(
        primary: &Arc<ScriptedGenerator>,
        secondary: &Arc<ScriptedGenerator>,
        cache: Arc<MapCache>,
    ) -> AskUseCase {
        let matcher = Arc::new(KeywordMatcher::new(Corpus::new(
            vec![QaEntry::new(["reciclar", "qué"], "Reciclar es reutilizar.")],
            "default",
            "off topic",
        )));
        let orchestrator = CascadeOrchestrator::new(primary.clone(), secondary.clone(), matcher)
            .with_settings(CascadeSettings::unbounded());
        AskUseCase::new(cache, orchestrator)
    }

    // ==================== Tests ====================

    #[tokio::test]
    async fn test_miss_streams_and_writes_cache() {
        let primary = ScriptedGenerator::new(Some(vec!["Reciclar ", "es bueno."]));
        let secondary = ScriptedGenerator::new(Some(vec!["never"]));
        let cache = Arc::new(MapCache::default());
        let ask = use_case(&primary, &secondary, cache.clone());
        let progress = RecordingProgress::default();

        let outcome = ask.execute("Qué es reciclar", &progress).await;

        assert_eq!(outcome.message.text(), "Reciclar es bueno.");
        assert_eq!(outcome.source, AnswerSource::Tier(Tier::Primary));
        assert_eq!(cache.get(" qué es reciclar "), Some("Reciclar es bueno.".to_string()));

        let calls = progress.calls.lock().unwrap().clone();
        assert_eq!(
            calls,
            vec![
                format!("pending:{}", PENDING_PLACEHOLDER),
                "chunk:Reciclar |Reciclar ".to_string(),
                "chunk:es bueno.|Reciclar es bueno.".to_string(),
                "complete:Reciclar es bueno.|Tier(Primary)".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_hit_skips_cascade() {
        let primary = ScriptedGenerator::new(Some(vec!["fresh"]));
        let secondary = ScriptedGenerator::new(Some(vec!["fresh"]));
        let cache = Arc::new(MapCache::default());
        cache.set("qué es reciclar", "cached answer".to_string());
        let ask = use_case(&primary, &secondary, cache.clone());
        let progress = RecordingProgress::default();

        let outcome = ask.execute("  QUÉ es reciclar ", &progress).await;

        assert_eq!(outcome.source, AnswerSource::Cache);
        assert_eq!(outcome.message.text(), "cached answer");
        assert!(!outcome.message.is_pending());
        assert_eq!(primary.calls(), 0);
        assert_eq!(secondary.calls(), 0);
        assert_eq!(
            progress.calls.lock().unwrap().clone(),
            vec!["complete:cached answer|Cache".to_string()]
        );
    }

    #[tokio::test]
    async fn test_second_ask_is_served_from_cache() {
        let primary = ScriptedGenerator::new(Some(vec!["answer"]));
        let secondary = ScriptedGenerator::new(None);
        let cache = Arc::new(MapCache::default());
        let ask = use_case(&primary, &secondary, cache);

        let first = ask.execute("Hola", &crate::NoReplyProgress).await;
        let second = ask.execute("hola ", &crate::NoReplyProgress).await;

        assert_eq!(first.source, AnswerSource::Tier(Tier::Primary));
        assert_eq!(second.source, AnswerSource::Cache);
        assert_eq!(second.message.text(), "answer");
        assert_eq!(primary.calls(), 1);
        assert_ne!(first.message.id(), second.message.id());
    }

    #[tokio::test]
    async fn test_question_is_recorded_as_user_message() {
        let primary = ScriptedGenerator::new(Some(vec!["answer"]));
        let secondary = ScriptedGenerator::new(None);
        let ask = use_case(&primary, &secondary, Arc::new(MapCache::default()));

        let outcome = ask.execute("  Hola ", &crate::NoReplyProgress).await;

        assert_eq!(outcome.question.sender(), Sender::User);
        assert_eq!(outcome.question.text(), "  Hola ");
        assert_eq!(outcome.message.sender(), Sender::Assistant);
        assert!(outcome.question.id() < outcome.message.id());
    }

    #[tokio::test]
    async fn test_keyword_answers_are_cached_too() {
        let primary = ScriptedGenerator::new(None);
        let secondary = ScriptedGenerator::new(Some(vec![]));
        let cache = Arc::new(MapCache::default());
        let ask = use_case(&primary, &secondary, cache.clone());

        let outcome = ask.execute("hola", &crate::NoReplyProgress).await;

        assert_eq!(outcome.message.text(), "default");
        assert_eq!(outcome.source, AnswerSource::Tier(Tier::Tertiary));
        assert_eq!(cache.get("hola"), Some("default".to_string()));
    }

    #[tokio::test]
    async fn test_cancelled_run_is_not_cached() {
        let primary = ScriptedGenerator::new(Some(vec!["answer"]));
        let secondary = ScriptedGenerator::new(None);
        let cache = Arc::new(MapCache::default());
        let ask = use_case(&primary, &secondary, cache.clone());

        let token = CancellationToken::new();
        token.cancel();
        let outcome = ask
            .execute_with_cancellation("hola", &crate::NoReplyProgress, token)
            .await;

        assert_eq!(outcome.source, AnswerSource::Cancelled);
        assert!(cache.is_empty());
    }

    #[tokio::test]
    async fn test_broken_run_answers_with_apology_and_skips_cache() {
        let cache = Arc::new(MapCache::default());
        let orchestrator = CascadeOrchestrator::new(
            Arc::new(PanickingGenerator),
            Arc::new(PanickingGenerator),
            Arc::new(KeywordMatcher::new(Corpus::default())),
        );
        let ask = AskUseCase::new(cache.clone(), orchestrator);

        let outcome = ask.execute("hola", &crate::NoReplyProgress).await;

        assert_eq!(outcome.source, AnswerSource::Apology);
        assert_eq!(outcome.message.text(), APOLOGY_MESSAGE);
        assert!(!outcome.message.is_pending());
        assert!(cache.is_empty());
    }
}
