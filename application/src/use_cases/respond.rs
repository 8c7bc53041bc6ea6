//! Respond use case: the tier cascade.
//!
//! [`CascadeOrchestrator::respond`] turns a query into a stream of text
//! chunks, trying each tier in priority order:
//!
//! ```text
//! Trying(Primary) ──fail/empty──▶ Trying(Secondary) ──fail/empty──▶ Trying(Tertiary) ──▶ Done
//!        │                                │
//!        └──── ≥1 chunk ──▶ Done ◀────────┘
//! ```
//!
//! Chunks are forwarded as soon as a tier produces them. A tier is only
//! judged once its stream ends: an error before the first chunk and a clean
//! end without chunks both move the cascade to the next tier. Once a tier has
//! produced output the cascade stops there, even if the tier later fails;
//! forwarded text is never retracted.
//!
//! The returned stream is lazy: no tier is contacted until it is first
//! polled. The run then happens on a spawned task that feeds a bounded
//! channel. Dropping the [`ReplyStream`] or cancelling its token stops the
//! task and drops the active tier's stream, which aborts the underlying
//! request.

use crate::ports::event_logger::{CascadeEvent, EventLogger, NoEventLogger};
use crate::ports::text_generator::{ChunkStream, GeneratorError, TextGenerator};
use futures::{Stream, StreamExt};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll, ready};
use tiered_domain::{
    CascadeSettings, CascadeState, Demotion, KeywordMatcher, ProviderOutcome, Query, Tier,
};
use tokio::sync::mpsc;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Chunks buffered between the cascade task and the consumer.
const CHUNK_BUFFER: usize = 32;

/// Summary of a finished cascade run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CascadeReport {
    /// Tier whose output was forwarded.
    pub served_by: Tier,
    /// Number of chunks forwarded.
    pub chunks: usize,
    /// Tiers skipped before `served_by`, in order.
    pub demotions: Vec<Demotion>,
    /// Error that cut the serving tier short after it had produced output.
    pub interrupted: Option<String>,
}

enum ReplyEvent {
    Chunk(String),
    Finished(CascadeReport),
}

type CascadeRun = Pin<Box<dyn Future<Output = ()> + Send>>;

/// Stream of answer chunks for one query.
///
/// Yields plain `String`s: tier errors never reach the consumer. After the
/// stream has ended, [`report`](Self::report) tells which tier answered.
pub struct ReplyStream {
    receiver: mpsc::Receiver<ReplyEvent>,
    cancel: CancellationToken,
    report: Option<CascadeReport>,
    /// Spawned on the first poll.
    run: Option<CascadeRun>,
}

impl ReplyStream {
    /// Summary of the run, available once the stream has been drained.
    /// `None` if the run was cancelled or the stream is not finished.
    pub fn report(&self) -> Option<&CascadeReport> {
        self.report.as_ref()
    }

    /// Stop the run. Remaining chunks are not delivered.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Drain the stream into a single string.
    pub async fn collect_text(mut self) -> String {
        let mut text = String::new();
        while let Some(chunk) = self.next().await {
            text.push_str(&chunk);
        }
        text
    }
}

impl Stream for ReplyStream {
    type Item = String;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<String>> {
        let this = self.get_mut();
        if let Some(run) = this.run.take() {
            tokio::spawn(run);
        }
        loop {
            match ready!(this.receiver.poll_recv(cx)) {
                Some(ReplyEvent::Chunk(chunk)) => return Poll::Ready(Some(chunk)),
                Some(ReplyEvent::Finished(report)) => this.report = Some(report),
                None => return Poll::Ready(None),
            }
        }
    }
}

impl Drop for ReplyStream {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

/// How driving one tier ended.
enum TierRun {
    Finished(ProviderOutcome),
    /// Cancelled, or the consumer went away.
    Abandoned,
}

/// Cascade controller composing the three tiers in priority order.
pub struct CascadeOrchestrator {
    primary: Arc<dyn TextGenerator>,
    secondary: Arc<dyn TextGenerator>,
    matcher: Arc<KeywordMatcher>,
    settings: CascadeSettings,
    event_logger: Arc<dyn EventLogger>,
}

impl Clone for CascadeOrchestrator {
    fn clone(&self) -> Self {
        Self {
            primary: self.primary.clone(),
            secondary: self.secondary.clone(),
            matcher: self.matcher.clone(),
            settings: self.settings,
            event_logger: self.event_logger.clone(),
        }
    }
}

impl CascadeOrchestrator {
    pub fn new(
        primary: Arc<dyn TextGenerator>,
        secondary: Arc<dyn TextGenerator>,
        matcher: Arc<KeywordMatcher>,
    ) -> Self {
        Self {
            primary,
            secondary,
            matcher,
            settings: CascadeSettings::default(),
            event_logger: Arc::new(NoEventLogger),
        }
    }

    /// Set tier time limits.
    pub fn with_settings(mut self, settings: CascadeSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Create with an event logger.
    pub fn with_event_logger(mut self, logger: Arc<dyn EventLogger>) -> Self {
        self.event_logger = logger;
        self
    }

    pub fn settings(&self) -> &CascadeSettings {
        &self.settings
    }

    /// Answer `query` as a stream of chunks.
    ///
    /// Always yields at least one chunk unless cancelled. Nothing runs until
    /// the stream is polled, which must happen within a Tokio runtime.
    pub fn respond(&self, query: &str) -> ReplyStream {
        self.respond_with_cancellation(query, CancellationToken::new())
    }

    /// Like [`respond`](Self::respond), stopping when `cancel` fires.
    pub fn respond_with_cancellation(&self, query: &str, cancel: CancellationToken) -> ReplyStream {
        let (tx, rx) = mpsc::channel(CHUNK_BUFFER);
        let run_token = cancel.child_token();
        let orchestrator = self.clone();
        let query = Query::new(query);
        let task_token = run_token.clone();

        let run: CascadeRun = Box::pin(async move {
            orchestrator.run(query, tx, task_token).await;
        });

        ReplyStream {
            receiver: rx,
            cancel: run_token,
            report: None,
            run: Some(run),
        }
    }

    async fn run(&self, query: Query, tx: mpsc::Sender<ReplyEvent>, cancel: CancellationToken) {
        info!("Cascade started: {}", query.preview(80));

        let mut state = CascadeState::start();
        let mut demotions: Vec<Demotion> = Vec::new();
        let mut report: Option<CascadeReport> = None;

        while let CascadeState::Trying(tier) = state {
            let run = match tier {
                Tier::Primary => self.drive(tier, self.primary.as_ref(), &query, &tx, &cancel).await,
                Tier::Secondary => {
                    self.drive(tier, self.secondary.as_ref(), &query, &tx, &cancel)
                        .await
                }
                Tier::Tertiary => self.answer_from_corpus(&query, &tx).await,
            };

            let outcome = match run {
                TierRun::Finished(outcome) => outcome,
                TierRun::Abandoned => {
                    debug!("Cascade abandoned at {} tier", tier);
                    self.event_logger.log(CascadeEvent::new(
                        "cascade_abandoned",
                        serde_json::json!({ "tier": tier.as_str() }),
                    ));
                    return;
                }
            };

            match outcome {
                ProviderOutcome::Success {
                    chunks,
                    interrupted,
                } => {
                    self.log_delivery(tier, chunks, interrupted.as_deref());
                    report = Some(CascadeReport {
                        served_by: tier,
                        chunks,
                        demotions: std::mem::take(&mut demotions),
                        interrupted,
                    });
                    state = state.deliver();
                }
                failed => {
                    if let Some(reason) = failed.demotion_reason() {
                        warn!("{} tier demoted ({})", tier, reason);
                        let mut payload = serde_json::json!({
                            "tier": tier.as_str(),
                            "reason": reason.kind(),
                        });
                        if let ProviderOutcome::Failure(error) = &failed {
                            payload["error"] = serde_json::json!(error);
                        }
                        self.event_logger
                            .log(CascadeEvent::new("tier_demoted", payload));
                        demotions.push(Demotion { tier, reason });
                    }
                    state = state.demote();
                }
            }
        }

        if let Some(report) = report {
            // The consumer may already be gone; nothing left to do then.
            let _ = tx.send(ReplyEvent::Finished(report)).await;
        }
    }

    fn log_delivery(&self, tier: Tier, chunks: usize, interrupted: Option<&str>) {
        match interrupted {
            None => info!("{} tier answered in {} chunks", tier, chunks),
            Some(error) => warn!(
                "{} tier failed after {} chunks; keeping partial answer: {}",
                tier, chunks, error
            ),
        }
        self.event_logger.log(CascadeEvent::new(
            "tier_selected",
            serde_json::json!({
                "tier": tier.as_str(),
                "chunks": chunks,
                "interrupted": interrupted,
            }),
        ));
    }

    /// Pull one network tier to exhaustion, forwarding chunks as they come.
    async fn drive(
        &self,
        tier: Tier,
        generator: &dyn TextGenerator,
        query: &Query,
        tx: &mpsc::Sender<ReplyEvent>,
        cancel: &CancellationToken,
    ) -> TierRun {
        debug!("Trying {} tier ({})", tier, generator.name());

        let first_deadline = deadline(self.settings.first_chunk_timeout);

        let opened = tokio::select! {
            biased;
            _ = cancel.cancelled() => return TierRun::Abandoned,
            _ = tx.closed() => return TierRun::Abandoned,
            opened = within(first_deadline, generator.generate(query.raw())) => opened,
        };

        let mut stream: ChunkStream = match opened {
            Some(Ok(stream)) => stream,
            Some(Err(e)) => return TierRun::Finished(ProviderOutcome::Failure(e.to_string())),
            None => {
                return TierRun::Finished(ProviderOutcome::Failure(
                    GeneratorError::Timeout.to_string(),
                ));
            }
        };

        let mut chunks = 0usize;
        loop {
            let limit = if chunks == 0 {
                first_deadline
            } else {
                deadline(self.settings.idle_timeout)
            };

            let pulled = tokio::select! {
                biased;
                _ = cancel.cancelled() => return TierRun::Abandoned,
                _ = tx.closed() => return TierRun::Abandoned,
                pulled = within(limit, stream.next()) => pulled,
            };

            let error = match pulled {
                Some(Some(Ok(chunk))) => {
                    if chunk.is_empty() {
                        continue;
                    }
                    chunks += 1;
                    if tx.send(ReplyEvent::Chunk(chunk)).await.is_err() {
                        return TierRun::Abandoned;
                    }
                    continue;
                }
                Some(Some(Err(e))) => e,
                Some(None) => {
                    return TierRun::Finished(if chunks == 0 {
                        ProviderOutcome::EmptyCompletion
                    } else {
                        ProviderOutcome::Success {
                            chunks,
                            interrupted: None,
                        }
                    });
                }
                None => GeneratorError::Timeout,
            };

            return TierRun::Finished(if chunks == 0 {
                ProviderOutcome::Failure(error.to_string())
            } else {
                ProviderOutcome::Success {
                    chunks,
                    interrupted: Some(error.to_string()),
                }
            });
        }
    }

    /// Terminal tier: a single chunk holding the whole corpus answer.
    async fn answer_from_corpus(&self, query: &Query, tx: &mpsc::Sender<ReplyEvent>) -> TierRun {
        let result = self.matcher.evaluate(query);
        debug!("Keyword match: {:?}", result.kind);

        if tx.send(ReplyEvent::Chunk(result.answer)).await.is_err() {
            return TierRun::Abandoned;
        }
        TierRun::Finished(ProviderOutcome::Success {
            chunks: 1,
            interrupted: None,
        })
    }
}

fn deadline(limit: Option<std::time::Duration>) -> Option<Instant> {
    limit.map(|d| Instant::now() + d)
}

/// Await `fut` until `deadline`. `None` means the deadline passed first.
async fn within<F: Future>(deadline: Option<Instant>, fut: F) -> Option<F::Output> {
    match deadline {
        Some(at) => tokio::time::timeout_at(at, fut).await.ok(),
        None => Some(fut.await),
    }
}
