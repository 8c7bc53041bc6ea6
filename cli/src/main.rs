//! CLI entrypoint for Tiered Assistant
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, bail};
use clap::Parser;
use std::path::Path;
use std::sync::Arc;
use tiered_application::{AskUseCase, CascadeOrchestrator, EventLogger, NoEventLogger};
use tiered_domain::KeywordMatcher;
use tiered_infrastructure::{
    ConfigLoader, CorpusLoader, FileConfig, HostedGenerator, InMemoryResponseCache,
    JsonlEventLogger, LocalGenerator,
};
use tiered_presentation::{ChatRepl, Cli, ConsoleReply, ask_interruptible};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

/// Initialize logging based on verbosity level. `RUST_LOG` wins when set.
fn init_tracing(verbose: u8, log_file: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let Some(path) = log_file else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .init();
        return Ok(None);
    };

    let directory = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .with_context(|| format!("Invalid log file path: {}", path.display()))?;
    std::fs::create_dir_all(directory)
        .with_context(|| format!("Could not create log directory {}", directory.display()))?;

    let (writer, guard) =
        tracing_appender::non_blocking(tracing_appender::rolling::never(directory, file_name));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(writer)
        .init();
    Ok(Some(guard))
}

fn build_use_case(cli: &Cli, config: &FileConfig) -> Result<AskUseCase> {
    // Keyword tier
    let corpus_path = cli.corpus.as_deref().or(config.corpus.path.as_deref());
    let corpus = CorpusLoader::load_or_default(corpus_path)?;
    if corpus.is_empty() {
        info!("No corpus entries loaded; the keyword tier only has fallback answers");
    }
    let matcher = Arc::new(KeywordMatcher::new(corpus));

    // Diagnostic events
    let events_path = cli
        .events_file
        .as_deref()
        .or(config.logging.events_file.as_deref());
    let event_logger: Arc<dyn EventLogger> = match events_path.and_then(JsonlEventLogger::new) {
        Some(logger) => {
            info!("Cascade events: {}", logger.path().display());
            Arc::new(logger)
        }
        None => Arc::new(NoEventLogger),
    };

    // Network tiers
    let hosted_settings = config.hosted_settings();
    if hosted_settings.resolve_api_key().is_none() {
        warn!(
            "{} is not set; the hosted tier will be skipped",
            hosted_settings.api_key_env
        );
    }
    let primary = Arc::new(HostedGenerator::new(hosted_settings)?);
    let secondary = Arc::new(LocalGenerator::new(config.local_settings())?);

    let orchestrator = CascadeOrchestrator::new(primary, secondary, matcher)
        .with_settings(config.cascade_settings())
        .with_event_logger(event_logger.clone());

    Ok(
        AskUseCase::new(Arc::new(InMemoryResponseCache::new()), orchestrator)
            .with_event_logger(event_logger),
    )
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let _log_guard = init_tracing(cli.verbose, cli.log_file.as_deref())?;

    if cli.show_config {
        ConfigLoader::print_config_sources(cli.config.as_deref());
        return Ok(());
    }

    info!("Starting Tiered Assistant");

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_deref())?
    };

    // === Dependency Injection ===
    let use_case = Arc::new(build_use_case(&cli, &config)?);

    // Chat mode
    if cli.chat {
        let repl = ChatRepl::new(use_case)
            .with_quiet(cli.quiet)
            .with_show_source(cli.verbose > 0);

        repl.run().await?;
        return Ok(());
    }

    // Single question mode - question is required
    let Some(question) = cli.question.as_deref() else {
        bail!("Question is required. Use --chat for interactive mode.");
    };

    let console = ConsoleReply::new()
        .quiet(cli.quiet)
        .show_source(cli.verbose > 0);
    let source = ask_interruptible(&use_case, question, &console).await;
    info!("Answer source: {:?}", source);

    Ok(())
}
