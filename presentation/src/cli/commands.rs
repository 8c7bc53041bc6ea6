//! CLI command definitions

use clap::Parser;
use std::path::PathBuf;

/// CLI arguments for tiered-assistant
#[derive(Parser, Debug)]
#[command(name = "tiered-assistant")]
#[command(author, version, about = "Chat assistant that falls back from hosted to local to keyword answers")]
#[command(long_about = r#"
Tiered Assistant answers questions through a three-tier cascade:

1. Primary:   hosted generation service (streamed)
2. Secondary: local model server (streamed)
3. Tertiary:  keyword matching over a static question/answer corpus

A tier that fails or stays silent before its first chunk hands over to the
next one. Answers are cached for the rest of the session.

Configuration files are loaded from (in priority order):
1. TIERED_* environment variables   e.g. TIERED_SECONDARY__MODEL=mistral
2. --config <path>                  Explicit config file
3. ./assistant.toml                 Project-level config
4. ~/.config/tiered-assistant/config.toml   Global config

Example:
  tiered-assistant "¿Qué es reciclar?"
  tiered-assistant --corpus faq.toml --chat
"#)]
pub struct Cli {
    /// The question to ask (not required in chat mode)
    pub question: Option<String>,

    /// Start interactive chat mode
    #[arg(short, long)]
    pub chat: bool,

    /// Question/answer corpus for the keyword tier (TOML or JSON)
    #[arg(long, value_name = "PATH")]
    pub corpus: Option<PathBuf>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress the pending spinner and answer annotations
    #[arg(short, long)]
    pub quiet: bool,

    /// Write diagnostic logs to this file instead of stderr
    #[arg(long, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Append cascade events as JSON lines to this file
    #[arg(long, value_name = "PATH")]
    pub events_file: Option<PathBuf>,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}
