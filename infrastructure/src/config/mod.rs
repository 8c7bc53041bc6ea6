//! Configuration file loading for tiered-assistant
//!
//! This module handles file I/O and merging of configuration from multiple sources.
//! The priority order (highest to lowest):
//!
//! 1. `TIERED_*` environment variables (`TIERED_PRIMARY__MODEL=...`)
//! 2. `--config <path>` specified file
//! 3. Project root: `./assistant.toml` or `./.assistant.toml`
//! 4. XDG config: `$XDG_CONFIG_HOME/tiered-assistant/config.toml`
//! 5. Default values

mod file_config;
mod loader;

pub use file_config::{
    FileCascadeConfig, FileConfig, FileCorpusConfig, FileLoggingConfig, FilePrimaryConfig,
    FileSecondaryConfig,
};
pub use loader::{ConfigError, ConfigLoader};
