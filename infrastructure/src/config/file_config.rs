//! Raw TOML configuration data types
//!
//! These structs represent the exact structure of the TOML config file.
//! They are deserialized directly and converted into the serde-free domain
//! settings before use.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;
use tiered_domain::{
    CascadeSettings, DEFAULT_SYSTEM_INSTRUCTION, DomainError, GeneratorSettings, HostedSettings,
    LocalSettings,
};

/// Primary tier (`[primary]`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilePrimaryConfig {
    /// Base URL of the hosted service.
    pub endpoint: String,
    pub model: String,
    /// Overrides the shared system instruction for this tier.
    pub system_instruction: Option<String>,
    /// Environment variable name for the API key (default: "GEMINI_API_KEY").
    pub api_key_env: String,
    /// Direct API key (not recommended; prefer the env var).
    pub api_key: Option<String>,
}

impl Default for FilePrimaryConfig {
    fn default() -> Self {
        let defaults = HostedSettings::default();
        Self {
            endpoint: defaults.generator.endpoint,
            model: defaults.generator.model,
            system_instruction: None,
            api_key_env: defaults.api_key_env,
            api_key: None,
        }
    }
}

/// Secondary tier (`[secondary]`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileSecondaryConfig {
    /// Full URL of the local generate endpoint.
    pub endpoint: String,
    pub model: String,
    pub system_instruction: Option<String>,
}

impl Default for FileSecondaryConfig {
    fn default() -> Self {
        let defaults = LocalSettings::default();
        Self {
            endpoint: defaults.generator.endpoint,
            model: defaults.generator.model,
            system_instruction: None,
        }
    }
}

/// Cascade time limits (`[cascade]`), in seconds. `0` disables a limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileCascadeConfig {
    pub first_chunk_timeout_secs: u64,
    pub idle_timeout_secs: u64,
}

impl Default for FileCascadeConfig {
    fn default() -> Self {
        let defaults = CascadeSettings::default();
        Self {
            first_chunk_timeout_secs: defaults.first_chunk_timeout.map_or(0, |d| d.as_secs()),
            idle_timeout_secs: defaults.idle_timeout.map_or(0, |d| d.as_secs()),
        }
    }
}

/// Keyword tier corpus (`[corpus]`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileCorpusConfig {
    /// TOML or JSON corpus file. Built-in messages only when unset.
    pub path: Option<PathBuf>,
}

/// Diagnostics (`[logging]`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoggingConfig {
    /// JSONL file receiving cascade events.
    pub events_file: Option<PathBuf>,
}

/// Complete file configuration (raw TOML structure)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    /// Instruction shared by both network tiers unless a tier overrides it.
    pub system_instruction: Option<String>,
    pub primary: FilePrimaryConfig,
    pub secondary: FileSecondaryConfig,
    pub cascade: FileCascadeConfig,
    pub corpus: FileCorpusConfig,
    pub logging: FileLoggingConfig,
}

impl FileConfig {
    fn instruction_for(&self, tier_override: &Option<String>) -> String {
        tier_override
            .clone()
            .or_else(|| self.system_instruction.clone())
            .unwrap_or_else(|| DEFAULT_SYSTEM_INSTRUCTION.to_string())
    }

    pub fn hosted_settings(&self) -> HostedSettings {
        HostedSettings {
            generator: GeneratorSettings::new(&self.primary.endpoint, &self.primary.model)
                .with_system_instruction(self.instruction_for(&self.primary.system_instruction)),
            api_key_env: self.primary.api_key_env.clone(),
            api_key: self.primary.api_key.clone(),
        }
    }

    pub fn local_settings(&self) -> LocalSettings {
        LocalSettings {
            generator: GeneratorSettings::new(&self.secondary.endpoint, &self.secondary.model)
                .with_system_instruction(
                    self.instruction_for(&self.secondary.system_instruction),
                ),
        }
    }

    pub fn cascade_settings(&self) -> CascadeSettings {
        let limit = |secs: u64| (secs > 0).then(|| Duration::from_secs(secs));
        CascadeSettings {
            first_chunk_timeout: limit(self.cascade.first_chunk_timeout_secs),
            idle_timeout: limit(self.cascade.idle_timeout_secs),
        }
    }

    /// Validate the configuration, returning every detected issue.
    pub fn validate(&self) -> Vec<DomainError> {
        let mut issues = Vec::new();

        if let Err(e) = self.hosted_settings().generator.validate("primary") {
            issues.push(e);
        }
        if let Err(e) = self.local_settings().generator.validate("secondary") {
            issues.push(e);
        }
        if self.primary.api_key_env.trim().is_empty() && self.primary.api_key.is_none() {
            issues.push(DomainError::InvalidSetting {
                field: "primary",
                reason: "api_key_env cannot be empty when api_key is not set".to_string(),
            });
        }

        issues
    }
}
