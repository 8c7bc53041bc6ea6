//! Generator and cascade settings (provider-neutral, serde-free).
//!
//! These types define the shape of tier settings without depending
//! on any serialization format (TOML, JSON, etc.).

use crate::core::error::DomainError;
use std::time::Duration;

/// Instruction sent alongside every query to the generation tiers.
pub const DEFAULT_SYSTEM_INSTRUCTION: &str = "You are a friendly assistant. Answer briefly and clearly, in the same language as the question.";

/// Connection settings shared by the two network tiers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratorSettings {
    /// Base URL or full endpoint of the service.
    pub endpoint: String,
    /// Model identifier passed to the service.
    pub model: String,
    /// Fixed system instruction sent with every prompt.
    pub system_instruction: String,
}

impl GeneratorSettings {
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            endpoint: endpoint.into(),
            model: model.into(),
            system_instruction: DEFAULT_SYSTEM_INSTRUCTION.to_string(),
        }
    }

    pub fn with_system_instruction(mut self, instruction: impl Into<String>) -> Self {
        self.system_instruction = instruction.into();
        self
    }

    /// Reject settings that cannot possibly reach a service.
    pub fn validate(&self, tier: &'static str) -> Result<(), DomainError> {
        if self.endpoint.trim().is_empty() {
            return Err(DomainError::InvalidSetting {
                field: tier,
                reason: "endpoint cannot be empty".to_string(),
            });
        }
        if self.model.trim().is_empty() {
            return Err(DomainError::InvalidSetting {
                field: tier,
                reason: "model cannot be empty".to_string(),
            });
        }
        Ok(())
    }
}

/// Hosted (primary) tier settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostedSettings {
    pub generator: GeneratorSettings,
    /// Environment variable holding the API key (default: "GEMINI_API_KEY").
    pub api_key_env: String,
    /// Direct API key (not recommended; prefer the env var).
    pub api_key: Option<String>,
}

impl HostedSettings {
    /// Resolve the API key: explicit value first, then the environment.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var(&self.api_key_env).ok().filter(|k| !k.is_empty()))
    }
}

impl Default for HostedSettings {
    fn default() -> Self {
        Self {
            generator: GeneratorSettings::new(
                "https://generativelanguage.googleapis.com/v1beta",
                "gemini-2.0-flash",
            ),
            api_key_env: "GEMINI_API_KEY".to_string(),
            api_key: None,
        }
    }
}

/// Local (secondary) tier settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalSettings {
    pub generator: GeneratorSettings,
}

impl Default for LocalSettings {
    fn default() -> Self {
        Self {
            generator: GeneratorSettings::new("http://localhost:11434/api/generate", "llama3.2"),
        }
    }
}

/// Time limits applied to each network tier by the orchestrator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CascadeSettings {
    /// Limit for opening a tier and receiving its first chunk.
    pub first_chunk_timeout: Option<Duration>,
    /// Limit between two consecutive chunks once output has started.
    pub idle_timeout: Option<Duration>,
}

impl CascadeSettings {
    /// No time limits at all.
    pub fn unbounded() -> Self {
        Self {
            first_chunk_timeout: None,
            idle_timeout: None,
        }
    }
}

impl Default for CascadeSettings {
    fn default() -> Self {
        Self {
            first_chunk_timeout: Some(Duration::from_secs(30)),
            idle_timeout: Some(Duration::from_secs(60)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let hosted = HostedSettings::default();
        assert_eq!(hosted.generator.model, "gemini-2.0-flash");
        assert_eq!(hosted.generator.system_instruction, DEFAULT_SYSTEM_INSTRUCTION);

        let local = LocalSettings::default();
        assert_eq!(local.generator.endpoint, "http://localhost:11434/api/generate");

        let cascade = CascadeSettings::default();
        assert_eq!(cascade.first_chunk_timeout, Some(Duration::from_secs(30)));
        assert_eq!(CascadeSettings::unbounded().idle_timeout, None);
    }

    #[test]
    fn test_validate_rejects_blank_fields() {
        let settings = GeneratorSettings::new("", "m");
        assert!(matches!(
            settings.validate("secondary"),
            Err(DomainError::InvalidSetting { field: "secondary", .. })
        ));
        assert!(GeneratorSettings::new("http://x", " ").validate("primary").is_err());
        assert!(GeneratorSettings::new("http://x", "m").validate("primary").is_ok());
    }

    #[test]
    fn test_explicit_api_key_wins() {
        let settings = HostedSettings {
            api_key: Some("explicit".to_string()),
            api_key_env: "TIERED_TEST_KEY_THAT_IS_NOT_SET".to_string(),
            ..Default::default()
        };
        assert_eq!(settings.resolve_api_key(), Some("explicit".to_string()));
    }

    #[test]
    fn test_missing_api_key_resolves_to_none() {
        let settings = HostedSettings {
            api_key: Some(String::new()),
            api_key_env: "TIERED_TEST_KEY_THAT_IS_NOT_SET".to_string(),
            ..Default::default()
        };
        assert_eq!(settings.resolve_api_key(), None);
    }
}
