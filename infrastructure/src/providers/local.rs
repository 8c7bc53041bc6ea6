//! Secondary tier: a locally hosted model server.
//!
//! The server accepts `POST {endpoint}` with a JSON body and answers with a
//! chunked stream of newline-delimited JSON objects:
//!
//! ```text
//! {"model":"llama3.2","response":"Hol","done":false}
//! {"model":"llama3.2","response":"a!","done":false}
//! {"model":"llama3.2","response":"","done":true,"total_duration":1234}
//! ```

use super::line_stream::{LineOutcome, ProtocolError, line_chunks};
use super::{build_client, check_status, transport_error};
use async_trait::async_trait;
use serde::Serialize;
use tiered_application::{ChunkStream, GeneratorError, TextGenerator};
use tiered_domain::LocalSettings;
use tracing::debug;

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    system: &'a str,
    stream: bool,
}

/// Streaming client for the local model server.
pub struct LocalGenerator {
    client: reqwest::Client,
    settings: LocalSettings,
}

impl LocalGenerator {
    pub fn new(settings: LocalSettings) -> Result<Self, GeneratorError> {
        Ok(Self {
            client: build_client()?,
            settings,
        })
    }

    pub fn settings(&self) -> &LocalSettings {
        &self.settings
    }
}

/// Interpret one NDJSON line from the local server.
pub fn parse_generate_line(line: &str) -> Result<LineOutcome, ProtocolError> {
    let value: serde_json::Value =
        serde_json::from_str(line).map_err(|e| ProtocolError::InvalidJson {
            line: line.to_string(),
            error: e.to_string(),
        })?;

    Ok(LineOutcome {
        chunk: value
            .get("response")
            .and_then(|v| v.as_str())
            .map(str::to_string),
        error: value
            .get("error")
            .and_then(|v| v.as_str())
            .map(str::to_string),
        done: value.get("done").and_then(|v| v.as_bool()).unwrap_or(false),
    })
}

#[async_trait]
impl TextGenerator for LocalGenerator {
    fn name(&self) -> &str {
        "local"
    }

    async fn generate(&self, prompt: &str) -> Result<ChunkStream, GeneratorError> {
        let generator = &self.settings.generator;
        let request = GenerateRequest {
            model: &generator.model,
            prompt,
            system: &generator.system_instruction,
            stream: true,
        };

        debug!(
            "local: POST {} (model: {})",
            generator.endpoint, generator.model
        );

        let response = self
            .client
            .post(&generator.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;
        let response = check_status(response).await?;

        Ok(line_chunks(
            "local",
            response.bytes_stream(),
            parse_generate_line,
        ))
    }
}
