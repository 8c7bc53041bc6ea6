//! Primary tier: hosted generation service streaming server-sent events.
//!
//! Request: `POST {endpoint}/models/{model}:streamGenerateContent?alt=sse`
//! with the key in the `x-goog-api-key` header. Each event line carries one
//! partial response:
//!
//! ```text
//! data: {"candidates":[{"content":{"parts":[{"text":"Hola"}],"role":"model"}}]}
//! ```

use super::line_stream::{LineOutcome, ProtocolError, line_chunks};
use super::{build_client, check_status, transport_error};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tiered_application::{ChunkStream, GeneratorError, TextGenerator};
use tiered_domain::HostedSettings;
use tracing::debug;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct StreamRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct StreamEvent {
    #[serde(default)]
    candidates: Vec<Candidate>,
    error: Option<EventError>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EventError {
    message: String,
}

/// Streaming client for the hosted service.
pub struct HostedGenerator {
    client: reqwest::Client,
    settings: HostedSettings,
}

impl HostedGenerator {
    pub fn new(settings: HostedSettings) -> Result<Self, GeneratorError> {
        Ok(Self {
            client: build_client()?,
            settings,
        })
    }

    fn stream_url(&self) -> String {
        let generator = &self.settings.generator;
        format!(
            "{}/models/{}:streamGenerateContent?alt=sse",
            generator.endpoint.trim_end_matches('/'),
            generator.model
        )
    }
}

/// Interpret one line of the event stream.
///
/// Only `data:` lines matter; comments, `event:` and `id:` fields are skipped.
pub fn parse_sse_line(line: &str) -> Result<LineOutcome, ProtocolError> {
    let Some(data) = line.strip_prefix("data:") else {
        return Ok(LineOutcome::skip());
    };
    let data = data.trim();
    if data == "[DONE]" {
        return Ok(LineOutcome::done());
    }

    let event: StreamEvent =
        serde_json::from_str(data).map_err(|e| ProtocolError::InvalidJson {
            line: line.to_string(),
            error: e.to_string(),
        })?;

    if let Some(error) = event.error {
        return Ok(LineOutcome {
            error: Some(error.message),
            ..LineOutcome::skip()
        });
    }

    let text: String = event
        .candidates
        .into_iter()
        .take(1)
        .filter_map(|c| c.content)
        .flat_map(|c| c.parts)
        .filter_map(|p| p.text)
        .collect();

    Ok(if text.is_empty() {
        LineOutcome::skip()
    } else {
        LineOutcome::chunk(text)
    })
}

#[async_trait]
impl TextGenerator for HostedGenerator {
    fn name(&self) -> &str {
        "hosted"
    }

    async fn generate(&self, prompt: &str) -> Result<ChunkStream, GeneratorError> {
        let api_key = self.settings.resolve_api_key().ok_or_else(|| {
            GeneratorError::Auth(format!(
                "No API key configured (set {} or primary.api_key)",
                self.settings.api_key_env
            ))
        })?;

        let request = StreamRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part {
                    text: &self.settings.generator.system_instruction,
                }],
            },
            contents: vec![Content {
                role: Some("user"),
                parts: vec![Part { text: prompt }],
            }],
        };

        let url = self.stream_url();
        debug!("hosted: POST {}", url);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;
        let response = check_status(response).await?;

        Ok(line_chunks("hosted", response.bytes_stream(), parse_sse_line))
    }
}
