//! Network generation tiers.
//!
//! - [`hosted::HostedGenerator`]: primary tier, hosted service over server-sent events
//! - [`local::LocalGenerator`]: secondary tier, local service over newline-delimited JSON
//! - [`line_stream`]: shared framing of streamed bodies into lines

pub mod hosted;
pub mod line_stream;
pub mod local;

#[cfg(test)]
pub(crate) mod test_server;

use std::time::Duration;
use tiered_application::GeneratorError;

/// Limit for establishing the TCP/TLS connection to a tier.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Build the HTTP client shared by a tier's requests.
pub(crate) fn build_client() -> Result<reqwest::Client, GeneratorError> {
    reqwest::Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .build()
        .map_err(|e| GeneratorError::Transport(format!("Failed to build HTTP client: {}", e)))
}

/// Map a request error to a generator error.
pub(crate) fn transport_error(error: reqwest::Error) -> GeneratorError {
    if error.is_timeout() {
        GeneratorError::Timeout
    } else {
        GeneratorError::Transport(error.to_string())
    }
}

/// Turn a non-2xx response into an error, keeping the start of its body.
pub(crate) async fn check_status(
    response: reqwest::Response,
) -> Result<reqwest::Response, GeneratorError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message: String = body.chars().take(500).collect();

    match status.as_u16() {
        401 | 403 => Err(GeneratorError::Auth(format!(
            "HTTP {}: {}",
            status.as_u16(),
            message
        ))),
        code => Err(GeneratorError::Service {
            status: code,
            message,
        }),
    }
}
