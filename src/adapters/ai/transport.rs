//! HTTP plumbing shared by the provider adapters.

use std::future::Future;
use std::time::Duration;

use reqwest::Response;
use tokio::time::sleep;

use crate::ports::AIError;

/// Runs `attempt` until it succeeds, fails with a non-retryable error, or
/// `max_retries` retries have been spent. Delays double from `base_delay`.
pub(crate) async fn with_backoff<T, F, Fut>(
    max_retries: u32,
    base_delay: Duration,
    mut attempt: F,
) -> Result<T, AIError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, AIError>>,
{
    let mut retry_count = 0;
    loop {
        match attempt().await {
            Ok(value) => return Ok(value),
            Err(err) if err.is_retryable() && retry_count < max_retries => {
                let delay = base_delay * (1 << retry_count);
                tracing::warn!(error = %err, retry = retry_count + 1, ?delay, "Retrying AI request");
                sleep(delay).await;
                retry_count += 1;
            }
            Err(err) => return Err(err),
        }
    }
}

/// Maps a reqwest send failure onto the port's error type.
pub(crate) fn transport_error(err: reqwest::Error, timeout: Duration) -> AIError {
    if err.is_timeout() {
        AIError::Timeout {
            timeout_secs: timeout.as_secs() as u32,
        }
    } else if err.is_connect() {
        AIError::network(format!("Connection failed: {}", err))
    } else {
        AIError::network(err.to_string())
    }
}

/// Turns a non-success HTTP status into an `AIError`.
///
/// `context_markers` are substrings of a 400 body meaning the prompt was too long.
pub(crate) async fn check_status(
    response: Response,
    context_markers: &[&str],
    default_retry_after: u32,
) -> Result<Response, AIError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let error_body = response.text().await.unwrap_or_default();
    match status.as_u16() {
        401 | 403 => Err(AIError::AuthenticationFailed),
        429 => Err(AIError::rate_limited(parse_retry_after(&error_body, default_retry_after))),
        400 if context_markers.iter().any(|m| error_body.contains(m)) => {
            Err(AIError::context_too_long(0, 0))
        }
        400 => Err(AIError::InvalidRequest(error_body)),
        500..=599 => Err(AIError::unavailable(format!("Server error {}: {}", status, error_body))),
        _ => Err(AIError::network(format!("Unexpected status {}: {}", status, error_body))),
    }
}

/// Reads "try again in Ns" out of a provider error body.
pub(crate) fn parse_retry_after(error_body: &str, default: u32) -> u32 {
    let message = serde_json::from_str::<serde_json::Value>(error_body)
        .ok()
        .and_then(|v| v.get("error")?.get("message")?.as_str().map(str::to_string));

    message
        .as_deref()
        .and_then(|s| {
            let rest = &s[s.find("try again in ")? + "try again in ".len()..];
            let end = rest.find(|c: char| !c.is_ascii_digit()).unwrap_or(rest.len());
            rest[..end].parse::<u32>().ok()
        })
        .unwrap_or(default)
}

/// Estimated cost in cents given per-million-token prices in cents.
pub(crate) fn cost_cents(input_tokens: u32, output_tokens: u32, prices: (u64, u64)) -> u32 {
    let input = (input_tokens as u64 * prices.0) / 1_000_000;
    let output = (output_tokens as u64 * prices.1) / 1_000_000;
    (input + output) as u32
}
