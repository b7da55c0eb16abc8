//! HTTP plumbing for the CDO web service: the [`HttpClient`] seam, the
//! token-header wrapper and a JSON request helper with retry and backoff.

pub mod auth;
mod basic;
mod client;
mod error;
mod retry;

pub use basic::BasicClient;
pub use client::HttpClient;
pub use error::FetchError;
pub use retry::RetryPolicy;

use reqwest::{Method, StatusCode, Url};
use serde_json::Value;
use tracing::{debug, warn};

/// Issues a GET and parses the JSON body, retrying transient failures.
///
/// Returns `Ok(None)` for `204 No Content` or a blank body. Once the attempt
/// ceiling is reached the last failure is returned to the caller.
pub async fn request_json<C: HttpClient + ?Sized>(
    client: &C,
    policy: &RetryPolicy,
    url: &Url,
) -> Result<Option<Value>, FetchError> {
    let mut last_err = None;

    for attempt in 1..=policy.max_attempts {
        match request_once(client, url).await {
            Ok(body) => return Ok(body),
            Err(e) if e.is_retryable() => {
                warn!(
                    attempt,
                    max_attempts = policy.max_attempts,
                    path = url.path(),
                    error = %e,
                    "Upstream request failed"
                );
                last_err = Some(e);
                if attempt < policy.max_attempts {
                    let delay = policy.delay_for(attempt);
                    debug!(delay_ms = delay.as_millis() as u64, "Backing off before retry");
                    tokio::time::sleep(delay).await;
                }
            }
            Err(e) => return Err(e),
        }
    }

    Err(last_err.unwrap_or_else(|| FetchError::NoAttempt {
        url: url.to_string(),
    }))
}

async fn request_once<C: HttpClient + ?Sized>(
    client: &C,
    url: &Url,
) -> Result<Option<Value>, FetchError> {
    let req = reqwest::Request::new(Method::GET, url.clone());
    let resp = client.execute(req).await?;

    let status = resp.status();
    if status == StatusCode::TOO_MANY_REQUESTS {
        return Err(FetchError::RateLimited);
    }
    if !status.is_success() {
        return Err(FetchError::Status { status });
    }
    if status == StatusCode::NO_CONTENT {
        return Ok(None);
    }

    let body = resp.text().await?;
    if body.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(&body)?))
}
