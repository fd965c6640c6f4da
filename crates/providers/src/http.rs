//! HTTP plumbing shared by the REST providers.

use std::time::Duration;

use claimconduit_core::ProviderError;
use reqwest::header::HeaderMap;
use tracing::warn;

/// Connect and overall request ceiling. Session-level timeouts are shorter.
const CLIENT_TIMEOUT: Duration = Duration::from_secs(300);

/// Retry hint when the provider sends no `retry-after` header.
const DEFAULT_RETRY_AFTER_SECS: u64 = 5;

pub(crate) fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .timeout(CLIENT_TIMEOUT)
        .build()
        .unwrap_or_default()
}

/// Map a transport failure.
pub(crate) fn transport_error(provider: &str, err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Timeout(format!("{provider}: {err}"))
    } else {
        ProviderError::Network(err.to_string())
    }
}

/// Map a non-success status. `message` is the provider's error text.
pub(crate) fn status_error(
    provider: &str,
    status: u16,
    headers: &HeaderMap,
    message: String,
) -> ProviderError {
    match status {
        429 => ProviderError::RateLimited {
            retry_after_secs: retry_after(headers).unwrap_or(DEFAULT_RETRY_AFTER_SECS),
        },
        401 | 403 => ProviderError::AuthenticationFailed(format!("{provider}: {message}")),
        _ => {
            warn!(provider, status, body = %message, "Provider API error");
            ProviderError::ApiError {
                status_code: status,
                message,
            }
        }
    }
}

fn retry_after(headers: &HeaderMap) -> Option<u64> {
    headers
        .get(reqwest::header::RETRY_AFTER)?
        .to_str()
        .ok()?
        .trim()
        .parse()
        .ok()
}
