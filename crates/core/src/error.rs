//! Error types for the ClaimConduit domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum.

use std::path::PathBuf;
use thiserror::Error;

/// Failures reported by a remote model provider.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Malformed provider response: {0}")]
    InvalidResponse(String),
}

/// Failures of the session lifecycle.
#[derive(Debug, Clone, Error)]
pub enum SessionError {
    /// The session could not be created (missing credential, provider unreachable).
    #[error("Could not start a session: {0}")]
    Initialization(ProviderError),

    /// A turn failed after the session existed. The session is left intact.
    #[error("Could not send the message: {0}")]
    Transmission(ProviderError),

    /// `send` was called before `initialize`.
    #[error("No active session; initialize before sending")]
    NotInitialized,
}

impl SessionError {
    /// Short, user-facing description of which stage failed.
    pub fn stage(&self) -> &'static str {
        match self {
            Self::Initialization(_) => "could not start",
            Self::Transmission(_) | Self::NotInitialized => "could not send",
        }
    }
}

/// Failures while encoding a local file.
#[derive(Debug, Error)]
pub enum AttachmentError {
    #[error("Failed to read {path}: {reason}")]
    Read { path: PathBuf, reason: String },
}

/// Failures while editing the claim context from text input.
#[derive(Debug, Clone, Error)]
pub enum ClaimError {
    #[error("Unknown claim field: {0}")]
    UnknownField(String),

    #[error("Unknown claim goal: {0}")]
    UnknownGoal(String),

    #[error("Unknown operating mode: {0}")]
    UnknownMode(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_error_displays_correctly() {
        let err = ProviderError::ApiError {
            status_code: 503,
            message: "Service unavailable".into(),
        };
        assert!(err.to_string().contains("503"));
        assert!(err.to_string().contains("Service unavailable"));
    }

    #[test]
    fn session_error_distinguishes_stage() {
        let init = SessionError::Initialization(ProviderError::NotConfigured("no key".into()));
        let send = SessionError::Transmission(ProviderError::Network("reset".into()));
        assert_eq!(init.stage(), "could not start");
        assert_eq!(send.stage(), "could not send");
        assert!(init.to_string().contains("no key"));
    }

    #[test]
    fn attachment_error_names_path() {
        let err = AttachmentError::Read {
            path: PathBuf::from("/claims/estimate.pdf"),
            reason: "permission denied".into(),
        };
        assert!(err.to_string().contains("estimate.pdf"));
        assert!(err.to_string().contains("permission denied"));
    }
}
