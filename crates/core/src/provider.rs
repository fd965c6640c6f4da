//! Provider traits — the abstraction over remote conversational models.
//!
//! The core depends on exactly two calls:
//! - [`Provider::start_chat`] opens a session scoped to one system instruction;
//! - [`ChatSession::send`] submits one turn of ordered content parts.
//!
//! Implementations: Gemini REST, Anthropic Messages (see `claimconduit-providers`).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;
use crate::message::ContentPart;

/// Parameters fixed at session creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatConfig {
    /// The model to use (e.g., "gemini-3-pro-preview")
    pub model: String,

    /// Immutable for the session's lifetime
    pub system_instruction: String,

    /// Sampling temperature; provider default when absent
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Maximum tokens to generate per reply
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
}

/// Token usage information.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Usage {
    pub prompt_tokens: u32,
    pub completion_tokens: u32,
    pub total_tokens: u32,
}

/// The model's answer to one turn.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ChatReply {
    /// Reply text; `None` when the model produced no text
    pub text: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,

    /// Which model actually responded (may differ from requested)
    #[serde(default)]
    pub model: String,
}

impl ChatReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::default()
        }
    }
}

/// A stateful exchange with a remote model.
///
/// Implementations keep their own turn history. A failed `send` must not
/// record the turn, so the caller can retry it verbatim.
#[async_trait]
pub trait ChatSession: Send {
    /// Submit one user turn and wait for the reply.
    async fn send(&mut self, parts: Vec<ContentPart>) -> Result<ChatReply, ProviderError>;

    /// Number of completed turns held by this session.
    fn turns(&self) -> usize;
}

/// A remote model provider.
#[async_trait]
pub trait Provider: Send + Sync {
    /// A human-readable name for this provider (e.g., "gemini", "anthropic").
    fn name(&self) -> &str;

    /// Open a new session. Fails when the provider is unreachable or misconfigured.
    async fn start_chat(&self, config: ChatConfig) -> Result<Box<dyn ChatSession>, ProviderError>;

    /// Health check — can we reach the provider?
    async fn health_check(&self) -> Result<bool, ProviderError> {
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn chat_config_skips_unset_options() {
        let config = ChatConfig {
            model: "gemini-3-pro-preview".into(),
            system_instruction: "You are helpful".into(),
            temperature: None,
            max_tokens: None,
        };
        let json = serde_json::to_string(&config).unwrap();
        assert!(!json.contains("temperature"));
        assert!(!json.contains("max_tokens"));
    }

    #[test]
    fn reply_text_constructor() {
        let reply = ChatReply::text("Facts confirmed.");
        assert_eq!(reply.text.as_deref(), Some("Facts confirmed."));
        assert!(reply.usage.is_none());
    }
}
