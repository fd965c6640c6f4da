//! Anthropic native provider implementation.
//!
//! Uses Anthropic's Messages API directly.
//!
//! Features:
//! - `x-api-key` header authentication (not Bearer)
//! - `anthropic-version` header
//! - System prompt as top-level field
//! - PDFs as base64 `document` content blocks

use async_trait::async_trait;
use claimconduit_core::message::ContentPart;
use claimconduit_core::provider::{ChatConfig, ChatReply, ChatSession, Provider, Usage};
use claimconduit_core::ProviderError;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::http;

const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_BASE_URL: &str = "https://api.anthropic.com";
const DEFAULT_MAX_TOKENS: u32 = 4096;

/// Anthropic native Messages API provider.
pub struct AnthropicProvider {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl AnthropicProvider {
    /// Create a new Anthropic provider.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            name: "anthropic".into(),
            base_url: DEFAULT_BASE_URL.into(),
            api_key: api_key.into(),
            client: http::client(),
        }
    }

    /// Create with a custom base URL (e.g., for testing or proxies).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// Convert one outgoing turn into content blocks.
    fn to_blocks(parts: Vec<ContentPart>) -> Vec<ContentBlock> {
        let has_documents = parts.iter().any(ContentPart::is_document);
        parts
            .into_iter()
            .filter_map(|part| match part {
                ContentPart::Text(t) if t.text.is_empty() && has_documents => None,
                ContentPart::Text(t) => Some(ContentBlock::Text { text: t.text }),
                ContentPart::Document(d) => Some(ContentBlock::Document {
                    source: DocumentSource {
                        kind: "base64".into(),
                        media_type: d.media_type,
                        data: d.data,
                    },
                }),
            })
            .collect()
    }
}

#[async_trait]
impl Provider for AnthropicProvider {
    fn name(&self) -> &str {
        &self.name
    }

    async fn start_chat(&self, config: ChatConfig) -> Result<Box<dyn ChatSession>, ProviderError> {
        if self.api_key.trim().is_empty() {
            return Err(ProviderError::NotConfigured(
                "Anthropic API key is not set".into(),
            ));
        }

        Ok(Box::new(AnthropicChat {
            client: self.client.clone(),
            url: format!("{}/v1/messages", self.base_url),
            api_key: self.api_key.clone(),
            config,
            history: Vec::new(),
        }))
    }

    async fn health_check(&self) -> Result<bool, ProviderError> {
        // Try a minimal request to verify API key
        let url = format!("{}/v1/messages", self.base_url);
        let body = serde_json::json!({
            "model": "claude-3-5-haiku-20241022",
            "messages": [{"role": "user", "content": "hi"}],
            "max_tokens": 1,
        });

        let response = self
            .client
            .post(&url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| http::transport_error("anthropic", e))?;

        // 200 = works, 401 = bad key, anything else = reachable but error
        Ok(response.status().is_success() || response.status().as_u16() != 401)
    }
}

/// One Messages API conversation; history lives client-side.
pub struct AnthropicChat {
    client: reqwest::Client,
    url: String,
    api_key: String,
    config: ChatConfig,
    history: Vec<AnthropicMessage>,
}

impl AnthropicChat {
    fn build_body(&self, turn: &AnthropicMessage) -> serde_json::Value {
        let messages: Vec<&AnthropicMessage> =
            self.history.iter().chain(std::iter::once(turn)).collect();

        let mut body = serde_json::json!({
            "model": self.config.model,
            "system": self.config.system_instruction,
            "messages": messages,
            "max_tokens": self.config.max_tokens.unwrap_or(DEFAULT_MAX_TOKENS),
        });

        if let Some(temperature) = self.config.temperature {
            body["temperature"] = serde_json::json!(temperature);
        }

        body
    }

    /// Remember an answered exchange; an unanswered user turn is dropped so
    /// messages keep alternating.
    fn record(&mut self, turn: AnthropicMessage, reply: &ChatReply) {
        if let Some(text) = &reply.text {
            self.history.push(turn);
            self.history.push(AnthropicMessage {
                role: "assistant".into(),
                content: vec![ContentBlock::Text { text: text.clone() }],
            });
        }
    }
}

#[async_trait]
impl ChatSession for AnthropicChat {
    async fn send(&mut self, parts: Vec<ContentPart>) -> Result<ChatReply, ProviderError> {
        let turn = AnthropicMessage {
            role: "user".into(),
            content: AnthropicProvider::to_blocks(parts),
        };
        let body = self.build_body(&turn);

        debug!(provider = "anthropic", model = %self.config.model, "Sending messages request");

        let response = self
            .client
            .post(&self.url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("Content-Type", "application/json")
            .json(&body)
            .send()
            .await
            .map_err(|e| http::transport_error("anthropic", e))?;

        let status = response.status().as_u16();
        if status != 200 {
            let headers = response.headers().clone();
            let error_body = response.text().await.unwrap_or_default();
            return Err(http::status_error("anthropic", status, &headers, error_body));
        }

        let api_resp: AnthropicResponse = response.json().await.map_err(|e| {
            ProviderError::InvalidResponse(format!("Failed to parse Anthropic response: {e}"))
        })?;

        let reply = response_to_reply(api_resp);
        self.record(turn, &reply);
        Ok(reply)
    }

    fn turns(&self) -> usize {
        self.history.iter().filter(|m| m.role == "user").count()
    }
}

/// Convert an Anthropic API response into a reply.
fn response_to_reply(resp: AnthropicResponse) -> ChatReply {
    let text = resp
        .content
        .iter()
        .filter_map(|block| match block {
            ResponseContentBlock::Text { text } => Some(text.as_str()),
            ResponseContentBlock::Other => None,
        })
        .collect::<Vec<_>>()
        .join("\n");

    ChatReply {
        text: (!text.is_empty()).then_some(text),
        usage: Some(Usage {
            prompt_tokens: resp.usage.input_tokens,
            completion_tokens: resp.usage.output_tokens,
            total_tokens: resp.usage.input_tokens + resp.usage.output_tokens,
        }),
        model: resp.model,
    }
}

// --- Anthropic API types ---

#[derive(Debug, Serialize)]
struct AnthropicMessage {
    role: String,
    content: Vec<ContentBlock>,
}

#[derive(Debug, Serialize)]
#[serde(tag = "type")]
enum ContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(rename = "document")]
    Document { source: DocumentSource },
}

#[derive(Debug, Serialize)]
struct DocumentSource {
    #[serde(rename = "type")]
    kind: String,
    media_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    model: String,
    content: Vec<ResponseContentBlock>,
    usage: AnthropicUsage,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum ResponseContentBlock {
    #[serde(rename = "text")]
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct AnthropicUsage {
    input_tokens: u32,
    output_tokens: u32,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chat_config() -> ChatConfig {
        ChatConfig {
            model: "claude-sonnet-4-20250514".into(),
            system_instruction: "You are Megan".into(),
            temperature: None,
            max_tokens: None,
        }
    }

    fn chat() -> AnthropicChat {
        AnthropicChat {
            client: reqwest::Client::new(),
            url: String::new(),
            api_key: "sk-ant-test".into(),
            config: chat_config(),
            history: Vec::new(),
        }
    }

    fn user(text: &str) -> AnthropicMessage {
        AnthropicMessage {
            role: "user".into(),
            content: AnthropicProvider::to_blocks(vec![ContentPart::text(text)]),
        }
    }

    fn reply(text: Option<&str>) -> ChatReply {
        ChatReply {
            text: text.map(str::to_string),
            usage: None,
            model: "claude-sonnet-4-20250514".into(),
        }
    }

    #[test]
    fn empty_reply_keeps_roles_alternating() {
        let mut chat = chat();
        chat.record(user("first"), &reply(None));
        chat.record(user("second"), &reply(Some("noted")));
        assert_eq!(chat.turns(), 1);

        let body = chat.build_body(&user("third"));
        let roles: Vec<&str> = body["messages"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["role"].as_str().unwrap())
            .collect();
        assert_eq!(roles, vec!["user", "assistant", "user"]);
    }

    #[test]
    fn constructor() {
        let provider = AnthropicProvider::new("sk-ant-test");
        assert_eq!(provider.name(), "anthropic");
        assert_eq!(provider.base_url, DEFAULT_BASE_URL);
    }

    #[test]
    fn constructor_with_base_url() {
        let provider =
            AnthropicProvider::new("sk-ant-test").with_base_url("https://custom.proxy.com/");
        assert_eq!(provider.base_url, "https://custom.proxy.com");
    }

    #[tokio::test]
    async fn empty_key_is_not_configured() {
        let err = AnthropicProvider::new("")
            .start_chat(chat_config())
            .await
            .err()
            .unwrap();
        assert!(matches!(err, ProviderError::NotConfigured(_)));
    }

    #[test]
    fn document_blocks_follow_text() {
        let blocks = AnthropicProvider::to_blocks(vec![
            ContentPart::text("What is missing?"),
            ContentPart::document("application/pdf", "JVBERi0="),
        ]);
        let json = serde_json::to_value(&blocks).unwrap();
        assert_eq!(json[0]["type"], "text");
        assert_eq!(json[1]["type"], "document");
        assert_eq!(json[1]["source"]["type"], "base64");
        assert_eq!(json[1]["source"]["media_type"], "application/pdf");
        assert_eq!(json[1]["source"]["data"], "JVBERi0=");
    }

    #[test]
    fn body_carries_system_and_defaults() {
        let chat = chat();
        let turn = AnthropicMessage {
            role: "user".into(),
            content: AnthropicProvider::to_blocks(vec![ContentPart::text("hi")]),
        };
        let body = chat.build_body(&turn);
        assert_eq!(body["system"], "You are Megan");
        assert_eq!(body["max_tokens"], DEFAULT_MAX_TOKENS);
        assert!(body.get("temperature").is_none());
        assert_eq!(body["messages"][0]["role"], "user");
    }

    #[test]
    fn response_text_blocks_joined() {
        let resp: AnthropicResponse = serde_json::from_str(
            r#"{
                "id": "msg_1",
                "model": "claude-sonnet-4-20250514",
                "content": [
                    {"type": "thinking", "thinking": "..."},
                    {"type": "text", "text": "Line one"},
                    {"type": "text", "text": "Line two"}
                ],
                "usage": {"input_tokens": 40, "output_tokens": 8}
            }"#,
        )
        .unwrap();

        let reply = response_to_reply(resp);
        assert_eq!(reply.text.as_deref(), Some("Line one\nLine two"));
        assert_eq!(reply.usage.unwrap().total_tokens, 48);
    }

    #[test]
    fn empty_content_has_no_text() {
        let resp: AnthropicResponse = serde_json::from_str(
            r#"{"model": "m", "content": [], "usage": {"input_tokens": 1, "output_tokens": 0}}"#,
        )
        .unwrap();
        assert!(response_to_reply(resp).text.is_none());
    }
}
