//! Google Gemini provider over the Generative Language REST API.
//!
//! - `x-goog-api-key` header authentication
//! - System instruction as the top-level `systemInstruction` content
//! - Documents sent inline as base64 `inlineData` parts
//!
//! The REST endpoint is stateless, so [`GeminiChat`] keeps the turn history
//! client-side and replays it on every `generateContent` call.

use async_trait::async_trait;
use claimconduit_core::message::ContentPart;
use claimconduit_core::provider::{ChatConfig, ChatReply, ChatSession, Provider, Usage};
use claimconduit_core::ProviderError;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::http;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Gemini `generateContent` provider.
pub struct GeminiProvider {
    name: String,
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

impl GeminiProvider {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            name: "gemini".into(),
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

    fn ensure_key(&self) -> Result<(), ProviderError> {
        if self.api_key.trim().is_empty() {
            return Err(ProviderError::NotConfigured(
                "Gemini API key is not set (CLAIMCONDUIT_API_KEY, GEMINI_API_KEY or API_KEY)".into(),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl Provider for GeminiProvider {
    fn name(&self) -> &str {
        &self.name
    }

    /// Sessions are client-side; nothing goes over the wire until the first turn.
    async fn start_chat(&self, config: ChatConfig) -> Result<Box<dyn ChatSession>, ProviderError> {
        self.ensure_key()?;
        debug!(provider = "gemini", model = %config.model, "Chat session created");

        Ok(Box::new(GeminiChat {
            client: self.client.clone(),
            url: format!("{}/models/{}:generateContent", self.base_url, config.model),
            api_key: self.api_key.clone(),
            system_instruction: Content::system(&config.system_instruction),
            generation_config: GenerationConfig::from_chat(&config),
            model: config.model,
            history: Vec::new(),
        }))
    }

    async fn health_check(&self) -> Result<bool, ProviderError> {
        self.ensure_key()?;
        let response = self
            .client
            .get(format!("{}/models", self.base_url))
            .header("x-goog-api-key", &self.api_key)
            .send()
            .await
            .map_err(|e| http::transport_error("gemini", e))?;

        Ok(response.status().is_success())
    }
}

/// One Gemini conversation.
pub struct GeminiChat {
    client: reqwest::Client,
    url: String,
    api_key: String,
    model: String,
    system_instruction: Content,
    generation_config: Option<GenerationConfig>,
    history: Vec<Content>,
}

impl GeminiChat {
    fn build_request<'a>(&'a self, turn: &'a Content) -> GenerateContentRequest<'a> {
        GenerateContentRequest {
            contents: self.history.iter().chain(std::iter::once(turn)).collect(),
            system_instruction: &self.system_instruction,
            generation_config: self.generation_config.as_ref(),
        }
    }

    /// Remember an answered exchange. An unanswered user turn is dropped so
    /// `contents` keeps alternating user/model.
    fn record(&mut self, turn: Content, model_turn: Option<Content>) {
        if let Some(content) = model_turn {
            self.history.push(turn);
            self.history.push(content);
        }
    }
}

#[async_trait]
impl ChatSession for GeminiChat {
    async fn send(&mut self, parts: Vec<ContentPart>) -> Result<ChatReply, ProviderError> {
        let turn = Content::user(parts);
        let body = self.build_request(&turn);

        debug!(
            provider = "gemini",
            model = %self.model,
            history = self.history.len(),
            parts = turn.parts.len(),
            "Sending generateContent request"
        );

        let response = self
            .client
            .post(&self.url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| http::transport_error("gemini", e))?;

        let status = response.status().as_u16();
        if !response.status().is_success() {
            let headers = response.headers().clone();
            let body = response.text().await.unwrap_or_default();
            return Err(http::status_error(
                "gemini",
                status,
                &headers,
                error_message(&body),
            ));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::InvalidResponse(format!("Gemini response: {e}")))?;

        let (reply, model_turn) = into_reply(parsed, &self.model);
        self.record(turn, model_turn);
        Ok(reply)
    }

    fn turns(&self) -> usize {
        self.history.iter().filter(|c| c.role.as_deref() == Some("user")).count()
    }
}

/// Split a response into the caller's reply and the model turn to remember.
fn into_reply(response: GenerateContentResponse, requested_model: &str) -> (ChatReply, Option<Content>) {
    let content = response
        .candidates
        .unwrap_or_default()
        .into_iter()
        .next()
        .and_then(|c| c.content);

    let texts: Vec<String> = content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    let text = (!texts.is_empty()).then(|| texts.concat());
    let model_turn = text.as_ref().map(|t| Content {
        role: Some("model".into()),
        parts: vec![Part::Text { text: t.clone() }],
    });

    let usage = response.usage_metadata.map(|u| Usage {
        prompt_tokens: u.prompt_token_count,
        completion_tokens: u.candidates_token_count,
        total_tokens: u.total_token_count,
    });

    let reply = ChatReply {
        text,
        usage,
        model: response
            .model_version
            .unwrap_or_else(|| requested_model.to_string()),
    };
    (reply, model_turn)
}

/// Pull `status: message` out of a Gemini error envelope, or return the raw body.
fn error_message(body: &str) -> String {
    serde_json::from_str::<ErrorWrapper>(body)
        .ok()
        .and_then(|w| {
            let message = w.error.message?;
            Some(match w.error.status {
                Some(status) if !status.is_empty() => format!("{status}: {message}"),
                _ => message,
            })
        })
        .unwrap_or_else(|| body.to_string())
}

// --- Gemini API types ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<&'a Content>,
    system_instruction: &'a Content,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<&'a GenerationConfig>,
}

#[derive(Debug, Clone, Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<Part>,
}

impl Content {
    fn system(text: &str) -> Self {
        Self {
            role: None,
            parts: vec![Part::Text { text: text.into() }],
        }
    }

    fn user(parts: Vec<ContentPart>) -> Self {
        let has_documents = parts.iter().any(ContentPart::is_document);
        let parts = parts
            .into_iter()
            .filter_map(|part| match part {
                // Gemini rejects empty text parts
                ContentPart::Text(t) if t.text.is_empty() && has_documents => None,
                ContentPart::Text(t) => Some(Part::Text { text: t.text }),
                ContentPart::Document(d) => Some(Part::InlineData {
                    inline_data: InlineDataPayload {
                        mime_type: d.media_type,
                        data: d.data,
                    },
                }),
            })
            .collect();
        Self {
            role: Some("user".into()),
            parts,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: InlineDataPayload,
    },
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineDataPayload {
    mime_type: String,
    data: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
}

impl GenerationConfig {
    fn from_chat(config: &ChatConfig) -> Option<Self> {
        if config.temperature.is_none() && config.max_tokens.is_none() {
            return None;
        }
        Some(Self {
            temperature: config.temperature,
            max_output_tokens: config.max_tokens,
        })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
    usage_metadata: Option<UsageMetadata>,
    model_version: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<ContentResponse>,
}

#[derive(Debug, Deserialize)]
struct ContentResponse {
    #[serde(default)]
    parts: Vec<PartResponse>,
}

#[derive(Debug, Deserialize)]
struct PartResponse {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct UsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
    #[serde(default)]
    total_token_count: u32,
}

#[derive(Debug, Deserialize)]
struct ErrorWrapper {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
    status: Option<String>,
}
