//! Message and Conversation domain types.
//!
//! `ContentPart` is what goes over the wire in a single turn; a
//! `ConversationMessage` is what the front end displays afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Who authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The claims staff member
    User,
    /// The remote assistant
    Model,
}

/// One unit of an outgoing turn.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    Text(TextPart),
    Document(DocumentPart),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextPart {
    pub text: String,
}

/// Base64 payload tagged with its media type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentPart {
    pub media_type: String,
    pub data: String,
}

impl ContentPart {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(TextPart { text: text.into() })
    }

    pub fn document(media_type: impl Into<String>, data: impl Into<String>) -> Self {
        Self::Document(DocumentPart {
            media_type: media_type.into(),
            data: data.into(),
        })
    }

    pub fn is_document(&self) -> bool {
        matches!(self, Self::Document(_))
    }
}

/// A single displayed message. Never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub id: String,
    pub role: Role,
    pub text: String,

    /// Names of the files attached to this turn
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attachments: Vec<String>,

    /// Set on model replies to turns that carried documents
    #[serde(default)]
    pub is_analysis: bool,

    pub timestamp: DateTime<Utc>,
}

impl ConversationMessage {
    /// Create a user message, recording attachment names.
    pub fn user(text: impl Into<String>, attachments: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: Role::User,
            text: text.into(),
            attachments,
            is_analysis: false,
            timestamp: Utc::now(),
        }
    }

    /// Create a model reply.
    pub fn model(text: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            role: Role::Model,
            text: text.into(),
            attachments: Vec::new(),
            is_analysis: false,
            timestamp: Utc::now(),
        }
    }

    pub fn with_analysis(mut self, is_analysis: bool) -> Self {
        self.is_analysis = is_analysis;
        self
    }
}

/// Append-only transcript. Display order equals conversational order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Conversation {
    messages: Vec<ConversationMessage>,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, message: ConversationMessage) {
        self.messages.push(message);
    }

    pub fn messages(&self) -> &[ConversationMessage] {
        &self.messages
    }

    pub fn last(&self) -> Option<&ConversationMessage> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
