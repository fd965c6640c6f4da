//! # ClaimConduit Core
//!
//! Domain types, traits, and error definitions for the ClaimConduit claims
//! assistant. This crate has no HTTP or CLI dependencies: it turns an
//! operating mode, claim metadata, user text and attached documents into a
//! well-formed turn for a remote conversational model, and turns the reply
//! back into conversation state.
//!
//! ## Layout
//!
//! - [`claim`] / [`mode`] — the user-editable claim context
//! - [`prompt`] — system instruction assembly
//! - [`attachment`] — file encoding into transport-safe payloads
//! - [`provider`] — the two-call provider contract (start chat, send turn)
//! - [`session`] — the session lifecycle state machine
//! - [`chat`] — the front-end facing controller (`on_mode_change` / `on_send`)

pub mod attachment;
pub mod chat;
pub mod claim;
pub mod error;
pub mod message;
pub mod mode;
pub mod prompt;
pub mod provider;
pub mod session;

#[cfg(test)]
pub(crate) mod test_helpers;

// Re-export key types at crate root for ergonomics
pub use attachment::{PendingFile, encode_bytes, encode_file, encode_files};
pub use chat::{ClaimChat, ERROR_FALLBACK, Exchange, MetadataPolicy, NO_RESPONSE_FALLBACK, QuickStart};
pub use claim::{ClaimField, ClaimGoal, ClaimMetadata};
pub use error::{AttachmentError, ClaimError, ProviderError, SessionError};
pub use message::{ContentPart, Conversation, ConversationMessage, Role};
pub use mode::OperatingMode;
pub use prompt::{Persona, PromptTemplate, compose_system_instruction};
pub use provider::{ChatConfig, ChatReply, ChatSession, Provider, Usage};
pub use session::{DEFAULT_MODEL, SessionManager, SessionSettings, SessionState};
