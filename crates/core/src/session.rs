//! Session lifecycle — one conversation with the remote model at a time.
//!
//! ```text
//!  Uninitialized ──initialize──▶ Ready ──send──▶ Sending ──reply/error──▶ Ready
//!        ▲                         │
//!        └──── mode change / invalidate
//! ```
//!
//! `send` in `Uninitialized` fails with [`SessionError::NotInitialized`].
//! The manager never detects metadata drift on its own; callers decide when
//! to re-initialize (see [`crate::chat::MetadataPolicy`]).
//!
//! Calls take `&mut self`, so at most one `initialize` or `send` is
//! outstanding per manager.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::attachment::PendingFile;
use crate::claim::ClaimMetadata;
use crate::error::{ProviderError, SessionError};
use crate::message::ContentPart;
use crate::mode::OperatingMode;
use crate::prompt::PromptTemplate;
use crate::provider::{ChatConfig, ChatSession, Provider};

/// Media type attached to every document part.
pub const DOCUMENT_MEDIA_TYPE: &str = "application/pdf";

/// Default model when none is configured.
pub const DEFAULT_MODEL: &str = "gemini-3-pro-preview";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Uninitialized,
    Ready,
    Sending,
}

/// Model parameters applied to every session the manager opens.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSettings {
    pub model: String,
    pub temperature: Option<f32>,
    pub max_tokens: Option<u32>,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            model: DEFAULT_MODEL.into(),
            temperature: None,
            max_tokens: None,
        }
    }
}

struct ActiveSession {
    handle: Box<dyn ChatSession>,
    mode: OperatingMode,
    instruction: String,
}

/// Owns the single session handle and its system instruction.
pub struct SessionManager {
    provider: Arc<dyn Provider>,
    template: PromptTemplate,
    settings: SessionSettings,
    timeout: Option<Duration>,
    active: Option<ActiveSession>,
    busy: watch::Sender<bool>,
    initializations: usize,
}

impl SessionManager {
    pub fn new(provider: Arc<dyn Provider>, settings: SessionSettings) -> Self {
        let (busy, _) = watch::channel(false);
        Self {
            provider,
            template: PromptTemplate::default(),
            settings,
            timeout: None,
            active: None,
            busy,
            initializations: 0,
        }
    }

    pub fn with_template(mut self, template: PromptTemplate) -> Self {
        self.template = template;
        self
    }

    /// Bound each `send`; expiry is reported as a transmission failure.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn template(&self) -> &PromptTemplate {
        &self.template
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn state(&self) -> SessionState {
        match (&self.active, *self.busy.borrow()) {
            (None, _) => SessionState::Uninitialized,
            (Some(_), true) => SessionState::Sending,
            (Some(_), false) => SessionState::Ready,
        }
    }

    pub fn is_ready(&self) -> bool {
        self.active.is_some()
    }

    /// `true` while an `initialize` or `send` is outstanding.
    pub fn subscribe_busy(&self) -> watch::Receiver<bool> {
        self.busy.subscribe()
    }

    /// The system instruction of the live session.
    pub fn instruction(&self) -> Option<&str> {
        self.active.as_ref().map(|a| a.instruction.as_str())
    }

    /// The mode the live session was opened with.
    pub fn mode(&self) -> Option<OperatingMode> {
        self.active.as_ref().map(|a| a.mode)
    }

    /// Completed turns in the live session.
    pub fn turns(&self) -> usize {
        self.active.as_ref().map(|a| a.handle.turns()).unwrap_or(0)
    }

    /// How many sessions this manager has opened.
    pub fn initializations(&self) -> usize {
        self.initializations
    }

    /// Open a fresh session for `mode` and `metadata`, replacing any live one.
    ///
    /// On failure the previous session, if any, is left untouched.
    pub async fn initialize(
        &mut self,
        mode: OperatingMode,
        metadata: &ClaimMetadata,
    ) -> Result<(), SessionError> {
        let instruction = self.template.compose(mode, metadata);
        let config = ChatConfig {
            model: self.settings.model.clone(),
            system_instruction: instruction.clone(),
            temperature: self.settings.temperature,
            max_tokens: self.settings.max_tokens,
        };

        info!(
            provider = self.provider.name(),
            model = %self.settings.model,
            mode = mode.id(),
            "Opening session"
        );

        let _busy = BusyGuard::raise(&self.busy);
        let handle = self.provider.start_chat(config).await.map_err(|e| {
            warn!(provider = self.provider.name(), error = %e, "Session initialization failed");
            SessionError::Initialization(e)
        })?;

        self.active = Some(ActiveSession {
            handle,
            mode,
            instruction,
        });
        self.initializations += 1;
        Ok(())
    }

    /// Submit one turn. Returns the reply text, or `None` when the model
    /// produced no text.
    ///
    /// A failed send leaves the session intact for a retry.
    pub async fn send(
        &mut self,
        text: &str,
        files: &[PendingFile],
    ) -> Result<Option<String>, SessionError> {
        let active = self.active.as_mut().ok_or(SessionError::NotInitialized)?;
        let parts = compose_parts(text, files);

        debug!(
            provider = self.provider.name(),
            parts = parts.len(),
            documents = files.len(),
            "Sending turn"
        );

        let _busy = BusyGuard::raise(&self.busy);
        let result = match self.timeout {
            Some(limit) => tokio::time::timeout(limit, active.handle.send(parts))
                .await
                .unwrap_or_else(|_| {
                    Err(ProviderError::Timeout(format!("no reply within {limit:?}")))
                }),
            None => active.handle.send(parts).await,
        };

        let reply = result.map_err(|e| {
            warn!(provider = self.provider.name(), error = %e, "Turn failed");
            SessionError::Transmission(e)
        })?;

        if let Some(usage) = reply.usage {
            debug!(
                model = %reply.model,
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "Reply received"
            );
        }

        Ok(reply.text.filter(|t| !t.trim().is_empty()))
    }

    /// Discard the session if it was opened for a different mode.
    /// Returns whether the session was discarded.
    pub fn on_mode_change(&mut self, mode: OperatingMode) -> bool {
        match self.mode() {
            Some(current) if current != mode => {
                info!(from = current.id(), to = mode.id(), "Mode changed, discarding session");
                self.invalidate();
                true
            }
            _ => false,
        }
    }

    /// Drop the live session. The next send needs a fresh `initialize`.
    pub fn invalidate(&mut self) {
        if self.active.take().is_some() {
            debug!("Session discarded");
        }
    }
}

/// Text first, then one document part per file.
pub fn compose_parts(text: &str, files: &[PendingFile]) -> Vec<ContentPart> {
    let mut parts = Vec::with_capacity(files.len() + 1);
    parts.push(ContentPart::text(text));
    parts.extend(
        files
            .iter()
            .map(|f| ContentPart::document(DOCUMENT_MEDIA_TYPE, f.data.clone())),
    );
    parts
}

/// Holds the busy flag up for its lifetime.
struct BusyGuard<'a>(&'a watch::Sender<bool>);

impl<'a> BusyGuard<'a> {
    fn raise(flag: &'a watch::Sender<bool>) -> Self {
        flag.send_replace(true);
        Self(flag)
    }
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        self.0.send_replace(false);
    }
}
