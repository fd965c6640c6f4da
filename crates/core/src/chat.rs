//! Chat controller — the state a front end drives.
//!
//! `ClaimChat` owns the operating mode, claim metadata, transcript, pending
//! attachments and the [`SessionManager`]. Front ends call
//! [`ClaimChat::on_mode_change`] and [`ClaimChat::on_send`]; everything else
//! (initialization, fallbacks, transcript bookkeeping) happens here.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{info, warn};

use crate::attachment::{PendingFile, encode_files};
use crate::claim::ClaimMetadata;
use crate::error::{AttachmentError, SessionError};
use crate::message::{Conversation, ConversationMessage};
use crate::mode::OperatingMode;
use crate::session::SessionManager;

/// Appended when the model returns no text.
pub const NO_RESPONSE_FALLBACK: &str = "No response generated.";

/// Appended when the session could not be started or the turn failed.
pub const ERROR_FALLBACK: &str = "Sorry, I encountered an error processing that request.";

/// Whether metadata edits re-open the session before the next send.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MetadataPolicy {
    /// Keep the live session; edits apply on the next mode change or
    /// explicit `reinitialize`.
    #[default]
    Continuity,
    /// Re-open the session whenever the composed instruction has changed.
    /// Prior turns are not replayed.
    Refresh,
}

/// Starter prompts offered on an empty transcript.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuickStart {
    ExtractEstimateFacts,
    DraftReinspectionLetter,
    HomeownerSummary,
    IrcCodeCompliance,
}

impl QuickStart {
    pub const ALL: [QuickStart; 4] = [
        Self::ExtractEstimateFacts,
        Self::DraftReinspectionLetter,
        Self::HomeownerSummary,
        Self::IrcCodeCompliance,
    ];

    pub fn title(&self) -> &'static str {
        match self {
            Self::ExtractEstimateFacts => "Extract Estimate Facts",
            Self::DraftReinspectionLetter => "Draft Reinspection Letter",
            Self::HomeownerSummary => "Homeowner Summary",
            Self::IrcCodeCompliance => "IRC Code Compliance",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::ExtractEstimateFacts => "Upload an Xactimate PDF and ask for a gap analysis.",
            Self::DraftReinspectionLetter => {
                "Draft a message to carrier for missing items like drip edge."
            }
            Self::HomeownerSummary => "Explain why we need a supplement in plain English.",
            Self::IrcCodeCompliance => "Identify IRC R8/R9 violations in a denial letter.",
        }
    }

    /// The message sent when the starter is picked.
    pub fn prompt(&self) -> String {
        format!("Help me {}. {}", self.title().to_lowercase(), self.description())
    }
}

/// Outcome of one `on_send`.
#[derive(Debug, Clone)]
pub struct Exchange {
    /// Text appended to the transcript as the model's message
    pub reply: String,
    /// Set when the reply is the error fallback
    pub failure: Option<SessionError>,
}

impl Exchange {
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}

pub struct ClaimChat {
    manager: SessionManager,
    mode: OperatingMode,
    metadata: ClaimMetadata,
    history: Conversation,
    pending: Vec<PendingFile>,
    policy: MetadataPolicy,
}

impl ClaimChat {
    pub fn new(manager: SessionManager, mode: OperatingMode) -> Self {
        Self {
            manager,
            mode,
            metadata: ClaimMetadata::default(),
            history: Conversation::new(),
            pending: Vec::new(),
            policy: MetadataPolicy::default(),
        }
    }

    pub fn with_metadata(mut self, metadata: ClaimMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    pub fn with_policy(mut self, policy: MetadataPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn mode(&self) -> OperatingMode {
        self.mode
    }

    pub fn metadata(&self) -> &ClaimMetadata {
        &self.metadata
    }

    pub fn policy(&self) -> MetadataPolicy {
        self.policy
    }

    pub fn history(&self) -> &Conversation {
        &self.history
    }

    pub fn pending(&self) -> &[PendingFile] {
        &self.pending
    }

    pub fn session(&self) -> &SessionManager {
        &self.manager
    }

    /// Busy signal for disabling input while a call is outstanding.
    pub fn busy(&self) -> watch::Receiver<bool> {
        self.manager.subscribe_busy()
    }

    /// The instruction the next session would be opened with.
    pub fn preview_instruction(&self) -> String {
        self.manager.template().compose(self.mode, &self.metadata)
    }

    /// Switch modes. The live session is discarded so the next send
    /// re-initializes with the new mode's instruction.
    pub fn on_mode_change(&mut self, mode: OperatingMode) {
        if mode != self.mode {
            info!(mode = mode.id(), "Operating mode changed");
        }
        self.mode = mode;
        self.manager.on_mode_change(mode);
    }

    /// Edit the claim metadata in place.
    pub fn update_metadata<R>(&mut self, edit: impl FnOnce(&mut ClaimMetadata) -> R) -> R {
        edit(&mut self.metadata)
    }

    pub fn set_policy(&mut self, policy: MetadataPolicy) {
        self.policy = policy;
    }

    pub fn attach(&mut self, file: PendingFile) {
        self.pending.push(file);
    }

    /// Encode files from disk and add them to the pending list.
    /// Nothing is added if any file fails to read.
    pub async fn attach_paths(&mut self, paths: &[PathBuf]) -> Result<usize, AttachmentError> {
        let files = encode_files(paths).await?;
        let count = files.len();
        self.pending.extend(files);
        Ok(count)
    }

    /// Remove a pending file by position.
    pub fn detach(&mut self, index: usize) -> Option<PendingFile> {
        (index < self.pending.len()).then(|| self.pending.remove(index))
    }

    /// Close the live session and open a new one with current mode and metadata.
    pub async fn reinitialize(&mut self) -> Result<(), SessionError> {
        self.manager.initialize(self.mode, &self.metadata).await
    }

    /// Send the text together with all pending files; the pending list is
    /// emptied whether or not the send succeeds.
    pub async fn send_pending(&mut self, text: &str) -> Option<Exchange> {
        let files = std::mem::take(&mut self.pending);
        self.on_send(text, files).await
    }

    pub async fn quick_start(&mut self, starter: QuickStart) -> Option<Exchange> {
        self.on_send(&starter.prompt(), Vec::new()).await
    }

    /// Send one user turn and append both sides to the transcript.
    ///
    /// Returns `None` when there is nothing to send (blank text, no files).
    /// Failures never escape: they become the error fallback message.
    pub async fn on_send(&mut self, text: &str, files: Vec<PendingFile>) -> Option<Exchange> {
        if text.trim().is_empty() && files.is_empty() {
            return None;
        }

        let names = files.iter().map(|f| f.name.clone()).collect();
        self.history.push(ConversationMessage::user(text, names));

        let exchange = match self.deliver(text, &files).await {
            Ok(Some(reply)) => Exchange {
                reply,
                failure: None,
            },
            Ok(None) => Exchange {
                reply: NO_RESPONSE_FALLBACK.into(),
                failure: None,
            },
            Err(e) => {
                warn!(stage = e.stage(), error = %e, "Turn did not complete");
                Exchange {
                    reply: ERROR_FALLBACK.into(),
                    failure: Some(e),
                }
            }
        };

        self.history.push(
            ConversationMessage::model(exchange.reply.clone())
                .with_analysis(exchange.is_success() && !files.is_empty()),
        );
        Some(exchange)
    }

    async fn deliver(
        &mut self,
        text: &str,
        files: &[PendingFile],
    ) -> Result<Option<String>, SessionError> {
        let stale = self.policy == MetadataPolicy::Refresh
            && self.manager.is_ready()
            && self.manager.instruction() != Some(self.preview_instruction().as_str());

        if stale {
            info!("Claim details changed, re-opening session");
            // Replaces the live session only on success.
            self.manager.initialize(self.mode, &self.metadata).await?;
        } else if !self.manager.is_ready() {
            self.manager.initialize(self.mode, &self.metadata).await?;
        }

        self.manager.send(text, files).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attachment::encode_bytes;
    use crate::claim::ClaimField;
    use crate::error::ProviderError;
    use crate::message::Role;
    use crate::session::SessionSettings;
    use crate::test_helpers::{Call, ScriptedProvider};
    use std::sync::Arc;

    fn chat(provider: &Arc<ScriptedProvider>) -> ClaimChat {
        let manager = SessionManager::new(provider.clone(), SessionSettings::default());
        ClaimChat::new(manager, OperatingMode::Document)
    }

    #[tokio::test]
    async fn first_send_auto_initializes() {
        let provider = Arc::new(ScriptedProvider::new().reply("Here is what I understand."));
        let mut chat = chat(&provider);

        let exchange = chat.on_send("status?", vec![]).await.unwrap();
        assert_eq!(exchange.reply, "Here is what I understand.");
        assert!(exchange.is_success());

        let calls = provider.calls();
        assert_eq!(calls.len(), 2);
        assert!(matches!(calls[0], Call::StartChat(_)));
        assert!(matches!(calls[1], Call::Send(_)));
    }

    #[tokio::test]
    async fn blank_input_without_files_is_ignored() {
        let provider = Arc::new(ScriptedProvider::new());
        let mut chat = chat(&provider);

        assert!(chat.on_send("   ", vec![]).await.is_none());
        assert!(chat.history().is_empty());
        assert!(provider.calls().is_empty());
    }

    #[tokio::test]
    async fn transcript_records_both_sides() {
        let provider = Arc::new(ScriptedProvider::new().reply("Draft ready."));
        let mut chat = chat(&provider);
        chat.attach(encode_bytes("estimate.pdf", "application/pdf", b"%PDF-1.7"));

        chat.send_pending("review this estimate").await.unwrap();

        let messages = chat.history().messages();
        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, Role::User);
        assert_eq!(messages[0].attachments, vec!["estimate.pdf"]);
        assert_eq!(messages[1].role, Role::Model);
        assert_eq!(messages[1].text, "Draft ready.");
        assert!(messages[1].is_analysis);
        assert!(chat.pending().is_empty());
    }

    #[tokio::test]
    async fn empty_reply_uses_fallback_text() {
        let provider = Arc::new(ScriptedProvider::new().empty_reply());
        let mut chat = chat(&provider);

        let exchange = chat.on_send("anything?", vec![]).await.unwrap();
        assert_eq!(exchange.reply, NO_RESPONSE_FALLBACK);
        assert!(exchange.is_success());
        assert_eq!(chat.history().last().unwrap().text, NO_RESPONSE_FALLBACK);
    }

    #[tokio::test]
    async fn initialization_failure_appends_error_fallback() {
        let provider = Arc::new(
            ScriptedProvider::new()
                .fail_start(ProviderError::NotConfigured("missing API key".into()))
                .reply("recovered"),
        );
        let mut chat = chat(&provider);

        let exchange = chat.on_send("status?", vec![]).await.unwrap();
        assert_eq!(exchange.reply, ERROR_FALLBACK);
        assert!(matches!(exchange.failure, Some(SessionError::Initialization(_))));
        assert_eq!(chat.history().len(), 2);
        assert!(!chat.session().is_ready());

        // The next send retries initialization.
        let exchange = chat.on_send("status?", vec![]).await.unwrap();
        assert_eq!(exchange.reply, "recovered");
        assert_eq!(provider.start_count(), 2);
        assert_eq!(provider.send_count(), 1);
    }

    #[tokio::test]
    async fn failed_send_still_clears_pending_files() {
        let provider = Arc::new(
            ScriptedProvider::new().fail_send(ProviderError::Network("reset by peer".into())),
        );
        let mut chat = chat(&provider);
        chat.attach(encode_bytes("itel.pdf", "application/pdf", b"%PDF"));

        let exchange = chat.send_pending("check matching").await.unwrap();
        assert!(matches!(exchange.failure, Some(SessionError::Transmission(_))));
        assert!(chat.pending().is_empty());
        assert!(!chat.history().last().unwrap().is_analysis);
    }

    #[tokio::test]
    async fn mode_change_forces_one_new_initialize() {
        let provider = Arc::new(ScriptedProvider::new().reply("one").reply("two"));
        let mut chat = chat(&provider);

        chat.on_send("first", vec![]).await.unwrap();
        chat.on_mode_change(OperatingMode::Homeowner);
        assert!(!chat.session().is_ready());

        chat.on_send("second", vec![]).await.unwrap();
        let calls = provider.calls();
        assert_eq!(calls.len(), 4);
        assert!(matches!(calls[2], Call::StartChat(_)));
        assert!(matches!(calls[3], Call::Send(_)));
        assert!(
            provider
                .last_instruction()
                .unwrap()
                .contains(OperatingMode::Homeowner.label())
        );
    }

    #[tokio::test]
    async fn continuity_policy_keeps_session_after_metadata_edit() {
        let provider = Arc::new(ScriptedProvider::new().reply("one").reply("two"));
        let mut chat = chat(&provider);

        chat.on_send("first", vec![]).await.unwrap();
        chat.update_metadata(|m| m.set_field(ClaimField::Carrier, "Lakeshore Mutual"))
            .unwrap();
        chat.on_send("second", vec![]).await.unwrap();

        assert_eq!(provider.start_count(), 1);
        assert!(!provider.last_instruction().unwrap().contains("Lakeshore Mutual"));
    }

    #[tokio::test]
    async fn refresh_policy_reopens_session_after_metadata_edit() {
        let provider = Arc::new(ScriptedProvider::new().reply("one").reply("two").reply("three"));
        let mut chat = chat(&provider).with_policy(MetadataPolicy::Refresh);

        chat.on_send("first", vec![]).await.unwrap();
        chat.update_metadata(|m| m.carrier = "Lakeshore Mutual".into());
        chat.on_send("second", vec![]).await.unwrap();
        assert_eq!(provider.start_count(), 2);
        assert!(provider.last_instruction().unwrap().contains("Carrier: Lakeshore Mutual"));

        // Unchanged metadata keeps the session.
        chat.on_send("third", vec![]).await.unwrap();
        assert_eq!(provider.start_count(), 2);
    }

    #[tokio::test]
    async fn failed_refresh_keeps_the_working_session() {
        let provider = Arc::new(ScriptedProvider::new().reply("one").reply("two"));
        let mut chat = chat(&provider).with_policy(MetadataPolicy::Refresh);

        chat.on_send("first", vec![]).await.unwrap();
        let before = chat.session().instruction().map(str::to_string);

        chat.update_metadata(|m| m.carrier = "Lakeshore Mutual".into());
        provider.fail_next_start(ProviderError::Network("connection reset".into()));

        let exchange = chat.on_send("second", vec![]).await.unwrap();
        assert_eq!(exchange.reply, ERROR_FALLBACK);
        assert!(chat.session().is_ready());
        assert_eq!(chat.session().instruction().map(str::to_string), before);
        assert_eq!(provider.send_count(), 1);

        // Next turn retries the refresh and succeeds.
        let exchange = chat.on_send("third", vec![]).await.unwrap();
        assert_eq!(exchange.reply, "two");
        assert_eq!(provider.start_count(), 3);
        assert!(provider.last_instruction().unwrap().contains("Carrier: Lakeshore Mutual"));
    }

    #[tokio::test]
    async fn explicit_reinitialize_applies_metadata() {
        let provider = Arc::new(ScriptedProvider::new().reply("one"));
        let mut chat = chat(&provider);

        chat.update_metadata(|m| m.adjuster = "Dana Ruiz".into());
        chat.reinitialize().await.unwrap();
        assert!(provider.last_instruction().unwrap().contains("Adjuster: Dana Ruiz"));

        chat.on_send("go", vec![]).await.unwrap();
        assert_eq!(provider.start_count(), 1);
    }

    #[tokio::test]
    async fn quick_start_sends_starter_prompt() {
        let provider = Arc::new(ScriptedProvider::new().reply("ok"));
        let mut chat = chat(&provider);

        chat.quick_start(QuickStart::DraftReinspectionLetter).await.unwrap();
        assert_eq!(
            chat.history().messages()[0].text,
            "Help me draft reinspection letter. Draft a message to carrier for missing items like drip edge."
        );
    }

    #[tokio::test]
    async fn attach_paths_is_all_or_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let good = dir.path().join("estimate.pdf");
        std::fs::write(&good, b"%PDF-1.7").unwrap();
        let missing = dir.path().join("missing.pdf");

        let provider = Arc::new(ScriptedProvider::new());
        let mut chat = chat(&provider);

        assert!(chat.attach_paths(&[good.clone(), missing]).await.is_err());
        assert!(chat.pending().is_empty());

        assert_eq!(chat.attach_paths(&[good]).await.unwrap(), 1);
        assert_eq!(chat.pending()[0].name, "estimate.pdf");
        assert!(chat.detach(5).is_none());
        assert!(chat.detach(0).is_some());
    }
}
