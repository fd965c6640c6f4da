//! Shared test helpers for session and chat tests.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use crate::error::ProviderError;
use crate::message::ContentPart;
use crate::provider::{ChatConfig, ChatReply, ChatSession, Provider, Usage};

/// One recorded provider interaction.
#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    StartChat(ChatConfig),
    Send(Vec<ContentPart>),
}

type Script = Arc<Mutex<VecDeque<Result<ChatReply, ProviderError>>>>;

/// A mock provider that returns scripted replies in sequence.
///
/// Every `start_chat` and `send` is appended to a shared call log.
/// Panics if more turns are sent than replies provided.
pub struct ScriptedProvider {
    log: Arc<Mutex<Vec<Call>>>,
    script: Script,
    start_error: Mutex<Option<ProviderError>>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self {
            log: Arc::new(Mutex::new(Vec::new())),
            script: Arc::new(Mutex::new(VecDeque::new())),
            start_error: Mutex::new(None),
        }
    }

    /// Queue a successful text reply.
    pub fn reply(self, text: &str) -> Self {
        self.script.lock().unwrap().push_back(Ok(make_reply(Some(text))));
        self
    }

    /// Queue a reply with no text.
    pub fn empty_reply(self) -> Self {
        self.script.lock().unwrap().push_back(Ok(make_reply(None)));
        self
    }

    /// Queue a failing turn.
    pub fn fail_send(self, error: ProviderError) -> Self {
        self.script.lock().unwrap().push_back(Err(error));
        self
    }

    /// Make the next `start_chat` fail once.
    pub fn fail_start(self, error: ProviderError) -> Self {
        self.fail_next_start(error);
        self
    }

    /// Make the next `start_chat` fail once, on an already shared provider.
    pub fn fail_next_start(&self, error: ProviderError) {
        *self.start_error.lock().unwrap() = Some(error);
    }

    pub fn calls(&self) -> Vec<Call> {
        self.log.lock().unwrap().clone()
    }

    pub fn start_count(&self) -> usize {
        self.calls().iter().filter(|c| matches!(c, Call::StartChat(_))).count()
    }

    pub fn send_count(&self) -> usize {
        self.calls().iter().filter(|c| matches!(c, Call::Send(_))).count()
    }

    /// The system instruction of the most recent `start_chat`.
    pub fn last_instruction(&self) -> Option<String> {
        self.calls().iter().rev().find_map(|c| match c {
            Call::StartChat(config) => Some(config.system_instruction.clone()),
            _ => None,
        })
    }

    /// The parts of the most recent `send`.
    pub fn last_parts(&self) -> Option<Vec<ContentPart>> {
        self.calls().iter().rev().find_map(|c| match c {
            Call::Send(parts) => Some(parts.clone()),
            _ => None,
        })
    }
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted_mock"
    }

    async fn start_chat(&self, config: ChatConfig) -> Result<Box<dyn ChatSession>, ProviderError> {
        self.log.lock().unwrap().push(Call::StartChat(config));
        if let Some(err) = self.start_error.lock().unwrap().take() {
            return Err(err);
        }
        Ok(Box::new(ScriptedSession {
            log: Arc::clone(&self.log),
            script: Arc::clone(&self.script),
            turns: 0,
        }))
    }
}

struct ScriptedSession {
    log: Arc<Mutex<Vec<Call>>>,
    script: Script,
    turns: usize,
}

#[async_trait::async_trait]
impl ChatSession for ScriptedSession {
    async fn send(&mut self, parts: Vec<ContentPart>) -> Result<ChatReply, ProviderError> {
        self.log.lock().unwrap().push(Call::Send(parts));
        let next = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .expect("ScriptedProvider: no more scripted replies");
        if next.is_ok() {
            self.turns += 1;
        }
        next
    }

    fn turns(&self) -> usize {
        self.turns
    }
}

fn make_reply(text: Option<&str>) -> ChatReply {
    ChatReply {
        text: text.map(str::to_string),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
        model: "mock-model".into(),
    }
}
