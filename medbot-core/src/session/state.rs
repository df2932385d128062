//! Session state machine

use tracing::{debug, warn};

use super::message::Message;
use crate::chat::{ChatReply, ChatRequest};

/// First bot message of every session
pub const GREETING: &str = "Hello! I'm MedBot, your preliminary health assistant. How are you feeling today? Please describe your symptoms.";

/// Safety notice shown on every render, outside the transcript
pub const DISCLAIMER: &str = "⚠️ IMPORTANT: I provide general information only and cannot replace professional medical advice. For emergencies, call your local emergency number immediately.";

/// Bot message appended when a chat request fails for any reason
pub const FALLBACK_MESSAGE: &str =
    "Sorry, I couldn't reach the MedBot server. Please try again later.";

/// Ephemeral line shown while a request is in flight
pub const TYPING_INDICATOR: &str = "MedBot is typing...";

/// Transcript, input buffer, busy flag and user identifier
#[derive(Debug, Clone)]
pub struct SessionState {
    messages: Vec<Message>,
    input: String,
    busy: bool,
    user_id: Option<String>,
}

impl SessionState {
    /// Fresh session seeded with the greeting; the user id is unresolved
    pub fn new() -> Self {
        Self {
            messages: vec![Message::bot(GREETING)],
            input: String::new(),
            busy: false,
            user_id: None,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn is_busy(&self) -> bool {
        self.busy
    }

    pub fn user_id(&self) -> Option<&str> {
        self.user_id.as_deref()
    }

    /// Record the resolved identifier. The first value wins.
    pub fn set_user_id(&mut self, user_id: impl Into<String>) {
        if self.user_id.is_none() {
            self.user_id = Some(user_id.into());
        }
    }

    /// Replace the whole input buffer
    pub fn set_input(&mut self, input: impl Into<String>) {
        self.input = input.into();
    }

    pub fn push_char(&mut self, ch: char) {
        self.input.push(ch);
    }

    pub fn backspace(&mut self) {
        self.input.pop();
    }

    /// Whether the current buffer would be accepted by [`begin_submit`](Self::begin_submit)
    pub fn can_submit(&self) -> bool {
        !self.busy && self.user_id.is_some() && !self.input.trim().is_empty()
    }

    /// Accept the current buffer for sending.
    ///
    /// Returns `None` and leaves the state untouched when the buffer is blank,
    /// the user id is unresolved, or a request is already in flight.
    /// Otherwise appends the user message, clears the buffer, marks the
    /// session busy and returns the request to issue.
    pub fn begin_submit(&mut self) -> Option<ChatRequest> {
        if !self.can_submit() {
            debug!(busy = self.busy, "Submit rejected");
            return None;
        }
        let user_id = self.user_id.clone()?;

        let text = std::mem::take(&mut self.input);
        self.messages.push(Message::user(text.clone()));
        self.busy = true;

        Some(ChatRequest {
            message: text,
            user_id,
        })
    }

    /// Apply the outcome of the request issued by the last accepted submit.
    ///
    /// Failures of any kind become the fallback message. Busy is cleared on
    /// both paths. Ignored when no request is in flight.
    pub fn complete(&mut self, outcome: crate::Result<ChatReply>) {
        if !self.busy {
            warn!("Dropping chat outcome with no request in flight");
            return;
        }

        let text = match outcome {
            Ok(reply) => reply.response,
            Err(e) => {
                warn!("Chat request failed: {}", e);
                FALLBACK_MESSAGE.to_string()
            }
        };
        self.messages.push(Message::bot(text));
        self.busy = false;
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}
