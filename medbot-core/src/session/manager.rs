//! Session manager driving submit cycles against a chat service

use std::sync::Arc;
use tracing::info;

use super::state::SessionState;
use crate::chat::ChatService;
use crate::identity::resolve_user_id;
use crate::storage::KeyValueStore;

/// Owns one session state and the chat service it talks to
pub struct ConversationSession {
    state: SessionState,
    service: Arc<dyn ChatService>,
}

impl ConversationSession {
    /// Create an uninitialized session; sending is a no-op until
    /// [`initialize`](Self::initialize) resolves the user id
    pub fn new(service: Arc<dyn ChatService>) -> Self {
        Self {
            state: SessionState::new(),
            service,
        }
    }

    /// Resolve the durable user id from `store`, generating one if needed
    pub fn initialize(&mut self, store: &mut dyn KeyValueStore) -> crate::Result<()> {
        let user_id = resolve_user_id(store)?;
        info!("Session ready for user {}", user_id);
        self.state.set_user_id(user_id);
        Ok(())
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn state_mut(&mut self) -> &mut SessionState {
        &mut self.state
    }

    /// Shared handle to the chat service, for issuing requests off-loop
    pub fn service(&self) -> Arc<dyn ChatService> {
        Arc::clone(&self.service)
    }

    /// Submit the current input buffer and wait for the reply.
    ///
    /// Rejected submits do nothing. Failures surface only as the fallback
    /// message in the transcript.
    pub async fn submit(&mut self) {
        let Some(request) = self.state.begin_submit() else {
            return;
        };
        let outcome = self.service.send(&request).await;
        self.state.complete(outcome);
    }

    /// Replace the input buffer with `text` and submit it
    pub async fn submit_text(&mut self, text: impl Into<String>) {
        self.state.set_input(text);
        self.submit().await;
    }
}
