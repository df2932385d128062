//! Seam between the session and the remote chat endpoint

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Body of one chat request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatRequest {
    pub message: String,
    pub user_id: String,
}

/// Successful chat reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatReply {
    pub response: String,
    /// Disclaimer echoed by the server, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub disclaimer: Option<String>,
}

impl ChatReply {
    pub fn new(response: impl Into<String>) -> Self {
        Self {
            response: response.into(),
            disclaimer: None,
        }
    }
}

/// A remote chat endpoint: one request, one reply, no retries
#[async_trait]
pub trait ChatService: Send + Sync {
    /// Send a message. Any transport, status or payload problem is an
    /// [`Error::Chat`](crate::Error::Chat).
    async fn send(&self, request: &ChatRequest) -> crate::Result<ChatReply>;
}
