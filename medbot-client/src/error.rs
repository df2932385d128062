//! Error type for chat server calls

use thiserror::Error;

/// Error type for chat server calls
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parsing failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Server returned status {0}")]
    Status(u16),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

pub type ClientResult<T> = Result<T, ClientError>;

impl From<ClientError> for medbot_core::Error {
    fn from(e: ClientError) -> Self {
        medbot_core::Error::Chat(e.to_string())
    }
}
