//! Conversation session
//!
//! The session owns the transcript, the pending input buffer, the busy flag
//! and the resolved user identifier. A submit cycle is split into
//! [`SessionState::begin_submit`] and [`SessionState::complete`] so an event
//! loop can keep ownership of the state while the request runs elsewhere;
//! [`ConversationSession`] composes both halves for callers that can await.

pub mod manager;
pub mod message;
pub mod state;

pub use manager::ConversationSession;
pub use message::{Message, Sender};
pub use state::{SessionState, DISCLAIMER, FALLBACK_MESSAGE, GREETING, TYPING_INDICATOR};
