//! HTTP client for the MedBot chat server
//!
//! Implements [`medbot_core::ChatService`] over `reqwest` and exposes the
//! health check, condition catalogue and feedback endpoints.

pub mod error;
pub mod http;

pub use error::{ClientError, ClientResult};
pub use http::{Condition, FeedbackRequest, HealthStatus, HttpChatClient, Remedy};
