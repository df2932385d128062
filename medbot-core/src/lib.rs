//! Core types and traits for medbot
//!
//! This crate provides the conversation state machine, configuration,
//! logging and identity storage used by the other medbot components.

pub mod chat;
pub mod config;
pub mod error;
pub mod identity;
pub mod logging;
pub mod render;
pub mod session;
pub mod storage;

pub use chat::{ChatReply, ChatRequest, ChatService};
pub use error::{Error, Result};
