//! Chat application module for asking questions about an uploaded document.
//!
//! This module provides the state behind the docchat REPL:
//!
//! - An upload controller holding the single active file and its status
//! - A conversation controller with an append-only transcript and
//!   single-flight questions
//! - Slash commands for uploading files and inspecting the session
//! - Configuration from arguments, environment, and a YAML file
//!
//! # Architecture
//!
//! - [`config`]: CLI argument parsing and configuration
//! - [`session`]: the session that owns both controllers and the service
//! - [`commands`]: Slash command parsing and handling

mod commands;
mod config;
mod conversation;
mod session;
mod upload;

pub use crate::render::{PlainTextRenderer, Renderer};
pub use commands::{ChatCommand, help_text, parse_command};
pub use config::{BASE_URL_ENV, ChatArgs, ChatConfig, ConfigFile};
pub use conversation::{
    ChatCompletion, ChatPhase, Conversation, DEFAULT_GREETING, FALLBACK_REPLY, PendingQuestion,
};
pub use session::{ChatSession, SessionStats};
pub use upload::{UploadCompletion, UploadState, UploadTicket};
