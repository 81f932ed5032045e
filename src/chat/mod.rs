//! Chat application module for the terminal counselor.
//!
//! This module provides the REPL pieces built on top of the conversation,
//! completion and render layers:
//!
//! - Slash commands for session control
//! - Configurable model, endpoint, timeout and instruction bundle
//! - Transcript saving, loading and auto-save
//!
//! # Architecture
//!
//! - [`config`]: CLI argument parsing and configuration
//! - [`session`]: wires a conversation to a completion client and a renderer
//! - [`commands`]: Slash command parsing and handling

mod commands;
mod config;
mod session;

pub use crate::render::{PlainTextRenderer, Renderer};
pub use commands::{ChatCommand, PromptLayer, help_text, parse_command};
pub use config::{ChatArgs, ChatConfig};
pub use session::{ChatSession, CommandOutcome, DISCLAIMER, SessionStats};
