// Public modules
pub mod chat;
pub mod client;
pub mod client_logger;
pub mod completion;
pub mod conversation;
pub mod error;
pub mod instructions;
pub mod observability;
pub mod render;
pub mod types;

// Re-exports
pub use client::Anthropic;
pub use client_logger::ClientLogger;
pub use completion::{
    CONNECTION_FALLBACK, CompletionBackend, CompletionClient, EMPTY_REPLY_FALLBACK, Reply,
    ReplyKind,
};
pub use conversation::{
    Conversation, ConversationStats, PendingRequest, Rejection, RequestState, SubmitOutcome,
};
pub use error::{Error, Result};
pub use instructions::InstructionBundle;
pub use observability::register_biometrics;
pub use render::{Block, CoursePattern, Span, render_message};
pub use types::*;
