use serde::{Deserialize, Serialize};

use crate::types::{Model, Turn};

/// Request body for `POST /v1/messages`.
///
/// The chat always sends a complete, non-streaming request: a model, an output
/// ceiling, the instruction text as `system`, and the transcript as `messages`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageCreateParams {
    /// The model that will complete the conversation.
    pub model: Model,

    /// The maximum number of tokens to generate before stopping.
    pub max_tokens: u32,

    /// Out-of-band instructions for the model.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system: Option<String>,

    /// Conversation history, oldest first.
    pub messages: Vec<Turn>,
}

impl MessageCreateParams {
    /// Create request parameters without a system prompt.
    pub fn new(max_tokens: u32, messages: Vec<Turn>, model: Model) -> Self {
        Self {
            model,
            max_tokens,
            system: None,
            messages,
        }
    }

    /// Attach a system prompt.
    pub fn with_system(mut self, system: impl Into<String>) -> Self {
        self.system = Some(system.into());
        self
    }
}
