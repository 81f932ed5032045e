//! One provider call per user turn, reduced to plain text.
//!
//! The [`CompletionClient`] hides every provider failure behind two canned
//! replies so that a student never sees transport or API detail.  The detail
//! is logged at `warn` instead.

use async_trait::async_trait;

use crate::client::Anthropic;
use crate::error::Result;
use crate::instructions::InstructionBundle;
use crate::observability::{COMPLETION_EMPTY, COMPLETION_FAILED};
use crate::types::{Message, MessageCreateParams, Model, Turn};

/// Reply used when the provider answers without any text.
pub const EMPTY_REPLY_FALLBACK: &str =
    "I'm sorry, I had trouble processing that. Could you try rephrasing your question?";

/// Reply used when the request fails for any reason.
pub const CONNECTION_FALLBACK: &str =
    "I'm having trouble connecting right now. Please try again in a moment.";

/// Default ceiling on generated tokens per reply.
pub const DEFAULT_MAX_TOKENS: u32 = 1024;

/// Something that can answer a Messages API request.
///
/// [`Anthropic`] is the production implementation; tests substitute fakes.
#[async_trait]
pub trait CompletionBackend: Send + Sync {
    /// Sends one request and returns the decoded response.
    async fn create_message(&self, params: MessageCreateParams) -> Result<Message>;
}

#[async_trait]
impl CompletionBackend for Anthropic {
    async fn create_message(&self, params: MessageCreateParams) -> Result<Message> {
        self.send(params).await
    }
}

/// How a completion resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    /// The provider returned text.
    Answered,
    /// The provider succeeded but returned no text.
    Empty,
    /// The request or its decoding failed.
    Failed,
}

/// The assistant text produced for one turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    /// What to append to the transcript.
    pub text: String,
    /// Which path produced the text.
    pub kind: ReplyKind,
    /// Input and output tokens, when the provider reported them.
    pub usage: Option<crate::types::Usage>,
}

impl Reply {
    fn fallback(kind: ReplyKind) -> Self {
        let text = match kind {
            ReplyKind::Empty => EMPTY_REPLY_FALLBACK,
            _ => CONNECTION_FALLBACK,
        };
        Self {
            text: text.to_string(),
            kind,
            usage: None,
        }
    }

    /// True when the text is one of the canned fallbacks.
    pub fn is_fallback(&self) -> bool {
        self.kind != ReplyKind::Answered
    }
}

/// Sends a transcript plus instructions and extracts plain text.
pub struct CompletionClient<B: CompletionBackend = Anthropic> {
    backend: B,
    instructions: InstructionBundle,
    model: Model,
    max_tokens: u32,
}

impl<B: CompletionBackend> CompletionClient<B> {
    /// Creates a completion client with the default model and token ceiling.
    pub fn new(backend: B, instructions: InstructionBundle) -> Self {
        Self {
            backend,
            instructions,
            model: Model::default(),
            max_tokens: DEFAULT_MAX_TOKENS,
        }
    }

    /// Sets the model.
    pub fn with_model(mut self, model: Model) -> Self {
        self.model = model;
        self
    }

    /// Sets the reply token ceiling.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// The instruction bundle sent with every request.
    pub fn instructions(&self) -> &InstructionBundle {
        &self.instructions
    }

    /// The model requests are sent to.
    pub fn model(&self) -> &Model {
        &self.model
    }

    /// The reply token ceiling.
    pub fn max_tokens(&self) -> u32 {
        self.max_tokens
    }

    /// Builds the request body for a transcript.
    pub fn request_for(&self, transcript: &[Turn]) -> MessageCreateParams {
        MessageCreateParams::new(self.max_tokens, transcript.to_vec(), self.model.clone())
            .with_system(self.instructions.system_prompt())
    }

    /// Requests a reply to `transcript`.
    ///
    /// Never fails: an empty answer becomes [`EMPTY_REPLY_FALLBACK`] and any
    /// error becomes [`CONNECTION_FALLBACK`].
    pub async fn complete(&self, transcript: &[Turn]) -> Reply {
        let params = self.request_for(transcript);
        match self.backend.create_message(params).await {
            Ok(message) => match message.text() {
                Some(text) => Reply {
                    text,
                    kind: ReplyKind::Answered,
                    usage: message.usage,
                },
                None => {
                    COMPLETION_EMPTY.click();
                    tracing::warn!(
                        blocks = message.content.len(),
                        "provider returned no text; using fallback reply"
                    );
                    Reply {
                        usage: message.usage,
                        ..Reply::fallback(ReplyKind::Empty)
                    }
                }
            },
            Err(err) => {
                COMPLETION_FAILED.click();
                tracing::warn!(error = %err, "completion failed; using fallback reply");
                Reply::fallback(ReplyKind::Failed)
            }
        }
    }
}
