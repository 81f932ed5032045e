use serde::{Deserialize, Serialize};

/// A block of text content in a provider response.
///
/// The `type` tag lives on [`crate::types::ContentBlock`].  A text block that
/// arrives without a `text` field decodes as empty text.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct TextBlock {
    /// The text content.
    #[serde(default)]
    pub text: String,
}

impl TextBlock {
    /// Creates a new TextBlock with the specified text.
    pub fn new<S: Into<String>>(text: S) -> Self {
        Self { text: text.into() }
    }

    /// True if the block carries no text at all.
    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}
