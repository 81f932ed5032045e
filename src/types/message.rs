use serde::{Deserialize, Serialize};

use crate::types::{ContentBlock, Usage};

/// A response from the Messages API.
///
/// Only `content` matters to the chat; the remaining fields are kept for logs
/// and statistics.  A body without `content` decodes as an empty message.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Message {
    /// Unique object identifier.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,

    /// Content generated by the model, in order.
    #[serde(default)]
    pub content: Vec<ContentBlock>,

    /// The model that handled the request.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,

    /// The reason the model stopped generating, verbatim.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<String>,

    /// Billing and rate-limit usage.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<Usage>,
}

impl Message {
    /// Creates a message holding the given content blocks.
    pub fn new(content: Vec<ContentBlock>) -> Self {
        Self {
            content,
            ..Self::default()
        }
    }

    /// Joins the non-empty text blocks with newlines, in order.
    ///
    /// Returns `None` when the message carries no usable text.
    pub fn text(&self) -> Option<String> {
        let parts: Vec<&str> = self
            .content
            .iter()
            .filter_map(ContentBlock::as_text)
            .map(|block| block.text.as_str())
            .filter(|text| !text.is_empty())
            .collect();
        if parts.is_empty() {
            None
        } else {
            Some(parts.join("\n"))
        }
    }
}
