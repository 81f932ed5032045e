use serde::{Deserialize, Serialize};

use crate::types::TextBlock;

/// A block of content in a provider response.
///
/// Only text is meaningful to the chat.  Every other block type (tool use,
/// thinking, images and whatever the provider adds later) decodes as
/// [`ContentBlock::Other`] and is ignored.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "type")]
pub enum ContentBlock {
    /// A block of text content
    #[serde(rename = "text")]
    Text(TextBlock),

    /// Any non-text block.
    #[serde(other)]
    Other,
}

impl ContentBlock {
    /// Creates a text block.
    pub fn text(text: impl Into<String>) -> Self {
        ContentBlock::Text(TextBlock::new(text))
    }

    /// Returns true if this block is a text block
    pub fn is_text(&self) -> bool {
        matches!(self, ContentBlock::Text(_))
    }

    /// Returns a reference to the inner TextBlock if this is a Text variant,
    /// or None otherwise.
    pub fn as_text(&self) -> Option<&TextBlock> {
        match self {
            ContentBlock::Text(block) => Some(block),
            ContentBlock::Other => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn text_block_deserializes() {
        let block: ContentBlock =
            serde_json::from_value(json!({"type": "text", "text": "hello"})).unwrap();
        assert_eq!(block, ContentBlock::text("hello"));
        assert!(block.is_text());
    }

    #[test]
    fn other_block_types_are_tolerated() {
        let block: ContentBlock = serde_json::from_value(json!({
            "type": "tool_use",
            "id": "toolu_01",
            "name": "lookup",
            "input": {}
        }))
        .unwrap();
        assert_eq!(block, ContentBlock::Other);
        assert!(block.as_text().is_none());
    }

    #[test]
    fn text_block_without_text_is_empty() {
        let block: ContentBlock = serde_json::from_value(json!({"type": "text"})).unwrap();
        assert!(block.as_text().unwrap().is_empty());
    }
}
