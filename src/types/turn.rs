use std::fmt;

use serde::{Deserialize, Serialize};

/// Who authored a turn.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// The student typing into the chat.
    User,

    /// The model's reply, or a canned fallback standing in for one.
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// One message in the conversation.
///
/// Turns are immutable once created.  Only the role and the content are ever
/// sent to the provider, so the serialized form doubles as the request's
/// `messages` entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Turn {
    role: Role,
    content: String,
}

impl Turn {
    /// Create a new turn.
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }

    /// Create a user turn.
    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    /// Create an assistant turn.
    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// The author of this turn.
    pub fn role(&self) -> Role {
        self.role
    }

    /// The text of this turn.
    pub fn content(&self) -> &str {
        &self.content
    }

    /// True if the student wrote this turn.
    pub fn is_user(&self) -> bool {
        self.role == Role::User
    }
}

impl From<&str> for Turn {
    fn from(content: &str) -> Self {
        Self::user(content)
    }
}

impl From<String> for Turn {
    fn from(content: String) -> Self {
        Self::user(content)
    }
}
