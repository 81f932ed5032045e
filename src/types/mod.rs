//! Wire types for the Anthropic Messages API, reduced to what a text-only
//! conversation needs.

pub mod content_block;
pub mod message;
pub mod message_create_params;
pub mod model;
pub mod text_block;
pub mod turn;
pub mod usage;

pub use content_block::ContentBlock;
pub use message::Message;
pub use message_create_params::MessageCreateParams;
pub use model::{KnownModel, Model};
pub use text_block::TextBlock;
pub use turn::{Role, Turn};
pub use usage::Usage;
