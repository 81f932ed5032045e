//! Logging trait for Anthropic client operations.
//!
//! This module provides the [`ClientLogger`] trait that allows users to capture
//! every request body and response passing through the [`crate::Anthropic`]
//! client, e.g. to keep an audit trail of what students were told.

use crate::{Message, MessageCreateParams};

/// A trait for logging Anthropic client operations.
///
/// # Example
///
/// ```rust
/// use std::sync::Mutex;
///
/// use champlain_guide::{ClientLogger, Message, MessageCreateParams};
///
/// #[derive(Default)]
/// struct CountingLogger {
///     seen: Mutex<usize>,
/// }
///
/// impl ClientLogger for CountingLogger {
///     fn log_request(&self, _params: &MessageCreateParams) {
///         *self.seen.lock().unwrap() += 1;
///     }
///
///     fn log_response(&self, _message: &Message) {}
/// }
/// ```
pub trait ClientLogger: Send + Sync {
    /// Log the body of an outgoing request, before it is sent.
    fn log_request(&self, params: &MessageCreateParams);

    /// Log a successfully decoded response.
    fn log_response(&self, message: &Message);
}
