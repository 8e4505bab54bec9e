//! Conversation memory implementations for SimpleChat.

pub mod window;

pub use window::{DEFAULT_MAX_MESSAGES, MessageWindowMemory};
