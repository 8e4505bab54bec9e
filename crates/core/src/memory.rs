//! Conversation memory trait.
//!
//! A chat memory keeps the recent message history of each conversation so it
//! can be replayed to the provider as context on the next turn.

use async_trait::async_trait;
use crate::error::MemoryError;
use crate::message::{ConversationId, Message};

/// The core ChatMemory trait.
///
/// Implementations must apply `add` atomically per conversation: two
/// concurrent adds on the same id may interleave only at message-batch
/// granularity, never lose a batch.
#[async_trait]
pub trait ChatMemory: Send + Sync {
    /// The backend name (e.g., "message_window").
    fn name(&self) -> &str;

    /// Append messages to a conversation, evicting per the backend's policy.
    async fn add(&self, conversation_id: &ConversationId, messages: Vec<Message>) -> Result<(), MemoryError>;

    /// Current history of a conversation, oldest first.
    async fn get(&self, conversation_id: &ConversationId) -> Result<Vec<Message>, MemoryError>;

    /// Forget a conversation.
    async fn clear(&self, conversation_id: &ConversationId) -> Result<(), MemoryError>;
}
