//! Message-window memory: keeps the N most recent messages per conversation.

use async_trait::async_trait;
use simplechat_core::error::MemoryError;
use simplechat_core::memory::ChatMemory;
use simplechat_core::message::{ConversationId, Message};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::trace;

/// Default window size.
pub const DEFAULT_MAX_MESSAGES: usize = 10;

/// An in-process sliding window over each conversation's messages.
///
/// - At most `max_messages` messages are kept per conversation; the oldest
///   non-system message is evicted first.
/// - Adding a system message replaces any system message stored before it.
/// - Each `add` runs under the write lock, so concurrent turns on one
///   conversation never lose or interleave partial batches.
pub struct MessageWindowMemory {
    max_messages: usize,
    conversations: Arc<RwLock<HashMap<ConversationId, VecDeque<Message>>>>,
}

impl MessageWindowMemory {
    pub fn new(max_messages: usize) -> Self {
        Self {
            max_messages: max_messages.max(1),
            conversations: Arc::new(RwLock::new(HashMap::new())),
        }
    }

}

impl Default for MessageWindowMemory {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_MESSAGES)
    }
}

/// Append `incoming` to `window` and trim it to `max` entries.
fn apply_window(window: &mut VecDeque<Message>, incoming: Vec<Message>, max: usize) {
    if incoming.iter().any(Message::is_system) {
        window.retain(|m| !m.is_system());
    }
    window.extend(incoming);

    while window.len() > max {
        match window.iter().position(|m| !m.is_system()) {
            Some(oldest) => {
                window.remove(oldest);
            }
            None => {
                window.pop_front();
            }
        }
    }
}

#[async_trait]
impl ChatMemory for MessageWindowMemory {
    fn name(&self) -> &str { "message_window" }

    async fn add(&self, conversation_id: &ConversationId, messages: Vec<Message>) -> Result<(), MemoryError> {
        if messages.is_empty() {
            return Ok(());
        }
        let mut conversations = self.conversations.write().await;
        let window = conversations.entry(conversation_id.clone()).or_default();
        apply_window(window, messages, self.max_messages);
        trace!(conversation_id = %conversation_id, size = window.len(), "Memory window updated");
        Ok(())
    }

    async fn get(&self, conversation_id: &ConversationId) -> Result<Vec<Message>, MemoryError> {
        let conversations = self.conversations.read().await;
        Ok(conversations
            .get(conversation_id)
            .map(|w| w.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn clear(&self, conversation_id: &ConversationId) -> Result<(), MemoryError> {
        self.conversations.write().await.remove(conversation_id);
        Ok(())
    }
}
