use super::{AdvisedRequest, Advisor};
use async_trait::async_trait;
use simplechat_core::error::Result;
use simplechat_core::memory::ChatMemory;
use simplechat_core::message::{Message, Role};
use simplechat_core::provider::ChatResponse;
use std::sync::Arc;
use tracing::trace;

/// Gives the model the conversation so far.
///
/// `before` prepends the stored history (any system message moves to the
/// front) and records the new user message; `after` records the reply.
pub struct MemoryAdvisor {
    memory: Arc<dyn ChatMemory>,
}

impl MemoryAdvisor {
    pub fn new(memory: Arc<dyn ChatMemory>) -> Self {
        Self { memory }
    }
}

/// Move the first system message, if any, to index 0.
fn system_first(messages: &mut Vec<Message>) {
    if let Some(pos) = messages.iter().position(Message::is_system) {
        if pos > 0 {
            let system = messages.remove(pos);
            messages.insert(0, system);
        }
    }
}

#[async_trait]
impl Advisor for MemoryAdvisor {
    fn name(&self) -> &str {
        "memory"
    }

    async fn before(&self, mut request: AdvisedRequest) -> Result<AdvisedRequest> {
        let id = &request.conversation_id;
        let mut messages = self.memory.get(id).await?;
        trace!(conversation_id = %id, history = messages.len(), memory = self.memory.name(), "Loaded history");

        if let Some(user) = request.messages.iter().rev().find(|m| m.role == Role::User) {
            self.memory.add(id, vec![user.clone()]).await?;
        }

        messages.append(&mut request.messages);
        system_first(&mut messages);
        request.messages = messages;
        Ok(request)
    }

    async fn after(&self, request: &AdvisedRequest, response: ChatResponse) -> Result<ChatResponse> {
        self.memory
            .add(&request.conversation_id, vec![response.message.clone()])
            .await?;
        Ok(response)
    }
}
