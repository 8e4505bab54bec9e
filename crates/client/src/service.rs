//! Chat service: the four operations the transport layer exposes.

use crate::advisor::AdvisorSet;
use crate::client::{ChatClient, ContentStream};
use crate::prompt::Prompt;
use simplechat_core::emotion::EmotionEvaluation;
use simplechat_core::error::Result;
use simplechat_core::message::ConversationId;
use simplechat_core::options::ChatOptions;
use simplechat_core::provider::{ChatResponse, Provider};
use std::sync::Arc;

/// Two clients over one provider and one memory: `client` runs every
/// advisor, `client_without_logger` runs all but the logger.
#[derive(Clone, Debug)]
pub struct ChatService {
    client: ChatClient,
    client_without_logger: ChatClient,
}

impl ChatService {
    pub fn new(provider: Arc<dyn Provider>, default_options: ChatOptions, advisors: &AdvisorSet) -> Self {
        let client = ChatClient::builder(provider.clone())
            .default_options(default_options.clone())
            .advisors(advisors.full())
            .build();
        let client_without_logger = ChatClient::builder(provider)
            .default_options(default_options)
            .advisors(advisors.silent())
            .build();
        Self {
            client,
            client_without_logger,
        }
    }

    pub fn client(&self) -> &ChatClient {
        &self.client
    }

    pub fn client_without_logger(&self) -> &ChatClient {
        &self.client_without_logger
    }

    pub async fn call(&self, conversation_id: &ConversationId, prompt: Prompt) -> Result<ChatResponse> {
        self.client
            .prompt(prompt)
            .conversation_id(conversation_id.clone())
            .call()
            .await
    }

    pub async fn stream(&self, conversation_id: &ConversationId, prompt: Prompt) -> Result<ContentStream> {
        self.client
            .prompt(prompt)
            .conversation_id(conversation_id.clone())
            .stream()
            .await
    }

    /// Same as [`stream`](Self::stream) but writes no log records.
    pub async fn stream_without_logger(
        &self,
        conversation_id: &ConversationId,
        prompt: Prompt,
    ) -> Result<ContentStream> {
        self.client_without_logger
            .prompt(prompt)
            .conversation_id(conversation_id.clone())
            .stream()
            .await
    }

    pub async fn call_emotion_evaluation(
        &self,
        conversation_id: &ConversationId,
        prompt: Prompt,
    ) -> Result<EmotionEvaluation> {
        self.client
            .prompt(prompt)
            .conversation_id(conversation_id.clone())
            .entity()
            .await
    }
}
