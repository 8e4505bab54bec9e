use super::{AdvisedRequest, Advisor};
use async_trait::async_trait;
use simplechat_core::error::Result;
use simplechat_core::provider::ChatResponse;
use tracing::debug;

/// Writes each request and response as a debug record.
///
/// Records are emitted under this module's target, so the level is
/// controlled by the `simplechat_client::advisor` filter directive.
#[derive(Debug, Default)]
pub struct LoggingAdvisor;

impl LoggingAdvisor {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl Advisor for LoggingAdvisor {
    fn name(&self) -> &str {
        "logger"
    }

    async fn before(&self, request: AdvisedRequest) -> Result<AdvisedRequest> {
        debug!(
            conversation_id = %request.conversation_id,
            messages = %serde_json::to_string(&request.messages)?,
            options = %serde_json::to_string(&request.options)?,
            "request"
        );
        Ok(request)
    }

    async fn after(&self, request: &AdvisedRequest, response: ChatResponse) -> Result<ChatResponse> {
        debug!(
            conversation_id = %request.conversation_id,
            response = %serde_json::to_string(&response)?,
            "response"
        );
        Ok(response)
    }
}
