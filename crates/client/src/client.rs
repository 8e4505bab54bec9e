//! The chat client: provider + default options + advisor chain.
//!
//! ```ignore
//! let reply = client
//!     .prompt(Prompt::user("Hello"))
//!     .conversation_id(id)
//!     .content()
//!     .await?;
//! ```

use crate::advisor::{AdvisedRequest, AdvisorChain};
use crate::prompt::Prompt;
use simplechat_core::error::{Error, Result};
use simplechat_core::message::{ConversationId, Message};
use simplechat_core::options::ChatOptions;
use simplechat_core::output::StructuredOutput;
use simplechat_core::provider::{ChatResponse, ChunkReceiver, Provider};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tracing::{debug, warn};

/// Text deltas of a streamed reply. Ends after the last delta or the first error.
pub type ContentStream = ReceiverStream<Result<String>>;

const STREAM_BUFFER: usize = 32;

#[derive(Clone)]
pub struct ChatClient {
    provider: Arc<dyn Provider>,
    default_options: ChatOptions,
    advisors: AdvisorChain,
}

pub struct ChatClientBuilder {
    provider: Arc<dyn Provider>,
    default_options: ChatOptions,
    advisors: AdvisorChain,
}

impl ChatClientBuilder {
    pub fn default_options(mut self, options: ChatOptions) -> Self {
        self.default_options = options;
        self
    }

    pub fn advisors(mut self, advisors: AdvisorChain) -> Self {
        self.advisors = advisors;
        self
    }

    pub fn build(self) -> ChatClient {
        ChatClient {
            provider: self.provider,
            default_options: self.default_options,
            advisors: self.advisors,
        }
    }
}

impl ChatClient {
    pub fn builder(provider: Arc<dyn Provider>) -> ChatClientBuilder {
        ChatClientBuilder {
            provider,
            default_options: ChatOptions::default(),
            advisors: AdvisorChain::default(),
        }
    }

    pub fn provider_name(&self) -> &str {
        self.provider.name()
    }

    pub fn advisors(&self) -> &AdvisorChain {
        &self.advisors
    }

    pub fn prompt(&self, prompt: Prompt) -> ChatRequestSpec<'_> {
        ChatRequestSpec {
            client: self,
            prompt,
            conversation_id: None,
        }
    }
}

impl std::fmt::Debug for ChatClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChatClient")
            .field("provider", &self.provider.name())
            .field("default_options", &self.default_options)
            .field("advisors", &self.advisors)
            .finish()
    }
}

/// One request being prepared against a [`ChatClient`].
pub struct ChatRequestSpec<'a> {
    client: &'a ChatClient,
    prompt: Prompt,
    conversation_id: Option<ConversationId>,
}

impl<'a> ChatRequestSpec<'a> {
    pub fn conversation_id(mut self, id: ConversationId) -> Self {
        self.conversation_id = Some(id);
        self
    }

    fn advise(self, format_instructions: Option<String>) -> Result<AdvisedRequest> {
        if self.prompt.messages.is_empty() {
            return Err(Error::validation("prompt has no messages"));
        }
        let options = match &self.prompt.options {
            Some(options) => options.merged_over(&self.client.default_options),
            None => self.client.default_options.clone(),
        };
        Ok(AdvisedRequest {
            conversation_id: self.conversation_id.unwrap_or_default(),
            messages: self.prompt.messages,
            options,
            format_instructions,
        })
    }

    async fn exchange(self, format_instructions: Option<String>) -> Result<ChatResponse> {
        let client = self.client;
        let request = client.advisors.before(self.advise(format_instructions)?).await?;
        let response = client.provider.complete(request.to_provider_request()).await?;
        client.advisors.after(&request, response).await
    }

    /// Send the prompt and wait for the whole reply.
    pub async fn call(self) -> Result<ChatResponse> {
        self.exchange(None).await
    }

    /// Like [`call`](Self::call), returning just the reply text.
    pub async fn content(self) -> Result<String> {
        Ok(self.call().await?.message.content)
    }

    /// Ask for a reply shaped as `T` and parse it.
    pub async fn entity<T: StructuredOutput>(self) -> Result<T> {
        let response = self.exchange(Some(T::format_instructions())).await?;
        T::parse(response.content()).inspect_err(|e| {
            warn!(output = T::NAME, error = %e, "Reply did not match the requested shape");
        })
    }

    /// Send the prompt and stream the reply as text deltas.
    ///
    /// Advisors' `before` runs before this returns. Their `after` runs with
    /// the aggregated reply once the last delta has been handed over, and
    /// only if the stream is still held by then.
    pub async fn stream(self) -> Result<ContentStream> {
        let client = self.client;
        let request = client.advisors.before(self.advise(None)?).await?;
        let upstream = client.provider.stream(request.to_provider_request()).await?;

        let (tx, rx) = mpsc::channel(STREAM_BUFFER);
        tokio::spawn(forward(upstream, tx, client.advisors.clone(), request));
        Ok(ReceiverStream::new(rx))
    }
}

/// Relay provider chunks to the consumer, then run the after-hooks.
async fn forward(
    mut upstream: ChunkReceiver,
    tx: mpsc::Sender<Result<String>>,
    advisors: AdvisorChain,
    request: AdvisedRequest,
) {
    let mut text = String::new();
    let mut finish_reason = None;
    let mut usage = None;

    loop {
        let next = tokio::select! {
            next = upstream.recv() => next,
            _ = tx.closed() => {
                debug!(conversation_id = %request.conversation_id, "Stream dropped by consumer");
                return;
            }
        };
        let Some(next) = next else { break };

        match next {
            Ok(chunk) => {
                if chunk.finish_reason.is_some() {
                    finish_reason = chunk.finish_reason;
                }
                if chunk.usage.is_some() {
                    usage = chunk.usage;
                }
                if let Some(delta) = chunk.content.filter(|c| !c.is_empty()) {
                    text.push_str(&delta);
                    if tx.send(Ok(delta)).await.is_err() {
                        debug!(conversation_id = %request.conversation_id, "Stream dropped by consumer");
                        return;
                    }
                }
                if chunk.done {
                    break;
                }
            }
            Err(e) => {
                warn!(conversation_id = %request.conversation_id, error = %e, "Provider stream failed");
                let _ = tx.send(Err(e.into())).await;
                return;
            }
        }
    }

    if tx.is_closed() {
        return;
    }

    let response = ChatResponse {
        id: String::new(),
        model: request.options.model.clone().unwrap_or_default(),
        message: Message::assistant(text),
        finish_reason,
        usage,
    };
    if let Err(e) = advisors.after(&request, response).await {
        warn!(conversation_id = %request.conversation_id, error = %e, "Advisor failed after stream");
        let _ = tx.send(Err(e)).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::advisor::AdvisorSet;
    use crate::test_helpers::{CapturedLogs, Script, ScriptedProvider};
    use simplechat_core::emotion::{Emotion, EmotionEvaluation};
    use simplechat_core::error::ProviderError;
    use simplechat_core::memory::ChatMemory;
    use simplechat_core::message::Role;
    use simplechat_memory::MessageWindowMemory;
    use std::time::Duration;
    use tokio_stream::StreamExt;

    fn id(s: &str) -> ConversationId {
        ConversationId::parse(s).unwrap()
    }

    async fn collect(mut stream: ContentStream) -> Result<String> {
        let mut out = String::new();
        while let Some(delta) = stream.next().await {
            out.push_str(&delta?);
        }
        Ok(out)
    }

    #[tokio::test]
    async fn plain_client_sends_prompt_as_is() {
        let provider = Arc::new(ScriptedProvider::text(&["Paris"]));
        let client = ChatClient::builder(provider.clone()).build();

        let reply = client.prompt(Prompt::user("Capital of France?")).content().await.unwrap();
        assert_eq!(reply, "Paris");

        let sent = provider.requests();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].messages.len(), 1);
        assert_eq!(sent[0].messages[0].content, "Capital of France?");
    }

    #[tokio::test]
    async fn prompt_options_win_over_defaults() {
        let provider = Arc::new(ScriptedProvider::default());
        let defaults = ChatOptions {
            model: Some("gpt-4o-mini".into()),
            temperature: Some(0.7),
            ..Default::default()
        };
        let client = ChatClient::builder(provider.clone()).default_options(defaults).build();

        let prompt = Prompt::user("hi").with_options(ChatOptions {
            temperature: Some(0.1),
            ..Default::default()
        });
        client.prompt(prompt).call().await.unwrap();

        let options = &provider.requests()[0].options;
        assert_eq!(options.model.as_deref(), Some("gpt-4o-mini"));
        assert_eq!(options.temperature, Some(0.1));
    }

    #[tokio::test]
    async fn empty_prompt_is_rejected_before_the_provider() {
        let provider = Arc::new(ScriptedProvider::default());
        let client = ChatClient::builder(provider.clone()).build();

        let err = client.prompt(Prompt::default()).call().await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert!(provider.requests().is_empty());
    }

    #[tokio::test]
    async fn memory_carries_the_conversation() {
        let provider = Arc::new(ScriptedProvider::text(&["Hi Alice!", "Your name is Alice."]));
        let memory = Arc::new(MessageWindowMemory::default());
        let set = AdvisorSet::standard(memory);
        let client = ChatClient::builder(provider.clone()).advisors(set.full()).build();

        client
            .prompt(Prompt::user("My name is Alice."))
            .conversation_id(id("t1"))
            .call()
            .await
            .unwrap();
        client
            .prompt(Prompt::user("What is my name?"))
            .conversation_id(id("t1"))
            .call()
            .await
            .unwrap();

        let second = &provider.requests()[1];
        let contents: Vec<&str> = second.messages.iter().map(|m| m.content.as_str()).collect();
        assert_eq!(contents, vec!["My name is Alice.", "Hi Alice!", "What is my name?"]);
    }

    #[tokio::test]
    async fn context_is_bounded_by_the_window() {
        let provider = Arc::new(ScriptedProvider::default());
        let set = AdvisorSet::standard(Arc::new(MessageWindowMemory::new(10)));
        let client = ChatClient::builder(provider.clone()).advisors(set.silent()).build();

        for i in 0..8 {
            client
                .prompt(Prompt::user(format!("q{i}")))
                .conversation_id(id("t1"))
                .call()
                .await
                .unwrap();
        }

        let last = provider.requests().pop().unwrap();
        // 10 remembered messages, then the new prompt.
        assert_eq!(last.messages.len(), 11);
        assert_eq!(last.messages.last().unwrap().content, "q7");
        assert_eq!(last.messages[0].content, "q2");
    }

    #[tokio::test]
    async fn stream_yields_deltas_then_records_reply() {
        let provider = Arc::new(ScriptedProvider::new(vec![Script::Chunks(vec![
            "Hel".into(),
            "lo".into(),
            "!".into(),
        ])]));
        let memory = Arc::new(MessageWindowMemory::default());
        let set = AdvisorSet::standard(memory.clone());
        let client = ChatClient::builder(provider).advisors(set.full()).build();

        let stream = client
            .prompt(Prompt::user("hi"))
            .conversation_id(id("t1"))
            .stream()
            .await
            .unwrap();
        assert_eq!(collect(stream).await.unwrap(), "Hello!");

        // The after-hook runs right after the last delta is handed over.
        tokio::time::sleep(Duration::from_millis(20)).await;
        let stored = memory.get(&id("t1")).await.unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[1].role, Role::Assistant);
        assert_eq!(stored[1].content, "Hello!");
    }

    #[tokio::test]
    async fn dropped_stream_records_no_reply() {
        let provider = Arc::new(ScriptedProvider::new(vec![Script::Stall(vec!["partial".into()])]));
        let memory = Arc::new(MessageWindowMemory::default());
        let set = AdvisorSet::standard(memory.clone());
        let client = ChatClient::builder(provider).advisors(set.full()).build();

        let mut stream = client
            .prompt(Prompt::user("tell me a story"))
            .conversation_id(id("t1"))
            .stream()
            .await
            .unwrap();
        assert_eq!(stream.next().await.unwrap().unwrap(), "partial");
        drop(stream);

        tokio::time::sleep(Duration::from_millis(20)).await;
        let stored = memory.get(&id("t1")).await.unwrap();
        assert_eq!(stored.len(), 1);
        assert_eq!(stored[0].role, Role::User);
    }

    #[tokio::test]
    async fn provider_failure_mid_stream_ends_with_error() {
        let provider = Arc::new(ScriptedProvider::new(vec![Script::Fail(ProviderError::StreamInterrupted(
            "connection reset".into(),
        ))]));
        let client = ChatClient::builder(provider).build();

        let stream = client.prompt(Prompt::user("hi")).stream().await.unwrap();
        let err = collect(stream).await.unwrap_err();
        assert!(matches!(err, Error::Provider(ProviderError::StreamInterrupted(_))));
    }

    #[tokio::test]
    async fn entity_parses_and_keeps_memory_clean() {
        let answer = r#"{"emotion":"VERY_POSITIVE","reason":["exclamation mark","the word great"]}"#;
        let provider = Arc::new(ScriptedProvider::text(&[answer]));
        let memory = Arc::new(MessageWindowMemory::default());
        let set = AdvisorSet::standard(memory.clone());
        let client = ChatClient::builder(provider.clone()).advisors(set.full()).build();

        let eval: EmotionEvaluation = client
            .prompt(Prompt::user("This is great!"))
            .conversation_id(id("t1"))
            .entity()
            .await
            .unwrap();
        assert_eq!(eval.emotion, Emotion::VeryPositive);
        assert_eq!(eval.reason.len(), 2);

        let sent = &provider.requests()[0].messages[0].content;
        assert!(sent.starts_with("This is great!"));
        assert!(sent.contains("JSON Schema"));

        let stored = memory.get(&id("t1")).await.unwrap();
        assert_eq!(stored[0].content, "This is great!");
    }

    #[tokio::test]
    async fn entity_rejects_free_text() {
        let provider = Arc::new(ScriptedProvider::text(&["I think you are happy."]));
        let client = ChatClient::builder(provider).build();

        let err = client
            .prompt(Prompt::user("This is great!"))
            .entity::<EmotionEvaluation>()
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[tokio::test]
    async fn logger_writes_request_and_response() {
        let logs = CapturedLogs::default();
        let _guard = logs.install();

        let provider = Arc::new(ScriptedProvider::text(&["pong"]));
        let set = AdvisorSet::standard(Arc::new(MessageWindowMemory::default()));
        let client = ChatClient::builder(provider).advisors(set.full()).build();
        client.prompt(Prompt::user("ping")).conversation_id(id("t1")).call().await.unwrap();

        let out = logs.contents();
        assert!(out.contains("request"));
        assert!(out.contains("ping"));
        assert!(out.contains("pong"));
    }
}
