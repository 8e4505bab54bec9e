//! Shared test helpers for client tests.

use simplechat_core::error::ProviderError;
use simplechat_core::message::Message;
use simplechat_core::provider::{ChatResponse, ChunkReceiver, Provider, ProviderRequest, StreamChunk, Usage};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tracing_subscriber::fmt::MakeWriter;

/// What the provider does on its next call.
#[derive(Clone)]
pub enum Script {
    /// Answer with this text (streamed word by word).
    Text(String),
    /// Stream exactly these chunks.
    Chunks(Vec<String>),
    /// Send these chunks, then hold the stream open until it is dropped.
    Stall(Vec<String>),
    Fail(ProviderError),
}

/// A provider that plays back scripted answers and records every request.
///
/// When the script runs out it answers `"ok"`.
#[derive(Default)]
pub struct ScriptedProvider {
    script: Mutex<VecDeque<Script>>,
    requests: Mutex<Vec<ProviderRequest>>,
}

impl ScriptedProvider {
    pub fn new(script: Vec<Script>) -> Self {
        Self {
            script: Mutex::new(script.into()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn text(answers: &[&str]) -> Self {
        Self::new(answers.iter().map(|a| Script::Text(a.to_string())).collect())
    }

    pub fn requests(&self) -> Vec<ProviderRequest> {
        self.requests.lock().unwrap().clone()
    }

    fn next(&self, request: ProviderRequest) -> Script {
        self.requests.lock().unwrap().push(request);
        self.script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Script::Text("ok".into()))
    }
}

pub fn make_response(text: &str) -> ChatResponse {
    ChatResponse {
        id: "resp-1".into(),
        model: "mock-model".into(),
        message: Message::assistant(text),
        finish_reason: Some("stop".into()),
        usage: Some(Usage {
            prompt_tokens: 10,
            completion_tokens: 5,
            total_tokens: 15,
        }),
    }
}

fn chunk(content: &str) -> Result<StreamChunk, ProviderError> {
    Ok(StreamChunk {
        content: Some(content.to_string()),
        ..Default::default()
    })
}

#[async_trait::async_trait]
impl Provider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ChatResponse, ProviderError> {
        match self.next(request) {
            Script::Text(text) => Ok(make_response(&text)),
            Script::Chunks(parts) | Script::Stall(parts) => Ok(make_response(&parts.concat())),
            Script::Fail(e) => Err(e),
        }
    }

    async fn stream(&self, request: ProviderRequest) -> Result<ChunkReceiver, ProviderError> {
        let script = self.next(request);
        let (tx, rx) = tokio::sync::mpsc::channel(16);
        tokio::spawn(async move {
            match script {
                Script::Text(text) => {
                    let words: Vec<String> = text.split_inclusive(' ').map(String::from).collect();
                    for word in words {
                        if tx.send(chunk(&word)).await.is_err() {
                            return;
                        }
                    }
                    let _ = tx.send(Ok(StreamChunk { done: true, ..Default::default() })).await;
                }
                Script::Chunks(parts) => {
                    for part in parts {
                        if tx.send(chunk(&part)).await.is_err() {
                            return;
                        }
                    }
                    let _ = tx.send(Ok(StreamChunk { done: true, ..Default::default() })).await;
                }
                Script::Stall(parts) => {
                    for part in parts {
                        if tx.send(chunk(&part)).await.is_err() {
                            return;
                        }
                    }
                    tx.closed().await;
                }
                Script::Fail(e) => {
                    let _ = tx.send(Err(e)).await;
                }
            }
        });
        Ok(rx)
    }
}

/// Log output captured from a scoped tracing subscriber.
#[derive(Clone, Default)]
pub struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

impl CapturedLogs {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }

    /// Install a debug-level subscriber for the current thread.
    pub fn install(&self) -> tracing::subscriber::DefaultGuard {
        let subscriber = tracing_subscriber::fmt()
            .with_writer(self.clone())
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .finish();
        tracing::subscriber::set_default(subscriber)
    }
}

impl std::io::Write for CapturedLogs {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for CapturedLogs {
    type Writer = CapturedLogs;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}
