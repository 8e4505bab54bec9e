//! Shared test helpers for gateway tests.

use crate::{AppState, build_router};
use axum::Router;
use axum::body::Body;
use axum::http::Request;
use simplechat_config::AppConfig;
use simplechat_core::error::ProviderError;
use simplechat_core::message::Message;
use simplechat_core::provider::{ChatResponse, ChunkReceiver, Provider, ProviderRequest, StreamChunk};
use std::sync::{Arc, Mutex};

/// Replies with a fixed text (streamed in the given pieces) or fails.
/// Every request is recorded.
pub struct MockProvider {
    pieces: Vec<String>,
    failure: Option<ProviderError>,
    requests: Arc<Mutex<Vec<ProviderRequest>>>,
}

impl Default for MockProvider {
    fn default() -> Self {
        Self::replying(&["Hello", " there!"])
    }
}

impl MockProvider {
    pub fn replying(pieces: &[&str]) -> Self {
        Self {
            pieces: pieces.iter().map(|p| p.to_string()).collect(),
            failure: None,
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn failing(error: ProviderError) -> Self {
        Self {
            pieces: Vec::new(),
            failure: Some(error),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Handle on the recorded requests, usable after the provider is moved.
    pub fn requests(&self) -> Arc<Mutex<Vec<ProviderRequest>>> {
        self.requests.clone()
    }
}

#[async_trait::async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(&self, request: ProviderRequest) -> Result<ChatResponse, ProviderError> {
        self.requests.lock().unwrap().push(request);
        if let Some(e) = &self.failure {
            return Err(e.clone());
        }
        Ok(ChatResponse {
            id: "chatcmpl-1".into(),
            model: "mock-model".into(),
            message: Message::assistant(self.pieces.concat()),
            finish_reason: Some("stop".into()),
            usage: None,
        })
    }

    async fn stream(&self, request: ProviderRequest) -> Result<ChunkReceiver, ProviderError> {
        self.requests.lock().unwrap().push(request);
        let (tx, rx) = tokio::sync::mpsc::channel(16);
        let pieces = self.pieces.clone();
        let failure = self.failure.clone();
        tokio::spawn(async move {
            for piece in pieces {
                let chunk = StreamChunk {
                    content: Some(piece),
                    ..Default::default()
                };
                if tx.send(Ok(chunk)).await.is_err() {
                    return;
                }
            }
            let last = match failure {
                Some(e) => Err(e),
                None => Ok(StreamChunk {
                    done: true,
                    finish_reason: Some("stop".into()),
                    ..Default::default()
                }),
            };
            let _ = tx.send(last).await;
        });
        Ok(rx)
    }
}

pub fn app(provider: MockProvider) -> Router {
    let config = AppConfig::default();
    let state = Arc::new(AppState::new(Arc::new(provider), &config));
    build_router(state, &config.gateway)
}

pub fn post_json(uri: &str, body: serde_json::Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

pub fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}
