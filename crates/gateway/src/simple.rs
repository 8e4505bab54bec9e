//! `/simple/*`: memory-backed chat endpoints.
//!
//! - `POST /simple/call`: JSON ChatResponse
//! - `POST /simple/stream`: SSE text deltas (no advisor logging)
//! - `POST /simple/emotion`: JSON EmotionEvaluation

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::sse::{Event, Sse};
use axum::routing::post;
use axum::{Json, Router};
use futures::Stream;
use tracing::info;

use simplechat_client::PromptBody;
use simplechat_core::emotion::EmotionEvaluation;
use simplechat_core::error::Error;
use simplechat_core::provider::ChatResponse;

use crate::{ApiError, SharedState, sse_body};

pub fn simple_router() -> Router<SharedState> {
    Router::new()
        .route("/call", post(call_handler))
        .route("/stream", post(stream_handler))
        .route("/emotion", post(emotion_handler))
}

async fn call_handler(
    State(state): State<SharedState>,
    body: Result<Json<PromptBody>, JsonRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let Json(body) = body?;
    let (conversation_id, prompt) = body.assemble()?;
    info!(conversation_id = %conversation_id, "simple/call");

    Ok(Json(state.service.call(&conversation_id, prompt).await?))
}

async fn stream_handler(
    State(state): State<SharedState>,
    body: Result<Json<PromptBody>, JsonRejection>,
) -> Result<Sse<impl Stream<Item = Result<Event, Error>>>, ApiError> {
    let Json(body) = body?;
    let (conversation_id, prompt) = body.assemble()?;
    info!(conversation_id = %conversation_id, "simple/stream");

    let stream = state.service.stream_without_logger(&conversation_id, prompt).await?;
    Ok(sse_body(stream))
}

async fn emotion_handler(
    State(state): State<SharedState>,
    body: Result<Json<PromptBody>, JsonRejection>,
) -> Result<Json<EmotionEvaluation>, ApiError> {
    let Json(body) = body?;
    let (conversation_id, prompt) = body.assemble()?;
    info!(conversation_id = %conversation_id, "simple/emotion");

    Ok(Json(state.service.call_emotion_evaluation(&conversation_id, prompt).await?))
}
