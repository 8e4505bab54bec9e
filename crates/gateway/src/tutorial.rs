//! `/tutorial/*`: one-shot prompts through a client with no advisors.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::response::sse::{Event, Sse};
use axum::routing::get;
use axum::{Json, Router};
use futures::Stream;
use serde::Deserialize;

use simplechat_client::Prompt;
use simplechat_core::error::Error;
use simplechat_core::provider::ChatResponse;

use crate::{ApiError, SharedState, sse_body};

pub fn tutorial_router() -> Router<SharedState> {
    Router::new()
        .route("/ai", get(ai_handler))
        .route("/call", get(call_handler))
        .route("/stream", get(stream_handler))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TutorialQuery {
    #[serde(default)]
    user_input: String,
}

fn prompt_from(query: Result<Query<TutorialQuery>, QueryRejection>) -> Result<Prompt, ApiError> {
    let Query(query) = query?;
    if query.user_input.is_empty() {
        return Err(Error::validation("userInput must not be empty").into());
    }
    Ok(Prompt::user(query.user_input))
}

/// Plain-text reply.
async fn ai_handler(
    State(state): State<SharedState>,
    query: Result<Query<TutorialQuery>, QueryRejection>,
) -> Result<String, ApiError> {
    let prompt = prompt_from(query)?;
    Ok(state.tutorial.prompt(prompt).content().await?)
}

async fn call_handler(
    State(state): State<SharedState>,
    query: Result<Query<TutorialQuery>, QueryRejection>,
) -> Result<Json<ChatResponse>, ApiError> {
    let prompt = prompt_from(query)?;
    Ok(Json(state.tutorial.prompt(prompt).call().await?))
}

async fn stream_handler(
    State(state): State<SharedState>,
    query: Result<Query<TutorialQuery>, QueryRejection>,
) -> Result<Sse<impl Stream<Item = Result<Event, Error>>>, ApiError> {
    let prompt = prompt_from(query)?;
    let stream = state.tutorial.prompt(prompt).stream().await?;
    Ok(sse_body(stream))
}

#[cfg(test)]
mod tests {
    use crate::test_helpers::{MockProvider, app, get};
    use axum::http::StatusCode;
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    async fn body_text(response: axum::response::Response) -> String {
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        String::from_utf8_lossy(&bytes).into_owned()
    }

    #[tokio::test]
    async fn ai_returns_plain_text() {
        let response = app(MockProvider::replying(&["42"]))
            .oneshot(get("/tutorial/ai?userInput=meaning%20of%20life"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers()["content-type"].to_str().unwrap().starts_with("text/plain"));
        assert_eq!(body_text(response).await, "42");
    }

    #[tokio::test]
    async fn call_returns_chat_response() {
        let response = app(MockProvider::replying(&["Bonjour"]))
            .oneshot(get("/tutorial/call?userInput=hello"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let json: serde_json::Value = serde_json::from_str(&body_text(response).await).unwrap();
        assert_eq!(json["message"]["content"], "Bonjour");
        assert_eq!(json["model"], "mock-model");
    }

    #[tokio::test]
    async fn stream_emits_sse_chunks() {
        let response = app(MockProvider::replying(&["one ", "two"]))
            .oneshot(get("/tutorial/stream?userInput=count"))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        let text = body_text(response).await;
        assert!(text.contains("data: one \n\n"));
        assert!(text.contains("data: two\n\n"));
    }

    #[tokio::test]
    async fn missing_or_empty_input_is_rejected() {
        for uri in ["/tutorial/ai", "/tutorial/call?userInput=", "/tutorial/stream"] {
            let provider = MockProvider::default();
            let requests = provider.requests();
            let response = app(provider).oneshot(get(uri)).await.unwrap();
            assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{uri}");
            assert!(requests.lock().unwrap().is_empty());
        }
    }

    #[tokio::test]
    async fn tutorial_calls_carry_no_history() {
        let provider = MockProvider::replying(&["ok"]);
        let requests = provider.requests();
        let router = app(provider);

        for input in ["first", "second"] {
            router
                .clone()
                .oneshot(get(&format!("/tutorial/call?userInput={input}")))
                .await
                .unwrap();
        }

        let sent = requests.lock().unwrap();
        assert_eq!(sent[1].messages.len(), 1);
        assert_eq!(sent[1].messages[0].content, "second");
    }
}
