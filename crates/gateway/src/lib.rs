//! HTTP gateway for SimpleChat.
//!
//! Exposes the chat service over HTTP:
//!
//! - `POST /simple/{call,stream,emotion}`: memory-backed chat
//! - `GET  /tutorial/{ai,call,stream}`: stateless one-shot prompts
//! - `GET  /health`: liveness
//! - `GET  /`, `/static/*`: embedded web UI
//!
//! Built on Axum. [`bootstrap`] wires provider → memory → advisors →
//! clients → service from configuration.

pub mod error;
pub mod frontend;
pub mod simple;
pub mod tutorial;

#[cfg(test)]
mod test_helpers;

use axum::extract::DefaultBodyLimit;
use axum::http::{HeaderValue, Method, header};
use axum::response::sse::{Event, Sse};
use axum::{Json, Router, routing::get};
use futures::Stream;
use serde::Serialize;
use std::sync::Arc;
use tokio_stream::StreamExt;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::info;

use simplechat_client::{AdvisorSet, ChatClient, ChatService, ContentStream};
use simplechat_config::{AppConfig, GatewayConfig};
use simplechat_core::error::Error;
use simplechat_core::memory::ChatMemory;
use simplechat_core::provider::Provider;
use simplechat_memory::MessageWindowMemory;

pub use error::ApiError;

// ── State ─────────────────────────────────────────────────────────────────

/// Everything the handlers need, built once at startup.
pub struct AppState {
    /// Memory-backed service behind `/simple/*` and the CLI runner.
    pub service: ChatService,

    /// Advisor-free client behind `/tutorial/*`.
    pub tutorial: ChatClient,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    pub fn new(provider: Arc<dyn Provider>, config: &AppConfig) -> Self {
        let memory: Arc<dyn ChatMemory> = Arc::new(MessageWindowMemory::new(config.memory.max_messages));
        let advisors = AdvisorSet::standard(memory);
        let options = config.provider.default_options();

        Self {
            service: ChatService::new(provider.clone(), options.clone(), &advisors),
            tutorial: ChatClient::builder(provider).default_options(options).build(),
        }
    }
}

/// Build the shared state from configuration.
pub fn bootstrap(config: &AppConfig) -> Result<SharedState, Error> {
    let provider = simplechat_providers::build_from_config(&config.provider)?;
    info!(
        provider = provider.name(),
        model = %config.provider.model,
        max_messages = config.memory.max_messages,
        "Chat service ready"
    );
    Ok(Arc::new(AppState::new(provider, config)))
}

// ── Router ────────────────────────────────────────────────────────────────

/// Build the full router.
///
/// Layers: 1 MB body limit, CORS for the gateway's own origin, HTTP trace
/// logging.
pub fn build_router(state: SharedState, gateway: &GatewayConfig) -> Router {
    let origin = format!("http://{}:{}", gateway.host, gateway.port);
    let cors = CorsLayer::new()
        .allow_origin(match HeaderValue::from_str(&origin) {
            Ok(origin) => AllowOrigin::exact(origin),
            Err(_) => AllowOrigin::list(Vec::<HeaderValue>::new()),
        })
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE])
        .max_age(std::time::Duration::from_secs(3600));

    Router::new()
        .route("/health", get(health_handler))
        .nest("/simple", simple::simple_router())
        .nest("/tutorial", tutorial::tutorial_router())
        .with_state(state)
        .merge(frontend::frontend_router())
        .layer(DefaultBodyLimit::max(1024 * 1024))
        .layer(cors)
        .layer(tower_http::trace::TraceLayer::new_for_http())
}

/// Bind and serve until the server fails.
pub async fn start(config: &AppConfig, state: SharedState) -> Result<(), Box<dyn std::error::Error>> {
    let addr = format!("{}:{}", config.gateway.host, config.gateway.port);
    let app = build_router(state, &config.gateway);

    info!(addr = %addr, "Gateway starting");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// One `data:` event per text delta. A failed stream aborts the body
/// without a completion event.
pub(crate) fn sse_body(stream: ContentStream) -> Sse<impl Stream<Item = Result<Event, Error>>> {
    Sse::new(stream.map(|delta| delta.map(|text| Event::default().data(text))))
}

// --- Handlers ---

#[derive(Serialize)]
struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
    })
}
