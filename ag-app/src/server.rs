//! HTTP wiring: collaborator construction, the webhook route, and the
//! health probe.

use crate::agents::AgentRegistry;
use crate::config::AppConfig;
use crate::handler::{FunctionEvent, Handler};
use crate::session::SessionManager;
use crate::store::{HttpObjectStore, MemoryStore, SessionStore};
use ag_llm::{AgentSelector, ResponsesClient};
use ag_telegram::TelegramApi;
use anyhow::Result;
use axum::Router;
use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use axum::routing::{get, post};
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

pub async fn serve(cfg: AppConfig) -> Result<()> {
    cfg.validate()?;
    let addr: SocketAddr = cfg.bind_addr.parse()?;
    let handler = build_handler(&cfg)?;

    let trace_layer = TraceLayer::new_for_http()
        .make_span_with(|request: &Request<_>| {
            tracing::info_span!(
                "http.request",
                method = %request.method(),
                uri = %request.uri(),
            )
        })
        .on_response(
            |response: &Response, latency: Duration, _span: &tracing::Span| {
                tracing::info!(
                    status = response.status().as_u16(),
                    latency_ms = latency.as_millis() as u64,
                    "http request completed"
                );
            },
        );

    let app = router(handler)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(55),
        ))
        .layer(trace_layer);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "agentgram serving");
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("http server shutdown completed");
    Ok(())
}

/// Validate configuration without binding anything.
pub async fn doctor(cfg: AppConfig) -> Result<()> {
    cfg.validate()?;
    let registry = AgentRegistry::from_config(cfg.agents_json.as_deref());
    if registry.is_empty() && cfg.default_model.is_none() {
        return Err(anyhow::anyhow!(
            "no agents configured: set AGENTS_JSON or DEFAULT_MODEL"
        ));
    }
    if let Some(base_url) = cfg.store_base_url.as_deref() {
        HttpObjectStore::new(base_url)?;
    }
    tracing::info!(
        agents = registry.len(),
        inline_prompt = registry.is_empty(),
        session_store = cfg.store_base_url.is_some(),
        responses_base_url = %cfg.responses_base_url,
        "config ok"
    );
    Ok(())
}

pub fn build_handler(cfg: &AppConfig) -> Result<Arc<Handler>> {
    let registry = AgentRegistry::from_config(cfg.agents_json.as_deref());

    let store: Arc<dyn SessionStore> = match cfg.store_base_url.as_deref() {
        Some(base_url) => Arc::new(
            HttpObjectStore::new(base_url)?.with_auth_token(cfg.store_auth_token.clone()),
        ),
        None => {
            tracing::warn!("SESSION_STORE_URL not set; sessions will not survive a restart");
            Arc::new(MemoryStore::new())
        }
    };

    let inline_prompt = match (registry.is_empty(), cfg.default_model.clone()) {
        (true, Some(model)) => Some(AgentSelector::Inline {
            model,
            instructions: cfg.system_prompt.clone(),
        }),
        _ => None,
    };

    let bot = Arc::new(TelegramApi::new(&cfg.telegram_bot_token)?);
    let completions = Arc::new(
        ResponsesClient::new(&cfg.responses_api_key, &cfg.responses_base_url)
            .with_project(cfg.responses_project.clone()),
    );

    Ok(Arc::new(Handler::new(
        SessionManager::new(store, registry),
        bot,
        completions,
        inline_prompt,
    )))
}

fn router(handler: Arc<Handler>) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/webhook", post(webhook))
        .with_state(handler)
}

async fn healthz() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// The raw request body goes through the same envelope the function runtime
/// delivers, so string and object payloads take one code path.
async fn webhook(State(handler): State<Arc<Handler>>, body: String) -> Response {
    let outcome = handler.handle(FunctionEvent::from_raw_body(body)).await;
    let status = StatusCode::from_u16(outcome.status_code)
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(outcome.body)).into_response()
}

async fn shutdown_signal() {
    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "failed to install ctrl-c handler");
    }
    tracing::info!("shutdown signal received");
}
