//! HTTP server setup and routing
//!
//! Exposes the summarization pipeline over JSON endpoints:
//! `POST /summarize`, `GET /progress`, `GET /history`, `GET /health`, plus a small
//! landing page at `/`.

use anyhow::{Context, Result};
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::pipeline::SummaryPipeline;
use crate::SummarizerError;

pub mod handlers;

/// Shared application context passed to all handlers
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<SummaryPipeline>,
}

impl AppState {
    pub fn new(pipeline: SummaryPipeline) -> Self {
        Self {
            pipeline: Arc::new(pipeline),
        }
    }
}

impl IntoResponse for SummarizerError {
    fn into_response(self) -> Response {
        let status = if self.is_client_error() {
            StatusCode::BAD_REQUEST
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

/// Build the router with all routes
pub fn router(state: AppState) -> Router {
    let index = Html(include_str!("index.html").replace("{{VERSION}}", env!("CARGO_PKG_VERSION")));

    Router::new()
        .route(
            "/",
            get(move || {
                let page = index.clone();
                async move { page }
            }),
        )
        .route("/health", get(handlers::health))
        .route("/summarize", post(handlers::summarize))
        .route("/progress", get(handlers::progress))
        .route("/history", get(handlers::history))
        .fallback(handlers::not_found)
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
}

/// Run HTTP API server until Ctrl-C
pub async fn run(state: AppState, host: &str, port: u16) -> Result<()> {
    let addr = format!("{}:{}", host, port);
    info!("Starting HTTP server on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("HTTP server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
}
