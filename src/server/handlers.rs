//! HTTP request handlers

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde::Serialize;
use serde_json::{json, Value};

use super::AppState;
use crate::pipeline::SummaryRequest;
use crate::resolver::VideoId;
use crate::store::{HistoryEntry, ProgressState};
use crate::SummarizerError;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    status: &'static str,
    version: &'static str,
}

#[derive(Debug, Serialize)]
pub struct SummarizeResponse {
    summary: String,
    video_id: VideoId,
}

/// GET /health
pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy",
        version: env!("CARGO_PKG_VERSION"),
    })
}

/// POST /summarize - body `{url, deepseek_key?, searchapi_key?}`
pub async fn summarize(
    State(state): State<AppState>,
    body: Result<Json<SummaryRequest>, JsonRejection>,
) -> Result<Json<SummarizeResponse>, SummarizerError> {
    let Json(request) = body.map_err(|rejection| {
        tracing::debug!("Rejected summarize body: {}", rejection);
        SummarizerError::Validation(
            "Request body must be a JSON object with a \"url\" field".to_string(),
        )
    })?;

    match state.pipeline.run(&request).await {
        Ok(artifact) => Ok(Json(SummarizeResponse {
            summary: artifact.summary,
            video_id: artifact.video_id,
        })),
        Err(e) => {
            tracing::info!("Summarize request failed: {}", e);
            Err(e)
        }
    }
}

/// GET /progress - never fails, defaults to `Ready`
pub async fn progress(State(state): State<AppState>) -> Json<ProgressState> {
    Json(state.pipeline.progress().await)
}

/// GET /history - never fails, defaults to `[]`
pub async fn history(State(state): State<AppState>) -> Json<Vec<HistoryEntry>> {
    Json(state.pipeline.history().await)
}

pub async fn not_found() -> (StatusCode, Json<Value>) {
    (StatusCode::NOT_FOUND, Json(json!({ "error": "Resource not found" })))
}
