//! Route definitions for the CekFakta gateway.
//!
//! - `POST /api/analyze` - classify a message
//! - `GET /api/health`, `GET /health` - liveness

use crate::analyzer::{AnalysisResult, Analyzer, Outcome};
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use cekfakta_common::logging::generate_request_id;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;
use tracing::Instrument;

/// Message returned when the request carries no usable text.
pub const EMPTY_TEXT_MESSAGE: &str = "Teks tidak boleh kosong";

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<Analyzer>,
}

/// Response envelope for `/api/analyze`.
#[derive(Debug, Serialize)]
pub struct AnalyzeResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<AnalysisResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl AnalyzeResponse {
    fn ok(result: AnalysisResult) -> Self {
        Self {
            success: true,
            result: Some(result),
            error: None,
        }
    }

    fn err(error: impl Into<String>) -> Self {
        Self {
            success: false,
            result: None,
            error: Some(error.into()),
        }
    }
}

/// Health check response.
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub service: String,
    pub version: String,
}

/// Build the analysis routes.
pub fn analyze_routes(state: AppState) -> Router {
    Router::new()
        .route("/api/analyze", post(analyze_handler))
        .with_state(state)
}

/// Build health check routes.
pub fn health_routes() -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/api/health", get(health_handler))
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// Analyze handler.
///
/// 400 for missing or blank text, 413 for a body over the size limit,
/// 200 for full or partial success, 500 when no usable classification
/// could be produced (including over-length text).
async fn analyze_handler(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> (StatusCode, Json<AnalyzeResponse>) {
    let text = match &payload {
        Ok(Json(body)) => body.get("text").and_then(Value::as_str),
        Err(JsonRejection::BytesRejection(rejection)) => {
            tracing::warn!(error = %rejection, "Could not read analyze body");
            return (
                rejection.status(),
                Json(AnalyzeResponse::err(rejection.body_text())),
            );
        }
        Err(rejection) => {
            tracing::debug!(error = %rejection, "Rejected analyze body");
            None
        }
    };

    let Some(text) = text.filter(|t| !t.trim().is_empty()) else {
        return (
            StatusCode::BAD_REQUEST,
            Json(AnalyzeResponse::err(EMPTY_TEXT_MESSAGE)),
        );
    };

    let span = tracing::info_span!("analyze", request_id = %generate_request_id());
    let result = state.analyzer.analyze(text).instrument(span).await;

    match result.outcome() {
        Outcome::Success | Outcome::PartialSuccess => {
            (StatusCode::OK, Json(AnalyzeResponse::ok(result)))
        }
        Outcome::Failure => {
            let error = result
                .error
                .unwrap_or_else(|| "Unable to analyze text".to_string());
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(AnalyzeResponse::err(error)),
            )
        }
    }
}

/// Health check handler.
async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".into(),
        service: "CekFakta AI".into(),
        version: env!("CARGO_PKG_VERSION").into(),
    })
}
