use axum::{extract::State, routing::get, Json, Router};
use serde::Serialize;
use serde_json::{json, Value};
use toxicity_core::BackendKind;
use tweet_analyzer::{SampleTweet, SAMPLE_TWEETS};

use crate::{ApiResponse, AppState};

#[derive(Serialize, utoipa::ToSchema)]
pub struct HealthResponse {
    pub status: &'static str,
    /// Whether the transformer backend is part of the chain
    pub model_loaded: bool,
    pub backend: BackendKind,
    pub fallback_count: u64,
}

pub fn status_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/samples", get(samples))
}

#[utoipa::path(get, path = "/", responses((status = 200, description = "Service info")), tag = "Status")]
pub(crate) async fn root() -> Json<Value> {
    Json(json!({
        "message": "Twitter Toxicity Detection API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "/health": "Health check",
            "/analyze": "POST - Analyze tweet toxicity",
            "/analyze/batch": "POST - Analyze a CSV with a tweet column",
            "/samples": "Guided sample tweets",
            "/api-docs/openapi.json": "OpenAPI document"
        }
    }))
}

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Model status", body = HealthResponse)),
    tag = "Status"
)]
pub(crate) async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        model_loaded: state.analyzer.transformer_loaded(),
        backend: state.analyzer.active_backend(),
        fallback_count: state.analyzer.fallback_count(),
    })
}

#[utoipa::path(get, path = "/samples", responses((status = 200, description = "Sample tweets")), tag = "Status")]
pub(crate) async fn samples() -> Json<ApiResponse<Vec<SampleTweet>>> {
    Json(ApiResponse::success(SAMPLE_TWEETS.to_vec()))
}
