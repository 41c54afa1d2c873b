//! Analyze Routes
//!
//! Single-tweet and batch CSV classification.

use axum::{extract::State, routing::post, Extension, Json, Router};
use serde::{Deserialize, Serialize};
use toxicity_core::{AnalysisResult, ScoreTriple, SentimentLabel};
use tweet_analyzer::{analyze_csv, BatchReport};

use crate::request_id::RequestId;
use crate::{ApiResponse, AppError, AppState};

#[derive(Deserialize, utoipa::ToSchema)]
pub struct AnalyzeRequest {
    pub tweet: String,
}

#[derive(Serialize, Deserialize, utoipa::ToSchema)]
pub struct AnalyzeResponse {
    pub sentiment: SentimentLabel,
    pub confidence: f64,
    pub scores: ScoreTriple,
    pub message: String,
}

impl From<AnalysisResult> for AnalyzeResponse {
    fn from(result: AnalysisResult) -> Self {
        Self {
            message: result.message(),
            sentiment: result.label,
            confidence: result.confidence,
            scores: result.scores,
        }
    }
}

pub fn analyze_routes() -> Router<AppState> {
    Router::new()
        .route("/analyze", post(analyze_tweet))
        .route("/analyze/batch", post(analyze_batch))
}

/// Classify one tweet
#[utoipa::path(
    post,
    path = "/analyze",
    request_body = AnalyzeRequest,
    responses(
        (status = 200, description = "Calibrated sentiment for the tweet", body = AnalyzeResponse),
        (status = 400, description = "Empty tweet"),
        (status = 503, description = "No model available")
    ),
    tag = "Analysis"
)]
pub(crate) async fn analyze_tweet(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(req): Json<AnalyzeRequest>,
) -> Result<Json<AnalyzeResponse>, AppError> {
    let result = state.analyzer.analyze(&req.tweet).await?;

    tracing::info!(
        request_id = %request_id,
        sentiment = %result.label,
        confidence = result.confidence,
        "Tweet analyzed"
    );

    Ok(Json(result.into()))
}

/// Classify every row of a CSV with a `tweet` column
#[utoipa::path(
    post,
    path = "/analyze/batch",
    request_body(content = String, content_type = "text/csv"),
    responses(
        (status = 200, description = "Per-row results, failures and summary"),
        (status = 400, description = "Unreadable CSV or missing tweet column")
    ),
    tag = "Analysis"
)]
pub(crate) async fn analyze_batch(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    body: String,
) -> Result<Json<ApiResponse<BatchReport>>, AppError> {
    let report = analyze_csv(&state.analyzer, &body).await?;

    tracing::info!(
        request_id = %request_id,
        rows = report.summary.total,
        failed = report.summary.failed,
        "Batch analyzed"
    );

    Ok(Json(ApiResponse::success(report)))
}
