//! Twitter Toxicity Detection API
//!
//! Axum front end over the tweet analyzer. One analyzer is built at startup
//! and shared by every request through `AppState`.

mod analyze_routes;
pub mod config;
mod request_id;
mod security_headers;
mod status_routes;

pub use config::ServerConfig;

use anyhow::Context;
use axum::{
    http::{header, HeaderValue, Method, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use calibration_engine::CalibrationEngine;
use model_client::discover_backends;
use serde::Serialize;
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tweet_analyzer::{AnalyzerError, BackendChain, TweetAnalyzer};
use utoipa::OpenApi;

#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<TweetAnalyzer>,
}

#[derive(Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Handler error carrying the HTTP status to answer with.
pub struct AppError {
    status: StatusCode,
    error: anyhow::Error,
}

impl AppError {
    pub fn with_status(status: StatusCode, error: anyhow::Error) -> Self {
        Self { status, error }
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        Self::with_status(StatusCode::INTERNAL_SERVER_ERROR, error)
    }
}

impl From<AnalyzerError> for AppError {
    fn from(error: AnalyzerError) -> Self {
        let status = match &error {
            AnalyzerError::EmptyInput | AnalyzerError::Csv(_) | AnalyzerError::MissingColumn(_) => {
                StatusCode::BAD_REQUEST
            }
            AnalyzerError::NoModelAvailable(_) | AnalyzerError::BackendUnavailable(_) => {
                StatusCode::SERVICE_UNAVAILABLE
            }
            AnalyzerError::Inference(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        Self::with_status(status, anyhow::anyhow!("Analysis failed: {}", error))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!("Request failed: {:#}", self.error);
        }
        (
            self.status,
            Json(ApiResponse::<()>::error(self.error.to_string())),
        )
            .into_response()
    }
}

#[derive(OpenApi)]
#[openapi(
    info(title = "Twitter Toxicity Detection API"),
    paths(
        status_routes::root,
        status_routes::health,
        status_routes::samples,
        analyze_routes::analyze_tweet,
        analyze_routes::analyze_batch,
    ),
    components(schemas(
        analyze_routes::AnalyzeRequest,
        analyze_routes::AnalyzeResponse,
        status_routes::HealthResponse,
        toxicity_core::SentimentLabel,
        toxicity_core::ScoreTriple,
        toxicity_core::BackendKind,
    )),
    tags(
        (name = "Analysis", description = "Tweet toxicity classification"),
        (name = "Status", description = "Service and model status")
    )
)]
pub struct ApiDoc;

async fn openapi_json() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}

/// Allow the listed origins, or any origin when none are configured.
pub fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    if origins.is_empty() {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin: {}", o);
                None
            }
        })
        .collect();
    layer.allow_origin(allowed)
}

/// Root span per request; `request_id` is filled in by the request id middleware.
fn http_span(request: &axum::extract::Request) -> tracing::Span {
    tracing::info_span!(
        "http_request",
        method = %request.method(),
        uri = %request.uri(),
        request_id = tracing::field::Empty,
    )
}

pub fn build_router(state: AppState, cors: CorsLayer) -> Router {
    Router::new()
        .merge(status_routes::status_routes())
        .merge(analyze_routes::analyze_routes())
        .route("/api-docs/openapi.json", get(openapi_json))
        .layer(middleware::from_fn(
            security_headers::security_headers_middleware,
        ))
        .layer(middleware::from_fn(request_id::request_id_middleware))
        .layer(cors)
        .layer(TraceLayer::new_for_http().make_span_with(http_span))
        .with_state(state)
}

fn init_tracing() {
    let json_logging = std::env::var("RUST_LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if json_logging {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(env_filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }
}

pub async fn run_server() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    tracing::info!("Starting Twitter Toxicity Detection API");

    let config = ServerConfig::from_env()?;
    let policy = config.load_policy()?;
    if let Some(path) = &config.policy_path {
        tracing::info!("Calibration policy loaded from {}", path.display());
    }

    let backends = discover_backends(&config.backends).await;
    let chain = BackendChain::from_loaded(backends).context("No usable model at startup")?;
    let analyzer = TweetAnalyzer::new(chain, CalibrationEngine::new(policy));
    tracing::info!(
        "Primary backend: {} (transformer loaded: {})",
        analyzer.active_backend(),
        analyzer.transformer_loaded()
    );

    let state = AppState {
        analyzer: Arc::new(analyzer),
    };
    let app = build_router(state, cors_layer(&config.cors_origins));

    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;
    tracing::info!("Listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutdown signal received");
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use axum::body::{to_bytes, Body};
    use axum::http::Request;
    use serde_json::{json, Value};
    use toxicity_core::{
        BackendError, BackendKind, BackendResult, RawOutput, ScoreBackend, ScoreTriple,
    };
    use tower::ServiceExt;

    /// Negative for "idiot", positive otherwise. "offline" makes it fail.
    struct StubBackend {
        kind: BackendKind,
    }

    #[async_trait]
    impl ScoreBackend for StubBackend {
        async fn predict_raw(&self, text: &str) -> BackendResult<RawOutput> {
            if text.contains("offline") {
                return Err(BackendError::ServiceUnavailable("stub offline".to_string()));
            }
            let scores = if text.contains("idiot") {
                ScoreTriple::new(0.7, 0.2, 0.1)
            } else {
                ScoreTriple::new(0.1, 0.2, 0.7)
            };
            Ok(RawOutput::Probabilities(scores))
        }

        fn kind(&self) -> BackendKind {
            self.kind
        }
    }

    fn app(chain: BackendChain) -> Router {
        let state = AppState {
            analyzer: Arc::new(TweetAnalyzer::new(chain, CalibrationEngine::default())),
        };
        build_router(state, cors_layer(&[]))
    }

    fn lexical_app() -> Router {
        app(BackendChain::single(Arc::new(StubBackend {
            kind: BackendKind::Lexical,
        })))
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Value, Response) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let (parts, body) = response.into_parts();
        let bytes = to_bytes(body, usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value, Response::from_parts(parts, Body::empty()))
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[tokio::test]
    async fn test_analyze_insult() {
        let (status, body, _) = send(
            lexical_app(),
            post_json("/analyze", json!({ "tweet": "You're such an idiot!" })),
        )
        .await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["sentiment"], "negative");
        assert_eq!(body["scores"]["negative"], 0.7);
        assert_eq!(
            body["message"],
            "Tweet sentiment is negative with confidence 70.00%."
        );
    }

    #[tokio::test]
    async fn test_analyze_empty_is_bad_request() {
        let (status, body, _) =
            send(lexical_app(), post_json("/analyze", json!({ "tweet": "   " }))).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["success"], false);
        assert!(body["error"]
            .as_str()
            .unwrap()
            .starts_with("Analysis failed:"));
    }

    #[tokio::test]
    async fn test_analyze_both_backends_down_is_unavailable() {
        let chain = BackendChain::new(
            Arc::new(StubBackend {
                kind: BackendKind::Transformer,
            }),
            Some(Arc::new(StubBackend {
                kind: BackendKind::Lexical,
            })),
        );
        let (status, _, _) = send(
            app(chain),
            post_json("/analyze", json!({ "tweet": "we are offline" })),
        )
        .await;

        assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_health_reports_backend() {
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let (status, body, _) = send(lexical_app(), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "ok");
        assert_eq!(body["model_loaded"], false);
        assert_eq!(body["backend"], "lexical");
    }

    #[tokio::test]
    async fn test_batch_csv() {
        let request = Request::builder()
            .method("POST")
            .uri("/analyze/batch")
            .header("content-type", "text/csv")
            .body(Body::from("tweet\nWhat an idiot\nLovely day\n"))
            .unwrap();
        let (status, body, _) = send(lexical_app(), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["success"], true);
        assert_eq!(body["data"]["summary"]["total"], 2);
        assert_eq!(body["data"]["summary"]["toxic_count"], 1);
    }

    #[tokio::test]
    async fn test_batch_without_tweet_column() {
        let request = Request::builder()
            .method("POST")
            .uri("/analyze/batch")
            .body(Body::from("text\nhello\n"))
            .unwrap();
        let (status, _, _) = send(lexical_app(), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_request_id_and_security_headers() {
        let request = Request::builder()
            .uri("/samples")
            .header("x-request-id", "abc-123")
            .body(Body::empty())
            .unwrap();
        let (status, body, response) = send(lexical_app(), request).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 5);
        assert_eq!(response.headers()["x-request-id"], "abc-123");
        assert_eq!(response.headers()["cache-control"], "no-store");
    }

    #[tokio::test]
    async fn test_request_id_is_generated_when_absent() {
        let request = Request::builder().uri("/health").body(Body::empty()).unwrap();
        let (_, _, response) = send(lexical_app(), request).await;

        let id = response.headers()["x-request-id"].to_str().unwrap();
        assert!(uuid::Uuid::parse_str(id).is_ok());
    }

    #[test]
    fn test_http_span_carries_request_id_field() {
        let subscriber = tracing_subscriber::fmt().finish();
        tracing::subscriber::with_default(subscriber, || {
            let request = Request::builder().uri("/analyze").body(Body::empty()).unwrap();
            let span = http_span(&request);
            assert!(span.field("request_id").is_some());
        });
    }

    #[tokio::test]
    async fn test_openapi_document_lists_routes() {
        let request = Request::builder()
            .uri("/api-docs/openapi.json")
            .body(Body::empty())
            .unwrap();
        let (status, body, _) = send(lexical_app(), request).await;

        assert_eq!(status, StatusCode::OK);
        assert!(body["paths"]["/analyze"].is_object());
        assert!(body["paths"]["/health"].is_object());
    }
}
