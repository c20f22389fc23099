//! HTTP surface.
//!
//! - `POST /api/analyze`         `{content}` → `AnalysisResult` + `X-Analysis-Cache`
//! - `POST /api/analyze-image`   `{imageBase64, mimeType}` → `MediaAnalysis`
//! - `POST /api/analyze-source`  `{url}` → `SourceReport`
//! - `GET  /api/health`          → `{status, timestamp}`
//! - `GET  /metrics`             Prometheus text, only when enabled
//!
//! The `/api/analyze*` routes sit behind per-client rate limits (429 when
//! exhausted). Image bodies may exceed axum's default 2 MB cap.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, DefaultBodyLimit, State},
    http::{HeaderName, HeaderValue, StatusCode},
    middleware,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::CorsLayer;

use crate::cache::build_cache;
use crate::config::{AppConfig, RateLimitConfig};
use crate::metrics::Metrics;
use crate::model::{AnalysisResult, MediaAnalysis, SourceReport};
use crate::oracle::build_oracle;
use crate::ratelimit::{rate_limit, IpLimiter};
use crate::service::{VerifyError, Verifier, MAX_IMAGE_BASE64_LEN};

pub const CACHE_HEADER: &str = "x-analysis-cache";
pub const INVALID_REQUEST_FLAG: &str = "Invalid request";
/// Largest accepted image payload plus room for the JSON envelope.
pub const IMAGE_BODY_LIMIT: usize = MAX_IMAGE_BASE64_LEN + 64 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub verifier: Arc<Verifier>,
    pub metrics: Option<&'static Metrics>,
    pub rate_limit: RateLimitConfig,
}

impl AppState {
    pub fn new(verifier: Verifier) -> Self {
        Self {
            verifier: Arc::new(verifier),
            metrics: None,
            rate_limit: RateLimitConfig::default(),
        }
    }

    pub fn with_rate_limit(mut self, rate_limit: RateLimitConfig) -> Self {
        self.rate_limit = rate_limit;
        self
    }

    /// Wire oracle, cache and (optionally) the Prometheus recorder from config.
    pub fn from_config(cfg: &AppConfig) -> anyhow::Result<Self> {
        let verifier = Verifier::new(
            build_oracle(&cfg.oracle),
            build_cache(&cfg.cache),
            cfg.oracle.clone(),
        );
        let metrics = if cfg.metrics.enabled {
            Some(Metrics::install()?)
        } else {
            None
        };
        tracing::info!(
            oracle = verifier.oracle_name(),
            cache = ?cfg.cache.backend,
            metrics = metrics.is_some(),
            rate_limit = cfg.rate_limit.enabled,
            "verifier ready"
        );
        Ok(Self {
            verifier: Arc::new(verifier),
            metrics,
            rate_limit: cfg.rate_limit.clone(),
        })
    }

    /// Load `AppConfig` from `VERIFIER_CONFIG_PATH` / default path and build.
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_config(&AppConfig::load()?)
    }
}

pub fn router(state: AppState) -> Router {
    let limits = &state.rate_limit;
    let mut text_routes = Router::new()
        .route("/api/analyze", post(analyze))
        .route("/api/analyze-source", post(analyze_source));
    let mut image_routes = Router::new().route(
        "/api/analyze-image",
        post(analyze_image).layer(DefaultBodyLimit::max(IMAGE_BODY_LIMIT)),
    );
    if limits.enabled {
        text_routes = text_routes.route_layer(middleware::from_fn_with_state(
            IpLimiter::new("text", limits.per_minute, limits),
            rate_limit,
        ));
        image_routes = image_routes.route_layer(middleware::from_fn_with_state(
            IpLimiter::new("image", limits.image_per_minute, limits),
            rate_limit,
        ));
    }

    let mut app = Router::new()
        .route("/api/health", get(health))
        .merge(text_routes)
        .merge(image_routes);

    if let Some(m) = state.metrics {
        app = app.merge(m.router::<AppState>());
    }

    app.layer(CorsLayer::very_permissive()).with_state(state)
}

/// Rejected input, rendered as an error-tier `AnalysisResult` with 400.
#[derive(Debug)]
pub struct ApiError(String);

impl From<VerifyError> for ApiError {
    fn from(e: VerifyError) -> Self {
        ApiError(e.to_string())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(e: JsonRejection) -> Self {
        ApiError(format!("Invalid request body: {}", e.body_text()))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (
            StatusCode::BAD_REQUEST,
            Json(AnalysisResult::error(self.0, INVALID_REQUEST_FLAG)),
        )
            .into_response()
    }
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
    timestamp: String,
}

async fn health() -> Json<Health> {
    Json(Health {
        status: "ok",
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

#[derive(Deserialize)]
struct AnalyzeReq {
    #[serde(default)]
    content: Option<String>,
}

async fn analyze(
    State(state): State<AppState>,
    body: Result<Json<AnalyzeReq>, JsonRejection>,
) -> Result<Response, ApiError> {
    let Json(req) = body?;
    let content = req.content.unwrap_or_default();
    let out = state.verifier.analyze_text(&content).await?;

    let mut resp = Json(out.result).into_response();
    resp.headers_mut().insert(
        HeaderName::from_static(CACHE_HEADER),
        HeaderValue::from_static(out.cache.as_str()),
    );
    Ok(resp)
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeImageReq {
    #[serde(default)]
    image_base64: Option<String>,
    #[serde(default)]
    mime_type: Option<String>,
}

async fn analyze_image(
    State(state): State<AppState>,
    body: Result<Json<AnalyzeImageReq>, JsonRejection>,
) -> Result<Json<MediaAnalysis>, ApiError> {
    let Json(req) = body?;
    let out = state
        .verifier
        .analyze_image(
            req.image_base64.as_deref().unwrap_or_default(),
            req.mime_type.as_deref().unwrap_or_default(),
        )
        .await?;
    Ok(Json(out))
}

#[derive(Deserialize)]
struct AnalyzeSourceReq {
    #[serde(default)]
    url: Option<String>,
}

async fn analyze_source(
    State(state): State<AppState>,
    body: Result<Json<AnalyzeSourceReq>, JsonRejection>,
) -> Result<Json<SourceReport>, ApiError> {
    let Json(req) = body?;
    let out = state
        .verifier
        .analyze_source(req.url.as_deref().unwrap_or_default())
        .await?;
    Ok(Json(out))
}
