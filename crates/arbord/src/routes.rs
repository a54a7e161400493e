//! API routes for arbord
//!
//! `POST /api/generate` and `POST /api/test` are the engine's public surface.
//! Everything else answers 404.

use crate::server::AppState;
use arbor_common::{ConnectionReport, DecisionNode, GenerationContext, ProviderConfig};
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

type AppStateArc = Arc<AppState>;

#[derive(Debug, Clone, Deserialize)]
pub struct GenerateRequest {
    pub question: String,
    #[serde(default)]
    pub config: ProviderConfig,
    #[serde(default)]
    pub context: Option<GenerationContext>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TestRequest {
    #[serde(default)]
    pub config: ProviderConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub uptime_seconds: u64,
}

// ============================================================================
// Generation Routes
// ============================================================================

pub fn generate_routes() -> Router<AppStateArc> {
    Router::new()
        .route("/api/generate", post(generate).fallback(not_found))
        .route("/api/test", post(test_connection).fallback(not_found))
}

async fn generate(
    State(state): State<AppStateArc>,
    Json(req): Json<GenerateRequest>,
) -> Result<Json<DecisionNode>, (StatusCode, Json<ErrorBody>)> {
    if req.question.trim().is_empty() {
        warn!("Rejected generate request with empty question");
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorBody {
                error: "question must not be empty".to_string(),
            }),
        ));
    }

    let mode = match &req.context {
        None => "full tree",
        Some(ctx) if ctx.is_first_level => "first layer",
        Some(_) => "next layer",
    };
    info!("Generating {} via {}", mode, req.config.provider);

    let node = state
        .engine
        .generate(&req.question, &req.config, req.context.as_ref())
        .await;
    Ok(Json(node))
}

async fn test_connection(
    State(state): State<AppStateArc>,
    Json(req): Json<TestRequest>,
) -> Json<ConnectionReport> {
    info!("Testing connection to {}", req.config.provider);
    Json(state.engine.test_connection(&req.config).await)
}

// ============================================================================
// Health Routes
// ============================================================================

pub fn health_routes() -> Router<AppStateArc> {
    Router::new().route("/api/health", get(health_check))
}

async fn health_check(State(state): State<AppStateArc>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
    })
}

pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Not Found")
}
