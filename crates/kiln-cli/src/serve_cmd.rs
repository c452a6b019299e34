use std::net::SocketAddr;

use anyhow::{Context, Result};
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::{HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, Any, CorsLayer};

use kiln_core::plan::{ExecutionPlan, GenerateError, GoalRequest, PlanGenerator};

use crate::config::{CorsSettings, KilnConfig};

/// Body returned for provider and internal failures. Details go to the log.
pub const INTERNAL_ERROR_DETAIL: &str = "Failed to generate plan. Please try again.";

// ---------------------------------------------------------------------------
// Error type
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    message: String,
}

impl AppError {
    pub fn unprocessable(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            message: msg.into(),
        }
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: msg.into(),
        }
    }
}

impl From<GenerateError> for AppError {
    fn from(err: GenerateError) -> Self {
        if err.is_client_error() {
            tracing::warn!(error = %err, attempts = err.attempts(), "plan generation rejected");
            Self::unprocessable(err.to_string())
        } else {
            tracing::error!(error = ?err, attempts = err.attempts(), "plan generation failed");
            Self::internal(INTERNAL_ERROR_DETAIL)
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let body = serde_json::json!({ "detail": self.message });
        (self.status, Json(body)).into_response()
    }
}

// ---------------------------------------------------------------------------
// State and response types
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct AppState {
    pub generator: PlanGenerator,
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub provider: String,
    pub api_key_configured: bool,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(state: AppState, cors: &CorsSettings) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/generate-plan", post(generate_plan))
        .layer(cors_layer(cors))
        .with_state(state)
}

/// Build the CORS layer.
///
/// An explicit origin list allows credentials and mirrors the requested
/// methods and headers; `AnyOrigin` cannot carry credentials.
fn cors_layer(settings: &CorsSettings) -> CorsLayer {
    match settings {
        CorsSettings::AnyOrigin => CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any),
        CorsSettings::Origins(origins) => {
            let origins: Vec<HeaderValue> = origins
                .iter()
                .filter_map(|o| match HeaderValue::from_str(o) {
                    Ok(v) => Some(v),
                    Err(_) => {
                        tracing::warn!(origin = %o, "ignoring invalid CORS origin");
                        None
                    }
                })
                .collect();
            CorsLayer::new()
                .allow_origin(AllowOrigin::list(origins))
                .allow_methods(AllowMethods::mirror_request())
                .allow_headers(AllowHeaders::mirror_request())
                .allow_credentials(true)
        }
    }
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

pub async fn run_serve(config: KilnConfig, generator: PlanGenerator) -> Result<()> {
    let app = build_router(AppState { generator }, &config.server.cors);
    let addr: SocketAddr = format!("{}:{}", config.server.bind, config.server.port)
        .parse()
        .with_context(|| {
            format!(
                "invalid listen address {}:{}",
                config.server.bind, config.server.port
            )
        })?;

    if config.provider.api_key.is_none() {
        tracing::warn!("no API key configured; /generate-plan will return 422 until one is set");
    }
    tracing::info!(model = %config.provider.model, "kiln serve listening on http://{addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    tracing::info!("kiln serve shut down");
    Ok(())
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("failed to install Ctrl+C handler");
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let provider = state.generator.provider();
    Json(HealthResponse {
        status: "ok",
        provider: provider.name().to_string(),
        api_key_configured: provider.has_credentials(),
    })
}

async fn generate_plan(
    State(state): State<AppState>,
    payload: Result<Json<GoalRequest>, JsonRejection>,
) -> Result<Json<ExecutionPlan>, AppError> {
    let Json(request) = payload.map_err(|rejection| AppError::unprocessable(rejection.body_text()))?;
    let goal = request
        .validate()
        .map_err(|e| AppError::unprocessable(e.to_string()))?;

    tracing::info!(goal_chars = goal.chars().count(), "generating plan");
    let plan = state.generator.generate(&goal).await?;
    Ok(Json(plan))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
