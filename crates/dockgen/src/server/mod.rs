use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use dockgen_core::docker::{
    ErrorCategory, GenerateError, GenerationRequest, GenerationResult, ProviderFailure,
};
use dockgen_core::models::ModelsOutput;
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};

use crate::generate::{Generator, GeneratorConfig, ServiceOptions};
use crate::openai::OpenAiProvider;
use crate::prelude::{eprintln, *};

#[derive(Debug, clap::Args)]
pub struct ServeOptions {
    /// Port to listen on
    #[arg(short, long, env = "DOCKGEN_PORT", default_value = "8000")]
    pub port: u16,

    /// Host to bind to
    #[arg(long, env = "DOCKGEN_HOST", default_value = "127.0.0.1")]
    pub host: String,

    #[clap(flatten)]
    pub service: ServiceOptions,
}

/// Shared, read-only state of the HTTP server.
pub struct AppState {
    pub generator: Generator,
    pub provider: OpenAiProvider,
}

pub async fn run(options: ServeOptions, global: crate::Global) -> Result<()> {
    let config = GeneratorConfig::from(options.service);

    match config.context_builder()?.locate() {
        Ok(path) => log::info!("Using repomix at {}", path.display()),
        Err(e) => log::warn!("{}; repository processing will fail", e),
    }

    let state = Arc::new(AppState {
        generator: config.generator()?,
        provider: config.provider()?,
    });

    let addr = format!("{}:{}", options.host, options.port);

    if global.verbose {
        eprintln!("Docker Config Generator API listening on http://{}", addr);
        eprintln!("Generate endpoint: http://{}/generate-docker-config", addr);
        eprintln!("Models endpoint: http://{}/list-models", addr);
    }

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| eyre!("Failed to bind to {}: {}", addr, e))?;

    log::info!("Listening on http://{}", addr);

    axum::serve(listener, router(state))
        .await
        .map_err(|e| eyre!("Server error: {e}"))?;

    Ok(())
}

pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(health_handler))
        .route("/generate-docker-config", post(generate_handler))
        .route("/list-models", post(list_models_handler))
        .layer(cors)
        .with_state(state)
}

/// Failure body returned to HTTP clients.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    category: ErrorCategory,
    detail: String,
}

impl ApiError {
    fn new(status: StatusCode, category: ErrorCategory, detail: impl Into<String>) -> Self {
        Self {
            status,
            category,
            detail: detail.into(),
        }
    }
}

impl From<GenerateError> for ApiError {
    fn from(err: GenerateError) -> Self {
        let status = StatusCode::from_u16(err.category.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        Self::new(status, err.category, err.detail)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.category,
            "detail": self.detail,
        }));
        (self.status, body).into_response()
    }
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({ "message": "Docker Config Generator API is running" }))
}

async fn generate_handler(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<GenerationRequest>, JsonRejection>,
) -> std::result::Result<Json<GenerationResult>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        ApiError::new(
            StatusCode::BAD_REQUEST,
            ErrorCategory::InvalidRequest,
            rejection.body_text(),
        )
    })?;

    let result = state.generator.generate(&request).await?;
    Ok(Json(result))
}

#[derive(Debug, Deserialize)]
struct ListModelsRequest {
    #[serde(default, rename = "openai_api_key", alias = "apiKey")]
    api_key: String,
}

async fn list_models_handler(
    State(state): State<Arc<AppState>>,
    payload: std::result::Result<Json<ListModelsRequest>, JsonRejection>,
) -> std::result::Result<Json<ModelsOutput>, ApiError> {
    let Json(request) = payload.map_err(|rejection| {
        ApiError::new(
            StatusCode::BAD_REQUEST,
            ErrorCategory::InvalidRequest,
            rejection.body_text(),
        )
    })?;

    if request.api_key.trim().is_empty() {
        return Err(ApiError::new(
            StatusCode::BAD_REQUEST,
            ErrorCategory::InvalidRequest,
            "OpenAI API key is required",
        ));
    }

    crate::models::list_models_data(&state.provider, &request.api_key)
        .await
        .map(Json)
        .map_err(|e| {
            log::error!("Failed to fetch models: {}", e);
            match e.kind {
                ProviderFailure::Auth => ApiError::new(
                    StatusCode::UNAUTHORIZED,
                    ErrorCategory::InvalidRequest,
                    "Invalid API key provided",
                ),
                kind => {
                    let category = kind.category();
                    let status = StatusCode::from_u16(category.status_code())
                        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
                    ApiError::new(status, category, e.detail())
                }
            }
        })
}
