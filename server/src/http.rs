//! HTTP facade
//!
//! Thin axum layer exposing the session surface to a local shell: submit a
//! request, read the current result, manage saved projects. All pipeline
//! semantics live in `viewsmith-pipeline`; handlers only translate outcomes
//! into status codes and JSON.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};

use viewsmith_pipeline::{
    GenerationResult, PipelineError, ProjectRecord, ProjectStore, ScopeChoice, Session,
    SubmitOutcome,
};

/// Shared state for axum handlers.
#[derive(Clone)]
pub struct AppState {
    pub session: Arc<Session>,
    pub store: Arc<ProjectStore>,
}

pub fn router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/health", get(health_handler))
        .route("/api/generate", post(generate_handler))
        .route("/api/current", get(current_handler))
        .route(
            "/api/projects",
            get(list_projects_handler).post(save_project_handler),
        )
        .route("/api/projects/:id", delete(delete_project_handler))
        .layer(cors)
        .with_state(state)
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

fn error_body(status: StatusCode, message: impl Into<String>) -> (StatusCode, Json<ErrorBody>) {
    (status, Json(ErrorBody { error: message.into() }))
}

// --- Handlers ---

async fn health_handler() -> &'static str {
    "ok"
}

#[derive(Debug, Deserialize)]
struct GenerateRequest {
    prompt: String,
    /// Optional explicit scope override; wins over the category default.
    #[serde(default)]
    scope: Option<ScopeChoice>,
}

async fn generate_handler(
    State(state): State<AppState>,
    Json(request): Json<GenerateRequest>,
) -> Result<Json<GenerationResult>, (StatusCode, Json<ErrorBody>)> {
    state.session.set_scope_override(request.scope);

    match state.session.submit(&request.prompt).await {
        Ok(SubmitOutcome::Completed(result)) => Ok(Json(result)),
        Ok(SubmitOutcome::Superseded) => Err(error_body(
            StatusCode::CONFLICT,
            "superseded by a newer submission",
        )),
        Err(PipelineError::EmptyRequest) => {
            Err(error_body(StatusCode::BAD_REQUEST, "prompt is required"))
        }
        Err(PipelineError::Gateway(e)) => {
            log::warn!("gateway failure: {e}");
            Err(error_body(StatusCode::BAD_GATEWAY, e.to_string()))
        }
    }
}

async fn current_handler(
    State(state): State<AppState>,
) -> Result<Json<GenerationResult>, (StatusCode, Json<ErrorBody>)> {
    state
        .session
        .current()
        .map(Json)
        .ok_or_else(|| error_body(StatusCode::NOT_FOUND, "nothing generated yet"))
}

async fn list_projects_handler(
    State(state): State<AppState>,
) -> Result<Json<Vec<ProjectRecord>>, (StatusCode, Json<ErrorBody>)> {
    state
        .store
        .load()
        .await
        .map(Json)
        .map_err(|e| error_body(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))
}

#[derive(Debug, Deserialize)]
struct SaveProjectRequest {
    name: String,
}

async fn save_project_handler(
    State(state): State<AppState>,
    Json(request): Json<SaveProjectRequest>,
) -> Result<Json<ProjectRecord>, (StatusCode, Json<ErrorBody>)> {
    let Some(current) = state.session.current() else {
        return Err(error_body(StatusCode::BAD_REQUEST, "nothing to save yet"));
    };

    let record = ProjectRecord::new(
        request.name,
        current.request,
        current.unit,
        current.category,
    );
    state
        .store
        .upsert(record.clone())
        .await
        .map_err(|e| error_body(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    Ok(Json(record))
}

async fn delete_project_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, (StatusCode, Json<ErrorBody>)> {
    let removed = state
        .store
        .delete(&id)
        .await
        .map_err(|e| error_body(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()))?;
    if removed {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(error_body(StatusCode::NOT_FOUND, "no such project"))
    }
}
