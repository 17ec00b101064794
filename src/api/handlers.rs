//! HTTP request handlers

use super::types::{
    ErrorResponse, GreetingResponse, ModelInfo, ModelsResponse, SessionListResponse,
    SessionResponse, SuccessResponse, TurnRequest, TurnResponse,
};
use super::AppState;
use crate::db::DbError;
use crate::llm::all_models;
use crate::prompts::GREETING;
use crate::runtime::SessionError;
use crate::state_machine::ConversationState;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};

/// Create the API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/greeting", get(get_greeting))
        .route("/api/sessions", get(list_sessions).post(create_session))
        .route("/api/sessions/:id", get(get_session).delete(delete_session))
        .route("/api/sessions/:id/turns", post(submit_turn))
        .route("/api/sessions/:id/reset", post(reset_session))
        .route("/api/models", get(list_models))
        .route("/version", get(get_version))
        .with_state(state)
}

// ============================================================
// Sessions
// ============================================================

async fn get_greeting() -> Json<GreetingResponse> {
    Json(GreetingResponse { greeting: GREETING })
}

async fn list_sessions(
    State(state): State<AppState>,
) -> Result<Json<SessionListResponse>, AppError> {
    let sessions = state.sessions.list_sessions().await?;
    Ok(Json(SessionListResponse { sessions }))
}

async fn create_session(
    State(state): State<AppState>,
) -> Result<(StatusCode, Json<SessionResponse>), AppError> {
    let session = state.sessions.create_session().await?;
    Ok((StatusCode::CREATED, Json(session.into())))
}

async fn get_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SessionResponse>, AppError> {
    let session = state.sessions.get_session(&id).await?;
    Ok(Json(session.into()))
}

async fn delete_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<SuccessResponse>, AppError> {
    state.sessions.delete_session(&id).await?;
    Ok(Json(SuccessResponse { success: true }))
}

// ============================================================
// Turns
// ============================================================

async fn submit_turn(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(req): Json<TurnRequest>,
) -> Result<Json<TurnResponse>, AppError> {
    let outcome = state.sessions.submit_turn(&id, &req.text).await?;
    let progress = outcome.state.progress();
    Ok(Json(TurnResponse {
        state: outcome.state,
        new_messages: outcome.new_messages,
        progress,
    }))
}

async fn reset_session(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<ConversationState>, AppError> {
    let fresh = state.sessions.reset_session(&id).await?;
    Ok(Json(fresh))
}

// ============================================================
// Model info
// ============================================================

async fn list_models(State(state): State<AppState>) -> Json<ModelsResponse> {
    let available = state.llm_registry.available_models();
    let models = all_models()
        .iter()
        .filter(|m| available.iter().any(|id| id == m.id))
        .map(|m| ModelInfo {
            id: m.id.to_string(),
            provider: m.provider.display_name().to_string(),
            description: m.description.to_string(),
            context_window: m.context_window,
        })
        .collect();

    Json(ModelsResponse {
        models,
        default: state.llm_registry.default_model_id().to_string(),
    })
}

// ============================================================
// Version
// ============================================================

async fn get_version() -> &'static str {
    concat!("problem-coach ", env!("CARGO_PKG_VERSION"))
}

// ============================================================
// Error Handling
// ============================================================

#[derive(Debug)]
enum AppError {
    BadRequest(String),
    NotFound(String),
    /// The oracle failed; the stored state is unchanged and the turn can be retried
    Upstream(String),
    Internal(String),
}

impl From<SessionError> for AppError {
    fn from(e: SessionError) -> Self {
        match e {
            SessionError::EmptyInput => AppError::BadRequest(e.to_string()),
            SessionError::Store(DbError::SessionNotFound(_)) => AppError::NotFound(e.to_string()),
            SessionError::Turn(turn) => AppError::Upstream(turn.to_string()),
            SessionError::Store(db) => {
                tracing::error!(error = %db, "Session store failure");
                AppError::Internal(db.to_string())
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, ErrorResponse::new(msg)),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, ErrorResponse::new(msg)),
            AppError::Upstream(msg) => (StatusCode::BAD_GATEWAY, ErrorResponse::retryable(msg)),
            AppError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, ErrorResponse::new(msg)),
        };

        (status, Json(body)).into_response()
    }
}
