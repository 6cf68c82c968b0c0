//! REST endpoints for turns, templates, sessions and stored responses.

use std::path::PathBuf;
use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tracing::{error, warn};

use super::export::flatten;
use super::sessions::SessionManager;
use crate::error::TurnError;

/// Shared state for interview routes.
#[derive(Clone)]
pub struct InterviewRouteState {
    pub sessions: Arc<SessionManager>,
    /// Directory the catalog was loaded from; enables reloads.
    pub templates_dir: Option<PathBuf>,
}

fn error_json(status: StatusCode, message: impl Into<String>) -> Response {
    (status, Json(serde_json::json!({ "error": message.into() }))).into_response()
}

impl IntoResponse for TurnError {
    fn into_response(self) -> Response {
        match self {
            TurnError::SessionKeyMissing => error_json(StatusCode::BAD_REQUEST, self.to_string()),
            TurnError::Persistence(ref e) => {
                error!(error = %e, "Turn failed to persist response");
                error_json(StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct TurnRequest {
    #[serde(default)]
    session_key: Option<String>,
    text: String,
}

/// POST /api/messages
///
/// One conversational turn: `{session_key, text}` in, the next prompt out.
async fn post_message(
    State(state): State<InterviewRouteState>,
    Json(req): Json<TurnRequest>,
) -> Result<impl IntoResponse, TurnError> {
    let prompt = state
        .sessions
        .handle_turn(req.session_key.as_deref(), &req.text)
        .await?;
    Ok(Json(prompt))
}

/// GET /api/templates
async fn list_templates(State(state): State<InterviewRouteState>) -> impl IntoResponse {
    let catalog = state.sessions.engine().catalog().current().await;
    Json(serde_json::json!({ "templates": catalog.names() }))
}

/// GET /api/templates/{name}
async fn get_template(
    State(state): State<InterviewRouteState>,
    Path(name): Path<String>,
) -> Response {
    let catalog = state.sessions.engine().catalog().current().await;
    match catalog.lookup(&name) {
        Some(template) => Json(template.as_ref()).into_response(),
        None => error_json(StatusCode::NOT_FOUND, format!("No template named {name}")),
    }
}

/// POST /api/templates/reload
///
/// Re-read the templates directory and swap the catalog in one step.
async fn reload_templates(State(state): State<InterviewRouteState>) -> Response {
    let Some(ref dir) = state.templates_dir else {
        return error_json(StatusCode::CONFLICT, "No templates directory configured");
    };
    let catalog = state.sessions.engine().catalog();
    match catalog.reload_from(dir).await {
        Ok(rejected) => {
            let names = catalog.current().await.names();
            Json(serde_json::json!({
                "templates": names,
                "rejected": rejected.iter().map(ToString::to_string).collect::<Vec<_>>(),
            }))
            .into_response()
        }
        Err(e) => {
            warn!(error = %e, "Template reload failed; keeping current catalog");
            error_json(StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
        }
    }
}

/// GET /api/sessions/{key}
async fn get_session(
    State(state): State<InterviewRouteState>,
    Path(key): Path<String>,
) -> Response {
    match state.sessions.snapshot(&key).await {
        Some(snapshot) => Json(snapshot).into_response(),
        None => error_json(StatusCode::NOT_FOUND, format!("No session {key}")),
    }
}

/// DELETE /api/sessions/{key}
async fn delete_session(
    State(state): State<InterviewRouteState>,
    Path(key): Path<String>,
) -> StatusCode {
    if state.sessions.end_session(&key).await {
        StatusCode::NO_CONTENT
    } else {
        StatusCode::NOT_FOUND
    }
}

/// GET /api/responses
async fn list_responses(State(state): State<InterviewRouteState>) -> Response {
    match state.sessions.engine().store().list_template_names().await {
        Ok(names) => Json(serde_json::json!({ "responses": names })).into_response(),
        Err(e) => error_json(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

#[derive(Debug, Deserialize)]
struct ResponseQuery {
    #[serde(default)]
    format: Option<String>,
}

/// GET /api/responses/{template}?format=row
///
/// The stored document, or its flattened row with `format=row`.
async fn get_response(
    State(state): State<InterviewRouteState>,
    Path(template): Path<String>,
    Query(query): Query<ResponseQuery>,
) -> Response {
    match state.sessions.engine().store().get_response(&template).await {
        Ok(Some(response)) => match query.format.as_deref() {
            Some("row") => Json(flatten(&response)).into_response(),
            _ => Json(response).into_response(),
        },
        Ok(None) => error_json(
            StatusCode::NOT_FOUND,
            format!("No stored response for {template}"),
        ),
        Err(e) => error_json(StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
    }
}

async fn health() -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "interview-bot"
    }))
}

/// Build the interview REST routes.
pub fn interview_routes(state: InterviewRouteState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/messages", post(post_message))
        .route("/api/templates", get(list_templates))
        .route("/api/templates/reload", post(reload_templates))
        .route("/api/templates/{name}", get(get_template))
        .route("/api/sessions/{key}", get(get_session).delete(delete_session))
        .route("/api/responses", get(list_responses))
        .route("/api/responses/{template}", get(get_response))
        .with_state(state)
}
