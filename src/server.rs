use std::sync::Arc;

use anyhow::Result;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use serde_json::json;
use tokio::net::TcpListener;

use crate::command::{dispatch, CommandError};
use crate::store::NoteStore;

const INDEX_HTML: &str = include_str!("../assets/index.html");
const SCRIPT_JS: &str = include_str!("../assets/script.js");
const STYLE_CSS: &str = include_str!("../assets/style.css");

#[derive(Clone)]
struct ServeState {
    store: Arc<NoteStore>,
}

#[derive(Debug, Default, Deserialize)]
struct CommandRequest {
    #[serde(default)]
    command: Option<String>,
}

/// Routes for the JSON API and the bundled browser UI.
pub fn router(store: NoteStore) -> Router {
    let state = ServeState {
        store: Arc::new(store),
    };
    Router::new()
        .route("/", get(index))
        .route("/script.js", get(script))
        .route("/style.css", get(style))
        .route("/health", get(health))
        .route("/api/notes", get(list_notes))
        .route("/api/command", post(run_command))
        .with_state(state)
}

/// Serve until ctrl-c.
pub async fn serve(listener: TcpListener, store: NoteStore) -> Result<()> {
    tracing::info!(
        addr = %listener.local_addr()?,
        file = %store.path().display(),
        "serving notes"
    );
    axum::serve(listener, router(store))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::warn!(error = %err, "could not listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

impl IntoResponse for CommandError {
    fn into_response(self) -> Response {
        let status = match &self {
            CommandError::Validation(_) => StatusCode::BAD_REQUEST,
            CommandError::NotFound(_) => StatusCode::NOT_FOUND,
            CommandError::Unexpected(message) => {
                tracing::error!(error = %message, "command failed");
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}

async fn run_command(
    State(state): State<ServeState>,
    payload: Result<Json<CommandRequest>, JsonRejection>,
) -> Response {
    let input = match payload {
        Ok(Json(request)) => request.command.unwrap_or_default(),
        // A bare POST carries no command at all.
        Err(JsonRejection::MissingJsonContentType(_)) => String::new(),
        Err(rejection) => {
            return CommandError::Validation(format!(
                "invalid request: {}",
                rejection.body_text()
            ))
            .into_response();
        }
    };
    match dispatch(&state.store, input.trim()) {
        Ok(response) => Json(response).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn list_notes(State(state): State<ServeState>) -> Response {
    match state.store.get_all() {
        Ok(notes) => Json(notes).into_response(),
        Err(err) => CommandError::from(err).into_response(),
    }
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn script() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/javascript; charset=utf-8")],
        SCRIPT_JS,
    )
}

async fn style() -> impl IntoResponse {
    ([(header::CONTENT_TYPE, "text/css; charset=utf-8")], STYLE_CSS)
}
