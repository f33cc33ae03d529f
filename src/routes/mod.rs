//! Router assembly.
//!
//! SYSTEM CONTEXT
//! ==============
//! One Axum router serves the shell page at `/`, the JSON API under `/api`,
//! and the sandboxed preview document at `/preview/frame`. Every API error
//! is an `ErrorBody` with a stable code; upstream error text never reaches
//! the chat.

pub mod chat;
pub mod preview;

use axum::Router;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Json, Response};
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::error::{ErrorBody, ErrorCode};
use crate::state::AppState;

const SHELL_PAGE: &str = include_str!("../../assets/index.html");

/// Build the application router.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(shell))
        .route("/api/conversation", get(chat::get_conversation))
        .route("/api/messages", post(chat::post_message))
        .route("/api/preview", get(preview::get_preview))
        .route("/api/preview/reload", post(preview::reload_preview))
        .route("/api/export", get(preview::export_document))
        .route(crate::services::preview::FRAME_PATH, get(preview::frame))
        .route("/healthz", get(healthz))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn shell() -> Html<&'static str> {
    Html(SHELL_PAGE)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}

// =============================================================================
// API ERROR
// =============================================================================

/// Non-2xx API response: status plus a JSON [`ErrorBody`].
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorBody,
}

impl ApiError {
    pub fn new(status: StatusCode, err: &(impl ErrorCode + ?Sized)) -> Self {
        Self { status, body: ErrorBody::from_error(err) }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

#[cfg(test)]
#[path = "mod_test.rs"]
mod tests;
