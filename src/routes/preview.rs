//! Preview routes: renderer status, forced reload, the framed document, and export.

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::http::header::{CACHE_CONTROL, CONTENT_DISPOSITION, CONTENT_SECURITY_POLICY, CONTENT_TYPE};
use axum::response::{IntoResponse, Json, Response};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::ApiError;
use crate::error::ErrorCode;
use crate::services::preview::{DeviceView, PreviewRenderer, PreviewSnapshot, SANDBOX_POLICY};
use crate::state::AppState;

pub const EXPORT_FILENAME: &str = "helbulid-website.html";

#[derive(Debug, Default, Deserialize)]
pub struct PreviewQuery {
    #[serde(default)]
    pub device: DeviceView,
}

#[derive(Debug, Serialize)]
pub struct PreviewResponse {
    #[serde(flatten)]
    pub snapshot: PreviewSnapshot,
    pub device: DeviceView,
    /// Host-page markup for the frame (iframe or placeholder).
    pub element: String,
}

#[derive(Debug, thiserror::Error)]
#[error("no document has been generated yet")]
struct NoDocument;

impl ErrorCode for NoDocument {
    fn error_code(&self) -> &'static str {
        "E_NO_DOCUMENT"
    }
}

fn preview_response(renderer: &PreviewRenderer, device: DeviceView) -> PreviewResponse {
    PreviewResponse { snapshot: renderer.snapshot(), device, element: renderer.frame_element(device) }
}

/// `GET /api/preview?device=` — current rendering context and frame markup.
pub async fn get_preview(State(state): State<AppState>, Query(query): Query<PreviewQuery>) -> Json<PreviewResponse> {
    let renderer = state
        .preview
        .read()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    Json(preview_response(&renderer, query.device))
}

/// `POST /api/preview/reload?device=` — rebuild the rendering context without changing content.
pub async fn reload_preview(State(state): State<AppState>, Query(query): Query<PreviewQuery>) -> Json<PreviewResponse> {
    let mut renderer = state
        .preview
        .write()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    renderer.force_reload();
    Json(preview_response(&renderer, query.device))
}

/// `GET /preview/frame` — the rendered document, sandboxed by CSP as well as by the iframe attribute.
pub async fn frame(State(state): State<AppState>) -> Response {
    let html = state
        .preview
        .read()
        .unwrap_or_else(std::sync::PoisonError::into_inner)
        .frame_document()
        .to_string();

    (
        [
            (CONTENT_TYPE, "text/html; charset=utf-8".to_string()),
            (CONTENT_SECURITY_POLICY, format!("sandbox {SANDBOX_POLICY}")),
            (CACHE_CONTROL, "no-store".to_string()),
        ],
        html,
    )
        .into_response()
}

/// `GET /api/export` — download the current document.
pub async fn export_document(State(state): State<AppState>) -> Result<Response, ApiError> {
    let Some(document) = state.orchestrator.current_document() else {
        return Err(ApiError::new(StatusCode::NOT_FOUND, &NoDocument));
    };

    info!(version = document.version, bytes = document.html.len(), "export: document downloaded");
    Ok((
        [
            (CONTENT_TYPE, "text/html; charset=utf-8".to_string()),
            (CONTENT_DISPOSITION, format!("attachment; filename=\"{EXPORT_FILENAME}\"")),
        ],
        document.html,
    )
        .into_response())
}

#[cfg(test)]
#[path = "preview_test.rs"]
mod tests;
