//! Conversation routes: history and submissions.

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use serde::{Deserialize, Serialize};
use tracing::error;

use super::ApiError;
use crate::error::ErrorCode;
use crate::services::orchestrator::SubmitError;
use crate::services::preview::PreviewSnapshot;
use crate::state::{AppState, Message, Phase};

#[derive(Debug, Serialize)]
pub struct ConversationResponse {
    pub messages: Vec<Message>,
    pub generating: bool,
    pub version: u64,
    pub document_timestamp: Option<i64>,
    pub model: String,
}

#[derive(Deserialize)]
pub struct PostMessageBody {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct PostMessageResponse {
    pub user_message: Message,
    pub reply: Message,
    pub succeeded: bool,
    pub version: u64,
    pub preview: PreviewSnapshot,
}

/// The generation task itself died (panic or runtime shutdown).
#[derive(Debug, thiserror::Error)]
#[error("generation task aborted")]
struct TaskAborted;

impl ErrorCode for TaskAborted {
    fn error_code(&self) -> &'static str {
        "E_INTERNAL"
    }
}

/// `GET /api/conversation` — full message log plus orchestrator status.
pub async fn get_conversation(State(state): State<AppState>) -> Json<ConversationResponse> {
    let snap = state.orchestrator.snapshot();
    Json(ConversationResponse {
        messages: snap.messages,
        generating: snap.phase == Phase::Generating,
        version: snap.version,
        document_timestamp: snap.document_timestamp,
        model: state.model.to_string(),
    })
}

/// `POST /api/messages` — submit an instruction and wait for the generation to resolve.
///
/// The generation runs in its own task so a dropped connection cannot leave
/// the orchestrator stuck in `Generating`.
pub async fn post_message(
    State(state): State<AppState>,
    Json(body): Json<PostMessageBody>,
) -> Result<Json<PostMessageResponse>, ApiError> {
    let orchestrator = state.orchestrator.clone();
    let task = tokio::spawn(async move { orchestrator.submit(&body.content).await });

    let outcome = task
        .await
        .map_err(|e| {
            error!(error = %e, "generation task failed");
            ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, &TaskAborted)
        })?
        .map_err(|e| ApiError::new(submit_error_to_status(&e), &e))?;

    // Render before responding so the client's next preview fetch sees this
    // version; the feed task then skips the identical pair.
    let preview = {
        let mut renderer = state
            .preview
            .write()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if let Some(doc) = &outcome.document {
            renderer.render(&doc.html, doc.version);
        }
        renderer.snapshot()
    };

    let version = state.orchestrator.version();
    Ok(Json(PostMessageResponse {
        succeeded: outcome.succeeded(),
        user_message: outcome.user_message,
        reply: outcome.reply,
        version,
        preview,
    }))
}

pub(crate) fn submit_error_to_status(err: &SubmitError) -> StatusCode {
    match err {
        SubmitError::EmptyInstruction => StatusCode::BAD_REQUEST,
        SubmitError::Busy => StatusCode::CONFLICT,
    }
}

#[cfg(test)]
#[path = "chat_test.rs"]
mod tests;
