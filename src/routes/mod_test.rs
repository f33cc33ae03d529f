use super::*;
use crate::services::orchestrator::SubmitError;

#[tokio::test]
async fn api_error_renders_status_and_json_body() {
    let response = ApiError::new(StatusCode::CONFLICT, &SubmitError::Busy).into_response();
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
    assert_eq!(json["code"], "E_BUSY");
    assert_eq!(json["retryable"], true);
}

#[tokio::test]
async fn healthz_is_ok() {
    assert_eq!(healthz().await, StatusCode::OK);
}

#[tokio::test]
async fn shell_page_has_chat_and_preview() {
    let Html(page) = shell().await;
    assert!(page.contains("/api/messages"));
    assert!(page.contains("/api/preview"));
    assert!(page.contains("/api/export"));
}
