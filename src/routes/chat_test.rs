use super::*;
use crate::llm::types::LlmError;
use crate::services::orchestrator::{ACKNOWLEDGEMENT, FAILURE_REPLY};
use crate::state::Role;
use crate::state::test_helpers::{MockLlm, test_app_state};
use std::sync::Arc;

fn body(content: &str) -> Json<PostMessageBody> {
    Json(PostMessageBody { content: content.into() })
}

#[test]
fn submit_error_to_status_maps_busy_and_empty() {
    assert_eq!(submit_error_to_status(&SubmitError::Busy), StatusCode::CONFLICT);
    assert_eq!(submit_error_to_status(&SubmitError::EmptyInstruction), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn post_message_success_renders_preview() {
    let state = test_app_state(Arc::new(MockLlm::always("<html>coffee</html>")));

    let Json(resp) = post_message(State(state.clone()), body("Landing page for a coffee shop"))
        .await
        .unwrap();

    assert!(resp.succeeded);
    assert_eq!(resp.version, 1);
    assert_eq!(resp.user_message.role, Role::User);
    assert_eq!(resp.reply.content, ACKNOWLEDGEMENT);
    assert_eq!(resp.preview.version, 1);
    assert!(resp.preview.has_document);
    assert_eq!(state.preview.read().unwrap().frame_document(), "<html>coffee</html>");
}

#[tokio::test]
async fn post_message_failure_returns_fixed_reply() {
    let llm = MockLlm::new(vec![Err(LlmError::ApiRequest("connection reset".into()))]);
    let state = test_app_state(Arc::new(llm));

    let Json(resp) = post_message(State(state.clone()), body("hello"))
        .await
        .unwrap();

    assert!(!resp.succeeded);
    assert_eq!(resp.version, 0);
    assert_eq!(resp.reply.content, FAILURE_REPLY);
    assert!(!resp.preview.has_document);
    assert!(!state.orchestrator.is_generating());
}

#[tokio::test]
async fn post_message_blank_is_bad_request() {
    let state = test_app_state(Arc::new(MockLlm::always("<p>x</p>")));
    let err = post_message(State(state.clone()), body("  "))
        .await
        .unwrap_err();
    assert_eq!(err.status, StatusCode::BAD_REQUEST);
    assert_eq!(err.body.code, "E_EMPTY_INSTRUCTION");
    assert!(state.orchestrator.snapshot().messages.is_empty());
}

#[tokio::test]
async fn post_message_while_generating_is_conflict() {
    let state = test_app_state(Arc::new(MockLlm::always("<p>x</p>")));
    let _pending = state.orchestrator.begin("in flight").unwrap();

    let err = post_message(State(state.clone()), body("second"))
        .await
        .unwrap_err();
    assert_eq!(err.status, StatusCode::CONFLICT);
    assert_eq!(err.body.code, "E_BUSY");
}

#[tokio::test]
async fn get_conversation_reports_messages_and_status() {
    let state = test_app_state(Arc::new(MockLlm::always("<p>x</p>")));
    post_message(State(state.clone()), body("one"))
        .await
        .unwrap();

    let Json(resp) = get_conversation(State(state.clone())).await;
    assert_eq!(resp.messages.len(), 2);
    assert!(!resp.generating);
    assert_eq!(resp.version, 1);
    assert!(resp.document_timestamp.is_some());
    assert_eq!(resp.model, "mock-model");

    let _pending = state.orchestrator.begin("two").unwrap();
    let Json(resp) = get_conversation(State(state.clone())).await;
    assert!(resp.generating);
    assert_eq!(resp.messages.len(), 3);
}
