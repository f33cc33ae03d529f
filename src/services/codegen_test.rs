use super::*;
use crate::state::test_helpers::MockLlm;

// =========================================================================
// strip_fences
// =========================================================================

#[test]
fn strip_fences_html_tagged_block() {
    assert_eq!(strip_fences("```html\n<p>x</p>\n```"), "<p>x</p>");
}

#[test]
fn strip_fences_untagged_block() {
    assert_eq!(strip_fences("```\n<div></div>\n```"), "<div></div>");
}

#[test]
fn strip_fences_uppercase_tag() {
    assert_eq!(strip_fences("```HTML\n<p>x</p>\n```"), "<p>x</p>");
}

#[test]
fn strip_fences_only_opening_fence() {
    assert_eq!(strip_fences("```html\n<p>x</p>"), "<p>x</p>");
}

#[test]
fn strip_fences_only_closing_fence() {
    assert_eq!(strip_fences("<p>x</p>\n```"), "<p>x</p>");
}

#[test]
fn strip_fences_tag_with_symbols() {
    assert_eq!(strip_fences("```c#\n<p>x</p>\n```"), "<p>x</p>");
    assert_eq!(strip_fences("```objective-c++\n<p>x</p>\n```"), "<p>x</p>");
    assert_eq!(strip_fences("```html {.numberLines}\n<p>x</p>\n```"), "<p>x</p>");
}

#[test]
fn strip_fences_tag_on_same_line_as_markup() {
    assert_eq!(strip_fences("```html<p>x</p>```"), "<p>x</p>");
}

#[test]
fn strip_fences_trims_surrounding_whitespace() {
    assert_eq!(strip_fences("  \n```html\n<p>x</p>\n```\n "), "<p>x</p>");
}

#[test]
fn strip_fences_clean_text_is_noop() {
    let clean = "<!DOCTYPE html>\n<html><body>hi</body></html>";
    assert_eq!(strip_fences(clean), clean);
}

#[test]
fn strip_fences_is_idempotent() {
    for input in ["```html\n<p>x</p>\n```", "<p>y</p>", "  <b>z</b>\n```", "```\n\n<i>w</i>"] {
        let once = strip_fences(input);
        assert_eq!(strip_fences(once), once, "input: {input:?}");
    }
}

#[test]
fn strip_fences_keeps_inner_backticks() {
    let input = "```html\n<pre>```inner```</pre>\n```";
    assert_eq!(strip_fences(input), "<pre>```inner```</pre>");
}

#[test]
fn strip_fences_bare_fence_is_empty() {
    assert_eq!(strip_fences("```"), "");
    assert_eq!(strip_fences("```html\n```"), "");
}

// =========================================================================
// build_prompt
// =========================================================================

#[test]
fn build_prompt_without_prior_is_instruction() {
    assert_eq!(build_prompt("Landing page for a coffee shop", None), "Landing page for a coffee shop");
}

#[test]
fn build_prompt_embeds_full_prior_document() {
    let prior = "<html><body><h1>Coffee</h1></body></html>";
    let prompt = build_prompt("Make the header red", Some(prior));
    assert!(prompt.contains("Current Code Version:"));
    assert!(prompt.contains(prior));
    assert!(prompt.contains("User Request for updates:\nMake the header red"));
    assert!(prompt.ends_with("Return the fully updated HTML file."));
    assert!(prompt.find(prior).unwrap() < prompt.find("Make the header red").unwrap());
}

#[test]
fn build_prompt_empty_prior_is_ignored() {
    assert_eq!(build_prompt("hello", Some("")), "hello");
}

#[test]
fn system_instruction_covers_contract() {
    assert!(SYSTEM_INSTRUCTION.contains("SINGLE, complete HTML file"));
    assert!(SYSTEM_INSTRUCTION.contains("cdn.tailwindcss.com"));
    assert!(SYSTEM_INSTRUCTION.contains("picsum.photos"));
    assert!(SYSTEM_INSTRUCTION.contains("mobile-first"));
    assert!(SYSTEM_INSTRUCTION.contains("never a diff"));
}

// =========================================================================
// CodeGenerator::generate
// =========================================================================

#[tokio::test]
async fn generate_strips_fences_from_response() {
    let llm = Arc::new(MockLlm::new(vec![Ok("```html\n<p>x</p>\n```".into())]));
    let generator = CodeGenerator::new(llm.clone());
    let html = generator.generate("make x", None).await.unwrap();
    assert_eq!(html, "<p>x</p>");
    assert_eq!(llm.recorded_prompts(), vec!["make x".to_string()]);
}

#[tokio::test]
async fn generate_sends_prior_document_as_context() {
    let llm = Arc::new(MockLlm::always("<p>new</p>"));
    let generator = CodeGenerator::new(llm.clone());
    generator
        .generate("change it", Some("<p>old</p>"))
        .await
        .unwrap();
    let prompts = llm.recorded_prompts();
    assert!(prompts[0].contains("<p>old</p>"));
    assert!(prompts[0].contains("change it"));
}

#[tokio::test]
async fn generate_propagates_remote_error() {
    let llm = Arc::new(MockLlm::new(vec![Err(LlmError::ApiResponse { status: 401, body: "bad key".into() })]));
    let err = CodeGenerator::new(llm).generate("x", None).await.unwrap_err();
    assert!(matches!(err, GenerationError::Remote(LlmError::ApiResponse { status: 401, .. })));
    assert_eq!(err.error_code(), "E_GENERATION_REMOTE");
    assert!(!err.retryable());
}

#[tokio::test]
async fn generate_fence_only_response_is_empty_error() {
    let llm = Arc::new(MockLlm::new(vec![Ok("```html\n```".into())]));
    let err = CodeGenerator::new(llm).generate("x", None).await.unwrap_err();
    assert!(matches!(err, GenerationError::EmptyResponse));
}

struct StalledLlm;

#[async_trait::async_trait]
impl LlmGenerate for StalledLlm {
    async fn generate_content(&self, _system: &str, _contents: &str, _tuning: &Tuning) -> Result<String, LlmError> {
        std::future::pending().await
    }
}

#[tokio::test(start_paused = true)]
async fn generate_times_out_on_stalled_call() {
    let generator = CodeGenerator::new(Arc::new(StalledLlm)).with_deadline(Duration::from_secs(5));
    let err = generator.generate("x", None).await.unwrap_err();
    assert!(matches!(err, GenerationError::Timeout(d) if d == Duration::from_secs(5)));
}
