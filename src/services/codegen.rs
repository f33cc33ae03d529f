//! Code generation client — instruction (+ prior document) → complete HTML document.
//!
//! DESIGN
//! ======
//! One remote call per generation, no retry. The prior document is sent in
//! full as editing context; the model is instructed to always answer with a
//! whole document, never a diff. Responses are normalised by `strip_fences`,
//! which is plain trimming, not markdown parsing.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::error::ErrorCode;
use crate::llm::LlmGenerate;
use crate::llm::config::DEFAULT_LLM_REQUEST_TIMEOUT_SECS;
use crate::llm::types::{LlmError, Tuning};

const FENCE: &str = "```";

/// Fixed behavioural contract for the remote model.
pub const SYSTEM_INSTRUCTION: &str = "\
You are Helbulid, an expert full-stack web developer and UI/UX designer.
Your goal is to build single-file HTML prototypes that look modern, beautiful, and are fully functional.

RULES:
1. ALWAYS return a SINGLE, complete HTML file.
2. Use Tailwind CSS via CDN for styling. (<script src=\"https://cdn.tailwindcss.com\"></script>)
3. Use FontAwesome or similar via CDN for icons if needed, or simple inline SVG icons.
4. Include all JavaScript inside <script> tags within the HTML.
5. Include all CSS inside <style> tags (if custom CSS is needed beyond Tailwind).
6. The design must be responsive (mobile-first) and visually stunning.
7. Use https://picsum.photos/WIDTH/HEIGHT for placeholder images.
8. DO NOT wrap the output in markdown code blocks (like ```html). Return the RAW HTML string only.
9. If the user asks for changes, modify the previous code and return the FULL updated HTML file, never a diff.
";

// =============================================================================
// ERROR
// =============================================================================

#[derive(Debug, thiserror::Error)]
pub enum GenerationError {
    #[error("generation service failed: {0}")]
    Remote(#[from] LlmError),
    #[error("generation service returned an empty document")]
    EmptyResponse,
    #[error("generation timed out after {0:?}")]
    Timeout(Duration),
}

impl ErrorCode for GenerationError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::Remote(_) => "E_GENERATION_REMOTE",
            Self::EmptyResponse => "E_GENERATION_EMPTY",
            Self::Timeout(_) => "E_GENERATION_TIMEOUT",
        }
    }

    fn retryable(&self) -> bool {
        match self {
            Self::Remote(e) => e.retryable(),
            Self::EmptyResponse | Self::Timeout(_) => true,
        }
    }
}

// =============================================================================
// CLIENT
// =============================================================================

pub struct CodeGenerator {
    llm: Arc<dyn LlmGenerate>,
    tuning: Tuning,
    deadline: Duration,
}

impl CodeGenerator {
    #[must_use]
    pub fn new(llm: Arc<dyn LlmGenerate>) -> Self {
        Self { llm, tuning: Tuning::default(), deadline: Duration::from_secs(DEFAULT_LLM_REQUEST_TIMEOUT_SECS) }
    }

    #[must_use]
    pub fn with_tuning(mut self, tuning: Tuning) -> Self {
        self.tuning = tuning;
        self
    }

    /// Caller-side bound on one generation, independent of the HTTP client timeout.
    #[must_use]
    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = deadline;
        self
    }

    /// Produce a complete document for `instruction`, editing `prior_document` when present.
    ///
    /// # Errors
    ///
    /// Returns [`GenerationError`] on any transport, credential, or empty-response
    /// failure, or when the deadline expires.
    pub async fn generate(&self, instruction: &str, prior_document: Option<&str>) -> Result<String, GenerationError> {
        let prompt = build_prompt(instruction, prior_document);
        debug!(prompt_len = prompt.len(), has_prior = prior_document.is_some(), "codegen: request");

        let call = self
            .llm
            .generate_content(SYSTEM_INSTRUCTION, &prompt, &self.tuning);
        let raw = match tokio::time::timeout(self.deadline, call).await {
            Err(_) => return Err(GenerationError::Timeout(self.deadline)),
            Ok(Err(LlmError::ApiResponse { status, body })) => {
                // Provider detail stays in the logs; callers only see the status.
                debug!(status, body = %body, "codegen: provider rejected request");
                return Err(LlmError::ApiResponse { status, body }.into());
            }
            Ok(result) => result?,
        };

        let html = strip_fences(&raw);
        if html.is_empty() {
            warn!(raw_len = raw.len(), "codegen: response empty after fence stripping");
            return Err(GenerationError::EmptyResponse);
        }
        Ok(html.to_string())
    }
}

// =============================================================================
// PROMPT + POST-PROCESSING
// =============================================================================

/// Combine the instruction with the prior document, if any.
#[must_use]
pub fn build_prompt(instruction: &str, prior_document: Option<&str>) -> String {
    match prior_document {
        Some(prior) if !prior.is_empty() => format!(
            "Current Code Version:\n{prior}\n\nUser Request for updates:\n{instruction}\n\nReturn the fully updated HTML file."
        ),
        _ => instruction.to_string(),
    }
}

/// Remove an opening fence (with optional language tag) and a closing fence, then trim.
///
/// Idempotent: already-clean text only loses surrounding whitespace.
#[must_use]
pub fn strip_fences(text: &str) -> &str {
    let mut out = text.trim();

    if let Some(rest) = out.strip_prefix(FENCE) {
        out = strip_fence_tag(rest).trim_start();
    }
    if let Some(rest) = out.strip_suffix(FENCE) {
        out = rest.trim_end();
    }

    out
}

/// Drop the language tag after an opening fence.
///
/// The tag is the rest of the first line (`c#`, `objective-c++`, `html `)
/// unless that line already holds markup, as in ```` ```html<p>x</p> ````,
/// where only the leading word is the tag.
fn strip_fence_tag(rest: &str) -> &str {
    let line_end = rest.find('\n').unwrap_or(rest.len());
    if !rest[..line_end].contains('<') {
        return &rest[line_end..];
    }
    let tag_len = rest
        .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '+' | '#')))
        .unwrap_or(rest.len());
    &rest[tag_len..]
}

#[cfg(test)]
#[path = "codegen_test.rs"]
mod tests;
