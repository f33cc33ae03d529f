//! Shared application state.
//!
//! DESIGN
//! ======
//! `AppState` is injected into Axum handlers via the `State` extractor.
//! It holds the orchestrator (which owns the conversation and the current
//! document) and the preview renderer (which owns the rendering context).
//! The two are connected only through the orchestrator's document channel.

use std::sync::{Arc, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::services::orchestrator::Orchestrator;
use crate::services::preview::PreviewRenderer;

/// Current time as milliseconds since Unix epoch.
#[must_use]
pub fn now_ms() -> i64 {
    let Ok(dur) = SystemTime::now().duration_since(UNIX_EPOCH) else {
        return 0;
    };
    i64::try_from(dur.as_millis()).unwrap_or(i64::MAX)
}

// =============================================================================
// MESSAGE
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

/// One chat entry. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    /// Creation time, ms since epoch.
    pub timestamp: i64,
}

impl Message {
    #[must_use]
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self { id: Uuid::new_v4(), role, content: content.into(), timestamp: now_ms() }
    }
}

// =============================================================================
// GENERATED DOCUMENT
// =============================================================================

/// The single current HTML artifact. Replaced wholesale on each successful generation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GeneratedDocument {
    pub html: String,
    /// Starts at 1 and increments only on success.
    pub version: u64,
    pub timestamp: i64,
}

// =============================================================================
// CONVERSATION STATE
// =============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Generating,
}

/// Append-only message log plus the current document slot.
#[derive(Debug)]
pub struct ConversationState {
    messages: Vec<Message>,
    document: Option<GeneratedDocument>,
    phase: Phase,
}

impl ConversationState {
    #[must_use]
    pub fn new() -> Self {
        Self { messages: Vec::new(), document: None, phase: Phase::Idle }
    }

    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    #[must_use]
    pub fn document(&self) -> Option<&GeneratedDocument> {
        self.document.as_ref()
    }

    /// Version of the current document, 0 before the first success.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.document.as_ref().map_or(0, |d| d.version)
    }

    #[must_use]
    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub(crate) fn set_phase(&mut self, phase: Phase) {
        self.phase = phase;
    }

    pub(crate) fn append(&mut self, message: Message) -> &Message {
        self.messages.push(message);
        &self.messages[self.messages.len() - 1]
    }

    /// Swap in a new document at `version + 1` and return it.
    pub(crate) fn replace_document(&mut self, html: String) -> &GeneratedDocument {
        let version = self.version() + 1;
        self.document.insert(GeneratedDocument { html, version, timestamp: now_ms() })
    }
}

impl Default for ConversationState {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// APP STATE
// =============================================================================

/// Shared application state, injected into Axum handlers via State extractor.
/// Clone is required by Axum; all inner fields are Arc-wrapped.
#[derive(Clone)]
pub struct AppState {
    pub orchestrator: Arc<Orchestrator>,
    pub preview: Arc<RwLock<PreviewRenderer>>,
    /// Model name shown in the chat footer.
    pub model: Arc<str>,
}

impl AppState {
    #[must_use]
    pub fn new(orchestrator: Orchestrator, model: &str) -> Self {
        Self {
            orchestrator: Arc::new(orchestrator),
            preview: Arc::new(RwLock::new(PreviewRenderer::new())),
            model: Arc::from(model),
        }
    }
}

// =============================================================================
// TEST HELPERS
// =============================================================================

#[cfg(test)]
pub mod test_helpers {
    use super::*;
    use crate::llm::LlmGenerate;
    use crate::llm::types::{LlmError, Tuning};
    use crate::services::codegen::CodeGenerator;
    use std::sync::Mutex;

    /// Scripted LLM: pops one canned result per call and records every prompt.
    pub struct MockLlm {
        responses: Mutex<Vec<Result<String, LlmError>>>,
        pub prompts: Mutex<Vec<String>>,
    }

    impl MockLlm {
        #[must_use]
        pub fn new(responses: Vec<Result<String, LlmError>>) -> Self {
            Self { responses: Mutex::new(responses), prompts: Mutex::new(Vec::new()) }
        }

        /// Every call succeeds with `html`.
        #[must_use]
        pub fn always(html: &str) -> Self {
            Self::new((0..16).map(|_| Ok(html.to_string())).collect())
        }

        #[must_use]
        pub fn recorded_prompts(&self) -> Vec<String> {
            self.prompts.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl LlmGenerate for MockLlm {
        async fn generate_content(&self, _system: &str, contents: &str, _tuning: &Tuning) -> Result<String, LlmError> {
            self.prompts.lock().unwrap().push(contents.to_string());
            let mut responses = self.responses.lock().unwrap();
            if responses.is_empty() { Err(LlmError::EmptyResponse) } else { responses.remove(0) }
        }
    }

    /// Create a test `AppState` around a mock LLM.
    #[must_use]
    pub fn test_app_state(llm: Arc<dyn LlmGenerate>) -> AppState {
        AppState::new(Orchestrator::new(CodeGenerator::new(llm)), "mock-model")
    }
}
