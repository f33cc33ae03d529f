//! Request orchestrator — user instruction → conversation + document updates.
//!
//! DESIGN
//! ======
//! Two states, `Idle` and `Generating`, guarded inside the orchestrator so
//! no caller can start a second generation while one is in flight.
//!
//! A submission is two explicit phases:
//! 1. `begin` (synchronous): Idle → Generating, user message appended.
//! 2. `finish` (after the remote call resolves): document swapped on
//!    success, exactly one assistant message appended either way,
//!    Generating → Idle.
//!
//! A `PendingGeneration` dropped without `finish` settles as a failure.
//!
//! The state lock is never held across the remote call. Successful
//! documents are published on a watch channel for the preview task.

use std::sync::{Mutex, MutexGuard, PoisonError};

use tokio::sync::watch;
use tracing::{info, warn};

use super::codegen::{CodeGenerator, GenerationError};
use crate::error::ErrorCode;
use crate::state::{ConversationState, GeneratedDocument, Message, Phase, Role};

pub const ACKNOWLEDGEMENT: &str =
    "I've updated the preview with your request. Let me know if you want to change anything!";
pub const FAILURE_REPLY: &str =
    "Sorry, I encountered an error while generating the code. Please check your API key and try again.";

// =============================================================================
// TYPES
// =============================================================================

#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum SubmitError {
    #[error("instruction is empty")]
    EmptyInstruction,
    #[error("a generation is already in progress")]
    Busy,
}

impl ErrorCode for SubmitError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::EmptyInstruction => "E_EMPTY_INSTRUCTION",
            Self::Busy => "E_BUSY",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::Busy)
    }
}

/// Ticket for an in-flight generation, produced by [`Orchestrator::begin`].
///
/// Holds the Generating slot. Dropping it without [`Orchestrator::finish`]
/// (a panicking provider, a cancelled future) settles the submission as a
/// failure and returns the orchestrator to Idle.
pub struct PendingGeneration<'a> {
    orchestrator: &'a Orchestrator,
    pub instruction: String,
    /// Full html of the document current at submission time.
    pub prior_document: Option<String>,
    pub user_message: Message,
    settled: bool,
}

impl std::fmt::Debug for PendingGeneration<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingGeneration")
            .field("instruction", &self.instruction)
            .field("has_prior", &self.prior_document.is_some())
            .field("user_message", &self.user_message.id)
            .finish_non_exhaustive()
    }
}

impl Drop for PendingGeneration<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.orchestrator.abandon(self.user_message.id);
        }
    }
}

/// Result of a completed submission.
#[derive(Debug, Clone)]
pub struct SubmitOutcome {
    pub user_message: Message,
    pub reply: Message,
    /// The new document; `None` when generation failed.
    pub document: Option<GeneratedDocument>,
}

impl SubmitOutcome {
    #[must_use]
    pub fn succeeded(&self) -> bool {
        self.document.is_some()
    }
}

/// Read-only copy of the conversation for API responses.
#[derive(Debug, Clone)]
pub struct ConversationSnapshot {
    pub messages: Vec<Message>,
    pub phase: Phase,
    pub version: u64,
    pub document_timestamp: Option<i64>,
}

// =============================================================================
// ORCHESTRATOR
// =============================================================================

pub struct Orchestrator {
    generator: CodeGenerator,
    state: Mutex<ConversationState>,
    documents: watch::Sender<Option<GeneratedDocument>>,
}

impl Orchestrator {
    #[must_use]
    pub fn new(generator: CodeGenerator) -> Self {
        let (documents, _) = watch::channel(None);
        Self { generator, state: Mutex::new(ConversationState::new()), documents }
    }

    fn lock(&self) -> MutexGuard<'_, ConversationState> {
        // Every critical section leaves the state consistent, so a poisoned lock is still usable.
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Receiver that observes every successfully generated document.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<GeneratedDocument>> {
        self.documents.subscribe()
    }

    #[must_use]
    pub fn is_generating(&self) -> bool {
        self.lock().phase() == Phase::Generating
    }

    /// Version of the current document, 0 before the first success.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.lock().version()
    }

    #[must_use]
    pub fn current_document(&self) -> Option<GeneratedDocument> {
        self.lock().document().cloned()
    }

    #[must_use]
    pub fn snapshot(&self) -> ConversationSnapshot {
        let state = self.lock();
        ConversationSnapshot {
            messages: state.messages().to_vec(),
            phase: state.phase(),
            version: state.version(),
            document_timestamp: state.document().map(|d| d.timestamp),
        }
    }

    /// Phase 1: claim the generating slot and record the user's message.
    ///
    /// # Errors
    ///
    /// [`SubmitError::EmptyInstruction`] for blank input and [`SubmitError::Busy`]
    /// while another generation is in flight. Neither appends a message.
    pub fn begin(&self, instruction: &str) -> Result<PendingGeneration<'_>, SubmitError> {
        let instruction = instruction.trim();
        if instruction.is_empty() {
            return Err(SubmitError::EmptyInstruction);
        }

        let mut state = self.lock();
        if state.phase() == Phase::Generating {
            return Err(SubmitError::Busy);
        }
        state.set_phase(Phase::Generating);
        let user_message = state
            .append(Message::new(Role::User, instruction))
            .clone();
        let prior_document = state.document().map(|d| d.html.clone());

        info!(message_id = %user_message.id, version = state.version(), "orchestrator: generation started");
        Ok(PendingGeneration {
            orchestrator: self,
            instruction: instruction.to_string(),
            prior_document,
            user_message,
            settled: false,
        })
    }

    /// Phase 2: apply the generation result and return to Idle.
    pub fn finish(&self, mut pending: PendingGeneration<'_>, result: Result<String, GenerationError>) -> SubmitOutcome {
        pending.settled = true;
        let mut state = self.lock();

        let (reply, document) = match result {
            Ok(html) => {
                let document = state.replace_document(html).clone();
                info!(version = document.version, html_len = document.html.len(), "orchestrator: generation succeeded");
                (Message::new(Role::Assistant, ACKNOWLEDGEMENT), Some(document))
            }
            Err(e) => {
                warn!(
                    error = %e,
                    code = e.error_code(),
                    retryable = e.retryable(),
                    version = state.version(),
                    "orchestrator: generation failed"
                );
                (Message::new(Role::Assistant, FAILURE_REPLY), None)
            }
        };

        let reply = state.append(reply).clone();
        state.set_phase(Phase::Idle);
        drop(state);

        if let Some(doc) = &document {
            self.documents.send_replace(Some(doc.clone()));
        }

        SubmitOutcome { user_message: pending.user_message.clone(), reply, document }
    }

    /// Run a full submission: `begin`, one remote generation, `finish`.
    ///
    /// # Errors
    ///
    /// Only the [`begin`](Self::begin) rejections. Generation failures are
    /// reported in the outcome as a failure reply, never as an error.
    pub async fn submit(&self, instruction: &str) -> Result<SubmitOutcome, SubmitError> {
        let pending = self.begin(instruction)?;
        let result = self
            .generator
            .generate(&pending.instruction, pending.prior_document.as_deref())
            .await;
        Ok(self.finish(pending, result))
    }

    /// Settle a submission whose result never arrived.
    fn abandon(&self, user_message_id: uuid::Uuid) {
        let mut state = self.lock();
        warn!(message_id = %user_message_id, version = state.version(), "orchestrator: generation abandoned");
        state.append(Message::new(Role::Assistant, FAILURE_REPLY));
        state.set_phase(Phase::Idle);
    }
}

#[cfg(test)]
#[path = "orchestrator_test.rs"]
mod tests;
