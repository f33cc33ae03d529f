//! LLM — multi-provider adapter for the remote generation service.
//!
//! DESIGN
//! ======
//! The `LlmClient` dispatches to Gemini or Anthropic based on `LLM_PROVIDER`.
//! It is constructed once in `main` with the credential injected from config
//! and handed to the orchestrator as an `Arc<dyn LlmGenerate>`; nothing reads
//! the credential from ambient state after startup.

pub mod anthropic;
pub mod config;
pub mod gemini;
pub mod types;

use config::{LlmConfig, LlmProviderKind};
pub use types::LlmGenerate;
use types::{LlmError, Tuning};

// =============================================================================
// CLIENT DISPATCH
// =============================================================================

/// Concrete LLM client that dispatches to either Gemini or Anthropic.
pub struct LlmClient {
    inner: LlmProvider,
    model: String,
}

enum LlmProvider {
    Gemini(gemini::GeminiClient),
    Anthropic(anthropic::AnthropicClient),
}

impl LlmClient {
    /// Build an LLM client from a parsed typed config.
    ///
    /// # Errors
    ///
    /// Returns an error if the provider HTTP client fails to build.
    pub fn from_config(config: LlmConfig) -> Result<Self, LlmError> {
        let model = config.model;
        let inner = match config.provider {
            LlmProviderKind::Gemini => {
                LlmProvider::Gemini(gemini::GeminiClient::new(config.api_key, config.base_url, config.timeouts)?)
            }
            LlmProviderKind::Anthropic => LlmProvider::Anthropic(anthropic::AnthropicClient::new(
                config.api_key,
                config.base_url,
                config.timeouts,
            )?),
        };
        Ok(Self { inner, model })
    }

    /// Return the configured model name (e.g. `"gemini-3-pro-preview"`).
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait::async_trait]
impl LlmGenerate for LlmClient {
    async fn generate_content(&self, system: &str, contents: &str, tuning: &Tuning) -> Result<String, LlmError> {
        match &self.inner {
            LlmProvider::Gemini(c) => {
                c.generate_content(&self.model, system, contents, tuning)
                    .await
            }
            LlmProvider::Anthropic(c) => {
                c.generate_content(&self.model, system, contents, tuning)
                    .await
            }
        }
    }
}
