//! LLM types — provider-neutral request tuning, errors, and the generation trait.
//!
//! Shared by the Gemini and Anthropic clients. The rest of the crate only
//! ever sees [`LlmGenerate`], which keeps providers swappable and mockable.

use serde::Serialize;

use crate::error::ErrorCode;

// =============================================================================
// ERROR
// =============================================================================

/// Errors produced by LLM client operations.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    /// A configuration value could not be parsed.
    #[error("config parse failed: {0}")]
    ConfigParse(String),

    /// The HTTP request to the LLM provider failed.
    #[error("API request failed: {0}")]
    ApiRequest(String),

    /// The LLM provider returned a non-success HTTP status.
    #[error("API response error: status {status}")]
    ApiResponse { status: u16, body: String },

    /// The LLM provider response body could not be deserialized.
    #[error("API response parse failed: {0}")]
    ApiParse(String),

    /// The provider answered but produced no text.
    #[error("API response contained no text")]
    EmptyResponse,

    /// The underlying HTTP client could not be constructed.
    #[error("HTTP client build failed: {0}")]
    HttpClientBuild(String),
}

impl ErrorCode for LlmError {
    fn error_code(&self) -> &'static str {
        match self {
            Self::ConfigParse(_) => "E_CONFIG_PARSE",
            Self::ApiRequest(_) => "E_API_REQUEST",
            Self::ApiResponse { .. } => "E_API_RESPONSE",
            Self::ApiParse(_) => "E_API_PARSE",
            Self::EmptyResponse => "E_EMPTY_RESPONSE",
            Self::HttpClientBuild(_) => "E_HTTP_CLIENT_BUILD",
        }
    }

    fn retryable(&self) -> bool {
        matches!(self, Self::ApiRequest(_) | Self::ApiResponse { status: 429 | 500..=599, .. })
    }
}

// =============================================================================
// TUNING
// =============================================================================

/// Sampling and reasoning parameters sent with every generation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Tuning {
    pub temperature: f32,
    /// Token allowance for provider-side reasoning ("thinking").
    pub thinking_budget: u32,
    pub max_output_tokens: u32,
}

pub const DEFAULT_TEMPERATURE: f32 = 0.7;
pub const DEFAULT_THINKING_BUDGET: u32 = 2048;
pub const DEFAULT_MAX_OUTPUT_TOKENS: u32 = 16_384;

impl Default for Tuning {
    fn default() -> Self {
        Self {
            temperature: DEFAULT_TEMPERATURE,
            thinking_budget: DEFAULT_THINKING_BUDGET,
            max_output_tokens: DEFAULT_MAX_OUTPUT_TOKENS,
        }
    }
}

// =============================================================================
// LLM GENERATE TRAIT
// =============================================================================

/// Provider-neutral async trait for single-turn text generation. Enables mocking in tests.
#[async_trait::async_trait]
pub trait LlmGenerate: Send + Sync {
    /// Send `contents` under the `system` instruction and return the model's text.
    ///
    /// # Errors
    ///
    /// Returns an [`LlmError`] if the request fails, the credential is rejected,
    /// or the response is malformed or empty.
    async fn generate_content(&self, system: &str, contents: &str, tuning: &Tuning) -> Result<String, LlmError>;
}

#[cfg(test)]
#[path = "types_test.rs"]
mod tests;
