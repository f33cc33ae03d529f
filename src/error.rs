//! Error code contract shared by every error surfaced over HTTP.
//!
//! DESIGN
//! ======
//! Each module owns its `thiserror` enum. Route handlers never leak the
//! `Display` text of upstream failures; they serialize an `ErrorBody` with
//! a stable machine code instead.

use serde::Serialize;

/// Stable, machine-readable classification of an error.
pub trait ErrorCode: std::fmt::Display {
    fn error_code(&self) -> &'static str;

    fn retryable(&self) -> bool {
        false
    }
}

/// JSON body returned for non-2xx API responses.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
    pub retryable: bool,
}

impl ErrorBody {
    #[must_use]
    pub fn from_error(err: &(impl ErrorCode + ?Sized)) -> Self {
        Self { code: err.error_code(), message: err.to_string(), retryable: err.retryable() }
    }
}

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
