//! Domain services used by HTTP routes.
//!
//! ARCHITECTURE
//! ============
//! Service modules own generation, conversation, and preview logic so route
//! handlers can stay focused on protocol translation.

pub mod codegen;
pub mod orchestrator;
pub mod preview;
