//! Core of the kiln plan service.
//!
//! Turns a free-text goal into a validated [`plan::ExecutionPlan`] by asking
//! an LLM provider for JSON, then tolerantly parsing, normalizing, and
//! validating what comes back. The HTTP surface lives in `kiln-cli`.

pub mod plan;
pub mod provider;
