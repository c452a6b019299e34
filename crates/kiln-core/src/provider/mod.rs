//! LLM provider capability.
//!
//! The plan generator only needs "model + messages + temperature + max
//! tokens in, completion text out". That narrow surface is the
//! [`ChatProvider`] trait, so tests can swap the network for a scripted
//! double.
//!
//! # Architecture
//!
//! ```text
//! PlanGenerator
//!     |
//!     v
//! Arc<dyn ChatProvider> --complete(ChatRequest)--> String
//!     |
//!     +-- OpenRouterClient  (reqwest, OpenAI-compatible chat completions)
//!     +-- ScriptedProvider  (kiln-test-utils)
//! ```

pub mod error;
pub mod openrouter;
pub mod trait_def;
pub mod types;

pub use error::ProviderError;
pub use openrouter::{OpenRouterClient, ProviderConfig};
pub use trait_def::ChatProvider;
pub use types::{ChatMessage, ChatRequest, Role};
