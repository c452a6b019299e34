//! Plan generation: provider call, parse, and bounded retry.
//!
//! A single [`PlanGenerator::generate`] call:
//! 1. Fails fast with [`GenerateError::MissingCredentials`] when the
//!    provider has no API key (zero provider calls).
//! 2. Sends the fixed system prompt plus the goal.
//! 3. Parses the reply via [`parse_plan`].
//! 4. On any failure (provider error, empty output, bad JSON, schema
//!    mismatch) tries again immediately, up to `max_attempts` calls.
//!
//! Retries do not distinguish transient from permanent failures, and there
//! is no backoff. Each failed attempt is logged with whether it looked
//! transient. Attempts run strictly one after another.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info, warn};

use super::parser::{PlanParseError, parse_plan};
use super::prompt;
use super::types::ExecutionPlan;
use crate::provider::{ChatProvider, ChatRequest, ProviderConfig, ProviderError};

/// Total provider calls allowed per generation.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 3;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Per-call sampling settings and the retry bound.
#[derive(Debug, Clone, PartialEq)]
pub struct GeneratorSettings {
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Clamped to at least 1.
    pub max_attempts: u32,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self::from(&ProviderConfig::default())
    }
}

impl From<&ProviderConfig> for GeneratorSettings {
    fn from(config: &ProviderConfig) -> Self {
        Self {
            model: config.model.clone(),
            temperature: config.temperature,
            max_tokens: config.max_tokens,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// Terminal outcome of a failed generation.
#[derive(Debug, Error)]
pub enum GenerateError {
    #[error("OPENROUTER_API_KEY or OPENAI_API_KEY must be set")]
    MissingCredentials,

    #[error("LLM provider call failed after {attempts} attempt(s): {source}")]
    Provider {
        attempts: u32,
        #[source]
        source: ProviderError,
    },

    #[error("no valid plan after {attempts} attempt(s): {source}")]
    InvalidOutput {
        attempts: u32,
        #[source]
        source: PlanParseError,
    },
}

impl GenerateError {
    /// Whether the failure is attributable to the request or deployment
    /// rather than to the provider.
    ///
    /// Missing credentials and output that never matched the plan shape are
    /// client-attributable; provider/network failures are not.
    pub fn is_client_error(&self) -> bool {
        match self {
            Self::MissingCredentials | Self::InvalidOutput { .. } => true,
            Self::Provider { .. } => false,
        }
    }

    /// Number of provider calls made before giving up.
    pub fn attempts(&self) -> u32 {
        match self {
            Self::MissingCredentials => 0,
            Self::Provider { attempts, .. } | Self::InvalidOutput { attempts, .. } => *attempts,
        }
    }
}

/// Why one attempt failed. Only the last one is surfaced.
#[derive(Debug, Error)]
enum AttemptError {
    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error(transparent)]
    Output(#[from] PlanParseError),
}

impl AttemptError {
    /// Only provider failures can be transient; bad output is not.
    fn is_transient(&self) -> bool {
        match self {
            Self::Provider(err) => err.is_transient(),
            Self::Output(_) => false,
        }
    }

    fn into_generate_error(self, attempts: u32) -> GenerateError {
        match self {
            Self::Provider(ProviderError::MissingCredentials) => GenerateError::MissingCredentials,
            Self::Provider(source) => GenerateError::Provider { attempts, source },
            Self::Output(source) => GenerateError::InvalidOutput { attempts, source },
        }
    }
}

// ---------------------------------------------------------------------------
// Generator
// ---------------------------------------------------------------------------

/// Stateless plan generator; safe to share across concurrent requests.
#[derive(Clone)]
pub struct PlanGenerator {
    provider: Arc<dyn ChatProvider>,
    settings: GeneratorSettings,
}

impl std::fmt::Debug for PlanGenerator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlanGenerator")
            .field("provider", &self.provider.name())
            .field("settings", &self.settings)
            .finish()
    }
}

impl PlanGenerator {
    pub fn new(provider: Arc<dyn ChatProvider>, settings: GeneratorSettings) -> Self {
        let settings = GeneratorSettings {
            max_attempts: settings.max_attempts.max(1),
            ..settings
        };
        Self { provider, settings }
    }

    pub fn provider(&self) -> &dyn ChatProvider {
        self.provider.as_ref()
    }

    pub fn settings(&self) -> &GeneratorSettings {
        &self.settings
    }

    /// Turn an already-validated goal into a plan.
    pub async fn generate(&self, goal: &str) -> Result<ExecutionPlan, GenerateError> {
        if !self.provider.has_credentials() {
            warn!(provider = self.provider.name(), "no API key configured; refusing to call provider");
            return Err(GenerateError::MissingCredentials);
        }

        let messages = prompt::build_messages(goal);
        let max_attempts = self.settings.max_attempts;
        let mut attempt = 1;

        loop {
            let request = ChatRequest {
                model: self.settings.model.clone(),
                messages: messages.clone(),
                temperature: self.settings.temperature,
                max_tokens: self.settings.max_tokens,
            };

            match self.attempt(request).await {
                Ok(plan) => {
                    info!(
                        attempt,
                        steps = plan.execution_plan.len(),
                        priority = %plan.priority_level,
                        "plan generated"
                    );
                    return Ok(plan);
                }
                Err(AttemptError::Provider(ProviderError::MissingCredentials)) => {
                    return Err(GenerateError::MissingCredentials);
                }
                Err(err) => {
                    warn!(
                        attempt,
                        max_attempts,
                        transient = err.is_transient(),
                        error = %err,
                        "plan generation attempt failed"
                    );
                    if attempt >= max_attempts {
                        return Err(err.into_generate_error(attempt));
                    }
                    attempt += 1;
                }
            }
        }
    }

    async fn attempt(&self, request: ChatRequest) -> Result<ExecutionPlan, AttemptError> {
        let text = self.provider.complete(request).await?;
        debug!(response_len = text.len(), "received provider response");
        Ok(parse_plan(&text)?)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
