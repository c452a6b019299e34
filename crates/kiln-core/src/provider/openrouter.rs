//! OpenAI-compatible chat-completions client (OpenRouter by default).
//!
//! Makes a single POST per call. There is no client-side retry and no
//! explicit timeout; reqwest's defaults govern.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use super::{ChatProvider, ChatRequest, ProviderError};

/// Provider connection and sampling settings.
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderConfig {
    /// Bearer token. `None` means generation fails before any call.
    pub api_key: Option<String>,
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
}

impl ProviderConfig {
    pub const DEFAULT_BASE_URL: &str = "https://openrouter.ai/api/v1";
    pub const DEFAULT_MODEL: &str = "meta-llama/llama-3.3-70b-instruct";
    pub const DEFAULT_TEMPERATURE: f32 = 0.3;
    pub const DEFAULT_MAX_TOKENS: u32 = 2048;
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            model: Self::DEFAULT_MODEL.to_string(),
            temperature: Self::DEFAULT_TEMPERATURE,
            max_tokens: Self::DEFAULT_MAX_TOKENS,
        }
    }
}

/// HTTP client for an OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenRouterClient {
    api_key: Option<String>,
    base_url: String,
    http: Client,
}

impl OpenRouterClient {
    pub fn new(config: &ProviderConfig) -> Self {
        Self {
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            http: Client::new(),
        }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.base_url)
    }
}

impl std::fmt::Debug for OpenRouterClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenRouterClient")
            .field("base_url", &self.base_url)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

#[async_trait]
impl ChatProvider for OpenRouterClient {
    fn name(&self) -> &str {
        "openrouter"
    }

    fn has_credentials(&self) -> bool {
        self.api_key.is_some()
    }

    async fn complete(&self, request: ChatRequest) -> Result<String, ProviderError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ProviderError::MissingCredentials)?;

        debug!(model = %request.model, max_tokens = request.max_tokens, "complete: called");

        let response = self
            .http
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            debug!(status = status.as_u16(), "complete: API error");
            return Err(ProviderError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body = response.text().await?;
        let content = extract_content(&body)?;
        debug!(content_len = content.len(), "complete: success");
        Ok(content)
    }
}

// ---------------------------------------------------------------------------
// Response parsing
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct CompletionResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Pull the first choice's text out of a raw response body.
fn extract_content(body: &str) -> Result<String, ProviderError> {
    let parsed: CompletionResponse = serde_json::from_str(body)?;
    let choice = parsed
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| ProviderError::InvalidResponse("response has no choices".to_string()))?;
    Ok(choice.message.content.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_targets_openrouter() {
        let config = ProviderConfig::default();
        assert_eq!(config.base_url, "https://openrouter.ai/api/v1");
        assert_eq!(config.model, "meta-llama/llama-3.3-70b-instruct");
        assert_eq!(config.max_tokens, 2048);
        assert!(config.api_key.is_none());
    }

    #[test]
    fn endpoint_tolerates_trailing_slash() {
        let client = OpenRouterClient::new(&ProviderConfig {
            base_url: "http://localhost:9999/v1/".to_string(),
            ..ProviderConfig::default()
        });
        assert_eq!(client.endpoint(), "http://localhost:9999/v1/chat/completions");
    }

    #[test]
    fn credentials_follow_config() {
        let without = OpenRouterClient::new(&ProviderConfig::default());
        assert!(!without.has_credentials());

        let with = OpenRouterClient::new(&ProviderConfig {
            api_key: Some("sk-test".to_string()),
            ..ProviderConfig::default()
        });
        assert!(with.has_credentials());
        assert!(!format!("{with:?}").contains("sk-test"));
    }

    #[tokio::test]
    async fn complete_without_key_fails_before_network() {
        let client = OpenRouterClient::new(&ProviderConfig::default());
        let err = client
            .complete(ChatRequest {
                model: "m".to_string(),
                messages: vec![],
                temperature: 0.0,
                max_tokens: 1,
            })
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::MissingCredentials));
    }

    #[test]
    fn extract_first_choice_content() {
        let body = r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"{\"a\":1}"},"finish_reason":"stop"}]}"#;
        assert_eq!(extract_content(body).unwrap(), "{\"a\":1}");
    }

    #[test]
    fn extract_null_content_is_empty() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#;
        assert_eq!(extract_content(body).unwrap(), "");
    }

    #[test]
    fn extract_no_choices_is_invalid() {
        let err = extract_content(r#"{"choices":[]}"#).unwrap_err();
        assert!(matches!(err, ProviderError::InvalidResponse(_)));
    }

    #[test]
    fn extract_garbage_is_json_error() {
        let err = extract_content("<html>502</html>").unwrap_err();
        assert!(matches!(err, ProviderError::Json(_)));
    }
}
