//! Remote generation clients.
//!
//! One [`LlmClient`] is built from configuration at startup and passed by
//! reference through the generation path; the provider choice is a value,
//! not global state. Remote failures surface as
//! [`PipelineError::RemoteService`] with the provider's own detail kept
//! verbatim, and no retry or fallback happens here.
//!
//! Backends:
//! - **[`GeminiClient`]** — Google Generative Language API (`GEMINI_API_KEY`)
//! - **[`AnthropicClient`]** — Anthropic Messages API (`ANTHROPIC_API_KEY`)
//! - **[`MockClient`]** — canned responses for tests and offline development

use async_trait::async_trait;
use std::time::Duration;

use crate::config::LlmConfig;
use crate::error::PipelineError;

const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";
const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-20250514";
const ANTHROPIC_VERSION: &str = "2023-06-01";

/// A remote text-generation backend. One call per prompt, synchronous
/// request/response; callers decide whether a failed call is re-invoked.
#[async_trait]
pub trait LlmClient: Send + Sync {
    fn provider_name(&self) -> &str;
    fn model(&self) -> &str;
    /// Send `prompt` and return the model's raw text under the given
    /// output token budget.
    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String, PipelineError>;
}

/// Build the configured client. The API key is read from the provider's
/// environment variable here, once, so a missing key fails at startup
/// rather than mid-generation.
pub fn create_client(config: &LlmConfig) -> anyhow::Result<Box<dyn LlmClient>> {
    match config.provider.as_str() {
        "gemini" => Ok(Box::new(GeminiClient::new(config)?)),
        "anthropic" => Ok(Box::new(AnthropicClient::new(config)?)),
        other => anyhow::bail!("Unknown llm provider: '{}'. Must be gemini or anthropic.", other),
    }
}

fn http_client(timeout_secs: u64) -> Result<reqwest::Client, anyhow::Error> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(Into::into)
}

fn require_env_key(var: &str, provider: &str) -> anyhow::Result<String> {
    match std::env::var(var) {
        Ok(key) if !key.trim().is_empty() => Ok(key),
        _ => anyhow::bail!("{} not set in environment; required for the {} provider", var, provider),
    }
}

// ============ Gemini ============

pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    temperature: f32,
}

impl GeminiClient {
    pub fn new(config: &LlmConfig) -> anyhow::Result<Self> {
        Ok(Self {
            client: http_client(config.timeout_secs)?,
            api_key: require_env_key("GEMINI_API_KEY", "gemini")?,
            model: config
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            temperature: config.temperature,
        })
    }
}

#[async_trait]
impl LlmClient for GeminiClient {
    fn provider_name(&self) -> &str {
        "gemini"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String, PipelineError> {
        let url = format!(
            "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent",
            self.model
        );
        let body = serde_json::json!({
            "contents": [{
                "parts": [{ "text": prompt }]
            }],
            "generationConfig": {
                "temperature": self.temperature,
                "maxOutputTokens": max_tokens,
            }
        });

        let response = self
            .client
            .post(&url)
            .header("content-type", "application/json")
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| remote_error("gemini", e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(remote_error("gemini", format!("HTTP {}: {}", status, detail)));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| remote_error("gemini", e.to_string()))?;

        json["candidates"]
            .as_array()
            .and_then(|arr| arr.first())
            .and_then(|c| c["content"]["parts"].as_array())
            .and_then(|parts| parts.first())
            .and_then(|p| p["text"].as_str())
            .map(str::to_string)
            .ok_or_else(|| remote_error("gemini", "response contained no text candidate".to_string()))
    }
}

// ============ Anthropic ============

pub struct AnthropicClient {
    client: reqwest::Client,
    api_key: String,
    model: String,
    temperature: f32,
}

impl AnthropicClient {
    pub fn new(config: &LlmConfig) -> anyhow::Result<Self> {
        Ok(Self {
            client: http_client(config.timeout_secs)?,
            api_key: require_env_key("ANTHROPIC_API_KEY", "anthropic")?,
            model: config
                .model
                .clone()
                .unwrap_or_else(|| DEFAULT_ANTHROPIC_MODEL.to_string()),
            temperature: config.temperature,
        })
    }
}

#[async_trait]
impl LlmClient for AnthropicClient {
    fn provider_name(&self) -> &str {
        "anthropic"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &str, max_tokens: u32) -> Result<String, PipelineError> {
        let body = serde_json::json!({
            "model": self.model,
            "max_tokens": max_tokens,
            "temperature": self.temperature,
            "messages": [{ "role": "user", "content": prompt }],
        });

        let response = self
            .client
            .post("https://api.anthropic.com/v1/messages")
            .header("content-type", "application/json")
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| remote_error("anthropic", e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(remote_error("anthropic", format!("HTTP {}: {}", status, detail)));
        }

        let json: serde_json::Value = response
            .json()
            .await
            .map_err(|e| remote_error("anthropic", e.to_string()))?;

        json["content"]
            .as_array()
            .and_then(|blocks| blocks.first())
            .and_then(|block| block["text"].as_str())
            .map(str::to_string)
            .ok_or_else(|| remote_error("anthropic", "response contained no text block".to_string()))
    }
}

fn remote_error(provider: &str, detail: String) -> PipelineError {
    PipelineError::RemoteService {
        provider: provider.to_string(),
        detail,
    }
}

// ============ Mock ============

/// Scripted client for tests: returns queued responses in order and
/// records the prompts it was sent.
pub struct MockClient {
    responses: std::sync::Mutex<std::collections::VecDeque<String>>,
    prompts: std::sync::Mutex<Vec<String>>,
}

impl MockClient {
    pub fn new(responses: Vec<String>) -> Self {
        Self {
            responses: std::sync::Mutex::new(responses.into()),
            prompts: std::sync::Mutex::new(Vec::new()),
        }
    }

    /// Client that answers every call with the same text.
    pub fn always(response: &str) -> Self {
        Self::new(vec![response.to_string()])
    }

    pub fn sent_prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for MockClient {
    fn provider_name(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock"
    }

    async fn generate(&self, prompt: &str, _max_tokens: u32) -> Result<String, PipelineError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let mut queue = self.responses.lock().unwrap();
        match queue.len() {
            0 => Err(remote_error("mock", "no scripted response left".to_string())),
            1 => Ok(queue[0].clone()),
            _ => Ok(queue.pop_front().unwrap_or_default()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn mock_replays_responses_in_order() {
        let client = MockClient::new(vec!["one".to_string(), "two".to_string()]);
        assert_eq!(client.generate("p1", 100).await.unwrap(), "one");
        assert_eq!(client.generate("p2", 100).await.unwrap(), "two");
        // Last response repeats.
        assert_eq!(client.generate("p3", 100).await.unwrap(), "two");
        assert_eq!(client.sent_prompts(), vec!["p1", "p2", "p3"]);
    }

    #[tokio::test]
    async fn empty_mock_reports_remote_error() {
        let client = MockClient::new(vec![]);
        let err = client.generate("p", 100).await.unwrap_err();
        assert!(matches!(err, PipelineError::RemoteService { .. }));
    }

    #[test]
    fn unknown_provider_is_rejected() {
        let config = LlmConfig {
            provider: "openai".to_string(),
            ..Default::default()
        };
        assert!(create_client(&config).is_err());
    }
}
