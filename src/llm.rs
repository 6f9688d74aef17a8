//! Generation provider boundary: hosted (Anthropic) or local (Ollama).
//!
//! Consumed by callers building on top of search results, not by the core
//! retrieval path. The variant is selected by explicit configuration, never by
//! runtime probing. Both variants expose the same capability surface:
//! [`GenerationProvider::generate`] for a single prompt and
//! [`GenerationProvider::chat`] for a message sequence.

use serde::Deserialize;

use crate::config::LlmConfig;
use crate::error::{ArcaError, Result};
use crate::memory::types::ChatMessage;

const ANTHROPIC_API_URL: &str = "https://api.anthropic.com/v1/messages";
const ANTHROPIC_VERSION: &str = "2023-06-01";
const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-20250514";
const DEFAULT_OLLAMA_MODEL: &str = "llama3.3";

/// Sampling options recognized by both providers.
#[derive(Debug, Clone)]
pub struct GenerationOptions {
    /// Caps the response length.
    pub max_tokens: u32,
    /// Sampling randomness in `[0, 1]`.
    pub temperature: f32,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            max_tokens: 4096,
            temperature: 0.7,
        }
    }
}

/// A configured generation backend.
pub enum GenerationProvider {
    Anthropic(AnthropicProvider),
    Ollama(OllamaProvider),
}

impl GenerationProvider {
    /// Build a provider from config. Unsupported names are a configuration
    /// error; a hosted provider without its credential is an upstream error
    /// carrying the backend name.
    pub fn from_config(config: &LlmConfig) -> Result<Self> {
        match config.provider.as_str() {
            "anthropic" => {
                if config.api_key.is_empty() {
                    return Err(ArcaError::upstream(
                        "generate",
                        "anthropic",
                        "missing credential: set ANTHROPIC_API_KEY",
                    ));
                }
                let model = if config.model.is_empty() {
                    DEFAULT_ANTHROPIC_MODEL.to_string()
                } else {
                    config.model.clone()
                };
                Ok(Self::Anthropic(AnthropicProvider {
                    client: reqwest::Client::new(),
                    api_key: config.api_key.clone(),
                    model,
                }))
            }
            "ollama" => {
                let model = if config.model.is_empty() {
                    DEFAULT_OLLAMA_MODEL.to_string()
                } else {
                    config.model.clone()
                };
                Ok(Self::Ollama(OllamaProvider {
                    client: reqwest::Client::new(),
                    base_url: config.ollama_host.trim_end_matches('/').to_string(),
                    model,
                }))
            }
            other => Err(ArcaError::Config(format!(
                "unsupported LLM provider: {other}. Use 'anthropic' or 'ollama'"
            ))),
        }
    }

    /// Backend identifier for logging and error context.
    pub fn backend(&self) -> &'static str {
        match self {
            Self::Anthropic(_) => "anthropic",
            Self::Ollama(_) => "ollama",
        }
    }

    /// Complete a single prompt.
    pub async fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<String> {
        match self {
            Self::Anthropic(p) => p.generate(prompt, options).await,
            Self::Ollama(p) => p.generate(prompt, options).await,
        }
    }

    /// Complete a conversation.
    pub async fn chat(&self, messages: &[ChatMessage], options: &GenerationOptions) -> Result<String> {
        match self {
            Self::Anthropic(p) => p.chat(messages, options).await,
            Self::Ollama(p) => p.chat(messages, options).await,
        }
    }
}

/// Hosted provider backed by the Anthropic Messages API.
pub struct AnthropicProvider {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

#[derive(Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicContent>,
}

#[derive(Deserialize)]
struct AnthropicContent {
    #[serde(default)]
    text: String,
}

impl AnthropicProvider {
    async fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<String> {
        let messages = [ChatMessage {
            role: "user".into(),
            content: prompt.into(),
        }];
        self.chat(&messages, options).await
    }

    async fn chat(&self, messages: &[ChatMessage], options: &GenerationOptions) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "max_tokens": options.max_tokens,
            "temperature": options.temperature,
            "messages": messages,
        });

        let response = self
            .client
            .post(ANTHROPIC_API_URL)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&body)
            .send()
            .await
            .map_err(|e| ArcaError::upstream("chat", "anthropic", e))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(ArcaError::upstream(
                "chat",
                "anthropic",
                format!("HTTP {status}: {detail}"),
            ));
        }

        let parsed: AnthropicResponse = response
            .json()
            .await
            .map_err(|e| ArcaError::upstream("chat", "anthropic", e))?;
        parsed
            .content
            .into_iter()
            .next()
            .map(|c| c.text)
            .ok_or_else(|| ArcaError::upstream("chat", "anthropic", "empty response content"))
    }
}

/// Local provider backed by an Ollama server.
pub struct OllamaProvider {
    client: reqwest::Client,
    base_url: String,
    model: String,
}

#[derive(Deserialize)]
struct OllamaGenerateResponse {
    response: String,
}

#[derive(Deserialize)]
struct OllamaChatResponse {
    message: OllamaMessage,
}

#[derive(Deserialize)]
struct OllamaMessage {
    content: String,
}

impl OllamaProvider {
    async fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "prompt": prompt,
            "stream": false,
            "options": { "temperature": options.temperature },
        });

        let response = self
            .client
            .post(format!("{}/api/generate", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| ArcaError::upstream("generate", "ollama", e))?;

        if !response.status().is_success() {
            return Err(ArcaError::upstream(
                "generate",
                "ollama",
                format!("HTTP {}", response.status()),
            ));
        }

        let parsed: OllamaGenerateResponse = response
            .json()
            .await
            .map_err(|e| ArcaError::upstream("generate", "ollama", e))?;
        Ok(parsed.response)
    }

    async fn chat(&self, messages: &[ChatMessage], options: &GenerationOptions) -> Result<String> {
        let body = serde_json::json!({
            "model": self.model,
            "messages": messages,
            "stream": false,
            "options": { "temperature": options.temperature },
        });

        let response = self
            .client
            .post(format!("{}/api/chat", self.base_url))
            .json(&body)
            .send()
            .await
            .map_err(|e| ArcaError::upstream("chat", "ollama", e))?;

        if !response.status().is_success() {
            return Err(ArcaError::upstream(
                "chat",
                "ollama",
                format!("HTTP {}", response.status()),
            ));
        }

        let parsed: OllamaChatResponse = response
            .json()
            .await
            .map_err(|e| ArcaError::upstream("chat", "ollama", e))?;
        Ok(parsed.message.content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn llm_config(provider: &str) -> LlmConfig {
        LlmConfig {
            provider: provider.into(),
            model: String::new(),
            api_key: String::new(),
            ollama_host: "http://localhost:11434/".into(),
            max_tokens: 4096,
            temperature: 0.7,
        }
    }

    #[test]
    fn unsupported_provider_is_config_error() {
        let result = GenerationProvider::from_config(&llm_config("openai"));
        assert!(matches!(result, Err(ArcaError::Config(_))));
    }

    #[test]
    fn anthropic_without_credential_is_upstream_error() {
        let result = GenerationProvider::from_config(&llm_config("anthropic"));
        match result {
            Err(ArcaError::Upstream { backend, .. }) => assert_eq!(backend, "anthropic"),
            Err(other) => panic!("expected upstream error, got {other:?}"),
            Ok(_) => panic!("expected upstream error, got provider"),
        }
    }

    #[test]
    fn ollama_needs_no_credential_and_trims_host() {
        let provider = GenerationProvider::from_config(&llm_config("ollama")).unwrap();
        assert_eq!(provider.backend(), "ollama");
        match provider {
            GenerationProvider::Ollama(p) => {
                assert_eq!(p.base_url, "http://localhost:11434");
                assert_eq!(p.model, DEFAULT_OLLAMA_MODEL);
            }
            _ => unreachable!(),
        }
    }
}
