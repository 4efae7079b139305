//! LLM provider abstraction and the concrete HTTP-backed providers.
//!
//! The provider boundary takes a system prompt and a user prompt and returns
//! generated text or fails. Unlike the Garmin boundary it is deliberately not
//! wrapped with the retry policy; a failed analysis aborts the run with a
//! clear reason instead.

use async_trait::async_trait;
use color_eyre::{eyre::eyre, Result};
use serde_json::{json, Value};

use crate::config::{Config, LlmConfig, ProviderKind};

#[async_trait]
pub trait LlmProvider: Send + Sync {
  /// Generate text for the given prompts.
  async fn generate(&self, system: &str, user: &str) -> Result<String>;

  fn model_name(&self) -> &str;
}

/// Build the provider selected by the configuration. The API key is read from
/// the provider's environment variable.
pub fn provider_from_config(config: &LlmConfig) -> Result<Box<dyn LlmProvider>> {
  let api_key = Config::api_key(config.provider)?;
  let model = config.model_name().to_string();

  let http = reqwest::Client::builder()
    .timeout(std::time::Duration::from_secs(120))
    .build()
    .map_err(|e| eyre!("Failed to build HTTP client: {}", e))?;

  Ok(match config.provider {
    ProviderKind::Anthropic => Box::new(AnthropicProvider {
      http,
      api_key,
      model,
      max_tokens: config.max_tokens,
      temperature: config.temperature,
    }),
    ProviderKind::Openai => Box::new(OpenAiProvider {
      http,
      api_key,
      model,
      max_tokens: config.max_tokens,
      temperature: config.temperature,
    }),
    ProviderKind::Google => Box::new(GoogleProvider {
      http,
      api_key,
      model,
      max_tokens: config.max_tokens,
      temperature: config.temperature,
    }),
  })
}

pub struct AnthropicProvider {
  http: reqwest::Client,
  api_key: String,
  model: String,
  max_tokens: u32,
  temperature: f64,
}

#[async_trait]
impl LlmProvider for AnthropicProvider {
  async fn generate(&self, system: &str, user: &str) -> Result<String> {
    let body = json!({
      "model": self.model,
      "max_tokens": self.max_tokens,
      "temperature": self.temperature,
      "system": system,
      "messages": [{"role": "user", "content": user}],
    });

    let response: Value = self
      .http
      .post("https://api.anthropic.com/v1/messages")
      .header("x-api-key", &self.api_key)
      .header("anthropic-version", "2023-06-01")
      .json(&body)
      .send()
      .await
      .map_err(|e| eyre!("Anthropic request failed: {}", e))?
      .error_for_status()
      .map_err(|e| eyre!("Anthropic request failed: {}", e))?
      .json()
      .await
      .map_err(|e| eyre!("Failed to parse Anthropic response: {}", e))?;

    response
      .pointer("/content/0/text")
      .and_then(Value::as_str)
      .map(String::from)
      .ok_or_else(|| eyre!("Unexpected Anthropic response shape"))
  }

  fn model_name(&self) -> &str {
    &self.model
  }
}

pub struct OpenAiProvider {
  http: reqwest::Client,
  api_key: String,
  model: String,
  max_tokens: u32,
  temperature: f64,
}

#[async_trait]
impl LlmProvider for OpenAiProvider {
  async fn generate(&self, system: &str, user: &str) -> Result<String> {
    let body = json!({
      "model": self.model,
      "max_tokens": self.max_tokens,
      "temperature": self.temperature,
      "messages": [
        {"role": "system", "content": system},
        {"role": "user", "content": user},
      ],
    });

    let response: Value = self
      .http
      .post("https://api.openai.com/v1/chat/completions")
      .bearer_auth(&self.api_key)
      .json(&body)
      .send()
      .await
      .map_err(|e| eyre!("OpenAI request failed: {}", e))?
      .error_for_status()
      .map_err(|e| eyre!("OpenAI request failed: {}", e))?
      .json()
      .await
      .map_err(|e| eyre!("Failed to parse OpenAI response: {}", e))?;

    response
      .pointer("/choices/0/message/content")
      .and_then(Value::as_str)
      .map(String::from)
      .ok_or_else(|| eyre!("Unexpected OpenAI response shape"))
  }

  fn model_name(&self) -> &str {
    &self.model
  }
}

pub struct GoogleProvider {
  http: reqwest::Client,
  api_key: String,
  model: String,
  max_tokens: u32,
  temperature: f64,
}

#[async_trait]
impl LlmProvider for GoogleProvider {
  async fn generate(&self, system: &str, user: &str) -> Result<String> {
    let body = json!({
      "systemInstruction": {"parts": [{"text": system}]},
      "contents": [{"role": "user", "parts": [{"text": user}]}],
      "generationConfig": {
        "maxOutputTokens": self.max_tokens,
        "temperature": self.temperature,
      },
    });

    let url = format!(
      "https://generativelanguage.googleapis.com/v1beta/models/{}:generateContent?key={}",
      self.model, self.api_key
    );

    let response: Value = self
      .http
      .post(url)
      .json(&body)
      .send()
      .await
      .map_err(|e| eyre!("Google request failed: {}", e))?
      .error_for_status()
      .map_err(|e| eyre!("Google request failed: {}", e))?
      .json()
      .await
      .map_err(|e| eyre!("Failed to parse Google response: {}", e))?;

    response
      .pointer("/candidates/0/content/parts/0/text")
      .and_then(Value::as_str)
      .map(String::from)
      .ok_or_else(|| eyre!("Unexpected Google response shape"))
  }

  fn model_name(&self) -> &str {
    &self.model
  }
}
