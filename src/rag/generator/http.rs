//! OpenAI-compatible completion client
//!
//! Talks to any server exposing a `/v1/completions` endpoint (llama.cpp,
//! vLLM, TGI, Ollama, hosted APIs), which covers the vast majority of ways
//! to run the answer model.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use super::{Generator, SamplingParams};

/// Configuration for [`HttpGenerator`]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpGeneratorConfig {
    /// Server base URL, e.g. `http://localhost:8080`
    pub base_url: String,
    /// Model identifier passed through to the server
    pub model: String,
    /// Optional bearer token
    pub api_key: Option<String>,
    /// Context window of the target model, in tokens
    pub max_context_length: usize,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for HttpGeneratorConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8080".to_string(),
            model: "mistralai/Mistral-7B-Instruct-v0.2".to_string(),
            api_key: None,
            max_context_length: 1024,
            timeout_secs: 120,
        }
    }
}

/// Generator backed by an OpenAI-compatible completions endpoint
pub struct HttpGenerator {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
    max_context_length: usize,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    temperature: f32,
    top_p: f32,
    max_tokens: usize,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    stop: Vec<String>,
}

#[derive(Deserialize)]
struct CompletionResponse {
    choices: Vec<CompletionChoice>,
}

#[derive(Deserialize)]
struct CompletionChoice {
    text: String,
}

impl HttpGenerator {
    /// Create a generator from configuration
    pub fn new(config: HttpGeneratorConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            model: config.model,
            api_key: config.api_key,
            max_context_length: config.max_context_length,
        })
    }
}

#[async_trait]
impl Generator for HttpGenerator {
    async fn generate(&self, prompt: &str, params: &SamplingParams) -> Result<String> {
        let url = format!("{}/v1/completions", self.base_url);

        let body = CompletionRequest {
            model: &self.model,
            prompt,
            temperature: params.temperature,
            top_p: params.top_p,
            max_tokens: params.max_new_tokens,
            stop: params.stop.clone(),
        };

        tracing::debug!(model = %self.model, url = %url, "sending completion request");

        let mut request = self.client.post(&url).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request
            .send()
            .await
            .with_context(|| format!("completion request to {} failed", url))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            anyhow::bail!("completion server returned HTTP {}: {}", status, detail);
        }

        let completion: CompletionResponse = response
            .json()
            .await
            .context("failed to parse completion response")?;

        let text = completion
            .choices
            .into_iter()
            .next()
            .map(|c| c.text)
            .ok_or_else(|| anyhow::anyhow!("completion response contained no choices"))?;

        Ok(text.trim().to_string())
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn max_context_length(&self) -> usize {
        self.max_context_length
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_is_normalized() {
        let generator = HttpGenerator::new(HttpGeneratorConfig {
            base_url: "http://localhost:8080/".to_string(),
            ..Default::default()
        })
        .unwrap();

        assert_eq!(generator.base_url, "http://localhost:8080");
        assert_eq!(generator.max_context_length(), 1024);
    }

    #[test]
    fn test_request_serialization_skips_empty_stop() {
        let request = CompletionRequest {
            model: "m",
            prompt: "p",
            temperature: 0.7,
            top_p: 0.95,
            max_tokens: 64,
            stop: Vec::new(),
        };

        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("stop").is_none());
        assert_eq!(json["max_tokens"], 64);
    }
}
