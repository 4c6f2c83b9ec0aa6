//! Application configuration
//!
//! All knobs load from `DOCQA_*` environment variables (a `.env` file is
//! honored) with sensible defaults, so the tool runs out of the box against
//! a local completion server.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Runtime configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Base URL of the completion server
    pub generator_url: String,
    /// Model identifier passed to the completion server
    pub generator_model: String,
    /// Optional API key for the completion server
    pub generator_api_key: Option<String>,
    /// Tokenizer backend: whitespace, tiktoken, or hf
    pub tokenizer_backend: String,
    /// Model id or tokenizer.json path for the hf backend
    pub tokenizer_model: String,
    /// Context window of the answer model, in tokens
    pub max_context_tokens: usize,
    /// Tokens reserved for the generated answer
    pub max_new_tokens: usize,
    /// Chunk size for ingestion, in characters
    pub chunk_size: usize,
    /// Chunk overlap for ingestion, in characters
    pub chunk_overlap: usize,
    /// Number of passages to retrieve per question
    pub top_k: usize,
    /// Scaffold template name
    pub template: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            generator_url: "http://localhost:8080".to_string(),
            generator_model: "mistralai/Mistral-7B-Instruct-v0.2".to_string(),
            generator_api_key: None,
            tokenizer_backend: "whitespace".to_string(),
            tokenizer_model: String::new(),
            max_context_tokens: 1024,
            max_new_tokens: 512,
            chunk_size: 1000,
            chunk_overlap: 200,
            top_k: 5,
            template: "default".to_string(),
        }
    }
}

fn env_or<T: FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match std::env::var(key) {
        Ok(value) => value
            .parse()
            .with_context(|| format!("invalid value for {}: {:?}", key, value)),
        Err(_) => Ok(default),
    }
}

impl Config {
    /// Load configuration from the environment, honoring a `.env` file
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let defaults = Self::default();
        let config = Self {
            generator_url: env_or("DOCQA_GENERATOR_URL", defaults.generator_url)?,
            generator_model: env_or("DOCQA_GENERATOR_MODEL", defaults.generator_model)?,
            generator_api_key: std::env::var("DOCQA_GENERATOR_API_KEY").ok(),
            tokenizer_backend: env_or("DOCQA_TOKENIZER_BACKEND", defaults.tokenizer_backend)?,
            tokenizer_model: env_or("DOCQA_TOKENIZER_MODEL", defaults.tokenizer_model)?,
            max_context_tokens: env_or("DOCQA_MAX_CONTEXT_TOKENS", defaults.max_context_tokens)?,
            max_new_tokens: env_or("DOCQA_MAX_NEW_TOKENS", defaults.max_new_tokens)?,
            chunk_size: env_or("DOCQA_CHUNK_SIZE", defaults.chunk_size)?,
            chunk_overlap: env_or("DOCQA_CHUNK_OVERLAP", defaults.chunk_overlap)?,
            top_k: env_or("DOCQA_TOP_K", defaults.top_k)?,
            template: env_or("DOCQA_TEMPLATE", defaults.template)?,
        };

        config.validate()?;
        Ok(config)
    }

    /// Reject structurally invalid configurations
    pub fn validate(&self) -> Result<()> {
        if self.max_context_tokens == 0 {
            anyhow::bail!("max_context_tokens must be positive");
        }
        if self.max_new_tokens >= self.max_context_tokens {
            anyhow::bail!(
                "max_new_tokens ({}) must be smaller than max_context_tokens ({})",
                self.max_new_tokens,
                self.max_context_tokens
            );
        }
        if self.chunk_size == 0 {
            anyhow::bail!("chunk_size must be positive");
        }
        if self.chunk_overlap >= self.chunk_size {
            anyhow::bail!(
                "chunk_overlap ({}) must be smaller than chunk_size ({})",
                self.chunk_overlap,
                self.chunk_size
            );
        }
        if self.top_k == 0 {
            anyhow::bail!("top_k must be positive");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = Config::default();

        assert!(config.validate().is_ok());
        assert_eq!(config.chunk_size, 1000);
        assert_eq!(config.chunk_overlap, 200);
        assert_eq!(config.max_context_tokens, 1024);
    }

    #[test]
    fn test_rejects_overlap_at_least_chunk_size() {
        let config = Config {
            chunk_overlap: 1000,
            ..Default::default()
        };

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_context_window() {
        let config = Config {
            max_context_tokens: 0,
            ..Default::default()
        };

        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_reservation_eating_whole_window() {
        let config = Config {
            max_context_tokens: 512,
            max_new_tokens: 512,
            ..Default::default()
        };

        assert!(config.validate().is_err());
    }
}
