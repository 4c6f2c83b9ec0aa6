//! Text generation seam
//!
//! The pipeline only needs a way to turn a finished prompt into an answer
//! and to know the model's context window; everything else about the
//! language model stays behind this trait.

pub mod http;

pub use http::{HttpGenerator, HttpGeneratorConfig};

use anyhow::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Trait for answer generators
#[async_trait]
pub trait Generator: Send + Sync {
    /// Generate a completion for the given prompt
    async fn generate(&self, prompt: &str, params: &SamplingParams) -> Result<String>;

    /// Model name or identifier
    fn model_name(&self) -> &str;

    /// Maximum context length of the model, in tokens
    ///
    /// The pipeline derives the prompt assembler's budget from this value.
    fn max_context_length(&self) -> usize;
}

/// Sampling parameters for generation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingParams {
    /// Temperature (higher = more random)
    pub temperature: f32,
    /// Nucleus sampling threshold
    pub top_p: f32,
    /// Maximum new tokens to generate
    pub max_new_tokens: usize,
    /// Stop sequences
    pub stop: Vec<String>,
}

impl Default for SamplingParams {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_p: 0.95,
            max_new_tokens: 512,
            stop: Vec::new(),
        }
    }
}

impl SamplingParams {
    /// Set temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set nucleus sampling threshold
    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.top_p = top_p;
        self
    }

    /// Set the generation length cap
    pub fn with_max_new_tokens(mut self, max_new_tokens: usize) -> Self {
        self.max_new_tokens = max_new_tokens;
        self
    }

    /// Set stop sequences
    pub fn with_stop(mut self, stop: Vec<String>) -> Self {
        self.stop = stop;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sampling_defaults() {
        let params = SamplingParams::default();

        assert_eq!(params.temperature, 0.7);
        assert_eq!(params.top_p, 0.95);
        assert_eq!(params.max_new_tokens, 512);
        assert!(params.stop.is_empty());
    }

    #[test]
    fn test_sampling_builder() {
        let params = SamplingParams::default()
            .with_temperature(0.2)
            .with_max_new_tokens(128)
            .with_stop(vec!["\n\n".to_string()]);

        assert_eq!(params.temperature, 0.2);
        assert_eq!(params.max_new_tokens, 128);
        assert_eq!(params.stop.len(), 1);
    }
}
