//! Tokenizer adapters
//!
//! A thin seam over concrete tokenizers so the prompt assembler can count,
//! truncate, and restore text without caring which vocabulary is behind it.
//! Backends: HuggingFace `tokenizers` files, tiktoken (cl100k), and a
//! dependency-free whitespace tokenizer used as the default and in tests.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::path::Path;
use std::sync::{Arc, Mutex};

/// Interface the prompt assembler needs from a tokenizer
///
/// Both operations are deterministic and side-effect free; `encode` followed
/// by `decode` restores the text up to the backend's round-trip artifacts
/// (whitespace normalization, byte-level merges).
pub trait TokenizerAdapter: Send + Sync {
    /// Convert text into a sequence of token ids
    fn encode(&self, text: &str) -> Result<Vec<u32>>;

    /// Convert a sequence of token ids back into text
    fn decode(&self, ids: &[u32]) -> Result<String>;

    /// Maximum context length this tokenizer's model accepts
    fn max_length(&self) -> usize;

    /// Backend name for logging
    fn name(&self) -> &str;

    /// Token count of `text`
    fn count(&self, text: &str) -> Result<usize> {
        Ok(self.encode(text)?.len())
    }
}

/// Tokenizer backed by a HuggingFace `tokenizer.json`
pub struct HfTokenizer {
    tokenizer: tokenizers::Tokenizer,
    max_length: usize,
    name: String,
}

impl HfTokenizer {
    /// Load from a local `tokenizer.json` file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let tokenizer = tokenizers::Tokenizer::from_file(path)
            .map_err(|e| anyhow::anyhow!("failed to load tokenizer from {:?}: {}", path, e))?;

        Ok(Self {
            tokenizer,
            max_length: 1024,
            name: path.to_string_lossy().to_string(),
        })
    }

    /// Fetch `tokenizer.json` for a model from the HuggingFace Hub
    pub fn from_pretrained(model_id: &str) -> Result<Self> {
        tracing::info!("Fetching tokenizer for {}", model_id);

        let api = hf_hub::api::sync::Api::new()
            .context("failed to initialize HuggingFace Hub API")?;
        let tokenizer_path = api
            .model(model_id.to_string())
            .get("tokenizer.json")
            .with_context(|| format!("failed to download tokenizer.json for {}", model_id))?;

        let mut adapter = Self::from_file(tokenizer_path)?;
        adapter.name = model_id.to_string();
        Ok(adapter)
    }

    /// Set the maximum context length
    pub fn with_max_length(mut self, max_length: usize) -> Self {
        self.max_length = max_length;
        self
    }
}

impl TokenizerAdapter for HfTokenizer {
    fn encode(&self, text: &str) -> Result<Vec<u32>> {
        // Special tokens stay out so that counting composes with
        // concatenation as closely as the vocabulary allows.
        let encoding = self
            .tokenizer
            .encode(text, false)
            .map_err(|e| anyhow::anyhow!("tokenization failed: {}", e))?;

        Ok(encoding.get_ids().to_vec())
    }

    fn decode(&self, ids: &[u32]) -> Result<String> {
        self.tokenizer
            .decode(ids, false)
            .map_err(|e| anyhow::anyhow!("token decoding failed: {}", e))
    }

    fn max_length(&self) -> usize {
        self.max_length
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Tokenizer backed by tiktoken's `cl100k_base` encoding
pub struct TiktokenAdapter {
    bpe: tiktoken_rs::CoreBPE,
    max_length: usize,
}

impl TiktokenAdapter {
    /// Create a cl100k adapter with the given context length
    pub fn new(max_length: usize) -> Result<Self> {
        let bpe = tiktoken_rs::cl100k_base().context("failed to load cl100k_base encoding")?;
        Ok(Self { bpe, max_length })
    }
}

impl TokenizerAdapter for TiktokenAdapter {
    fn encode(&self, text: &str) -> Result<Vec<u32>> {
        Ok(self
            .bpe
            .encode_ordinary(text)
            .into_iter()
            .map(|t| t as u32)
            .collect())
    }

    fn decode(&self, ids: &[u32]) -> Result<String> {
        let tokens = ids.iter().map(|&t| t as _).collect();
        self.bpe
            .decode(tokens)
            .map_err(|e| anyhow::anyhow!("token decoding failed: {}", e))
    }

    fn max_length(&self) -> usize {
        self.max_length
    }

    fn name(&self) -> &str {
        "cl100k_base"
    }
}

/// Whitespace tokenizer
///
/// One token per whitespace-separated word, with ids assigned on first
/// sight. Decoding joins words with single spaces, so round trips normalize
/// whitespace but never lose a word. Needs no model files, which makes it
/// the default backend and the workhorse of the test suite.
pub struct WhitespaceTokenizer {
    vocab: Mutex<WhitespaceVocab>,
    max_length: usize,
}

#[derive(Default)]
struct WhitespaceVocab {
    words: Vec<String>,
    ids: HashMap<String, u32>,
}

impl WhitespaceTokenizer {
    /// Create a whitespace tokenizer with the given context length
    pub fn new(max_length: usize) -> Self {
        Self {
            vocab: Mutex::new(WhitespaceVocab::default()),
            max_length,
        }
    }
}

impl TokenizerAdapter for WhitespaceTokenizer {
    fn encode(&self, text: &str) -> Result<Vec<u32>> {
        let mut vocab = self.vocab.lock().expect("tokenizer vocab lock poisoned");
        let WhitespaceVocab { words, ids } = &mut *vocab;

        let encoded = text
            .split_whitespace()
            .map(|word| {
                *ids.entry(word.to_string()).or_insert_with(|| {
                    let id = words.len() as u32;
                    words.push(word.to_string());
                    id
                })
            })
            .collect();

        Ok(encoded)
    }

    fn decode(&self, ids: &[u32]) -> Result<String> {
        let vocab = self.vocab.lock().expect("tokenizer vocab lock poisoned");

        let words: Result<Vec<&str>> = ids
            .iter()
            .map(|&id| {
                vocab
                    .words
                    .get(id as usize)
                    .map(String::as_str)
                    .ok_or_else(|| anyhow::anyhow!("unknown token id: {}", id))
            })
            .collect();

        Ok(words?.join(" "))
    }

    fn max_length(&self) -> usize {
        self.max_length
    }

    fn name(&self) -> &str {
        "whitespace"
    }
}

/// Create a tokenizer adapter by backend name
///
/// `model` is a HuggingFace model id or a path to a `tokenizer.json` for the
/// `hf` backend and is ignored by the others. Unknown backends fall back to
/// whitespace with a warning.
pub fn create_tokenizer(
    backend: &str,
    model: &str,
    max_length: usize,
) -> Result<Arc<dyn TokenizerAdapter>> {
    match backend {
        "whitespace" => Ok(Arc::new(WhitespaceTokenizer::new(max_length))),
        "tiktoken" => Ok(Arc::new(TiktokenAdapter::new(max_length)?)),
        "hf" | "huggingface" => {
            let path = Path::new(model);
            let tokenizer = if path.is_file() {
                HfTokenizer::from_file(path)?
            } else {
                HfTokenizer::from_pretrained(model)?
            };
            Ok(Arc::new(tokenizer.with_max_length(max_length)))
        }
        _ => {
            tracing::warn!("unknown tokenizer backend '{}', using whitespace", backend);
            Ok(Arc::new(WhitespaceTokenizer::new(max_length)))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_whitespace_encode_counts_words() {
        let tokenizer = WhitespaceTokenizer::new(1024);

        let ids = tokenizer.encode("one two three").unwrap();
        assert_eq!(ids.len(), 3);

        // Repeated words reuse ids.
        let ids = tokenizer.encode("one one two").unwrap();
        assert_eq!(ids[0], ids[1]);
        assert_ne!(ids[0], ids[2]);
    }

    #[test]
    fn test_whitespace_round_trip_normalizes_whitespace() {
        let tokenizer = WhitespaceTokenizer::new(1024);

        let ids = tokenizer.encode("alpha\n\nbeta  gamma").unwrap();
        let text = tokenizer.decode(&ids).unwrap();

        assert_eq!(text, "alpha beta gamma");
    }

    #[test]
    fn test_whitespace_truncated_decode_keeps_prefix() {
        let tokenizer = WhitespaceTokenizer::new(1024);

        let ids = tokenizer.encode("a b c d e").unwrap();
        let text = tokenizer.decode(&ids[..3]).unwrap();

        assert_eq!(text, "a b c");
    }

    #[test]
    fn test_whitespace_rejects_unknown_id() {
        let tokenizer = WhitespaceTokenizer::new(1024);
        tokenizer.encode("just a few words").unwrap();

        assert!(tokenizer.decode(&[999]).is_err());
    }

    #[test]
    fn test_tiktoken_round_trip() {
        let tokenizer = TiktokenAdapter::new(1024).unwrap();

        let ids = tokenizer.encode("Hello, world!").unwrap();
        assert!(!ids.is_empty());

        let text = tokenizer.decode(&ids).unwrap();
        assert_eq!(text, "Hello, world!");
    }

    #[test]
    fn test_create_tokenizer_falls_back() {
        let tokenizer = create_tokenizer("nonexistent", "", 512).unwrap();

        assert_eq!(tokenizer.name(), "whitespace");
        assert_eq!(tokenizer.max_length(), 512);
    }
}
