//! QA pipeline orchestration
//!
//! Wires retriever, prompt assembler, and generator together: retrieve top-k
//! passages, assemble a budget-bounded prompt, generate, and package the
//! answer with its sources and diagnostics.

use anyhow::{Context, Result};
use std::sync::Arc;
use std::time::Instant;

use crate::prompt::PromptAssembler;
use crate::retrieval::Retriever;
use crate::tokenizer::TokenizerAdapter;

use super::generator::{Generator, SamplingParams};
use super::query::{QaResponse, Source};

/// Answer returned when retrieval comes back empty
const NO_DOCUMENTS_ANSWER: &str = "No relevant documents found to answer your question.";

/// Configuration for the QA pipeline
#[derive(Debug, Clone)]
pub struct QaConfig {
    /// Number of passages to retrieve
    pub top_k: usize,
    /// Scaffold template name
    pub template: String,
    /// Sampling parameters for generation
    pub sampling: SamplingParams,
}

impl Default for QaConfig {
    fn default() -> Self {
        Self {
            top_k: 5,
            template: "default".to_string(),
            sampling: SamplingParams::default(),
        }
    }
}

impl QaConfig {
    /// Set the number of passages to retrieve
    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    /// Set the scaffold template
    pub fn with_template(mut self, template: &str) -> Self {
        self.template = template.to_string();
        self
    }

    /// Set sampling parameters
    pub fn with_sampling(mut self, sampling: SamplingParams) -> Self {
        self.sampling = sampling;
        self
    }

    /// Prompt token budget for a model with the given context window
    ///
    /// The generation reservation (`max_new_tokens`) is carved out of the
    /// window so prompt plus completion fit the model.
    pub fn prompt_budget(&self, max_context_length: usize) -> usize {
        max_context_length.saturating_sub(self.sampling.max_new_tokens)
    }
}

/// Retrieval-augmented question answering pipeline
///
/// All collaborators are injected, so any of them can be swapped for a test
/// double.
pub struct QaPipeline {
    retriever: Arc<dyn Retriever>,
    generator: Box<dyn Generator>,
    assembler: PromptAssembler,
    config: QaConfig,
}

impl QaPipeline {
    /// Answer a question over the indexed corpus
    pub async fn answer(&self, question: &str) -> Result<QaResponse> {
        let question = question.trim();
        if question.is_empty() {
            anyhow::bail!("question is empty");
        }

        let retrieval_start = Instant::now();
        let results = self
            .retriever
            .retrieve(question, self.config.top_k)
            .context("retrieval failed")?;
        let retrieval_time_ms = retrieval_start.elapsed().as_millis() as u64;

        tracing::info!(
            "Retrieved {} passages in {}ms via {}",
            results.len(),
            retrieval_time_ms,
            self.retriever.name()
        );

        if results.is_empty() {
            return Ok(QaResponse {
                question: question.to_string(),
                answer: NO_DOCUMENTS_ANSWER.to_string(),
                sources: Vec::new(),
                context: Vec::new(),
                num_docs_used: 0,
                prompt_tokens: 0,
                warnings: Vec::new(),
                retrieval_time_ms,
                generation_time_ms: 0,
            });
        }

        let passages: Vec<String> = results
            .iter()
            .map(|r| r.chunk.content.trim().to_string())
            .collect();

        let budget = self.config.prompt_budget(self.generator.max_context_length());
        let assembled = self.assembler.assemble(question, &passages, budget)?;

        for signal in &assembled.signals {
            tracing::warn!("{}", signal);
        }

        let generation_start = Instant::now();
        let answer = self
            .generator
            .generate(&assembled.text, &self.config.sampling)
            .await
            .context("generation failed")?;
        let generation_time_ms = generation_start.elapsed().as_millis() as u64;

        let sources = results
            .iter()
            .map(|r| Source {
                chunk_id: r.chunk_id.clone(),
                document_id: r.chunk.document_id.clone(),
                score: r.score,
                snippet: truncate_snippet(&r.chunk.content, 200),
            })
            .collect();

        Ok(QaResponse {
            question: question.to_string(),
            answer,
            sources,
            num_docs_used: passages.len(),
            context: passages,
            prompt_tokens: assembled.prompt_tokens,
            warnings: assembled.signals.iter().map(ToString::to_string).collect(),
            retrieval_time_ms,
            generation_time_ms,
        })
    }

    /// The pipeline configuration
    pub fn config(&self) -> &QaConfig {
        &self.config
    }

    /// The generator in use
    pub fn generator(&self) -> &dyn Generator {
        self.generator.as_ref()
    }

    /// The retriever in use
    pub fn retriever(&self) -> &dyn Retriever {
        self.retriever.as_ref()
    }
}

/// Builder for [`QaPipeline`]
pub struct QaPipelineBuilder {
    retriever: Option<Arc<dyn Retriever>>,
    tokenizer: Option<Arc<dyn TokenizerAdapter>>,
    generator: Option<Box<dyn Generator>>,
    config: QaConfig,
}

impl QaPipelineBuilder {
    /// Create a new builder
    pub fn new() -> Self {
        Self {
            retriever: None,
            tokenizer: None,
            generator: None,
            config: QaConfig::default(),
        }
    }

    /// Set the retriever
    pub fn retriever(mut self, retriever: Arc<dyn Retriever>) -> Self {
        self.retriever = Some(retriever);
        self
    }

    /// Set the tokenizer the prompt assembler will count with
    pub fn tokenizer(mut self, tokenizer: Arc<dyn TokenizerAdapter>) -> Self {
        self.tokenizer = Some(tokenizer);
        self
    }

    /// Set the generator
    pub fn generator(mut self, generator: Box<dyn Generator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Set the configuration
    pub fn config(mut self, config: QaConfig) -> Self {
        self.config = config;
        self
    }

    /// Build the pipeline
    pub fn build(self) -> Result<QaPipeline> {
        let retriever = self
            .retriever
            .context("a retriever is required to build the QA pipeline")?;
        let tokenizer = self
            .tokenizer
            .context("a tokenizer is required to build the QA pipeline")?;
        let generator = self
            .generator
            .context("a generator is required to build the QA pipeline")?;

        let assembler = PromptAssembler::new(tokenizer).with_template(&self.config.template);

        Ok(QaPipeline {
            retriever,
            generator,
            assembler,
            config: self.config,
        })
    }
}

impl Default for QaPipelineBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// Truncate a snippet to `max_len` bytes, backing up to a word boundary
fn truncate_snippet(text: &str, max_len: usize) -> String {
    if text.len() <= max_len {
        return text.to_string();
    }

    let mut cut = max_len;
    while cut > 0 && !text.is_char_boundary(cut) {
        cut -= 1;
    }

    let truncated = &text[..cut];
    match truncated.rfind(' ') {
        Some(last_space) => format!("{}...", &truncated[..last_space]),
        None => format!("{}...", truncated),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::{Chunk, DocumentMetadata};
    use crate::retrieval::SearchResult;
    use crate::tokenizer::WhitespaceTokenizer;
    use async_trait::async_trait;

    struct StaticRetriever {
        passages: Vec<&'static str>,
    }

    impl Retriever for StaticRetriever {
        fn retrieve(&self, _query: &str, top_k: usize) -> Result<Vec<SearchResult>> {
            Ok(self
                .passages
                .iter()
                .take(top_k)
                .enumerate()
                .map(|(i, content)| SearchResult {
                    chunk_id: format!("c{}", i),
                    chunk: Chunk {
                        id: format!("c{}", i),
                        document_id: format!("doc{}", i),
                        content: content.to_string(),
                        chunk_index: 0,
                        metadata: DocumentMetadata::default(),
                    },
                    score: 1.0 - i as f32 * 0.1,
                    rank: i + 1,
                })
                .collect())
        }

        fn name(&self) -> &str {
            "static"
        }
    }

    struct CannedGenerator {
        reply: &'static str,
        max_context_length: usize,
    }

    #[async_trait]
    impl Generator for CannedGenerator {
        async fn generate(&self, prompt: &str, _params: &SamplingParams) -> Result<String> {
            assert!(prompt.contains("Question:"));
            Ok(self.reply.to_string())
        }

        fn model_name(&self) -> &str {
            "canned"
        }

        fn max_context_length(&self) -> usize {
            self.max_context_length
        }
    }

    fn pipeline(passages: Vec<&'static str>, max_context_length: usize) -> QaPipeline {
        QaPipelineBuilder::new()
            .retriever(Arc::new(StaticRetriever { passages }))
            .tokenizer(Arc::new(WhitespaceTokenizer::new(max_context_length)))
            .generator(Box::new(CannedGenerator {
                reply: "A canned answer.",
                max_context_length,
            }))
            .config(QaConfig::default().with_top_k(3))
            .build()
            .unwrap()
    }

    #[tokio::test]
    async fn test_answer_packages_sources_and_context() {
        let pipeline = pipeline(
            vec!["Rust is a systems language.", "Crabs are crustaceans."],
            2048,
        );

        let response = pipeline.answer("What is Rust?").await.unwrap();

        assert_eq!(response.answer, "A canned answer.");
        assert_eq!(response.num_docs_used, 2);
        assert_eq!(response.sources.len(), 2);
        assert_eq!(response.sources[0].document_id, "doc0");
        assert_eq!(response.context[0], "Rust is a systems language.");
        assert!(response.warnings.is_empty());
        assert!(response.prompt_tokens > 0);
    }

    #[tokio::test]
    async fn test_empty_retrieval_short_circuits() {
        let pipeline = pipeline(Vec::new(), 2048);

        let response = pipeline.answer("Anything?").await.unwrap();

        assert_eq!(response.answer, NO_DOCUMENTS_ANSWER);
        assert_eq!(response.num_docs_used, 0);
        assert_eq!(response.generation_time_ms, 0);
        assert_eq!(response.prompt_tokens, 0);
    }

    #[tokio::test]
    async fn test_truncation_surfaces_as_warning() {
        // Window of 600 minus the 512-token generation reservation leaves an
        // 88-token prompt budget, far less than the retrieved context.
        let long_passage: &'static str =
            Box::leak(vec!["word"; 500].join(" ").into_boxed_str());
        let pipeline = pipeline(vec![long_passage], 600);

        let response = pipeline.answer("What now?").await.unwrap();

        assert_eq!(response.answer, "A canned answer.");
        assert_eq!(response.warnings.len(), 1);
        assert!(response.warnings[0].contains("truncated"));
        assert!(response.prompt_tokens <= 88);
    }

    #[tokio::test]
    async fn test_empty_question_fails() {
        let pipeline = pipeline(vec!["Some passage."], 2048);

        assert!(pipeline.answer("   ").await.is_err());
    }

    #[test]
    fn test_prompt_budget_reserves_generation_room() {
        let config = QaConfig::default();

        assert_eq!(config.prompt_budget(1024), 512);
        assert_eq!(config.prompt_budget(100), 0);
    }

    #[test]
    fn test_truncate_snippet() {
        let text = "This is a long piece of text that needs to be truncated";
        let snippet = truncate_snippet(text, 20);

        assert!(snippet.len() <= 23);
        assert!(snippet.ends_with("..."));

        assert_eq!(truncate_snippet("Short", 20), "Short");
    }

    #[test]
    fn test_builder_requires_collaborators() {
        assert!(QaPipelineBuilder::new().build().is_err());
    }
}
