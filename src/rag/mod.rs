//! Retrieval-augmented question answering
//!
//! Ties the crate together for document Q&A:
//!
//! ```text
//! Question
//!     │
//!     ▼
//! ┌─────────────┐
//! │  Retriever  │  ← BM25 over the ingested corpus
//! └─────────────┘
//!     │ ranked passages
//!     ▼
//! ┌─────────────┐
//! │   Prompt    │  ← fits passages into the model's token budget
//! │  Assembler  │
//! └─────────────┘
//!     │ bounded prompt
//!     ▼
//! ┌─────────────┐
//! │  Generator  │  ← OpenAI-compatible completion endpoint
//! └─────────────┘
//!     │
//!     ▼
//! QaResponse (answer + sources + diagnostics)
//! ```
//!
//! # Example
//!
//! ```ignore
//! use docqa::rag::{QaConfig, QaPipelineBuilder};
//!
//! let pipeline = QaPipelineBuilder::new()
//!     .retriever(retriever)
//!     .tokenizer(tokenizer)
//!     .generator(generator)
//!     .config(QaConfig::default().with_top_k(5))
//!     .build()?;
//!
//! let response = pipeline.answer("What is a vector database?").await?;
//! println!("{}", response.answer);
//! ```

pub mod generator;
pub mod pipeline;
pub mod query;

// Re-exports for convenience
pub use generator::{Generator, HttpGenerator, HttpGeneratorConfig, SamplingParams};
pub use pipeline::{QaConfig, QaPipeline, QaPipelineBuilder};
pub use query::{QaResponse, Source};
