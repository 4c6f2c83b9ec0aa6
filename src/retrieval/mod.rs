//! Passage retrieval
//!
//! Defines the retriever seam the QA pipeline consumes, plus a local BM25
//! implementation so the tool works end to end without a hosted vector
//! service.

use crate::data::Chunk;
use anyhow::Result;
use serde::{Deserialize, Serialize};

pub mod sparse;

// Re-exports
pub use sparse::Bm25Retriever;

/// A retrieved chunk with its relevance score
///
/// Results arrive ranked best-first; downstream consumers (the prompt
/// assembler in particular) rely on that order when context has to be cut.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    /// Chunk ID
    pub chunk_id: String,
    /// The retrieved chunk
    pub chunk: Chunk,
    /// Relevance score (higher is better)
    pub score: f32,
    /// Rank in the result list (1-indexed)
    pub rank: usize,
}

/// Metadata persisted alongside a built index
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexMetadata {
    /// Number of chunks indexed
    pub num_chunks: usize,
    /// Number of distinct source documents
    pub num_documents: usize,
    /// Index creation timestamp
    pub created_at: String,
}

/// Trait for retrieval engines
pub trait Retriever: Send + Sync {
    /// Retrieve the top-k most relevant chunks for a query
    fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<SearchResult>>;

    /// Name of this retriever, for logging
    fn name(&self) -> &str;
}
