//! Document ingestion and chunking
//!
//! Loads documents from local sources (plain text, Markdown, optionally PDF)
//! and splits them into passage-sized chunks for indexing and retrieval.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub mod chunkers;
pub mod loaders;

// Re-exports for convenience
pub use chunkers::*;
pub use loaders::*;

/// A loaded source document
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique identifier for the document
    pub id: String,
    /// Source path or label the document came from
    pub source: String,
    /// Full text content
    pub content: String,
    /// Metadata associated with the document
    pub metadata: DocumentMetadata,
}

/// Metadata carried alongside a document and its chunks
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DocumentMetadata {
    /// File path, when loaded from disk
    pub file_path: Option<PathBuf>,
    /// File type (txt, md, pdf, sample, ...)
    pub file_type: String,
    /// File size in bytes, when known
    pub size: Option<usize>,
}

/// A chunk of text carved out of a document
///
/// Chunks are the unit of indexing and retrieval; the retriever hands them
/// back ranked by relevance and the prompt assembler consumes their content
/// in that order.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Unique identifier for the chunk
    pub id: String,
    /// Parent document identifier
    pub document_id: String,
    /// The chunk text
    pub content: String,
    /// Position of this chunk within its document
    pub chunk_index: usize,
    /// Metadata inherited from the parent document
    pub metadata: DocumentMetadata,
}

impl Document {
    /// Create a new document
    pub fn new(id: String, source: String, content: String, metadata: DocumentMetadata) -> Self {
        Self {
            id,
            source,
            content,
            metadata,
        }
    }
}

impl Chunk {
    /// Create a new chunk belonging to `document`
    pub fn new(document: &Document, content: String, chunk_index: usize) -> Self {
        Self {
            id: format!("{}_{}", document.id, chunk_index),
            document_id: document.id.clone(),
            content,
            chunk_index,
            metadata: document.metadata.clone(),
        }
    }
}
