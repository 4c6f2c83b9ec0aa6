//! BM25 retrieval over a local tantivy index

use crate::data::Chunk;
use crate::retrieval::{IndexMetadata, Retriever, SearchResult};
use anyhow::{Context, Result};
use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;
use tantivy::collector::TopDocs;
use tantivy::query::QueryParser;
use tantivy::schema::{Field, Schema, Value, STORED, STRING, TEXT};
use tantivy::{doc, Index, IndexWriter, ReloadPolicy, TantivyDocument};

const WRITER_HEAP_BYTES: usize = 50_000_000;

/// BM25 keyword retriever
///
/// Chunks are indexed into tantivy for scoring; the chunk payloads
/// themselves are kept in a JSON sidecar so the index directory is
/// self-contained and reloadable.
pub struct Bm25Retriever {
    index: Index,
    reader: tantivy::IndexReader,
    content_field: Field,
    chunk_id_field: Field,
    chunks: HashMap<String, Chunk>,
    metadata: IndexMetadata,
}

impl Bm25Retriever {
    fn schema() -> (Schema, Field, Field) {
        let mut builder = Schema::builder();
        let chunk_id_field = builder.add_text_field("chunk_id", STRING | STORED);
        let content_field = builder.add_text_field("content", TEXT | STORED);
        (builder.build(), chunk_id_field, content_field)
    }

    fn make_metadata(chunks: &HashMap<String, Chunk>) -> IndexMetadata {
        let documents: HashSet<&str> =
            chunks.values().map(|c| c.document_id.as_str()).collect();

        IndexMetadata {
            num_chunks: chunks.len(),
            num_documents: documents.len(),
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    fn from_parts(
        index: Index,
        chunk_id_field: Field,
        content_field: Field,
        chunks: HashMap<String, Chunk>,
        metadata: IndexMetadata,
    ) -> Result<Self> {
        let reader = index
            .reader_builder()
            .reload_policy(ReloadPolicy::OnCommitWithDelay)
            .try_into()?;

        Ok(Self {
            index,
            reader,
            content_field,
            chunk_id_field,
            chunks,
            metadata,
        })
    }

    fn index_chunks(index: &Index, chunks: &[Chunk], chunk_id_field: Field, content_field: Field) -> Result<()> {
        let mut writer: IndexWriter = index.writer(WRITER_HEAP_BYTES)?;

        for chunk in chunks {
            writer.add_document(doc!(
                chunk_id_field => chunk.id.clone(),
                content_field => chunk.content.clone(),
            ))?;
        }

        writer.commit()?;
        Ok(())
    }

    /// Build an index over `chunks` in `index_dir`, persisting chunk payloads
    /// and metadata beside it
    pub fn build(chunks: Vec<Chunk>, index_dir: &Path) -> Result<Self> {
        if chunks.is_empty() {
            anyhow::bail!("cannot build an index from zero chunks");
        }

        tracing::info!("Building BM25 index over {} chunks", chunks.len());

        let (schema, chunk_id_field, content_field) = Self::schema();

        let tantivy_dir = index_dir.join("tantivy");
        fs::create_dir_all(&tantivy_dir)
            .with_context(|| format!("failed to create index directory: {:?}", tantivy_dir))?;

        let index = Index::create_in_dir(&tantivy_dir, schema)?;
        Self::index_chunks(&index, &chunks, chunk_id_field, content_field)?;

        let chunks_map: HashMap<String, Chunk> =
            chunks.into_iter().map(|c| (c.id.clone(), c)).collect();
        let metadata = Self::make_metadata(&chunks_map);

        fs::write(
            index_dir.join("chunks.json"),
            serde_json::to_string_pretty(&chunks_map)?,
        )?;
        fs::write(
            index_dir.join("metadata.json"),
            serde_json::to_string_pretty(&metadata)?,
        )?;

        tracing::info!(
            "BM25 index ready: {} chunks from {} documents",
            metadata.num_chunks,
            metadata.num_documents
        );

        Self::from_parts(index, chunk_id_field, content_field, chunks_map, metadata)
    }

    /// Build a throwaway in-memory index, for tests and demos
    pub fn build_in_memory(chunks: Vec<Chunk>) -> Result<Self> {
        if chunks.is_empty() {
            anyhow::bail!("cannot build an index from zero chunks");
        }

        let (schema, chunk_id_field, content_field) = Self::schema();
        let index = Index::create_in_ram(schema);
        Self::index_chunks(&index, &chunks, chunk_id_field, content_field)?;

        let chunks_map: HashMap<String, Chunk> =
            chunks.into_iter().map(|c| (c.id.clone(), c)).collect();
        let metadata = Self::make_metadata(&chunks_map);

        Self::from_parts(index, chunk_id_field, content_field, chunks_map, metadata)
    }

    /// Load a previously built index from disk
    pub fn load(index_dir: &Path) -> Result<Self> {
        tracing::info!("Loading BM25 index from {:?}", index_dir);

        let metadata_json = fs::read_to_string(index_dir.join("metadata.json"))
            .with_context(|| format!("failed to read metadata.json in {:?}", index_dir))?;
        let metadata: IndexMetadata = serde_json::from_str(&metadata_json)?;

        let chunks_json = fs::read_to_string(index_dir.join("chunks.json"))
            .with_context(|| format!("failed to read chunks.json in {:?}", index_dir))?;
        let chunks: HashMap<String, Chunk> = serde_json::from_str(&chunks_json)?;

        let index = Index::open_in_dir(index_dir.join("tantivy"))
            .context("failed to open tantivy index")?;

        let schema = index.schema();
        let chunk_id_field = schema
            .get_field("chunk_id")
            .context("chunk_id field missing from index schema")?;
        let content_field = schema
            .get_field("content")
            .context("content field missing from index schema")?;

        tracing::info!("BM25 index loaded: {} chunks", chunks.len());

        Self::from_parts(index, chunk_id_field, content_field, chunks, metadata)
    }

    /// Index metadata
    pub fn metadata(&self) -> &IndexMetadata {
        &self.metadata
    }

    /// Number of indexed chunks
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    /// Whether the index holds no chunks
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }
}

impl Retriever for Bm25Retriever {
    fn retrieve(&self, query: &str, top_k: usize) -> Result<Vec<SearchResult>> {
        if top_k == 0 {
            return Ok(Vec::new());
        }

        let searcher = self.reader.searcher();

        let parser = QueryParser::for_index(&self.index, vec![self.content_field]);
        // User questions are free text; lenient parsing keeps punctuation
        // and stray operators from failing the query.
        let (query, _errors) = parser.parse_query_lenient(query);

        let top_docs = searcher.search(&query, &TopDocs::with_limit(top_k))?;

        let mut results = Vec::new();
        for (rank, (score, doc_address)) in top_docs.iter().enumerate() {
            let stored: TantivyDocument = searcher.doc(*doc_address)?;

            let chunk_id = stored
                .get_first(self.chunk_id_field)
                .and_then(|v| v.as_str());

            if let Some(chunk) = chunk_id.and_then(|id| self.chunks.get(id)) {
                results.push(SearchResult {
                    chunk_id: chunk.id.clone(),
                    chunk: chunk.clone(),
                    score: *score,
                    rank: rank + 1,
                });
            }
        }

        Ok(results)
    }

    fn name(&self) -> &str {
        "bm25"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DocumentMetadata;
    use tempfile::tempdir;

    fn make_chunk(id: &str, doc_id: &str, content: &str) -> Chunk {
        Chunk {
            id: id.to_string(),
            document_id: doc_id.to_string(),
            content: content.to_string(),
            chunk_index: 0,
            metadata: DocumentMetadata::default(),
        }
    }

    fn sample_chunks() -> Vec<Chunk> {
        vec![
            make_chunk("c1", "doc1", "Rust is a systems programming language"),
            make_chunk("c2", "doc1", "Python is popular for data science"),
            make_chunk("c3", "doc2", "Tokenizers split text into subword units"),
        ]
    }

    #[test]
    fn test_build_and_search() {
        let retriever = Bm25Retriever::build_in_memory(sample_chunks()).unwrap();

        let results = retriever.retrieve("programming language", 3).unwrap();

        assert!(!results.is_empty());
        assert_eq!(results[0].chunk_id, "c1");
        assert_eq!(results[0].rank, 1);
    }

    #[test]
    fn test_ranked_order_is_monotonic() {
        let retriever = Bm25Retriever::build_in_memory(sample_chunks()).unwrap();

        let results = retriever.retrieve("text programming", 3).unwrap();

        for pair in results.windows(2) {
            assert!(pair[0].score >= pair[1].score);
            assert!(pair[0].rank < pair[1].rank);
        }
    }

    #[test]
    fn test_punctuated_question_does_not_fail() {
        let retriever = Bm25Retriever::build_in_memory(sample_chunks()).unwrap();

        let results = retriever.retrieve("What is Rust?", 2).unwrap();
        assert!(!results.is_empty());
    }

    #[test]
    fn test_empty_chunks_rejected() {
        assert!(Bm25Retriever::build_in_memory(Vec::new()).is_err());
    }

    #[test]
    fn test_save_and_load_round_trip() {
        let dir = tempdir().unwrap();
        Bm25Retriever::build(sample_chunks(), dir.path()).unwrap();

        let loaded = Bm25Retriever::load(dir.path()).unwrap();

        assert_eq!(loaded.len(), 3);
        assert_eq!(loaded.metadata().num_documents, 2);

        let results = loaded.retrieve("subword tokenizers", 1).unwrap();
        assert_eq!(results[0].chunk_id, "c3");
    }
}
