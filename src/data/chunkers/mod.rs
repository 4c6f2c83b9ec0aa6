//! Text chunking strategies
//!
//! Implements recursive character splitting (paragraph, then line, then word
//! boundaries) and sentence-based chunking.

use crate::data::{Chunk, Document};
use anyhow::Result;
use std::collections::VecDeque;
use unicode_segmentation::UnicodeSegmentation;

/// Trait for text chunking strategies
pub trait Chunker {
    /// Split a document into chunks
    fn chunk(&self, document: &Document) -> Result<Vec<Chunk>>;
}

/// Configuration for chunking
#[derive(Debug, Clone)]
pub struct ChunkConfig {
    /// Target size of each chunk, in characters
    pub chunk_size: usize,
    /// Overlap carried between consecutive chunks, in characters
    pub chunk_overlap: usize,
}

impl Default for ChunkConfig {
    fn default() -> Self {
        Self {
            chunk_size: 1000,
            chunk_overlap: 200,
        }
    }
}

/// Separator hierarchy for [`RecursiveChunker`]: paragraph break, line break,
/// word break, then raw characters.
const SEPARATORS: [&str; 4] = ["\n\n", "\n", " ", ""];

/// Recursive character chunker
///
/// Splits on the coarsest separator that appears in the text, recursing into
/// finer separators for pieces still longer than the chunk size, then packs
/// adjacent pieces back together up to `chunk_size` with `chunk_overlap`
/// characters carried over between consecutive chunks. Paragraphs survive
/// intact whenever they fit.
pub struct RecursiveChunker {
    config: ChunkConfig,
}

impl RecursiveChunker {
    /// Create a new recursive chunker with the given configuration
    pub fn new(config: ChunkConfig) -> Self {
        Self { config }
    }

    /// Create with default configuration
    pub fn default_config() -> Self {
        Self::new(ChunkConfig::default())
    }

    fn split_text(&self, text: &str, separators: &[&str]) -> Vec<String> {
        let chunk_size = self.config.chunk_size.max(1);

        // Coarsest separator actually present wins; "" is the terminal
        // character-level fallback.
        let (sep_idx, sep) = separators
            .iter()
            .enumerate()
            .find(|(_, s)| s.is_empty() || text.contains(**s))
            .map(|(i, s)| (i, *s))
            .unwrap_or((separators.len().saturating_sub(1), ""));
        let finer = &separators[(sep_idx + 1).min(separators.len())..];

        let pieces: Vec<String> = if sep.is_empty() {
            let chars: Vec<char> = text.chars().collect();
            chars
                .chunks(chunk_size)
                .map(|window| window.iter().collect())
                .collect()
        } else {
            text.split(sep).map(str::to_string).collect()
        };

        let mut chunks = Vec::new();
        let mut fitting: Vec<String> = Vec::new();

        for piece in pieces {
            if piece.chars().count() < chunk_size {
                fitting.push(piece);
            } else {
                if !fitting.is_empty() {
                    chunks.extend(self.merge_pieces(&fitting, sep));
                    fitting.clear();
                }
                if finer.is_empty() {
                    chunks.push(piece);
                } else {
                    chunks.extend(self.split_text(&piece, finer));
                }
            }
        }

        if !fitting.is_empty() {
            chunks.extend(self.merge_pieces(&fitting, sep));
        }

        chunks
    }

    /// Greedily pack pieces into chunks of at most `chunk_size` characters,
    /// retaining a trailing window of up to `chunk_overlap` characters as the
    /// start of the next chunk.
    fn merge_pieces(&self, pieces: &[String], sep: &str) -> Vec<String> {
        let chunk_size = self.config.chunk_size.max(1);
        let overlap = self.config.chunk_overlap.min(chunk_size.saturating_sub(1));
        let sep_len = sep.chars().count();

        let mut chunks: Vec<String> = Vec::new();
        let mut window: VecDeque<String> = VecDeque::new();
        let mut total = 0usize;

        for piece in pieces {
            let piece_len = piece.chars().count();
            let joined_len = total + piece_len + if window.is_empty() { 0 } else { sep_len };

            if joined_len > chunk_size && !window.is_empty() {
                let doc = Vec::from_iter(window.iter().cloned()).join(sep);
                let doc = doc.trim();
                if !doc.is_empty() {
                    chunks.push(doc.to_string());
                }

                // Shed leading pieces until only the overlap window remains
                // and the incoming piece fits.
                while total > overlap
                    || (total + piece_len + if window.is_empty() { 0 } else { sep_len }
                        > chunk_size
                        && total > 0)
                {
                    let removed = match window.pop_front() {
                        Some(p) => p,
                        None => break,
                    };
                    total -= removed.chars().count()
                        + if window.is_empty() { 0 } else { sep_len };
                }
            }

            total += piece_len + if window.is_empty() { 0 } else { sep_len };
            window.push_back(piece.clone());
        }

        let doc = Vec::from_iter(window.iter().cloned()).join(sep);
        let doc = doc.trim();
        if !doc.is_empty() {
            chunks.push(doc.to_string());
        }

        chunks
    }
}

impl Chunker for RecursiveChunker {
    fn chunk(&self, document: &Document) -> Result<Vec<Chunk>> {
        let chunks = self
            .split_text(&document.content, &SEPARATORS)
            .into_iter()
            .filter(|text| !text.trim().is_empty())
            .enumerate()
            .map(|(index, text)| Chunk::new(document, text, index))
            .collect();

        Ok(chunks)
    }
}

/// Sentence chunker
///
/// Accumulates whole sentences (Unicode sentence boundaries) until adding the
/// next one would exceed the chunk size. Sentences longer than the chunk size
/// become chunks of their own.
pub struct SentenceChunker {
    config: ChunkConfig,
}

impl SentenceChunker {
    /// Create a new sentence chunker with the given configuration
    pub fn new(config: ChunkConfig) -> Self {
        Self { config }
    }
}

impl Chunker for SentenceChunker {
    fn chunk(&self, document: &Document) -> Result<Vec<Chunk>> {
        let mut chunks = Vec::new();
        let mut current = String::new();
        let mut chunk_index = 0;

        for sentence in document.content.unicode_sentences() {
            if !current.is_empty()
                && current.chars().count() + sentence.chars().count() > self.config.chunk_size
            {
                chunks.push(Chunk::new(document, current.trim().to_string(), chunk_index));
                chunk_index += 1;
                current.clear();
            }
            current.push_str(sentence);
        }

        if !current.trim().is_empty() {
            chunks.push(Chunk::new(document, current.trim().to_string(), chunk_index));
        }

        Ok(chunks)
    }
}

/// Create a chunker by strategy name
pub fn create_chunker(strategy: &str, config: ChunkConfig) -> Box<dyn Chunker> {
    match strategy {
        "recursive" => Box::new(RecursiveChunker::new(config)),
        "sentence" => Box::new(SentenceChunker::new(config)),
        _ => {
            tracing::warn!("unknown chunking strategy '{}', using recursive", strategy);
            Box::new(RecursiveChunker::new(config))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::DocumentMetadata;

    fn make_document(content: &str) -> Document {
        Document {
            id: "test_doc".to_string(),
            source: "test.txt".to_string(),
            content: content.to_string(),
            metadata: DocumentMetadata {
                file_path: None,
                file_type: "txt".to_string(),
                size: Some(content.len()),
            },
        }
    }

    #[test]
    fn test_recursive_respects_chunk_size() {
        let words = vec!["word"; 200].join(" ");
        let doc = make_document(&words);

        let chunker = RecursiveChunker::new(ChunkConfig {
            chunk_size: 100,
            chunk_overlap: 20,
        });
        let chunks = chunker.chunk(&doc).unwrap();

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.content.chars().count() <= 100);
        }
    }

    #[test]
    fn test_recursive_prefers_paragraph_boundaries() {
        let doc = make_document("First paragraph here.\n\nSecond paragraph here.");

        let chunker = RecursiveChunker::new(ChunkConfig {
            chunk_size: 30,
            chunk_overlap: 0,
        });
        let chunks = chunker.chunk(&doc).unwrap();

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].content, "First paragraph here.");
        assert_eq!(chunks[1].content, "Second paragraph here.");
    }

    #[test]
    fn test_recursive_keeps_small_document_whole() {
        let doc = make_document("Tiny document.");

        let chunker = RecursiveChunker::default_config();
        let chunks = chunker.chunk(&doc).unwrap();

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].content, "Tiny document.");
        assert_eq!(chunks[0].document_id, "test_doc");
        assert_eq!(chunks[0].id, "test_doc_0");
    }

    #[test]
    fn test_recursive_applies_overlap() {
        let words: Vec<String> = (0..60).map(|i| format!("w{i:02}")).collect();
        let doc = make_document(&words.join(" "));

        let chunker = RecursiveChunker::new(ChunkConfig {
            chunk_size: 80,
            chunk_overlap: 20,
        });
        let chunks = chunker.chunk(&doc).unwrap();

        assert!(chunks.len() > 1);
        // The tail of each chunk reappears at the head of the next one.
        for pair in chunks.windows(2) {
            let last_word = pair[0].content.split_whitespace().last().unwrap();
            assert!(
                pair[1].content.split_whitespace().any(|w| w == last_word),
                "expected overlap between {:?} and {:?}",
                pair[0].content,
                pair[1].content
            );
        }
    }

    #[test]
    fn test_recursive_handles_oversized_unbroken_text() {
        let doc = make_document(&"x".repeat(250));

        let chunker = RecursiveChunker::new(ChunkConfig {
            chunk_size: 100,
            chunk_overlap: 0,
        });
        let chunks = chunker.chunk(&doc).unwrap();

        assert_eq!(chunks.len(), 3);
        assert!(chunks.iter().all(|c| c.content.chars().count() <= 100));
    }

    #[test]
    fn test_sentence_chunker() {
        let doc =
            make_document("First sentence. Second sentence. Third sentence. Fourth sentence.");

        let chunker = SentenceChunker::new(ChunkConfig {
            chunk_size: 35,
            chunk_overlap: 0,
        });
        let chunks = chunker.chunk(&doc).unwrap();

        assert!(chunks.len() > 1);
        for chunk in &chunks {
            assert!(chunk.content.contains('.'));
        }
    }

    #[test]
    fn test_create_chunker_falls_back() {
        let doc = make_document("Some text to split.");
        let chunker = create_chunker("nonexistent", ChunkConfig::default());

        let chunks = chunker.chunk(&doc).unwrap();
        assert_eq!(chunks.len(), 1);
    }
}
