//! Question-answering response types

use serde::{Deserialize, Serialize};

/// Source reference returned with an answer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    /// Chunk identifier
    pub chunk_id: String,
    /// Parent document identifier
    pub document_id: String,
    /// Relevance score from retrieval
    pub score: f32,
    /// Short text snippet from the source
    pub snippet: String,
}

/// Result of answering one question
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QaResponse {
    /// The question as asked
    pub question: String,
    /// Generated answer
    pub answer: String,
    /// Source documents the answer drew on
    pub sources: Vec<Source>,
    /// Retrieved passage texts, in rank order
    pub context: Vec<String>,
    /// Number of passages handed to the prompt assembler
    pub num_docs_used: usize,
    /// Token count of the assembled prompt
    pub prompt_tokens: usize,
    /// Advisory conditions raised while assembling the prompt
    pub warnings: Vec<String>,
    /// Retrieval time in milliseconds
    pub retrieval_time_ms: u64,
    /// Generation time in milliseconds
    pub generation_time_ms: u64,
}

impl QaResponse {
    /// Total processing time in milliseconds
    pub fn total_time_ms(&self) -> u64 {
        self.retrieval_time_ms + self.generation_time_ms
    }
}

impl std::fmt::Display for QaResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Answer: {}", self.answer)?;

        if !self.sources.is_empty() {
            writeln!(f, "\nSources ({}):", self.sources.len())?;
            for (i, source) in self.sources.iter().enumerate() {
                writeln!(
                    f,
                    "  [{}] {} (score: {:.4})",
                    i + 1,
                    source.document_id,
                    source.score
                )?;
            }
        }

        for warning in &self.warnings {
            writeln!(f, "\nWarning: {}", warning)?;
        }

        writeln!(
            f,
            "\nTiming: retrieval={}ms, generation={}ms, total={}ms",
            self.retrieval_time_ms,
            self.generation_time_ms,
            self.total_time_ms()
        )?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_response_display() {
        let response = QaResponse {
            question: "What is Rust?".to_string(),
            answer: "A systems language.".to_string(),
            sources: vec![Source {
                chunk_id: "c1".to_string(),
                document_id: "doc1".to_string(),
                score: 0.95,
                snippet: "Rust is...".to_string(),
            }],
            context: vec!["Rust is a systems language.".to_string()],
            num_docs_used: 1,
            prompt_tokens: 42,
            warnings: vec!["context truncated".to_string()],
            retrieval_time_ms: 100,
            generation_time_ms: 500,
        };

        let display = response.to_string();
        assert!(display.contains("A systems language."));
        assert!(display.contains("doc1"));
        assert!(display.contains("Warning: context truncated"));
        assert!(display.contains("total=600ms"));
    }
}
