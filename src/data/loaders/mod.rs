//! Document loaders for local file formats
//!
//! Plain text and Markdown are always supported; PDF extraction is available
//! behind the `pdf` feature.

use crate::data::{Document, DocumentMetadata};
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;

/// Trait for loading a document from a path
pub trait DocumentLoader {
    /// Load a document from the given path
    fn load(&self, path: &Path) -> Result<Document>;

    /// Whether this loader handles the given file
    fn can_load(&self, path: &Path) -> bool;
}

fn load_plain(path: &Path, file_type: &str) -> Result<Document> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read {} file: {:?}", file_type, path))?;

    let size = fs::metadata(path).map(|m| m.len() as usize).ok();

    let metadata = DocumentMetadata {
        file_path: Some(path.to_path_buf()),
        file_type: file_type.to_string(),
        size,
    };

    Ok(Document::new(
        document_id(path),
        path.to_string_lossy().to_string(),
        content,
        metadata,
    ))
}

/// Plain-text loader (.txt)
pub struct TextLoader;

impl DocumentLoader for TextLoader {
    fn load(&self, path: &Path) -> Result<Document> {
        load_plain(path, "txt")
    }

    fn can_load(&self, path: &Path) -> bool {
        path.extension().is_some_and(|ext| ext == "txt")
    }
}

/// Markdown loader (.md, .markdown)
pub struct MarkdownLoader;

impl DocumentLoader for MarkdownLoader {
    fn load(&self, path: &Path) -> Result<Document> {
        load_plain(path, "md")
    }

    fn can_load(&self, path: &Path) -> bool {
        path.extension()
            .is_some_and(|ext| matches!(ext.to_str(), Some("md") | Some("markdown")))
    }
}

/// PDF loader (.pdf), requires the `pdf` feature
pub struct PdfLoader;

impl DocumentLoader for PdfLoader {
    fn load(&self, _path: &Path) -> Result<Document> {
        #[cfg(feature = "pdf")]
        {
            let content = pdf_extract::extract_text(_path)
                .with_context(|| format!("failed to extract text from PDF: {:?}", _path))?;

            let size = fs::metadata(_path).map(|m| m.len() as usize).ok();

            let metadata = DocumentMetadata {
                file_path: Some(_path.to_path_buf()),
                file_type: "pdf".to_string(),
                size,
            };

            Ok(Document::new(
                document_id(_path),
                _path.to_string_lossy().to_string(),
                content,
                metadata,
            ))
        }

        #[cfg(not(feature = "pdf"))]
        {
            anyhow::bail!("PDF support not enabled; rebuild with --features pdf")
        }
    }

    fn can_load(&self, path: &Path) -> bool {
        path.extension().is_some_and(|ext| ext == "pdf")
    }
}

/// Loader that dispatches to the format-specific loaders by extension
pub struct MultiFormatLoader {
    loaders: Vec<Box<dyn DocumentLoader>>,
}

impl MultiFormatLoader {
    /// Create a loader covering all supported formats
    pub fn new() -> Self {
        let loaders: Vec<Box<dyn DocumentLoader>> = vec![
            Box::new(TextLoader),
            Box::new(MarkdownLoader),
            Box::new(PdfLoader),
        ];

        Self { loaders }
    }

    /// Load a single document, selecting the appropriate loader
    pub fn load(&self, path: &Path) -> Result<Document> {
        for loader in &self.loaders {
            if loader.can_load(path) {
                return loader.load(path);
            }
        }

        anyhow::bail!("unsupported file type: {:?}", path)
    }

    /// Load every supported document under a directory, recursively
    ///
    /// Files that fail to load are skipped with a warning rather than
    /// aborting the whole ingestion run.
    pub fn load_directory(&self, dir: &Path) -> Result<Vec<Document>> {
        let mut documents = Vec::new();

        for entry in
            fs::read_dir(dir).with_context(|| format!("failed to read directory: {:?}", dir))?
        {
            let path = entry?.path();

            if path.is_dir() {
                documents.extend(self.load_directory(&path)?);
            } else if self.loaders.iter().any(|l| l.can_load(&path)) {
                match self.load(&path) {
                    Ok(doc) => documents.push(doc),
                    Err(e) => tracing::warn!("skipping {:?}: {e:#}", path),
                }
            }
        }

        Ok(documents)
    }
}

impl Default for MultiFormatLoader {
    fn default() -> Self {
        Self::new()
    }
}

/// Derive a stable document ID from a file path
fn document_id(path: &Path) -> String {
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    let mut hasher = DefaultHasher::new();
    path.to_string_lossy().hash(&mut hasher);
    format!("doc_{:x}", hasher.finish())
}

/// Built-in sample documents for demos and smoke tests
///
/// Three short articles on AI, NLP, and vector databases, so the tool can be
/// exercised end to end without any local files.
pub fn sample_documents() -> Vec<Document> {
    const SAMPLES: &[(&str, &str)] = &[
        (
            "sample_document_1",
            "Artificial Intelligence (AI) is a branch of computer science that aims to create \
             intelligent machines that work and react like humans. Some of the activities \
             computers with artificial intelligence are designed for include speech recognition, \
             learning, planning, and problem solving.\n\n\
             Machine learning is a subset of AI that enables computers to learn and improve from \
             experience without being explicitly programmed. It focuses on developing computer \
             programs that can access data and use it to learn for themselves.\n\n\
             Deep learning is a subset of machine learning that uses neural networks with \
             multiple layers to model and understand complex patterns in data. It has been \
             particularly successful in areas like image recognition, natural language \
             processing, and speech recognition.",
        ),
        (
            "sample_document_2",
            "Natural Language Processing (NLP) is a field of AI that focuses on the interaction \
             between computers and human language. It involves developing algorithms and models \
             that can understand, interpret, and generate human language in a way that is both \
             meaningful and useful.\n\n\
             Key applications of NLP include machine translation, sentiment analysis, chatbots, \
             text summarization, and question answering systems. These applications are becoming \
             increasingly important in our digital world.\n\n\
             Recent advances in NLP have been driven by large language models like GPT, BERT, \
             and their successors, which have achieved remarkable performance on various \
             language tasks.",
        ),
        (
            "sample_document_3",
            "Vector databases are specialized databases designed to store and retrieve \
             high-dimensional vector data efficiently. They are particularly useful for \
             applications involving similarity search, recommendation systems, and AI/ML \
             workloads.\n\n\
             Managed vector services provide hosted solutions for storing and querying vector \
             embeddings, with features like real-time similarity search, automatic scaling, and \
             integration with popular ML frameworks.\n\n\
             Vector databases are essential for modern AI applications, especially those \
             involving semantic search, recommendation systems, and retrieval-augmented \
             generation (RAG) systems.",
        ),
    ];

    SAMPLES
        .iter()
        .map(|(id, text)| {
            Document::new(
                (*id).to_string(),
                (*id).to_string(),
                (*text).to_string(),
                DocumentMetadata {
                    file_path: None,
                    file_type: "sample".to_string(),
                    size: Some(text.len()),
                },
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_text_loader() {
        let mut file = NamedTempFile::with_suffix(".txt").unwrap();
        writeln!(file, "Hello, world!").unwrap();

        let loader = TextLoader;
        let doc = loader.load(file.path()).unwrap();

        assert!(doc.content.contains("Hello, world!"));
        assert_eq!(doc.metadata.file_type, "txt");
    }

    #[test]
    fn test_markdown_loader() {
        let mut file = NamedTempFile::with_suffix(".md").unwrap();
        writeln!(file, "# Header\n\nContent").unwrap();

        let loader = MarkdownLoader;
        let doc = loader.load(file.path()).unwrap();

        assert!(doc.content.contains("# Header"));
        assert_eq!(doc.metadata.file_type, "md");
    }

    #[test]
    fn test_multi_format_rejects_unknown() {
        let file = NamedTempFile::with_suffix(".bin").unwrap();
        let loader = MultiFormatLoader::new();

        assert!(loader.load(file.path()).is_err());
    }

    #[test]
    fn test_sample_documents() {
        let docs = sample_documents();

        assert_eq!(docs.len(), 3);
        assert!(docs[0].content.contains("Artificial Intelligence"));
        assert!(docs.iter().all(|d| d.metadata.file_type == "sample"));
    }
}
