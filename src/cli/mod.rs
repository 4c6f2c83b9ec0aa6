//! Command-line interface
//!
//! Implements the `ingest`, `ask`, `repl`, and `info` commands.

use crate::config::Config;
use crate::data::{create_chunker, sample_documents, ChunkConfig, Chunker, MultiFormatLoader};
use crate::rag::{
    Generator, HttpGenerator, HttpGeneratorConfig, QaConfig, QaPipeline, QaPipelineBuilder,
    SamplingParams,
};
use crate::retrieval::Bm25Retriever;
use crate::tokenizer::create_tokenizer;
use anyhow::{Context, Result};
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::Arc;

/// Execute the ingest command: load documents, chunk them, build the index
pub async fn ingest(
    input: Option<String>,
    output: String,
    use_sample: bool,
    strategy: String,
    config: Config,
) -> Result<()> {
    tracing::info!("Starting ingestion");
    tracing::info!("  Output index: {}", output);
    tracing::info!("  Chunking: {} ({}/{})", strategy, config.chunk_size, config.chunk_overlap);

    let loader = MultiFormatLoader::new();

    let documents = if use_sample {
        tracing::info!("Loading built-in sample documents");
        sample_documents()
    } else if let Some(input) = input {
        let input_path = Path::new(&input);
        if input_path.is_file() {
            tracing::info!("Loading file: {:?}", input_path);
            vec![loader.load(input_path)?]
        } else if input_path.is_dir() {
            tracing::info!("Loading directory: {:?}", input_path);
            loader.load_directory(input_path)?
        } else {
            anyhow::bail!("input path does not exist: {}", input);
        }
    } else {
        anyhow::bail!("nothing to ingest: pass --input <path> or --sample");
    };

    if documents.is_empty() {
        anyhow::bail!("no documents loaded");
    }
    tracing::info!("Loaded {} documents", documents.len());

    let chunker = create_chunker(
        &strategy,
        ChunkConfig {
            chunk_size: config.chunk_size,
            chunk_overlap: config.chunk_overlap,
        },
    );

    let mut chunks = Vec::new();
    for document in &documents {
        let document_chunks = chunker.chunk(document)?;
        tracing::info!(
            "  {} -> {} chunks",
            document.source,
            document_chunks.len()
        );
        chunks.extend(document_chunks);
    }

    let retriever = Bm25Retriever::build(chunks, Path::new(&output))?;

    println!("\nIngestion summary:");
    println!("  Documents processed: {}", documents.len());
    println!("  Chunks indexed: {}", retriever.len());
    println!("  Index directory: {}", output);

    Ok(())
}

/// Execute the ask command: answer a single question against an index
pub async fn ask(
    index: String,
    question: String,
    show_context: bool,
    config: Config,
) -> Result<()> {
    let pipeline = build_pipeline(&index, &config)?;

    let response = pipeline.answer(&question).await?;

    println!("{}", response);

    if show_context {
        println!("Context passages:");
        for (i, passage) in response.context.iter().enumerate() {
            println!("\n--- [{}] ---\n{}", i + 1, passage);
        }
    }

    Ok(())
}

/// Execute the repl command: interactive question loop over an index
pub async fn repl(index: String, config: Config) -> Result<()> {
    let pipeline = build_pipeline(&index, &config)?;

    println!("docqa interactive mode. Type 'quit' to exit.");
    println!("Index: {} | Model: {}", index, pipeline.generator().model_name());

    let stdin = io::stdin();
    loop {
        print!("\n? ");
        io::stdout().flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        let question = line.trim();
        if question.is_empty() {
            continue;
        }
        if matches!(question.to_lowercase().as_str(), "quit" | "exit" | "q") {
            break;
        }

        match pipeline.answer(question).await {
            Ok(response) => println!("\n{}", response),
            Err(e) => eprintln!("Error: {:#}", e),
        }
    }

    println!("Goodbye.");
    Ok(())
}

/// Execute the info command: report index and model configuration
pub async fn info(index: String, config: Config) -> Result<()> {
    let retriever = Bm25Retriever::load(Path::new(&index))
        .with_context(|| format!("failed to load index from {}", index))?;
    let metadata = retriever.metadata();

    println!("Index: {}", index);
    println!("  Documents: {}", metadata.num_documents);
    println!("  Chunks: {}", metadata.num_chunks);
    println!("  Created: {}", metadata.created_at);
    println!("Models:");
    println!("  Generator: {} @ {}", config.generator_model, config.generator_url);
    println!(
        "  Tokenizer: {} backend, {} token window",
        config.tokenizer_backend, config.max_context_tokens
    );
    println!("Chunking: {} chars, {} overlap", config.chunk_size, config.chunk_overlap);

    Ok(())
}

/// Wire up a QA pipeline for the given index directory
fn build_pipeline(index: &str, config: &Config) -> Result<QaPipeline> {
    let retriever = Bm25Retriever::load(Path::new(index))
        .with_context(|| format!("failed to load index from {}", index))?;

    let tokenizer = create_tokenizer(
        &config.tokenizer_backend,
        &config.tokenizer_model,
        config.max_context_tokens,
    )?;

    let generator = HttpGenerator::new(HttpGeneratorConfig {
        base_url: config.generator_url.clone(),
        model: config.generator_model.clone(),
        api_key: config.generator_api_key.clone(),
        max_context_length: config.max_context_tokens,
        timeout_secs: 120,
    })?;

    let qa_config = QaConfig::default()
        .with_top_k(config.top_k)
        .with_template(&config.template)
        .with_sampling(SamplingParams::default().with_max_new_tokens(config.max_new_tokens));

    QaPipelineBuilder::new()
        .retriever(Arc::new(retriever))
        .tokenizer(tokenizer)
        .generator(Box::new(generator))
        .config(qa_config)
        .build()
}
