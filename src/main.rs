use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use docqa::cli;
use docqa::config::Config;

#[derive(Parser)]
#[command(name = "docqa")]
#[command(about = "Retrieval-augmented document question answering", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Load documents, chunk them, and build a retrieval index
    Ingest {
        /// Input file or directory
        #[arg(short, long)]
        input: Option<String>,

        /// Output index directory
        #[arg(short, long, default_value = "index")]
        output: String,

        /// Use the built-in sample documents instead of --input
        #[arg(long)]
        sample: bool,

        /// Chunking strategy: recursive or sentence
        #[arg(long, default_value = "recursive")]
        strategy: String,

        /// Chunk size in characters
        #[arg(long)]
        chunk_size: Option<usize>,

        /// Chunk overlap in characters
        #[arg(long)]
        chunk_overlap: Option<usize>,
    },

    /// Answer a single question against an index
    Ask {
        /// The question to answer
        question: String,

        /// Index directory
        #[arg(short, long, default_value = "index")]
        index: String,

        /// Number of passages to retrieve
        #[arg(short = 'k', long)]
        top_k: Option<usize>,

        /// Scaffold template: default, concise, or chat
        #[arg(long)]
        template: Option<String>,

        /// Print the retrieved passages after the answer
        #[arg(long)]
        show_context: bool,
    },

    /// Interactive question-answering loop
    Repl {
        /// Index directory
        #[arg(short, long, default_value = "index")]
        index: String,

        /// Number of passages to retrieve
        #[arg(short = 'k', long)]
        top_k: Option<usize>,
    },

    /// Show index statistics and configured models
    Info {
        /// Index directory
        #[arg(short, long, default_value = "index")]
        index: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docqa=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let mut config = Config::from_env()?;
    let cli = Cli::parse();

    match cli.command {
        Commands::Ingest {
            input,
            output,
            sample,
            strategy,
            chunk_size,
            chunk_overlap,
        } => {
            if let Some(chunk_size) = chunk_size {
                config.chunk_size = chunk_size;
            }
            if let Some(chunk_overlap) = chunk_overlap {
                config.chunk_overlap = chunk_overlap;
            }
            config.validate()?;
            cli::ingest(input, output, sample, strategy, config).await?;
        }

        Commands::Ask {
            question,
            index,
            top_k,
            template,
            show_context,
        } => {
            if let Some(top_k) = top_k {
                config.top_k = top_k;
            }
            if let Some(template) = template {
                config.template = template;
            }
            config.validate()?;
            cli::ask(index, question, show_context, config).await?;
        }

        Commands::Repl { index, top_k } => {
            if let Some(top_k) = top_k {
                config.top_k = top_k;
            }
            config.validate()?;
            cli::repl(index, config).await?;
        }

        Commands::Info { index } => {
            cli::info(index, config).await?;
        }
    }

    Ok(())
}
