//! # FinEduGuide server binary
//!
//! Starts the HTTP API from a TOML configuration file:
//!
//! ```bash
//! fineduguide --config ./config/fineduguide.toml serve
//! ```
//!
//! Secrets are read from the environment at startup:
//!
//! | Variable | Used by |
//! |----------|---------|
//! | `AWS_ACCESS_KEY_ID`, `AWS_SECRET_ACCESS_KEY` | object storage |
//! | `VECTOR_INDEX_API_KEY` | vector index |
//! | `MODEL_API_KEY` | embedding, generation, and OCR services |

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use fineduguide::config::load_config;
use fineduguide::embedding::{RemoteEmbedder, TextEmbedder};
use fineduguide::generate::{ChatModel, Generator, RemoteChatModel};
use fineduguide::index::{RemoteIndex, VectorGateway, VectorIndex};
use fineduguide::ocr::{DisabledOcr, OcrEngine, RemoteOcr};
use fineduguide::server::{run_server, AppState};
use fineduguide::storage::{ObjectStorage, S3Storage};

/// FinEduGuide, a retrieval-augmented content generation service for
/// banking and financial education.
#[derive(Parser)]
#[command(
    name = "fineduguide",
    about = "Retrieval-augmented content generation service for banking and financial education",
    version
)]
struct Cli {
    /// Path to configuration file (TOML).
    #[arg(long, global = true, default_value = "./config/fineduguide.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the HTTP API server.
    Serve,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = load_config(&cli.config)?;

    match cli.command {
        Commands::Serve => {
            let storage: Arc<dyn ObjectStorage> = Arc::new(S3Storage::new(&config.storage)?);
            let embedder: Arc<dyn TextEmbedder> = Arc::new(RemoteEmbedder::new(&config.model)?);
            let index: Arc<dyn VectorIndex> = Arc::new(RemoteIndex::new(&config.index)?);
            let gateway = Arc::new(VectorGateway::new(embedder, index));
            let chat: Arc<dyn ChatModel> = Arc::new(RemoteChatModel::new(&config.model)?);
            let generator = Arc::new(Generator::new(chat, config.model.clone()));
            let ocr: Arc<dyn OcrEngine> = if config.ocr.endpoint.is_some() {
                Arc::new(RemoteOcr::new(&config.ocr)?)
            } else {
                Arc::new(DisabledOcr)
            };

            let state = AppState {
                config: Arc::new(config),
                storage,
                gateway,
                generator,
                ocr,
            };
            run_server(state).await
        }
    }
}
