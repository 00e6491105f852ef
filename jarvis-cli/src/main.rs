use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use jarvis_rag::{ErrorKind, IngestReport, RagConfig, RagError, Settings, openai::DEFAULT_CHAT_MODEL};
use jarvis_server::{AppState, ServerConfig, run_server};
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "jarvis")]
#[command(version)]
#[command(about = "Ask questions about your PDF documents", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract, chunk, embed and upsert every PDF in the docs folder
    Ingest {
        /// Folder holding the PDF files
        #[arg(long, env = "JARVIS_DOCS_DIR", default_value = "docs")]
        docs_dir: PathBuf,
    },
    /// Serve the chat UI and JSON API
    Serve {
        /// Folder holding the PDF files, used for example questions
        #[arg(long, env = "JARVIS_DOCS_DIR", default_value = "docs")]
        docs_dir: PathBuf,
        #[arg(long, env = "JARVIS_HOST", default_value = "127.0.0.1")]
        host: String,
        #[arg(long, env = "JARVIS_PORT", default_value_t = 5000)]
        port: u16,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    // `.env` is optional.
    dotenvy::dotenv().ok();
    init_logging();

    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Ingest { docs_dir } => ingest_command(&docs_dir).await,
        Commands::Serve { docs_dir, host, port } => serve_command(docs_dir, host, port).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}

async fn ingest_command(docs_dir: &Path) -> Result<()> {
    let settings = Settings::from_env().context("cannot ingest without configuration")?;

    println!("Starting document ingestion from '{}'...", docs_dir.display());
    let client = settings.http_client()?;
    let pipeline = settings
        .pipeline(&client, RagConfig::default())
        .await
        .with_context(|| format!("failed to connect to index '{}'", settings.pinecone_index_name))?;

    let report =
        pipeline.ingest_folder(docs_dir).await.map_err(|e| ingest_failure(e, docs_dir))?;

    print_report(&report);
    Ok(())
}

fn ingest_failure(error: RagError, docs_dir: &Path) -> anyhow::Error {
    match error.kind() {
        ErrorKind::EmptyInput => anyhow::Error::new(error).context(format!(
            "nothing to ingest; add PDF files to '{}'",
            docs_dir.display()
        )),
        ErrorKind::ServiceFailure => anyhow::Error::new(error)
            .context("storing documents failed; check your OpenAI and Pinecone credentials"),
        _ => anyhow::Error::new(error),
    }
}

fn print_report(report: &IngestReport) {
    println!("Found {} PDF files:", report.files_found);
    for file in &report.processed {
        println!("  processed: {file}");
    }
    for failure in &report.failures {
        println!("  failed:    {} ({})", failure.file, failure.message);
    }
    println!(
        "Ingested {} document chunks into index '{}'.",
        report.chunk_count, report.index_name
    );
}

async fn serve_command(docs_dir: PathBuf, host: String, port: u16) -> Result<()> {
    let state = match Settings::from_env() {
        Ok(settings) => AppState::connect(&settings, RagConfig::default(), docs_dir).await,
        Err(e) => {
            error!(error = %e, "jarvis is not configured");
            AppState::degraded(
                std::env::var("PINECONE_INDEX_NAME").ok(),
                std::env::var("OPENAI_MODEL").unwrap_or_else(|_| DEFAULT_CHAT_MODEL.to_string()),
                docs_dir,
            )
        }
    };

    if !state.is_ready() {
        warn!("serving in degraded mode; chat requests will fail until restart");
    }

    run_server(ServerConfig { host, port }, state).await
}
