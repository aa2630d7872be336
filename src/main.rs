use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use shakesearch::api::create_router;
use shakesearch::client::{ClientConfig, Controller, FormFields, SubmitEvent, TerminalView, form_fields};
use shakesearch::config::CONFIG;
use shakesearch::corpus;
use shakesearch::query_engine::QueryEngine;
use shakesearch::store::Store;

#[derive(Parser)]
#[command(name = "shakesearch", about = "Full-text search over Shakespeare's complete works")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Index the works and serve the search API and UI
    Serve {
        /// Works JSON file (defaults to DATA_PATH)
        #[arg(long)]
        data: Option<PathBuf>,
        /// Port to listen on (defaults to PORT)
        #[arg(long)]
        port: Option<u16>,
    },
    /// Query a running server and print the results
    Search {
        query: String,
        /// Allow one edit per term
        #[arg(long)]
        fuzzy: bool,
        /// Server base URL (defaults to SEARCH_URL)
        #[arg(long)]
        url: Option<String>,
    },
    /// Split the Gutenberg complete works text into a works JSON file
    Parse { input: PathBuf, output: PathBuf },
}

/// A search submitted from the command line; there is no default action to suppress.
struct CliSubmit {
    fields: FormFields,
}

impl SubmitEvent for CliSubmit {
    fn prevent_default(&mut self) {}

    fn fields(&self) -> FormFields {
        self.fields.clone()
    }
}

fn init_logging() -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;
    // Bridge log crate -> tracing (so log::info! etc. work)
    tracing_log::LogTracer::init()?;
    Ok(())
}

async fn serve(data: PathBuf, port: u16) -> Result<()> {
    let works = corpus::read_works(&data)?;

    let store = Arc::new(Store::default());
    let query_engine = Arc::new(QueryEngine::new(store.clone(), CONFIG.max_page_size));
    let app = create_router(query_engine, &CONFIG.static_dir);

    // searches are answered from whatever has been indexed so far
    tokio::spawn(async move {
        store.batch_index(works).await;
    });

    let listener = tokio::net::TcpListener::bind(("0.0.0.0", port))
        .await
        .with_context(|| format!("Failed to bind port {port}"))?;
    log::info!("Server running on {}", port);
    axum::serve(listener, app).await?;
    Ok(())
}

/// The view has already reported a failed search, so only the exit code carries it.
async fn search(query: String, fuzzy: bool, url: String) -> ExitCode {
    let mut fields = form_fields([("query", query)]);
    if fuzzy {
        fields.insert("fuzzy".to_string(), "on".to_string());
    }
    let controller = Controller::new(url, ClientConfig::default(), Arc::new(TerminalView));
    match controller.search(&mut CliSubmit { fields }).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(_) => ExitCode::FAILURE,
    }
}

fn parse(input: PathBuf, output: PathBuf) -> Result<()> {
    let text = std::fs::read_to_string(&input)
        .with_context(|| format!("Failed to read {}", input.display()))?;
    let works = corpus::parse_complete_works(&text);
    corpus::write_works(&output, &works)
}

#[tokio::main]
async fn main() -> Result<ExitCode> {
    init_logging()?;

    match Cli::parse().command {
        Command::Serve { data, port } => {
            let data = data.unwrap_or_else(|| PathBuf::from(&CONFIG.data_path));
            serve(data, port.unwrap_or(CONFIG.port)).await?;
        }
        Command::Search { query, fuzzy, url } => {
            let url = url.unwrap_or_else(|| CONFIG.search_url.clone());
            return Ok(search(query, fuzzy, url).await);
        }
        Command::Parse { input, output } => parse(input, output)?,
    }
    Ok(ExitCode::SUCCESS)
}
