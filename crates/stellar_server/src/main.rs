//! Stellar - Game Server
//!
//! Reads one JSON request per line on stdin and writes one JSON response
//! per line on stdout.

use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use stellar_core::clock::SystemClock;
use stellar_server::protocol::{decode_request, encode_response};
use stellar_server::service::GameService;
use stellar_server::store::MemoryStore;
use stellar_server::ServerConfig;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "stellar-server")]
#[command(about = "Planet economy game server")]
struct Cli {
    /// Server configuration (RON)
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = match &cli.config {
        Some(path) => ServerConfig::load(path),
        None => Ok(ServerConfig::default()),
    };
    let (config, engine) = match config.and_then(|c| c.build_engine().map(|e| (c, e))) {
        Ok(loaded) => loaded,
        Err(e) => {
            tracing::error!("Failed to start: {e}");
            std::process::exit(1);
        }
    };

    tracing::info!("Starting Stellar game server");
    let service = GameService::new(
        engine,
        MemoryStore::new(),
        Arc::new(SystemClock),
        config.starting_resources.into(),
        config.starting_temperature,
    );

    if let Err(e) = serve(&service).await {
        tracing::error!("Connection closed: {e}");
        std::process::exit(1);
    }
}

async fn serve(service: &GameService<MemoryStore>) -> std::io::Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let response = match decode_request(&line) {
            Ok(request) => service.handle(request).await,
            Err(response) => {
                tracing::warn!("Malformed request: {line}");
                response
            }
        };
        let mut out = encode_response(&response);
        out.push('\n');
        stdout.write_all(out.as_bytes()).await?;
        stdout.flush().await?;
    }
    Ok(())
}
