use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scholar_relay::{api, config::RelayConfig, relay::Relay};

#[derive(Parser)]
#[command(name = "scholar-relay")]
#[command(about = "Relay between the Academic Assistant UI and its agent backend")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the relay
    Serve {
        /// Address to bind
        #[arg(long)]
        host: Option<String>,

        /// Port for HTTP and browser sockets
        #[arg(short, long)]
        port: Option<u16>,

        /// Backend HTTP base URL
        #[arg(short, long)]
        backend_url: Option<String>,

        /// JSON config file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
    /// Query a running relay's health
    Status {
        /// Relay base URL
        #[arg(long, default_value = "http://127.0.0.1:3001")]
        url: String,
    },
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::new(
        std::env::var("RUST_LOG").unwrap_or_else(|_| "scholar_relay=debug,tower_http=debug".into()),
    );

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn serve(config: RelayConfig) -> anyhow::Result<()> {
    tracing::info!(
        backend = %config.backend_url,
        socket = %config.backend_ws_url(),
        "Starting relay"
    );

    let relay = Relay::start(&config);
    let app = api::create_router(relay, config.cors_origins.as_deref());

    let listener = tokio::net::TcpListener::bind(config.bind_addr())
        .await
        .with_context(|| format!("Failed to bind {}", config.bind_addr()))?;
    tracing::info!("Relay listening on http://{}", config.bind_addr());

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Failed to listen for shutdown signal: {}", e);
            }
            tracing::info!("Shutting down");
        })
        .await?;

    Ok(())
}

async fn status(url: &str) -> anyhow::Result<()> {
    let health: serde_json::Value = reqwest::get(format!("{}/health", url.trim_end_matches('/')))
        .await
        .with_context(|| format!("Relay not reachable at {}", url))?
        .error_for_status()?
        .json()
        .await?;
    println!("{}", serde_json::to_string_pretty(&health)?);
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing();

    match cli.command {
        Some(Commands::Serve {
            host,
            port,
            backend_url,
            config,
        }) => {
            let mut config = RelayConfig::load(config.as_deref())?;
            if let Some(host) = host {
                config.host = host;
            }
            if let Some(port) = port {
                config.port = port;
            }
            if let Some(url) = backend_url {
                config.backend_url = url;
            }
            serve(config).await?;
        }
        Some(Commands::Status { url }) => status(&url).await?,
        None => serve(RelayConfig::load(None)?).await?,
    }

    Ok(())
}
