//! Memory tool server.
//!
//! Usage:
//!   MEM0_PROVIDER=self_hosted memory-tools
//!   MEM0_PROVIDER=self_hosted MEMORY_SEARCH_DRIVER=pgvector OPENAI_API_KEY=sk-... memory-tools
//!   MEM0_PROVIDER=cloud_platform MEM0_API_KEY=m0-... memory-tools --port 8080
//!
//! Settings are read from the environment, after loading `.env` (or the file
//! given with `--env-file`) if it exists.

use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use memory_tools::{create_provider, memory_tools, server, Config};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "memory-tools", about = "Contextual memory tools over MCP")]
struct Cli {
    /// Env file to load before reading configuration
    #[arg(long)]
    env_file: Option<PathBuf>,

    /// Override APP_HOST
    #[arg(long)]
    host: Option<String>,

    /// Override APP_PORT
    #[arg(long)]
    port: Option<u16>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_target(false)
        .init();

    if let Err(e) = run(Cli::parse()).await {
        error!("{e:#}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    match cli.env_file {
        Some(ref path) => {
            dotenvy::from_path(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
        }
        None => {
            // A missing .env is fine.
            dotenvy::dotenv().ok();
        }
    }

    let mut config = Config::from_env().context("invalid configuration")?;
    if let Some(host) = cli.host {
        config.host = host;
    }
    if let Some(port) = cli.port {
        config.port = port;
    }

    let provider = create_provider(&config).context("failed to create memory provider")?;
    let tools = memory_tools(provider);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;

    server::serve(listener, tools, async {
        tokio::signal::ctrl_c().await.ok();
        info!("server stopped by user");
    })
    .await
    .context("server error")?;

    Ok(())
}
