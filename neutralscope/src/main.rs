/*
neutralscope - main.rs
This binary loads configuration, wires the news and completion clients into the relay
and serves the HTTP API plus the browser UI.
*/

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{fmt, EnvFilter};

use neutralscope::server::{self, AppState};

#[derive(Parser, Debug)]
#[command(name = "neutralscope", about = "Neutralscope news bias relay server")]
struct Args {
    /// Path to config.toml
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Override the listening port (takes precedence over PORT and the config file)
    #[arg(long)]
    port: Option<u16>,

    /// Override log level (info, debug, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI args
    let args = Args::parse();

    // Initialize logging
    let filter = EnvFilter::try_new(&args.log_level).unwrap_or_else(|_| EnvFilter::new("info"));
    fmt().with_env_filter(filter).init();

    // API keys and PORT may come from a .env file
    if let Ok(path) = dotenv::dotenv() {
        info!(path = ?path, "loaded environment file");
    }

    let config = neutralscope::load_config(args.config, args.port).await?;

    let relay = match neutralscope::relay_from_config(&config) {
        Ok(relay) => relay,
        Err(e) => {
            error!(%e, "failed to initialize relay clients");
            return Err(e);
        }
    };
    info!(
        model = %config.llm.model,
        neutral_mode = %config.relay.neutral_mode,
        "relay initialized"
    );

    let state = AppState::new(Arc::new(config), Arc::new(relay));
    if let Err(e) = server::launch_rocket(state).await {
        error!(%e, "Rocket server failed");
        return Err(e);
    }

    info!("Shutdown complete");
    Ok(())
}
