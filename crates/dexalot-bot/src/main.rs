//! Dexalot RFQ integration - Entry Point
//!
//! Polls the maker's tokens, pairs, prices and blacklist into the shared
//! cache until interrupted.

use anyhow::Result;
use clap::Parser;
use tracing::info;

/// Dexalot RFQ integration
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via DEXALOT_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    dexalot_telemetry::init_logging()?;

    info!("Starting Dexalot RFQ v{}", env!("CARGO_PKG_VERSION"));

    // CLI arg > DEXALOT_CONFIG env var > default
    let config = dexalot_bot::AppConfig::load(args.config.as_deref())?;
    info!(
        api_url = %config.api_url,
        network = config.network,
        is_slave = config.is_slave,
        "Configuration loaded"
    );

    let app = dexalot_bot::Application::new(config)?;
    app.run().await?;

    Ok(())
}
