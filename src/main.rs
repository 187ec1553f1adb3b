use crate::app_config::AppConfig;
use crate::args::Args;
use crate::metrics::Collector;
use clap::Parser;
use tracing::{info, warn};

mod app_config;
mod args;
mod metrics;
mod oxidized;
mod server;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let config = AppConfig::load(&args)?;

    tracing_subscriber::fmt().with_max_level(config.log().level()).init();

    info!("🪵 Starting {} v{}", env!("CARGO_PKG_NAME"), env!("CARGO_PKG_VERSION"));
    info!("✅  Loaded configuration");

    let client = oxidized::new_client(&config)?;
    if !client.has_credentials() {
        warn!("⚠️ No username or password given, using Oxidized without basic authentication");
    }
    info!(url = config.oxidized().url(), "✅  Initialized Oxidized client");

    let collector = Collector::new(client);
    info!("🔥 {} is up and running", env!("CARGO_PKG_NAME"));

    server::serve(collector, &config).await?;

    info!("Finished process");
    Ok(())
}
