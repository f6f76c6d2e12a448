mod config; // brings `config.rs` in as `crate::config`
mod simulation;
mod terrain;

use tracing::{error, info};
use tracing_subscriber::{self, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()))
        .init();

    info!("Waypath navigation demo started.");

    let path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| config::DEFAULT_CONFIG_PATH.to_string());
    let settings = config::load_settings(&path)?;
    settings.validate()?;

    if let Err(e) = simulation::run(settings).await {
        error!("Simulation failed: {:?}", e);
        return Err(e);
    }
    Ok(())
}
