//! Wedge control panel entry point.

mod app;
mod command;
mod config;

use std::time::Duration;

use tracing_subscriber::EnvFilter;

/// Upper bound for runtime teardown after the panel exits.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(5);

fn main() -> anyhow::Result<()> {
    // Initialize structured logging.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    tracing::info!(version = env!("CARGO_PKG_VERSION"), "starting Wedge panel");

    let path = config::path_from_args(std::env::args().skip(1))?;
    let config = config::Config::load(&path)?;
    tracing::info!(path = %path.display(), scenes = config.scenes.len(), "configuration loaded");

    let rt = tokio::runtime::Runtime::new()?;
    let result = rt.block_on(app::run(config));

    // Stdin reads run on a blocking thread that never returns on its own.
    rt.shutdown_timeout(SHUTDOWN_TIMEOUT);

    result?;
    tracing::info!("panel shut down cleanly");
    Ok(())
}
