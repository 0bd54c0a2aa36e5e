use anyhow::Result;
use drivegate_server::Settings;
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_FILTER: &str = "drivegate=info,tower_http=info";

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER)))
        .init();

    let config = drivegate_server::load_config();
    let settings = Settings::from_config(&config.snapshot())?;
    tracing::debug!(?settings, "settings loaded");

    let gate = drivegate_server::build(&settings)?;
    let addr = settings.addr();

    tracing::info!("[drivegate] serving {} on http://{addr}", settings.route);

    gate.listen(addr).await?;

    Ok(())
}
