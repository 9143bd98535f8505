//! sysmon-bot - Entry Point

use sysmon_bot::Config;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("sysmon-bot v{}", env!("CARGO_PKG_VERSION"));

    let config = Config::from_env()?;
    sysmon_bot::telegram::run_bot(config).await
}
