// src/main.rs
use anyhow::Result;
use job_tracker::config::RelayConfig;
use job_tracker::web::start_relay_server;

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Registry};

#[tokio::main]
async fn main() -> Result<()> {
    Registry::default()
        .with(fmt::layer())
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or(EnvFilter::new("job_tracker=info,rocket=warn")),
        )
        .init();

    let config = RelayConfig::load()?;
    start_relay_server(config).await
}
