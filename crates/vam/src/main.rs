use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use vam::{config::AppConfig, run_server};

fn init_logging() {
    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().pretty())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();
    let config = AppConfig::from_env();

    tracing::info!("Storing data under {}", config.store_path);

    run_server(config).await
}
