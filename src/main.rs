use anyhow::Result;
use tour_storefront::config::Config;
use tour_storefront::server;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file (ignored in production)
    let _ = dotenvy::dotenv();

    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("tour_storefront=info".parse()?),
        )
        .init();

    info!("Starting tour storefront");

    let config = Config::from_env()?;
    info!(
        "Dictionaries from {}, admin API {}",
        config.dictionary_dir.display(),
        if config.api_key.is_some() { "enabled" } else { "disabled" }
    );

    server::serve(&config).await
}
