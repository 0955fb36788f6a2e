use anyhow::Result;
use clap::Parser;
use mapcache::config::Config;
use mapcache::config_validator::ConfigValidator;
use mapcache::server::Server;
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "mapcache", version, about = "Rate-limited, cached Google Maps gateway")]
struct Args {
    /// Address to listen on, overrides BIND_ADDR
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// Log level, overrides LOG_LEVEL
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let args = Args::parse();

    let mut config = Config::from_env()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;
    if let Some(bind) = args.bind {
        config.bind_addr = bind;
    }
    if let Some(level) = args.log_level {
        config.log_level = level;
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("mapcache={},tower_http=debug", config.log_level).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    ConfigValidator::validate(&config)
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;

    tracing::info!("Starting mapcache service");
    tracing::info!(
        bind_addr = %config.bind_addr,
        api_key_configured = config.has_api_key(),
        rate_limit_per_second = config.rate_limit_per_second,
        rate_limit_burst = config.rate_limit_burst,
        "Configuration loaded"
    );
    if !config.has_api_key() {
        tracing::warn!("GOOGLE_MAPS_API_KEY is not set; maps endpoints will return configuration errors");
    }

    let server = Server::new(config)
        .map_err(|e| anyhow::anyhow!("Failed to create server: {}", e))?;

    server
        .run()
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}
