use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use waitlist::config::Config;
use waitlist::server::Server;

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let config = Config::from_env()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("waitlist={},tower_http=debug", config.log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting waitlist service");
    tracing::info!(
        "Configuration: bind_addr={}, rate_limit={}/{:?}, admin_access={}, verification={}",
        config.bind_addr,
        config.rate_limit_max_requests,
        config.rate_limit_window,
        if config.admin_token.is_some() { "enabled" } else { "disabled" },
        if config.turnstile_secret.is_some() {
            "enabled"
        } else if config.verify_fail_closed {
            "fail-closed"
        } else {
            "fail-open"
        },
    );

    Server::new(config)
        .run()
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}
