use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use delivery_orchestrator::{AppState, Config};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env().context("Failed to load configuration")?;
    config.validate().context("Invalid configuration")?;

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| config.default_log_filter().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!(
        "Starting {} v{}...",
        config.api_title,
        config.api_version
    );
    tracing::debug!("Configuration: {:?}", config);

    if config.github.enabled() {
        tracing::info!(
            "GitHub integration enabled (api: {}, auto-create workflow: {})",
            config.github.api_url,
            config.github.auto_create_workflow
        );
    } else {
        tracing::info!("GitHub integration disabled (APP_GITHUB_TOKEN not set)");
    }

    let addr = config.bind_addr.clone();
    let state = AppState::new(config).context("Failed to initialise GitHub client")?;

    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    delivery_orchestrator::serve(listener, state)
        .await
        .context("Failed to start server")?;

    Ok(())
}
