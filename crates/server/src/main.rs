mod bootstrap;
mod health;

use std::time::Duration;

use anyhow::Result;
use polyglot_core::config::{load_dotenv, AppConfig, LoadOptions};
use tracing_subscriber::EnvFilter;

fn init_logging(config: &AppConfig) {
    use polyglot_core::config::LogFormat::*;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(config.logging.level.as_str()));

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_env_filter(filter).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_env_filter(filter).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_env_filter(filter).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

pub async fn run() -> Result<()> {
    // Logging depends on the loaded config, so nothing is logged before this.
    let dotenv_path = load_dotenv(None)?;
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);
    if let Some(path) = dotenv_path {
        tracing::info!(
            event_name = "system.config.dotenv_loaded",
            correlation_id = "bootstrap",
            path = %path.display(),
            "loaded environment from .env"
        );
    }

    let app = bootstrap::bootstrap_with_config(config)?;

    health::spawn(
        &app.config.server.bind_address,
        app.config.server.health_check_port,
        health::HealthState {
            transport_mode: app.slack_runner.transport_mode(),
            flows: app.flows,
        },
    )
    .await?;

    tracing::info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        transport_mode = app.slack_runner.transport_mode(),
        "polyglot-server started"
    );

    tokio::select! {
        result = app.slack_runner.start() => result?,
        signal = wait_for_shutdown() => signal?,
    }

    tracing::info!(
        event_name = "system.server.stopping",
        correlation_id = "shutdown",
        "polyglot-server stopping"
    );
    let grace = Duration::from_secs(app.config.server.graceful_shutdown_secs);
    match tokio::time::timeout(grace, app.slack_runner.shutdown()).await {
        Ok(Ok(())) => {}
        Ok(Err(error)) => {
            tracing::warn!(error = %error, "socket mode transport did not close cleanly")
        }
        Err(_) => tracing::warn!(
            grace_secs = grace.as_secs(),
            "socket mode shutdown timed out; abandoning in-flight events"
        ),
    }

    Ok(())
}

async fn wait_for_shutdown() -> Result<()> {
    tokio::signal::ctrl_c().await?;
    Ok(())
}
