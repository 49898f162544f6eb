use std::env;
use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, anyhow};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::EnvFilter;

use edusign::{ServerConfig, check, core::SessionStore, routes, state::AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    // Handle CLI commands
    let mut command: Option<String> = None;
    let mut config_path: Option<PathBuf> = env::var("CONFIG_FILE").ok().map(PathBuf::from);

    let mut args = env::args().skip(1);
    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-c" | "--config" => {
                let path = args
                    .next()
                    .ok_or_else(|| anyhow!("--config requires a file path"))?;
                config_path = Some(PathBuf::from(path));
            }
            "check" if command.is_none() => command = Some(arg),
            other => {
                anyhow::bail!("Unknown argument '{other}'. Usage: edusign [check] [--config <path>]");
            }
        }
    }

    // Load configuration
    let config = match &config_path {
        Some(path) => ServerConfig::from_file(path)
            .map_err(|e| anyhow!(e.to_string()))
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => ServerConfig::from_env().map_err(|e| anyhow!(e.to_string()))?,
    };

    if command.as_deref() == Some("check") {
        return check::run(&config).await;
    }

    let address = config.address();
    let idle_timeout = Duration::from_secs(config.session_idle_timeout_seconds);
    let reap_interval = Duration::from_secs(config.session_reap_interval_seconds);
    info!("Starting server on {address}");

    // Create application state; any category that fails to load aborts here
    let app_state = AppState::new(config)
        .await
        .context("Failed to load recognition categories")?;

    let reaper = SessionStore::spawn_reaper(app_state.sessions(), reap_interval, idle_timeout);

    let app = routes::create_router(app_state);

    // Create listener
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {address}"))?;

    info!("Server listening on {address}");

    // Start server
    let result = axum::serve(listener, app).await;
    reaper.abort();
    result?;

    Ok(())
}
