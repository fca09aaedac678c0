//! Command-line entry for worker binaries.
//!
//! `run_app` is the whole process bootstrap: resolve the config path,
//! load the local env file, initialise tracing, read the LiveKit
//! credentials, and run the worker until a shutdown signal.

use crate::config::load_config;
use crate::error::WorkerError;
use crate::worker::{Worker, WorkerOptions};
use bna_voice::LiveKitConfig;
use tracing_subscriber::EnvFilter;

/// Local env file holding provider and LiveKit credentials.
const ENV_FILE: &str = ".env.local";

fn resolve_config_path() -> (Option<String>, &'static str) {
    if let Some(path) = std::env::args()
        .nth(1)
        .filter(|value| !value.trim().is_empty())
    {
        return (Some(path), "cli-arg");
    }

    if let Ok(path) = std::env::var("BNA_CONFIG_PATH") {
        if !path.trim().is_empty() {
            return (Some(path), "env-var");
        }
    }

    (None, "default")
}

/// Registers the application hooks and hands control to the worker runtime.
///
/// # Errors
///
/// Returns `WorkerError::Config` when configuration or credentials cannot
/// be resolved; the process cannot serve jobs in that state.
pub async fn run_app(options: WorkerOptions) -> Result<(), WorkerError> {
    // Credentials live in the local env file during development; a missing
    // file is fine when the variables are set by the environment itself.
    let _ = dotenvy::from_filename(ENV_FILE);

    let (resolved_config_path, config_source) = resolve_config_path();
    let selected_config_path = resolved_config_path.as_deref().or(Some("config.toml"));

    let config = load_config(selected_config_path)
        .map_err(|e| WorkerError::Config(e.to_string()))?;

    let filter =
        EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    if config.logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    tracing::info!(
        source = config_source,
        path = selected_config_path.unwrap_or("<none>"),
        "resolved startup configuration path"
    );

    if let Some(path) = selected_config_path {
        if !std::path::Path::new(path).exists() {
            tracing::info!(path, "config file not found, using defaults");
        }
    }

    let livekit = LiveKitConfig::from_env()?;

    Worker::new(config, livekit, options).run().await
}
