//! Worker configuration loading from file and environment variables.

use serde::Deserialize;
use thiserror::Error;

/// Top-level worker configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct WorkerConfig {
    /// Job dispatch settings.
    #[serde(default)]
    pub worker: JobDispatchConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Job dispatch configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct JobDispatchConfig {
    /// Name of the room this worker serves.
    #[serde(default = "default_room")]
    pub room: String,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "bna_agent=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

fn default_room() -> String {
    "bna-room".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for JobDispatchConfig {
    fn default() -> Self {
        Self {
            room: default_room(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads configuration from a TOML file, falling back to defaults.
///
/// Environment variable overrides:
/// - `BNA_ROOM` overrides `worker.room`
/// - `BNA_LOG_LEVEL` overrides `logging.level`
/// - `BNA_LOG_JSON` overrides `logging.json` (set to "true" to enable)
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<WorkerConfig, ConfigError> {
    let mut config = match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => toml::from_str(&contents)?,
            // No log here; the subscriber is not installed yet when the
            // CLI loads config. run_app reports the fallback after init.
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => WorkerConfig::default(),
            Err(e) => return Err(ConfigError::FileRead(e)),
        },
        None => WorkerConfig::default(),
    };

    // Environment variable overrides
    if let Ok(room) = std::env::var("BNA_ROOM") {
        if !room.trim().is_empty() {
            config.worker.room = room;
        }
    }
    if let Ok(level) = std::env::var("BNA_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Ok(json) = std::env::var("BNA_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }

    Ok(config)
}
