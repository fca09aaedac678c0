use crate::error::VoiceError;
use serde::{Deserialize, Serialize};
use std::fmt;

fn default_token_ttl_seconds() -> u64 {
    3600
}

/// Connection settings for the LiveKit server.
///
/// Credentials come from the process environment (after the dotenv file is
/// loaded): `LIVEKIT_URL`, `LIVEKIT_API_KEY`, `LIVEKIT_API_SECRET`.
#[derive(Clone, Serialize, Deserialize)]
pub struct LiveKitConfig {
    pub url: String,
    pub api_key: String,
    #[serde(skip_serializing)]
    pub api_secret: String,
    /// JWT token TTL in seconds for LiveKit join tokens. Default: 3600 (1 hour).
    #[serde(default = "default_token_ttl_seconds")]
    pub token_ttl_seconds: u64,
}

impl fmt::Debug for LiveKitConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LiveKitConfig")
            .field("url", &self.url)
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .field("token_ttl_seconds", &self.token_ttl_seconds)
            .finish()
    }
}

impl LiveKitConfig {
    pub fn new(
        url: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        Self {
            url: url.into(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            token_ttl_seconds: default_token_ttl_seconds(),
        }
    }

    /// Resolves the configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns `VoiceError::Config` naming the first missing variable.
    pub fn from_env() -> Result<Self, VoiceError> {
        let url = require_env("LIVEKIT_URL")?;
        let api_key = require_env("LIVEKIT_API_KEY")?;
        let api_secret = require_env("LIVEKIT_API_SECRET")?;
        Ok(Self::new(url, api_key, api_secret))
    }
}

fn require_env(name: &str) -> Result<String, VoiceError> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(VoiceError::Config(format!(
            "missing environment variable {name}"
        ))),
    }
}
