//! Cartesia speech synthesis over the bytes HTTP API.

use crate::error::PipelineError;
use crate::providers::TextToSpeech;
use async_trait::async_trait;
use serde_json::json;
use std::time::Duration;

const TTS_BYTES_URL: &str = "https://api.cartesia.ai/tts/bytes";
const API_VERSION: &str = "2024-06-10";
const MODEL_ID: &str = "sonic-english";

/// Voice used when no explicit voice id is configured.
const DEFAULT_VOICE_ID: &str = "a0e99841-438c-4a64-b679-ae501e7d6091";

/// Timeout for one synthesis request.
const TTS_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct CartesiaTts {
    client: reqwest::Client,
    api_key: String,
    voice_id: String,
}

impl CartesiaTts {
    pub fn new(api_key: impl Into<String>, voice: Option<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            voice_id: voice.unwrap_or_else(|| DEFAULT_VOICE_ID.to_string()),
        }
    }

    pub fn voice_id(&self) -> &str {
        &self.voice_id
    }
}

#[async_trait]
impl TextToSpeech for CartesiaTts {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, PipelineError> {
        let response = self
            .client
            .post(TTS_BYTES_URL)
            .header("X-API-Key", &self.api_key)
            .header("Cartesia-Version", API_VERSION)
            .timeout(TTS_TIMEOUT)
            .json(&json!({
                "model_id": MODEL_ID,
                "transcript": text,
                "voice": { "mode": "id", "id": self.voice_id },
                "output_format": {
                    "container": "raw",
                    "encoding": "pcm_s16le",
                    "sample_rate": 16_000,
                },
            }))
            .send()
            .await?
            .error_for_status()?;

        let audio = response.bytes().await?;
        if audio.is_empty() {
            return Err(PipelineError::Response(
                "synthesis returned no audio".to_string(),
            ));
        }
        Ok(audio.to_vec())
    }
}
