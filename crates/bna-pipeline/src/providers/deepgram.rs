//! Deepgram speech recognition over the prerecorded HTTP API.

use crate::error::PipelineError;
use crate::providers::{SpeechToText, Transcript};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

const LISTEN_URL: &str = "https://api.deepgram.com/v1/listen";

/// Timeout for one recognition request.
const STT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct DeepgramStt {
    client: reqwest::Client,
    api_key: String,
    model: String,
}

impl DeepgramStt {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: api_key.into(),
            model: model.into(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }
}

#[derive(Deserialize)]
struct ListenResponse {
    results: ListenResults,
}

#[derive(Deserialize)]
struct ListenResults {
    channels: Vec<Channel>,
}

#[derive(Deserialize)]
struct Channel {
    alternatives: Vec<Alternative>,
}

#[derive(Deserialize)]
struct Alternative {
    transcript: String,
    confidence: f32,
}

#[async_trait]
impl SpeechToText for DeepgramStt {
    async fn recognize(&self, audio: &[u8]) -> Result<Transcript, PipelineError> {
        let response = self
            .client
            .post(LISTEN_URL)
            .query(&[("model", self.model.as_str()), ("smart_format", "true")])
            .header("Authorization", format!("Token {}", self.api_key))
            .header("Content-Type", "audio/wav")
            .timeout(STT_TIMEOUT)
            .body(audio.to_vec())
            .send()
            .await?
            .error_for_status()?;

        let body: ListenResponse = response.json().await?;
        let alternative = body
            .results
            .channels
            .into_iter()
            .next()
            .and_then(|c| c.alternatives.into_iter().next())
            .ok_or_else(|| {
                PipelineError::Response("deepgram response carried no alternatives".to_string())
            })?;

        Ok(Transcript {
            text: alternative.transcript,
            confidence: Some(alternative.confidence),
        })
    }
}
