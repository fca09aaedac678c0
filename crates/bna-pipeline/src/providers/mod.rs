//! Provider selection and resolution.
//!
//! Each pipeline stage is configured by a struct enumerating the
//! recognised provider kinds and their parameters. `resolve` turns a
//! configuration into a boxed trait object, validating credentials
//! immediately so a missing API key fails agent construction rather than
//! the first mid-session request.

mod cartesia;
mod deepgram;
mod openai;

pub use cartesia::CartesiaTts;
pub use deepgram::DeepgramStt;
pub use openai::OpenAiLlm;

use crate::error::PipelineError;
use async_trait::async_trait;
use bna_types::ChatContext;
use serde::{Deserialize, Serialize};

/// A recognised user turn.
#[derive(Debug, Clone, PartialEq)]
pub struct Transcript {
    pub text: String,
    /// Recogniser confidence in [0, 1], when the provider reports one.
    pub confidence: Option<f32>,
}

/// A language-model reply with token accounting.
#[derive(Debug, Clone, PartialEq)]
pub struct LlmReply {
    pub content: String,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

/// Speech recognition boundary.
#[async_trait]
pub trait SpeechToText: Send + Sync {
    /// Recognises one endpointed audio segment (PCM s16le).
    async fn recognize(&self, audio: &[u8]) -> Result<Transcript, PipelineError>;
}

/// Language-model inference boundary.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    /// Produces the next assistant reply for the given chat context.
    async fn chat(&self, ctx: &ChatContext) -> Result<LlmReply, PipelineError>;
}

/// Speech synthesis boundary.
#[async_trait]
pub trait TextToSpeech: Send + Sync {
    /// Synthesises text into PCM audio (s16le).
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, PipelineError>;
}

impl std::fmt::Debug for dyn SpeechToText {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn SpeechToText")
    }
}

impl std::fmt::Debug for dyn LanguageModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn LanguageModel")
    }
}

impl std::fmt::Debug for dyn TextToSpeech {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn TextToSpeech")
    }
}

/// Environment lookup used during provider resolution. Production code
/// passes `std::env::var`; tests inject a map.
pub(crate) type EnvLookup<'a> = &'a dyn Fn(&str) -> Option<String>;

pub(crate) fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn require_key(env: EnvLookup<'_>, name: &str) -> Result<String, PipelineError> {
    env(name).ok_or_else(|| {
        PipelineError::Config(format!("missing environment variable {name}"))
    })
}

/// Supported speech-to-text providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SttKind {
    #[default]
    Deepgram,
}

/// Speech-to-text provider selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SttProvider {
    #[serde(default)]
    pub kind: SttKind,
    /// Provider model name.
    #[serde(default = "SttProvider::default_model")]
    pub model: String,
}

impl Default for SttProvider {
    fn default() -> Self {
        Self {
            kind: SttKind::Deepgram,
            model: Self::default_model(),
        }
    }
}

impl SttProvider {
    fn default_model() -> String {
        "nova-2-general".to_string()
    }

    pub fn with_model(model: impl Into<String>) -> Self {
        Self {
            kind: SttKind::Deepgram,
            model: model.into(),
        }
    }

    /// Resolves the configuration into a provider handle.
    ///
    /// # Errors
    ///
    /// `PipelineError::Config` when the provider's credential is missing.
    pub fn resolve(&self) -> Result<Box<dyn SpeechToText>, PipelineError> {
        self.resolve_with(&process_env)
    }

    pub(crate) fn resolve_with(
        &self,
        env: EnvLookup<'_>,
    ) -> Result<Box<dyn SpeechToText>, PipelineError> {
        match self.kind {
            SttKind::Deepgram => {
                let api_key = require_key(env, "DEEPGRAM_API_KEY")?;
                Ok(Box::new(DeepgramStt::new(api_key, &self.model)))
            }
        }
    }
}

/// Supported language-model providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmKind {
    #[default]
    OpenAi,
}

/// Language-model provider selection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LlmProvider {
    #[serde(default)]
    pub kind: LlmKind,
    /// Provider model name.
    #[serde(default = "LlmProvider::default_model")]
    pub model: String,
}

impl Default for LlmProvider {
    fn default() -> Self {
        Self {
            kind: LlmKind::OpenAi,
            model: Self::default_model(),
        }
    }
}

impl LlmProvider {
    fn default_model() -> String {
        "gpt-4o-mini".to_string()
    }

    pub fn with_model(model: impl Into<String>) -> Self {
        Self {
            kind: LlmKind::OpenAi,
            model: model.into(),
        }
    }

    /// Resolves the configuration into a provider handle.
    pub fn resolve(&self) -> Result<Box<dyn LanguageModel>, PipelineError> {
        self.resolve_with(&process_env)
    }

    pub(crate) fn resolve_with(
        &self,
        env: EnvLookup<'_>,
    ) -> Result<Box<dyn LanguageModel>, PipelineError> {
        match self.kind {
            LlmKind::OpenAi => {
                let api_key = require_key(env, "OPENAI_API_KEY")?;
                Ok(Box::new(OpenAiLlm::new(api_key, &self.model)))
            }
        }
    }
}

/// Supported speech-synthesis providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TtsKind {
    #[default]
    Cartesia,
}

/// Speech-synthesis provider selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TtsProvider {
    #[serde(default)]
    pub kind: TtsKind,
    /// Voice identifier; `None` uses the provider's default voice.
    #[serde(default)]
    pub voice: Option<String>,
}

impl TtsProvider {
    /// Resolves the configuration into a provider handle.
    pub fn resolve(&self) -> Result<Box<dyn TextToSpeech>, PipelineError> {
        self.resolve_with(&process_env)
    }

    pub(crate) fn resolve_with(
        &self,
        env: EnvLookup<'_>,
    ) -> Result<Box<dyn TextToSpeech>, PipelineError> {
        match self.kind {
            TtsKind::Cartesia => {
                let api_key = require_key(env, "CARTESIA_API_KEY")?;
                Ok(Box::new(CartesiaTts::new(api_key, self.voice.clone())))
            }
        }
    }
}
