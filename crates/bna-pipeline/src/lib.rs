//! Voice pipeline for the BNA agent.
//!
//! Binds speech-to-text, a language model, speech synthesis, and a
//! turn detector into a conversational session. Providers are selected
//! through enumerated configuration structs and resolved, with credential
//! validation, into trait objects; the `VoicePipelineAgent` facade owns
//! the session's thresholds, callbacks, and event subscriptions and runs
//! the turn loop against a `RoomTransport`.

pub mod agent;
pub mod error;
pub mod providers;
pub mod turn;

pub use agent::{
    AgentOptions, BeforeLlmCallback, BeforeTtsCallback, EventHandler, VoicePipelineAgent,
};
pub use error::PipelineError;
pub use providers::{
    LanguageModel, LlmKind, LlmProvider, LlmReply, SpeechToText, SttKind, SttProvider,
    TextToSpeech, Transcript, TtsKind, TtsProvider,
};
pub use turn::{EouModel, TurnDetectorConfig};
