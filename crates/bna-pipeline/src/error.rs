use bna_voice::VoiceError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Provider error: {0}")]
    Provider(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Malformed provider response: {0}")]
    Response(String),

    #[error(transparent)]
    Voice(#[from] VoiceError),

    #[error("agent already started")]
    AlreadyStarted,

    #[error("agent not started")]
    NotStarted,
}
