use bna_pipeline::PipelineError;
use bna_voice::VoiceError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WorkerError {
    #[error(transparent)]
    Voice(#[from] VoiceError),

    #[error(transparent)]
    Pipeline(#[from] PipelineError),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Prewarm failed: {0}")]
    Prewarm(String),

    #[error("Job failed: {0}")]
    Job(String),
}
