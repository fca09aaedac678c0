//! Process-scoped voice-activity-detection model handle.
//!
//! The worker loads the model once at prewarm, before any job is accepted,
//! and hands the same handle to every job. Inference itself runs in the
//! media plane; this handle owns the model bytes and its parameters.

use crate::error::VoiceError;
use std::path::{Path, PathBuf};
use std::sync::Arc;

fn default_model_path() -> PathBuf {
    PathBuf::from("models/silero_vad.onnx")
}

/// Parameters for loading the VAD model.
#[derive(Debug, Clone)]
pub struct VadConfig {
    /// Path to the ONNX model file.
    pub model_path: PathBuf,
    /// Sample rate the model expects, in Hz.
    pub sample_rate: u32,
}

impl Default for VadConfig {
    fn default() -> Self {
        Self {
            model_path: default_model_path(),
            sample_rate: 16_000,
        }
    }
}

#[derive(Debug)]
struct VadInner {
    config: VadConfig,
    model_bytes: Vec<u8>,
}

/// A loaded VAD model, cheap to clone and share across jobs.
#[derive(Debug, Clone)]
pub struct VadModel {
    inner: Arc<VadInner>,
}

impl VadModel {
    /// Loads the model synchronously from disk.
    ///
    /// Runs once per process at prewarm; a missing or empty model file is
    /// fatal, since no job can run without VAD.
    pub fn load(config: VadConfig) -> Result<Self, VoiceError> {
        let model_bytes = std::fs::read(&config.model_path).map_err(|e| {
            VoiceError::Vad(format!(
                "failed to read VAD model at {}: {e}",
                config.model_path.display()
            ))
        })?;

        if model_bytes.is_empty() {
            return Err(VoiceError::Vad(format!(
                "VAD model at {} is empty",
                config.model_path.display()
            )));
        }

        tracing::info!(
            path = %config.model_path.display(),
            bytes = model_bytes.len(),
            sample_rate = config.sample_rate,
            "loaded VAD model"
        );

        Ok(Self {
            inner: Arc::new(VadInner {
                config,
                model_bytes,
            }),
        })
    }

    pub fn sample_rate(&self) -> u32 {
        self.inner.config.sample_rate
    }

    pub fn model_path(&self) -> &Path {
        &self.inner.config.model_path
    }

    /// Size of the loaded model in bytes.
    pub fn model_size(&self) -> usize {
        self.inner.model_bytes.len()
    }

    /// True when two handles share the same loaded model.
    pub fn same_model(&self, other: &VadModel) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}
