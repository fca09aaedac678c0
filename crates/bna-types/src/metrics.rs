//! Per-stage metrics records and the in-memory usage collector.
//!
//! Each pipeline stage reports one record per turn. Records are logged as
//! structured tracing events and accumulated into a `UsageSummary` whose
//! lifetime is bounded to the session. Nothing is persisted or exported.

use serde::{Deserialize, Serialize};
use std::sync::Mutex;
use std::time::Duration;

/// A metrics record emitted by one pipeline stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "stage", rename_all = "snake_case")]
pub enum AgentMetrics {
    /// Speech recognition of one user turn.
    Stt {
        /// Length of the recognised audio segment.
        audio_duration: Duration,
        /// Wall-clock time spent in the recogniser.
        duration: Duration,
    },

    /// Language-model inference for one reply.
    Llm {
        /// Time to first token.
        ttft: Duration,
        /// Total inference time.
        duration: Duration,
        prompt_tokens: u64,
        completion_tokens: u64,
    },

    /// Speech synthesis of one agent utterance.
    Tts {
        /// Time to first byte of audio.
        ttfb: Duration,
        /// Total synthesis time.
        duration: Duration,
        /// Number of characters synthesised.
        characters: u64,
    },

    /// End-of-utterance decision for one user turn.
    EndOfUtterance {
        /// Endpointing delay applied between the user falling silent and
        /// the turn committing: the minimum window when the turn detector
        /// believed the turn complete, the maximum otherwise.
        transcription_delay: Duration,
    },
}

/// Logs a metrics record as a structured tracing event.
pub fn log_metrics(metrics: &AgentMetrics) {
    match metrics {
        AgentMetrics::Stt {
            audio_duration,
            duration,
        } => {
            tracing::info!(
                audio_duration_ms = audio_duration.as_millis() as u64,
                duration_ms = duration.as_millis() as u64,
                "STT metrics"
            );
        }
        AgentMetrics::Llm {
            ttft,
            duration,
            prompt_tokens,
            completion_tokens,
        } => {
            tracing::info!(
                ttft_ms = ttft.as_millis() as u64,
                duration_ms = duration.as_millis() as u64,
                prompt_tokens,
                completion_tokens,
                "LLM metrics"
            );
        }
        AgentMetrics::Tts {
            ttfb,
            duration,
            characters,
        } => {
            tracing::info!(
                ttfb_ms = ttfb.as_millis() as u64,
                duration_ms = duration.as_millis() as u64,
                characters,
                "TTS metrics"
            );
        }
        AgentMetrics::EndOfUtterance {
            transcription_delay,
        } => {
            tracing::info!(
                transcription_delay_ms = transcription_delay.as_millis() as u64,
                "EOU metrics"
            );
        }
    }
}

/// Running totals accumulated over one session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageSummary {
    pub llm_prompt_tokens: u64,
    pub llm_completion_tokens: u64,
    pub tts_characters: u64,
    /// Total recognised audio, in whole milliseconds.
    pub stt_audio_ms: u64,
}

/// Accumulates metrics records for the lifetime of a session.
///
/// Shared across event handlers via `Arc`; interior mutability keeps the
/// handler signature a plain `Fn`.
#[derive(Debug, Default)]
pub struct UsageCollector {
    summary: Mutex<UsageSummary>,
}

impl UsageCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Folds one record into the running totals.
    pub fn collect(&self, metrics: &AgentMetrics) {
        let mut summary = self.summary.lock().unwrap_or_else(|e| e.into_inner());
        match metrics {
            AgentMetrics::Stt { audio_duration, .. } => {
                summary.stt_audio_ms += audio_duration.as_millis() as u64;
            }
            AgentMetrics::Llm {
                prompt_tokens,
                completion_tokens,
                ..
            } => {
                summary.llm_prompt_tokens += prompt_tokens;
                summary.llm_completion_tokens += completion_tokens;
            }
            AgentMetrics::Tts { characters, .. } => {
                summary.tts_characters += characters;
            }
            AgentMetrics::EndOfUtterance { .. } => {}
        }
    }

    /// Snapshot of the totals so far.
    pub fn summary(&self) -> UsageSummary {
        *self.summary.lock().unwrap_or_else(|e| e.into_inner())
    }
}
