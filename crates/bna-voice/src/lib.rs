//! LiveKit room boundary for the BNA voice agent.
//!
//! Wraps the LiveKit server API behind the `RoomTransport` trait: joining a
//! room with a media-subscription mode, waiting for a remote participant,
//! and publishing synthesised audio. Humans speak over WebRTC; the agent
//! consumes endpointed speech segments from the transport and answers with
//! rendered audio.
//!
//! Also owns the process-scoped voice-activity-detection model handle that
//! the worker loads once at prewarm and shares with every job.

pub mod config;
pub mod error;
pub mod room;
pub mod vad;

pub use config::LiveKitConfig;
pub use error::VoiceError;
pub use room::{AutoSubscribe, LiveKitRoom, RemoteParticipant, RoomTransport, SpeechSegment};
pub use vad::{VadConfig, VadModel};
