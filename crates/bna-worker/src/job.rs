//! Per-job context and process-wide prewarmed resources.
//!
//! Prewarmed resources are an explicit typed bundle produced once by the
//! prewarm hook and injected into every job context at dispatch time;
//! there is no ambient process-global store. Prewarm strictly precedes
//! job dispatch, so jobs only ever read the bundle.

use bna_voice::{AutoSubscribe, RemoteParticipant, RoomTransport, VadModel, VoiceError};
use std::sync::Arc;

/// Resources loaded once per worker process, before any job is accepted.
#[derive(Debug, Clone)]
pub struct PrewarmedResources {
    /// The voice-activity-detection model shared by every job.
    pub vad: VadModel,
}

impl PrewarmedResources {
    pub fn new(vad: VadModel) -> Self {
        Self { vad }
    }
}

/// One active connection to a room, owned by the worker runtime for the
/// duration of a job and handed to the entrypoint.
#[derive(Clone)]
pub struct JobContext {
    room: Arc<dyn RoomTransport>,
    resources: Arc<PrewarmedResources>,
}

impl JobContext {
    pub fn new(room: Arc<dyn RoomTransport>, resources: Arc<PrewarmedResources>) -> Self {
        Self { room, resources }
    }

    /// The room transport this job is bound to.
    pub fn room(&self) -> Arc<dyn RoomTransport> {
        self.room.clone()
    }

    pub fn room_name(&self) -> &str {
        self.room.room_name()
    }

    /// The process-wide prewarmed resources.
    pub fn resources(&self) -> &PrewarmedResources {
        &self.resources
    }

    /// Joins the room with the given subscription mode.
    pub async fn connect(&self, mode: AutoSubscribe) -> Result<(), VoiceError> {
        self.room.connect(mode).await
    }

    /// Suspends until a remote participant is present in the room.
    pub async fn wait_for_participant(&self) -> Result<RemoteParticipant, VoiceError> {
        self.room.wait_for_participant().await
    }
}
