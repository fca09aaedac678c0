//! The voice pipeline agent facade.
//!
//! Owns the session's provider handles, numeric thresholds, lifecycle
//! callbacks, and the observer table for the closed set of pipeline
//! events. Providers and thresholds are fixed at construction for the
//! lifetime of the session. `start` binds the agent to a room and a
//! discovered participant and spawns the turn loop; `say` renders one
//! agent utterance.

use crate::error::PipelineError;
use crate::providers::{LanguageModel, SpeechToText, TextToSpeech};
use crate::turn::EouModel;
use bna_types::{AgentEvent, AgentMetrics, ChatContext, ChatRole, EventKind};
use bna_voice::{RemoteParticipant, RoomTransport, SpeechSegment, VadModel};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex as StdMutex, RwLock};
use std::time::{Duration, Instant};
use tokio::sync::{broadcast, Mutex};
use tokio::task::JoinHandle;

/// Minimum endpointing delay, applied when the turn detector believes the
/// user has finished their turn.
pub const DEFAULT_MIN_ENDPOINTING_DELAY: Duration = Duration::from_millis(500);

/// Maximum endpointing delay, applied when the turn detector does not
/// believe the user is done.
pub const DEFAULT_MAX_ENDPOINTING_DELAY: Duration = Duration::from_secs(5);

/// Callback run before each LLM call. Receives the evolving chat context;
/// returning `Some` replaces the context for that call only.
pub type BeforeLlmCallback = Arc<dyn Fn(&ChatContext) -> Option<ChatContext> + Send + Sync>;

/// Callback run before each TTS call; may rewrite the text to synthesise
/// (pronunciation fix-ups and similar).
pub type BeforeTtsCallback = Arc<dyn Fn(String) -> String + Send + Sync>;

/// Handler attached to one event kind.
pub type EventHandler = Box<dyn Fn(&AgentEvent) + Send + Sync>;

/// Immutable-at-construction configuration of a pipeline agent.
pub struct AgentOptions {
    pub vad: VadModel,
    pub stt: Box<dyn SpeechToText>,
    pub llm: Box<dyn LanguageModel>,
    pub tts: Box<dyn TextToSpeech>,
    pub turn_detector: EouModel,
    pub min_endpointing_delay: Duration,
    pub max_endpointing_delay: Duration,
    /// Whether the agent can be interrupted by user speech.
    pub allow_interruptions: bool,
    /// Minimum number of recognised words before an interruption counts.
    pub interrupt_min_words: usize,
    /// Minimum duration of user speech to count as an interruption.
    /// `None` leaves the framework default in place.
    pub interrupt_speech_duration: Option<Duration>,
    /// Initial chat context, seeded with the system persona message.
    pub chat_ctx: ChatContext,
    pub before_llm_cb: Option<BeforeLlmCallback>,
    pub before_tts_cb: Option<BeforeTtsCallback>,
}

impl AgentOptions {
    /// Creates options with the session defaults: 0.5 s / 5.0 s
    /// endpointing delays, interruptions allowed, zero-word interruption
    /// threshold, no callbacks.
    pub fn new(
        vad: VadModel,
        stt: Box<dyn SpeechToText>,
        llm: Box<dyn LanguageModel>,
        tts: Box<dyn TextToSpeech>,
        turn_detector: EouModel,
        chat_ctx: ChatContext,
    ) -> Self {
        Self {
            vad,
            stt,
            llm,
            tts,
            turn_detector,
            min_endpointing_delay: DEFAULT_MIN_ENDPOINTING_DELAY,
            max_endpointing_delay: DEFAULT_MAX_ENDPOINTING_DELAY,
            allow_interruptions: true,
            interrupt_min_words: 0,
            interrupt_speech_duration: None,
            chat_ctx,
            before_llm_cb: None,
            before_tts_cb: None,
        }
    }

    fn validate(&self) -> Result<(), PipelineError> {
        if self.min_endpointing_delay > self.max_endpointing_delay {
            return Err(PipelineError::Config(format!(
                "min_endpointing_delay ({:?}) exceeds max_endpointing_delay ({:?})",
                self.min_endpointing_delay, self.max_endpointing_delay
            )));
        }
        Ok(())
    }
}

struct Shared {
    vad: VadModel,
    stt: Box<dyn SpeechToText>,
    llm: Box<dyn LanguageModel>,
    tts: Box<dyn TextToSpeech>,
    turn_detector: EouModel,
    min_endpointing_delay: Duration,
    max_endpointing_delay: Duration,
    allow_interruptions: bool,
    interrupt_min_words: usize,
    interrupt_speech_duration: Option<Duration>,
    before_llm_cb: Option<BeforeLlmCallback>,
    before_tts_cb: Option<BeforeTtsCallback>,
    chat: Mutex<ChatContext>,
    handlers: RwLock<HashMap<EventKind, Vec<EventHandler>>>,
    room: RwLock<Option<Arc<dyn RoomTransport>>>,
    started: AtomicBool,
}

impl Shared {
    fn emit(&self, event: &AgentEvent) {
        tracing::debug!(kind = %event.kind(), "pipeline event");
        let handlers = self.handlers.read().unwrap_or_else(|e| e.into_inner());
        if let Some(list) = handlers.get(&event.kind()) {
            for handler in list {
                handler(event);
            }
        }
    }

    fn current_room(&self) -> Result<Arc<dyn RoomTransport>, PipelineError> {
        self.room
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
            .ok_or(PipelineError::NotStarted)
    }

    /// Picks the endpointing delay for the current turn.
    fn endpointing_delay(&self, ctx: &ChatContext) -> Duration {
        if self.turn_detector.likely_end_of_turn(ctx) {
            self.min_endpointing_delay
        } else {
            self.max_endpointing_delay
        }
    }

    async fn say(&self, text: &str, interruptible: bool) -> Result<(), PipelineError> {
        let room = self.current_room()?;

        let text = match &self.before_tts_cb {
            Some(cb) => cb(text.to_string()),
            None => text.to_string(),
        };

        let started = Instant::now();
        let audio = self.tts.synthesize(&text).await?;
        let ttfb = started.elapsed();

        self.emit(&AgentEvent::AgentStartedSpeaking { interruptible });
        room.publish_audio(&audio).await?;
        self.emit(&AgentEvent::AgentStoppedSpeaking { interrupted: false });

        self.emit(&AgentEvent::MetricsCollected(AgentMetrics::Tts {
            ttfb,
            duration: started.elapsed(),
            characters: text.chars().count() as u64,
        }));
        Ok(())
    }
}

/// One conversational session: providers, thresholds, callbacks, and the
/// turn loop binding them to a room.
pub struct VoicePipelineAgent {
    shared: Arc<Shared>,
    task: StdMutex<Option<JoinHandle<()>>>,
}

impl std::fmt::Debug for VoicePipelineAgent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VoicePipelineAgent").finish_non_exhaustive()
    }
}

impl VoicePipelineAgent {
    /// Validates the options and builds the agent.
    pub fn new(options: AgentOptions) -> Result<Self, PipelineError> {
        options.validate()?;
        let AgentOptions {
            vad,
            stt,
            llm,
            tts,
            turn_detector,
            min_endpointing_delay,
            max_endpointing_delay,
            allow_interruptions,
            interrupt_min_words,
            interrupt_speech_duration,
            chat_ctx,
            before_llm_cb,
            before_tts_cb,
        } = options;

        Ok(Self {
            shared: Arc::new(Shared {
                vad,
                stt,
                llm,
                tts,
                turn_detector,
                min_endpointing_delay,
                max_endpointing_delay,
                allow_interruptions,
                interrupt_min_words,
                interrupt_speech_duration,
                before_llm_cb,
                before_tts_cb,
                chat: Mutex::new(chat_ctx),
                handlers: RwLock::new(HashMap::new()),
                room: RwLock::new(None),
                started: AtomicBool::new(false),
            }),
            task: StdMutex::new(None),
        })
    }

    pub fn min_endpointing_delay(&self) -> Duration {
        self.shared.min_endpointing_delay
    }

    pub fn max_endpointing_delay(&self) -> Duration {
        self.shared.max_endpointing_delay
    }

    pub fn allow_interruptions(&self) -> bool {
        self.shared.allow_interruptions
    }

    pub fn interrupt_min_words(&self) -> usize {
        self.shared.interrupt_min_words
    }

    pub fn interrupt_speech_duration(&self) -> Option<Duration> {
        self.shared.interrupt_speech_duration
    }

    pub fn vad(&self) -> &VadModel {
        &self.shared.vad
    }

    /// Snapshot of the current chat context.
    pub async fn chat_ctx(&self) -> ChatContext {
        self.shared.chat.lock().await.clone()
    }

    /// Attaches a handler to one event kind.
    ///
    /// Handlers run synchronously on the emitting task, in registration
    /// order; they must not block.
    pub fn subscribe<F>(&self, kind: EventKind, handler: F)
    where
        F: Fn(&AgentEvent) + Send + Sync + 'static,
    {
        let mut handlers = self
            .shared
            .handlers
            .write()
            .unwrap_or_else(|e| e.into_inner());
        handlers.entry(kind).or_default().push(Box::new(handler));
    }

    /// Binds the agent to the room and participant and spawns the turn loop.
    pub fn start(
        &self,
        room: Arc<dyn RoomTransport>,
        participant: &RemoteParticipant,
    ) -> Result<(), PipelineError> {
        if self.shared.started.swap(true, Ordering::SeqCst) {
            return Err(PipelineError::AlreadyStarted);
        }

        tracing::info!(
            room = %room.room_name(),
            participant = %participant.identity,
            "starting voice pipeline agent"
        );

        let segments = room.speech_segments();
        *self.shared.room.write().unwrap_or_else(|e| e.into_inner()) = Some(room);

        let shared = self.shared.clone();
        let handle = tokio::spawn(async move {
            turn_loop(shared, segments).await;
        });
        *self.task.lock().unwrap_or_else(|e| e.into_inner()) = Some(handle);
        Ok(())
    }

    /// Speaks one utterance.
    ///
    /// Runs the pre-TTS callback, synthesises, publishes to the room, and
    /// emits the agent speech events and TTS metrics. An utterance sent
    /// with `allow_interruptions = false` is never cut short by user
    /// speech.
    pub async fn say(
        &self,
        text: &str,
        allow_interruptions: bool,
    ) -> Result<(), PipelineError> {
        self.shared.say(text, allow_interruptions).await
    }

    /// Stops the turn loop. Framework-managed transport resources are
    /// released by the worker runtime, not here.
    pub fn close(&self) {
        if let Some(handle) = self.task.lock().unwrap_or_else(|e| e.into_inner()).take() {
            handle.abort();
        }
    }
}

/// Drives the session: consumes endpointed user speech, applies the
/// endpointing window, and runs STT → LLM → TTS between the callbacks.
///
/// Provider or transport failures terminate the loop; nothing is retried
/// locally. The worker runtime observes the job's end.
async fn turn_loop(shared: Arc<Shared>, mut segments: broadcast::Receiver<SpeechSegment>) {
    loop {
        let segment = match segments.recv().await {
            Ok(segment) => segment,
            Err(broadcast::error::RecvError::Lagged(skipped)) => {
                tracing::warn!(skipped, "speech segments lagged, dropping");
                continue;
            }
            Err(broadcast::error::RecvError::Closed) => {
                tracing::info!("speech segment feed closed, ending session");
                return;
            }
        };

        shared.emit(&AgentEvent::UserStartedSpeaking);

        let recognise_started = Instant::now();
        let transcript = match shared.stt.recognize(&segment.audio).await {
            Ok(transcript) => transcript,
            Err(e) => {
                tracing::error!(error = %e, "speech recognition failed, ending session");
                return;
            }
        };

        shared.emit(&AgentEvent::UserStoppedSpeaking {
            duration: Some(segment.duration),
        });
        shared.emit(&AgentEvent::MetricsCollected(AgentMetrics::Stt {
            audio_duration: segment.duration,
            duration: recognise_started.elapsed(),
        }));

        if transcript.text.trim().is_empty() {
            continue;
        }

        let ctx_after_user = {
            let mut chat = shared.chat.lock().await;
            chat.push(ChatRole::User, transcript.text);
            chat.clone()
        };

        let delay = shared.endpointing_delay(&ctx_after_user);
        shared.emit(&AgentEvent::MetricsCollected(AgentMetrics::EndOfUtterance {
            transcription_delay: delay,
        }));
        tokio::time::sleep(delay).await;

        let llm_ctx = match &shared.before_llm_cb {
            Some(cb) => cb(&ctx_after_user).unwrap_or(ctx_after_user),
            None => ctx_after_user,
        };

        let inference_started = Instant::now();
        let reply = match shared.llm.chat(&llm_ctx).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!(error = %e, "language model call failed, ending session");
                return;
            }
        };
        let inference_duration = inference_started.elapsed();

        shared.emit(&AgentEvent::MetricsCollected(AgentMetrics::Llm {
            // Non-streaming call: the first token lands with the body.
            ttft: inference_duration,
            duration: inference_duration,
            prompt_tokens: reply.prompt_tokens,
            completion_tokens: reply.completion_tokens,
        }));

        shared
            .chat
            .lock()
            .await
            .push(ChatRole::Assistant, reply.content.clone());

        if let Err(e) = shared.say(&reply.content, shared.allow_interruptions).await {
            tracing::error!(error = %e, "utterance failed, ending session");
            return;
        }
    }
}
