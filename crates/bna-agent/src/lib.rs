//! The BNA voice assistant shell.
//!
//! Composes the worker runtime, the LiveKit room boundary, and the voice
//! pipeline into one job: join a room audio-only, wait for a caller,
//! build the pipeline agent with the deployed providers and thresholds,
//! register the logging event handlers, start the session, and greet.
//! Endpointing, VAD, and streaming coordination live in the pipeline and
//! media plane; this crate only wires and observes.

use bna_pipeline::{
    AgentOptions, EouModel, LlmProvider, SttProvider, TtsProvider, VoicePipelineAgent,
};
use bna_types::{log_metrics, AgentEvent, ChatContext, ChatRole, EventKind, UsageCollector};
use bna_voice::{AutoSubscribe, RemoteParticipant, VadConfig, VadModel};
use bna_worker::{JobContext, PrewarmedResources, WorkerError};
use std::sync::Arc;

/// System persona seeded into every session's chat context.
pub const PERSONA: &str = "You are a voice assistant called BNA. Your interface with users \
     will be voice. You should use short and concise responses, and avoiding usage of \
     unpronouncable punctuation.";

/// Greeting spoken once the session starts.
pub const GREETING: &str = "Hey, how can I help you today?";

/// STT model served to every job.
const STT_MODEL: &str = "nova-2-general";

/// LLM model served to every job.
const LLM_MODEL: &str = "gpt-4o-mini";

/// Loads the VAD model once per worker process.
///
/// Runs before any job is accepted; a failure here is fatal to the
/// worker, since no session can run without VAD.
pub fn prewarm() -> Result<PrewarmedResources, WorkerError> {
    let vad = VadModel::load(VadConfig::default())?;
    Ok(PrewarmedResources::new(vad))
}

/// The chat context every session starts from: exactly one system
/// message carrying the persona.
pub fn initial_chat_context() -> ChatContext {
    ChatContext::new().append(ChatRole::System, PERSONA)
}

/// Logs the most recent message on its way to the LLM. Pass-through: the
/// context is never modified here.
pub fn before_llm(chat_ctx: &ChatContext) -> Option<ChatContext> {
    if let Some(message) = chat_ctx.last() {
        tracing::info!(content = %message.content, "STT -> LLM");
    }
    None
}

/// Logs text on its way to synthesis and returns it unchanged.
/// Pronunciation fix-ups would slot in here.
pub fn before_tts(text: String) -> String {
    tracing::info!(text = %text, "LLM -> TTS");
    text
}

/// Connects to the room audio-only, then waits for the first remote
/// participant. Connection strictly precedes the wait; neither step is
/// retried locally.
pub async fn join(ctx: &JobContext) -> Result<RemoteParticipant, WorkerError> {
    tracing::info!(room = %ctx.room_name(), "connecting to room");
    ctx.connect(AutoSubscribe::AudioOnly).await?;

    let participant = ctx.wait_for_participant().await?;
    tracing::info!(
        identity = %participant.identity,
        "starting voice assistant for participant"
    );
    Ok(participant)
}

/// Builds the session's agent options: the prewarmed VAD model, the
/// deployed providers, the endpointing window, and the two callbacks.
///
/// Provider credentials are validated here, so a missing API key fails
/// the job before anything is started.
pub fn agent_options(
    resources: &PrewarmedResources,
    chat_ctx: ChatContext,
) -> Result<AgentOptions, WorkerError> {
    let stt = SttProvider::with_model(STT_MODEL).resolve()?;
    let llm = LlmProvider::with_model(LLM_MODEL).resolve()?;
    let tts = TtsProvider::default().resolve()?;

    let mut options = AgentOptions::new(
        resources.vad.clone(),
        stt,
        llm,
        tts,
        EouModel::default(),
        chat_ctx,
    );
    options.before_llm_cb = Some(Arc::new(before_llm));
    options.before_tts_cb = Some(Arc::new(before_tts));
    Ok(options)
}

/// Attaches the five logging handlers: metrics (logged and folded into
/// the usage collector) and the four speech-state transitions.
pub fn register_event_handlers(agent: &VoicePipelineAgent, usage: Arc<UsageCollector>) {
    agent.subscribe(EventKind::MetricsCollected, move |event| {
        if let AgentEvent::MetricsCollected(metrics) = event {
            log_metrics(metrics);
            usage.collect(metrics);
        }
    });
    agent.subscribe(EventKind::UserStartedSpeaking, |_| {
        tracing::info!("user started speaking");
    });
    agent.subscribe(EventKind::UserStoppedSpeaking, |_| {
        tracing::info!("user stopped speaking");
    });
    agent.subscribe(EventKind::AgentStartedSpeaking, |_| {
        tracing::info!("agent started speaking");
    });
    agent.subscribe(EventKind::AgentStoppedSpeaking, |_| {
        tracing::info!("agent stopped speaking");
    });
}

/// Builds the pipeline agent and attaches the logging event handlers.
/// Nothing is started; further subscriptions can be added before the
/// session runs.
pub fn create_agent(options: AgentOptions) -> Result<VoicePipelineAgent, WorkerError> {
    let agent = VoicePipelineAgent::new(options)?;

    let usage = Arc::new(UsageCollector::new());
    register_event_handlers(&agent, usage);
    Ok(agent)
}

/// Starts the agent for a discovered participant, then greets. The
/// greeting is never interruptible.
pub async fn run_session(
    ctx: &JobContext,
    participant: &RemoteParticipant,
    agent: &VoicePipelineAgent,
) -> Result<(), WorkerError> {
    agent.start(ctx.room(), participant)?;
    agent.say(GREETING, false).await?;
    Ok(())
}

/// Per-job entrypoint registered with the worker runtime.
pub async fn entrypoint(ctx: JobContext) -> Result<(), WorkerError> {
    let initial_ctx = initial_chat_context();

    let participant = join(&ctx).await?;
    let options = agent_options(ctx.resources(), initial_ctx)?;
    let agent = create_agent(options)?;
    run_session(&ctx, &participant, &agent).await?;
    Ok(())
}
