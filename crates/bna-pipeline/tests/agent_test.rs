//! Behavioural tests for the pipeline agent facade: construction
//! invariants, event dispatch, callback semantics, and one full turn
//! against mocked providers and a mocked room transport.

use async_trait::async_trait;
use bna_pipeline::{
    AgentOptions, EouModel, LanguageModel, LlmReply, PipelineError, SpeechToText, TextToSpeech,
    Transcript, VoicePipelineAgent,
};
use bna_types::{AgentEvent, AgentMetrics, ChatContext, ChatRole, EventKind};
use bna_voice::{
    AutoSubscribe, RemoteParticipant, RoomTransport, SpeechSegment, VadConfig, VadModel,
    VoiceError,
};
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::broadcast;

fn test_vad() -> (tempfile::NamedTempFile, VadModel) {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(b"onnx-model-bytes").unwrap();
    let model = VadModel::load(VadConfig {
        model_path: file.path().to_path_buf(),
        sample_rate: 16_000,
    })
    .unwrap();
    (file, model)
}

fn participant() -> RemoteParticipant {
    RemoteParticipant {
        identity: "caller-1".to_string(),
        name: "Caller".to_string(),
    }
}

#[derive(Debug)]
struct MockRoom {
    published: Mutex<Vec<Vec<u8>>>,
    segment_tx: broadcast::Sender<SpeechSegment>,
}

impl MockRoom {
    fn new() -> Arc<Self> {
        let (segment_tx, _) = broadcast::channel(16);
        Arc::new(Self {
            published: Mutex::new(Vec::new()),
            segment_tx,
        })
    }

    fn published(&self) -> Vec<Vec<u8>> {
        self.published.lock().unwrap().clone()
    }

    fn speak(&self, audio: &[u8]) {
        let _ = self.segment_tx.send(SpeechSegment {
            audio: audio.to_vec(),
            duration: Duration::from_millis(800),
        });
    }
}

#[async_trait]
impl RoomTransport for MockRoom {
    fn room_name(&self) -> &str {
        "mock-room"
    }

    async fn connect(&self, _mode: AutoSubscribe) -> Result<(), VoiceError> {
        Ok(())
    }

    async fn wait_for_participant(&self) -> Result<RemoteParticipant, VoiceError> {
        Ok(participant())
    }

    async fn publish_audio(&self, pcm: &[u8]) -> Result<(), VoiceError> {
        self.published.lock().unwrap().push(pcm.to_vec());
        Ok(())
    }

    fn speech_segments(&self) -> broadcast::Receiver<SpeechSegment> {
        self.segment_tx.subscribe()
    }
}

struct MockStt {
    text: String,
}

#[async_trait]
impl SpeechToText for MockStt {
    async fn recognize(&self, _audio: &[u8]) -> Result<Transcript, PipelineError> {
        Ok(Transcript {
            text: self.text.clone(),
            confidence: Some(0.97),
        })
    }
}

struct MockLlm {
    reply: String,
    seen: Arc<Mutex<Vec<ChatContext>>>,
}

#[async_trait]
impl LanguageModel for MockLlm {
    async fn chat(&self, ctx: &ChatContext) -> Result<LlmReply, PipelineError> {
        self.seen.lock().unwrap().push(ctx.clone());
        Ok(LlmReply {
            content: self.reply.clone(),
            prompt_tokens: 10,
            completion_tokens: 5,
        })
    }
}

struct MockTts;

#[async_trait]
impl TextToSpeech for MockTts {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, PipelineError> {
        Ok(format!("pcm:{text}").into_bytes())
    }
}

fn base_options(vad: VadModel, stt_text: &str, reply: &str) -> (AgentOptions, Arc<Mutex<Vec<ChatContext>>>) {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let options = AgentOptions::new(
        vad,
        Box::new(MockStt {
            text: stt_text.to_string(),
        }),
        Box::new(MockLlm {
            reply: reply.to_string(),
            seen: seen.clone(),
        }),
        Box::new(MockTts),
        EouModel::default(),
        ChatContext::new().append(ChatRole::System, "persona"),
    );
    (options, seen)
}

async fn wait_until(mut check: impl FnMut() -> bool) {
    for _ in 0..200 {
        if check() {
            return;
        }
        tokio::time::sleep(Duration::from_millis(25)).await;
    }
    panic!("condition not reached within 5s");
}

#[test]
fn default_thresholds_match_the_session_contract() {
    let (_file, vad) = test_vad();
    let (options, _) = base_options(vad, "hello", "hi");
    let agent = VoicePipelineAgent::new(options).unwrap();

    assert_eq!(agent.min_endpointing_delay(), Duration::from_millis(500));
    assert_eq!(agent.max_endpointing_delay(), Duration::from_secs(5));
    assert!(agent.allow_interruptions());
    assert_eq!(agent.interrupt_min_words(), 0);
    assert_eq!(agent.interrupt_speech_duration(), None);
}

#[test]
fn construction_rejects_inverted_endpointing_window() {
    let (_file, vad) = test_vad();
    let (mut options, _) = base_options(vad, "hello", "hi");
    options.min_endpointing_delay = Duration::from_secs(6);

    let err = VoicePipelineAgent::new(options).unwrap_err();
    assert!(matches!(err, PipelineError::Config(_)));
}

#[tokio::test]
async fn say_runs_pre_tts_callback_and_publishes() {
    let (_file, vad) = test_vad();
    let (mut options, _) = base_options(vad, "hello", "hi");

    let tts_inputs = Arc::new(Mutex::new(Vec::<String>::new()));
    let seen = tts_inputs.clone();
    options.before_tts_cb = Some(Arc::new(move |text: String| {
        seen.lock().unwrap().push(text.clone());
        text
    }));

    let agent = VoicePipelineAgent::new(options).unwrap();
    let room = MockRoom::new();
    agent
        .start(room.clone() as Arc<dyn RoomTransport>, &participant())
        .unwrap();

    let events = Arc::new(Mutex::new(Vec::<AgentEvent>::new()));
    let sink = events.clone();
    agent.subscribe(EventKind::AgentStartedSpeaking, move |event| {
        sink.lock().unwrap().push(event.clone());
    });

    agent.say("Hello there", false).await.unwrap();

    assert_eq!(tts_inputs.lock().unwrap().as_slice(), ["Hello there"]);
    assert_eq!(room.published(), vec![b"pcm:Hello there".to_vec()]);

    let events = events.lock().unwrap();
    assert!(matches!(
        events.as_slice(),
        [AgentEvent::AgentStartedSpeaking {
            interruptible: false
        }]
    ));

    agent.close();
}

#[tokio::test]
async fn say_before_start_is_an_error() {
    let (_file, vad) = test_vad();
    let (options, _) = base_options(vad, "hello", "hi");
    let agent = VoicePipelineAgent::new(options).unwrap();

    let err = agent.say("too early", true).await.unwrap_err();
    assert!(matches!(err, PipelineError::NotStarted));
}

#[tokio::test]
async fn start_twice_is_an_error() {
    let (_file, vad) = test_vad();
    let (options, _) = base_options(vad, "hello", "hi");
    let agent = VoicePipelineAgent::new(options).unwrap();
    let room = MockRoom::new();

    agent
        .start(room.clone() as Arc<dyn RoomTransport>, &participant())
        .unwrap();
    let err = agent
        .start(room as Arc<dyn RoomTransport>, &participant())
        .unwrap_err();
    assert!(matches!(err, PipelineError::AlreadyStarted));

    agent.close();
}

#[tokio::test]
async fn one_turn_flows_from_segment_to_spoken_reply() {
    let (_file, vad) = test_vad();
    let (mut options, llm_seen) = base_options(vad, "What is on the menu today?", "We have soup.");
    // Keep the endpointing window short so the test completes quickly.
    options.min_endpointing_delay = Duration::from_millis(10);

    let agent = VoicePipelineAgent::new(options).unwrap();
    let room = MockRoom::new();

    let events = Arc::new(Mutex::new(Vec::<EventKind>::new()));
    let sink = events.clone();
    for kind in [
        EventKind::MetricsCollected,
        EventKind::UserStartedSpeaking,
        EventKind::UserStoppedSpeaking,
        EventKind::AgentStartedSpeaking,
        EventKind::AgentStoppedSpeaking,
    ] {
        let sink = sink.clone();
        agent.subscribe(kind, move |event| {
            sink.lock().unwrap().push(event.kind());
        });
    }

    agent
        .start(room.clone() as Arc<dyn RoomTransport>, &participant())
        .unwrap();

    room.speak(b"fake-pcm");
    wait_until(|| !room.published().is_empty()).await;

    assert_eq!(room.published(), vec![b"pcm:We have soup.".to_vec()]);

    // The LLM saw the seeded persona plus the recognised user turn.
    let seen = llm_seen.lock().unwrap();
    assert_eq!(seen.len(), 1);
    let messages = seen[0].messages();
    assert_eq!(messages[0].role, ChatRole::System);
    assert_eq!(messages[1].role, ChatRole::User);
    assert_eq!(messages[1].content, "What is on the menu today?");
    drop(seen);

    // Both sides of the exchange landed in the chat context.
    let chat = agent.chat_ctx().await;
    assert_eq!(chat.last().unwrap().role, ChatRole::Assistant);
    assert_eq!(chat.last().unwrap().content, "We have soup.");

    // Speech-state events arrived in conversational order.
    let events = events.lock().unwrap();
    let speech: Vec<EventKind> = events
        .iter()
        .copied()
        .filter(|k| *k != EventKind::MetricsCollected)
        .collect();
    assert_eq!(
        speech,
        vec![
            EventKind::UserStartedSpeaking,
            EventKind::UserStoppedSpeaking,
            EventKind::AgentStartedSpeaking,
            EventKind::AgentStoppedSpeaking,
        ]
    );
    assert!(events.contains(&EventKind::MetricsCollected));
    drop(events);

    agent.close();
}

#[tokio::test]
async fn eou_metric_reports_the_applied_endpointing_delay() {
    let (_file, vad) = test_vad();
    let (mut options, _) = base_options(vad, "Is the kitchen open?", "Yes.");
    options.min_endpointing_delay = Duration::from_millis(10);

    let agent = VoicePipelineAgent::new(options).unwrap();
    let room = MockRoom::new();

    let delays = Arc::new(Mutex::new(Vec::<Duration>::new()));
    let sink = delays.clone();
    agent.subscribe(EventKind::MetricsCollected, move |event| {
        if let AgentEvent::MetricsCollected(AgentMetrics::EndOfUtterance {
            transcription_delay,
        }) = event
        {
            sink.lock().unwrap().push(*transcription_delay);
        }
    });

    agent
        .start(room.clone() as Arc<dyn RoomTransport>, &participant())
        .unwrap();

    room.speak(b"fake-pcm");
    wait_until(|| !room.published().is_empty()).await;

    // The trailing "?" commits the turn, so the minimum window applies.
    assert_eq!(
        delays.lock().unwrap().as_slice(),
        [Duration::from_millis(10)]
    );

    agent.close();
}

#[tokio::test]
async fn before_llm_callback_can_replace_the_context_without_mutating_it() {
    let (_file, vad) = test_vad();
    let (mut options, llm_seen) = base_options(vad, "hello", "hi");
    options.min_endpointing_delay = Duration::from_millis(10);

    let observed = Arc::new(Mutex::new(Vec::<String>::new()));
    let sink = observed.clone();
    options.before_llm_cb = Some(Arc::new(move |ctx: &ChatContext| {
        sink.lock()
            .unwrap()
            .push(ctx.last().map(|m| m.content.clone()).unwrap_or_default());
        Some(ChatContext::new().append(ChatRole::System, "replacement"))
    }));

    let agent = VoicePipelineAgent::new(options).unwrap();
    let room = MockRoom::new();
    agent
        .start(room.clone() as Arc<dyn RoomTransport>, &participant())
        .unwrap();

    room.speak(b"fake-pcm");
    wait_until(|| !room.published().is_empty()).await;

    // The callback observed the real last message...
    assert_eq!(observed.lock().unwrap().as_slice(), ["hello"]);

    // ...the LLM got the replacement...
    let seen = llm_seen.lock().unwrap();
    assert_eq!(seen[0].len(), 1);
    assert_eq!(seen[0].last().unwrap().content, "replacement");
    drop(seen);

    // ...and the session's own context was not mutated by the callback.
    let chat = agent.chat_ctx().await;
    assert_eq!(chat.messages()[1].content, "hello");

    agent.close();
}
