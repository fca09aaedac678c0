use crate::chat::{ChatContext, ChatRole};
use crate::event::{AgentEvent, EventKind};
use crate::metrics::{AgentMetrics, UsageCollector};
use std::time::Duration;

#[test]
fn chat_context_append_preserves_order() {
    let ctx = ChatContext::new()
        .append(ChatRole::System, "persona")
        .append(ChatRole::User, "hello");

    assert_eq!(ctx.len(), 2);
    assert_eq!(ctx.messages()[0].role, ChatRole::System);
    assert_eq!(ctx.messages()[0].content, "persona");
    assert_eq!(ctx.last().unwrap().role, ChatRole::User);
    assert_eq!(ctx.last().unwrap().content, "hello");
}

#[test]
fn chat_context_push_matches_append() {
    let mut ctx = ChatContext::new();
    ctx.push(ChatRole::Assistant, "hi there");

    assert_eq!(ctx, ChatContext::new().append(ChatRole::Assistant, "hi there"));
}

#[test]
fn chat_role_labels_round_trip_through_serde() {
    let json = serde_json::to_string(&ChatRole::Assistant).unwrap();
    assert_eq!(json, "\"assistant\"");
    let role: ChatRole = serde_json::from_str("\"system\"").unwrap();
    assert_eq!(role, ChatRole::System);
}

#[test]
fn event_kind_matches_event_discriminant() {
    let event = AgentEvent::AgentStartedSpeaking {
        interruptible: false,
    };
    assert_eq!(event.kind(), EventKind::AgentStartedSpeaking);

    let event = AgentEvent::UserStoppedSpeaking { duration: None };
    assert_eq!(event.kind(), EventKind::UserStoppedSpeaking);
}

#[test]
fn event_kind_round_trips_as_str() {
    for kind in [
        EventKind::MetricsCollected,
        EventKind::UserStartedSpeaking,
        EventKind::UserStoppedSpeaking,
        EventKind::AgentStartedSpeaking,
        EventKind::AgentStoppedSpeaking,
    ] {
        let parsed: EventKind = kind.as_str().parse().unwrap();
        assert_eq!(parsed, kind);
    }

    assert!("agent_started_typing".parse::<EventKind>().is_err());
}

#[test]
fn usage_collector_accumulates_across_variants() {
    let collector = UsageCollector::new();

    collector.collect(&AgentMetrics::Llm {
        ttft: Duration::from_millis(120),
        duration: Duration::from_millis(800),
        prompt_tokens: 40,
        completion_tokens: 12,
    });
    collector.collect(&AgentMetrics::Llm {
        ttft: Duration::from_millis(90),
        duration: Duration::from_millis(500),
        prompt_tokens: 60,
        completion_tokens: 20,
    });
    collector.collect(&AgentMetrics::Tts {
        ttfb: Duration::from_millis(60),
        duration: Duration::from_millis(400),
        characters: 31,
    });
    collector.collect(&AgentMetrics::Stt {
        audio_duration: Duration::from_millis(2_500),
        duration: Duration::from_millis(300),
    });
    collector.collect(&AgentMetrics::EndOfUtterance {
        transcription_delay: Duration::from_millis(500),
    });

    let summary = collector.summary();
    assert_eq!(summary.llm_prompt_tokens, 100);
    assert_eq!(summary.llm_completion_tokens, 32);
    assert_eq!(summary.tts_characters, 31);
    assert_eq!(summary.stt_audio_ms, 2_500);
}

#[test]
fn metrics_serialise_with_stage_tag() {
    let metrics = AgentMetrics::EndOfUtterance {
        transcription_delay: Duration::from_millis(500),
    };
    let json = serde_json::to_value(&metrics).unwrap();
    assert_eq!(json["stage"], "end_of_utterance");
}
