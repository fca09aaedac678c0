//! Pipeline event types.
//!
//! A session emits events from a closed set: one metrics event plus the
//! four speech-state transitions (user/agent × started/stopped). Each
//! variant carries its payload explicitly; optional data is an optional
//! field, never an untyped blob. `EventKind` is the fieldless discriminant
//! used as the subscription key of the agent's observer table.

use crate::metrics::AgentMetrics;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// An event emitted by a running pipeline agent.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum AgentEvent {
    /// A metrics record was produced by one of the pipeline stages.
    MetricsCollected(AgentMetrics),

    /// The remote participant began speaking.
    UserStartedSpeaking,

    /// The remote participant stopped speaking.
    UserStoppedSpeaking {
        /// Length of the speech segment, when the transport reports it.
        duration: Option<Duration>,
    },

    /// The agent began speaking an utterance.
    AgentStartedSpeaking {
        /// Whether this utterance may be interrupted by user speech.
        interruptible: bool,
    },

    /// The agent finished (or was cut off mid-) utterance.
    AgentStoppedSpeaking {
        /// True when the utterance was cut short by an interruption.
        interrupted: bool,
    },
}

impl AgentEvent {
    /// Returns the discriminant used for subscription dispatch.
    pub fn kind(&self) -> EventKind {
        match self {
            Self::MetricsCollected(_) => EventKind::MetricsCollected,
            Self::UserStartedSpeaking => EventKind::UserStartedSpeaking,
            Self::UserStoppedSpeaking { .. } => EventKind::UserStoppedSpeaking,
            Self::AgentStartedSpeaking { .. } => EventKind::AgentStartedSpeaking,
            Self::AgentStoppedSpeaking { .. } => EventKind::AgentStoppedSpeaking,
        }
    }
}

/// Discriminants of `AgentEvent`, the closed set of subscribable channels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    MetricsCollected,
    UserStartedSpeaking,
    UserStoppedSpeaking,
    AgentStartedSpeaking,
    AgentStoppedSpeaking,
}

impl EventKind {
    /// Returns the canonical string label for this event kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MetricsCollected => "metrics_collected",
            Self::UserStartedSpeaking => "user_started_speaking",
            Self::UserStoppedSpeaking => "user_stopped_speaking",
            Self::AgentStartedSpeaking => "agent_started_speaking",
            Self::AgentStoppedSpeaking => "agent_stopped_speaking",
        }
    }
}

impl std::fmt::Display for EventKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for EventKind {
    type Err = ParseEventKindError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "metrics_collected" => Ok(Self::MetricsCollected),
            "user_started_speaking" => Ok(Self::UserStartedSpeaking),
            "user_stopped_speaking" => Ok(Self::UserStoppedSpeaking),
            "agent_started_speaking" => Ok(Self::AgentStartedSpeaking),
            "agent_stopped_speaking" => Ok(Self::AgentStoppedSpeaking),
            _ => Err(ParseEventKindError(s.to_string())),
        }
    }
}

/// Error returned when parsing an unknown event kind string.
#[derive(Debug, Clone)]
pub struct ParseEventKindError(pub String);

impl std::fmt::Display for ParseEventKindError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "unknown event kind: {}", self.0)
    }
}

impl std::error::Error for ParseEventKindError {}
