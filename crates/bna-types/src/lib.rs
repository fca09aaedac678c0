//! Shared types for the BNA voice agent.
//!
//! Defines the chat context exchanged with the language model, the closed
//! set of pipeline events an agent session can emit, and the metrics
//! records accumulated over a session. These types carry no I/O; the
//! transport and provider crates build on them.

pub mod chat;
pub mod event;
pub mod metrics;

pub use chat::{ChatContext, ChatMessage, ChatRole};
pub use event::{AgentEvent, EventKind, ParseEventKindError};
pub use metrics::{log_metrics, AgentMetrics, UsageCollector, UsageSummary};

#[cfg(test)]
mod tests;
