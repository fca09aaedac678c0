//! Chat context types.
//!
//! A `ChatContext` is the ordered message history handed to the language
//! model on every turn. The session entrypoint seeds it with a single
//! system message holding the agent persona; the pipeline appends user and
//! assistant messages as the conversation progresses.

use serde::{Deserialize, Serialize};

/// Role tag of a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatRole {
    /// Persona and behavioural instructions.
    System,
    /// Transcribed participant speech.
    User,
    /// Language-model replies spoken by the agent.
    Assistant,
}

impl ChatRole {
    /// Returns the canonical wire label for this role.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::System => "system",
            Self::User => "user",
            Self::Assistant => "assistant",
        }
    }
}

impl std::fmt::Display for ChatRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single role-tagged message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn new(role: ChatRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// Ordered sequence of role-tagged messages.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatContext {
    messages: Vec<ChatMessage>,
}

impl ChatContext {
    /// Creates an empty context.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a message and returns the context, for builder-style seeding.
    pub fn append(mut self, role: ChatRole, content: impl Into<String>) -> Self {
        self.messages.push(ChatMessage::new(role, content));
        self
    }

    /// Appends a message in place.
    pub fn push(&mut self, role: ChatRole, content: impl Into<String>) {
        self.messages.push(ChatMessage::new(role, content));
    }

    /// All messages, oldest first.
    pub fn messages(&self) -> &[ChatMessage] {
        &self.messages
    }

    /// The most recently appended message, if any.
    pub fn last(&self) -> Option<&ChatMessage> {
        self.messages.last()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
