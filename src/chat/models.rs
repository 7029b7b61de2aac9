//! The core models for a persisted chat with an LLM.
use chrono::Local;
use serde::{Deserialize, Serialize};

pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub enum Role {
    #[serde(rename = "user")]
    User,
    #[serde(rename = "assistant")]
    Assistant,
}

/// One message in the conversation, as stored in the transcript file.
#[derive(Clone, Serialize, Deserialize, Debug, PartialEq, Eq)]
pub struct Turn {
    pub role: Role,
    pub content: String,
    pub timestamp: String,
}

impl Turn {
    /// Creates a turn stamped with the current local time.
    pub fn new(role: Role, content: &str) -> Self {
        Turn {
            role,
            content: content.to_string(),
            timestamp: Local::now().format(TIMESTAMP_FORMAT).to_string(),
        }
    }

    pub fn user(content: &str) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: &str) -> Self {
        Self::new(Role::Assistant, content)
    }

    /// An assistant turn recording a failed generation call.
    pub fn assistant_error(message: &str) -> Self {
        Self::new(Role::Assistant, &format!("❌ Error: {}", message))
    }
}

/// Ordered list of turns. Insertion order is conversation order.
#[derive(Clone, Default, Debug, PartialEq, Eq)]
pub struct Transcript(Vec<Turn>);

impl Transcript {
    pub fn new_with_turns(turns: Vec<Turn>) -> Self {
        Self(turns)
    }

    pub fn turns(&self) -> &[Turn] {
        &self.0
    }

    pub fn push(&mut self, turn: Turn) {
        self.0.push(turn)
    }

    pub fn clear(&mut self) {
        self.0.clear()
    }
}
