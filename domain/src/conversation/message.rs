//! Conversation message entity

use crate::agent::AgentType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Who wrote a [`ConversationMessage`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    User,
    Coach,
    System,
}

impl Sender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Sender::User => "user",
            Sender::Coach => "coach",
            Sender::System => "system",
        }
    }
}

impl fmt::Display for Sender {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single entry in the conversation log (immutable once created)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationMessage {
    pub id: String,
    #[serde(rename = "from")]
    pub sender: Sender,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_type: Option<AgentType>,
}

impl ConversationMessage {
    fn new(sender: Sender, text: impl Into<String>, agent_type: Option<AgentType>) -> Self {
        let timestamp = Utc::now();
        Self {
            id: format!("msg-{}-{}", timestamp.timestamp_millis(), sender),
            sender,
            text: text.into(),
            timestamp,
            agent_type,
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Sender::User, text, None)
    }

    pub fn coach(text: impl Into<String>, agent_type: AgentType) -> Self {
        Self::new(Sender::Coach, text, Some(agent_type))
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::new(Sender::System, text, None)
    }

    /// Render as one transcript line, e.g. `coach (discovery): Hello`
    pub fn transcript_line(&self) -> String {
        match self.agent_type {
            Some(agent) => format!("{} ({}): {}", self.sender, agent, self.text),
            None => format!("{}: {}", self.sender, self.text),
        }
    }
}
