//! Persisted conversation records

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConversationStatus {
    #[default]
    Active,
    Completed,
}

/// A conversation as stored by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationRecord {
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub persona_id: Option<String>,
    pub conversation_type: String,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub status: ConversationStatus,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub key_insights: Vec<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    pub started_at: DateTime<Utc>,
    #[serde(default)]
    pub ended_at: Option<DateTime<Utc>>,
}

impl ConversationRecord {
    pub fn is_active(&self) -> bool {
        self.status == ConversationStatus::Active
    }
}

/// Parameters for starting a conversation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewConversation {
    pub user_id: String,
    pub conversation_type: String,
    pub topic: Option<String>,
    pub persona_id: Option<String>,
}

impl NewConversation {
    pub fn new(user_id: impl Into<String>, conversation_type: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            conversation_type: conversation_type.into(),
            topic: None,
            persona_id: None,
        }
    }

    pub fn with_topic(mut self, topic: impl Into<String>) -> Self {
        self.topic = Some(topic.into());
        self
    }

    pub fn with_persona(mut self, persona_id: impl Into<String>) -> Self {
        self.persona_id = Some(persona_id.into());
        self
    }
}
