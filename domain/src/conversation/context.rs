//! Conversation context value object
//!
//! The context is an owned value threaded through every turn. Nothing mutates
//! it in place: each operation consumes the context and returns the next one.

use crate::agent::AgentType;
use crate::conversation::message::{ConversationMessage, Sender};
use crate::session::entities::Message;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Name and north star of a persona, as shown to the coach
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonaSummary {
    pub name: String,
    pub north_star: String,
}

impl PersonaSummary {
    pub fn new(name: impl Into<String>, north_star: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            north_star: north_star.into(),
        }
    }
}

/// Scratch state owned by whichever agent is active.
///
/// Agents never patch this piecemeal; an agent that changes it hands back a
/// complete replacement through [`ContextUpdates::temporary_state`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TemporaryState {
    /// Personas confirmed during this session, newest last
    #[serde(default)]
    pub draft_personas: Vec<PersonaSummary>,
    #[serde(default)]
    pub working_definitions: BTreeMap<String, String>,
    #[serde(default)]
    pub flags: BTreeSet<String>,
}

impl TemporaryState {
    pub fn has_flag(&self, flag: &str) -> bool {
        self.flags.contains(flag)
    }

    pub fn with_flag(mut self, flag: impl Into<String>) -> Self {
        self.flags.insert(flag.into());
        self
    }

    /// Record a confirmed draft, replacing an earlier one with the same name.
    pub fn with_draft(mut self, draft: PersonaSummary) -> Self {
        self.draft_personas
            .retain(|d| !crate::core::string::names_match(&d.name, &draft.name));
        self.draft_personas.push(draft);
        self
    }
}

/// Changes an agent asks for after processing a reply
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContextUpdates {
    pub current_agent: Option<AgentType>,
    pub temporary_state: Option<TemporaryState>,
}

impl ContextUpdates {
    pub fn is_empty(&self) -> bool {
        self.current_agent.is_none() && self.temporary_state.is_none()
    }
}

/// Everything the router knows about the current chat session
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationContext {
    pub current_agent: AgentType,
    pub target_persona_id: Option<String>,
    pub target_persona: Option<PersonaSummary>,
    /// The user's personas, so agents can refer to them by name
    #[serde(default)]
    pub personas: Vec<PersonaSummary>,
    #[serde(default)]
    pub temporary_state: TemporaryState,
    #[serde(default)]
    pub history: Vec<ConversationMessage>,
    pub last_intent_confidence: Option<f32>,
}

impl Default for ConversationContext {
    fn default() -> Self {
        Self::new(AgentType::default())
    }
}

impl ConversationContext {
    pub fn new(current_agent: AgentType) -> Self {
        Self {
            current_agent,
            target_persona_id: None,
            target_persona: None,
            personas: Vec::new(),
            temporary_state: TemporaryState::default(),
            history: Vec::new(),
            last_intent_confidence: None,
        }
    }

    pub fn with_agent(self, current_agent: AgentType) -> Self {
        Self {
            current_agent,
            ..self
        }
    }

    pub fn with_intent_confidence(self, confidence: f32) -> Self {
        Self {
            last_intent_confidence: Some(confidence),
            ..self
        }
    }

    /// Point the conversation at one persona (used by refinement and goal setting)
    pub fn with_target_persona(self, id: impl Into<String>, persona: PersonaSummary) -> Self {
        Self {
            target_persona_id: Some(id.into()),
            target_persona: Some(persona),
            ..self
        }
    }

    pub fn without_target_persona(self) -> Self {
        Self {
            target_persona_id: None,
            target_persona: None,
            ..self
        }
    }

    pub fn with_personas(self, personas: Vec<PersonaSummary>) -> Self {
        Self { personas, ..self }
    }

    /// Append messages to the history, keeping their order
    pub fn with_messages(self, messages: impl IntoIterator<Item = ConversationMessage>) -> Self {
        let mut history = self.history;
        history.extend(messages);
        Self { history, ..self }
    }

    /// Apply agent-requested updates, producing the next context
    pub fn apply(self, updates: ContextUpdates) -> Self {
        let ContextUpdates {
            current_agent,
            temporary_state,
        } = updates;
        Self {
            current_agent: current_agent.unwrap_or(self.current_agent),
            temporary_state: temporary_state.unwrap_or(self.temporary_state),
            ..self
        }
    }

    /// History rendered as LLM turns. System notes are not sent to the model.
    pub fn llm_history(&self) -> Vec<Message> {
        self.history
            .iter()
            .filter_map(|m| match m.sender {
                Sender::User => Some(Message::user(m.text.clone())),
                Sender::Coach => Some(Message::assistant(m.text.clone())),
                Sender::System => None,
            })
            .collect()
    }
}
