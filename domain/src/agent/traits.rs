//! The agent trait

use crate::action::{GoalAction, PersonaAction, TransitionAction};
use crate::agent::agent_type::AgentType;
use crate::conversation::context::{ContextUpdates, ConversationContext};

/// What an agent extracted from one LLM reply
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AgentResult {
    /// Reply text with every action line removed
    pub user_response: String,
    pub persona_actions: Vec<PersonaAction>,
    pub goal_actions: Vec<GoalAction>,
    pub transition_actions: Vec<TransitionAction>,
    pub context_updates: ContextUpdates,
}

impl AgentResult {
    /// A result that carries text only
    pub fn text(user_response: impl Into<String>) -> Self {
        Self {
            user_response: user_response.into(),
            ..Default::default()
        }
    }

    pub fn has_actions(&self) -> bool {
        !self.persona_actions.is_empty()
            || !self.goal_actions.is_empty()
            || !self.transition_actions.is_empty()
    }
}

/// A stateless coaching strategy.
///
/// An agent decides whether a message is for it, writes the system prompt the
/// LLM runs under, and turns the raw reply into actions. Agents hold no state
/// between turns; everything they need travels in the [`ConversationContext`].
pub trait Agent: Send + Sync {
    fn agent_type(&self) -> AgentType;

    fn display_name(&self) -> &'static str {
        self.agent_type().display_name()
    }

    /// Lower-case phrases that route a message to this agent
    fn keywords(&self) -> &'static [&'static str];

    /// How many of this agent's keywords appear in `message`
    fn keyword_hits(&self, message: &str) -> usize {
        let lower = message.to_lowercase();
        self.keywords()
            .iter()
            .filter(|k| lower.contains(*k))
            .count()
    }

    fn can_handle(&self, message: &str, _context: &ConversationContext) -> bool {
        self.keyword_hits(message) > 0
    }

    fn generate_system_prompt(&self, context: &ConversationContext) -> String;

    fn process_response(&self, raw_reply: &str, context: &ConversationContext) -> AgentResult;
}
