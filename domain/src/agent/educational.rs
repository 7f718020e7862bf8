//! Educational agent: explains personas and north stars, creates nothing

use crate::action::grammar::{requests_discovery, strip_action_lines};
use crate::agent::agent_type::AgentType;
use crate::agent::prompt::render_history;
use crate::agent::traits::{Agent, AgentResult};
use crate::conversation::context::{ContextUpdates, ConversationContext};

/// Set once the concepts have been explained in this session
pub const CONCEPTS_EXPLAINED_FLAG: &str = "concepts_explained";

/// Shown when the model replied with nothing but the hand-off line
const HANDOFF_MESSAGE: &str = "Perfect! Now that you understand personas, let me connect you with \
our Discovery Agent who will help you identify and create your personal personas.";

const KEYWORDS: &[&str] = &[
    "what is",
    "what are",
    "what's",
    "explain",
    "example",
    "help me understand",
    "meaning of",
    "define",
];

pub struct EducationalAgent;

impl Agent for EducationalAgent {
    fn agent_type(&self) -> AgentType {
        AgentType::Educational
    }

    fn keywords(&self) -> &'static [&'static str] {
        KEYWORDS
    }

    fn generate_system_prompt(&self, context: &ConversationContext) -> String {
        let history = render_history(context);
        let progress = if context.temporary_state.has_flag(CONCEPTS_EXPLAINED_FLAG) {
            "You have already explained the basics in this conversation. Build on that instead of repeating it."
        } else {
            "The user has not heard the explanation yet. Start with the basics."
        };

        format!(
            r#"You are an Educational Agent that explains persona and north star concepts clearly and concisely.

Your role is EDUCATION ONLY. You explain concepts but never create anything.

## Key Concepts

- A persona is a role or identity the user embodies (Parent, Professional, Creative, ...)
- A north star is the guiding principle that defines excellence for that persona
- Give 2-3 concrete examples, such as:
  * Maya Angelou as "Inspiring Writer": north star "To heal and empower through authentic storytelling"
  * Serena Williams as "Champion Athlete": north star "To achieve greatness through relentless dedication and grace"

## Hand-off

1. Explain the concepts clearly
2. Ask whether they want to discover their own personas (do not assume)
3. ONLY if they clearly say yes, write this line on its own:
TRANSITION_TO_DISCOVERY
4. If they say no, stay here and offer to explain more

Do not create personas. That is the Discovery Agent's job.

{progress}

## Conversation So Far

{history}

Be clear, concise, and educational."#
        )
    }

    fn process_response(&self, raw_reply: &str, context: &ConversationContext) -> AgentResult {
        let handoff = requests_discovery(raw_reply);
        let mut user_response = strip_action_lines(raw_reply);
        if handoff && user_response.is_empty() {
            user_response = HANDOFF_MESSAGE.to_string();
        }

        let temporary_state = (!context.temporary_state.has_flag(CONCEPTS_EXPLAINED_FLAG))
            .then(|| context.temporary_state.clone().with_flag(CONCEPTS_EXPLAINED_FLAG));

        AgentResult {
            user_response,
            context_updates: ContextUpdates {
                current_agent: handoff.then_some(AgentType::Discovery),
                temporary_state,
            },
            ..Default::default()
        }
    }
}
