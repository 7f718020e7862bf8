//! Goal agent: turns a persona's north star into measurable goals

use crate::action::grammar::{parse_goal_actions, strip_action_lines};
use crate::agent::agent_type::AgentType;
use crate::agent::prompt::{render_history, render_target_persona};
use crate::agent::traits::{Agent, AgentResult};
use crate::conversation::context::ConversationContext;
use chrono::Utc;

const KEYWORDS: &[&str] = &[
    "goal",
    "achieve",
    "target",
    "accomplish",
    "track",
    "progress",
];

pub struct GoalAgent;

impl Agent for GoalAgent {
    fn agent_type(&self) -> AgentType {
        AgentType::Goal
    }

    fn keywords(&self) -> &'static [&'static str] {
        KEYWORDS
    }

    fn generate_system_prompt(&self, context: &ConversationContext) -> String {
        let history = render_history(context);
        let target = render_target_persona(context);
        let today = Utc::now().format("%Y-%m-%d");

        format!(
            r#"You are a Goal Agent that helps users create specific, measurable goals for their personas.

## Goal Creation Process

1. Understand the persona and its north star
2. Shape SMART goals (Specific, Measurable, Achievable, Relevant, Time-bound)
3. Pick a review date, usually a week or a month out (today is {today})
4. Define clear acceptance criteria
5. When a goal is ready, write:
GOAL_CONFIRMED: [goal name] | [acceptance criteria] | [YYYY-MM-DD]
6. To change an existing goal, write:
GOAL_UPDATED: [original name] | [new name] | [new criteria] | [new YYYY-MM-DD]

## Example

For "Creative Professional" with north star "To express authentic creativity":
GOAL_CONFIRMED: Write 1000 words daily | Complete 1000 words of creative writing each morning by 9am | 2025-01-15

## Target Persona

{target}

## Conversation So Far

{history}

Help them create 2-4 concrete goals. Ask what is realistic for them."#
        )
    }

    fn process_response(&self, raw_reply: &str, _context: &ConversationContext) -> AgentResult {
        AgentResult {
            user_response: strip_action_lines(raw_reply),
            goal_actions: parse_goal_actions(raw_reply),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::GoalActionKind;

    #[test]
    fn test_create_then_update() {
        let ctx = ConversationContext::new(AgentType::Goal);
        let reply = "Here you go:\n\
            GOAL_CONFIRMED: Write 1000 words daily | 1000 words before 9am | 2025-01-15\n\
            GOAL_UPDATED: Share work weekly | Share work every Friday | One post each Friday | 2025-02-01";
        let result = GoalAgent.process_response(reply, &ctx);

        assert_eq!(result.goal_actions.len(), 2);
        assert_eq!(result.goal_actions[0].kind, GoalActionKind::Create);
        assert_eq!(result.goal_actions[1].kind, GoalActionKind::Update);
        assert_eq!(result.user_response, "Here you go:");
        assert!(result.persona_actions.is_empty());
    }

    #[test]
    fn test_goal_keywords_match_plurals() {
        let ctx = ConversationContext::default();
        assert!(GoalAgent.can_handle("Let's set some goals", &ctx));
        assert!(!GoalAgent.can_handle("Who am I really?", &ctx));
    }
}
