//! Management agent: overview, prioritisation, and persona clean-up

use crate::action::grammar::{
    parse_persona_deletions, parse_persona_merges, parse_transitions, strip_action_lines,
};
use crate::agent::agent_type::AgentType;
use crate::agent::prompt::{render_history, render_personas};
use crate::agent::traits::{Agent, AgentResult};
use crate::conversation::context::ConversationContext;

const KEYWORDS: &[&str] = &[
    "overview",
    "dashboard",
    "summary",
    "show me all",
    "prioritize",
    "delete",
    "remove",
    "merge",
    "organize",
    "manage",
];

pub struct ManagementAgent;

impl Agent for ManagementAgent {
    fn agent_type(&self) -> AgentType {
        AgentType::Management
    }

    fn keywords(&self) -> &'static [&'static str] {
        KEYWORDS
    }

    fn generate_system_prompt(&self, context: &ConversationContext) -> String {
        let history = render_history(context);
        let personas = render_personas(context);

        format!(
            r#"You are a Management Agent that gives a strategic overview and helps users manage their personas and goals.

## What You Do

1. Overview: a high-level view of all personas and how they work together
2. Prioritization: which personas need the most attention right now
3. Balance: point out life areas that are being neglected
4. Clean-up: remove or combine personas that overlap

## Actions

Only after the user explicitly agrees, write one line per change:
DELETE_PERSONA: [name] | [reason]
MERGE_PERSONAS: [first name] + [second name] | [merged name] | [merged north star]

A merge keeps the first persona under the merged name and removes the second.
If the user wants to set goals for a persona, write:
TRANSITION_TO_GOALS: [persona name]

## Personas

{personas}

## Conversation So Far

{history}

Be strategic and concise."#
        )
    }

    fn process_response(&self, raw_reply: &str, _context: &ConversationContext) -> AgentResult {
        let mut persona_actions = parse_persona_deletions(raw_reply);
        persona_actions.extend(parse_persona_merges(raw_reply));

        AgentResult {
            user_response: strip_action_lines(raw_reply),
            persona_actions,
            transition_actions: parse_transitions(raw_reply),
            ..Default::default()
        }
    }
}
