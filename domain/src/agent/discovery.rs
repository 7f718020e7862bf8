//! Discovery agent: helps the user find and name their personas

use crate::action::PersonaActionKind;
use crate::action::grammar::{parse_confirmed_personas, parse_transitions, strip_action_lines};
use crate::agent::agent_type::AgentType;
use crate::agent::prompt::{render_history, render_personas};
use crate::agent::traits::{Agent, AgentResult};
use crate::conversation::context::{ContextUpdates, ConversationContext, PersonaSummary};
use crate::persona::MAX_PERSONAS;

const KEYWORDS: &[&str] = &[
    "create",
    "discover",
    "find my",
    "identify",
    "new persona",
    "roles",
    "who am i",
];

pub struct DiscoveryAgent;

impl Agent for DiscoveryAgent {
    fn agent_type(&self) -> AgentType {
        AgentType::Discovery
    }

    fn keywords(&self) -> &'static [&'static str] {
        KEYWORDS
    }

    fn generate_system_prompt(&self, context: &ConversationContext) -> String {
        let history = render_history(context);
        let personas = render_personas(context);
        let remaining = MAX_PERSONAS.saturating_sub(context.personas.len());
        let drafts = if context.temporary_state.draft_personas.is_empty() {
            String::new()
        } else {
            let names = context
                .temporary_state
                .draft_personas
                .iter()
                .map(|d| d.name.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            format!("\nAlready confirmed in this conversation: {names}. Do not confirm them again.\n")
        };

        format!(
            r#"You are a Discovery Agent that helps users discover and create their personal personas through guided conversation.

## Discovery Process

1. Ask open-ended questions about their roles, responsibilities, and passions
2. When they mention a potential persona, explore what drives them in that role
3. Help craft a north star that captures their aspiration for that persona
4. When a persona feels complete, write one line per persona:
PERSONA_CONFIRMED: [name] | [north star]
5. To rename an existing persona, write:
PERSONA_CONFIRMED: [new name] (was: [old name]) | [north star]

## Rules

- Only confirm a persona when both the name and the north star are clear
- Personas are specific roles (Parent, Creative Professional, Community Leader), not traits
- The user can have at most {max} personas; {remaining} slots are left

## Moving On

If the user wants to turn a persona into goals or daily practices, write:
TRANSITION_TO_GOALS: [persona name]

## Current Personas

{personas}
{drafts}
## Conversation So Far

{history}

Be encouraging and curious. Guide them to discover 3-7 distinct personas."#,
            max = MAX_PERSONAS,
        )
    }

    fn process_response(&self, raw_reply: &str, context: &ConversationContext) -> AgentResult {
        let persona_actions = parse_confirmed_personas(raw_reply);
        let transition_actions = parse_transitions(raw_reply);

        let temporary_state = (!persona_actions.is_empty()).then(|| {
            persona_actions
                .iter()
                .filter(|a| a.kind != PersonaActionKind::Delete)
                .fold(context.temporary_state.clone(), |state, action| {
                    state.with_draft(PersonaSummary::new(
                        action.name.clone(),
                        action.north_star.clone().unwrap_or_default(),
                    ))
                })
        });

        AgentResult {
            user_response: strip_action_lines(raw_reply),
            persona_actions,
            goal_actions: Vec::new(),
            transition_actions,
            context_updates: ContextUpdates {
                current_agent: None,
                temporary_state,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{PersonaAction, TransitionAction};

    #[test]
    fn test_confirmations_become_actions_and_drafts() {
        let ctx = ConversationContext::new(AgentType::Discovery);
        let reply = "Love it.\n\
            PERSONA_CONFIRMED: Parent | Raise confident children\n\
            PERSONA_CONFIRMED: Runner | Move with joy every day";
        let result = DiscoveryAgent.process_response(reply, &ctx);

        assert_eq!(result.persona_actions.len(), 2);
        assert_eq!(result.user_response, "Love it.");
        let state = result.context_updates.temporary_state.unwrap();
        assert_eq!(state.draft_personas.len(), 2);
        assert_eq!(state.draft_personas[1].name, "Runner");
    }

    #[test]
    fn test_rename_is_an_update() {
        let ctx = ConversationContext::new(AgentType::Discovery);
        let result = DiscoveryAgent.process_response(
            "PERSONA_CONFIRMED: Nurturing Parent (was: Parent) | Raise confident children",
            &ctx,
        );
        assert_eq!(
            result.persona_actions,
            vec![PersonaAction::update(
                "Nurturing Parent",
                Some("Raise confident children".to_string()),
                Some("Parent".to_string()),
            )]
        );
    }

    #[test]
    fn test_transition_to_goals() {
        let ctx = ConversationContext::new(AgentType::Discovery);
        let result =
            DiscoveryAgent.process_response("Let's go.\nTRANSITION_TO_GOALS: Parent", &ctx);
        assert_eq!(
            result.transition_actions,
            vec![TransitionAction::TransitionToGoals {
                persona_name: "Parent".to_string()
            }]
        );
        assert!(result.context_updates.is_empty());
    }

    #[test]
    fn test_goal_lines_are_not_parsed_here() {
        let ctx = ConversationContext::new(AgentType::Discovery);
        let result = DiscoveryAgent
            .process_response("GOAL_CONFIRMED: Run | 5k | 2025-01-01", &ctx);
        assert!(result.goal_actions.is_empty());
        assert!(result.user_response.is_empty());
    }

    #[test]
    fn test_prompt_mentions_cap_and_drafts() {
        let ctx = ConversationContext::new(AgentType::Discovery)
            .with_personas(vec![PersonaSummary::new("Parent", "Raise kind humans")]);
        let drafts = ctx
            .temporary_state
            .clone()
            .with_draft(PersonaSummary::new("Runner", "Move"));
        let ctx = ctx.apply(ContextUpdates {
            current_agent: None,
            temporary_state: Some(drafts),
        });
        let prompt = DiscoveryAgent.generate_system_prompt(&ctx);
        assert!(prompt.contains("at most 9 personas; 8 slots are left"));
        assert!(prompt.contains("Already confirmed in this conversation: Runner"));
        assert!(prompt.contains("PERSONA_CONFIRMED: [name] | [north star]"));
    }
}
