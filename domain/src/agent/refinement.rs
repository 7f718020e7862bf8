//! Refinement agent: sharpens an existing persona's name and north star

use crate::action::grammar::{
    parse_confirmed_personas, parse_refined_personas, parse_transitions, strip_action_lines,
};
use crate::agent::agent_type::AgentType;
use crate::agent::prompt::{render_history, render_target_persona};
use crate::agent::traits::{Agent, AgentResult};
use crate::conversation::context::ConversationContext;

const KEYWORDS: &[&str] = &[
    "refine", "improve", "update", "change", "modify", "rename", "edit", "better",
];

pub struct RefinementAgent;

impl Agent for RefinementAgent {
    fn agent_type(&self) -> AgentType {
        AgentType::Refinement
    }

    fn keywords(&self) -> &'static [&'static str] {
        KEYWORDS
    }

    /// Once a persona is targeted every message belongs to refinement
    fn can_handle(&self, message: &str, context: &ConversationContext) -> bool {
        context.target_persona_id.is_some() || self.keyword_hits(message) > 0
    }

    fn generate_system_prompt(&self, context: &ConversationContext) -> String {
        let history = render_history(context);
        let target = render_target_persona(context);

        format!(
            r#"You are a Refinement Agent that helps users improve and refine their existing personas.

## Refinement Process

1. Understand which aspect of the persona they want to improve
2. Ask clarifying questions about what they want from this persona
3. Suggest specific improvements to the name, north star, or focus
4. When they confirm a change, write exactly one of:
REFINED_PERSONA: [name] | [new north star]
PERSONA_CONFIRMED: [new name] (was: [old name]) | [new north star]

## Refinement Areas

- Name clarity: more specific and meaningful names
- North star precision: more actionable and inspiring
- Focus: less generic, more personal

## Examples

- "Parent" becomes "Nurturing Parent" with north star "To raise confident, independent children"
- "Be creative" becomes "To express authentic creativity that inspires others"

## Moving On

If the user wants to turn the refined persona into goals, write:
TRANSITION_TO_GOALS: [persona name]

## Target Persona

{target}

## Conversation So Far

{history}

Be thoughtful and ask probing questions."#
        )
    }

    fn process_response(&self, raw_reply: &str, context: &ConversationContext) -> AgentResult {
        let target_name = context.target_persona.as_ref().map(|p| p.name.as_str());
        let mut persona_actions = parse_refined_personas(raw_reply, target_name);
        persona_actions.extend(parse_confirmed_personas(raw_reply));

        AgentResult {
            user_response: strip_action_lines(raw_reply),
            persona_actions,
            transition_actions: parse_transitions(raw_reply),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::PersonaActionKind;
    use crate::conversation::context::PersonaSummary;

    fn targeted() -> ConversationContext {
        ConversationContext::new(AgentType::Refinement)
            .with_target_persona("p1", PersonaSummary::new("Parent", "Be there"))
    }

    #[test]
    fn test_sticky_on_target_persona() {
        assert!(RefinementAgent.can_handle("my kids are 4 and 7", &targeted()));
        assert!(!RefinementAgent.can_handle("my kids are 4 and 7", &ConversationContext::default()));
        assert!(RefinementAgent.can_handle("can we make it better", &ConversationContext::default()));
    }

    #[test]
    fn test_refined_rename_keeps_target_as_previous() {
        let result = RefinementAgent.process_response(
            "How about this?\nREFINED_PERSONA: Nurturing Parent | Raise confident, independent children",
            &targeted(),
        );
        assert_eq!(result.persona_actions.len(), 1);
        let action = &result.persona_actions[0];
        assert_eq!(action.kind, PersonaActionKind::Update);
        assert_eq!(action.previous_name.as_deref(), Some("Parent"));
        assert_eq!(result.user_response, "How about this?");
    }

    #[test]
    fn test_short_refinement_is_dropped() {
        let result =
            RefinementAgent.process_response("REFINED_PERSONA: Parent | Love more", &targeted());
        assert!(result.persona_actions.is_empty());
        assert!(result.user_response.is_empty());
    }

    #[test]
    fn test_confirmed_lines_are_also_parsed() {
        let result = RefinementAgent.process_response(
            "PERSONA_CONFIRMED: Nurturing Parent (was: Parent) | Raise confident children\n\
             TRANSITION_TO_GOALS: Nurturing Parent",
            &targeted(),
        );
        assert_eq!(result.persona_actions.len(), 1);
        assert_eq!(result.transition_actions.len(), 1);
    }

    #[test]
    fn test_prompt_includes_target() {
        let prompt = RefinementAgent.generate_system_prompt(&targeted());
        assert!(prompt.contains("Current Persona: Parent"));
        assert!(prompt.contains("REFINED_PERSONA: [name] | [new north star]"));
    }
}
