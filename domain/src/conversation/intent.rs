//! Keyword intent analysis

use crate::agent::{AgentRegistry, AgentType};
use crate::conversation::context::ConversationContext;

/// Confidence for a message that hits one keyword of the winning agent
pub const KEYWORD_CONFIDENCE: f32 = 0.8;
/// Confidence when two or more keywords of the winning agent hit
pub const STRONG_KEYWORD_CONFIDENCE: f32 = 0.9;
/// Confidence when refinement wins only because a persona is targeted
pub const STICKY_CONFIDENCE: f32 = 0.7;
/// Confidence when nothing matched and the conversation stays put
pub const FALLBACK_CONFIDENCE: f32 = 0.5;

/// Outcome of [`analyze_intent`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IntentMatch {
    pub agent: AgentType,
    pub confidence: f32,
}

/// Pick the agent that should answer `message`.
///
/// Agents are asked in [`AgentType::PRIORITY`] order and the first one that
/// can handle the message wins. With no taker the current agent keeps the
/// conversation, or Educational if the current agent is not registered.
pub fn analyze_intent(
    registry: &AgentRegistry,
    message: &str,
    context: &ConversationContext,
) -> IntentMatch {
    for agent_type in AgentType::PRIORITY {
        let Some(agent) = registry.get(agent_type) else {
            continue;
        };
        if !agent.can_handle(message, context) {
            continue;
        }
        let confidence = match agent.keyword_hits(message) {
            0 => STICKY_CONFIDENCE,
            1 => KEYWORD_CONFIDENCE,
            _ => STRONG_KEYWORD_CONFIDENCE,
        };
        return IntentMatch {
            agent: agent_type,
            confidence,
        };
    }

    let agent = if registry.contains(context.current_agent) {
        context.current_agent
    } else {
        AgentType::Educational
    };
    IntentMatch {
        agent,
        confidence: FALLBACK_CONFIDENCE,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::{DiscoveryAgent, GoalAgent};
    use crate::conversation::context::PersonaSummary;

    fn analyze(message: &str, ctx: &ConversationContext) -> IntentMatch {
        analyze_intent(&AgentRegistry::default(), message, ctx)
    }

    #[test]
    fn test_goal_beats_everything() {
        let ctx = ConversationContext::default();
        let m = analyze("explain how to create a goal", &ctx);
        assert_eq!(m.agent, AgentType::Goal);
    }

    #[test]
    fn test_educational_question() {
        let m = analyze("What is a persona?", &ConversationContext::default());
        assert_eq!(m.agent, AgentType::Educational);
        assert_eq!(m.confidence, KEYWORD_CONFIDENCE);
    }

    #[test]
    fn test_two_hits_raise_confidence() {
        let m = analyze(
            "help me discover who am i",
            &ConversationContext::default(),
        );
        assert_eq!(m.agent, AgentType::Discovery);
        assert_eq!(m.confidence, STRONG_KEYWORD_CONFIDENCE);
    }

    #[test]
    fn test_management_keywords() {
        let m = analyze("Show me all my stuff", &ConversationContext::default());
        assert_eq!(m.agent, AgentType::Management);
    }

    #[test]
    fn test_target_persona_makes_refinement_sticky() {
        let ctx = ConversationContext::default()
            .with_target_persona("p1", PersonaSummary::new("Parent", "Raise kind humans"));
        let m = analyze("I spend evenings with my kids", &ctx);
        assert_eq!(m.agent, AgentType::Refinement);
        assert_eq!(m.confidence, STICKY_CONFIDENCE);
    }

    #[test]
    fn test_no_match_keeps_current_agent() {
        let ctx = ConversationContext::new(AgentType::Discovery);
        let m = analyze("I like painting on weekends", &ctx);
        assert_eq!(m.agent, AgentType::Discovery);
        assert_eq!(m.confidence, FALLBACK_CONFIDENCE);
    }

    #[test]
    fn test_unregistered_current_agent_falls_back_to_educational() {
        let registry = AgentRegistry::empty()
            .register(DiscoveryAgent)
            .register(GoalAgent);
        let ctx = ConversationContext::new(AgentType::Management);
        let m = analyze_intent(&registry, "hmm", &ctx);
        assert_eq!(m.agent, AgentType::Educational);
    }

    #[test]
    fn test_unregistered_agents_are_skipped() {
        let registry = AgentRegistry::empty().register(DiscoveryAgent);
        let m = analyze_intent(&registry, "track my goal progress", &ConversationContext::default());
        assert_eq!(m.agent, AgentType::Educational);
        assert_eq!(m.confidence, FALLBACK_CONFIDENCE);
    }
}
