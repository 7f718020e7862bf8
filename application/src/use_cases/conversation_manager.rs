//! Conversation manager use case.
//!
//! Routes one user message through the agent system:
//!
//! 1. Intent analysis picks the agent (or a forced agent is used)
//! 2. The agent writes the system prompt; the LLM is called with
//!    `[system, history..., user]`
//! 3. The agent parses the reply into actions and context updates
//! 4. The next [`ConversationContext`] is built from the old one
//!
//! LLM failures never escape: the user gets a fixed error reply and the
//! conversation history is left as it was.

use crate::config::ChatParams;
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::llm_gateway::{ChatRequest, GatewayError, LlmGateway};
use bestself_domain::core::string::truncate;
use bestself_domain::{
    AgentRegistry, AgentType, ConversationContext, ConversationMessage, GoalAction, IntentMatch,
    Message, PersonaAction, TransitionAction, analyze_intent,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Shown when no registered agent can take the conversation
pub const ROUTING_APOLOGY: &str =
    "I'm sorry, I can't help with that right now. Could you tell me a bit more about what you'd like to work on?";

/// Confidence recorded when the caller forces an agent
pub const FORCED_CONFIDENCE: f32 = 1.0;

/// Fallback order when the selected agent is not registered
const FALLBACK_AGENTS: [AgentType; 2] = [AgentType::Discovery, AgentType::Educational];

/// The coach's side of one turn
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CoachReply {
    /// Text for the user, action lines removed
    pub text: String,
    pub agent: AgentType,
    pub persona_actions: Vec<PersonaAction>,
    pub goal_actions: Vec<GoalAction>,
    pub transition_actions: Vec<TransitionAction>,
    /// Set when the LLM call failed; `text` then holds the error reply
    pub error: Option<String>,
}

impl CoachReply {
    fn failed(agent: AgentType, text: String, error: String) -> Self {
        Self {
            text,
            agent,
            error: Some(error),
            ..Default::default()
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// Result of [`ConversationManager::process_message`]
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub context: ConversationContext,
    pub reply: CoachReply,
    pub intent: IntentMatch,
}

impl TurnOutcome {
    /// Messages this turn added to the history, oldest first
    pub fn new_messages(&self, previous_len: usize) -> &[ConversationMessage] {
        self.context
            .history
            .get(previous_len..)
            .unwrap_or_default()
    }
}

/// User-facing text for a failed LLM call
pub fn llm_error_reply(error: &GatewayError) -> String {
    format!(
        "I'm having trouble reaching the coach right now ({error}). Please try again in a moment."
    )
}

/// Use case for running one coaching turn.
pub struct ConversationManager {
    gateway: Arc<dyn LlmGateway>,
    registry: Arc<AgentRegistry>,
    params: ChatParams,
    conversation_logger: Arc<dyn ConversationLogger>,
}

impl ConversationManager {
    pub fn new(gateway: Arc<dyn LlmGateway>, registry: Arc<AgentRegistry>) -> Self {
        Self {
            gateway,
            registry,
            params: ChatParams::default(),
            conversation_logger: Arc::new(NoConversationLogger),
        }
    }

    pub fn with_params(mut self, params: ChatParams) -> Self {
        self.params = params;
        self
    }

    /// Create with a conversation logger.
    pub fn with_conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.conversation_logger = logger;
        self
    }

    pub fn params(&self) -> &ChatParams {
        &self.params
    }

    pub fn registry(&self) -> &AgentRegistry {
        &self.registry
    }

    /// A fresh context starting at the configured agent
    pub fn new_context(&self) -> ConversationContext {
        ConversationContext::new(self.params.initial_agent)
    }

    pub async fn process_message(
        &self,
        context: ConversationContext,
        message: &str,
    ) -> TurnOutcome {
        self.process_message_with(context, message, None).await
    }

    /// Run one turn. A `forced_agent` skips intent analysis.
    pub async fn process_message_with(
        &self,
        context: ConversationContext,
        message: &str,
        forced_agent: Option<AgentType>,
    ) -> TurnOutcome {
        self.conversation_logger.log(ConversationEvent::new(
            "user_message",
            json!({
                "agent": context.current_agent.as_str(),
                "text": message,
            }),
        ));

        let intent = match forced_agent {
            Some(agent) => IntentMatch {
                agent,
                confidence: FORCED_CONFIDENCE,
            },
            None => analyze_intent(&self.registry, message, &context),
        };
        debug!(
            "Intent: {} (confidence {:.2})",
            intent.agent, intent.confidence
        );

        let mut context = context.with_intent_confidence(intent.confidence);
        if intent.agent != context.current_agent {
            self.log_switch(context.current_agent, intent.agent, "intent");
            context = context.with_agent(intent.agent);
        }

        let Some(agent) = self.registry.get(context.current_agent) else {
            return self.fallback_turn(context, intent);
        };
        let agent_type = agent.agent_type();

        let request = ChatRequest {
            model: self.params.model.clone(),
            messages: self.build_messages(agent.generate_system_prompt(&context), &context, message),
            temperature: self.params.temperature,
            max_tokens: self.params.max_tokens,
        };

        info!(
            "{} handling: {}",
            agent.display_name(),
            truncate(message, 80)
        );

        let raw = match self.gateway.chat(&request).await {
            Ok(raw) if raw.trim().is_empty() => Err(GatewayError::EmptyResponse),
            other => other,
        };

        let raw = match raw {
            Ok(raw) => raw,
            Err(e) => {
                warn!("LLM call failed for {}: {}", agent_type, e);
                self.conversation_logger.log(ConversationEvent::new(
                    "llm_error",
                    json!({
                        "agent": agent_type.as_str(),
                        "error": e.to_string(),
                    }),
                ));
                let reply = CoachReply::failed(agent_type, llm_error_reply(&e), e.to_string());
                return TurnOutcome {
                    context,
                    reply,
                    intent,
                };
            }
        };

        self.conversation_logger.log(ConversationEvent::new(
            "llm_response",
            json!({
                "agent": agent_type.as_str(),
                "model": request.model.to_string(),
                "bytes": raw.len(),
                "text": raw,
            }),
        ));

        let result = agent.process_response(&raw, &context);
        if result.has_actions() {
            self.conversation_logger.log(ConversationEvent::new(
                "actions_parsed",
                json!({
                    "agent": agent_type.as_str(),
                    "persona_actions": result.persona_actions,
                    "goal_actions": result.goal_actions,
                    "transition_actions": result.transition_actions,
                }),
            ));
            debug!(
                "Parsed {} persona / {} goal / {} transition actions",
                result.persona_actions.len(),
                result.goal_actions.len(),
                result.transition_actions.len()
            );
        }

        if let Some(next) = result.context_updates.current_agent
            && next != agent_type
        {
            self.log_switch(agent_type, next, "handoff");
        }

        let context = context
            .with_messages([
                ConversationMessage::user(message),
                ConversationMessage::coach(result.user_response.clone(), agent_type),
            ])
            .apply(result.context_updates);

        TurnOutcome {
            context,
            reply: CoachReply {
                text: result.user_response,
                agent: agent_type,
                persona_actions: result.persona_actions,
                goal_actions: result.goal_actions,
                transition_actions: result.transition_actions,
                error: None,
            },
            intent,
        }
    }

    fn build_messages(
        &self,
        system_prompt: String,
        context: &ConversationContext,
        message: &str,
    ) -> Vec<Message> {
        let mut messages = Vec::with_capacity(context.history.len() + 2);
        messages.push(Message::system(system_prompt));
        messages.extend(context.llm_history());
        messages.push(Message::user(message));
        messages
    }

    /// Selected agent is missing: move to the first registered fallback and
    /// apologise without calling the LLM.
    fn fallback_turn(&self, context: ConversationContext, intent: IntentMatch) -> TurnOutcome {
        let missing = context.current_agent;
        let fallback = FALLBACK_AGENTS
            .into_iter()
            .find(|t| self.registry.contains(*t));
        warn!("No agent registered for {}, falling back", missing);

        let context = match fallback {
            Some(agent) => {
                self.log_switch(missing, agent, "fallback");
                context.with_agent(agent)
            }
            None => context,
        };
        let reply = CoachReply {
            text: ROUTING_APOLOGY.to_string(),
            agent: context.current_agent,
            ..Default::default()
        };
        TurnOutcome {
            context,
            reply,
            intent,
        }
    }

    fn log_switch(&self, from: AgentType, to: AgentType, reason: &str) {
        info!("Switching agent: {} -> {} ({})", from, to, reason);
        self.conversation_logger.log(ConversationEvent::new(
            "agent_switch",
            json!({
                "from": from.as_str(),
                "to": to.as_str(),
                "reason": reason,
            }),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use bestself_domain::agent::{DiscoveryAgent, GoalAgent};
    use bestself_domain::{PersonaActionKind, PersonaSummary, Role, Sender};
    use std::sync::Mutex;

    /// Gateway that replays canned replies and records every request
    struct ScriptedGateway {
        replies: Mutex<Vec<Result<String, GatewayError>>>,
        requests: Mutex<Vec<ChatRequest>>,
    }

    impl ScriptedGateway {
        fn new(replies: Vec<Result<String, GatewayError>>) -> Arc<Self> {
            Arc::new(Self {
                replies: Mutex::new(replies),
                requests: Mutex::new(Vec::new()),
            })
        }

        fn requests(&self) -> Vec<ChatRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl LlmGateway for ScriptedGateway {
        async fn chat(&self, request: &ChatRequest) -> Result<String, GatewayError> {
            self.requests.lock().unwrap().push(request.clone());
            let mut replies = self.replies.lock().unwrap();
            if replies.is_empty() {
                return Err(GatewayError::Other("no scripted reply".to_string()));
            }
            replies.remove(0)
        }
    }

    struct RecordingLogger(Mutex<Vec<&'static str>>);

    impl ConversationLogger for RecordingLogger {
        fn log(&self, event: ConversationEvent) {
            self.0.lock().unwrap().push(event.event_type);
        }
    }

    fn manager(gateway: Arc<ScriptedGateway>) -> ConversationManager {
        ConversationManager::new(gateway, Arc::new(AgentRegistry::default()))
    }

    #[tokio::test]
    async fn test_discovery_turn_parses_actions_and_updates_history() {
        let gateway = ScriptedGateway::new(vec![Ok(
            "Great idea!\nPERSONA_CONFIRMED: Strategic Leader | Empower teams to thrive\n"
                .to_string(),
        )]);
        let manager = manager(gateway.clone());

        let outcome = manager
            .process_message(ConversationContext::default(), "Help me discover my roles")
            .await;

        assert_eq!(outcome.reply.agent, AgentType::Discovery);
        assert_eq!(outcome.reply.text, "Great idea!");
        assert_eq!(outcome.reply.persona_actions.len(), 1);
        assert_eq!(outcome.reply.persona_actions[0].kind, PersonaActionKind::Create);
        assert_eq!(outcome.context.current_agent, AgentType::Discovery);
        assert_eq!(outcome.context.history.len(), 2);
        assert_eq!(outcome.context.history[0].sender, Sender::User);
        assert_eq!(outcome.context.history[1].text, "Great idea!");
        assert_eq!(outcome.new_messages(0).len(), 2);

        let request = &gateway.requests()[0];
        assert_eq!(request.messages.len(), 2);
        assert_eq!(request.messages[0].role, Role::System);
        assert!(request.messages[0].content.contains("Discovery Agent"));
        assert_eq!(request.messages[1].content, "Help me discover my roles");
    }

    #[tokio::test]
    async fn test_history_is_sent_in_order() {
        let gateway = ScriptedGateway::new(vec![Ok("first".to_string()), Ok("second".to_string())]);
        let manager = manager(gateway.clone());

        let first = manager
            .process_message(ConversationContext::default(), "What is a persona?")
            .await;
        let second = manager
            .process_message(first.context, "And a north star?")
            .await;

        assert_eq!(second.context.history.len(), 4);
        let turns = &gateway.requests()[1].messages;
        assert_eq!(turns.len(), 4);
        assert_eq!(turns[1].content, "What is a persona?");
        assert_eq!(turns[2].role, Role::Assistant);
        assert_eq!(turns[3].content, "And a north star?");
    }

    #[tokio::test]
    async fn test_llm_failure_keeps_history() {
        let gateway = ScriptedGateway::new(vec![Err(GatewayError::Timeout)]);
        let logger = Arc::new(RecordingLogger(Mutex::new(Vec::new())));
        let manager = manager(gateway).with_conversation_logger(logger.clone());

        let ctx = ConversationContext::default()
            .with_messages([ConversationMessage::user("earlier")]);
        let outcome = manager.process_message(ctx, "What is a persona?").await;

        assert!(outcome.reply.is_error());
        assert!(outcome.reply.text.contains("Timeout"));
        assert_eq!(outcome.context.history.len(), 1);
        assert!(logger.0.lock().unwrap().contains(&"llm_error"));
    }

    #[tokio::test]
    async fn test_empty_reply_is_an_error() {
        let gateway = ScriptedGateway::new(vec![Ok("   ".to_string())]);
        let outcome = manager(gateway)
            .process_message(ConversationContext::default(), "hello")
            .await;
        assert_eq!(
            outcome.reply.error.as_deref(),
            Some("The model returned an empty reply")
        );
    }

    #[tokio::test]
    async fn test_educational_handoff_switches_agent() {
        let gateway = ScriptedGateway::new(vec![Ok("Wonderful!\nTRANSITION_TO_DISCOVERY".to_string())]);
        let logger = Arc::new(RecordingLogger(Mutex::new(Vec::new())));
        let manager = manager(gateway).with_conversation_logger(logger.clone());

        let outcome = manager
            .process_message(ConversationContext::default(), "yes please")
            .await;

        assert_eq!(outcome.reply.agent, AgentType::Educational);
        assert_eq!(outcome.reply.text, "Wonderful!");
        assert_eq!(outcome.context.current_agent, AgentType::Discovery);
        assert!(logger.0.lock().unwrap().contains(&"agent_switch"));
    }

    #[tokio::test]
    async fn test_target_persona_routes_to_refinement() {
        let gateway = ScriptedGateway::new(vec![Ok("Tell me more.".to_string())]);
        let ctx = ConversationContext::default()
            .with_target_persona("p1", PersonaSummary::new("Parent", "Be there"));
        let outcome = manager(gateway)
            .process_message(ctx, "my kids are 4 and 7")
            .await;
        assert_eq!(outcome.reply.agent, AgentType::Refinement);
        assert_eq!(outcome.intent.confidence, 0.7);
    }

    #[tokio::test]
    async fn test_forced_agent_skips_intent() {
        let gateway = ScriptedGateway::new(vec![Ok("Let's set goals.".to_string())]);
        let outcome = manager(gateway)
            .process_message_with(
                ConversationContext::default(),
                "What is a persona?",
                Some(AgentType::Goal),
            )
            .await;
        assert_eq!(outcome.reply.agent, AgentType::Goal);
        assert_eq!(outcome.intent.confidence, FORCED_CONFIDENCE);
    }

    #[tokio::test]
    async fn test_missing_agent_falls_back_without_llm() {
        let gateway = ScriptedGateway::new(vec![]);
        let registry = AgentRegistry::empty().register(DiscoveryAgent).register(GoalAgent);
        let manager = ConversationManager::new(gateway.clone(), Arc::new(registry));

        let outcome = manager
            .process_message_with(
                ConversationContext::default(),
                "overview please",
                Some(AgentType::Management),
            )
            .await;

        assert_eq!(outcome.reply.text, ROUTING_APOLOGY);
        assert_eq!(outcome.context.current_agent, AgentType::Discovery);
        assert!(gateway.requests().is_empty());
        assert!(outcome.context.history.is_empty());
    }
}
