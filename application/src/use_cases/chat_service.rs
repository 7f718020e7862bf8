//! Chat service use case.
//!
//! Wraps the [`ConversationManager`] with persistence and an offline queue.
//! The conversation context sits behind an async mutex, so concurrent sends
//! are handled one at a time in arrival order.
//!
//! When the backend is unreachable, outgoing messages (and messages that
//! could not be saved for the same reason) are queued. Saves the backend
//! refuses are reported, not retried. A background retry loop probes the
//! backend after [`SyncParams::retry_delays`] and drains the queue in its
//! original order once the probe succeeds.

use crate::config::SyncParams;
use crate::ports::backend_error::BackendError;
use crate::ports::chat_progress::{ChatProgressNotifier, NoChatProgress};
use crate::ports::connectivity::ConnectivityProbe;
use crate::ports::conversation_logger::{
    ConversationEvent, ConversationLogger, NoConversationLogger,
};
use crate::ports::conversation_repository::ConversationRepository;
use crate::use_cases::conversation_manager::{ConversationManager, TurnOutcome};
use bestself_domain::{
    AgentType, ConversationContext, ConversationMessage, ConversationRecord, GoalAction,
    NewConversation, PersonaAction, PersonaSummary, TransitionAction,
};
use chrono::{DateTime, Utc};
use serde_json::json;
use std::collections::VecDeque;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Conversation type recorded for free-form coaching chats
pub const DEFAULT_CONVERSATION_TYPE: &str = "coaching";

#[derive(Error, Debug)]
pub enum ChatError {
    #[error("No conversation is in progress")]
    NoConversation,

    #[error(transparent)]
    Backend(#[from] BackendError),
}

/// Outcome of [`ChatService::send_message`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SendMessageResult {
    pub success: bool,
    pub coach_reply: Option<String>,
    pub agent: Option<AgentType>,
    pub persona_actions: Vec<PersonaAction>,
    pub goal_actions: Vec<GoalAction>,
    pub transition_actions: Vec<TransitionAction>,
    pub error: Option<String>,
    /// The message is waiting in the offline queue
    pub queued: bool,
}

impl SendMessageResult {
    fn queued() -> Self {
        Self {
            success: true,
            queued: true,
            ..Default::default()
        }
    }

    fn from_turn(outcome: &TurnOutcome) -> Self {
        let reply = &outcome.reply;
        Self {
            success: !reply.is_error(),
            coach_reply: Some(reply.text.clone()),
            agent: Some(reply.agent),
            persona_actions: reply.persona_actions.clone(),
            goal_actions: reply.goal_actions.clone(),
            transition_actions: reply.transition_actions.clone(),
            error: reply.error.clone(),
            queued: false,
        }
    }
}

/// A save that stopped part way; `saved` messages made it to the backend
struct SaveFailure {
    saved: usize,
    error: BackendError,
}

/// Work waiting for the backend to come back
#[derive(Debug, Clone, PartialEq)]
pub enum PendingMessage {
    /// A user message that has not been answered yet
    Outgoing {
        text: String,
        queued_at: DateTime<Utc>,
    },
    /// An answered message that still has to be saved
    Unpersisted(ConversationMessage),
}

struct ChatState {
    context: ConversationContext,
    conversation_id: Option<String>,
    conversation_type: String,
    forced_agent: Option<AgentType>,
    pending: VecDeque<PendingMessage>,
    /// Replies produced while draining the queue, waiting to be shown
    deliveries: Vec<SendMessageResult>,
    retry: Option<CancellationToken>,
}

struct Inner {
    manager: Arc<ConversationManager>,
    conversations: Arc<dyn ConversationRepository>,
    probe: Arc<dyn ConnectivityProbe>,
    user_id: String,
    sync: SyncParams,
    progress: Arc<dyn ChatProgressNotifier>,
    conversation_logger: Arc<dyn ConversationLogger>,
    state: Mutex<ChatState>,
}

/// Use case for a persistent, offline-tolerant chat session.
#[derive(Clone)]
pub struct ChatService {
    inner: Arc<Inner>,
}

pub struct ChatServiceBuilder {
    manager: Arc<ConversationManager>,
    conversations: Arc<dyn ConversationRepository>,
    probe: Arc<dyn ConnectivityProbe>,
    user_id: String,
    sync: SyncParams,
    progress: Arc<dyn ChatProgressNotifier>,
    conversation_logger: Arc<dyn ConversationLogger>,
}

impl ChatServiceBuilder {
    pub fn sync_params(mut self, sync: SyncParams) -> Self {
        self.sync = sync;
        self
    }

    pub fn progress(mut self, progress: Arc<dyn ChatProgressNotifier>) -> Self {
        self.progress = progress;
        self
    }

    pub fn conversation_logger(mut self, logger: Arc<dyn ConversationLogger>) -> Self {
        self.conversation_logger = logger;
        self
    }

    pub fn build(self) -> ChatService {
        let context = self.manager.new_context();
        ChatService {
            inner: Arc::new(Inner {
                manager: self.manager,
                conversations: self.conversations,
                probe: self.probe,
                user_id: self.user_id,
                sync: self.sync,
                progress: self.progress,
                conversation_logger: self.conversation_logger,
                state: Mutex::new(ChatState {
                    context,
                    conversation_id: None,
                    conversation_type: DEFAULT_CONVERSATION_TYPE.to_string(),
                    forced_agent: None,
                    pending: VecDeque::new(),
                    deliveries: Vec::new(),
                    retry: None,
                }),
            }),
        }
    }
}

impl ChatService {
    pub fn builder(
        manager: Arc<ConversationManager>,
        conversations: Arc<dyn ConversationRepository>,
        probe: Arc<dyn ConnectivityProbe>,
        user_id: impl Into<String>,
    ) -> ChatServiceBuilder {
        ChatServiceBuilder {
            manager,
            conversations,
            probe,
            user_id: user_id.into(),
            sync: SyncParams::default(),
            progress: Arc::new(NoChatProgress),
            conversation_logger: Arc::new(NoConversationLogger),
        }
    }

    pub fn user_id(&self) -> &str {
        &self.inner.user_id
    }

    /// Send one user message.
    ///
    /// Never fails outright: LLM trouble comes back as `success: false` with
    /// an error reply, and an unreachable backend queues the message.
    pub async fn send_message(&self, text: &str) -> SendMessageResult {
        let text = text.trim();
        if text.is_empty() {
            return SendMessageResult {
                error: Some("Message is empty".to_string()),
                ..Default::default()
            };
        }

        let mut state = self.inner.state.lock().await;

        if !self.inner.probe.is_reachable().await {
            state.pending.push_back(PendingMessage::Outgoing {
                text: text.to_string(),
                queued_at: Utc::now(),
            });
            self.inner.note_queued(&state, "outgoing");
            self.ensure_retry_loop(&mut state);
            return SendMessageResult::queued();
        }

        if !state.pending.is_empty() {
            self.inner.drain_locked(&mut state).await;
            if !state.pending.is_empty() {
                // older work is still waiting; keep the log in order
                state.pending.push_back(PendingMessage::Outgoing {
                    text: text.to_string(),
                    queued_at: Utc::now(),
                });
                self.inner.note_queued(&state, "outgoing");
                self.ensure_retry_loop(&mut state);
                return SendMessageResult::queued();
            }
        }

        let result = self.inner.run_turn(&mut state, text.to_string()).await;
        if !state.pending.is_empty() {
            self.ensure_retry_loop(&mut state);
        }
        result
    }

    /// Try to drain the offline queue now. Returns how many items were handled.
    pub async fn flush_pending(&self) -> usize {
        let mut state = self.inner.state.lock().await;
        if state.pending.is_empty() || !self.inner.probe.is_reachable().await {
            return 0;
        }
        self.inner.drain_locked(&mut state).await
    }

    pub async fn pending_count(&self) -> usize {
        self.inner.state.lock().await.pending.len()
    }

    pub async fn pending_messages(&self) -> Vec<PendingMessage> {
        self.inner.state.lock().await.pending.iter().cloned().collect()
    }

    /// Replies produced by the background queue drain since the last call
    pub async fn take_deliveries(&self) -> Vec<SendMessageResult> {
        std::mem::take(&mut self.inner.state.lock().await.deliveries)
    }

    pub async fn context(&self) -> ConversationContext {
        self.inner.state.lock().await.context.clone()
    }

    pub async fn current_agent(&self) -> AgentType {
        self.inner.state.lock().await.context.current_agent
    }

    pub async fn conversation_id(&self) -> Option<String> {
        self.inner.state.lock().await.conversation_id.clone()
    }

    /// Pin the agent for the next turn only
    pub async fn force_agent(&self, agent: AgentType) {
        self.inner.state.lock().await.forced_agent = Some(agent);
    }

    /// Focus the conversation on one persona and hand it to `agent`
    pub async fn focus_persona(
        &self,
        persona_id: impl Into<String>,
        persona: PersonaSummary,
        agent: AgentType,
    ) {
        let mut state = self.inner.state.lock().await;
        let previous = state.context.current_agent;
        let context = std::mem::take(&mut state.context);
        state.context = context
            .with_target_persona(persona_id, persona)
            .with_agent(agent);
        if previous != agent {
            self.inner.progress.on_agent_switch(previous, agent);
        }
    }

    pub async fn clear_focus(&self) {
        let mut state = self.inner.state.lock().await;
        let context = std::mem::take(&mut state.context);
        state.context = context.without_target_persona();
    }

    /// Give agents the current persona roster
    pub async fn set_personas(&self, personas: Vec<PersonaSummary>) {
        let mut state = self.inner.state.lock().await;
        let context = std::mem::take(&mut state.context);
        state.context = context.with_personas(personas);
    }

    /// Start a new persisted conversation, resetting the context
    pub async fn start_conversation(
        &self,
        conversation_type: &str,
        topic: Option<&str>,
    ) -> Result<ConversationRecord, ChatError> {
        let mut new = NewConversation::new(self.inner.user_id.clone(), conversation_type);
        if let Some(topic) = topic {
            new = new.with_topic(topic);
        }
        let record = self.inner.conversations.create(&new).await?;
        info!("Started conversation {} ({})", record.id, conversation_type);

        let mut state = self.inner.state.lock().await;
        state.conversation_id = Some(record.id.clone());
        state.conversation_type = conversation_type.to_string();
        self.inner.reset_context(&mut state);
        Ok(record)
    }

    /// Close the current conversation with a summary and insights
    pub async fn complete_conversation(
        &self,
        summary: &str,
        key_insights: &[String],
    ) -> Result<ConversationRecord, ChatError> {
        let mut state = self.inner.state.lock().await;
        let id = state
            .conversation_id
            .clone()
            .ok_or(ChatError::NoConversation)?;
        let record = self
            .inner
            .conversations
            .complete(&id, summary, key_insights)
            .await?;
        info!("Completed conversation {}", id);
        state.conversation_id = None;
        self.inner.reset_context(&mut state);
        Ok(record)
    }

    /// Forget the current conversation and context. Queued work is kept.
    pub async fn clear(&self) {
        let mut state = self.inner.state.lock().await;
        state.conversation_id = None;
        state.forced_agent = None;
        self.inner.reset_context(&mut state);
        debug!("Chat cleared");
    }

    pub async fn tag_conversation(&self, tags: &[String]) -> Result<ConversationRecord, ChatError> {
        let id = self
            .conversation_id()
            .await
            .ok_or(ChatError::NoConversation)?;
        Ok(self.inner.conversations.add_tags(&id, tags).await?)
    }

    pub async fn search_conversations(
        &self,
        query: &str,
    ) -> Result<Vec<ConversationRecord>, ChatError> {
        Ok(self
            .inner
            .conversations
            .search(&self.inner.user_id, query)
            .await?)
    }

    /// Stop the background retry loop, if one is running
    pub async fn shutdown(&self) {
        if let Some(token) = self.inner.state.lock().await.retry.take() {
            token.cancel();
        }
    }

    /// Start the retry loop unless one is already running.
    ///
    /// Called with the state lock held; the loop clears `retry` under the
    /// same lock when it exits, so a queued item never misses a loop.
    fn ensure_retry_loop(&self, state: &mut ChatState) {
        if state.retry.as_ref().is_some_and(|t| !t.is_cancelled()) {
            return;
        }
        let token = CancellationToken::new();
        state.retry = Some(token.clone());
        let inner = Arc::clone(&self.inner);
        debug!("Starting offline retry loop");

        tokio::spawn(async move {
            for delay in inner.sync.retry_delays() {
                tokio::select! {
                    _ = token.cancelled() => return,
                    _ = tokio::time::sleep(delay) => {}
                }
                if !inner.probe.is_reachable().await {
                    debug!("Backend still unreachable, retrying in a while");
                    continue;
                }
                let mut state = inner.state.lock().await;
                if token.is_cancelled() {
                    return;
                }
                inner.drain_locked(&mut state).await;
                if state.pending.is_empty() {
                    state.retry = None;
                    token.cancel();
                    return;
                }
            }
        });
    }
}

impl Inner {
    fn reset_context(&self, state: &mut ChatState) {
        let personas = std::mem::take(&mut state.context.personas);
        state.context = self.manager.new_context().with_personas(personas);
    }

    fn note_queued(&self, state: &ChatState, kind: &str) {
        let pending = state.pending.len();
        info!("Backend unreachable, {} item(s) queued", pending);
        self.conversation_logger.log(ConversationEvent::new(
            "message_queued",
            json!({ "kind": kind, "pending": pending }),
        ));
        self.progress.on_queued(pending);
    }

    /// Answer one message and save both sides of the turn
    async fn run_turn(&self, state: &mut ChatState, text: String) -> SendMessageResult {
        let forced = state.forced_agent.take();
        let previous_agent = state.context.current_agent;
        let previous_len = state.context.history.len();
        let context = std::mem::take(&mut state.context);

        self.progress.on_thinking_start(previous_agent);
        let outcome = self
            .manager
            .process_message_with(context, &text, forced)
            .await;
        self.progress.on_thinking_end();

        if outcome.context.current_agent != previous_agent {
            self.progress
                .on_agent_switch(previous_agent, outcome.context.current_agent);
        }

        let mut result = SendMessageResult::from_turn(&outcome);
        let new_messages = outcome.new_messages(previous_len).to_vec();
        state.context = outcome.context;

        if !new_messages.is_empty()
            && let Err(failure) = self.persist(state, &new_messages).await
        {
            if failure.error.is_connectivity() {
                warn!("Could not save messages: {}", failure.error);
                for message in new_messages.into_iter().skip(failure.saved) {
                    state.pending.push_back(PendingMessage::Unpersisted(message));
                }
                self.note_queued(state, "unpersisted");
            } else {
                warn!("Backend refused to save messages: {}", failure.error);
                result.error = Some(format!("Could not save the conversation: {}", failure.error));
            }
        }
        result
    }

    /// Save messages in order, creating the conversation on first use.
    /// On failure, reports how many of `messages` were already saved.
    async fn persist(
        &self,
        state: &mut ChatState,
        messages: &[ConversationMessage],
    ) -> Result<(), SaveFailure> {
        let conversation_id = match &state.conversation_id {
            Some(id) => id.clone(),
            None => {
                let new = NewConversation::new(self.user_id.clone(), state.conversation_type.clone());
                let record = self
                    .conversations
                    .create(&new)
                    .await
                    .map_err(|error| SaveFailure { saved: 0, error })?;
                debug!("Created conversation {}", record.id);
                state.conversation_id = Some(record.id.clone());
                record.id
            }
        };
        for (saved, message) in messages.iter().enumerate() {
            self.conversations
                .append_message(&conversation_id, message)
                .await
                .map_err(|error| SaveFailure { saved, error })?;
        }
        Ok(())
    }

    /// Drain the queue front to back, stopping at the first save failure.
    async fn drain_locked(&self, state: &mut ChatState) -> usize {
        let mut handled = 0;
        while let Some(item) = state.pending.pop_front() {
            match item {
                PendingMessage::Unpersisted(message) => {
                    match self.persist(state, std::slice::from_ref(&message)).await {
                        Ok(()) => {}
                        Err(failure) if failure.error.is_connectivity() => {
                            warn!("Queue drain stopped: {}", failure.error);
                            state.pending.push_front(PendingMessage::Unpersisted(message));
                            break;
                        }
                        Err(failure) => {
                            warn!("Dropping queued message {}: {}", message.id, failure.error);
                            state.deliveries.push(SendMessageResult {
                                error: Some(format!(
                                    "A queued message could not be saved: {}",
                                    failure.error
                                )),
                                ..Default::default()
                            });
                        }
                    }
                }
                PendingMessage::Outgoing { text, queued_at } => {
                    debug!("Sending message queued at {}", queued_at);
                    let pending_before = state.pending.len();
                    let result = self.run_turn(state, text).await;
                    state.deliveries.push(result);
                    if state.pending.len() > pending_before {
                        // the turn could not be saved; its messages are now
                        // at the back and must go before older items
                        let failed: Vec<_> = state.pending.drain(pending_before..).collect();
                        for message in failed.into_iter().rev() {
                            state.pending.push_front(message);
                        }
                        handled += 1;
                        break;
                    }
                }
            }
            handled += 1;
        }

        if handled > 0 {
            info!(
                "Flushed {} queued item(s), {} remaining",
                handled,
                state.pending.len()
            );
            self.conversation_logger.log(ConversationEvent::new(
                "queue_flushed",
                json!({ "flushed": handled, "remaining": state.pending.len() }),
            ));
            self.progress.on_flushed(handled);
        }
        handled
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ports::llm_gateway::{ChatRequest, GatewayError, LlmGateway};
    use async_trait::async_trait;
    use bestself_domain::{AgentRegistry, ConversationStatus, Sender};
    use std::sync::Mutex as StdMutex;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;

    struct EchoGateway;

    #[async_trait]
    impl LlmGateway for EchoGateway {
        async fn chat(&self, request: &ChatRequest) -> Result<String, GatewayError> {
            let last = request.messages.last().map(|m| m.content.clone());
            Ok(format!("echo: {}", last.unwrap_or_default()))
        }
    }

    struct Switch(AtomicBool);

    #[async_trait]
    impl ConnectivityProbe for Switch {
        async fn is_reachable(&self) -> bool {
            self.0.load(Ordering::SeqCst)
        }
    }

    #[derive(Default)]
    struct Faults {
        /// Message text the backend answers with 422
        reject_text: Option<String>,
        /// 1-based append call that fails as unreachable
        drop_append: Option<usize>,
        appends: usize,
        rejected: usize,
    }

    /// Conversation store that fails while `online` is false
    struct MemoryConversations {
        online: Arc<Switch>,
        saved: StdMutex<Vec<(String, ConversationMessage)>>,
        created: StdMutex<usize>,
        faults: StdMutex<Faults>,
    }

    impl MemoryConversations {
        fn texts(&self) -> Vec<String> {
            self.saved
                .lock()
                .unwrap()
                .iter()
                .map(|(_, m)| m.text.clone())
                .collect()
        }

        fn check(&self) -> Result<(), BackendError> {
            if self.online.0.load(Ordering::SeqCst) {
                Ok(())
            } else {
                Err(BackendError::Unreachable("offline".to_string()))
            }
        }

        fn record(&self, id: &str) -> ConversationRecord {
            ConversationRecord {
                id: id.to_string(),
                user_id: "u1".to_string(),
                persona_id: None,
                conversation_type: DEFAULT_CONVERSATION_TYPE.to_string(),
                topic: None,
                status: ConversationStatus::Active,
                summary: None,
                key_insights: Vec::new(),
                tags: Vec::new(),
                started_at: Utc::now(),
                ended_at: None,
            }
        }
    }

    #[async_trait]
    impl ConversationRepository for MemoryConversations {
        async fn create(
            &self,
            _conversation: &NewConversation,
        ) -> Result<ConversationRecord, BackendError> {
            self.check()?;
            let mut created = self.created.lock().unwrap();
            *created += 1;
            Ok(self.record(&format!("c{}", *created)))
        }

        async fn append_message(
            &self,
            conversation_id: &str,
            message: &ConversationMessage,
        ) -> Result<(), BackendError> {
            self.check()?;
            {
                let mut faults = self.faults.lock().unwrap();
                faults.appends += 1;
                if faults.drop_append == Some(faults.appends) {
                    return Err(BackendError::Unreachable("connection reset".to_string()));
                }
                if faults.reject_text.as_deref() == Some(message.text.as_str()) {
                    faults.rejected += 1;
                    return Err(BackendError::Rejected {
                        status: 422,
                        message: "unprocessable".to_string(),
                    });
                }
            }
            self.saved
                .lock()
                .unwrap()
                .push((conversation_id.to_string(), message.clone()));
            Ok(())
        }

        async fn complete(
            &self,
            conversation_id: &str,
            summary: &str,
            key_insights: &[String],
        ) -> Result<ConversationRecord, BackendError> {
            self.check()?;
            let mut record = self.record(conversation_id);
            record.status = ConversationStatus::Completed;
            record.summary = Some(summary.to_string());
            record.key_insights = key_insights.to_vec();
            Ok(record)
        }

        async fn add_tags(
            &self,
            conversation_id: &str,
            tags: &[String],
        ) -> Result<ConversationRecord, BackendError> {
            let mut record = self.record(conversation_id);
            record.tags = tags.to_vec();
            Ok(record)
        }

        async fn search(
            &self,
            _user_id: &str,
            _query: &str,
        ) -> Result<Vec<ConversationRecord>, BackendError> {
            Ok(vec![self.record("c1")])
        }
    }

    fn setup(online: bool) -> (ChatService, Arc<Switch>, Arc<MemoryConversations>) {
        let switch = Arc::new(Switch(AtomicBool::new(online)));
        let conversations = Arc::new(MemoryConversations {
            online: switch.clone(),
            saved: StdMutex::new(Vec::new()),
            created: StdMutex::new(0),
            faults: StdMutex::new(Faults::default()),
        });
        let manager = Arc::new(ConversationManager::new(
            Arc::new(EchoGateway),
            Arc::new(AgentRegistry::default()),
        ));
        let service = ChatService::builder(manager, conversations.clone(), switch.clone(), "u1")
            .sync_params(
                SyncParams::default()
                    .with_retry_delays(Duration::from_millis(20), Duration::from_millis(20)),
            )
            .build();
        (service, switch, conversations)
    }

    #[tokio::test]
    async fn test_send_saves_both_messages() {
        let (service, _, conversations) = setup(true);
        let result = service.send_message("What is a persona?").await;

        assert!(result.success);
        assert!(!result.queued);
        assert_eq!(result.coach_reply.as_deref(), Some("echo: What is a persona?"));
        assert_eq!(result.agent, Some(AgentType::Educational));
        assert_eq!(
            conversations.texts(),
            vec!["What is a persona?", "echo: What is a persona?"]
        );
        assert_eq!(service.conversation_id().await.as_deref(), Some("c1"));
    }

    #[tokio::test]
    async fn test_empty_message_is_rejected() {
        let (service, _, _) = setup(true);
        let result = service.send_message("   ").await;
        assert!(!result.success);
        assert!(result.error.is_some());
    }

    #[tokio::test]
    async fn test_offline_send_queues_then_drains_in_order() {
        let (service, switch, conversations) = setup(false);

        let first = service.send_message("first").await;
        let second = service.send_message("second").await;
        assert!(first.success && first.queued);
        assert!(second.queued);
        assert_eq!(service.pending_count().await, 2);
        assert!(conversations.texts().is_empty());

        switch.0.store(true, Ordering::SeqCst);
        tokio::time::sleep(Duration::from_millis(200)).await;

        assert_eq!(service.pending_count().await, 0);
        let texts = conversations.texts();
        assert_eq!(texts, vec!["first", "echo: first", "second", "echo: second"]);

        let deliveries = service.take_deliveries().await;
        assert_eq!(deliveries.len(), 2);
        assert_eq!(deliveries[0].coach_reply.as_deref(), Some("echo: first"));
        assert!(service.take_deliveries().await.is_empty());
    }

    #[tokio::test]
    async fn test_manual_flush() {
        let (service, switch, conversations) = setup(false);
        service.send_message("hello").await;
        service.shutdown().await;

        assert_eq!(service.flush_pending().await, 0);
        switch.0.store(true, Ordering::SeqCst);
        assert_eq!(service.flush_pending().await, 1);
        assert_eq!(conversations.texts().len(), 2);
    }

    #[tokio::test]
    async fn test_context_history_grows() {
        let (service, _, _) = setup(true);
        service.send_message("hello").await;
        service.send_message("again").await;
        let ctx = service.context().await;
        assert_eq!(ctx.history.len(), 4);
        assert_eq!(ctx.history[0].sender, Sender::User);
    }

    #[tokio::test]
    async fn test_forced_agent_applies_once() {
        let (service, _, _) = setup(true);
        service.force_agent(AgentType::Goal).await;
        let first = service.send_message("hello").await;
        assert_eq!(first.agent, Some(AgentType::Goal));
        assert_eq!(service.current_agent().await, AgentType::Goal);
    }

    #[tokio::test]
    async fn test_focus_persona_routes_to_refinement() {
        let (service, _, _) = setup(true);
        service
            .focus_persona(
                "p1",
                PersonaSummary::new("Parent", "Be there"),
                AgentType::Refinement,
            )
            .await;
        let result = service.send_message("my kids are 4 and 7").await;
        assert_eq!(result.agent, Some(AgentType::Refinement));

        service.clear_focus().await;
        assert!(service.context().await.target_persona_id.is_none());
    }

    #[tokio::test]
    async fn test_lifecycle() {
        let (service, _, _) = setup(true);
        assert!(matches!(
            service.complete_conversation("done", &[]).await,
            Err(ChatError::NoConversation)
        ));

        let record = service
            .start_conversation("discovery", Some("Finding my roles"))
            .await
            .unwrap();
        assert_eq!(service.conversation_id().await, Some(record.id.clone()));

        service.send_message("hello").await;
        let done = service
            .complete_conversation("Found two personas", &["Parent matters most".to_string()])
            .await
            .unwrap();
        assert_eq!(done.status, ConversationStatus::Completed);
        assert!(service.conversation_id().await.is_none());
        assert!(service.context().await.history.is_empty());
    }

    #[tokio::test]
    async fn test_clear_keeps_roster() {
        let (service, _, _) = setup(true);
        service
            .set_personas(vec![PersonaSummary::new("Parent", "Be there")])
            .await;
        service.send_message("hello").await;
        service.clear().await;

        let ctx = service.context().await;
        assert!(ctx.history.is_empty());
        assert_eq!(ctx.personas.len(), 1);
    }

    #[tokio::test]
    async fn test_tag_requires_conversation() {
        let (service, _, _) = setup(true);
        assert!(service.tag_conversation(&["a".to_string()]).await.is_err());
        service.send_message("hello").await;
        let record = service.tag_conversation(&["a".to_string()]).await.unwrap();
        assert_eq!(record.tags, vec!["a"]);
        assert_eq!(service.search_conversations("a").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_rejected_save_is_reported_not_queued() {
        let (service, _, conversations) = setup(true);
        conversations.faults.lock().unwrap().reject_text = Some("bad".to_string());

        let bad = service.send_message("bad").await;
        assert!(!bad.queued);
        assert!(bad.error.as_deref().unwrap().contains("422"));
        assert_eq!(service.pending_count().await, 0);

        service.send_message("next").await;
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert_eq!(service.pending_count().await, 0);
        assert_eq!(conversations.faults.lock().unwrap().rejected, 1);
        assert_eq!(conversations.texts(), vec!["next", "echo: next"]);
    }

    #[tokio::test]
    async fn test_partial_save_queues_only_the_unsaved_tail() {
        let (service, _, conversations) = setup(true);
        conversations.faults.lock().unwrap().drop_append = Some(2);

        let result = service.send_message("hello").await;
        assert!(result.success);
        assert_eq!(service.pending_count().await, 1);
        assert!(matches!(
            &service.pending_messages().await[0],
            PendingMessage::Unpersisted(m) if m.text == "echo: hello"
        ));

        service.flush_pending().await;
        assert_eq!(conversations.texts(), vec!["hello", "echo: hello"]);
    }

    #[tokio::test]
    async fn test_send_waits_behind_undrained_queue() {
        let (service, _, conversations) = setup(true);
        conversations.faults.lock().unwrap().drop_append = Some(2);
        service.send_message("first").await;
        // the retry loop drains the tail on its next pass
        conversations.faults.lock().unwrap().drop_append = Some(3);

        let second = service.send_message("second").await;
        assert!(second.queued);
        assert_eq!(service.pending_count().await, 2);

        tokio::time::sleep(Duration::from_millis(200)).await;
        assert_eq!(service.pending_count().await, 0);
        assert_eq!(
            conversations.texts(),
            vec!["first", "echo: first", "second", "echo: second"]
        );
    }

    #[tokio::test]
    async fn test_drain_drops_rejected_message() {
        let (service, _, conversations) = setup(true);
        conversations.faults.lock().unwrap().drop_append = Some(2);
        service.send_message("hello").await;
        service.shutdown().await;
        conversations.faults.lock().unwrap().reject_text = Some("echo: hello".to_string());

        assert_eq!(service.flush_pending().await, 1);
        assert_eq!(service.pending_count().await, 0);
        let deliveries = service.take_deliveries().await;
        assert_eq!(deliveries.len(), 1);
        assert!(deliveries[0].error.as_deref().unwrap().contains("could not be saved"));
        assert_eq!(conversations.texts(), vec!["hello"]);
    }
}
