use async_trait::async_trait;
use bestself_application::{
    AuthPort, BackendError, ConnectivityProbe, ConversationRepository, GoalRepository,
    PersonaRepository,
};
use bestself_domain::{
    ConversationMessage, ConversationRecord, ConversationStatus, Goal, GoalPatch, GoalStatus,
    NewConversation, NewGoal, NewPersona, NewUser, Persona, PersonaPatch, User,
};
use chrono::Utc;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Default)]
struct Store {
    users: Vec<User>,
    /// Magic-link token -> email
    links: HashMap<String, String>,
    personas: Vec<(String, Persona)>,
    goals: Vec<Goal>,
    conversations: Vec<ConversationRecord>,
    messages: HashMap<String, Vec<ConversationMessage>>,
}

pub struct InMemoryBackend {
    store: Mutex<Store>,
    next_id: AtomicU64,
    online: AtomicBool,
}

impl Default for InMemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl InMemoryBackend {
    pub fn new() -> Self {
        Self {
            store: Mutex::new(Store::default()),
            next_id: AtomicU64::new(1),
            online: AtomicBool::new(true),
        }
    }

    /// Simulate losing or regaining the backend
    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }

    /// The token a real backend would have emailed for `email`
    pub async fn pending_token(&self, email: &str) -> Option<String> {
        self.store
            .lock()
            .await
            .links
            .iter()
            .find(|(_, e)| e.as_str() == email)
            .map(|(token, _)| token.clone())
    }

    pub async fn messages(&self, conversation_id: &str) -> Vec<ConversationMessage> {
        self.store
            .lock()
            .await
            .messages
            .get(conversation_id)
            .cloned()
            .unwrap_or_default()
    }

    fn id(&self, prefix: &str) -> String {
        format!("{}-{}", prefix, self.next_id.fetch_add(1, Ordering::Relaxed))
    }

    fn check_online(&self) -> Result<(), BackendError> {
        if self.online.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(BackendError::Unreachable("in-memory backend is offline".to_string()))
        }
    }

    fn find_or_create_user(&self, store: &mut Store, email: &str) -> User {
        if let Some(user) = store.users.iter().find(|u| u.email == email) {
            return user.clone();
        }
        let user = User {
            id: self.id("user"),
            name: None,
            email: email.to_string(),
            created_at: Utc::now(),
        };
        store.users.push(user.clone());
        user
    }
}

fn not_found(kind: &str, id: &str) -> BackendError {
    BackendError::NotFound(format!("{kind} {id}"))
}

#[async_trait]
impl AuthPort for InMemoryBackend {
    async fn request_magic_link(&self, email: &str) -> Result<(), BackendError> {
        self.check_online()?;
        let token = self.id("token");
        debug!("Issued sign-in token for {}", email);
        self.store
            .lock()
            .await
            .links
            .insert(token, email.to_string());
        Ok(())
    }

    async fn verify(&self, token: &str) -> Result<User, BackendError> {
        self.check_online()?;
        let mut store = self.store.lock().await;
        let email = store
            .links
            .remove(token)
            .ok_or_else(|| not_found("token", token))?;
        Ok(self.find_or_create_user(&mut store, &email))
    }

    async fn register(&self, new: &NewUser) -> Result<User, BackendError> {
        self.check_online()?;
        let mut store = self.store.lock().await;
        if store.users.iter().any(|u| u.email == new.email) {
            return Err(BackendError::Rejected {
                status: 409,
                message: format!("{} is already registered", new.email),
            });
        }
        let mut user = self.find_or_create_user(&mut store, &new.email);
        user.name = new.name.clone();
        if let Some(stored) = store.users.iter_mut().find(|u| u.id == user.id) {
            stored.name = user.name.clone();
        }
        Ok(user)
    }
}

#[async_trait]
impl PersonaRepository for InMemoryBackend {
    async fn list(&self, user_id: &str) -> Result<Vec<Persona>, BackendError> {
        self.check_online()?;
        Ok(self
            .store
            .lock()
            .await
            .personas
            .iter()
            .filter(|(owner, _)| owner == user_id)
            .map(|(_, p)| p.clone())
            .collect())
    }

    async fn create(&self, new: &NewPersona) -> Result<Persona, BackendError> {
        self.check_online()?;
        let now = Utc::now();
        let persona = Persona {
            id: self.id("persona"),
            name: new.name.clone(),
            north_star: new.north_star.clone(),
            created_at: now,
            updated_at: now,
        };
        self.store
            .lock()
            .await
            .personas
            .push((new.user_id.clone(), persona.clone()));
        Ok(persona)
    }

    async fn update(&self, id: &str, patch: &PersonaPatch) -> Result<Persona, BackendError> {
        self.check_online()?;
        let mut store = self.store.lock().await;
        let (_, persona) = store
            .personas
            .iter_mut()
            .find(|(_, p)| p.id == id)
            .ok_or_else(|| not_found("persona", id))?;
        persona.apply_patch(patch);
        Ok(persona.clone())
    }

    async fn delete(&self, id: &str) -> Result<(), BackendError> {
        self.check_online()?;
        let mut store = self.store.lock().await;
        let before = store.personas.len();
        store.personas.retain(|(_, p)| p.id != id);
        if store.personas.len() == before {
            return Err(not_found("persona", id));
        }
        for goal in store
            .goals
            .iter_mut()
            .filter(|g| g.persona_id.as_deref() == Some(id))
        {
            goal.persona_id = None;
        }
        Ok(())
    }
}

#[async_trait]
impl GoalRepository for InMemoryBackend {
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Goal>, BackendError> {
        self.check_online()?;
        Ok(self
            .store
            .lock()
            .await
            .goals
            .iter()
            .filter(|g| g.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn list_for_persona(&self, persona_id: &str) -> Result<Vec<Goal>, BackendError> {
        self.check_online()?;
        Ok(self
            .store
            .lock()
            .await
            .goals
            .iter()
            .filter(|g| g.persona_id.as_deref() == Some(persona_id))
            .cloned()
            .collect())
    }

    async fn create(&self, new: &NewGoal) -> Result<Goal, BackendError> {
        self.check_online()?;
        let goal = Goal {
            id: self.id("goal"),
            user_id: new.user_id.clone(),
            persona_id: new.persona_id.clone(),
            name: new.name.clone(),
            acceptance_criteria: new.acceptance_criteria.clone(),
            review_date: new.review_date.clone(),
            status: GoalStatus::Active,
            success_percentage: 0,
            review_notes: None,
            created_at: Utc::now(),
        };
        self.store.lock().await.goals.push(goal.clone());
        Ok(goal)
    }

    async fn update(&self, id: &str, patch: &GoalPatch) -> Result<Goal, BackendError> {
        self.check_online()?;
        let mut store = self.store.lock().await;
        let goal = store
            .goals
            .iter_mut()
            .find(|g| g.id == id)
            .ok_or_else(|| not_found("goal", id))?;
        goal.apply_patch(patch);
        Ok(goal.clone())
    }

    async fn delete(&self, id: &str) -> Result<(), BackendError> {
        self.check_online()?;
        self.store.lock().await.goals.retain(|g| g.id != id);
        Ok(())
    }
}

#[async_trait]
impl ConversationRepository for InMemoryBackend {
    async fn create(
        &self,
        new: &NewConversation,
    ) -> Result<ConversationRecord, BackendError> {
        self.check_online()?;
        let record = ConversationRecord {
            id: self.id("conversation"),
            user_id: new.user_id.clone(),
            persona_id: new.persona_id.clone(),
            conversation_type: new.conversation_type.clone(),
            topic: new.topic.clone(),
            status: ConversationStatus::Active,
            summary: None,
            key_insights: Vec::new(),
            tags: Vec::new(),
            started_at: Utc::now(),
            ended_at: None,
        };
        self.store.lock().await.conversations.push(record.clone());
        Ok(record)
    }

    async fn append_message(
        &self,
        conversation_id: &str,
        message: &ConversationMessage,
    ) -> Result<(), BackendError> {
        self.check_online()?;
        let mut store = self.store.lock().await;
        if !store.conversations.iter().any(|c| c.id == conversation_id) {
            return Err(not_found("conversation", conversation_id));
        }
        store
            .messages
            .entry(conversation_id.to_string())
            .or_default()
            .push(message.clone());
        Ok(())
    }

    async fn complete(
        &self,
        conversation_id: &str,
        summary: &str,
        key_insights: &[String],
    ) -> Result<ConversationRecord, BackendError> {
        self.check_online()?;
        let mut store = self.store.lock().await;
        let record = store
            .conversations
            .iter_mut()
            .find(|c| c.id == conversation_id)
            .ok_or_else(|| not_found("conversation", conversation_id))?;
        record.status = ConversationStatus::Completed;
        record.summary = Some(summary.to_string());
        record.key_insights = key_insights.to_vec();
        record.ended_at = Some(Utc::now());
        Ok(record.clone())
    }

    async fn add_tags(
        &self,
        conversation_id: &str,
        tags: &[String],
    ) -> Result<ConversationRecord, BackendError> {
        self.check_online()?;
        let mut store = self.store.lock().await;
        let record = store
            .conversations
            .iter_mut()
            .find(|c| c.id == conversation_id)
            .ok_or_else(|| not_found("conversation", conversation_id))?;
        for tag in tags {
            if !record.tags.contains(tag) {
                record.tags.push(tag.clone());
            }
        }
        Ok(record.clone())
    }

    async fn search(
        &self,
        user_id: &str,
        query: &str,
    ) -> Result<Vec<ConversationRecord>, BackendError> {
        self.check_online()?;
        let needle = query.to_lowercase();
        let store = self.store.lock().await;
        let matches = |record: &ConversationRecord| {
            let fields = [record.topic.as_deref(), record.summary.as_deref()];
            fields
                .into_iter()
                .flatten()
                .chain(record.tags.iter().map(String::as_str))
                .chain(record.key_insights.iter().map(String::as_str))
                .chain(
                    store
                        .messages
                        .get(&record.id)
                        .into_iter()
                        .flatten()
                        .map(|m| m.text.as_str()),
                )
                .any(|text| text.to_lowercase().contains(&needle))
        };
        Ok(store
            .conversations
            .iter()
            .filter(|c| c.user_id == user_id && matches(c))
            .cloned()
            .collect())
    }
}

#[async_trait]
impl ConnectivityProbe for InMemoryBackend {
    async fn is_reachable(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bestself_domain::AgentType;

    #[tokio::test]
    async fn test_magic_link_round() {
        let backend = InMemoryBackend::new();
        backend.request_magic_link("sam@example.com").await.unwrap();
        let token = backend.pending_token("sam@example.com").await.unwrap();

        let user = backend.verify(&token).await.unwrap();
        assert_eq!(user.email, "sam@example.com");
        // Tokens are single use
        assert!(matches!(
            backend.verify(&token).await,
            Err(BackendError::NotFound(_))
        ));

        backend.request_magic_link("sam@example.com").await.unwrap();
        let again = backend
            .verify(&backend.pending_token("sam@example.com").await.unwrap())
            .await
            .unwrap();
        assert_eq!(again.id, user.id);
    }

    #[tokio::test]
    async fn test_personas_are_scoped_to_user() {
        let backend = InMemoryBackend::new();
        let parent = PersonaRepository::create(
            &backend,
            &NewPersona {
                user_id: "u1".to_string(),
                name: "Parent".to_string(),
                north_star: "Raise kind kids".to_string(),
            },
        )
        .await
        .unwrap();
        assert_eq!(backend.list("u1").await.unwrap().len(), 1);
        assert!(backend.list("u2").await.unwrap().is_empty());

        let renamed = PersonaRepository::update(
            &backend,
            &parent.id,
            &PersonaPatch {
                name: Some("Father".to_string()),
                north_star: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(renamed.name, "Father");
        assert_eq!(renamed.north_star, "Raise kind kids");

        PersonaRepository::delete(&backend, &parent.id).await.unwrap();
        assert!(PersonaRepository::delete(&backend, &parent.id).await.is_err());
    }

    #[tokio::test]
    async fn test_offline_backend_reports_unreachable() {
        let backend = InMemoryBackend::new();
        backend.set_online(false);
        assert!(!backend.is_reachable().await);
        let err = backend.list("u1").await.unwrap_err();
        assert!(err.is_connectivity());

        backend.set_online(true);
        assert!(backend.is_reachable().await);
    }

    #[tokio::test]
    async fn test_conversation_lifecycle_and_search() {
        let backend = InMemoryBackend::new();
        let record = ConversationRepository::create(
            &backend,
            &NewConversation::new("u1", "coaching").with_topic("Finding my roles"),
        )
        .await
        .unwrap();
        backend
            .append_message(
                &record.id,
                &ConversationMessage::coach("Tell me about your work", AgentType::Discovery),
            )
            .await
            .unwrap();
        backend
            .add_tags(&record.id, &["career".to_string(), "career".to_string()])
            .await
            .unwrap();
        let done = backend
            .complete(&record.id, "Named two personas", &["Leader".to_string()])
            .await
            .unwrap();
        assert!(!done.is_active());
        assert_eq!(done.tags, vec!["career"]);

        for query in ["CAREER", "your work", "two personas", "roles"] {
            assert_eq!(backend.search("u1", query).await.unwrap().len(), 1, "{query}");
        }
        assert!(backend.search("u1", "holiday").await.unwrap().is_empty());
        assert!(backend.search("u2", "career").await.unwrap().is_empty());
        assert_eq!(backend.messages(&record.id).await.len(), 1);
    }
}
