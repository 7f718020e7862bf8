//! Persona service use case.
//!
//! Keeps a local copy of the user's personas and syncs changes to the
//! backend. Mutations are applied locally first; if the backend rejects
//! them the cache is reloaded from the backend (or restored from the
//! snapshot taken before the change when the reload fails too).

use crate::ports::backend_error::BackendError;
use crate::ports::persona_repository::PersonaRepository;
use crate::use_cases::debounce::FieldDebouncer;
use bestself_domain::persona::{ensure_capacity, find_by_name};
use bestself_domain::{
    DomainError, NewPersona, Persona, PersonaAction, PersonaChange, PersonaPatch, PersonaSummary,
    resolve_action,
};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum PersonaServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Could not sync personas: {0}")]
    Backend(#[from] BackendError),
}

/// A persona field the user can edit directly
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersonaField {
    Name,
    NorthStar,
}

impl PersonaField {
    pub fn as_str(&self) -> &'static str {
        match self {
            PersonaField::Name => "name",
            PersonaField::NorthStar => "north_star",
        }
    }

    fn patch(&self, value: &str) -> PersonaPatch {
        match self {
            PersonaField::Name => PersonaPatch::name(value),
            PersonaField::NorthStar => PersonaPatch::north_star(value),
        }
    }
}

/// What happened when a batch of coach actions was applied
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PersonaActionReport {
    pub created: Vec<Persona>,
    pub updated: Vec<Persona>,
    pub deleted: Vec<String>,
    /// One message per action that could not be applied
    pub errors: Vec<String>,
}

impl PersonaActionReport {
    pub fn is_empty(&self) -> bool {
        self.created.is_empty()
            && self.updated.is_empty()
            && self.deleted.is_empty()
            && self.errors.is_empty()
    }
}

#[derive(Clone)]
pub struct PersonaService {
    repository: Arc<dyn PersonaRepository>,
    user_id: String,
    personas: Arc<RwLock<Vec<Persona>>>,
    debouncer: FieldDebouncer,
}

impl PersonaService {
    pub fn new(repository: Arc<dyn PersonaRepository>, user_id: impl Into<String>) -> Self {
        Self {
            repository,
            user_id: user_id.into(),
            personas: Arc::new(RwLock::new(Vec::new())),
            debouncer: FieldDebouncer::new(Duration::from_millis(1000)),
        }
    }

    pub fn with_debounce(mut self, delay: Duration) -> Self {
        self.debouncer = FieldDebouncer::new(delay);
        self
    }

    /// Replace the cache with the backend's list
    pub async fn load(&self) -> Result<Vec<Persona>, PersonaServiceError> {
        let loaded = self.repository.list(&self.user_id).await?;
        debug!("Loaded {} personas", loaded.len());
        *self.personas.write().await = loaded.clone();
        Ok(loaded)
    }

    pub async fn personas(&self) -> Vec<Persona> {
        self.personas.read().await.clone()
    }

    pub async fn summaries(&self) -> Vec<PersonaSummary> {
        self.personas
            .read()
            .await
            .iter()
            .map(Persona::summary)
            .collect()
    }

    pub async fn find(&self, name: &str) -> Option<Persona> {
        find_by_name(&self.personas.read().await, name).cloned()
    }

    pub async fn create(
        &self,
        name: &str,
        north_star: &str,
    ) -> Result<Persona, PersonaServiceError> {
        let snapshot = {
            let mut personas = self.personas.write().await;
            ensure_capacity(personas.len())?;
            let snapshot = personas.clone();
            personas.push(local_persona(name, north_star));
            snapshot
        };

        let new = NewPersona {
            user_id: self.user_id.clone(),
            name: name.to_string(),
            north_star: north_star.to_string(),
        };
        match self.repository.create(&new).await {
            Ok(created) => {
                info!("Created persona {}", created.name);
                let mut personas = self.personas.write().await;
                let placeholder = personas
                    .iter_mut()
                    .find(|p| p.id.starts_with(LOCAL_ID_PREFIX) && p.name == name);
                if let Some(slot) = placeholder {
                    *slot = created.clone();
                } else {
                    personas.push(created.clone());
                }
                Ok(created)
            }
            Err(e) => {
                self.rollback(snapshot, &e).await;
                Err(e.into())
            }
        }
    }

    pub async fn update(
        &self,
        id: &str,
        patch: &PersonaPatch,
    ) -> Result<Persona, PersonaServiceError> {
        let snapshot = {
            let mut personas = self.personas.write().await;
            let snapshot = personas.clone();
            let persona = personas
                .iter_mut()
                .find(|p| p.id == id)
                .ok_or_else(|| DomainError::PersonaNotFound(id.to_string()))?;
            persona.apply_patch(patch);
            snapshot
        };

        match self.repository.update(id, patch).await {
            Ok(updated) => {
                self.replace(updated.clone()).await;
                Ok(updated)
            }
            Err(e) => {
                self.rollback(snapshot, &e).await;
                Err(e.into())
            }
        }
    }

    pub async fn delete(&self, id: &str) -> Result<(), PersonaServiceError> {
        let snapshot = {
            let mut personas = self.personas.write().await;
            let snapshot = personas.clone();
            let before = personas.len();
            personas.retain(|p| p.id != id);
            if personas.len() == before {
                return Err(DomainError::PersonaNotFound(id.to_string()).into());
            }
            snapshot
        };

        if let Err(e) = self.repository.delete(id).await {
            self.rollback(snapshot, &e).await;
            return Err(e.into());
        }
        Ok(())
    }

    /// Apply coach actions in order. Failures are collected, not fatal.
    pub async fn apply_actions(&self, actions: &[PersonaAction]) -> PersonaActionReport {
        let mut report = PersonaActionReport::default();
        for action in actions {
            let change = {
                let personas = self.personas.read().await;
                resolve_action(&personas, action)
            };
            let outcome = match change {
                Ok(PersonaChange::Create { name, north_star }) => self
                    .create(&name, &north_star)
                    .await
                    .map(|p| report.created.push(p)),
                Ok(PersonaChange::Update { id, patch }) => self
                    .update(&id, &patch)
                    .await
                    .map(|p| report.updated.push(p)),
                Ok(PersonaChange::Delete { id }) => self
                    .delete(&id)
                    .await
                    .map(|()| report.deleted.push(action.name.clone())),
                Err(e) => Err(e.into()),
            };
            if let Err(e) = outcome {
                warn!("Persona action on '{}' failed: {}", action.name, e);
                report.errors.push(e.to_string());
            }
        }
        report
    }

    /// Edit one field now and write it to the backend after the quiet period
    pub async fn schedule_field_edit(
        &self,
        id: &str,
        field: PersonaField,
        value: &str,
    ) -> Result<(), PersonaServiceError> {
        let patch = field.patch(value);
        {
            let mut personas = self.personas.write().await;
            let persona = personas
                .iter_mut()
                .find(|p| p.id == id)
                .ok_or_else(|| DomainError::PersonaNotFound(id.to_string()))?;
            persona.apply_patch(&patch);
        }

        let service = self.clone();
        let id_owned = id.to_string();
        self.debouncer.schedule(id, field.as_str(), async move {
            if let Err(e) = service.repository.update(&id_owned, &patch).await {
                warn!("Debounced persona edit failed: {}", e);
                if let Err(e) = service.load().await {
                    warn!("Reload after failed edit failed: {}", e);
                }
            }
        });
        Ok(())
    }

    /// Number of field edits still waiting to be written
    pub fn pending_edits(&self) -> usize {
        self.debouncer.pending()
    }

    /// Wait up to two quiet periods for scheduled edits, then drop the rest
    pub async fn flush_edits(&self) {
        let deadline = tokio::time::Instant::now() + self.debouncer.delay() * 2;
        while self.debouncer.pending() > 0 && tokio::time::Instant::now() < deadline {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        let dropped = self.debouncer.pending();
        if dropped > 0 {
            warn!("Dropping {} unsaved persona edit(s)", dropped);
            self.debouncer.cancel_all();
        }
    }

    async fn replace(&self, persona: Persona) {
        let mut personas = self.personas.write().await;
        match personas.iter_mut().find(|p| p.id == persona.id) {
            Some(slot) => *slot = persona,
            None => personas.push(persona),
        }
    }

    async fn rollback(&self, snapshot: Vec<Persona>, cause: &BackendError) {
        warn!("Persona sync failed ({}), reloading", cause);
        if self.load().await.is_err() {
            *self.personas.write().await = snapshot;
        }
    }
}

const LOCAL_ID_PREFIX: &str = "local-";

fn local_persona(name: &str, north_star: &str) -> Persona {
    let now = Utc::now();
    Persona {
        id: format!("{LOCAL_ID_PREFIX}{}", now.timestamp_nanos_opt().unwrap_or_default()),
        name: name.to_string(),
        north_star: north_star.to_string(),
        created_at: now,
        updated_at: now,
    }
}
