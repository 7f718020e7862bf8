//! Persona storage port

use crate::ports::backend_error::BackendError;
use async_trait::async_trait;
use bestself_domain::{NewPersona, Persona, PersonaPatch};

#[async_trait]
pub trait PersonaRepository: Send + Sync {
    async fn list(&self, user_id: &str) -> Result<Vec<Persona>, BackendError>;

    async fn create(&self, persona: &NewPersona) -> Result<Persona, BackendError>;

    async fn update(&self, id: &str, patch: &PersonaPatch) -> Result<Persona, BackendError>;

    async fn delete(&self, id: &str) -> Result<(), BackendError>;
}
