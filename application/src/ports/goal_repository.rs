//! Goal storage port

use crate::ports::backend_error::BackendError;
use async_trait::async_trait;
use bestself_domain::{Goal, GoalPatch, NewGoal};

#[async_trait]
pub trait GoalRepository: Send + Sync {
    async fn list_for_user(&self, user_id: &str) -> Result<Vec<Goal>, BackendError>;

    async fn list_for_persona(&self, persona_id: &str) -> Result<Vec<Goal>, BackendError>;

    async fn create(&self, goal: &NewGoal) -> Result<Goal, BackendError>;

    async fn update(&self, id: &str, patch: &GoalPatch) -> Result<Goal, BackendError>;

    async fn delete(&self, id: &str) -> Result<(), BackendError>;
}
