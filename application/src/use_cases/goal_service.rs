//! Goal service use case.
//!
//! Keeps the user's goals in memory and applies coach goal actions.
//! Updates are keyed by the goal's original name (case-insensitive).

use crate::ports::backend_error::BackendError;
use crate::ports::goal_repository::GoalRepository;
use bestself_domain::{
    DomainError, Goal, GoalAction, GoalActionKind, GoalPatch, GoalStatus, NewGoal,
    default_review_date, find_goal_by_name,
};
use chrono::Utc;
use futures::future::try_join_all;
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

#[derive(Error, Debug, Clone, PartialEq)]
pub enum GoalServiceError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Could not sync goals: {0}")]
    Backend(#[from] BackendError),
}

/// What happened when a batch of coach goal actions was applied
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GoalActionReport {
    pub created: Vec<Goal>,
    pub updated: Vec<Goal>,
    pub errors: Vec<String>,
}

#[derive(Clone)]
pub struct GoalService {
    repository: Arc<dyn GoalRepository>,
    user_id: String,
    goals: Arc<RwLock<Vec<Goal>>>,
}

impl GoalService {
    pub fn new(repository: Arc<dyn GoalRepository>, user_id: impl Into<String>) -> Self {
        Self {
            repository,
            user_id: user_id.into(),
            goals: Arc::new(RwLock::new(Vec::new())),
        }
    }

    /// Replace the cache with every goal the user owns
    pub async fn load(&self) -> Result<Vec<Goal>, GoalServiceError> {
        let goals = self.repository.list_for_user(&self.user_id).await?;
        debug!("Loaded {} goals", goals.len());
        *self.goals.write().await = goals.clone();
        Ok(goals)
    }

    /// Fetch goals for several personas concurrently, without touching the cache
    pub async fn load_for_personas(
        &self,
        persona_ids: &[String],
    ) -> Result<Vec<Goal>, GoalServiceError> {
        let lists = try_join_all(
            persona_ids
                .iter()
                .map(|id| self.repository.list_for_persona(id)),
        )
        .await?;

        let mut seen = HashSet::new();
        Ok(lists
            .into_iter()
            .flatten()
            .filter(|g| seen.insert(g.id.clone()))
            .collect())
    }

    pub async fn goals(&self) -> Vec<Goal> {
        self.goals.read().await.clone()
    }

    pub async fn goals_for_persona(&self, persona_id: &str) -> Vec<Goal> {
        self.goals
            .read()
            .await
            .iter()
            .filter(|g| g.persona_id.as_deref() == Some(persona_id))
            .cloned()
            .collect()
    }

    pub async fn find(&self, name: &str) -> Option<Goal> {
        find_goal_by_name(&self.goals.read().await, name).cloned()
    }

    pub async fn create(
        &self,
        name: &str,
        acceptance_criteria: Option<String>,
        review_date: Option<String>,
        persona_id: Option<&str>,
    ) -> Result<Goal, GoalServiceError> {
        let new = NewGoal {
            user_id: self.user_id.clone(),
            persona_id: persona_id.map(str::to_string),
            name: name.to_string(),
            acceptance_criteria,
            review_date: review_date
                .unwrap_or_else(|| default_review_date(Utc::now().date_naive())),
        };
        let goal = self.repository.create(&new).await?;
        info!("Created goal {}", goal.name);
        self.goals.write().await.push(goal.clone());
        Ok(goal)
    }

    pub async fn update(&self, id: &str, patch: &GoalPatch) -> Result<Goal, GoalServiceError> {
        let snapshot = {
            let mut goals = self.goals.write().await;
            let snapshot = goals.clone();
            let goal = goals
                .iter_mut()
                .find(|g| g.id == id)
                .ok_or_else(|| DomainError::GoalNotFound(id.to_string()))?;
            goal.apply_patch(patch);
            snapshot
        };

        match self.repository.update(id, patch).await {
            Ok(updated) => {
                let mut goals = self.goals.write().await;
                if let Some(slot) = goals.iter_mut().find(|g| g.id == updated.id) {
                    *slot = updated.clone();
                }
                Ok(updated)
            }
            Err(e) => {
                warn!("Goal sync failed ({}), reloading", e);
                if self.load().await.is_err() {
                    *self.goals.write().await = snapshot;
                }
                Err(e.into())
            }
        }
    }

    /// Record progress on a goal found by name
    pub async fn set_progress(
        &self,
        name: &str,
        status: GoalStatus,
        success_percentage: u8,
        review_notes: Option<String>,
    ) -> Result<Goal, GoalServiceError> {
        let goal = self
            .find(name)
            .await
            .ok_or_else(|| DomainError::GoalNotFound(name.to_string()))?;
        self.update(
            &goal.id,
            &GoalPatch::progress(status, success_percentage, review_notes),
        )
        .await
    }

    pub async fn delete(&self, id: &str) -> Result<(), GoalServiceError> {
        self.repository.delete(id).await?;
        self.goals.write().await.retain(|g| g.id != id);
        Ok(())
    }

    /// Apply coach actions in reply order; new goals attach to `persona_id`
    pub async fn apply_actions(
        &self,
        actions: &[GoalAction],
        persona_id: Option<&str>,
    ) -> GoalActionReport {
        let mut report = GoalActionReport::default();
        for action in actions {
            let outcome = match action.kind {
                GoalActionKind::Create => self
                    .create(
                        &action.name,
                        action.acceptance_criteria.clone(),
                        action.review_date.clone(),
                        persona_id,
                    )
                    .await
                    .map(|g| report.created.push(g)),
                GoalActionKind::Update => self
                    .apply_update(action)
                    .await
                    .map(|g| report.updated.push(g)),
            };
            if let Err(e) = outcome {
                warn!("Goal action on '{}' failed: {}", action.lookup_name(), e);
                report.errors.push(e.to_string());
            }
        }
        report
    }

    async fn apply_update(&self, action: &GoalAction) -> Result<Goal, GoalServiceError> {
        let lookup = action.lookup_name();
        let goal = self
            .find(lookup)
            .await
            .ok_or_else(|| DomainError::GoalNotFound(lookup.to_string()))?;
        let patch = GoalPatch {
            name: (goal.name != action.name).then(|| action.name.clone()),
            acceptance_criteria: action.acceptance_criteria.clone(),
            review_date: action.review_date.clone(),
            ..Default::default()
        };
        self.update(&goal.id, &patch).await
    }
}
