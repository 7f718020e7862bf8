//! Persona entities

use crate::conversation::context::PersonaSummary;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Hard cap on personas per user
pub const MAX_PERSONAS: usize = 9;

/// A role the user embodies, with the principle that defines excellence in it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Persona {
    pub id: String,
    pub name: String,
    pub north_star: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Persona {
    pub fn summary(&self) -> PersonaSummary {
        PersonaSummary::new(self.name.clone(), self.north_star.clone())
    }

    /// Apply a patch, touching `updated_at` only when something changed
    pub fn apply_patch(&mut self, patch: &PersonaPatch) -> bool {
        let mut changed = false;
        if let Some(name) = &patch.name
            && *name != self.name
        {
            self.name = name.clone();
            changed = true;
        }
        if let Some(north_star) = &patch.north_star
            && *north_star != self.north_star
        {
            self.north_star = north_star.clone();
            changed = true;
        }
        if changed {
            self.updated_at = Utc::now();
        }
        changed
    }
}

/// Fields for a persona that does not exist yet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewPersona {
    pub user_id: String,
    pub name: String,
    pub north_star: String,
}

/// A partial update; `None` leaves the field alone
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonaPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub north_star: Option<String>,
}

impl PersonaPatch {
    pub fn name(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            north_star: None,
        }
    }

    pub fn north_star(north_star: impl Into<String>) -> Self {
        Self {
            name: None,
            north_star: Some(north_star.into()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.north_star.is_none()
    }

    /// Combine two patches; fields set in `other` win
    pub fn merge(self, other: PersonaPatch) -> Self {
        Self {
            name: other.name.or(self.name),
            north_star: other.north_star.or(self.north_star),
        }
    }
}
