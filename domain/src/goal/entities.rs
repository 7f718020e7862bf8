//! Goal entities

use crate::core::error::DomainError;
use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Days added to today when a goal arrives without a review date
pub const DEFAULT_REVIEW_DAYS: u64 = 30;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalStatus {
    #[default]
    Active,
    Completed,
    Refined,
}

impl GoalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalStatus::Active => "active",
            GoalStatus::Completed => "completed",
            GoalStatus::Refined => "refined",
        }
    }
}

impl fmt::Display for GoalStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for GoalStatus {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "active" => Ok(GoalStatus::Active),
            "completed" | "done" => Ok(GoalStatus::Completed),
            "refined" => Ok(GoalStatus::Refined),
            other => Err(DomainError::InvalidInput(format!(
                "unknown goal status '{other}'"
            ))),
        }
    }
}

/// A measurable goal, optionally attached to a persona
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Goal {
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub persona_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub acceptance_criteria: Option<String>,
    /// Passed through as written by the coach, normally `YYYY-MM-DD`
    pub review_date: String,
    #[serde(default)]
    pub status: GoalStatus,
    #[serde(default)]
    pub success_percentage: u8,
    #[serde(default)]
    pub review_notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Goal {
    pub fn apply_patch(&mut self, patch: &GoalPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(criteria) = &patch.acceptance_criteria {
            self.acceptance_criteria = Some(criteria.clone());
        }
        if let Some(date) = &patch.review_date {
            self.review_date = date.clone();
        }
        if let Some(status) = patch.status {
            self.status = status;
        }
        if let Some(pct) = patch.success_percentage {
            self.success_percentage = clamp_percentage(pct);
        }
        if let Some(notes) = &patch.review_notes {
            self.review_notes = Some(notes.clone());
        }
    }

    /// Review date parsed as a calendar date, if it is one
    pub fn review_day(&self) -> Option<NaiveDate> {
        NaiveDate::parse_from_str(self.review_date.trim(), "%Y-%m-%d").ok()
    }
}

/// Fields for a goal that does not exist yet
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewGoal {
    pub user_id: String,
    pub persona_id: Option<String>,
    pub name: String,
    pub acceptance_criteria: Option<String>,
    pub review_date: String,
}

/// A partial update; `None` leaves the field alone
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acceptance_criteria: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<GoalStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub success_percentage: Option<u8>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_notes: Option<String>,
}

impl GoalPatch {
    /// Progress update: status, percentage, and optional notes
    pub fn progress(status: GoalStatus, success_percentage: u8, notes: Option<String>) -> Self {
        Self {
            status: Some(status),
            success_percentage: Some(clamp_percentage(success_percentage)),
            review_notes: notes,
            ..Default::default()
        }
    }
}

pub fn clamp_percentage(value: u8) -> u8 {
    value.min(100)
}

/// `today + DEFAULT_REVIEW_DAYS`, formatted `YYYY-MM-DD`
pub fn default_review_date(today: NaiveDate) -> String {
    today
        .checked_add_days(Days::new(DEFAULT_REVIEW_DAYS))
        .unwrap_or(today)
        .format("%Y-%m-%d")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn goal() -> Goal {
        Goal {
            id: "g1".to_string(),
            user_id: "u1".to_string(),
            persona_id: None,
            name: "Run".to_string(),
            acceptance_criteria: None,
            review_date: "2025-01-15".to_string(),
            status: GoalStatus::Active,
            success_percentage: 0,
            review_notes: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_progress_patch_clamps() {
        let mut g = goal();
        g.apply_patch(&GoalPatch::progress(GoalStatus::Completed, 250, None));
        assert_eq!(g.success_percentage, 100);
        assert_eq!(g.status, GoalStatus::Completed);
        assert_eq!(g.name, "Run");
    }

    #[test]
    fn test_review_day() {
        let mut g = goal();
        assert_eq!(g.review_day(), NaiveDate::from_ymd_opt(2025, 1, 15));
        g.review_date = "next week".to_string();
        assert_eq!(g.review_day(), None);
    }

    #[test]
    fn test_default_review_date() {
        let today = NaiveDate::from_ymd_opt(2025, 1, 10).unwrap();
        assert_eq!(default_review_date(today), "2025-02-09");
    }

    #[test]
    fn test_status_parse() {
        assert_eq!("Done".parse::<GoalStatus>().unwrap(), GoalStatus::Completed);
        assert!("paused".parse::<GoalStatus>().is_err());
    }
}
