//! Action records produced by agent response parsing

use serde::{Deserialize, Serialize};

/// What a [`PersonaAction`] does to the persona set
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PersonaActionKind {
    Create,
    Update,
    Delete,
}

/// A persona mutation requested by the coach.
///
/// `previous_name` is set when the coach renamed a persona
/// (`PERSONA_CONFIRMED: New (was: Old) | ...`); it is the lookup key tried
/// first when the action is applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonaAction {
    #[serde(rename = "type")]
    pub kind: PersonaActionKind,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub north_star: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_name: Option<String>,
}

impl PersonaAction {
    pub fn create(name: impl Into<String>, north_star: impl Into<String>) -> Self {
        Self {
            kind: PersonaActionKind::Create,
            name: name.into(),
            north_star: Some(north_star.into()),
            previous_name: None,
        }
    }

    pub fn update(
        name: impl Into<String>,
        north_star: Option<String>,
        previous_name: Option<String>,
    ) -> Self {
        Self {
            kind: PersonaActionKind::Update,
            name: name.into(),
            north_star,
            previous_name,
        }
    }

    pub fn delete(name: impl Into<String>) -> Self {
        Self {
            kind: PersonaActionKind::Delete,
            name: name.into(),
            north_star: None,
            previous_name: None,
        }
    }
}

/// What a [`GoalAction`] does to the goal list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalActionKind {
    Create,
    Update,
}

/// A goal mutation requested by the coach.
///
/// For updates `original_name` is the lookup key and `name` the (possibly
/// unchanged) new name. `review_date` is passed through as written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalAction {
    #[serde(rename = "type")]
    pub kind: GoalActionKind,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acceptance_criteria: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_name: Option<String>,
}

impl GoalAction {
    pub fn create(
        name: impl Into<String>,
        acceptance_criteria: Option<String>,
        review_date: Option<String>,
    ) -> Self {
        Self {
            kind: GoalActionKind::Create,
            name: name.into(),
            acceptance_criteria,
            review_date,
            original_name: None,
        }
    }

    pub fn update(
        original_name: impl Into<String>,
        name: impl Into<String>,
        acceptance_criteria: Option<String>,
        review_date: Option<String>,
    ) -> Self {
        Self {
            kind: GoalActionKind::Update,
            name: name.into(),
            acceptance_criteria,
            review_date,
            original_name: Some(original_name.into()),
        }
    }

    /// The name used to find the goal this action targets.
    pub fn lookup_name(&self) -> &str {
        self.original_name.as_deref().unwrap_or(&self.name)
    }
}

/// A request for the caller to change the conversational subject.
///
/// Not persisted; the UI layer decides how to honour it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransitionAction {
    TransitionToGoals { persona_name: String },
}

impl TransitionAction {
    pub fn persona_name(&self) -> &str {
        match self {
            TransitionAction::TransitionToGoals { persona_name } => persona_name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persona_action_json_shape() {
        let action = PersonaAction::create("Strategic Leader", "Empower teams to thrive");
        let json = serde_json::to_value(&action).unwrap();
        assert_eq!(json["type"], "create");
        assert_eq!(json["name"], "Strategic Leader");
        assert_eq!(json["north_star"], "Empower teams to thrive");
        assert!(json.get("previous_name").is_none());
    }

    #[test]
    fn test_goal_lookup_name_prefers_original() {
        let update = GoalAction::update("Run daily", "Run five days a week", None, None);
        assert_eq!(update.lookup_name(), "Run daily");

        let create = GoalAction::create("Read more", None, None);
        assert_eq!(create.lookup_name(), "Read more");
    }

    #[test]
    fn test_transition_json_tag() {
        let t = TransitionAction::TransitionToGoals {
            persona_name: "Parent".to_string(),
        };
        let json = serde_json::to_value(&t).unwrap();
        assert_eq!(json["type"], "transition_to_goals");
        assert_eq!(t.persona_name(), "Parent");
    }
}
