//! Backend JSON payloads
//!
//! The REST API names a persona's title `label` and emits naive UTC
//! timestamps (`2025-01-10T12:00:00.123456`), so responses go through these
//! types before becoming domain entities.

use bestself_domain::{
    ConversationRecord, ConversationStatus, Goal, GoalStatus, NewConversation, NewGoal,
    NewPersona, NewUser, Persona, PersonaPatch, User,
};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Accept RFC 3339 or a naive timestamp taken as UTC
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .ok()
        .or_else(|| {
            NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
                .ok()
                .map(|naive| naive.and_utc())
        })
}

fn lenient_timestamp<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<String>::deserialize(deserializer)?;
    Ok(raw.as_deref().and_then(parse_timestamp))
}

fn id_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::String(s) => s,
        other => other.to_string(),
    })
}

// ==================== Users ====================

#[derive(Debug, Serialize)]
pub struct CreateUserBody<'a> {
    pub name: Option<&'a str>,
    pub email: &'a str,
}

impl<'a> From<&'a NewUser> for CreateUserBody<'a> {
    fn from(user: &'a NewUser) -> Self {
        Self {
            name: user.name.as_deref(),
            email: &user.email,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UserDto {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    pub email: String,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

impl From<UserDto> for User {
    fn from(dto: UserDto) -> Self {
        User {
            id: dto.id,
            name: dto.name,
            email: dto.email,
            created_at: dto.created_at.unwrap_or_else(Utc::now),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct MagicLinkBody<'a> {
    pub email: &'a str,
}

/// `GET /auth/verify` reply; only the id is guaranteed
#[derive(Debug, Deserialize)]
pub struct VerifyDto {
    #[serde(deserialize_with = "id_string")]
    pub user_id: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

impl From<VerifyDto> for User {
    fn from(dto: VerifyDto) -> Self {
        User {
            id: dto.user_id,
            name: dto.name,
            email: dto.email.unwrap_or_default(),
            created_at: Utc::now(),
        }
    }
}

// ==================== Personas ====================

#[derive(Debug, Serialize)]
pub struct CreatePersonaBody<'a> {
    pub user_id: &'a str,
    pub label: &'a str,
    pub north_star: &'a str,
}

impl<'a> From<&'a NewPersona> for CreatePersonaBody<'a> {
    fn from(persona: &'a NewPersona) -> Self {
        Self {
            user_id: &persona.user_id,
            label: &persona.name,
            north_star: &persona.north_star,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct UpdatePersonaBody<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub label: Option<&'a str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub north_star: Option<&'a str>,
}

impl<'a> From<&'a PersonaPatch> for UpdatePersonaBody<'a> {
    fn from(patch: &'a PersonaPatch) -> Self {
        Self {
            label: patch.name.as_deref(),
            north_star: patch.north_star.as_deref(),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct PersonaDto {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub north_star: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<PersonaDto> for Persona {
    fn from(dto: PersonaDto) -> Self {
        let created_at = dto.created_at.unwrap_or_else(Utc::now);
        Persona {
            id: dto.id,
            name: dto.label.unwrap_or_default(),
            north_star: dto.north_star.unwrap_or_default(),
            created_at,
            updated_at: dto.updated_at.unwrap_or(created_at),
        }
    }
}

// ==================== Goals ====================

#[derive(Debug, Serialize)]
pub struct CreateGoalBody<'a> {
    pub user_id: &'a str,
    pub persona_id: Option<&'a str>,
    pub name: &'a str,
    pub acceptance_criteria: Option<&'a str>,
    pub review_date: &'a str,
}

impl<'a> From<&'a NewGoal> for CreateGoalBody<'a> {
    fn from(goal: &'a NewGoal) -> Self {
        Self {
            user_id: &goal.user_id,
            persona_id: goal.persona_id.as_deref(),
            name: &goal.name,
            acceptance_criteria: goal.acceptance_criteria.as_deref(),
            review_date: &goal.review_date,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GoalDto {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(deserialize_with = "id_string")]
    pub user_id: String,
    #[serde(default)]
    pub persona_id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub acceptance_criteria: Option<String>,
    #[serde(default)]
    pub review_date: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub success_percentage: Option<f64>,
    #[serde(default)]
    pub review_notes: Option<String>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub created_at: Option<DateTime<Utc>>,
}

impl From<GoalDto> for Goal {
    fn from(dto: GoalDto) -> Self {
        Goal {
            id: dto.id,
            user_id: dto.user_id,
            persona_id: dto.persona_id,
            name: dto.name,
            acceptance_criteria: dto.acceptance_criteria,
            review_date: dto.review_date.unwrap_or_default(),
            status: dto
                .status
                .as_deref()
                .and_then(|s| s.parse::<GoalStatus>().ok())
                .unwrap_or_default(),
            success_percentage: dto
                .success_percentage
                .map(|p| p.clamp(0.0, 100.0).round() as u8)
                .unwrap_or(0),
            review_notes: dto.review_notes,
            created_at: dto.created_at.unwrap_or_else(Utc::now),
        }
    }
}

// ==================== Conversations ====================

#[derive(Debug, Serialize)]
pub struct CreateConversationBody<'a> {
    pub user_id: &'a str,
    pub persona_id: Option<&'a str>,
    pub discussion_type: &'a str,
    pub topic: Option<&'a str>,
}

impl<'a> From<&'a NewConversation> for CreateConversationBody<'a> {
    fn from(conversation: &'a NewConversation) -> Self {
        Self {
            user_id: &conversation.user_id,
            persona_id: conversation.persona_id.as_deref(),
            discussion_type: &conversation.conversation_type,
            topic: conversation.topic.as_deref(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CompleteConversationBody<'a> {
    pub conversation_summary: &'a str,
    pub key_insights: &'a [String],
}

#[derive(Debug, Serialize)]
pub struct TagsBody<'a> {
    pub tags: &'a [String],
}

#[derive(Debug, Deserialize)]
pub struct ConversationDto {
    #[serde(deserialize_with = "id_string")]
    pub id: String,
    #[serde(deserialize_with = "id_string")]
    pub user_id: String,
    #[serde(default)]
    pub persona_id: Option<String>,
    #[serde(default)]
    pub discussion_type: Option<String>,
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub conversation_summary: Option<String>,
    #[serde(default)]
    pub key_insights: Option<Vec<String>>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "lenient_timestamp")]
    pub ended_at: Option<DateTime<Utc>>,
}

impl From<ConversationDto> for ConversationRecord {
    fn from(dto: ConversationDto) -> Self {
        let status = match dto.status.as_deref() {
            Some("completed") => ConversationStatus::Completed,
            _ => ConversationStatus::Active,
        };
        ConversationRecord {
            id: dto.id,
            user_id: dto.user_id,
            persona_id: dto.persona_id,
            conversation_type: dto.discussion_type.unwrap_or_default(),
            topic: dto.topic,
            status,
            summary: dto.conversation_summary,
            key_insights: dto.key_insights.unwrap_or_default(),
            tags: dto.tags.unwrap_or_default(),
            started_at: dto.started_at.unwrap_or_else(Utc::now),
            ended_at: dto.ended_at,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_persona_label_maps_to_name() {
        let body = r#"{
            "id": "7c9e6679-7425-40de-944b-e07fc1f90ae7",
            "user_id": "u1",
            "label": "Parent",
            "north_star": "Raise kind, curious kids",
            "is_calling": false,
            "created_at": "2025-01-10T12:00:00.123456",
            "updated_at": "2025-01-11T08:30:00"
        }"#;
        let persona: Persona = serde_json::from_str::<PersonaDto>(body).unwrap().into();
        assert_eq!(persona.name, "Parent");
        assert_eq!(persona.north_star, "Raise kind, curious kids");
        assert_eq!(persona.created_at.to_rfc3339(), "2025-01-10T12:00:00.123456+00:00");
        assert!(persona.updated_at > persona.created_at);
    }

    #[test]
    fn test_update_body_skips_unset_fields() {
        let patch = PersonaPatch {
            name: Some("Leader".to_string()),
            north_star: None,
        };
        let json = serde_json::to_value(UpdatePersonaBody::from(&patch)).unwrap();
        assert_eq!(json, serde_json::json!({"label": "Leader"}));
    }

    #[test]
    fn test_goal_status_and_percentage() {
        let body = r#"{
            "id": 3, "user_id": "u1", "name": "Run 5k",
            "status": "completed", "success_percentage": 87.6
        }"#;
        let goal: Goal = serde_json::from_str::<GoalDto>(body).unwrap().into();
        assert_eq!(goal.id, "3");
        assert_eq!(goal.status, GoalStatus::Completed);
        assert_eq!(goal.success_percentage, 88);
        assert_eq!(goal.review_date, "");
    }

    #[test]
    fn test_verify_reply() {
        let user: User = serde_json::from_str::<VerifyDto>(
            r#"{"message": "Authentication successful", "user_id": "u9"}"#,
        )
        .unwrap()
        .into();
        assert_eq!(user.id, "u9");
        assert_eq!(user.email, "");
    }

    #[test]
    fn test_parse_timestamp() {
        assert!(parse_timestamp("2025-01-10T12:00:00Z").is_some());
        assert!(parse_timestamp("2025-01-10T12:00:00").is_some());
        assert!(parse_timestamp("last tuesday").is_none());
    }
}
