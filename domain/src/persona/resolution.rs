//! Resolving coach persona actions against the current persona list
//!
//! Lookups are case-insensitive exact matches on the trimmed name. An update
//! tries `previous_name` first and then `name`, so applying the same action
//! twice lands on the same persona. A create whose name already exists is
//! treated as an update for the same reason.

use crate::action::{PersonaAction, PersonaActionKind};
use crate::core::error::DomainError;
use crate::core::string::names_match;
use crate::persona::entities::{MAX_PERSONAS, Persona, PersonaPatch};

/// The concrete change an action resolves to
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PersonaChange {
    Create { name: String, north_star: String },
    Update { id: String, patch: PersonaPatch },
    Delete { id: String },
}

pub fn find_by_name<'a>(personas: &'a [Persona], name: &str) -> Option<&'a Persona> {
    personas.iter().find(|p| names_match(&p.name, name))
}

/// Check the cap before adding one more persona
pub fn ensure_capacity(current: usize) -> Result<(), DomainError> {
    if current >= MAX_PERSONAS {
        Err(DomainError::PersonaLimitReached { max: MAX_PERSONAS })
    } else {
        Ok(())
    }
}

pub fn resolve_action(
    personas: &[Persona],
    action: &PersonaAction,
) -> Result<PersonaChange, DomainError> {
    match action.kind {
        PersonaActionKind::Delete => find_by_name(personas, &action.name)
            .map(|p| PersonaChange::Delete { id: p.id.clone() })
            .ok_or_else(|| DomainError::PersonaNotFound(action.name.clone())),
        PersonaActionKind::Create | PersonaActionKind::Update => {
            let existing = action
                .previous_name
                .as_deref()
                .and_then(|prev| find_by_name(personas, prev))
                .or_else(|| find_by_name(personas, &action.name));

            match existing {
                Some(persona) => Ok(PersonaChange::Update {
                    id: persona.id.clone(),
                    patch: PersonaPatch {
                        name: Some(action.name.clone()),
                        north_star: action.north_star.clone(),
                    },
                }),
                None => {
                    ensure_capacity(personas.len())?;
                    Ok(PersonaChange::Create {
                        name: action.name.clone(),
                        north_star: action.north_star.clone().unwrap_or_default(),
                    })
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn persona(id: &str, name: &str) -> Persona {
        let at = Utc::now();
        Persona {
            id: id.to_string(),
            name: name.to_string(),
            north_star: "north".to_string(),
            created_at: at,
            updated_at: at,
        }
    }

    fn full_list() -> Vec<Persona> {
        (0..MAX_PERSONAS)
            .map(|i| persona(&format!("p{i}"), &format!("Persona {i}")))
            .collect()
    }

    #[test]
    fn test_rename_matches_previous_name() {
        let personas = vec![persona("p1", "Parent")];
        let action = PersonaAction::update(
            "Nurturing Parent",
            Some("Raise confident children".to_string()),
            Some("parent".to_string()),
        );
        let change = resolve_action(&personas, &action).unwrap();
        assert_eq!(
            change,
            PersonaChange::Update {
                id: "p1".to_string(),
                patch: PersonaPatch {
                    name: Some("Nurturing Parent".to_string()),
                    north_star: Some("Raise confident children".to_string()),
                },
            }
        );
    }

    #[test]
    fn test_reapplying_rename_is_idempotent() {
        // after the first application the persona already carries the new name
        let personas = vec![persona("p1", "Nurturing Parent")];
        let action = PersonaAction::update(
            "Nurturing Parent",
            Some("Raise confident children".to_string()),
            Some("Parent".to_string()),
        );
        let change = resolve_action(&personas, &action).unwrap();
        assert!(matches!(change, PersonaChange::Update { ref id, .. } if id == "p1"));
    }

    #[test]
    fn test_update_without_match_creates() {
        let action = PersonaAction::update("Runner", Some("Move daily".to_string()), None);
        let change = resolve_action(&[], &action).unwrap();
        assert_eq!(
            change,
            PersonaChange::Create {
                name: "Runner".to_string(),
                north_star: "Move daily".to_string()
            }
        );
    }

    #[test]
    fn test_create_with_existing_name_updates() {
        let personas = vec![persona("p1", "Parent")];
        let change =
            resolve_action(&personas, &PersonaAction::create("PARENT", "Raise kind humans"))
                .unwrap();
        assert!(matches!(change, PersonaChange::Update { .. }));
    }

    #[test]
    fn test_tenth_persona_is_rejected() {
        let personas = full_list();
        let err = resolve_action(&personas, &PersonaAction::create("Tenth", "One too many"))
            .unwrap_err();
        assert_eq!(err, DomainError::PersonaLimitReached { max: 9 });
    }

    #[test]
    fn test_update_at_cap_still_allowed() {
        let personas = full_list();
        let action = PersonaAction::update("Persona 3", Some("New north".to_string()), None);
        assert!(resolve_action(&personas, &action).is_ok());
    }

    #[test]
    fn test_delete_missing_names_persona() {
        let err = resolve_action(&[], &PersonaAction::delete("Ghost")).unwrap_err();
        assert_eq!(err, DomainError::PersonaNotFound("Ghost".to_string()));
    }
}
