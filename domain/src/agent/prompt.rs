//! Shared pieces of agent system prompts

use crate::conversation::context::ConversationContext;

/// Rendered when there is no history yet
pub const EMPTY_HISTORY: &str = "(this is the start of the conversation)";

/// The conversation so far, one transcript line per message
pub fn render_history(context: &ConversationContext) -> String {
    if context.history.is_empty() {
        return EMPTY_HISTORY.to_string();
    }
    context
        .history
        .iter()
        .map(|m| m.transcript_line())
        .collect::<Vec<_>>()
        .join("\n")
}

/// The persona being worked on, if any
pub fn render_target_persona(context: &ConversationContext) -> String {
    match (&context.target_persona_id, &context.target_persona) {
        (Some(id), Some(persona)) => format!(
            "Target Persona ID: {id}\nCurrent Persona: {}\nCurrent North Star: {}",
            persona.name, persona.north_star
        ),
        (Some(id), None) => format!("Target Persona ID: {id}"),
        (None, Some(persona)) => format!(
            "Current Persona: {}\nCurrent North Star: {}",
            persona.name, persona.north_star
        ),
        (None, None) => "No persona is selected.".to_string(),
    }
}

/// The user's personas as a bullet list
pub fn render_personas(context: &ConversationContext) -> String {
    if context.personas.is_empty() {
        return "The user has no personas yet.".to_string();
    }
    let lines = context
        .personas
        .iter()
        .map(|p| format!("- {}: {}", p.name, p.north_star))
        .collect::<Vec<_>>()
        .join("\n");
    format!("The user has {} personas:\n{lines}", context.personas.len())
}
