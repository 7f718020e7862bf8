//! Action line grammar embedded in coach replies.
//!
//! Agent system prompts instruct the LLM to confirm structured changes by
//! writing one line per action. These functions find those lines (anywhere in
//! the reply, case-insensitively, every occurrence) and turn them into action
//! records. They are pure text pattern matching; a reply that does not follow
//! the grammar simply yields no actions.
//!
//! | Line | Result |
//! |------|--------|
//! | `PERSONA_CONFIRMED: name \| north star` | persona create |
//! | `PERSONA_CONFIRMED: name (was: old) \| north star` | persona update (rename) |
//! | `REFINED_PERSONA: name \| north star` | persona update |
//! | `DELETE_PERSONA: name \| reason` | persona delete |
//! | `MERGE_PERSONAS: a + b \| name \| north star` | update `a`, delete `b` |
//! | `GOAL_CONFIRMED: name \| criteria \| YYYY-MM-DD` | goal create |
//! | `GOAL_UPDATED: original \| name \| criteria \| date` | goal update |
//! | `TRANSITION_TO_GOALS: persona` | transition |
//! | `TRANSITION_TO_DISCOVERY` | agent hand-off |
//!
//! The contract is brittle by nature: the model has to reproduce the text
//! protocol exactly. Fields are separated by `|` and are accepted only when
//! non-empty after trimming.

use crate::action::entities::{GoalAction, PersonaAction, TransitionAction};
use crate::core::string::non_empty;
use regex::Regex;
use std::sync::LazyLock;

/// Refined north stars this short (in characters, after trimming) are discarded.
pub const REFINED_NORTH_STAR_MIN_LEN: usize = 10;

/// Every action tag the grammar knows about.
pub const ACTION_TAGS: [&str; 8] = [
    "PERSONA_CONFIRMED",
    "REFINED_PERSONA",
    "DELETE_PERSONA",
    "MERGE_PERSONAS",
    "GOAL_CONFIRMED",
    "GOAL_UPDATED",
    "TRANSITION_TO_GOALS",
    "TRANSITION_TO_DISCOVERY",
];

static PERSONA_CONFIRMED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)PERSONA_CONFIRMED:[ \t]*([^|\n]+)\|([^\n]*)").expect("valid regex")
});

static WAS_SUFFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(.*?)\s*\(\s*was:\s*([^)]*)\)\s*$").expect("valid regex")
});

static REFINED_PERSONA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)REFINED_PERSONA:[ \t]*([^|\n]+)\|([^\n]*)").expect("valid regex")
});

static DELETE_PERSONA: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)DELETE_PERSONA:[ \t]*([^|\n]+)").expect("valid regex")
});

static MERGE_PERSONAS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)MERGE_PERSONAS:[ \t]*([^|\n]+)\|([^|\n]*)\|([^\n]*)").expect("valid regex")
});

static GOAL_CONFIRMED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)GOAL_CONFIRMED:[ \t]*([^|\n]+)\|([^|\n]*)(?:\|([^\n]*))?")
        .expect("valid regex")
});

static GOAL_UPDATED: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)GOAL_UPDATED:[ \t]*([^|\n]+)(?:\|([^|\n]*))?(?:\|([^|\n]*))?(?:\|([^\n]*))?")
        .expect("valid regex")
});

static TRANSITION_TO_GOALS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)TRANSITION_TO_GOALS:[ \t]*([^\n]*)").expect("valid regex")
});

static TRANSITION_TO_DISCOVERY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\bTRANSITION_TO_DISCOVERY\b").expect("valid regex")
});

static ACTION_LINE: LazyLock<Regex> = LazyLock::new(|| {
    let tags = ACTION_TAGS.join("|");
    Regex::new(&format!(r"(?i)[ \t]*\b(?:{tags})\b[^\n]*")).expect("valid regex")
});

static TRAILING_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[ \t\r]+\n").expect("valid regex"));

static BLANK_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\n{3,}").expect("valid regex"));

/// Parse every `PERSONA_CONFIRMED` line.
///
/// A `(was: X)` suffix on the name turns the action into an update keyed by `X`.
pub fn parse_confirmed_personas(reply: &str) -> Vec<PersonaAction> {
    PERSONA_CONFIRMED
        .captures_iter(reply)
        .filter_map(|caps| {
            let raw_name = caps.get(1)?.as_str().trim();
            let north_star = non_empty(caps.get(2)?.as_str())?;

            if let Some(was) = WAS_SUFFIX.captures(raw_name) {
                let name = non_empty(was.get(1)?.as_str())?;
                return Some(match was.get(2).and_then(|m| non_empty(m.as_str())) {
                    Some(previous) => PersonaAction::update(name, Some(north_star), Some(previous)),
                    None => PersonaAction::create(name, north_star),
                });
            }

            let name = non_empty(raw_name)?;
            Some(PersonaAction::create(name, north_star))
        })
        .collect()
}

/// Parse every `REFINED_PERSONA` line.
///
/// North stars of [`REFINED_NORTH_STAR_MIN_LEN`] characters or fewer are not
/// meaningful refinements and are dropped. When `target_name` is given and
/// differs from the refined name, it becomes the update's `previous_name`.
pub fn parse_refined_personas(reply: &str, target_name: Option<&str>) -> Vec<PersonaAction> {
    REFINED_PERSONA
        .captures_iter(reply)
        .filter_map(|caps| {
            let name = non_empty(caps.get(1)?.as_str())?;
            let north_star = non_empty(caps.get(2)?.as_str())?;
            if north_star.chars().count() <= REFINED_NORTH_STAR_MIN_LEN {
                return None;
            }
            let previous = target_name
                .filter(|t| !crate::core::string::names_match(t, &name))
                .map(|t| t.trim().to_string());
            Some(PersonaAction::update(name, Some(north_star), previous))
        })
        .collect()
}

/// Parse every `DELETE_PERSONA` line. The trailing reason field is ignored.
pub fn parse_persona_deletions(reply: &str) -> Vec<PersonaAction> {
    DELETE_PERSONA
        .captures_iter(reply)
        .filter_map(|caps| non_empty(caps.get(1)?.as_str()))
        .map(PersonaAction::delete)
        .collect()
}

/// Parse every `MERGE_PERSONAS: a + b | name | north star` line.
///
/// A merge becomes two actions: `a` is updated into the merged persona and
/// `b` is deleted, so the persona count never grows during a merge.
pub fn parse_persona_merges(reply: &str) -> Vec<PersonaAction> {
    MERGE_PERSONAS
        .captures_iter(reply)
        .filter_map(|caps| {
            let (first, second) = caps.get(1)?.as_str().split_once('+')?;
            let first = non_empty(first)?;
            let second = non_empty(second)?;
            let name = non_empty(caps.get(2)?.as_str())?;
            let north_star = non_empty(caps.get(3)?.as_str())?;
            Some([
                PersonaAction::update(name, Some(north_star), Some(first)),
                PersonaAction::delete(second),
            ])
        })
        .flatten()
        .collect()
}

/// Parse `GOAL_CONFIRMED` and `GOAL_UPDATED` lines, keeping reply order.
pub fn parse_goal_actions(reply: &str) -> Vec<GoalAction> {
    let created = GOAL_CONFIRMED.captures_iter(reply).filter_map(|caps| {
        let start = caps.get(0)?.start();
        let name = non_empty(caps.get(1)?.as_str())?;
        let criteria = caps.get(2).and_then(|m| non_empty(m.as_str()));
        let review_date = caps.get(3).and_then(|m| non_empty(m.as_str()));
        Some((start, GoalAction::create(name, criteria, review_date)))
    });

    let updated = GOAL_UPDATED.captures_iter(reply).filter_map(|caps| {
        let start = caps.get(0)?.start();
        let original = non_empty(caps.get(1)?.as_str())?;
        let name = caps
            .get(2)
            .and_then(|m| non_empty(m.as_str()))
            .unwrap_or_else(|| original.clone());
        let criteria = caps.get(3).and_then(|m| non_empty(m.as_str()));
        let review_date = caps.get(4).and_then(|m| non_empty(m.as_str()));
        Some((start, GoalAction::update(original, name, criteria, review_date)))
    });

    let mut actions: Vec<(usize, GoalAction)> = created.chain(updated).collect();
    actions.sort_by_key(|(start, _)| *start);
    actions.into_iter().map(|(_, action)| action).collect()
}

/// Parse every `TRANSITION_TO_GOALS` line.
pub fn parse_transitions(reply: &str) -> Vec<TransitionAction> {
    TRANSITION_TO_GOALS
        .captures_iter(reply)
        .filter_map(|caps| non_empty(caps.get(1)?.as_str()))
        .map(|persona_name| TransitionAction::TransitionToGoals { persona_name })
        .collect()
}

/// Whether the reply hands the conversation over to persona discovery.
pub fn requests_discovery(reply: &str) -> bool {
    TRANSITION_TO_DISCOVERY.is_match(reply)
}

/// Remove every action line from a reply, leaving the user-facing text.
///
/// Each recognised tag is cut from where it starts to the end of its line;
/// surrounding prose on the same line is kept.
pub fn strip_action_lines(reply: &str) -> String {
    let stripped = ACTION_LINE.replace_all(reply, "");
    let tidy = TRAILING_SPACE.replace_all(&stripped, "\n");
    let collapsed = BLANK_RUN.replace_all(&tidy, "\n\n");
    collapsed.trim().to_string()
}
