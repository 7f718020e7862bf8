//! Structured actions extracted from coach replies.
//!
//! - [`entities`]: persona, goal and transition action records
//! - [`grammar`]: the line grammar the coach prompts instruct the LLM to emit,
//!   and the parsers that recognise it

pub mod entities;
pub mod grammar;

pub use entities::{
    GoalAction, GoalActionKind, PersonaAction, PersonaActionKind, TransitionAction,
};
