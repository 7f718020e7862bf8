//! Persona domain module

pub mod entities;
pub mod resolution;

pub use entities::{MAX_PERSONAS, NewPersona, Persona, PersonaPatch};
pub use resolution::{PersonaChange, ensure_capacity, find_by_name, resolve_action};
