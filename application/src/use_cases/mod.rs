//! Use cases
//!
//! Application-level operations that orchestrate domain logic.

pub mod chat_service;
pub mod conversation_manager;
pub mod debounce;
pub mod goal_service;
pub mod persona_service;
pub mod sign_in;
