//! LLM turn domain.
//!
//! - [`entities::Message`]: a single role-tagged turn sent to the model

pub mod entities;
