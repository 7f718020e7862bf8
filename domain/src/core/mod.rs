//! Core domain concepts shared across all subdomains.
//!
//! - [`model::Model`]: LLM models the coach can talk to
//! - [`error::DomainError`]: domain-level errors
//! - [`string`]: UTF-8 safe string helpers

pub mod error;
pub mod model;
pub mod string;
