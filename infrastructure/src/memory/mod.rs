//! In-process backend
//!
//! Implements every backend port against memory so the coach runs without
//! the REST service (`--local`). Nothing survives the process.

mod backend;

pub use backend::InMemoryBackend;
