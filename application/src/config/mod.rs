//! Application-level configuration.
//!
//! This module provides configuration types that control how use cases behave:
//!
//! - [`ChatParams`]: model and sampling parameters for coach turns
//! - [`SyncParams`]: offline retry and debounce timing

pub mod chat_params;
pub mod sync_params;

pub use chat_params::ChatParams;
pub use sync_params::SyncParams;
