//! Interactive chat module
//!
//! Provides a line-editor chat interface to the coach.

mod command;
mod repl;

pub use command::{ReplCommand, parse_command};
pub use repl::{ChatRepl, CommandResult};
