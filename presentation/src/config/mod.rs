//! Presentation-level configuration
//!
//! What the chat REPL needs to know about the terminal session.

use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplConfig {
    /// Show a spinner while the coach is thinking
    pub show_progress: bool,
    pub color: bool,
    /// Line-editor history; no history when unset
    pub history_file: Option<PathBuf>,
}

impl Default for ReplConfig {
    fn default() -> Self {
        Self {
            show_progress: true,
            color: true,
            history_file: None,
        }
    }
}

impl ReplConfig {
    pub fn with_progress(mut self, show_progress: bool) -> Self {
        self.show_progress = show_progress;
        self
    }

    pub fn with_color(mut self, color: bool) -> Self {
        self.color = color;
        self
    }

    pub fn with_history_file(mut self, path: Option<PathBuf>) -> Self {
        self.history_file = path;
        self
    }
}
