//! Progress reporting for coach turns

use crate::ConsoleFormatter;
use bestself_application::ChatProgressNotifier;
use bestself_domain::AgentType;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::Mutex;
use std::time::Duration;

/// Spinner shown while the coach is thinking
pub struct ProgressReporter {
    spinner: Mutex<Option<ProgressBar>>,
}

impl ProgressReporter {
    pub fn new() -> Self {
        Self {
            spinner: Mutex::new(None),
        }
    }

    fn spinner_style() -> ProgressStyle {
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {prefix:.bold.cyan} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner())
    }

    fn finish(&self) {
        if let Ok(mut spinner) = self.spinner.lock()
            && let Some(pb) = spinner.take()
        {
            pb.finish_and_clear();
        }
    }

    /// Print above the spinner without tearing it
    fn println(&self, line: String) {
        match self.spinner.lock().ok().as_deref().and_then(Option::as_ref) {
            Some(pb) => pb.println(line),
            None => println!("{}", line),
        }
    }
}

impl Default for ProgressReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl ChatProgressNotifier for ProgressReporter {
    fn on_thinking_start(&self, agent: AgentType) {
        self.finish();
        let pb = ProgressBar::new_spinner();
        pb.set_style(Self::spinner_style());
        pb.set_prefix(agent.display_name());
        pb.set_message("is thinking...");
        pb.enable_steady_tick(Duration::from_millis(100));
        if let Ok(mut spinner) = self.spinner.lock() {
            *spinner = Some(pb);
        }
    }

    fn on_thinking_end(&self) {
        self.finish();
    }

    fn on_agent_switch(&self, from: AgentType, to: AgentType) {
        self.println(ConsoleFormatter::agent_switch(from, to));
    }

    fn on_queued(&self, pending: usize) {
        self.println(format!(
            "{} Offline: {} item(s) queued, retrying in the background",
            "!".yellow(),
            pending
        ));
    }

    fn on_flushed(&self, flushed: usize) {
        self.println(format!(
            "{} Back online: sent {} queued item(s)",
            "v".green(),
            flushed
        ));
    }
}

/// Simple text-based progress (no spinner)
pub struct SimpleProgress;

impl ChatProgressNotifier for SimpleProgress {
    fn on_thinking_start(&self, agent: AgentType) {
        println!("{} {} is thinking...", "->".cyan(), agent.display_name().bold());
    }

    fn on_agent_switch(&self, from: AgentType, to: AgentType) {
        println!("{}", ConsoleFormatter::agent_switch(from, to));
    }

    fn on_queued(&self, pending: usize) {
        println!("{} Offline: {} item(s) queued", "!".yellow(), pending);
    }

    fn on_flushed(&self, flushed: usize) {
        println!("{} Sent {} queued item(s)", "v".green(), flushed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spinner_lifecycle() {
        let reporter = ProgressReporter::new();
        reporter.on_thinking_start(AgentType::Discovery);
        assert!(reporter.spinner.lock().unwrap().is_some());
        reporter.on_thinking_start(AgentType::Goal);
        reporter.on_thinking_end();
        assert!(reporter.spinner.lock().unwrap().is_none());
        reporter.on_thinking_end();
    }
}
