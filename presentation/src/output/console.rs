//! Console output formatter for coach sessions

use bestself_application::{GoalActionReport, PendingMessage, PersonaActionReport};
use bestself_domain::{AgentType, ConversationRecord, Goal, GoalStatus, Persona};
use colored::Colorize;

/// Formats chat output for the terminal
pub struct ConsoleFormatter;

impl ConsoleFormatter {
    /// A coach reply, prefixed with the agent that wrote it
    pub fn coach_reply(agent: AgentType, text: &str) -> String {
        format!(
            "{}\n{}\n",
            format!("── {} ──", agent.display_name()).cyan().bold(),
            Self::indent(text, "  ")
        )
    }

    pub fn error_banner(message: &str) -> String {
        format!("{} {}", "!".red().bold(), message.red())
    }

    pub fn info_banner(message: &str) -> String {
        format!("{} {}", "*".cyan(), message.dimmed())
    }

    pub fn agent_switch(from: AgentType, to: AgentType) -> String {
        format!(
            "{} {} -> {}",
            "~".yellow(),
            from.display_name().dimmed(),
            to.display_name().yellow().bold()
        )
    }

    pub fn personas(personas: &[Persona]) -> String {
        if personas.is_empty() {
            return Self::info_banner("No personas yet. Tell the coach about the roles you play.");
        }
        let mut output = format!(
            "{}\n",
            format!("Personas ({}/{})", personas.len(), bestself_domain::MAX_PERSONAS)
                .cyan()
                .bold()
        );
        for (i, persona) in personas.iter().enumerate() {
            output.push_str(&format!(
                "  {}. {}\n     {} {}\n",
                i + 1,
                persona.name.bold(),
                "north star:".dimmed(),
                persona.north_star
            ));
        }
        output
    }

    pub fn goals(goals: &[Goal], personas: &[Persona]) -> String {
        if goals.is_empty() {
            return Self::info_banner("No goals yet.");
        }
        let mut output = format!("{}\n", "Goals".cyan().bold());
        for goal in goals {
            let owner = goal
                .persona_id
                .as_deref()
                .and_then(|id| personas.iter().find(|p| p.id == id))
                .map(|p| format!(" [{}]", p.name))
                .unwrap_or_default();
            let status = match goal.status {
                GoalStatus::Active => goal.status.as_str().green(),
                GoalStatus::Completed => goal.status.as_str().blue(),
                GoalStatus::Refined => goal.status.as_str().yellow(),
            };
            output.push_str(&format!(
                "  - {}{} ({}, {}%, review {})\n",
                goal.name.bold(),
                owner.dimmed(),
                status,
                goal.success_percentage,
                goal.review_date
            ));
            if let Some(criteria) = &goal.acceptance_criteria {
                output.push_str(&format!("      {} {}\n", "done when:".dimmed(), criteria));
            }
        }
        output
    }

    /// One line per persona change; empty when nothing happened
    pub fn persona_report(report: &PersonaActionReport) -> String {
        let mut lines = Vec::new();
        for persona in &report.created {
            lines.push(format!("{} Added persona {}", "+".green(), persona.name.bold()));
        }
        for persona in &report.updated {
            lines.push(format!("{} Updated persona {}", "~".yellow(), persona.name.bold()));
        }
        for name in &report.deleted {
            lines.push(format!("{} Removed persona {}", "-".red(), name.bold()));
        }
        for error in &report.errors {
            lines.push(Self::error_banner(error));
        }
        lines.join("\n")
    }

    pub fn goal_report(report: &GoalActionReport) -> String {
        let mut lines = Vec::new();
        for goal in &report.created {
            lines.push(format!(
                "{} Added goal {} (review {})",
                "+".green(),
                goal.name.bold(),
                goal.review_date
            ));
        }
        for goal in &report.updated {
            lines.push(format!("{} Updated goal {}", "~".yellow(), goal.name.bold()));
        }
        for error in &report.errors {
            lines.push(Self::error_banner(error));
        }
        lines.join("\n")
    }

    pub fn pending(messages: &[PendingMessage]) -> String {
        if messages.is_empty() {
            return Self::info_banner("Nothing is waiting to be sent.");
        }
        let mut output = format!("{}\n", "Waiting for the backend".yellow().bold());
        for message in messages {
            let line = match message {
                PendingMessage::Outgoing { text, queued_at } => {
                    format!("  {} {}", queued_at.format("%H:%M:%S").to_string().dimmed(), text)
                }
                PendingMessage::Unpersisted(message) => {
                    format!("  {} {}", "(unsaved)".dimmed(), message.transcript_line())
                }
            };
            output.push_str(&line);
            output.push('\n');
        }
        output
    }

    pub fn conversations(records: &[ConversationRecord]) -> String {
        if records.is_empty() {
            return Self::info_banner("No matching conversations.");
        }
        let mut output = String::new();
        for record in records {
            output.push_str(&format!(
                "  {} {} {}\n",
                record.started_at.format("%Y-%m-%d").to_string().dimmed(),
                record
                    .topic
                    .as_deref()
                    .unwrap_or(&record.conversation_type)
                    .bold(),
                if record.tags.is_empty() {
                    String::new()
                } else {
                    format!("#{}", record.tags.join(" #")).blue().to_string()
                }
            ));
            if let Some(summary) = &record.summary {
                output.push_str(&format!("      {}\n", summary));
            }
        }
        output
    }

    /// Indent a multi-line string
    pub fn indent(text: &str, prefix: &str) -> String {
        text.lines()
            .map(|line| format!("{}{}", prefix, line))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn plain() {
        colored::control::set_override(false);
    }

    fn persona(name: &str) -> Persona {
        Persona {
            id: format!("id-{name}"),
            name: name.to_string(),
            north_star: "Show up fully".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_coach_reply_is_labelled() {
        plain();
        let output = ConsoleFormatter::coach_reply(AgentType::Discovery, "Hello\nThere");
        assert!(output.contains("Discovery Agent"));
        assert!(output.contains("  Hello\n  There"));
    }

    #[test]
    fn test_personas_show_capacity() {
        plain();
        let output = ConsoleFormatter::personas(&[persona("Parent"), persona("Leader")]);
        assert!(output.contains("Personas (2/9)"));
        assert!(output.contains("2. Leader"));
    }

    #[test]
    fn test_empty_report_prints_nothing() {
        assert!(ConsoleFormatter::persona_report(&PersonaActionReport::default()).is_empty());
        assert!(ConsoleFormatter::goal_report(&GoalActionReport::default()).is_empty());
    }

    #[test]
    fn test_persona_report_lines() {
        plain();
        let report = PersonaActionReport {
            created: vec![persona("Parent")],
            deleted: vec!["Athlete".to_string()],
            errors: vec!["Persona \"Ghost\" was not found".to_string()],
            ..Default::default()
        };
        let output = ConsoleFormatter::persona_report(&report);
        let lines: Vec<_> = output.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].contains("Added persona Parent"));
        assert!(lines[1].contains("Removed persona Athlete"));
        assert!(lines[2].contains("Ghost"));
    }
}
