//! Slash command parsing for the chat REPL

use bestself_application::PersonaField;
use bestself_domain::{AgentType, GoalStatus};

#[derive(Debug, Clone, PartialEq)]
pub enum ReplCommand {
    Help,
    Quit,
    Personas,
    /// Goals of one persona, or all of them
    Goals(Option<String>),
    DeleteGoal(String),
    /// `None` returns routing to the coach
    Agent(Option<AgentType>),
    /// `None` clears the focus
    Focus(Option<String>),
    Edit {
        persona: String,
        field: PersonaField,
        value: String,
    },
    Complete {
        summary: String,
        insights: Vec<String>,
    },
    Clear,
    Pending,
    Tag(Vec<String>),
    Search(String),
    Progress {
        goal: String,
        status: GoalStatus,
        percentage: u8,
        notes: Option<String>,
    },
    /// Recognised command used the wrong way; carries the usage line
    Usage(&'static str),
    Unknown(String),
}

pub const HELP: &str = "\
  /help, /h, /?                     Show this help
  /personas                         List your personas
  /goals [persona]                  List your goals, or one persona's
  /delete-goal <goal>               Delete a goal
  /agent <type>|auto                Pin a coaching agent, or let the coach choose
  /focus <persona>|off              Focus the coach on one persona
  /edit <persona> name|north <value>  Edit a persona field
  /complete <summary> [| a; b]      Finish the conversation with key insights
  /clear                            Start over (queued messages are kept)
  /pending                          Show queued messages and retry now
  /tag <tag>...                     Tag the current conversation
  /search <text>                    Search past conversations
  /progress <goal> | <status> | <percent> [| notes]
  /quit, /exit, /q                  Exit chat";

const AGENT_USAGE: &str = "/agent educational|discovery|refinement|management|goal|auto";
const FOCUS_USAGE: &str = "/focus <persona>|off";
const EDIT_USAGE: &str = "/edit <persona> name|north <value>";
const COMPLETE_USAGE: &str = "/complete <summary> [| insight; insight]";
const TAG_USAGE: &str = "/tag <tag>...";
const DELETE_GOAL_USAGE: &str = "/delete-goal <goal>";
const SEARCH_USAGE: &str = "/search <text>";
const PROGRESS_USAGE: &str = "/progress <goal> | active|completed|refined | <0-100> [| notes]";

/// Parse a slash command; `None` when the line is a chat message
pub fn parse_command(line: &str) -> Option<ReplCommand> {
    let line = line.trim();
    let body = line.strip_prefix('/')?;
    let (name, rest) = match body.split_once(char::is_whitespace) {
        Some((name, rest)) => (name, rest.trim()),
        None => (body, ""),
    };

    Some(match name.to_lowercase().as_str() {
        "help" | "h" | "?" => ReplCommand::Help,
        "quit" | "exit" | "q" => ReplCommand::Quit,
        "personas" => ReplCommand::Personas,
        "goals" if rest.is_empty() => ReplCommand::Goals(None),
        "goals" => ReplCommand::Goals(Some(rest.to_string())),
        "delete-goal" if rest.is_empty() => ReplCommand::Usage(DELETE_GOAL_USAGE),
        "delete-goal" => ReplCommand::DeleteGoal(rest.to_string()),
        "agent" => match rest {
            "" => ReplCommand::Usage(AGENT_USAGE),
            "auto" => ReplCommand::Agent(None),
            other => match other.parse() {
                Ok(agent) => ReplCommand::Agent(Some(agent)),
                Err(_) => ReplCommand::Usage(AGENT_USAGE),
            },
        },
        "focus" => match rest {
            "" => ReplCommand::Usage(FOCUS_USAGE),
            "off" | "none" => ReplCommand::Focus(None),
            persona => ReplCommand::Focus(Some(persona.to_string())),
        },
        "edit" => parse_edit(rest).unwrap_or(ReplCommand::Usage(EDIT_USAGE)),
        "complete" => parse_complete(rest).unwrap_or(ReplCommand::Usage(COMPLETE_USAGE)),
        "clear" => ReplCommand::Clear,
        "pending" => ReplCommand::Pending,
        "tag" => {
            let tags: Vec<String> = rest
                .split(|c: char| c.is_whitespace() || c == ',')
                .map(|t| t.trim_start_matches('#'))
                .filter(|t| !t.is_empty())
                .map(str::to_string)
                .collect();
            if tags.is_empty() {
                ReplCommand::Usage(TAG_USAGE)
            } else {
                ReplCommand::Tag(tags)
            }
        }
        "search" if rest.is_empty() => ReplCommand::Usage(SEARCH_USAGE),
        "search" => ReplCommand::Search(rest.to_string()),
        "progress" => parse_progress(rest).unwrap_or(ReplCommand::Usage(PROGRESS_USAGE)),
        _ => ReplCommand::Unknown(line.to_string()),
    })
}

fn parse_edit(rest: &str) -> Option<ReplCommand> {
    let words: Vec<&str> = rest.split_whitespace().collect();
    let at = words
        .iter()
        .position(|w| matches!(w.to_lowercase().as_str(), "name" | "north"))
        .filter(|&i| i > 0 && i + 1 < words.len())?;
    let field = match words[at].to_lowercase().as_str() {
        "name" => PersonaField::Name,
        _ => PersonaField::NorthStar,
    };
    Some(ReplCommand::Edit {
        persona: words[..at].join(" "),
        field,
        value: words[at + 1..].join(" "),
    })
}

fn parse_complete(rest: &str) -> Option<ReplCommand> {
    let (summary, insights) = match rest.split_once('|') {
        Some((summary, insights)) => (summary.trim(), insights),
        None => (rest, ""),
    };
    if summary.is_empty() {
        return None;
    }
    Some(ReplCommand::Complete {
        summary: summary.to_string(),
        insights: insights
            .split(';')
            .map(str::trim)
            .filter(|i| !i.is_empty())
            .map(str::to_string)
            .collect(),
    })
}

fn parse_progress(rest: &str) -> Option<ReplCommand> {
    let mut parts = rest.splitn(4, '|').map(str::trim);
    let goal = parts.next().filter(|g| !g.is_empty())?;
    let status = parts.next()?.parse().ok()?;
    let percentage = parts.next()?.trim_end_matches('%').parse::<u8>().ok()?;
    let notes = parts.next().filter(|n| !n.is_empty()).map(str::to_string);
    Some(ReplCommand::Progress {
        goal: goal.to_string(),
        status,
        percentage,
        notes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_not_a_command() {
        assert_eq!(parse_command("I want to be a better parent"), None);
    }

    #[test]
    fn test_simple_commands() {
        assert_eq!(parse_command("/help"), Some(ReplCommand::Help));
        assert_eq!(parse_command(" /Q "), Some(ReplCommand::Quit));
        assert_eq!(parse_command("/clear"), Some(ReplCommand::Clear));
        assert_eq!(parse_command("/goals"), Some(ReplCommand::Goals(None)));
        assert_eq!(
            parse_command("/dance"),
            Some(ReplCommand::Unknown("/dance".to_string()))
        );
    }

    #[test]
    fn test_agent() {
        assert_eq!(
            parse_command("/agent goals"),
            Some(ReplCommand::Agent(Some(AgentType::Goal)))
        );
        assert_eq!(parse_command("/agent auto"), Some(ReplCommand::Agent(None)));
        assert!(matches!(
            parse_command("/agent therapist"),
            Some(ReplCommand::Usage(_))
        ));
    }

    #[test]
    fn test_edit_with_multi_word_persona() {
        assert_eq!(
            parse_command("/edit Strategic Leader north Empower teams to thrive"),
            Some(ReplCommand::Edit {
                persona: "Strategic Leader".to_string(),
                field: PersonaField::NorthStar,
                value: "Empower teams to thrive".to_string(),
            })
        );
        assert!(matches!(
            parse_command("/edit Parent name"),
            Some(ReplCommand::Usage(_))
        ));
        assert!(matches!(
            parse_command("/edit name Dad"),
            Some(ReplCommand::Usage(_))
        ));
    }

    #[test]
    fn test_complete_with_insights() {
        assert_eq!(
            parse_command("/complete Named three roles | Family first; Lead by example;"),
            Some(ReplCommand::Complete {
                summary: "Named three roles".to_string(),
                insights: vec!["Family first".to_string(), "Lead by example".to_string()],
            })
        );
        assert!(matches!(
            parse_command("/complete"),
            Some(ReplCommand::Usage(_))
        ));
    }

    #[test]
    fn test_tags() {
        assert_eq!(
            parse_command("/tag #career, growth"),
            Some(ReplCommand::Tag(vec![
                "career".to_string(),
                "growth".to_string()
            ]))
        );
    }

    #[test]
    fn test_progress() {
        assert_eq!(
            parse_command("/progress Run 5k | completed | 100% | Finished in 28 min"),
            Some(ReplCommand::Progress {
                goal: "Run 5k".to_string(),
                status: GoalStatus::Completed,
                percentage: 100,
                notes: Some("Finished in 28 min".to_string()),
            })
        );
        assert!(matches!(
            parse_command("/progress Run 5k | sideways | 10"),
            Some(ReplCommand::Usage(_))
        ));
    }

    #[test]
    fn test_goal_commands_take_names() {
        assert_eq!(
            parse_command("/goals Team Lead"),
            Some(ReplCommand::Goals(Some("Team Lead".to_string())))
        );
        assert_eq!(
            parse_command("/delete-goal Run 5k"),
            Some(ReplCommand::DeleteGoal("Run 5k".to_string()))
        );
        assert!(matches!(
            parse_command("/delete-goal"),
            Some(ReplCommand::Usage(_))
        ));
    }
}
