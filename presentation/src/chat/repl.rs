//! REPL (Read-Eval-Print Loop) for coaching chat

use super::command::{HELP, ReplCommand, parse_command};
use crate::ConsoleFormatter;
use crate::config::ReplConfig;
use bestself_application::{ChatService, GoalService, PersonaService, SendMessageResult};
use bestself_domain::{AgentType, DomainError, TransitionAction};
use colored::Colorize;
use reedline::{DefaultPrompt, DefaultPromptSegment, FileBackedHistory, Reedline, Signal};

const HISTORY_CAPACITY: usize = 1000;

/// Whether the loop should keep reading
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandResult {
    Continue,
    Exit,
}

/// Interactive chat REPL
pub struct ChatRepl {
    chat: ChatService,
    personas: PersonaService,
    goals: GoalService,
    config: ReplConfig,
    user_name: String,
    /// Agent forced on every turn (`--agent` or `/agent`)
    pinned_agent: Option<AgentType>,
}

impl ChatRepl {
    pub fn new(chat: ChatService, personas: PersonaService, goals: GoalService) -> Self {
        Self {
            chat,
            personas,
            goals,
            config: ReplConfig::default(),
            user_name: String::new(),
            pinned_agent: None,
        }
    }

    pub fn with_config(mut self, config: ReplConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_user_name(mut self, name: impl Into<String>) -> Self {
        self.user_name = name.into();
        self
    }

    pub fn with_pinned_agent(mut self, agent: Option<AgentType>) -> Self {
        self.pinned_agent = agent;
        self
    }

    /// Run the interactive REPL
    pub async fn run(&mut self) -> std::io::Result<()> {
        colored::control::set_override(self.config.color);

        let mut editor = Reedline::create();
        if let Some(path) = &self.config.history_file {
            let history = path
                .parent()
                .map_or(Ok(()), std::fs::create_dir_all)
                .map_err(|e| e.to_string())
                .and_then(|()| {
                    FileBackedHistory::with_file(HISTORY_CAPACITY, path.clone())
                        .map_err(|e| e.to_string())
                });
            match history {
                Ok(history) => editor = editor.with_history(Box::new(history)),
                Err(e) => eprintln!(
                    "{}",
                    ConsoleFormatter::error_banner(&format!("History disabled: {e}"))
                ),
            }
        }
        let prompt = DefaultPrompt::new(
            DefaultPromptSegment::Basic("you".to_string()),
            DefaultPromptSegment::Empty,
        );

        self.load_roster().await;
        self.print_welcome().await;

        loop {
            self.show_deliveries().await;

            match editor.read_line(&prompt)? {
                Signal::Success(line) => {
                    if self.handle_line(&line).await == CommandResult::Exit {
                        break;
                    }
                }
                Signal::CtrlC => {
                    println!("^C");
                }
                Signal::CtrlD => {
                    println!("Bye!");
                    break;
                }
            }
        }

        self.chat.shutdown().await;
        self.finish_edits().await;
        Ok(())
    }

    /// Handle one line of input: a slash command or a message for the coach
    pub async fn handle_line(&mut self, line: &str) -> CommandResult {
        let line = line.trim();
        if line.is_empty() {
            return CommandResult::Continue;
        }
        match parse_command(line) {
            Some(command) => self.handle_command(command).await,
            None => {
                self.send(line).await;
                CommandResult::Continue
            }
        }
    }

    async fn load_roster(&self) {
        if let Err(e) = self.personas.load().await {
            println!("{}", ConsoleFormatter::error_banner(&e.to_string()));
        }
        if let Err(e) = self.goals.load().await {
            println!("{}", ConsoleFormatter::error_banner(&e.to_string()));
        }
        self.chat.set_personas(self.personas.summaries().await).await;
    }

    async fn print_welcome(&self) {
        println!();
        println!("{}", "╭─────────────────────────────────────────────╮".cyan());
        println!("{}", "│            MyBestSelf - Coach Chat          │".cyan());
        println!("{}", "╰─────────────────────────────────────────────╯".cyan());
        println!();
        if !self.user_name.is_empty() {
            println!("Welcome back, {}.", self.user_name.bold());
        }
        let count = self.personas.personas().await.len();
        println!(
            "{} persona(s) on file. Coach: {}{}",
            count,
            self.chat.current_agent().await.display_name(),
            match self.pinned_agent {
                Some(agent) => format!(" (pinned to {})", agent),
                None => String::new(),
            }
        );
        println!("Type /help for commands.");
        println!();
    }

    async fn send(&self, text: &str) {
        if let Some(agent) = self.pinned_agent {
            self.chat.force_agent(agent).await;
        }
        let result = self.chat.send_message(text).await;
        self.present(&result).await;
    }

    async fn show_deliveries(&self) {
        for result in self.chat.take_deliveries().await {
            println!(
                "{}",
                ConsoleFormatter::info_banner("Reply to a message sent while offline:")
            );
            self.present(&result).await;
        }
    }

    /// Show a turn's reply and apply the actions it carries
    async fn present(&self, result: &SendMessageResult) {
        if result.queued {
            println!(
                "{}",
                ConsoleFormatter::info_banner(
                    "Saved offline. It will be sent when the backend is back."
                )
            );
            return;
        }

        if let (Some(text), Some(agent)) = (&result.coach_reply, result.agent) {
            println!();
            println!("{}", ConsoleFormatter::coach_reply(agent, text));
        }
        if let Some(error) = &result.error {
            println!("{}", ConsoleFormatter::error_banner(error));
        }

        if !result.persona_actions.is_empty() {
            let report = self.personas.apply_actions(&result.persona_actions).await;
            print_nonempty(ConsoleFormatter::persona_report(&report));
            self.chat.set_personas(self.personas.summaries().await).await;
        }

        for transition in &result.transition_actions {
            let TransitionAction::TransitionToGoals { persona_name } = transition;
            match self.personas.find(persona_name).await {
                Some(persona) => {
                    self.chat
                        .focus_persona(persona.id.clone(), persona.summary(), AgentType::Goal)
                        .await;
                    println!(
                        "{}",
                        ConsoleFormatter::info_banner(&format!(
                            "Setting goals for {}",
                            persona.name
                        ))
                    );
                }
                None => println!(
                    "{}",
                    ConsoleFormatter::error_banner(
                        &DomainError::PersonaNotFound(persona_name.clone()).to_string()
                    )
                ),
            }
        }

        if !result.goal_actions.is_empty() {
            let persona_id = self.chat.context().await.target_persona_id;
            let report = self
                .goals
                .apply_actions(&result.goal_actions, persona_id.as_deref())
                .await;
            print_nonempty(ConsoleFormatter::goal_report(&report));
        }
    }

    async fn handle_command(&mut self, command: ReplCommand) -> CommandResult {
        match command {
            ReplCommand::Quit => {
                println!("Bye!");
                return CommandResult::Exit;
            }
            ReplCommand::Help => {
                println!();
                println!("Commands:");
                println!("{}", HELP);
                println!();
            }
            ReplCommand::Personas => {
                println!("{}", ConsoleFormatter::personas(&self.personas.personas().await));
            }
            ReplCommand::Goals(None) => {
                println!(
                    "{}",
                    ConsoleFormatter::goals(
                        &self.goals.goals().await,
                        &self.personas.personas().await
                    )
                );
            }
            ReplCommand::Goals(Some(name)) => self.show_persona_goals(&name).await,
            ReplCommand::DeleteGoal(name) => match self.goals.find(&name).await {
                Some(goal) => match self.goals.delete(&goal.id).await {
                    Ok(()) => println!(
                        "{}",
                        ConsoleFormatter::info_banner(&format!("Deleted goal {}", goal.name))
                    ),
                    Err(e) => println!("{}", ConsoleFormatter::error_banner(&e.to_string())),
                },
                None => println!(
                    "{}",
                    ConsoleFormatter::error_banner(&DomainError::GoalNotFound(name).to_string())
                ),
            },
            ReplCommand::Agent(agent) => {
                self.pinned_agent = agent;
                let message = match agent {
                    Some(agent) => format!("Pinned to the {}", agent.display_name()),
                    None => "The coach will pick the agent for each message".to_string(),
                };
                println!("{}", ConsoleFormatter::info_banner(&message));
            }
            ReplCommand::Focus(None) => {
                self.chat.clear_focus().await;
                println!("{}", ConsoleFormatter::info_banner("Focus cleared"));
            }
            ReplCommand::Focus(Some(name)) => match self.personas.find(&name).await {
                Some(persona) => {
                    self.chat
                        .focus_persona(
                            persona.id.clone(),
                            persona.summary(),
                            AgentType::Refinement,
                        )
                        .await;
                    println!(
                        "{}",
                        ConsoleFormatter::info_banner(&format!("Focused on {}", persona.name))
                    );
                }
                None => println!(
                    "{}",
                    ConsoleFormatter::error_banner(
                        &DomainError::PersonaNotFound(name).to_string()
                    )
                ),
            },
            ReplCommand::Edit {
                persona,
                field,
                value,
            } => self.edit_persona(&persona, field, &value).await,
            ReplCommand::Complete { summary, insights } => {
                match self.chat.complete_conversation(&summary, &insights).await {
                    Ok(_) => println!(
                        "{}",
                        ConsoleFormatter::info_banner("Conversation saved. Starting fresh.")
                    ),
                    Err(e) => println!("{}", ConsoleFormatter::error_banner(&e.to_string())),
                }
            }
            ReplCommand::Clear => {
                self.chat.clear().await;
                println!("{}", ConsoleFormatter::info_banner("Conversation cleared"));
            }
            ReplCommand::Pending => {
                let flushed = self.chat.flush_pending().await;
                if flushed > 0 {
                    println!(
                        "{}",
                        ConsoleFormatter::info_banner(&format!("Sent {flushed} queued item(s)"))
                    );
                    self.show_deliveries().await;
                }
                println!(
                    "{}",
                    ConsoleFormatter::pending(&self.chat.pending_messages().await)
                );
            }
            ReplCommand::Tag(tags) => match self.chat.tag_conversation(&tags).await {
                Ok(record) => println!(
                    "{}",
                    ConsoleFormatter::info_banner(&format!("Tags: {}", record.tags.join(", ")))
                ),
                Err(e) => println!("{}", ConsoleFormatter::error_banner(&e.to_string())),
            },
            ReplCommand::Search(query) => match self.chat.search_conversations(&query).await {
                Ok(records) => println!("{}", ConsoleFormatter::conversations(&records)),
                Err(e) => println!("{}", ConsoleFormatter::error_banner(&e.to_string())),
            },
            ReplCommand::Progress {
                goal,
                status,
                percentage,
                notes,
            } => match self
                .goals
                .set_progress(&goal, status, percentage, notes)
                .await
            {
                Ok(goal) => println!(
                    "{}",
                    ConsoleFormatter::info_banner(&format!(
                        "{}: {} ({}%)",
                        goal.name, goal.status, goal.success_percentage
                    ))
                ),
                Err(e) => println!("{}", ConsoleFormatter::error_banner(&e.to_string())),
            },
            ReplCommand::Usage(usage) => {
                println!("{} {}", "Usage:".yellow(), usage);
            }
            ReplCommand::Unknown(command) => {
                println!("Unknown command: {}", command);
                println!("Type /help for available commands");
            }
        }
        CommandResult::Continue
    }

    /// A persona's goals, fresh from the backend when it answers
    async fn show_persona_goals(&self, name: &str) {
        let Some(persona) = self.personas.find(name).await else {
            println!(
                "{}",
                ConsoleFormatter::error_banner(
                    &DomainError::PersonaNotFound(name.to_string()).to_string()
                )
            );
            return;
        };
        let goals = match self
            .goals
            .load_for_personas(std::slice::from_ref(&persona.id))
            .await
        {
            Ok(goals) => goals,
            Err(e) => {
                println!("{}", ConsoleFormatter::error_banner(&e.to_string()));
                self.goals.goals_for_persona(&persona.id).await
            }
        };
        println!(
            "{}",
            ConsoleFormatter::goals(&goals, std::slice::from_ref(&persona))
        );
    }

    /// Give debounced persona edits one quiet period to land before exit
    async fn finish_edits(&self) {
        let waiting = self.personas.pending_edits();
        if waiting == 0 {
            return;
        }
        println!(
            "{}",
            ConsoleFormatter::info_banner(&format!("Saving {waiting} persona edit(s)..."))
        );
        self.personas.flush_edits().await;
    }

    async fn edit_persona(
        &self,
        name: &str,
        field: bestself_application::PersonaField,
        value: &str,
    ) {
        let Some(persona) = self.personas.find(name).await else {
            println!(
                "{}",
                ConsoleFormatter::error_banner(
                    &DomainError::PersonaNotFound(name.to_string()).to_string()
                )
            );
            return;
        };
        match self
            .personas
            .schedule_field_edit(&persona.id, field, value)
            .await
        {
            Ok(()) => {
                self.chat.set_personas(self.personas.summaries().await).await;
                println!(
                    "{}",
                    ConsoleFormatter::info_banner(&format!(
                        "{} {} updated",
                        persona.name,
                        field.as_str()
                    ))
                );
            }
            Err(e) => println!("{}", ConsoleFormatter::error_banner(&e.to_string())),
        }
    }
}

fn print_nonempty(text: String) {
    if !text.is_empty() {
        println!("{}", text);
    }
}
