//! CLI command definitions

use bestself_domain::AgentType;
use clap::Parser;
use std::path::PathBuf;

/// CLI arguments for bestself-coach
#[derive(Parser, Debug)]
#[command(name = "bestself")]
#[command(author, version, about = "MyBestSelf coach - discover your personas and set goals")]
#[command(long_about = r#"
A conversational coach that helps you name the roles you play (personas),
give each one a north star, and turn them into concrete goals.

Five coaching agents share the conversation: educational, discovery,
refinement, management and goal. The coach picks one per message; --agent
or /agent pins one.

Configuration files are loaded from (in priority order):
1. BESTSELF_* environment variables (e.g. BESTSELF_LLM__MODEL=gpt-4o)
2. --config <path>       Explicit config file
3. ./bestself.toml       Project-level config
4. ~/.config/bestself/config.toml   Global config

Example:
  bestself --login sam@example.com
  bestself --verify 5f0c...e21
  bestself --local
  bestself --agent discovery -v
"#)]
pub struct Cli {
    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,

    /// Chat as this user id instead of the remembered sign-in
    #[arg(long, value_name = "USER_ID")]
    pub user: Option<String>,

    /// Email a magic sign-in link and exit
    #[arg(long, value_name = "EMAIL", conflicts_with = "verify")]
    pub login: Option<String>,

    /// Complete sign-in with the token from the emailed link
    #[arg(long, value_name = "TOKEN")]
    pub verify: Option<String>,

    /// Create an account for this email, sign in as it and exit
    #[arg(long, value_name = "EMAIL", conflicts_with_all = ["login", "verify"])]
    pub register: Option<String>,

    /// Display name for --register
    #[arg(long, value_name = "NAME", requires = "register")]
    pub name: Option<String>,

    /// Forget the remembered sign-in and exit
    #[arg(long)]
    pub logout: bool,

    /// Pin the coaching agent for the whole session
    #[arg(long, value_name = "AGENT")]
    pub agent: Option<AgentType>,

    /// Keep everything in memory instead of talking to the backend
    #[arg(long)]
    pub local: bool,

    /// Also write diagnostic logs to daily files in this directory
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,
}
