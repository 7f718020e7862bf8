//! CLI entrypoint for bestself-coach
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

use anyhow::{Context, Result, bail};
use bestself_application::{
    AuthPort, ChatProgressNotifier, ChatService, ConnectivityProbe, ConversationLogger,
    ConversationManager, ConversationRepository, GoalRepository, GoalService, NoChatProgress,
    PersonaRepository, PersonaService, SessionStore, SignInUseCase,
};
use bestself_domain::AgentRegistry;
use bestself_infrastructure::{
    ConfigLoader, FileConfig, FileSessionStore, HttpBackendClient, InMemoryBackend,
    JsonlConversationLogger, OpenAiGateway, Severity,
};
use bestself_presentation::{ChatRepl, Cli, ProgressReporter, ReplConfig, SimpleProgress};
use clap::Parser;
use std::io::IsTerminal;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::{error, info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::prelude::*;

const LOCAL_USER_ID: &str = "local-user";

/// The backend adapters, all pointing at the same store
struct Backend {
    auth: Arc<dyn AuthPort>,
    personas: Arc<dyn PersonaRepository>,
    goals: Arc<dyn GoalRepository>,
    conversations: Arc<dyn ConversationRepository>,
    probe: Arc<dyn ConnectivityProbe>,
}

impl Backend {
    fn local() -> Self {
        let store = Arc::new(InMemoryBackend::new());
        Self {
            auth: store.clone(),
            personas: store.clone(),
            goals: store.clone(),
            conversations: store.clone(),
            probe: store,
        }
    }

    fn http(config: &FileConfig) -> Result<Self> {
        let client = Arc::new(HttpBackendClient::new(
            &config.backend.base_url,
            &config.backend.health_path,
            Duration::from_secs(config.backend.timeout_seconds),
        )?);
        Ok(Self {
            auth: client.clone(),
            personas: client.clone(),
            goals: client.clone(),
            conversations: client.clone(),
            probe: client,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let _log_guard = init_logging(cli.verbose, cli.quiet, cli.log_dir.as_deref())?;

    if cli.show_config {
        ConfigLoader::print_config_sources();
        return Ok(());
    }

    let config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_deref())
            .map_err(|e| anyhow::anyhow!("Failed to load configuration: {e}"))?
    };

    for issue in config.validate() {
        match issue.severity {
            Severity::Warning => warn!("{}: {}", issue.field, issue.message),
            Severity::Error => error!("{}: {} (using the default)", issue.field, issue.message),
        }
    }

    info!("Starting bestself-coach");

    // === Dependency Injection ===
    let backend = if cli.local {
        Backend::local()
    } else {
        Backend::http(&config)?
    };

    let session_path =
        FileSessionStore::default_path().context("No data directory for the session file")?;
    let session: Arc<dyn SessionStore> = Arc::new(FileSessionStore::new(session_path));
    let sign_in = SignInUseCase::new(backend.auth.clone(), session);

    if cli.logout {
        sign_in.sign_out()?;
        println!("Signed out.");
        return Ok(());
    }
    if let Some(email) = &cli.login {
        sign_in.request_link(email).await?;
        println!("Sign-in link sent to {email}. Run `bestself --verify <token>` next.");
        return Ok(());
    }
    if let Some(token) = &cli.verify {
        let user = sign_in.verify(token).await?;
        println!("Signed in as {}.", user.id);
        return Ok(());
    }
    if let Some(email) = &cli.register {
        let user = sign_in.register(cli.name.as_deref(), email).await?;
        println!("Account created. Signed in as {}.", user.id);
        return Ok(());
    }

    let user_id = match (&cli.user, cli.local) {
        (Some(id), _) => id.clone(),
        (None, true) => LOCAL_USER_ID.to_string(),
        (None, false) => match sign_in.remembered_user_id()? {
            Some(id) => id,
            None => bail!("Not signed in. Run `bestself --login <email>` or pass --user."),
        },
    };

    let gateway = Arc::new(OpenAiGateway::new(
        &config.llm.base_url,
        config.llm.resolve_api_key(),
        Duration::from_secs(config.llm.timeout_seconds),
    )?);

    let conversation_logger: Option<Arc<dyn ConversationLogger>> = config
        .chat
        .conversation_log
        .as_deref()
        .and_then(JsonlConversationLogger::open)
        .map(|logger| {
            info!("Logging conversation events to {}", logger.path().display());
            Arc::new(logger.with_user(user_id.clone())) as Arc<dyn ConversationLogger>
        });

    let mut manager = ConversationManager::new(gateway, Arc::new(AgentRegistry::default()))
        .with_params(config.to_chat_params());
    if let Some(logger) = &conversation_logger {
        manager = manager.with_conversation_logger(logger.clone());
    }

    let repl_config = ReplConfig::default()
        .with_progress(config.repl.show_progress && !cli.quiet)
        .with_color(config.output.color)
        .with_history_file(config.repl.history_path());

    let progress: Arc<dyn ChatProgressNotifier> = if !repl_config.show_progress {
        Arc::new(NoChatProgress)
    } else if std::io::stdout().is_terminal() {
        Arc::new(ProgressReporter::new())
    } else {
        Arc::new(SimpleProgress)
    };

    let sync = config.to_sync_params();
    let mut builder = ChatService::builder(
        Arc::new(manager),
        backend.conversations,
        backend.probe,
        user_id.clone(),
    )
    .sync_params(sync)
    .progress(progress);
    if let Some(logger) = conversation_logger {
        builder = builder.conversation_logger(logger);
    }
    let chat = builder.build();

    let personas =
        PersonaService::new(backend.personas, user_id.clone()).with_debounce(sync.debounce);
    let goals = GoalService::new(backend.goals, user_id.clone());

    let mut repl = ChatRepl::new(chat, personas, goals)
        .with_config(repl_config)
        .with_user_name(user_id)
        .with_pinned_agent(cli.agent);

    repl.run().await?;
    Ok(())
}

/// Console logging by verbosity, plus daily log files when `log_dir` is set.
/// The returned guard flushes the file writer on drop.
fn init_logging(verbose: u8, quiet: bool, log_dir: Option<&Path>) -> Result<Option<WorkerGuard>> {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "warn",
        (false, 1) => "info",
        (false, 2) => "debug",
        _ => "trace", // -vvv or more
    };

    let console = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::new(level));

    match log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Cannot create log directory {}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(dir, "bestself.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let file = tracing_subscriber::fmt::layer()
                .with_writer(writer)
                .with_ansi(false)
                .with_filter(EnvFilter::new("debug"));
            tracing_subscriber::registry().with(console).with(file).init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry().with(console).init();
            Ok(None)
        }
    }
}
