//! CLI entry point for medbot

mod tui;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use medbot_client::{FeedbackRequest, HttpChatClient};
use medbot_core::config::{Config, ConfigLoader};
use medbot_core::identity::{resolve_user_id, USER_ID_KEY};
use medbot_core::logging::{init_logging, ConsoleOutput};
use medbot_core::render::{render_message, RenderOptions};
use medbot_core::session::{ConversationSession, Sender, DISCLAIMER, TYPING_INDICATOR};
use medbot_core::storage::{JsonFileStore, KeyValueStore};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

#[derive(Parser)]
#[command(name = "medbot")]
#[command(about = "Terminal chat client for the MedBot preliminary health assistant")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Configuration directory
    #[arg(short, long, global = true)]
    config_dir: Option<PathBuf>,

    /// Chat server base URL, e.g. http://localhost:8000
    #[arg(short, long, global = true)]
    server: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Open the interactive chat (default)
    Chat,
    /// Send a single message and print the reply
    Send {
        /// Message to send
        #[arg(short, long)]
        message: String,
    },
    /// Show configuration, user id and server health
    Status,
    /// Print the persistent user id, creating it if needed
    Whoami,
    /// List the conditions known to the server
    Conditions,
    /// List the remedies for one condition
    Remedies {
        /// Condition id as shown by `conditions`
        condition_id: i64,
    },
    /// Send feedback about the assistant
    Feedback {
        /// Feedback text
        #[arg(short, long)]
        message: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config_loader = if let Some(dir) = cli.config_dir {
        ConfigLoader::with_dir(dir)
    } else {
        ConfigLoader::new()
    };

    let mut config = config_loader.load()?;
    if let Some(server) = cli.server {
        config.server.base_url = server;
    }

    let command = cli.command.unwrap_or(Commands::Chat);
    let console = match command {
        Commands::Chat => ConsoleOutput::Disabled,
        _ => ConsoleOutput::Stderr,
    };
    let _log_guard = match init_logging(&config.logging, console) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("Logging disabled: {}", e);
            None
        }
    };

    match command {
        Commands::Chat => {
            info!("Starting chat");
            run_chat(&config_loader, &config).await?;
        }
        Commands::Send { message } => {
            info!("Sending one-shot message");
            run_send(&config_loader, &config, message).await?;
        }
        Commands::Status => run_status(&config_loader, &config).await?,
        Commands::Whoami => run_whoami(&config_loader, &config)?,
        Commands::Conditions => run_conditions(&config).await?,
        Commands::Remedies { condition_id } => run_remedies(&config, condition_id).await?,
        Commands::Feedback { message } => run_feedback(&config_loader, &config, message).await?,
    }

    Ok(())
}

fn open_store(loader: &ConfigLoader, config: &Config) -> JsonFileStore {
    JsonFileStore::new(config.storage.resolve_path(loader.config_dir()))
}

fn storage_context(path: &Path) -> String {
    format!(
        "failed to resolve user id in {}; fix or remove this file to create a new id",
        path.display()
    )
}

fn render_options(config: &Config) -> RenderOptions {
    RenderOptions {
        sanitize_bot_markup: config.ui.sanitize_bot_markup,
    }
}

/// Build a session wired to the configured server with its user id resolved
fn open_session(loader: &ConfigLoader, config: &Config) -> Result<ConversationSession> {
    let client = Arc::new(HttpChatClient::new(&config.server));
    let mut store = open_store(loader, config);
    let mut session = ConversationSession::new(client);
    session
        .initialize(&mut store)
        .with_context(|| storage_context(store.path()))?;
    Ok(session)
}

async fn run_chat(loader: &ConfigLoader, config: &Config) -> Result<()> {
    let session = open_session(loader, config)?;
    let app = tui::ChatApp::new(session, render_options(config));
    tui::run(app).await
}

async fn run_send(loader: &ConfigLoader, config: &Config, message: String) -> Result<()> {
    let mut session = open_session(loader, config)?;
    session.state_mut().set_input(message);
    if !session.state().can_submit() {
        warn!("Refusing to send an empty message");
        anyhow::bail!("message must not be empty");
    }

    println!("{}", style(DISCLAIMER).yellow());
    println!();

    let spinner = ProgressBar::new_spinner();
    spinner.set_style(ProgressStyle::default_spinner().template("{spinner} {msg}")?);
    spinner.set_message(TYPING_INDICATOR);
    spinner.enable_steady_tick(Duration::from_millis(100));

    let before = session.state().messages().len();
    session.submit().await;
    spinner.finish_and_clear();

    let options = render_options(config);
    for message in &session.state().messages()[before..] {
        let label = match message.sender() {
            Sender::User => style("You:").cyan().bold(),
            Sender::Bot => style("MedBot:").green().bold(),
        };
        let mut lines = render_message(message, options).into_iter();
        if let Some(first) = lines.next() {
            println!("{} {}", label, first);
        }
        for line in lines {
            println!("{}", line);
        }
    }
    Ok(())
}

async fn run_status(loader: &ConfigLoader, config: &Config) -> Result<()> {
    let store = open_store(loader, config);

    println!("{}", style("MedBot Status").bold().cyan());
    println!("Version: {}\n", env!("CARGO_PKG_VERSION"));

    println!("{}", style("Configuration:").bold());
    println!("  Config directory: {}", loader.config_dir().display());
    println!("  Chat endpoint: {}", config.server.chat_url());
    println!("  Storage file: {}", store.path().display());
    println!(
        "  Bot markup: {}",
        if config.ui.sanitize_bot_markup {
            "sanitized"
        } else {
            "interpreted"
        }
    );
    println!();

    println!("{}", style("Identity:").bold());
    match store.get(USER_ID_KEY) {
        Ok(Some(id)) if !id.trim().is_empty() => println!("  User id: {}", id),
        Ok(_) => println!("  User id: {}", style("not yet created").dim()),
        Err(e) => println!("  User id: {} ({})", style("unreadable").red(), e),
    }
    println!();

    println!("{}", style("Server:").bold());
    let client = HttpChatClient::new(&config.server);
    match client.health().await {
        Ok(_) => println!("  {}: {}", config.server.health_url(), style("ok").green()),
        Err(e) => {
            warn!("Health check failed: {}", e);
            println!("  {}: {} ({})", config.server.health_url(), style("unreachable").red(), e);
        }
    }

    Ok(())
}

fn run_whoami(loader: &ConfigLoader, config: &Config) -> Result<()> {
    let mut store = open_store(loader, config);
    let user_id = resolve_user_id(&mut store).with_context(|| storage_context(store.path()))?;
    println!("{}", user_id);
    Ok(())
}

async fn run_conditions(config: &Config) -> Result<()> {
    let client = HttpChatClient::new(&config.server);
    let conditions = client
        .conditions()
        .await
        .with_context(|| format!("failed to fetch {}", config.server.conditions_url()))?;

    if conditions.is_empty() {
        println!("{}", style("No conditions recorded").dim());
        return Ok(());
    }
    for condition in &conditions {
        let severity = condition.severity_level.as_deref().unwrap_or("unknown");
        println!(
            "{:>4}  {} [{}]",
            style(condition.id).bold(),
            condition.name,
            style(severity).yellow()
        );
        if let Some(description) = &condition.description {
            println!("      {}", style(description).dim());
        }
    }
    Ok(())
}

async fn run_remedies(config: &Config, condition_id: i64) -> Result<()> {
    let client = HttpChatClient::new(&config.server);
    let remedies = client
        .remedies(condition_id)
        .await
        .with_context(|| format!("failed to fetch {}", config.server.remedies_url(condition_id)))?;

    if remedies.is_empty() {
        println!(
            "{}",
            style(format!("No remedies recorded for condition {}", condition_id)).dim()
        );
        return Ok(());
    }
    for remedy in &remedies {
        println!("- {}", remedy.remedy_text);
        if let Some(notes) = &remedy.safety_notes {
            println!("  {} {}", style("Safety:").red().bold(), notes);
        }
    }
    println!();
    println!("{}", style(DISCLAIMER).yellow());
    Ok(())
}

async fn run_feedback(loader: &ConfigLoader, config: &Config, message: String) -> Result<()> {
    if message.trim().is_empty() {
        anyhow::bail!("feedback must not be empty");
    }
    let mut store = open_store(loader, config);
    let user_id = resolve_user_id(&mut store).with_context(|| storage_context(store.path()))?;

    let client = HttpChatClient::new(&config.server);
    client
        .submit_feedback(&FeedbackRequest { message, user_id })
        .await
        .with_context(|| format!("failed to send feedback to {}", config.server.feedback_url()))?;
    info!("Feedback sent");
    println!("{}", style("Thanks for your feedback").green());
    Ok(())
}
