use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use newsbot_core::{storage::Database, AppConfig};

mod commands;

#[derive(Parser)]
#[command(name = "newsbot")]
#[command(author, version, about = "Posts AI summaries of feed articles to a Telegram channel")]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the fetch and notification loops until interrupted
    Run,
    /// Fetch every source once
    Fetch,
    /// Publish the newest pending article once
    Notify,
    /// Manage feed sources
    Source {
        #[command(subcommand)]
        action: SourceAction,
    },
}

#[derive(Subcommand)]
enum SourceAction {
    /// Add a feed source
    Add {
        /// Display name
        #[arg(short, long)]
        name: String,
        /// RSS/Atom feed URL
        #[arg(short, long)]
        url: String,
        /// Display priority; higher is listed first
        #[arg(short, long, default_value_t = 0)]
        priority: i32,
    },
    /// List sources by priority
    List,
    /// Show one source
    Get {
        id: i64,
    },
    /// Delete a source
    Delete {
        id: i64,
    },
    /// Change the display priority of a source
    SetPriority {
        id: i64,
        #[arg(allow_negative_numbers = true)]
        priority: i32,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration
    let config = match cli.config {
        Some(ref path) => AppConfig::load_from(path)?,
        None => AppConfig::load()?,
    };
    let config = Arc::new(config);

    // Initialize logging
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| config.general.log_level.clone()),
        ))
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .init();

    // Initialize database
    let db = Database::new(&config).await?;

    match cli.command {
        Some(Commands::Run) | None => commands::run::run(&db, config).await,
        Some(Commands::Fetch) => commands::fetch::run(&db, &config).await,
        Some(Commands::Notify) => commands::notify::run(&db, &config).await,
        Some(Commands::Source { action }) => match action {
            SourceAction::Add { name, url, priority } => {
                commands::source::add(&db, &name, &url, priority).await
            }
            SourceAction::List => commands::source::list(&db).await,
            SourceAction::Get { id } => commands::source::get(&db, id).await,
            SourceAction::Delete { id } => commands::source::delete(&db, id).await,
            SourceAction::SetPriority { id, priority } => {
                commands::source::set_priority(&db, id, priority).await
            }
        },
    }
}
