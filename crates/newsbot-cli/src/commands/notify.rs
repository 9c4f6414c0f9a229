use std::sync::Arc;

use anyhow::Result;
use tokio_util::sync::CancellationToken;

use newsbot_core::{
    ai::Summarizer,
    content::ContentExtractor,
    publish::TelegramPublisher,
    scheduler::Notifier,
    storage::{ArticleRepository, Database},
    AppConfig,
};

pub async fn run(db: &Database, config: &AppConfig) -> Result<()> {
    config.validate_for_daemon()?;

    let notifier = Notifier::new(
        Arc::new(ArticleRepository::new(db)),
        ContentExtractor::new(config)?,
        Arc::new(Summarizer::new(config)?),
        Arc::new(TelegramPublisher::new(config)?),
        config,
    );

    match notifier.select_and_send(&CancellationToken::new()).await? {
        Some(article) => println!("Published: {}\n  {}", article.title, article.link),
        None => println!("No pending articles in the lookup window."),
    }

    Ok(())
}
