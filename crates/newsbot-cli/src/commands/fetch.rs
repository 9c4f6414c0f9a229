use std::sync::Arc;

use anyhow::Result;
use tokio_util::sync::CancellationToken;

use newsbot_core::{
    scheduler::Fetcher,
    storage::{ArticleRepository, Database, SourceRepository},
    AppConfig,
};

pub async fn run(db: &Database, config: &AppConfig) -> Result<()> {
    println!("Fetching all sources...\n");

    let articles = ArticleRepository::new(db);
    let fetcher = Fetcher::new(
        Arc::new(articles.clone()),
        Arc::new(SourceRepository::new(db)),
        config,
    )?;

    let stats = fetcher.fetch(&CancellationToken::new()).await?;

    if stats.sources == 0 {
        println!("No sources configured.");
        println!("\nTo add a source, run:");
        println!("  newsbot source add --name <name> --url <feed-url>");
        return Ok(());
    }

    println!(
        "Fetch complete. {} new articles from {} sources ({} failed, {} items filtered).",
        stats.new_articles, stats.sources, stats.failed_sources, stats.skipped_items
    );
    println!("Total articles stored: {}", articles.count().await?);

    Ok(())
}
