use anyhow::{bail, Result};

use newsbot_core::{
    feed::{NewSource, Source},
    storage::{Database, SourceRepository, SourceStore},
};

pub async fn add(db: &Database, name: &str, url: &str, priority: i32) -> Result<()> {
    let url = url::Url::parse(url)
        .map_err(|e| anyhow::anyhow!("Invalid feed URL '{}': {}", url, e))?;

    let repo = SourceRepository::new(db);
    if let Some(existing) = repo.find_by_url(url.as_str()).await? {
        println!("Source already exists: {} (ID: {})", existing.name, existing.id);
        return Ok(());
    }

    let id = repo
        .add_source(&NewSource {
            name: name.to_string(),
            feed_url: url.to_string(),
            priority,
        })
        .await?;

    println!("Source added with ID: {}", id);
    Ok(())
}

pub async fn list(db: &Database) -> Result<()> {
    let mut sources = SourceRepository::new(db).get_sources().await?;

    if sources.is_empty() {
        println!("No sources yet.");
        println!("\nTo add a source, run:");
        println!("  newsbot source add --name <name> --url <feed-url>");
        return Ok(());
    }

    // Stable sort keeps insertion order within equal priorities
    sources.sort_by(|a, b| b.priority.cmp(&a.priority));

    println!("Sources ({}):\n", sources.len());
    for source in &sources {
        print_source(source);
        println!();
    }

    Ok(())
}

pub async fn get(db: &Database, id: i64) -> Result<()> {
    match SourceRepository::new(db).get_source_by_id(id).await? {
        Some(source) => print_source(&source),
        None => bail!("Source {} not found", id),
    }

    Ok(())
}

pub async fn delete(db: &Database, id: i64) -> Result<()> {
    SourceRepository::new(db).delete_source(id).await?;
    println!("Source {} deleted.", id);
    Ok(())
}

pub async fn set_priority(db: &Database, id: i64, priority: i32) -> Result<()> {
    SourceRepository::new(db).set_priority(id, priority).await?;
    println!("Source {} priority set to {}.", id, priority);
    Ok(())
}

fn print_source(source: &Source) {
    println!("  {} (ID: {})", source.name, source.id);
    println!("    URL: {}", source.feed_url);
    println!("    Priority: {}", source.priority);
    println!("    Added: {}", source.created_at.format("%Y-%m-%d %H:%M"));
}
