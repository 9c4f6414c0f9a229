use std::sync::Arc;

use anyhow::Result;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use newsbot_core::{
    ai::Summarizer,
    content::ContentExtractor,
    publish::TelegramPublisher,
    scheduler::{Fetcher, Notifier},
    storage::{ArticleRepository, ArticleStore, Database, SourceRepository, SourceStore},
    AppConfig,
};

/// Run both schedulers until Ctrl+C or SIGTERM
pub async fn run(db: &Database, config: Arc<AppConfig>) -> Result<()> {
    config.validate_for_daemon()?;

    let articles: Arc<dyn ArticleStore> = Arc::new(ArticleRepository::new(db));
    let sources: Arc<dyn SourceStore> = Arc::new(SourceRepository::new(db));

    let fetcher = Fetcher::new(articles.clone(), sources, &config)?;
    let notifier = Notifier::new(
        articles,
        ContentExtractor::new(&config)?,
        Arc::new(Summarizer::new(&config)?),
        Arc::new(TelegramPublisher::new(&config)?),
        &config,
    );

    let cancel = CancellationToken::new();
    tokio::spawn(cancel_on_signal(cancel.clone()));

    println!("newsbot started (PID: {}). Press Ctrl+C to stop.", std::process::id());
    println!("  Fetch interval: {} seconds", config.sync.fetch_interval_secs);
    println!("  Notification interval: {} seconds", config.sync.notification_interval_secs);
    println!("  Lookup window: {} seconds", config.sync.lookup_window().as_secs());

    let fetch_cancel = cancel.clone();
    let fetch_task = tokio::spawn(async move {
        if let Err(e) = fetcher.run(fetch_cancel).await {
            if !e.is_cancelled() {
                error!("Fetcher stopped with error: {}", e);
            }
        }
    });

    let notify_cancel = cancel.clone();
    let notify_task = tokio::spawn(async move {
        if let Err(e) = notifier.run(notify_cancel).await {
            if !e.is_cancelled() {
                error!("Notifier stopped with error: {}", e);
            }
        }
    });

    let (fetch_joined, notify_joined) = tokio::join!(fetch_task, notify_task);
    fetch_joined?;
    notify_joined?;

    println!("newsbot stopped.");
    Ok(())
}

async fn cancel_on_signal(cancel: CancellationToken) {
    wait_for_signal().await;
    info!("Received shutdown signal");
    cancel.cancel();
}

#[cfg(unix)]
async fn wait_for_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    match signal(SignalKind::terminate()) {
        Ok(mut sigterm) => {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => {}
                _ = sigterm.recv() => {}
            }
        }
        Err(e) => {
            error!("Failed to install SIGTERM handler: {}", e);
            tokio::signal::ctrl_c().await.ok();
        }
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() {
    tokio::signal::ctrl_c().await.ok();
}
