use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::ai::Summarizer;
use crate::config::AppConfig;
use crate::content::ContentExtractor;
use crate::feed::Article;
use crate::publish::{format_article_message, Publisher};
use crate::shutdown::or_cancelled;
use crate::storage::ArticleStore;
use crate::{Error, Result};

/// Periodically publishes the newest unposted article
pub struct Notifier {
    articles: Arc<dyn ArticleStore>,
    extractor: ContentExtractor,
    summarizer: Arc<Summarizer>,
    publisher: Arc<dyn Publisher>,
    send_interval: Duration,
    lookup_window: Duration,
}

impl Notifier {
    pub fn new(
        articles: Arc<dyn ArticleStore>,
        extractor: ContentExtractor,
        summarizer: Arc<Summarizer>,
        publisher: Arc<dyn Publisher>,
        config: &AppConfig,
    ) -> Self {
        Self {
            articles,
            extractor,
            summarizer,
            publisher,
            send_interval: config.sync.notification_interval(),
            lookup_window: config.sync.lookup_window(),
        }
    }

    /// Run notification ticks until cancelled
    ///
    /// A failed tick is logged and the article stays unposted, so it is the
    /// natural candidate again on the next tick. Returns [`Error::Cancelled`]
    /// on shutdown.
    pub async fn run(&self, cancel: CancellationToken) -> Result<()> {
        info!(
            "Notifier started: interval={}s, lookup_window={}s",
            self.send_interval.as_secs(),
            self.lookup_window.as_secs()
        );

        let mut interval = tokio::time::interval(self.send_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        // Skip the first tick (fires immediately)
        interval.tick().await;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Notifier received shutdown signal");
                    return Err(Error::Cancelled);
                }

                _ = interval.tick() => {
                    debug!("Running scheduled notification");
                    match self.select_and_send(&cancel).await {
                        Ok(Some(article)) => {
                            info!(article_id = article.id, "Published article: {}", article.title);
                        }
                        Ok(None) => debug!("No pending articles to publish"),
                        Err(e) if e.is_cancelled() => {
                            info!("Notifier received shutdown signal");
                            return Err(e);
                        }
                        Err(e) => error!("Scheduled notification failed: {}", e),
                    }
                }
            }
        }
    }

    /// Pick the newest unposted article in the lookup window and publish it
    ///
    /// Returns the published article, or `None` when nothing is pending.
    pub async fn select_and_send(&self, cancel: &CancellationToken) -> Result<Option<Article>> {
        let window = chrono::Duration::from_std(self.lookup_window)
            .map_err(|e| Error::Config(format!("lookup window out of range: {}", e)))?;
        let since = Utc::now() - window;

        let article = match or_cancelled(cancel, self.articles.all_not_posted(since, 1))
            .await?
            .into_iter()
            .next()
        {
            Some(article) => article,
            None => return Ok(None),
        };

        debug!(article_id = article.id, link = %article.link, "Selected article");

        let text = self.extractor.extract(&article, cancel).await?;
        let summary = self.summarizer.summarize(&text, cancel).await?;

        let message = format_article_message(&article.title, &format!("\n\n{}", summary), &article.link);
        or_cancelled(cancel, self.publisher.publish(&message)).await?;

        // Not raced against shutdown: once the message is out, record it.
        // Published but unmarked articles get re-sent on a later tick.
        if let Err(e) = self.articles.mark_posted(article.id).await {
            warn!(article_id = article.id, error = %e, "Failed to mark article as posted");
        }

        Ok(Some(article))
    }
}
