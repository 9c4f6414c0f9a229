use std::sync::Arc;
use std::time::Duration;

use reqwest::Client;
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};

use crate::config::AppConfig;
use crate::feed::{should_skip, FeedSource, NewArticle, SourceAdapter};
use crate::http::build_client;
use crate::shutdown::or_cancelled;
use crate::storage::{ArticleStore, SourceStore};
use crate::{Error, Result};

/// Outcome of one fetch tick
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct FetchStats {
    pub sources: u32,
    pub failed_sources: u32,
    pub new_articles: u32,
    pub skipped_items: u32,
}

#[derive(Debug, Default)]
struct SourceStats {
    new_articles: u32,
    skipped_items: u32,
}

/// Periodically pulls every configured source and stores new articles
pub struct Fetcher {
    articles: Arc<dyn ArticleStore>,
    sources: Arc<dyn SourceStore>,
    client: Client,
    fetch_interval: Duration,
    filter_keywords: Arc<[String]>,
}

impl Fetcher {
    pub fn new(
        articles: Arc<dyn ArticleStore>,
        sources: Arc<dyn SourceStore>,
        config: &AppConfig,
    ) -> Result<Self> {
        let client = build_client(
            Duration::from_secs(config.sync.request_timeout_secs),
            config.sync.proxy_url.as_deref(),
        )?;

        Ok(Self {
            articles,
            sources,
            client,
            fetch_interval: config.sync.fetch_interval(),
            filter_keywords: config.filter.keywords.clone().into(),
        })
    }

    /// Replace the HTTP client used for feed requests
    pub fn with_client(mut self, client: Client) -> Self {
        self.client = client;
        self
    }

    /// Run fetch ticks until cancelled
    ///
    /// Returns [`Error::Cancelled`] on shutdown. A failure to load the source
    /// list stops the loop and is returned to the caller.
    pub async fn run(&self, cancel: CancellationToken) -> Result<()> {
        info!(
            "Fetcher started: interval={}s, keywords={}",
            self.fetch_interval.as_secs(),
            self.filter_keywords.len()
        );

        let mut interval = tokio::time::interval(self.fetch_interval);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        // Skip the first tick (fires immediately)
        interval.tick().await;

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    info!("Fetcher received shutdown signal");
                    return Err(Error::Cancelled);
                }

                _ = interval.tick() => {
                    debug!("Running scheduled fetch");
                    match self.fetch(&cancel).await {
                        Ok(stats) => {
                            if stats.new_articles > 0 {
                                info!("Scheduled fetch: {} new articles", stats.new_articles);
                            }
                        }
                        Err(e) if e.is_cancelled() => {
                            info!("Fetcher received shutdown signal");
                            return Err(e);
                        }
                        Err(e) => {
                            error!("Scheduled fetch failed: {}", e);
                            return Err(e);
                        }
                    }
                }
            }
        }
    }

    /// Run a single fetch tick over every configured source
    ///
    /// Sources are fetched concurrently and all of them finish before this
    /// returns. A failing source is logged and counted; it does not fail the tick.
    pub async fn fetch(&self, cancel: &CancellationToken) -> Result<FetchStats> {
        let sources = or_cancelled(cancel, self.sources.get_sources()).await?;

        let mut stats = FetchStats {
            sources: sources.len() as u32,
            ..FetchStats::default()
        };

        if sources.is_empty() {
            debug!("No sources configured, nothing to fetch");
            return Ok(stats);
        }

        let mut join_set = JoinSet::new();

        for source in &sources {
            let adapter: Box<dyn SourceAdapter> =
                Box::new(FeedSource::from_source(source, self.client.clone()));
            let articles = self.articles.clone();
            let keywords = self.filter_keywords.clone();
            let cancel = cancel.clone();

            join_set.spawn(async move {
                let result = process_source(adapter.as_ref(), articles.as_ref(), &keywords, &cancel).await;
                (adapter.name().to_string(), result)
            });
        }

        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((name, Ok(source_stats))) => {
                    debug!(
                        source = %name,
                        new = source_stats.new_articles,
                        skipped = source_stats.skipped_items,
                        "Source fetched"
                    );
                    stats.new_articles += source_stats.new_articles;
                    stats.skipped_items += source_stats.skipped_items;
                }
                Ok((_, Err(e))) if e.is_cancelled() => {}
                Ok((name, Err(e))) => {
                    error!(source = %name, error = %e, "Failed to fetch source");
                    stats.failed_sources += 1;
                }
                Err(e) => {
                    error!(error = %e, "Fetch task panicked");
                    stats.failed_sources += 1;
                }
            }
        }

        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        Ok(stats)
    }
}

/// Fetch one source, filter its items and store the survivors
///
/// Stops at the first store failure; articles stored before it are kept.
async fn process_source(
    adapter: &dyn SourceAdapter,
    articles: &dyn ArticleStore,
    keywords: &[String],
    cancel: &CancellationToken,
) -> Result<SourceStats> {
    let items = adapter.fetch(cancel).await?;
    let mut stats = SourceStats::default();

    for item in items {
        if should_skip(&item, keywords) {
            stats.skipped_items += 1;
            continue;
        }

        let article = NewArticle::from_item(adapter.id(), item);
        if or_cancelled(cancel, articles.add_article(&article)).await?.is_some() {
            stats.new_articles += 1;
        }
    }

    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feed::NewSource;
    use crate::storage::{ArticleRepository, Database, SourceRepository};
    use chrono::{Duration as ChronoDuration, Utc};
    use std::time::Instant;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn rss(items: &[(&str, &str, &str)]) -> String {
        let entries: String = items
            .iter()
            .map(|(title, link, category)| {
                format!(
                    "<item><title>{}</title><link>{}</link><category>{}</category>\
                     <description>About {}</description>\
                     <pubDate>Mon, 01 Jan 2024 10:00:00 GMT</pubDate></item>",
                    title, link, category, title
                )
            })
            .collect();

        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0"><channel><title>Test</title><link>https://example.com</link>
<description>Test feed</description>{}</channel></rss>"#,
            entries
        )
    }

    async fn mount_feed(server: &MockServer, route: &str, body: String, delay: Duration) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string(body)
                    .insert_header("Content-Type", "application/rss+xml")
                    .set_delay(delay),
            )
            .mount(server)
            .await;
    }

    struct Harness {
        db: Database,
        fetcher: Fetcher,
        sources: SourceRepository,
    }

    async fn harness(keywords: &[&str], timeout: Duration) -> Harness {
        let db = Database::new_in_memory().await.unwrap();
        let articles = ArticleRepository::new(&db);
        let sources = SourceRepository::new(&db);

        let mut config = AppConfig::default();
        config.filter.keywords = keywords.iter().map(|k| k.to_string()).collect();

        let fetcher = Fetcher::new(Arc::new(articles), Arc::new(sources.clone()), &config)
            .unwrap()
            .with_client(build_client(timeout, None).unwrap());

        Harness { db, fetcher, sources }
    }

    async fn add_source(harness: &Harness, name: &str, url: String) -> i64 {
        harness
            .sources
            .add_source(&NewSource {
                name: name.to_string(),
                feed_url: url,
                priority: 0,
            })
            .await
            .unwrap()
    }

    async fn stored_links(db: &Database) -> Vec<String> {
        let repo = ArticleRepository::new(db);
        let since = Utc::now() - ChronoDuration::days(365 * 100);
        let mut links: Vec<String> = repo
            .all_not_posted(since, 100)
            .await
            .unwrap()
            .into_iter()
            .map(|a| a.link)
            .collect();
        links.sort();
        links
    }

    #[tokio::test]
    async fn test_no_sources_is_noop() {
        let harness = harness(&[], Duration::from_secs(5)).await;

        let stats = harness.fetcher.fetch(&CancellationToken::new()).await.unwrap();

        assert_eq!(stats, FetchStats::default());
        assert!(stored_links(&harness.db).await.is_empty());
    }

    #[tokio::test]
    async fn test_timed_out_source_does_not_affect_siblings() {
        let server = MockServer::start().await;
        mount_feed(&server, "/a", rss(&[("A1", "https://a.example/1", "news")]), Duration::ZERO).await;
        mount_feed(&server, "/b", rss(&[("B1", "https://b.example/1", "news")]), Duration::ZERO).await;
        mount_feed(&server, "/slow", rss(&[("S1", "https://s.example/1", "news")]), Duration::from_secs(5)).await;

        let harness = harness(&[], Duration::from_millis(500)).await;
        add_source(&harness, "A", format!("{}/a", server.uri())).await;
        add_source(&harness, "Slow", format!("{}/slow", server.uri())).await;
        add_source(&harness, "B", format!("{}/b", server.uri())).await;

        let stats = harness.fetcher.fetch(&CancellationToken::new()).await.unwrap();

        assert_eq!(stats.sources, 3);
        assert_eq!(stats.failed_sources, 1);
        assert_eq!(stats.new_articles, 2);
        assert_eq!(
            stored_links(&harness.db).await,
            vec!["https://a.example/1", "https://b.example/1"]
        );
    }

    #[tokio::test]
    async fn test_refetch_is_idempotent() {
        let server = MockServer::start().await;
        let body = rss(&[
            ("First", "https://example.com/1", "tech"),
            ("Second", "https://example.com/2", "tech"),
        ]);
        mount_feed(&server, "/feed", body, Duration::ZERO).await;

        let harness = harness(&[], Duration::from_secs(5)).await;
        add_source(&harness, "Example", format!("{}/feed", server.uri())).await;

        let first = harness.fetcher.fetch(&CancellationToken::new()).await.unwrap();
        let second = harness.fetcher.fetch(&CancellationToken::new()).await.unwrap();

        assert_eq!(first.new_articles, 2);
        assert_eq!(second.new_articles, 0);
        assert_eq!(second.failed_sources, 0);
        assert_eq!(stored_links(&harness.db).await.len(), 2);
    }

    #[tokio::test]
    async fn test_filtered_items_are_not_stored() {
        let server = MockServer::start().await;
        let body = rss(&[
            ("Rust 2.0 released", "https://example.com/rust", "programming"),
            ("Weekly Sponsored roundup", "https://example.com/ad", "misc"),
            ("Match report", "https://example.com/sport", "sports"),
        ]);
        mount_feed(&server, "/feed", body, Duration::ZERO).await;

        let harness = harness(&["sponsored", "sports"], Duration::from_secs(5)).await;
        add_source(&harness, "Example", format!("{}/feed", server.uri())).await;

        let stats = harness.fetcher.fetch(&CancellationToken::new()).await.unwrap();

        assert_eq!(stats.new_articles, 1);
        assert_eq!(stats.skipped_items, 2);
        assert_eq!(stored_links(&harness.db).await, vec!["https://example.com/rust"]);
    }

    #[tokio::test]
    async fn test_cancel_mid_fetch_returns_promptly() {
        let server = MockServer::start().await;
        mount_feed(&server, "/slow", rss(&[("S1", "https://s.example/1", "news")]), Duration::from_secs(30)).await;

        let harness = harness(&[], Duration::from_secs(60)).await;
        add_source(&harness, "Slow", format!("{}/slow", server.uri())).await;
        add_source(&harness, "Slower", format!("{}/slow?again", server.uri())).await;

        let cancel = CancellationToken::new();
        let trigger = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            trigger.cancel();
        });

        let started = Instant::now();
        let result = harness.fetcher.fetch(&cancel).await;

        assert!(matches!(result, Err(Error::Cancelled)));
        assert!(started.elapsed() < Duration::from_secs(2));
        assert!(stored_links(&harness.db).await.is_empty());
    }

    #[tokio::test]
    async fn test_run_stops_on_cancel() {
        let harness = harness(&[], Duration::from_secs(5)).await;
        let cancel = CancellationToken::new();
        cancel.cancel();

        let result = tokio::time::timeout(Duration::from_secs(1), harness.fetcher.run(cancel)).await;

        assert!(matches!(result, Ok(Err(Error::Cancelled))));
    }
}
