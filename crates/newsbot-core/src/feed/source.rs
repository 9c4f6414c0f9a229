use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use tokio_util::sync::CancellationToken;

use super::models::{Item, Source};
use super::parser::parse_items;
use crate::{Error, Result};

const MAX_FEED_BYTES: usize = 5 * 1024 * 1024;

/// Anything that can be polled for new items
#[async_trait]
pub trait SourceAdapter: Send + Sync {
    /// ID of the owning source row
    fn id(&self) -> i64;

    /// Display name of the owning source row
    fn name(&self) -> &str;

    /// Fetch and normalize the current items.
    ///
    /// Returns [`Error::Cancelled`] as soon as `cancel` fires, even if the
    /// underlying request is still in flight. Every other failure is
    /// reported as [`Error::FeedFetch`].
    async fn fetch(&self, cancel: &CancellationToken) -> Result<Vec<Item>>;
}

/// RSS/Atom/JSON feed endpoint
pub struct FeedSource {
    id: i64,
    name: String,
    url: String,
    client: Client,
}

impl FeedSource {
    pub fn new(id: i64, name: impl Into<String>, url: impl Into<String>, client: Client) -> Self {
        Self {
            id,
            name: name.into(),
            url: url.into(),
            client,
        }
    }

    pub fn from_source(source: &Source, client: Client) -> Self {
        Self::new(source.id, &source.name, &source.feed_url, client)
    }
}

#[async_trait]
impl SourceAdapter for FeedSource {
    fn id(&self) -> i64 {
        self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    async fn fetch(&self, cancel: &CancellationToken) -> Result<Vec<Item>> {
        let mut handle = tokio::spawn(load_feed(
            self.client.clone(),
            self.url.clone(),
            self.name.clone(),
        ));

        tokio::select! {
            biased;

            _ = cancel.cancelled() => {
                // whatever the task produces from here on is discarded
                handle.abort();
                Err(Error::Cancelled)
            }

            joined = &mut handle => match joined {
                Ok(result) => result.map_err(opaque),
                Err(e) => Err(Error::FeedFetch(format!("feed task failed: {}", e))),
            },
        }
    }
}

/// Retrieve and parse one feed document
async fn load_feed(client: Client, url: String, source_name: String) -> Result<Vec<Item>> {
    tracing::debug!(source = %source_name, %url, "Fetching feed");

    let response = client.get(&url).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(Error::HttpStatus {
            status: status.as_u16(),
            url,
        });
    }

    let content = response.bytes().await?;
    if content.len() > MAX_FEED_BYTES {
        return Err(Error::FeedFetch(format!(
            "Feed too large ({} bytes) for URL: {}",
            content.len(),
            url
        )));
    }

    let fetched_at = Utc::now();
    tokio::task::spawn_blocking(move || parse_items(&content, &source_name, fetched_at))
        .await
        .map_err(|e| Error::FeedFetch(format!("parser task failed: {}", e)))?
}

fn opaque(err: Error) -> Error {
    match err {
        Error::FeedFetch(_) | Error::Cancelled => err,
        other => Error::FeedFetch(other.to_string()),
    }
}
