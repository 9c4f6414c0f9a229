mod article_repo;
mod database;
mod source_repo;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

pub use article_repo::ArticleRepository;
pub use database::Database;
pub use source_repo::SourceRepository;

use crate::feed::{Article, NewArticle, NewSource, Source};
use crate::Result;

/// Durable, idempotent article storage
#[async_trait]
pub trait ArticleStore: Send + Sync {
    /// Insert unless the link is already known; `None` means it was
    async fn add_article(&self, article: &NewArticle) -> Result<Option<i64>>;

    /// Unposted articles published at or after `since`, newest first
    async fn all_not_posted(&self, since: DateTime<Utc>, limit: u32) -> Result<Vec<Article>>;

    async fn mark_posted(&self, id: i64) -> Result<()>;
}

/// Durable storage for the configured source list
#[async_trait]
pub trait SourceStore: Send + Sync {
    async fn get_sources(&self) -> Result<Vec<Source>>;

    async fn get_source_by_id(&self, id: i64) -> Result<Option<Source>>;

    async fn add_source(&self, source: &NewSource) -> Result<i64>;

    async fn set_priority(&self, id: i64, priority: i32) -> Result<()>;

    /// Remove a source; a missing ID counts as success
    async fn delete_source(&self, id: i64) -> Result<()>;
}
