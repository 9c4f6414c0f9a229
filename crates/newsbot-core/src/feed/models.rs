use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A configured feed endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Source {
    pub id: i64,
    pub name: String,
    pub feed_url: String,
    /// Display ordering only; selection ignores it
    pub priority: i32,
    pub created_at: DateTime<Utc>,
}

/// Data required to create a new source
#[derive(Debug, Clone)]
pub struct NewSource {
    pub name: String,
    pub feed_url: String,
    pub priority: i32,
}

/// One normalized entry from a source fetch, not yet deduplicated
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub title: String,
    pub link: String,
    pub summary: String,
    pub published_at: DateTime<Utc>,
    pub categories: Vec<String>,
    pub source_name: String,
}

/// A persisted, deduplicated item
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: i64,
    pub source_id: i64,
    pub title: String,
    pub link: String,
    pub summary: String,
    pub published_at: DateTime<Utc>,
    pub posted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Data required to create a new article
#[derive(Debug, Clone)]
pub struct NewArticle {
    pub source_id: i64,
    pub title: String,
    pub link: String,
    pub summary: String,
    pub published_at: DateTime<Utc>,
}

impl NewArticle {
    pub fn from_item(source_id: i64, item: Item) -> Self {
        Self {
            source_id,
            title: item.title,
            link: item.link,
            summary: item.summary,
            published_at: item.published_at,
        }
    }
}

impl Article {
    /// Check if the article has been published to the channel
    pub fn is_posted(&self) -> bool {
        self.posted_at.is_some()
    }

    /// Check if the feed embedded a usable summary
    pub fn has_embedded_summary(&self) -> bool {
        !self.summary.trim().is_empty()
    }
}
