use chrono::{DateTime, Utc};
use feed_rs::parser;

use super::models::Item;
use crate::{Error, Result};

/// Parse RSS/Atom content into normalized items
///
/// Entries without a link cannot be deduplicated and are dropped. Entries
/// without a date are stamped with `fetched_at`.
pub fn parse_items(content: &[u8], source_name: &str, fetched_at: DateTime<Utc>) -> Result<Vec<Item>> {
    let feed = parser::parse(content)
        .map_err(|e| Error::FeedFetch(e.to_string()))?;

    let items = feed.entries.into_iter().filter_map(|entry| {
        let link = entry.links.first().map(|l| l.href.clone())?;

        let title = entry.title
            .map(|t| t.content)
            .unwrap_or_default();

        let summary = entry.summary
            .map(|s| s.content)
            .or_else(|| entry.content.and_then(|c| c.body))
            .unwrap_or_default();

        let published_at = entry.published
            .or(entry.updated)
            .unwrap_or(fetched_at);

        let categories = entry.categories
            .into_iter()
            .map(|c| c.term)
            .collect();

        Some(Item {
            title,
            link,
            summary,
            published_at,
            categories,
            source_name: source_name.to_string(),
        })
    }).collect();

    Ok(items)
}
