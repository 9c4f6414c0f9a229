use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

use super::{Database, SourceStore};
use crate::feed::{NewSource, Source};
use crate::{Error, Result};

/// Repository for source CRUD operations
#[derive(Clone)]
pub struct SourceRepository {
    db: Database,
}

#[derive(FromRow)]
struct SourceRow {
    id: i64,
    name: String,
    feed_url: String,
    priority: i32,
    created_at: DateTime<Utc>,
}

impl From<SourceRow> for Source {
    fn from(row: SourceRow) -> Self {
        Source {
            id: row.id,
            name: row.name,
            feed_url: row.feed_url,
            priority: row.priority,
            created_at: row.created_at,
        }
    }
}

impl SourceRepository {
    pub fn new(db: &Database) -> Self {
        Self { db: db.clone() }
    }

    /// Find a source by feed URL
    pub async fn find_by_url(&self, url: &str) -> Result<Option<Source>> {
        let row: Option<SourceRow> = sqlx::query_as(
            r#"
            SELECT id, name, feed_url, priority, created_at
            FROM sources
            WHERE feed_url = ?
            "#,
        )
        .bind(url)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(Source::from))
    }
}

#[async_trait]
impl SourceStore for SourceRepository {
    async fn get_sources(&self) -> Result<Vec<Source>> {
        let rows: Vec<SourceRow> = sqlx::query_as(
            r#"
            SELECT id, name, feed_url, priority, created_at
            FROM sources
            ORDER BY id ASC
            "#,
        )
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.into_iter().map(Source::from).collect())
    }

    async fn get_source_by_id(&self, id: i64) -> Result<Option<Source>> {
        let row: Option<SourceRow> = sqlx::query_as(
            r#"
            SELECT id, name, feed_url, priority, created_at
            FROM sources
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(Source::from))
    }

    async fn add_source(&self, source: &NewSource) -> Result<i64> {
        let result = sqlx::query(
            r#"
            INSERT INTO sources (name, feed_url, priority, created_at)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(&source.name)
        .bind(&source.feed_url)
        .bind(source.priority)
        .bind(Utc::now())
        .execute(self.db.pool())
        .await?;

        Ok(result.last_insert_rowid())
    }

    async fn set_priority(&self, id: i64, priority: i32) -> Result<()> {
        let result = sqlx::query("UPDATE sources SET priority = ? WHERE id = ?")
            .bind(priority)
            .bind(id)
            .execute(self.db.pool())
            .await?;

        if result.rows_affected() == 0 {
            return Err(Error::SourceNotFound(id));
        }

        Ok(())
    }

    async fn delete_source(&self, id: i64) -> Result<()> {
        // Deleting a missing source is not an error
        sqlx::query("DELETE FROM sources WHERE id = ?")
            .bind(id)
            .execute(self.db.pool())
            .await?;

        Ok(())
    }
}
