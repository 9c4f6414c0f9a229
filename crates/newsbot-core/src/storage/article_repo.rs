use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;

use super::{ArticleStore, Database};
use crate::feed::{Article, NewArticle};
use crate::Result;

/// Repository for article persistence
#[derive(Clone)]
pub struct ArticleRepository {
    db: Database,
}

#[derive(FromRow)]
struct ArticleRow {
    id: i64,
    source_id: i64,
    title: String,
    link: String,
    summary: String,
    published_at: DateTime<Utc>,
    posted_at: Option<DateTime<Utc>>,
    created_at: DateTime<Utc>,
}

impl From<ArticleRow> for Article {
    fn from(row: ArticleRow) -> Self {
        Article {
            id: row.id,
            source_id: row.source_id,
            title: row.title,
            link: row.link,
            summary: row.summary,
            published_at: row.published_at,
            posted_at: row.posted_at,
            created_at: row.created_at,
        }
    }
}

impl ArticleRepository {
    pub fn new(db: &Database) -> Self {
        Self { db: db.clone() }
    }

    /// Find an article by ID
    pub async fn find_by_id(&self, id: i64) -> Result<Option<Article>> {
        let row: Option<ArticleRow> = sqlx::query_as(
            r#"
            SELECT id, source_id, title, link, summary, published_at, posted_at, created_at
            FROM articles
            WHERE id = ?
            "#,
        )
        .bind(id)
        .fetch_optional(self.db.pool())
        .await?;

        Ok(row.map(Article::from))
    }

    /// Get total article count
    pub async fn count(&self) -> Result<u32> {
        let count: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM articles")
            .fetch_one(self.db.pool())
            .await?;

        Ok(count.0 as u32)
    }
}

#[async_trait]
impl ArticleStore for ArticleRepository {
    async fn add_article(&self, article: &NewArticle) -> Result<Option<i64>> {
        let now = Utc::now();

        // The link is the dedup key; a conflicting insert is a silent no-op
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO articles
            (source_id, title, link, summary, published_at, created_at)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(article.source_id)
        .bind(&article.title)
        .bind(&article.link)
        .bind(&article.summary)
        .bind(article.published_at)
        .bind(now)
        .execute(self.db.pool())
        .await?;

        if result.rows_affected() > 0 {
            Ok(Some(result.last_insert_rowid()))
        } else {
            Ok(None)
        }
    }

    async fn all_not_posted(&self, since: DateTime<Utc>, limit: u32) -> Result<Vec<Article>> {
        let rows: Vec<ArticleRow> = sqlx::query_as(
            r#"
            SELECT id, source_id, title, link, summary, published_at, posted_at, created_at
            FROM articles
            WHERE posted_at IS NULL AND published_at >= ?
            ORDER BY published_at DESC, id ASC
            LIMIT ?
            "#,
        )
        .bind(since)
        .bind(limit)
        .fetch_all(self.db.pool())
        .await?;

        Ok(rows.into_iter().map(Article::from).collect())
    }

    async fn mark_posted(&self, id: i64) -> Result<()> {
        let now = Utc::now();

        // posted_at is terminal; never overwrite an existing timestamp
        sqlx::query(
            r#"
            UPDATE articles
            SET posted_at = ?
            WHERE id = ? AND posted_at IS NULL
            "#,
        )
        .bind(now)
        .bind(id)
        .execute(self.db.pool())
        .await?;

        Ok(())
    }
}
