//! Local page view history
//!
//! The reading slide counts distinct pages read inside the population
//! window. History never leaves the device: this is a plain SQLite table.

use crate::error::YirResult;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use wmf_common::Project;

/// Source of the distinct-pages-read metric
#[async_trait]
pub trait PageViewCounter: Send + Sync {
    /// Number of distinct pages viewed in `[start, end)`
    async fn count_distinct_pages(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> YirResult<u64>;
}

#[derive(Clone)]
pub struct PageViewStore {
    db: SqlitePool,
}

impl PageViewStore {
    pub fn new(db: SqlitePool) -> Self {
        Self { db }
    }

    pub async fn record_page_view(
        &self,
        project: &Project,
        title: &str,
        viewed_at: DateTime<Utc>,
    ) -> YirResult<()> {
        sqlx::query("INSERT INTO page_views (project, title, viewed_at) VALUES (?, ?, ?)")
            .bind(project.id())
            .bind(title)
            .bind(viewed_at.timestamp())
            .execute(&self.db)
            .await?;

        tracing::debug!(project = %project, title, "Recorded page view");
        Ok(())
    }
}

#[async_trait]
impl PageViewCounter for PageViewStore {
    async fn count_distinct_pages(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> YirResult<u64> {
        // A page is one (project, title) pair
        let count: i64 = sqlx::query_scalar(
            r#"
            SELECT COUNT(*) FROM (
                SELECT DISTINCT project, title FROM page_views
                WHERE viewed_at >= ? AND viewed_at < ?
            )
            "#,
        )
        .bind(start.timestamp())
        .bind(end.timestamp())
        .fetch_one(&self.db)
        .await?;

        Ok(count.max(0) as u64)
    }
}
