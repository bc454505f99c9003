use anyhow::Result;

use super::schema::Database;
use super::types::Feed;

impl Database {
    // ========================================================================
    // Feed Operations
    // ========================================================================

    /// Insert a feed, or update its name/type if the URL is already known.
    ///
    /// Subscription management proper lives outside the ingestion pipeline;
    /// this exists for first-run setup and tests. Returns the feed id.
    pub async fn insert_feed(&self, name: &str, url: &str, feed_type: &str) -> Result<i64> {
        let row: (i64,) = sqlx::query_as(
            r#"
            INSERT INTO feeds (name, url, feed_type)
            VALUES (?, ?, ?)
            ON CONFLICT(url) DO UPDATE SET
                name = excluded.name,
                feed_type = excluded.feed_type
            RETURNING id
        "#,
        )
        .bind(name)
        .bind(url)
        .bind(feed_type)
        .fetch_one(&self.pool)
        .await?;

        Ok(row.0)
    }

    /// All subscribed feeds, in id order. The ingestion run processes
    /// exactly this list; feed URLs and types never come from the CLI.
    pub async fn list_feeds(&self) -> Result<Vec<Feed>> {
        let feeds = sqlx::query_as::<_, Feed>(
            r#"
            SELECT id, name, url, feed_type, last_updated_at, date_format
            FROM feeds
            ORDER BY id
        "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(feeds)
    }

    /// Fetch a single feed by id.
    pub async fn get_feed(&self, feed_id: i64) -> Result<Option<Feed>> {
        let feed = sqlx::query_as::<_, Feed>(
            r#"
            SELECT id, name, url, feed_type, last_updated_at, date_format
            FROM feeds
            WHERE id = ?
        "#,
        )
        .bind(feed_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(feed)
    }

    /// Store the feed's last-updated value. This is the canonical RFC 3339
    /// encoding when the wire string resolved, or the raw string unchanged
    /// when it did not (best effort, never blocks the run).
    pub async fn update_feed_last_updated(&self, feed_id: i64, last_updated: &str) -> Result<()> {
        sqlx::query("UPDATE feeds SET last_updated_at = ? WHERE id = ?")
            .bind(last_updated)
            .bind(feed_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Store the date-format hint for a feed. Written at most once per feed
    /// per run, after the whole item batch is processed.
    pub async fn update_feed_date_format(&self, feed_id: i64, format: &str) -> Result<()> {
        sqlx::query("UPDATE feeds SET date_format = ? WHERE id = ?")
            .bind(format)
            .bind(feed_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
