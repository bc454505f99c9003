use anyhow::Result;

use super::schema::Database;
use super::types::{NewPost, Post, PostWithFeed};

impl Database {
    // ========================================================================
    // Post Operations
    // ========================================================================

    /// Insert a post, returning `true` if a row was written.
    ///
    /// A conflict on UNIQUE(feed_id, url) is idempotent re-ingestion, not an
    /// error: DO NOTHING makes the insert a silent no-op and this returns
    /// `false`. The constraint lives in the store so concurrent ingestion of
    /// overlapping feeds stays safe without application locking.
    pub async fn create_post(&self, post: &NewPost) -> Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO posts (feed_id, title, url, published_at)
            VALUES (?, ?, ?, ?)
            ON CONFLICT(feed_id, url) DO NOTHING
        "#,
        )
        .bind(post.feed_id)
        .bind(&post.title)
        .bind(&post.url)
        .bind(&post.published_at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    /// All posts for a feed, newest first.
    pub async fn get_posts_for_feed(&self, feed_id: i64) -> Result<Vec<Post>> {
        let posts = sqlx::query_as::<_, Post>(
            r#"
            SELECT id, feed_id, title, url, published_at, is_archived, is_starred
            FROM posts
            WHERE feed_id = ?
            ORDER BY published_at DESC, id DESC
        "#,
        )
        .bind(feed_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(posts)
    }

    // ========================================================================
    // Browsing Queries
    // ========================================================================
    //
    // Consumed by the list browser, never by ingestion. Ingestion inserts
    // posts with both flags unset and does not read them.

    /// Non-archived posts with their feed's display name.
    pub async fn list_inbox(&self) -> Result<Vec<PostWithFeed>> {
        self.list_posts_filtered("WHERE p.is_archived = 0").await
    }

    /// Archived posts with their feed's display name.
    pub async fn list_archive(&self) -> Result<Vec<PostWithFeed>> {
        self.list_posts_filtered("WHERE p.is_archived = 1").await
    }

    /// Starred posts with their feed's display name.
    pub async fn list_starred(&self) -> Result<Vec<PostWithFeed>> {
        self.list_posts_filtered("WHERE p.is_starred = 1").await
    }

    async fn list_posts_filtered(&self, filter: &str) -> Result<Vec<PostWithFeed>> {
        // filter is one of the fixed clauses above, never user input
        let query = format!(
            r#"
            SELECT p.id, p.feed_id, f.name AS feed_name, p.title, p.url,
                   p.published_at, p.is_archived, p.is_starred
            FROM posts p
            JOIN feeds f ON f.id = p.feed_id
            {}
            ORDER BY p.published_at DESC, p.id DESC
        "#,
            filter
        );

        let posts = sqlx::query_as::<_, PostWithFeed>(&query)
            .fetch_all(&self.pool)
            .await?;

        Ok(posts)
    }

    /// Archive or un-archive a post (browsing-side mutation).
    pub async fn set_post_archived(&self, post_id: i64, archived: bool) -> Result<()> {
        sqlx::query("UPDATE posts SET is_archived = ? WHERE id = ?")
            .bind(archived)
            .bind(post_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    /// Toggle the starred flag on a post (browsing-side mutation).
    pub async fn toggle_post_starred(&self, post_id: i64) -> Result<()> {
        sqlx::query("UPDATE posts SET is_starred = NOT is_starred WHERE id = ?")
            .bind(post_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
