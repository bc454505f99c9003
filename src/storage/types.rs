use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Database-specific errors with user-friendly messages
#[derive(Debug, Error)]
pub enum DatabaseError {
    /// Another instance of the application has locked the database
    #[error("Another instance of siphon appears to be running. Please close it and try again.")]
    InstanceLocked,

    /// Migration failed
    #[error("Database migration failed: {0}")]
    Migration(String),

    /// Generic database error
    #[error("Database error: {0}")]
    Other(#[from] sqlx::Error),
}

impl DatabaseError {
    /// Check if a sqlx error indicates database locking
    pub(crate) fn from_sqlx(err: sqlx::Error) -> Self {
        let error_string = err.to_string().to_lowercase();

        // SQLITE_BUSY (5): database is locked
        // SQLITE_LOCKED (6): database table is locked
        // SQLITE_CANTOPEN (14): unable to open database file
        if error_string.contains("database is locked")
            || error_string.contains("database table is locked")
            || error_string.contains("sqlite_busy")
            || error_string.contains("sqlite_locked")
            || error_string.contains("unable to open database file")
        {
            return DatabaseError::InstanceLocked;
        }

        DatabaseError::Other(err)
    }
}

// ============================================================================
// Data Structures
// ============================================================================

/// A subscribed feed, as stored.
///
/// Rows are created by subscription management and only mutated by the
/// ingestion coordinator's post-run updates (`last_updated_at`,
/// `date_format`). The pipeline never deletes feeds.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Feed {
    pub id: i64,
    pub name: String,
    pub url: String,
    /// Declared wire format: "rss", "atom", or "custom".
    pub feed_type: String,
    /// Canonical timestamp of the feed's last successful update, or the raw
    /// wire string when it never resolved. Unset until first ingestion.
    pub last_updated_at: Option<String>,
    /// Date-format specifier last known to parse this feed's dates.
    pub date_format: Option<String>,
}

/// A post ready for insertion. `published_at` carries the canonical
/// RFC 3339 encoding, never a raw wire string.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub url: String,
    pub published_at: String,
    pub feed_id: i64,
}

/// A persisted post.
///
/// `is_archived` and `is_starred` are owned by the browsing side;
/// ingestion never reads or writes them.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Post {
    pub id: i64,
    pub feed_id: i64,
    pub title: String,
    pub url: String,
    pub published_at: String,
    pub is_archived: bool,
    pub is_starred: bool,
}

/// A post joined with its owning feed's display name, for list views.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct PostWithFeed {
    pub id: i64,
    pub feed_id: i64,
    pub feed_name: String,
    pub title: String,
    pub url: String,
    pub published_at: String,
    pub is_archived: bool,
    pub is_starred: bool,
}
