//! The ingestion coordinator: one run fetches every subscribed feed,
//! resolves item dates, persists deduplicated posts, and updates each
//! feed's learned format hint and last-updated timestamp.
//!
//! Failure semantics: per-feed fetch/decode failures and per-item date or
//! persistence failures are logged and recovered locally; the run continues.
//! The one deliberate hard stop is a feed declared `custom` — missing
//! functionality is signaled loudly instead of masked as silent data loss.

use futures::stream::{self, StreamExt};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::feed::{
    decode_atom, decode_rss, fetch_bytes, normalize, resolve, to_canonical, DecodeError,
    FetchError,
};
use crate::storage::{Database, Feed, NewPost};

/// Tunables for one ingestion run.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// Per-request fetch timeout.
    pub fetch_timeout: Duration,
    /// Upper bound on concurrent feed fetches. Each feed's own steps stay
    /// strictly ordered regardless of this value.
    pub max_concurrent_fetches: usize,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            fetch_timeout: Duration::from_secs(30),
            max_concurrent_fetches: 8,
        }
    }
}

/// A failure that is fatal to the whole run.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Feeds declared `custom` are recognized but unimplemented. Detected
    /// before any fetch so the halt happens with zero side effects.
    #[error("feed type 'custom' is not implemented yet (feed {name:?}, id {feed_id})")]
    UnimplementedFeedType { feed_id: i64, name: String },

    /// The feed list could not be loaded from the store.
    #[error(transparent)]
    Database(#[from] anyhow::Error),
}

/// A per-feed failure, recovered by skipping the feed.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error(transparent)]
    Fetch(#[from] FetchError),
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

/// Per-feed counters for one run.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct IngestStats {
    /// Posts written this run.
    pub inserted: usize,
    /// Items whose (URL, feed) pair already existed; idempotent no-ops.
    pub duplicates: usize,
    /// Items dropped because no date format matched.
    pub skipped_items: usize,
}

/// Outcome for one feed. Results arrive in completion order, not feed order.
#[derive(Debug)]
pub struct FeedOutcome {
    pub feed_id: i64,
    pub name: String,
    pub result: Result<IngestStats, FeedError>,
}

/// Declared feed types the coordinator dispatches on. The dispatch happens
/// exactly once per feed; everything downstream is format-agnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FeedKind {
    Rss,
    Atom,
    Custom,
    Unrecognized,
}

impl FeedKind {
    fn from_declared(feed_type: &str) -> Self {
        match feed_type {
            "rss" => FeedKind::Rss,
            "atom" => FeedKind::Atom,
            "custom" => FeedKind::Custom,
            _ => FeedKind::Unrecognized,
        }
    }
}

/// Run the pipeline over every subscribed feed.
///
/// Feeds are fetched concurrently up to `options.max_concurrent_fetches`;
/// within a feed, item inserts always precede the hint and last-updated
/// writes, so a hint is never stored for a feed whose items were not
/// attempted first. Post uniqueness is enforced by the store itself, which
/// keeps concurrent ingestion of overlapping feeds safe.
pub async fn run(
    db: &Database,
    client: &reqwest::Client,
    options: &IngestOptions,
) -> Result<Vec<FeedOutcome>, IngestError> {
    let feeds = db.list_feeds().await?;

    // Declared-but-unimplemented types halt the run before any side effect.
    // Unrecognized types are merely skipped below.
    if let Some(feed) = feeds
        .iter()
        .find(|f| FeedKind::from_declared(&f.feed_type) == FeedKind::Custom)
    {
        return Err(IngestError::UnimplementedFeedType {
            feed_id: feed.id,
            name: feed.name.clone(),
        });
    }

    let active: Vec<Feed> = feeds
        .into_iter()
        .filter(|feed| {
            match FeedKind::from_declared(&feed.feed_type) {
                FeedKind::Rss | FeedKind::Atom => true,
                _ => {
                    debug!(
                        feed_id = feed.id,
                        feed_type = %feed.feed_type,
                        "Skipping feed with unrecognized type"
                    );
                    false
                }
            }
        })
        .collect();

    let outcomes: Vec<FeedOutcome> = stream::iter(active.into_iter())
        .map(|feed| async move {
            let feed_id = feed.id;
            let name = feed.name.clone();
            let result = ingest_feed(db, client, &feed, options).await;

            if let Err(e) = &result {
                warn!(feed_id = feed_id, feed = %name, error = %e, "Feed skipped");
            }

            FeedOutcome {
                feed_id,
                name,
                result,
            }
        })
        .buffer_unordered(options.max_concurrent_fetches.max(1))
        .collect()
        .await;

    Ok(outcomes)
}

/// Fetch, decode, normalize, and persist one feed. Item-level failures are
/// counted and skipped; only fetch/decode failures abandon the feed.
async fn ingest_feed(
    db: &Database,
    client: &reqwest::Client,
    feed: &Feed,
    options: &IngestOptions,
) -> Result<IngestStats, FeedError> {
    let bytes = fetch_bytes(client, &feed.url, options.fetch_timeout).await?;

    let raw = match FeedKind::from_declared(&feed.feed_type) {
        FeedKind::Rss => decode_rss(&bytes)?,
        FeedKind::Atom => decode_atom(&bytes)?,
        // run() filtered everything else out already
        FeedKind::Custom | FeedKind::Unrecognized => unreachable!("filtered by run()"),
    };

    let (items, last_updated_raw) = normalize(raw);
    let hint = feed.date_format.as_deref();

    let mut stats = IngestStats::default();
    // First successfully resolved item fixes the detected format for the run.
    let mut detected_format: Option<&'static str> = None;

    for item in &items {
        let (ts, used_format) = match resolve(&item.published, hint) {
            Ok(resolved) => resolved,
            Err(e) => {
                warn!(
                    feed_id = feed.id,
                    title = %item.title,
                    error = %e,
                    "Skipping item with unparseable date"
                );
                stats.skipped_items += 1;
                continue;
            }
        };

        if detected_format.is_none() {
            detected_format = Some(used_format);
        }

        let post = NewPost {
            title: item.title.clone(),
            url: item.url.clone(),
            published_at: to_canonical(&ts),
            feed_id: feed.id,
        };
        match db.create_post(&post).await {
            Ok(true) => stats.inserted += 1,
            Ok(false) => stats.duplicates += 1,
            Err(e) => {
                warn!(feed_id = feed.id, url = %item.url, error = %e, "Failed writing post");
            }
        }
    }

    // Hint update is O(1) per feed per run: applied once after the batch,
    // and only when the detected format actually differs.
    if let Some(format) = detected_format {
        if hint != Some(format) {
            if let Err(e) = db.update_feed_date_format(feed.id, format).await {
                warn!(feed_id = feed.id, error = %e, "Failed updating feed date format");
            }
        }
    }

    // Feed-level last-updated is best effort: canonical when it resolves
    // (preferring the format detected this run), the raw string otherwise.
    if let Some(raw_updated) = last_updated_raw {
        let effective_hint = detected_format.or(hint);
        let value = match resolve(&raw_updated, effective_hint) {
            Ok((ts, _)) => to_canonical(&ts),
            Err(_) => raw_updated,
        };
        if let Err(e) = db.update_feed_last_updated(feed.id, &value).await {
            warn!(feed_id = feed.id, error = %e, "Failed updating feed last-updated");
        }
    }

    Ok(stats)
}
