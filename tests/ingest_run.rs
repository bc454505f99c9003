//! End-to-end ingestion tests: each test gets its own in-memory SQLite
//! database and a wiremock server standing in for the feed origin. These
//! exercise the full pipeline — fetch, decode, normalize, date resolution,
//! format learning, and idempotent persistence.

use pretty_assertions::assert_eq;
use siphon::ingest::{self, IngestError, IngestOptions};
use siphon::storage::Database;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const RFC1123_NUMERIC: &str = "%a, %d %b %Y %H:%M:%S %z";

async fn test_db() -> Database {
    Database::open(":memory:").await.unwrap()
}

fn test_client() -> reqwest::Client {
    reqwest::Client::new()
}

async fn mount_xml(server: &MockServer, route: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("Content-Type", "application/xml"),
        )
        .mount(server)
        .await;
}

fn rss_feed(items: &[(&str, &str, &str)], last_build_date: &str) -> String {
    let mut body = String::from("<?xml version=\"1.0\"?>\n<rss version=\"2.0\"><channel>\n");
    if !last_build_date.is_empty() {
        body.push_str(&format!(
            "<lastBuildDate>{}</lastBuildDate>\n",
            last_build_date
        ));
    }
    for (title, url, pub_date) in items {
        body.push_str(&format!(
            "<item><title>{}</title><link>{}</link><pubDate>{}</pubDate></item>\n",
            title, url, pub_date
        ));
    }
    body.push_str("</channel></rss>");
    body
}

async fn run(db: &Database) -> Vec<ingest::FeedOutcome> {
    ingest::run(db, &test_client(), &IngestOptions::default())
        .await
        .unwrap()
}

// ============================================================================
// Idempotence
// ============================================================================

#[tokio::test]
async fn test_reingesting_same_payload_is_a_noop() {
    let server = MockServer::start().await;
    let body = rss_feed(
        &[
            ("One", "https://e/1", "Mon, 02 Jan 2006 15:04:05 -0700"),
            ("Two", "https://e/2", "Tue, 03 Jan 2006 08:00:00 -0700"),
        ],
        "",
    );
    mount_xml(&server, "/feed", &body).await;

    let db = test_db().await;
    let feed_id = db
        .insert_feed("Example", &format!("{}/feed", server.uri()), "rss")
        .await
        .unwrap();

    let first = run(&db).await;
    let stats = first[0].result.as_ref().unwrap();
    assert_eq!(stats.inserted, 2);
    assert_eq!(stats.duplicates, 0);

    let second = run(&db).await;
    let stats = second[0].result.as_ref().unwrap();
    assert_eq!(stats.inserted, 0);
    assert_eq!(stats.duplicates, 2);

    let posts = db.get_posts_for_feed(feed_id).await.unwrap();
    assert_eq!(posts.len(), 2);
}

// ============================================================================
// Format learning
// ============================================================================

#[tokio::test]
async fn test_rfc1123_item_persists_canonically_and_hint_is_learned() {
    // Concrete scenario: single RSS item with a numeric-zone RFC 1123 date
    // and no stored hint.
    let server = MockServer::start().await;
    let body = rss_feed(
        &[("Post", "https://e/1", "Mon, 02 Jan 2006 15:04:05 -0700")],
        "",
    );
    mount_xml(&server, "/feed", &body).await;

    let db = test_db().await;
    let feed_id = db
        .insert_feed("Example", &format!("{}/feed", server.uri()), "rss")
        .await
        .unwrap();

    run(&db).await;

    let posts = db.get_posts_for_feed(feed_id).await.unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].published_at, "2006-01-02T15:04:05-07:00");

    let feed = db.get_feed(feed_id).await.unwrap().unwrap();
    assert_eq!(feed.date_format.as_deref(), Some(RFC1123_NUMERIC));
}

#[tokio::test]
async fn test_learned_hint_is_not_rewritten_when_format_is_stable() {
    let server = MockServer::start().await;
    let body = rss_feed(
        &[("Post", "https://e/1", "Mon, 02 Jan 2006 15:04:05 -0700")],
        "",
    );
    mount_xml(&server, "/feed", &body).await;

    let db = test_db().await;
    let feed_id = db
        .insert_feed("Example", &format!("{}/feed", server.uri()), "rss")
        .await
        .unwrap();

    run(&db).await;
    let hint_after_first = db.get_feed(feed_id).await.unwrap().unwrap().date_format;
    run(&db).await;
    let hint_after_second = db.get_feed(feed_id).await.unwrap().unwrap().date_format;

    assert_eq!(hint_after_first.as_deref(), Some(RFC1123_NUMERIC));
    assert_eq!(hint_after_first, hint_after_second);
}

#[tokio::test]
async fn test_hint_drift_resolves_all_items_and_updates_hint_once() {
    // Stored hint says RFC 3339 but the feed drifted to RFC 1123: every
    // item still resolves via the fallback scan and the hint converges.
    let server = MockServer::start().await;
    let body = rss_feed(
        &[
            ("One", "https://e/1", "Mon, 02 Jan 2006 15:04:05 -0700"),
            ("Two", "https://e/2", "Tue, 03 Jan 2006 08:00:00 -0700"),
            ("Three", "https://e/3", "Wed, 04 Jan 2006 09:30:00 -0700"),
        ],
        "",
    );
    mount_xml(&server, "/feed", &body).await;

    let db = test_db().await;
    let feed_id = db
        .insert_feed("Example", &format!("{}/feed", server.uri()), "rss")
        .await
        .unwrap();
    db.update_feed_date_format(feed_id, "%+").await.unwrap();

    let outcomes = run(&db).await;
    let stats = outcomes[0].result.as_ref().unwrap();
    assert_eq!(stats.inserted, 3);
    assert_eq!(stats.skipped_items, 0);

    let feed = db.get_feed(feed_id).await.unwrap().unwrap();
    assert_eq!(feed.date_format.as_deref(), Some(RFC1123_NUMERIC));
}

// ============================================================================
// Per-item isolation
// ============================================================================

#[tokio::test]
async fn test_one_unparseable_date_skips_only_that_item() {
    let server = MockServer::start().await;
    let body = rss_feed(
        &[
            ("Good", "https://e/1", "Mon, 02 Jan 2006 15:04:05 -0700"),
            ("Bad", "https://e/2", "sometime last tuesday"),
            ("AlsoGood", "https://e/3", "2006-01-04"),
        ],
        "",
    );
    mount_xml(&server, "/feed", &body).await;

    let db = test_db().await;
    let feed_id = db
        .insert_feed("Example", &format!("{}/feed", server.uri()), "rss")
        .await
        .unwrap();

    let outcomes = run(&db).await;
    let stats = outcomes[0].result.as_ref().unwrap();
    assert_eq!(stats.inserted, 2);
    assert_eq!(stats.skipped_items, 1);

    let posts = db.get_posts_for_feed(feed_id).await.unwrap();
    assert_eq!(posts.len(), 2);
    assert!(posts.iter().all(|p| p.title != "Bad"));
}

// ============================================================================
// Type dispatch
// ============================================================================

#[tokio::test]
async fn test_unrecognized_type_is_skipped_silently() {
    let db = test_db().await;
    let feed_id = db
        .insert_feed("Weird", "http://127.0.0.1:9/never-fetched", "weird")
        .await
        .unwrap();

    let outcomes = run(&db).await;
    assert!(outcomes.is_empty());
    assert!(db.get_posts_for_feed(feed_id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_declared_custom_halts_the_run_before_any_fetch() {
    let server = MockServer::start().await;
    // The rss feed must never be fetched: custom is detected up front.
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string(rss_feed(
            &[("Post", "https://e/1", "2006-01-02")],
            "",
        )))
        .expect(0)
        .mount(&server)
        .await;

    let db = test_db().await;
    db.insert_feed("Fine", &format!("{}/feed", server.uri()), "rss")
        .await
        .unwrap();
    let custom_id = db
        .insert_feed("Custom", "https://example.com/custom", "custom")
        .await
        .unwrap();

    let err = ingest::run(&db, &test_client(), &IngestOptions::default())
        .await
        .unwrap_err();
    match err {
        IngestError::UnimplementedFeedType { feed_id, .. } => assert_eq!(feed_id, custom_id),
        e => panic!("Expected UnimplementedFeedType, got {:?}", e),
    }

    assert!(db.list_inbox().await.unwrap().is_empty());
}

// ============================================================================
// Atom path
// ============================================================================

#[tokio::test]
async fn test_atom_entry_with_empty_title_and_href_url() {
    let server = MockServer::start().await;
    let body = r#"<?xml version="1.0" encoding="utf-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <updated>2006-01-02T15:04:05Z</updated>
  <entry>
    <title></title>
    <link href="https://x/1"/>
    <published>2006-01-02T15:04:05Z</published>
  </entry>
</feed>"#;
    mount_xml(&server, "/atom", body).await;

    let db = test_db().await;
    let feed_id = db
        .insert_feed("AtomFeed", &format!("{}/atom", server.uri()), "atom")
        .await
        .unwrap();

    run(&db).await;

    let posts = db.get_posts_for_feed(feed_id).await.unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0].title, "");
    assert_eq!(posts[0].url, "https://x/1");
    assert_eq!(posts[0].published_at, "2006-01-02T15:04:05Z");

    let feed = db.get_feed(feed_id).await.unwrap().unwrap();
    assert_eq!(feed.date_format.as_deref(), Some("%+"));
}

// ============================================================================
// Feed-level last-updated
// ============================================================================

#[tokio::test]
async fn test_resolvable_last_updated_is_stored_canonically() {
    let server = MockServer::start().await;
    let body = rss_feed(
        &[("Post", "https://e/1", "Mon, 02 Jan 2006 15:04:05 -0700")],
        "Tue, 03 Jan 2006 08:00:00 -0700",
    );
    mount_xml(&server, "/feed", &body).await;

    let db = test_db().await;
    let feed_id = db
        .insert_feed("Example", &format!("{}/feed", server.uri()), "rss")
        .await
        .unwrap();

    run(&db).await;

    let feed = db.get_feed(feed_id).await.unwrap().unwrap();
    assert_eq!(
        feed.last_updated_at.as_deref(),
        Some("2006-01-03T08:00:00-07:00")
    );
}

#[tokio::test]
async fn test_unresolvable_last_updated_keeps_raw_string() {
    let server = MockServer::start().await;
    let body = rss_feed(
        &[("Post", "https://e/1", "Mon, 02 Jan 2006 15:04:05 -0700")],
        "around teatime",
    );
    mount_xml(&server, "/feed", &body).await;

    let db = test_db().await;
    let feed_id = db
        .insert_feed("Example", &format!("{}/feed", server.uri()), "rss")
        .await
        .unwrap();

    run(&db).await;

    let feed = db.get_feed(feed_id).await.unwrap().unwrap();
    assert_eq!(feed.last_updated_at.as_deref(), Some("around teatime"));
}

#[tokio::test]
async fn test_absent_last_updated_leaves_column_untouched() {
    let server = MockServer::start().await;
    let body = rss_feed(
        &[("Post", "https://e/1", "Mon, 02 Jan 2006 15:04:05 -0700")],
        "",
    );
    mount_xml(&server, "/feed", &body).await;

    let db = test_db().await;
    let feed_id = db
        .insert_feed("Example", &format!("{}/feed", server.uri()), "rss")
        .await
        .unwrap();

    run(&db).await;

    let feed = db.get_feed(feed_id).await.unwrap().unwrap();
    assert_eq!(feed.last_updated_at, None);
}

// ============================================================================
// Per-feed isolation
// ============================================================================

#[tokio::test]
async fn test_failing_feed_does_not_block_others() {
    let server = MockServer::start().await;
    mount_xml(
        &server,
        "/good",
        &rss_feed(&[("Post", "https://e/1", "2006-01-02")], ""),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/bad"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let db = test_db().await;
    db.insert_feed("Bad", &format!("{}/bad", server.uri()), "rss")
        .await
        .unwrap();
    let good_id = db
        .insert_feed("Good", &format!("{}/good", server.uri()), "rss")
        .await
        .unwrap();

    let outcomes = run(&db).await;
    assert_eq!(outcomes.len(), 2);

    let failed = outcomes.iter().filter(|o| o.result.is_err()).count();
    assert_eq!(failed, 1);
    assert_eq!(db.get_posts_for_feed(good_id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_malformed_markup_skips_feed() {
    let server = MockServer::start().await;
    mount_xml(&server, "/feed", "<rss><channel><item>").await;

    let db = test_db().await;
    let feed_id = db
        .insert_feed("Broken", &format!("{}/feed", server.uri()), "rss")
        .await
        .unwrap();

    let outcomes = run(&db).await;
    assert!(outcomes[0].result.is_err());
    assert!(db.get_posts_for_feed(feed_id).await.unwrap().is_empty());

    // No hint is learned from a feed that never decoded
    let feed = db.get_feed(feed_id).await.unwrap().unwrap();
    assert_eq!(feed.date_format, None);
}

// ============================================================================
// Browsing boundary
// ============================================================================

#[tokio::test]
async fn test_ingested_posts_land_in_inbox_with_feed_name() {
    let server = MockServer::start().await;
    let body = rss_feed(
        &[("Post", "https://e/1", "Mon, 02 Jan 2006 15:04:05 -0700")],
        "",
    );
    mount_xml(&server, "/feed", &body).await;

    let db = test_db().await;
    db.insert_feed("My Blog", &format!("{}/feed", server.uri()), "rss")
        .await
        .unwrap();

    run(&db).await;

    let inbox = db.list_inbox().await.unwrap();
    assert_eq!(inbox.len(), 1);
    assert_eq!(inbox[0].feed_name, "My Blog");
    assert!(!inbox[0].is_archived);
    assert!(!inbox[0].is_starred);
    assert!(db.list_archive().await.unwrap().is_empty());
    assert!(db.list_starred().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_archive_and_star_filters() {
    let server = MockServer::start().await;
    let body = rss_feed(
        &[
            ("One", "https://e/1", "2006-01-02"),
            ("Two", "https://e/2", "2006-01-03"),
        ],
        "",
    );
    mount_xml(&server, "/feed", &body).await;

    let db = test_db().await;
    db.insert_feed("Blog", &format!("{}/feed", server.uri()), "rss")
        .await
        .unwrap();
    run(&db).await;

    let inbox = db.list_inbox().await.unwrap();
    db.set_post_archived(inbox[0].id, true).await.unwrap();
    db.toggle_post_starred(inbox[1].id).await.unwrap();

    assert_eq!(db.list_inbox().await.unwrap().len(), 1);
    assert_eq!(db.list_archive().await.unwrap().len(), 1);
    assert_eq!(db.list_starred().await.unwrap().len(), 1);
}
