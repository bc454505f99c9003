//! Feed ingestion pipeline: fetch RSS/Atom documents, normalize items,
//! resolve heterogeneous date formats into one canonical encoding, and
//! persist deduplicated posts.
//!
//! The pipeline runs once per invocation. Feeds are read from the store,
//! fetched concurrently, and each feed's writes stay ordered relative to
//! each other (item inserts before the feed's hint/last-updated updates).

pub mod config;
pub mod feed;
pub mod ingest;
pub mod storage;
