//! Raw RSS/Atom decoders.
//!
//! One serde struct per wire shape, deserialized with quick-xml. Every field
//! defaults so a missing element degrades to an empty string rather than a
//! decode failure; only malformed markup fails. Date strings come through
//! raw — resolution happens downstream so the format-learning policy sees
//! exactly what was on the wire.

use serde::Deserialize;
use thiserror::Error;

/// The byte stream was not well-formed markup for the declared variant.
#[derive(Debug, Error)]
#[error("malformed {kind} document: {source}")]
pub struct DecodeError {
    kind: &'static str,
    #[source]
    source: quick_xml::DeError,
}

/// A decoded feed document, tagged by wire format. This is the single
/// dispatch point between the two formats; everything downstream of
/// [`normalize`](super::normalize::normalize) is format-agnostic.
#[derive(Debug)]
pub enum RawFeed {
    Rss(RssDocument),
    Atom(AtomDocument),
}

// ============================================================================
// RSS
// ============================================================================

/// `<rss><channel>...</channel></rss>`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RssDocument {
    pub channel: RssChannel,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RssChannel {
    #[serde(rename = "item")]
    pub items: Vec<RssItem>,
    #[serde(rename = "lastBuildDate")]
    pub last_build_date: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct RssItem {
    pub title: String,
    pub link: String,
    #[serde(rename = "pubDate")]
    pub pub_date: String,
}

// ============================================================================
// Atom
// ============================================================================

/// `<feed>...</feed>`
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AtomDocument {
    #[serde(rename = "entry")]
    pub entries: Vec<AtomEntry>,
    pub updated: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AtomEntry {
    pub title: String,
    /// Atom allows several `<link>` elements (`rel="self"`, `rel="hub"`,
    /// the alternate link). Selection happens in the normalizer.
    #[serde(rename = "link")]
    pub links: Vec<AtomLink>,
    pub published: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct AtomLink {
    #[serde(rename = "@href")]
    pub href: String,
    #[serde(rename = "@rel")]
    pub rel: String,
}

// ============================================================================
// Entry points
// ============================================================================

/// Decode bytes declared as RSS. Never attempted on feeds declared atom.
pub fn decode_rss(bytes: &[u8]) -> Result<RawFeed, DecodeError> {
    let document: RssDocument = quick_xml::de::from_reader(bytes).map_err(|source| DecodeError {
        kind: "rss",
        source,
    })?;
    Ok(RawFeed::Rss(document))
}

/// Decode bytes declared as Atom. Never attempted on feeds declared rss.
pub fn decode_atom(bytes: &[u8]) -> Result<RawFeed, DecodeError> {
    let document: AtomDocument =
        quick_xml::de::from_reader(bytes).map_err(|source| DecodeError {
            kind: "atom",
            source,
        })?;
    Ok(RawFeed::Atom(document))
}

// ============================================================================
// Tests
// ============================================================================
