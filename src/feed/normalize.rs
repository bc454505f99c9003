//! Pure mapping from decoded wire shapes to the canonical item list.
//!
//! No network, no storage. Titles and URLs pass through unchanged —
//! including empty titles; there is no trimming or HTML stripping here.

use super::decode::{AtomLink, RawFeed};

/// One publishable unit, format-agnostic. Transient: produced per fetch,
/// discarded after the persistence attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizedItem {
    pub title: String,
    /// Dedup key within a feed.
    pub url: String,
    /// Raw wire date string; format unknown until resolved.
    pub published: String,
}

/// Map a decoded feed to its items plus the raw feed-level last-updated
/// string (`None` when the document carried none).
pub fn normalize(feed: RawFeed) -> (Vec<NormalizedItem>, Option<String>) {
    match feed {
        RawFeed::Rss(doc) => {
            let items = doc
                .channel
                .items
                .into_iter()
                .map(|item| NormalizedItem {
                    title: item.title,
                    url: item.link,
                    published: item.pub_date,
                })
                .collect();
            (items, non_empty(doc.channel.last_build_date))
        }
        RawFeed::Atom(doc) => {
            let items = doc
                .entries
                .into_iter()
                .map(|entry| NormalizedItem {
                    title: entry.title,
                    url: entry_url(entry.links),
                    published: entry.published,
                })
                .collect();
            (items, non_empty(doc.updated))
        }
    }
}

/// Pick the entry's page URL out of its `<link>` elements. Feeds often
/// list `rel="self"` or `rel="hub"` links ahead of the alternate link, so
/// "first href" would dedup on the wrong URL; prefer the first link with
/// no rel or `rel="alternate"`, falling back to the first href at all.
fn entry_url(links: Vec<AtomLink>) -> String {
    let mut first = None;
    for link in links {
        if link.rel.is_empty() || link.rel == "alternate" {
            return link.href;
        }
        first.get_or_insert(link.href);
    }
    first.unwrap_or_default()
}

fn non_empty(s: String) -> Option<String> {
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}
