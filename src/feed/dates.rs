//! Date resolution for feed timestamps.
//!
//! Real-world feeds disagree about date encoding even within RSS/Atom's
//! nominal standards, so resolution works against an ordered candidate list:
//! stricter formats first, so a loose format never steals a string meant for
//! a stricter one. A per-feed hint (the specifier that last worked) is tried
//! before the scan; a stale hint falls through to the scan instead of
//! failing, which tolerates feeds that silently change format.

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, SecondsFormat};
use thiserror::Error;

/// No candidate format matched the raw string.
#[derive(Debug, Error)]
#[error("unable to parse date: {0:?}")]
pub struct DateParseError(pub String);

/// One recognized date encoding. The wire value stored per feed is the
/// strftime specifier returned by [`DateFormat::spec`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFormat {
    /// Atom's canonical form (RFC 3339)
    Rfc3339,
    /// RFC 1123 with numeric zone, e.g. "Mon, 02 Jan 2006 15:04:05 -0700"
    Rfc1123Numeric,
    /// RFC 1123 with named zone, e.g. "Mon, 02 Jan 2006 15:04:05 GMT"
    Rfc1123,
    /// RFC 822 with numeric zone, e.g. "02 Jan 06 15:04 -0700"
    Rfc822Numeric,
    /// RFC 822 with named zone, e.g. "02 Jan 06 15:04 MST"
    Rfc822,
    /// Bare "YYYY-MM-DD HH:MM:SS", assumed UTC
    DateTimeBare,
    /// Bare "YYYY-MM-DD", midnight UTC
    DateBare,
}

/// The fallback scan order. More specific/unambiguous formats come first;
/// the tie-break is data here, not control flow, so it is testable on its
/// own.
pub const CANDIDATES: &[DateFormat] = &[
    DateFormat::Rfc3339,
    DateFormat::Rfc1123Numeric,
    DateFormat::Rfc1123,
    DateFormat::Rfc822Numeric,
    DateFormat::Rfc822,
    DateFormat::DateTimeBare,
    DateFormat::DateBare,
];

impl DateFormat {
    /// The strftime specifier persisted as a feed's format hint.
    pub const fn spec(self) -> &'static str {
        match self {
            DateFormat::Rfc3339 => "%+",
            DateFormat::Rfc1123Numeric => "%a, %d %b %Y %H:%M:%S %z",
            DateFormat::Rfc1123 => "%a, %d %b %Y %H:%M:%S %Z",
            DateFormat::Rfc822Numeric => "%d %b %y %H:%M %z",
            DateFormat::Rfc822 => "%d %b %y %H:%M %Z",
            DateFormat::DateTimeBare => "%Y-%m-%d %H:%M:%S",
            DateFormat::DateBare => "%Y-%m-%d",
        }
    }

    /// Map a persisted specifier back to its format. Unknown strings yield
    /// `None`; the caller falls through to the full scan.
    pub fn from_spec(spec: &str) -> Option<Self> {
        CANDIDATES.iter().copied().find(|f| f.spec() == spec)
    }

    /// Attempt to parse `raw` as exactly this format.
    ///
    /// Named-zone and bare variants carry no usable offset; chrono consumes
    /// the zone name without interpreting it, so those parse as naive times
    /// taken to be UTC.
    pub fn parse(self, raw: &str) -> Option<DateTime<FixedOffset>> {
        match self {
            DateFormat::Rfc3339 => DateTime::parse_from_rfc3339(raw).ok(),
            DateFormat::Rfc1123Numeric | DateFormat::Rfc822Numeric => {
                DateTime::parse_from_str(raw, self.spec()).ok()
            }
            DateFormat::Rfc1123 | DateFormat::Rfc822 => {
                // chrono's %Z consumes any non-whitespace token, which would
                // let a numeric zone ("-0700") slip through as naive UTC.
                // Named-zone variants only claim alphabetic abbreviations so
                // numeric-zone strings stay with the stricter candidates.
                if !ends_with_named_zone(raw) {
                    return None;
                }
                NaiveDateTime::parse_from_str(raw, self.spec())
                    .ok()
                    .map(|naive| naive.and_utc().fixed_offset())
            }
            DateFormat::DateTimeBare => NaiveDateTime::parse_from_str(raw, self.spec())
                .ok()
                .map(|naive| naive.and_utc().fixed_offset()),
            DateFormat::DateBare => NaiveDate::parse_from_str(raw, self.spec())
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(|naive| naive.and_utc().fixed_offset()),
        }
    }
}

fn ends_with_named_zone(raw: &str) -> bool {
    raw.rsplit(' ')
        .next()
        .is_some_and(|zone| !zone.is_empty() && zone.chars().all(|c| c.is_ascii_alphabetic()))
}

/// Resolve a raw date string to an absolute timestamp plus the specifier
/// that matched.
///
/// A non-empty `hint` naming a known format is tried first and wins
/// immediately on success (the fast path once a feed's format is learned).
/// Otherwise the ordered candidate scan runs, first match wins.
pub fn resolve(
    raw: &str,
    hint: Option<&str>,
) -> Result<(DateTime<FixedOffset>, &'static str), DateParseError> {
    resolve_with(raw, hint, DateFormat::parse)
}

// The parse attempt is injected so tests can observe which formats get
// tried; `resolve` is the only production caller and passes the real one.
fn resolve_with(
    raw: &str,
    hint: Option<&str>,
    mut attempt: impl FnMut(DateFormat, &str) -> Option<DateTime<FixedOffset>>,
) -> Result<(DateTime<FixedOffset>, &'static str), DateParseError> {
    if let Some(format) = hint
        .filter(|h| !h.is_empty())
        .and_then(DateFormat::from_spec)
    {
        if let Some(ts) = attempt(format, raw) {
            return Ok((ts, format.spec()));
        }
    }

    CANDIDATES
        .iter()
        .find_map(|&format| attempt(format, raw).map(|ts| (ts, format.spec())))
        .ok_or_else(|| DateParseError(raw.to_string()))
}

/// The single canonical textual encoding for all persisted timestamps:
/// RFC 3339 with seconds precision, `Z` for UTC.
pub fn to_canonical(ts: &DateTime<FixedOffset>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Secs, true)
}

// ============================================================================
// Tests
// ============================================================================
