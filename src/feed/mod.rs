//! Feed wire handling: fetching, format-specific decoding, normalization,
//! and date resolution.
//!
//! The module is organized into four submodules:
//!
//! - [`fetcher`] - HTTP retrieval of a feed's byte stream
//! - [`decode`] - RSS/Atom decoders over quick-xml serde structs
//! - [`normalize`] - wire shapes to the canonical item list
//! - [`dates`] - raw date strings to absolute timestamps, hint-first

pub mod dates;
pub mod decode;
pub mod normalize;

mod fetcher;

pub use dates::{resolve, to_canonical, DateFormat, DateParseError, CANDIDATES};
pub use decode::{decode_atom, decode_rss, DecodeError, RawFeed};
pub use fetcher::{fetch_bytes, FetchError};
pub use normalize::{normalize, NormalizedItem};
