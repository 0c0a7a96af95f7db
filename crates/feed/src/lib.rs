// ABOUTME: Streaming parser for podcast RSS feeds and OPML subscription lists.
// ABOUTME: Provides format detection, a token cursor, and recursive-descent RSS/OPML parsers.

pub mod cursor;
pub mod detect;
pub mod duration_parse;
pub mod error;
pub mod models;
pub mod opml;
pub mod parser;
pub mod rss;
pub mod time_parse;
pub mod urls;

pub use cursor::{Cursor, Token};
pub use detect::{supports_content_type, try_magic, SUPPORTED_MIME_TYPES};
pub use duration_parse::parse_duration_secs;
pub use error::{FeedError, FieldWarning};
pub use models::{FeedDocument, OpmlContainer, Podcast, PodcastEpisode};
pub use parser::{load, load_bytes, load_with_options, ParseOptions, ParseOutcome};
pub use time_parse::parse_rfc822_time;
