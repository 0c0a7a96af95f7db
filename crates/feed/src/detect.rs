// ABOUTME: Cheap format detection for candidate feed documents.
// ABOUTME: Checks declared content types and sniffs bytes for rss/opml root tags.

use once_cell::sync::Lazy;
use regex::Regex;

/// Content types accepted by `supports_content_type`, matched as substrings.
pub const SUPPORTED_MIME_TYPES: &[&str] = &[
    "application/rss+xml",
    "application/xml",
    "text/x-opml",
    "text/xml",
];

static ROOT_TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"<(rss|opml)\b").unwrap());

/// True if the declared content type may hold a supported document.
/// An empty content type is unknown and always worth a try.
pub fn supports_content_type(content_type: &str) -> bool {
    content_type.is_empty()
        || SUPPORTED_MIME_TYPES
            .iter()
            .any(|mime| content_type.contains(mime))
}

/// True if the bytes look like an RSS or OPML document.
pub fn try_magic(data: &[u8]) -> bool {
    ROOT_TAG_RE.is_match(&String::from_utf8_lossy(data))
}
