// ABOUTME: Error and warning types for feed document parsing.
// ABOUTME: FeedError aborts a parse; FieldWarning records a field that fell back to its default.

use std::fmt;
use thiserror::Error;

/// Fatal errors that abort a parse. No partial document is returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeedError {
    /// The tokenizer rejected the input, or the document ended before a
    /// required structural element was found.
    #[error("malformed document: {0}")]
    Malformed(String),

    /// The root element is neither `rss` nor `opml`.
    #[error("unrecognized root element <{0}>")]
    UnrecognizedRoot(String),

    /// OPML outlines nest deeper than the configured limit.
    #[error("outline nesting exceeds maximum of {0} levels")]
    TooDeep(usize),
}

impl FeedError {
    /// Creates a Malformed error from an underlying tokenizer or decoding error.
    pub fn malformed(err: impl fmt::Display) -> Self {
        FeedError::Malformed(err.to_string())
    }

    /// Creates a Malformed error for a structural element that never appeared.
    pub fn missing_element(name: &str) -> Self {
        FeedError::Malformed(format!("document ended before <{name}> was found"))
    }
}

/// Non-fatal problems with individual fields. The parse continues and the
/// field keeps its default.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FieldWarning {
    #[error("unable to parse date: {0:?}")]
    InvalidDate(String),

    #[error("unable to parse duration: {0:?}")]
    InvalidDuration(String),

    #[error("ignoring enclosure {url:?} with type {mime_type:?}")]
    UnsupportedEnclosure { mime_type: String, url: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_element_is_malformed() {
        let err = FeedError::missing_element("channel");
        assert!(matches!(err, FeedError::Malformed(_)));
        assert_eq!(
            err.to_string(),
            "malformed document: document ended before <channel> was found"
        );
    }

    #[test]
    fn warning_messages_quote_the_input() {
        let w = FieldWarning::InvalidDate("yesterday".into());
        assert_eq!(w.to_string(), "unable to parse date: \"yesterday\"");
    }
}
