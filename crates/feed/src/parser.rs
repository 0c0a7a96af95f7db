// ABOUTME: Top-level entry points that route a document to the RSS or OPML parser.
// ABOUTME: Also holds ParseOptions and the ParseOutcome returned with collected warnings.

use std::io::BufRead;

use crate::cursor::{Cursor, Token};
use crate::error::{FeedError, FieldWarning};
use crate::models::FeedDocument;
use crate::opml::parse_opml;
use crate::rss::parse_rss;

/// Tuning knobs for a parse.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseOptions {
    /// Deepest OPML folder nesting accepted before the parse fails.
    pub max_outline_depth: usize,
    /// Replace an OPML root holding a single folder and no feeds by that folder.
    pub collapse_single_container: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        Self {
            max_outline_depth: 64,
            collapse_single_container: true,
        }
    }
}

impl ParseOptions {
    pub fn max_outline_depth(mut self, depth: usize) -> Self {
        self.max_outline_depth = depth;
        self
    }

    pub fn collapse_single_container(mut self, collapse: bool) -> Self {
        self.collapse_single_container = collapse;
        self
    }
}

/// A parsed document plus the field problems met along the way.
#[derive(Debug, Clone, PartialEq)]
pub struct ParseOutcome {
    pub document: FeedDocument,
    pub warnings: Vec<FieldWarning>,
}

/// Parses an RSS or OPML document from a reader.
///
/// # Arguments
/// * `input` - The whole document; it is consumed up to the end of the parsed structure
/// * `origin_url` - Where the document came from, stamped onto the result when non-empty
///
/// # Returns
/// * `Ok(FeedDocument)` - A podcast for `<rss>` roots, a container tree for `<opml>` roots
/// * `Err(FeedError)` - Malformed XML, a missing channel/body, or an unknown root
pub fn load<R: BufRead>(input: R, origin_url: &str) -> Result<FeedDocument, FeedError> {
    load_with_options(input, origin_url, &ParseOptions::default()).map(|o| o.document)
}

/// Parses a document held in memory. See [`load`].
pub fn load_bytes(data: &[u8], origin_url: &str) -> Result<FeedDocument, FeedError> {
    load(data, origin_url)
}

/// Parses a document with explicit options, returning collected warnings too.
pub fn load_with_options<R: BufRead>(
    input: R,
    origin_url: &str,
    options: &ParseOptions,
) -> Result<ParseOutcome, FeedError> {
    let mut cursor = Cursor::new(input);

    let document = loop {
        match cursor.next_token()? {
            Token::StartElement => break dispatch_root(&mut cursor, origin_url, options)?,
            Token::EndOfDocument => {
                return Err(FeedError::malformed("document has no root element"))
            }
            Token::Text | Token::EndElement => {}
        }
    };

    let warnings = cursor.into_warnings();
    if !warnings.is_empty() {
        tracing::debug!(
            origin_url,
            count = warnings.len(),
            "document parsed with field warnings"
        );
    }
    Ok(ParseOutcome { document, warnings })
}

fn dispatch_root<R: BufRead>(
    cursor: &mut Cursor<R>,
    origin_url: &str,
    options: &ParseOptions,
) -> Result<FeedDocument, FeedError> {
    let origin = (!origin_url.is_empty()).then(|| origin_url.to_string());
    let root = cursor.name().to_string();

    match root.as_str() {
        "rss" => {
            let mut podcast = parse_rss(cursor)?;
            if origin.is_some() {
                podcast.url = origin;
            }
            Ok(FeedDocument::Podcast(podcast))
        }
        "opml" => {
            let mut container = parse_opml(cursor, options)?;
            container.url = origin;
            Ok(FeedDocument::Opml(container))
        }
        _ => Err(FeedError::UnrecognizedRoot(root)),
    }
}
