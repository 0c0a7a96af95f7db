// ABOUTME: Recursive-descent parser for OPML subscription lists.
// ABOUTME: Builds a container tree of feed stubs from nested outline elements.

use std::io::BufRead;

use crate::cursor::Cursor;
use crate::error::FeedError;
use crate::models::{OpmlContainer, Podcast};
use crate::parser::ParseOptions;
use crate::urls::from_encoded;

/// Parses the outlines under `<body>` into a container tree.
///
/// Fails if the document ends before a body starts, or if folders nest
/// deeper than `options.max_outline_depth`.
pub fn parse_opml<R: BufRead>(
    cursor: &mut Cursor<R>,
    options: &ParseOptions,
) -> Result<OpmlContainer, FeedError> {
    cursor.seek_element("body")?;

    let mut root = OpmlContainer::default();
    parse_outlines(cursor, &mut root, 1, options.max_outline_depth)?;

    // Documents often wrap everything in one redundant top-level folder.
    if options.collapse_single_container {
        root.collapse_single_child();
    }

    tracing::debug!(
        feeds = root.feed_count(),
        containers = root.containers.len(),
        "parsed opml body"
    );
    Ok(root)
}

fn parse_outlines<R: BufRead>(
    cursor: &mut Cursor<R>,
    container: &mut OpmlContainer,
    depth: usize,
    max_depth: usize,
) -> Result<(), FeedError> {
    cursor.for_each_child(|cursor| {
        if cursor.name() != "outline" {
            return Ok(false);
        }

        if cursor.attribute("type") == "rss" {
            container.feeds.push(feed_stub(cursor));
            // A feed outline is a leaf; anything inside it is noise.
            cursor.skip_current_element()?;
            return Ok(true);
        }

        if depth > max_depth {
            return Err(FeedError::TooDeep(max_depth));
        }

        let mut child = OpmlContainer {
            name: first_non_empty(cursor.attribute("fullname"), cursor.attribute("text")),
            ..Default::default()
        };
        parse_outlines(cursor, &mut child, depth + 1, max_depth)?;
        container.containers.push(child);
        Ok(true)
    })
}

fn feed_stub<R: BufRead>(cursor: &Cursor<R>) -> Podcast {
    Podcast {
        title: first_non_empty(cursor.attribute("title"), cursor.attribute("text")),
        description: cursor.attribute("description").to_string(),
        image_url_large: non_empty_url(cursor.attribute("imageHref")),
        url: non_empty_url(cursor.attribute("xmlUrl")),
        ..Default::default()
    }
}

fn first_non_empty(preferred: &str, fallback: &str) -> String {
    if preferred.is_empty() {
        fallback.to_string()
    } else {
        preferred.to_string()
    }
}

fn non_empty_url(raw: &str) -> Option<String> {
    let url = from_encoded(raw);
    (!url.is_empty()).then_some(url)
}
