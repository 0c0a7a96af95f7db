// ABOUTME: Value types produced by the parser: podcasts, episodes and OPML trees.
// ABOUTME: All types are plain owned data, built fresh on every parse.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single downloadable episode of a podcast.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PodcastEpisode {
    pub title: String,
    pub description: String,
    pub author: String,
    /// Falls back to the time of parsing when the feed has no usable date.
    pub publication_date: DateTime<Utc>,
    pub duration_secs: Option<u32>,
    /// Audio enclosure URL. Never empty for an emitted episode.
    pub url: String,
}

/// A podcast channel, or a feed stub when it comes from an OPML outline.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Podcast {
    pub title: String,
    pub link: String,
    pub description: String,
    pub copyright: String,
    /// Canonical feed URL.
    pub url: Option<String>,
    pub image_url_large: Option<String>,
    pub owner_name: String,
    pub owner_email: String,
    pub episodes: Vec<PodcastEpisode>,
}

/// A folder of feed subscriptions from an OPML document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpmlContainer {
    pub name: String,
    /// Source document URL; only set on the root container.
    pub url: Option<String>,
    pub feeds: Vec<Podcast>,
    pub containers: Vec<OpmlContainer>,
}

impl OpmlContainer {
    /// Iterates every feed in this container and its descendants, depth first,
    /// in document order.
    pub fn all_feeds(&self) -> Box<dyn Iterator<Item = &Podcast> + '_> {
        Box::new(
            self.feeds
                .iter()
                .chain(self.containers.iter().flat_map(|c| c.all_feeds())),
        )
    }

    pub fn feed_count(&self) -> usize {
        self.feeds.len()
            + self
                .containers
                .iter()
                .map(OpmlContainer::feed_count)
                .sum::<usize>()
    }

    /// Replaces this container by its only child for as long as it holds no
    /// feeds and exactly one sub-container.
    pub fn collapse_single_child(&mut self) {
        while self.feeds.is_empty() && self.containers.len() == 1 {
            if let Some(child) = self.containers.pop() {
                *self = child;
            }
        }
    }
}

/// The result of loading a document: either an RSS podcast or an OPML tree.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "document", rename_all = "lowercase")]
pub enum FeedDocument {
    Podcast(Podcast),
    Opml(OpmlContainer),
}

impl FeedDocument {
    pub fn kind(&self) -> &'static str {
        match self {
            FeedDocument::Podcast(_) => "podcast",
            FeedDocument::Opml(_) => "opml",
        }
    }

    pub fn as_podcast(&self) -> Option<&Podcast> {
        match self {
            FeedDocument::Podcast(p) => Some(p),
            FeedDocument::Opml(_) => None,
        }
    }

    pub fn as_opml(&self) -> Option<&OpmlContainer> {
        match self {
            FeedDocument::Opml(c) => Some(c),
            FeedDocument::Podcast(_) => None,
        }
    }
}
