// ABOUTME: Recursive-descent parser for RSS channels and their items.
// ABOUTME: Extracts podcast metadata, iTunes owner/duration/author and audio enclosures.

use std::io::BufRead;

use chrono::{DateTime, Utc};

use crate::cursor::Cursor;
use crate::duration_parse::parse_duration_secs;
use crate::error::{FeedError, FieldWarning};
use crate::models::{Podcast, PodcastEpisode};
use crate::time_parse::parse_rfc822_time;
use crate::urls::{from_encoded, has_audio_extension};

/// Namespace URIs are lower case; the cursor lower-cases what it reads.
pub const ITUNES_NAMESPACE: &str = "http://www.itunes.com/dtds/podcast-1.0.dtd";
pub const ATOM_NAMESPACE: &str = "http://www.w3.org/2005/atom";

/// Parses the first `<channel>` of an RSS document.
///
/// The cursor should be inside the `rss` root. Fails if the document ends
/// before a channel starts.
pub fn parse_rss<R: BufRead>(cursor: &mut Cursor<R>) -> Result<Podcast, FeedError> {
    cursor.seek_element("channel")?;
    let mut podcast = Podcast::default();
    parse_channel(cursor, &mut podcast)?;
    tracing::debug!(
        title = %podcast.title,
        episodes = podcast.episodes.len(),
        "parsed rss channel"
    );
    Ok(podcast)
}

fn parse_channel<R: BufRead>(cursor: &mut Cursor<R>, podcast: &mut Podcast) -> Result<(), FeedError> {
    cursor.for_each_child(|cursor| {
        let name = cursor.name().to_string();
        let namespace = cursor.namespace().to_string();

        match name.as_str() {
            "title" => podcast.title = cursor.read_element_text()?,
            "link" if namespace.is_empty() => {
                podcast.link = from_encoded(&cursor.read_element_text()?);
            }
            "description" => podcast.description = cursor.read_element_text()?,
            "owner" if namespace == ITUNES_NAMESPACE => parse_itunes_owner(cursor, podcast)?,
            "image" => parse_image(cursor, podcast)?,
            "copyright" => podcast.copyright = cursor.read_element_text()?,
            "link"
                if namespace == ATOM_NAMESPACE
                    && podcast.url.is_none()
                    && cursor.attribute("rel") == "self" =>
            {
                let href = cursor.attribute("href").to_string();
                let text = cursor.read_element_text()?;
                let url = from_encoded(if href.trim().is_empty() { &text } else { &href });
                if !url.is_empty() {
                    podcast.url = Some(url);
                }
            }
            "item" => {
                if let Some(episode) = parse_item(cursor)? {
                    podcast.episodes.push(episode);
                }
            }
            _ => return Ok(false),
        }
        Ok(true)
    })
}

fn parse_image<R: BufRead>(cursor: &mut Cursor<R>, podcast: &mut Podcast) -> Result<(), FeedError> {
    cursor.for_each_child(|cursor| {
        if cursor.name() != "url" {
            return Ok(false);
        }
        let url = from_encoded(&cursor.read_element_text()?);
        if !url.is_empty() {
            podcast.image_url_large = Some(url);
        }
        Ok(true)
    })
}

fn parse_itunes_owner<R: BufRead>(
    cursor: &mut Cursor<R>,
    podcast: &mut Podcast,
) -> Result<(), FeedError> {
    cursor.for_each_child(|cursor| {
        let name = cursor.name().to_string();
        match name.as_str() {
            "name" => podcast.owner_name = cursor.read_element_text()?,
            "email" => podcast.owner_email = cursor.read_element_text()?,
            _ => return Ok(false),
        }
        Ok(true)
    })
}

/// Fields collected while walking an `<item>`.
#[derive(Debug, Default)]
struct EpisodeDraft {
    title: String,
    description: String,
    author: String,
    publication_date: Option<DateTime<Utc>>,
    duration_secs: Option<u32>,
    url: Option<String>,
}

impl EpisodeDraft {
    /// Drafts without an audio URL are not episodes.
    fn finish(self) -> Option<PodcastEpisode> {
        let url = self.url.filter(|u| !u.is_empty())?;
        Some(PodcastEpisode {
            title: self.title,
            description: self.description,
            author: self.author,
            publication_date: self.publication_date.unwrap_or_else(Utc::now),
            duration_secs: self.duration_secs,
            url,
        })
    }
}

fn parse_item<R: BufRead>(cursor: &mut Cursor<R>) -> Result<Option<PodcastEpisode>, FeedError> {
    let mut draft = EpisodeDraft::default();

    cursor.for_each_child(|cursor| {
        let name = cursor.name().to_string();
        let namespace = cursor.namespace().to_string();

        match name.as_str() {
            "title" => draft.title = cursor.read_element_text()?,
            "description" => draft.description = cursor.read_element_text()?,
            "pubDate" => {
                let text = cursor.read_element_text()?;
                draft.publication_date = parse_rfc822_time(&text);
                if draft.publication_date.is_none() {
                    cursor.warn(FieldWarning::InvalidDate(text));
                }
            }
            "duration" if namespace == ITUNES_NAMESPACE => {
                let text = cursor.read_element_text()?;
                draft.duration_secs = parse_duration_secs(&text);
                if draft.duration_secs.is_none() && !text.is_empty() {
                    cursor.warn(FieldWarning::InvalidDuration(text));
                }
            }
            "enclosure" => {
                let mime_type = cursor.attribute("type").to_string();
                let url = from_encoded(cursor.attribute("url"));
                if is_audio_enclosure(&mime_type, &url) {
                    if draft.url.is_none() && !url.is_empty() {
                        draft.url = Some(url);
                    }
                } else {
                    cursor.warn(FieldWarning::UnsupportedEnclosure { mime_type, url });
                }
                cursor.skip_current_element()?;
            }
            "author" if namespace == ITUNES_NAMESPACE => {
                draft.author = cursor.read_element_text()?;
            }
            _ => return Ok(false),
        }
        Ok(true)
    })?;

    let title = draft.title.clone();
    let episode = draft.finish();
    if episode.is_none() {
        tracing::debug!(title = %title, "dropping item without an audio enclosure");
    }
    Ok(episode)
}

/// Audio MIME types are accepted outright. Untyped enclosures are accepted
/// when the URL path has a well-known audio extension.
fn is_audio_enclosure(mime_type: &str, url: &str) -> bool {
    if mime_type.starts_with("audio/") || mime_type.starts_with("x-audio/") {
        return true;
    }
    mime_type.is_empty() && has_audio_extension(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(xml: &str) -> (Podcast, Vec<FieldWarning>) {
        let mut cursor = Cursor::new(xml.as_bytes());
        let podcast = parse_rss(&mut cursor).unwrap();
        (podcast, cursor.into_warnings())
    }

    #[test]
    fn enclosure_type_rules() {
        assert!(is_audio_enclosure("audio/mpeg", "https://x/a"));
        assert!(is_audio_enclosure("x-audio/wav", "https://x/a"));
        assert!(is_audio_enclosure("", "https://x/a.MP3"));
        assert!(!is_audio_enclosure("", "https://x/a.ogg"));
        assert!(!is_audio_enclosure("video/mp4", "https://x/a.mp3"));
    }

    #[test]
    fn channel_fields() {
        let (podcast, _) = parse(
            r#"<rss xmlns:itunes="http://www.itunes.com/dtds/podcast-1.0.dtd">
            <channel>
                <title> Show </title>
                <link>https://example.com/show page</link>
                <description>About</description>
                <copyright>2024 Someone</copyright>
                <image><title>ignored</title><url>https://example.com/art.png</url></image>
                <itunes:owner>
                    <itunes:name>Owner</itunes:name>
                    <itunes:email>owner@example.com</itunes:email>
                </itunes:owner>
            </channel></rss>"#,
        );

        assert_eq!(podcast.title, "Show");
        assert_eq!(podcast.link, "https://example.com/show%20page");
        assert_eq!(podcast.description, "About");
        assert_eq!(podcast.copyright, "2024 Someone");
        assert_eq!(podcast.image_url_large.as_deref(), Some("https://example.com/art.png"));
        assert_eq!(podcast.owner_name, "Owner");
        assert_eq!(podcast.owner_email, "owner@example.com");
    }

    #[test]
    fn owner_outside_itunes_namespace_is_skipped() {
        let (podcast, _) = parse(
            "<rss><channel><owner><name>Nope</name></owner><title>T</title></channel></rss>",
        );
        assert_eq!(podcast.owner_name, "");
        assert_eq!(podcast.title, "T");
    }

    #[test]
    fn first_atom_self_link_wins() {
        let (podcast, _) = parse(
            r#"<rss xmlns:atom="http://www.w3.org/2005/Atom"><channel>
                <atom:link rel="alternate" href="https://example.com/alt"/>
                <atom:link rel="self" href="https://example.com/feed.xml"/>
                <atom:link rel="self" href="https://example.com/other.xml"/>
            </channel></rss>"#,
        );
        assert_eq!(podcast.url.as_deref(), Some("https://example.com/feed.xml"));
    }

    #[test]
    fn atom_link_does_not_set_channel_link() {
        let (podcast, _) = parse(
            r#"<rss xmlns:atom="http://www.w3.org/2005/Atom"><channel>
                <link>https://example.com/</link>
                <atom:link rel="self" href="https://example.com/feed.xml"/>
            </channel></rss>"#,
        );
        assert_eq!(podcast.link, "https://example.com/");
    }

    #[test]
    fn item_fields_and_warnings() {
        let (podcast, warnings) = parse(
            r#"<rss xmlns:itunes="http://www.itunes.com/dtds/podcast-1.0.dtd"><channel>
                <item>
                    <title>Ep</title>
                    <description>Desc</description>
                    <itunes:author>Host</itunes:author>
                    <author>ignored@example.com</author>
                    <pubDate>sometime last week</pubDate>
                    <itunes:duration>1:xx</itunes:duration>
                    <enclosure url="https://cdn/ep.mp4" type="video/mp4"/>
                    <enclosure url="https://cdn/ep.mp3" type="audio/mpeg"/>
                </item>
            </channel></rss>"#,
        );

        assert_eq!(podcast.episodes.len(), 1);
        let ep = &podcast.episodes[0];
        assert_eq!(ep.title, "Ep");
        assert_eq!(ep.description, "Desc");
        assert_eq!(ep.author, "Host");
        assert_eq!(ep.duration_secs, None);
        assert_eq!(ep.url, "https://cdn/ep.mp3");

        assert_eq!(
            warnings,
            vec![
                FieldWarning::InvalidDate("sometime last week".into()),
                FieldWarning::InvalidDuration("1:xx".into()),
                FieldWarning::UnsupportedEnclosure {
                    mime_type: "video/mp4".into(),
                    url: "https://cdn/ep.mp4".into(),
                },
            ]
        );
    }

    #[test]
    fn duration_outside_itunes_namespace_is_ignored() {
        let (podcast, _) = parse(
            r#"<rss><channel><item>
                <duration>1:00</duration>
                <enclosure url="https://cdn/a.mp3" type="audio/mpeg"/>
            </item></channel></rss>"#,
        );
        assert_eq!(podcast.episodes[0].duration_secs, None);
    }

    #[test]
    fn untyped_enclosure_with_audio_extension() {
        let (podcast, _) = parse(
            r#"<rss><channel><item>
                <enclosure url="https://cdn/a.WAV?x=1"/>
            </item></channel></rss>"#,
        );
        assert_eq!(podcast.episodes[0].url, "https://cdn/a.WAV?x=1");
    }

    #[test]
    fn enclosure_without_url_does_not_block_later_ones() {
        let (podcast, _) = parse(
            r#"<rss><channel><item>
                <enclosure type="audio/mpeg"/>
                <enclosure url="https://cdn/b.mp3" type="audio/mpeg"/>
            </item></channel></rss>"#,
        );
        assert_eq!(podcast.episodes[0].url, "https://cdn/b.mp3");
    }

    #[test]
    fn missing_channel_fails() {
        let mut cursor = Cursor::new("<rss><item/></rss>".as_bytes());
        assert!(matches!(parse_rss(&mut cursor), Err(FeedError::Malformed(_))));
    }

    #[test]
    fn truncated_channel_fails() {
        let mut cursor = Cursor::new("<rss><channel><title>T</title>".as_bytes());
        assert!(parse_rss(&mut cursor).is_err());
    }
}
