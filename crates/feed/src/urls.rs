// ABOUTME: Lenient URL handling for feed links and enclosure URLs.
// ABOUTME: Escapes raw text without re-encoding existing percent escapes.

use std::fmt::Write;

use url::Url;

/// Turns raw element or attribute text into an encoded URL string.
///
/// Printable ASCII passes through untouched, so `%XX` escapes already in the
/// feed survive as-is. Spaces and control characters are escaped. Characters
/// in U+0080..=U+00FF are treated as Latin-1 octets and escaped as a single
/// `%XX`; anything above that is escaped as its UTF-8 bytes.
pub fn from_encoded(text: &str) -> String {
    let text = text.trim();
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        let code = ch as u32;
        if ch.is_ascii_graphic() {
            out.push(ch);
        } else if code <= 0xFF {
            let _ = write!(out, "%{code:02X}");
        } else {
            let mut bytes = [0u8; 4];
            for b in ch.encode_utf8(&mut bytes).as_bytes() {
                let _ = write!(out, "%{b:02X}");
            }
        }
    }
    out
}

/// Path component of a URL. Relative or unparseable URLs fall back to the
/// text before any query or fragment.
pub fn url_path(url: &str) -> String {
    match Url::parse(url) {
        Ok(parsed) => parsed.path().to_string(),
        Err(_) => url
            .split(['?', '#'])
            .next()
            .unwrap_or_default()
            .to_string(),
    }
}

/// True if the URL path ends in an extension commonly used for audio files.
pub fn has_audio_extension(url: &str) -> bool {
    const AUDIO_EXTENSIONS: &[&str] = &[".mp3", ".m4a", ".wav"];
    let path = url_path(url).to_ascii_lowercase();
    AUDIO_EXTENSIONS.iter().any(|ext| path.ends_with(ext))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_existing_escapes() {
        assert_eq!(
            from_encoded("https://example.com/a%20b.mp3"),
            "https://example.com/a%20b.mp3"
        );
    }

    #[test]
    fn escapes_spaces_and_latin1() {
        assert_eq!(from_encoded(" http://x.org/caf\u{e9} 1 "), "http://x.org/caf%E9%201");
    }

    #[test]
    fn escapes_wide_chars_as_utf8() {
        assert_eq!(from_encoded("http://x.org/\u{2603}"), "http://x.org/%E2%98%83");
    }

    #[test]
    fn path_ignores_query() {
        assert_eq!(url_path("https://cdn.example.com/ep.mp3?x=1#t"), "/ep.mp3");
        assert_eq!(url_path("media/ep.MP3?token=abc"), "media/ep.MP3");
    }

    #[test]
    fn audio_extension_is_case_insensitive() {
        assert!(has_audio_extension("https://cdn.example.com/show.M4A"));
        assert!(has_audio_extension("https://cdn.example.com/show.wav?dl=1"));
        assert!(!has_audio_extension("https://cdn.example.com/show.mp4"));
        assert!(!has_audio_extension("https://cdn.example.com/show.mp3/page"));
    }
}
