// ABOUTME: Forward-only token cursor over a namespace-aware quick-xml reader.
// ABOUTME: Exposes the current element, element text extraction and subtree skipping.

use std::io::BufRead;

use quick_xml::escape::{resolve_predefined_entity, unescape};
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::reader::NsReader;

use crate::error::{FeedError, FieldWarning};

/// Kind of token the cursor is positioned on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Token {
    StartElement,
    EndElement,
    Text,
    EndOfDocument,
}

/// Name, namespace and attributes of the most recent start element.
#[derive(Debug, Clone, Default)]
struct Element {
    name: String,
    namespace: String,
    attributes: Vec<(String, String)>,
}

/// Streaming cursor handed by `&mut` through the recursive-descent parsers.
///
/// Namespaces are compared as lower-cased URI strings. Prefix remapping is
/// resolved by the underlying reader, but URIs differing only in case are
/// treated as equal.
pub struct Cursor<R> {
    reader: NsReader<R>,
    buf: Vec<u8>,
    current: Element,
    text: String,
    warnings: Vec<FieldWarning>,
}

impl<R: BufRead> Cursor<R> {
    /// Text and attribute values are decoded with the encoding named by the
    /// BOM or XML declaration, UTF-8 otherwise.
    pub fn new(input: R) -> Self {
        let mut reader = NsReader::from_reader(input);
        // Self-closing elements arrive as a start/end pair.
        reader.config_mut().expand_empty_elements = true;
        Self {
            reader,
            buf: Vec::new(),
            current: Element::default(),
            text: String::new(),
            warnings: Vec::new(),
        }
    }

    /// Advances to the next token. Comments, processing instructions and the
    /// XML declaration are passed over silently.
    pub fn next_token(&mut self) -> Result<Token, FeedError> {
        loop {
            self.buf.clear();
            let event = self
                .reader
                .read_event_into(&mut self.buf)
                .map_err(FeedError::malformed)?;

            match event {
                Event::Start(ref e) => {
                    self.current = read_element(&self.reader, e)?;
                    return Ok(Token::StartElement);
                }
                Event::End(_) => return Ok(Token::EndElement),
                Event::Text(ref t) => {
                    let raw = t.decode().map_err(FeedError::malformed)?;
                    self.text = match unescape(&raw) {
                        Ok(s) => s.into_owned(),
                        Err(_) => raw.into_owned(),
                    };
                    return Ok(Token::Text);
                }
                Event::CData(ref c) => {
                    self.text = c.decode().map_err(FeedError::malformed)?.into_owned();
                    return Ok(Token::Text);
                }
                Event::GeneralRef(ref r) => {
                    let name = r.decode().map_err(FeedError::malformed)?;
                    self.text = match r.resolve_char_ref() {
                        Ok(Some(ch)) => ch.to_string(),
                        _ => match resolve_predefined_entity(&name) {
                            Some(s) => s.to_string(),
                            None => format!("&{name};"),
                        },
                    };
                    return Ok(Token::Text);
                }
                Event::Eof => return Ok(Token::EndOfDocument),
                _ => {}
            }
        }
    }

    /// Local name of the current (most recent) start element.
    pub fn name(&self) -> &str {
        &self.current.name
    }

    /// Lower-cased namespace URI of the current start element, empty when unbound.
    pub fn namespace(&self) -> &str {
        &self.current.namespace
    }

    pub fn attributes(&self) -> &[(String, String)] {
        &self.current.attributes
    }

    /// Value of the named attribute on the current start element, empty when absent.
    pub fn attribute(&self, key: &str) -> &str {
        self.current
            .attributes
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .unwrap_or("")
    }

    /// Reads all text up to and including the end of the current element.
    /// Child elements are skipped; the result is trimmed.
    pub fn read_element_text(&mut self) -> Result<String, FeedError> {
        let mut out = String::new();
        loop {
            match self.next_token()? {
                Token::Text => out.push_str(&self.text),
                Token::StartElement => self.skip_current_element()?,
                Token::EndElement => return Ok(out.trim().to_string()),
                Token::EndOfDocument => {
                    return Err(FeedError::malformed(
                        "document ended inside a text element",
                    ))
                }
            }
        }
    }

    /// Consumes the subtree of the current start element, leaving the cursor
    /// just past its matching end element.
    pub fn skip_current_element(&mut self) -> Result<(), FeedError> {
        let mut depth = 1usize;
        while depth > 0 {
            match self.next_token()? {
                Token::StartElement => depth += 1,
                Token::EndElement => depth -= 1,
                Token::Text => {}
                Token::EndOfDocument => {
                    return Err(FeedError::malformed(
                        "document ended inside an unclosed element",
                    ))
                }
            }
        }
        Ok(())
    }

    /// Walks the children of the current start element through to its end
    /// element. `on_start` is called on each child start element and returns
    /// whether it consumed that child; unconsumed children are skipped.
    pub fn for_each_child<F>(&mut self, mut on_start: F) -> Result<(), FeedError>
    where
        F: FnMut(&mut Self) -> Result<bool, FeedError>,
    {
        loop {
            match self.next_token()? {
                Token::StartElement => {
                    if !on_start(self)? {
                        self.skip_current_element()?;
                    }
                }
                Token::EndElement => return Ok(()),
                Token::Text => {}
                Token::EndOfDocument => {
                    return Err(FeedError::malformed(
                        "document ended inside an unclosed element",
                    ))
                }
            }
        }
    }

    /// Advances until a start element with the given local name, descending
    /// into everything on the way.
    pub fn seek_element(&mut self, name: &str) -> Result<(), FeedError> {
        loop {
            match self.next_token()? {
                Token::StartElement if self.current.name == name => return Ok(()),
                Token::EndOfDocument => return Err(FeedError::missing_element(name)),
                _ => {}
            }
        }
    }

    /// Records a non-fatal field problem.
    pub fn warn(&mut self, warning: FieldWarning) {
        tracing::warn!(warning = %warning, element = %self.current.name, "field left at default");
        self.warnings.push(warning);
    }

    pub fn into_warnings(self) -> Vec<FieldWarning> {
        self.warnings
    }
}

fn read_element<R>(reader: &NsReader<R>, e: &BytesStart<'_>) -> Result<Element, FeedError> {
    let (ns, local) = reader.resolve_element(e.name());
    let namespace = match ns {
        ResolveResult::Bound(ns) => String::from_utf8_lossy(ns.as_ref()).to_lowercase(),
        _ => String::new(),
    };
    let name = String::from_utf8_lossy(local.as_ref()).into_owned();

    let decoder = reader.decoder();
    let mut attributes = Vec::new();
    for attr in e.attributes() {
        let attr = match attr {
            Ok(attr) => attr,
            Err(err) => {
                tracing::warn!(error = %err, element = %name, "skipping malformed attribute");
                continue;
            }
        };
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = match attr.decode_and_unescape_value(decoder) {
            Ok(v) => v.into_owned(),
            Err(_) => String::from_utf8_lossy(&attr.value).into_owned(),
        };
        attributes.push((key, value));
    }

    Ok(Element {
        name,
        namespace,
        attributes,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cursor(xml: &str) -> Cursor<&[u8]> {
        Cursor::new(xml.as_bytes())
    }

    #[test]
    fn reports_namespace_lower_cased() {
        let mut c = cursor(r#"<root xmlns:a="HTTP://Example.COM/NS"><a:thing/></root>"#);
        c.seek_element("thing").unwrap();
        assert_eq!(c.name(), "thing");
        assert_eq!(c.namespace(), "http://example.com/ns");
    }

    #[test]
    fn unprefixed_element_has_empty_namespace() {
        let mut c = cursor("<root><link>x</link></root>");
        c.seek_element("link").unwrap();
        assert_eq!(c.namespace(), "");
    }

    #[test]
    fn empty_element_yields_start_then_end() {
        let mut c = cursor(r#"<a><b x="1"/></a>"#);
        assert_eq!(c.next_token().unwrap(), Token::StartElement);
        assert_eq!(c.next_token().unwrap(), Token::StartElement);
        assert_eq!(c.attribute("x"), "1");
        assert_eq!(c.attribute("missing"), "");
        assert_eq!(c.attributes(), &[("x".to_string(), "1".to_string())]);
        assert_eq!(c.next_token().unwrap(), Token::EndElement);
        assert_eq!(c.next_token().unwrap(), Token::EndElement);
        assert_eq!(c.next_token().unwrap(), Token::EndOfDocument);
    }

    #[test]
    fn element_text_joins_entities_and_cdata() {
        let mut c = cursor("<t>  Tom &amp; Jerry <![CDATA[<b>]]> &#65;  </t>");
        c.seek_element("t").unwrap();
        assert_eq!(c.read_element_text().unwrap(), "Tom & Jerry <b> A");
    }

    #[test]
    fn element_text_keeps_unknown_entities() {
        let mut c = cursor("<t>a&nbsp;b</t>");
        c.seek_element("t").unwrap();
        assert_eq!(c.read_element_text().unwrap(), "a&nbsp;b");
    }

    #[test]
    fn element_text_skips_child_elements() {
        let mut c = cursor("<r><t>one<i>two</i>three</t><u>after</u></r>");
        c.seek_element("t").unwrap();
        assert_eq!(c.read_element_text().unwrap(), "onethree");
        c.seek_element("u").unwrap();
        assert_eq!(c.read_element_text().unwrap(), "after");
    }

    #[test]
    fn skip_lands_after_matching_end() {
        let mut c = cursor("<r><x><x><y/>text</x></x><z>ok</z></r>");
        c.seek_element("x").unwrap();
        c.skip_current_element().unwrap();
        assert_eq!(c.next_token().unwrap(), Token::StartElement);
        assert_eq!(c.name(), "z");
    }

    #[test]
    fn skip_fails_on_truncated_input() {
        let mut c = cursor("<r><x><y>");
        c.seek_element("x").unwrap();
        assert!(c.skip_current_element().is_err());
    }

    #[test]
    fn seek_fails_when_element_missing() {
        let mut c = cursor("<rss><nochannel/></rss>");
        let err = c.seek_element("channel").unwrap_err();
        assert!(matches!(err, FeedError::Malformed(_)));
    }

    #[test]
    fn mismatched_tags_are_malformed() {
        let mut c = cursor("<a><b></a>");
        let mut result = Ok(Token::Text);
        for _ in 0..5 {
            result = c.next_token();
            if result.is_err() {
                break;
            }
        }
        assert!(matches!(result, Err(FeedError::Malformed(_))));
    }

    #[test]
    fn warnings_are_collected() {
        let mut c = cursor("<a/>");
        c.warn(FieldWarning::InvalidDuration("x".into()));
        assert_eq!(c.into_warnings().len(), 1);
    }
}
