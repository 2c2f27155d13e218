//! XML tokenizer.
//!
//! Turns CIM-XML text into a flat vector of structural tokens (tags,
//! content, CDATA) with line numbers and unescaped attributes. Character
//! level scanning is done by `quick-xml`; the decoder only sees
//! [`XmlEntry`] values.
//!
//! Comments, processing instructions and `DOCTYPE` are dropped. Content is
//! trimmed and whitespace-only content is dropped.

mod token;

pub use token::{Attribute, EntryKind, XmlEntry};

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;

use crate::error::DecodeError;

/// XML tokenizer over one source string.
pub struct Lexer<'src> {
    /// Source text being tokenized.
    source: &'src str,
    /// Underlying pull parser.
    reader: Reader<&'src [u8]>,
    /// Line number at `counted`.
    line: u32,
    /// Byte offset up to which newlines have been counted.
    counted: usize,
}

impl<'src> Lexer<'src> {
    /// Create a new lexer for the given source text.
    #[must_use]
    pub fn new(source: &'src str) -> Self {
        let mut reader = Reader::from_str(source);
        reader.trim_text(true);
        Self {
            source,
            reader,
            line: 1,
            counted: 0,
        }
    }

    /// Tokenize the entire source.
    ///
    /// # Errors
    ///
    /// Returns an XML error for malformed markup, such as mismatched end
    /// tags or bad escapes.
    pub fn tokenize(mut self) -> Result<Vec<XmlEntry>, DecodeError> {
        let mut entries = Vec::new();
        while let Some(entry) = self.next_entry()? {
            entries.push(entry);
        }

        #[cfg(feature = "tracing")]
        tracing::trace!(tokens = entries.len(), lines = self.line, "lexer: done");

        Ok(entries)
    }

    /// Get the next token, `None` at end of input.
    fn next_entry(&mut self) -> Result<Option<XmlEntry>, DecodeError> {
        loop {
            let event = self.reader.read_event();
            let line = self.advance_line();
            let event = event.map_err(|e| DecodeError::xml(line, e.to_string()))?;

            let entry = match event {
                Event::Decl(_) => XmlEntry::new(EntryKind::XmlDeclaration, "xml", line),
                Event::Start(e) => self.tag(EntryKind::StartTag, &e, line)?,
                Event::Empty(e) => self.tag(EntryKind::EmptyTag, &e, line)?,
                Event::End(e) => {
                    let name = utf8(e.name().as_ref(), line)?;
                    XmlEntry::new(EntryKind::EndTag, name, line)
                }
                Event::Text(t) => {
                    let text = t
                        .unescape()
                        .map_err(|e| DecodeError::xml(line, e.to_string()))?;
                    if text.is_empty() {
                        continue;
                    }
                    XmlEntry::new(EntryKind::Content, text.into_owned(), line)
                }
                Event::CData(c) => {
                    let text = utf8(&c.into_inner(), line)?;
                    XmlEntry::new(EntryKind::CData, text, line)
                }
                Event::Eof => return Ok(None),
                Event::Comment(_) | Event::PI(_) | Event::DocType(_) => continue,
            };
            return Ok(Some(entry));
        }
    }

    /// Build a tag token with its attributes.
    fn tag(&self, kind: EntryKind, e: &BytesStart<'_>, line: u32) -> Result<XmlEntry, DecodeError> {
        let mut entry = XmlEntry::new(kind, utf8(e.name().as_ref(), line)?, line);
        for attr in e.attributes() {
            let attr = attr.map_err(|err| DecodeError::xml(line, err.to_string()))?;
            let name = utf8(attr.key.as_ref(), line)?;
            let value = attr
                .unescape_value()
                .map_err(|err| DecodeError::xml(line, err.to_string()))?;
            entry.attributes.push(Attribute {
                name,
                value: value.into_owned(),
            });
        }
        Ok(entry)
    }

    /// Count newlines consumed since the last call and return the line.
    fn advance_line(&mut self) -> u32 {
        let pos = self.reader.buffer_position().min(self.source.len());
        if pos > self.counted {
            let newlines = self.source.as_bytes()[self.counted..pos]
                .iter()
                .filter(|&&b| b == b'\n')
                .count();
            self.line = self
                .line
                .saturating_add(u32::try_from(newlines).unwrap_or(u32::MAX));
            self.counted = pos;
        }
        self.line
    }
}

fn utf8(bytes: &[u8], line: u32) -> Result<String, DecodeError> {
    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(|e| DecodeError::xml(line, e.to_string()))
}

/// Tokenize a source string.
///
/// # Errors
///
/// Returns an XML error for malformed markup.
pub fn tokenize(source: &str) -> Result<Vec<XmlEntry>, DecodeError> {
    Lexer::new(source).tokenize()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<EntryKind> {
        tokenize(source).unwrap().into_iter().map(|e| e.kind).collect()
    }

    #[test]
    fn test_structure() {
        assert_eq!(
            kinds(r#"<?xml version="1.0"?><CIM><VALUE>x</VALUE><VALUE/></CIM>"#),
            vec![
                EntryKind::XmlDeclaration,
                EntryKind::StartTag,
                EntryKind::StartTag,
                EntryKind::Content,
                EntryKind::EndTag,
                EntryKind::EmptyTag,
                EntryKind::EndTag,
            ]
        );
    }

    #[test]
    fn test_attributes_unescaped() {
        let entries = tokenize(r#"<PROPERTY NAME="A" TYPE="string" DESC="a &amp; &quot;b&quot;"/>"#)
            .unwrap();
        let e = &entries[0];
        assert!(e.is_open("PROPERTY"));
        assert!(e.is_empty_tag());
        assert_eq!(e.attribute("NAME"), Some("A"));
        assert_eq!(e.attribute("DESC"), Some("a & \"b\""));
        assert_eq!(e.attribute("name"), None);
    }

    #[test]
    fn test_content_trimmed_and_unescaped() {
        let entries = tokenize("<VALUE>\n   &lt;CLASS&gt; x  \n</VALUE>").unwrap();
        assert_eq!(entries[1].kind, EntryKind::Content);
        assert_eq!(entries[1].text, "<CLASS> x");
    }

    #[test]
    fn test_whitespace_and_comments_dropped() {
        assert_eq!(
            kinds("<A>\n  <!-- note -->\n  <B/>\n</A>"),
            vec![EntryKind::StartTag, EntryKind::EmptyTag, EntryKind::EndTag]
        );
    }

    #[test]
    fn test_cdata_verbatim() {
        let entries = tokenize("<VALUE><![CDATA[a < b & c]]></VALUE>").unwrap();
        assert_eq!(entries[1].kind, EntryKind::CData);
        assert_eq!(entries[1].text, "a < b & c");
    }

    #[test]
    fn test_line_numbers() {
        let entries = tokenize("<A>\n<B/>\n\n<C/>\n</A>").unwrap();
        let lines: Vec<u32> = entries.iter().map(|e| e.line).collect();
        assert_eq!(lines, vec![1, 2, 4, 5]);
    }

    #[test]
    fn test_mismatched_end_tag() {
        let err = tokenize("<A>\n<B></A>").unwrap_err();
        assert_eq!(err.kind, crate::error::DecodeErrorKind::Xml);
        assert_eq!(err.line, 2);
    }
}
