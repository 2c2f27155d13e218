//! CIM-XML encoder.
//!
//! The mirror of the [decoder](crate::parser): every model type the
//! decoder produces can be written back out, one tag per line. Writing
//! cannot fail; the output of any encode function decodes back to an
//! equal value (up to information the wire format does not carry).

mod message;
mod object;
mod value;

use std::borrow::Cow;

use quick_xml::escape::escape;

use crate::message::{Declaration, Message};
use crate::model::{CimClass, CimInstance, CimObject, CimValue, ObjectPath, QualifierDecl};
use crate::options::WriteOptions;

/// The `<?xml ...?>` line opening message and declaration documents.
pub const XML_DECLARATION: &str = "<?xml version=\"1.0\" encoding=\"utf-8\" ?>";

// === Tags ===

/// A start or empty tag under construction.
#[derive(Debug)]
struct Tag {
    name: &'static str,
    text: String,
}

impl Tag {
    fn new(name: &'static str) -> Self {
        let mut text = String::with_capacity(64);
        text.push('<');
        text.push_str(name);
        Self { name, text }
    }

    /// Append `name="value"`, escaping the value.
    fn attr(mut self, name: &str, value: &str) -> Self {
        self.text.push(' ');
        self.text.push_str(name);
        self.text.push_str("=\"");
        self.text.push_str(&escape(value));
        self.text.push('"');
        self
    }

    fn attr_if(self, cond: bool, name: &str, value: &str) -> Self {
        if cond {
            self.attr(name, value)
        } else {
            self
        }
    }
}

// === Writer ===

/// Line-oriented XML output buffer.
#[derive(Debug, Default)]
pub struct XmlWriter {
    out: String,
    options: WriteOptions,
}

impl XmlWriter {
    /// Create a writer with default options.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a writer that filters classes and instances by `options`.
    #[must_use]
    pub fn with_options(options: WriteOptions) -> Self {
        Self {
            out: String::new(),
            options,
        }
    }

    /// Take the output.
    #[must_use]
    pub fn finish(self) -> String {
        self.out
    }

    fn start(&mut self, tag: Tag) {
        self.out.push_str(&tag.text);
        self.out.push_str(">\n");
    }

    fn empty(&mut self, tag: Tag) {
        self.out.push_str(&tag.text);
        self.out.push_str("/>\n");
    }

    fn end(&mut self, name: &str) {
        self.out.push_str("</");
        self.out.push_str(name);
        self.out.push_str(">\n");
    }

    /// `<name>text</name>` on one line.
    fn text_element(&mut self, tag: Tag, text: &str) {
        self.out.push_str(&tag.text);
        self.out.push('>');
        self.out.push_str(&escape_text(text));
        self.out.push_str("</");
        self.out.push_str(tag.name);
        self.out.push_str(">\n");
    }
}

/// Escape element content so the lexer reads it back unchanged.
///
/// `< > & " '` become entities and control characters become character
/// references. A leading space, a trailing space and the second of two
/// adjacent spaces are written as `&#32;`, since the lexer trims text.
/// NUL has no XML 1.0 form and is dropped.
#[must_use]
pub fn escape_text(text: &str) -> Cow<'_, str> {
    let plain = !text.starts_with(' ')
        && !text.ends_with(' ')
        && !text.contains("  ")
        && !text
            .bytes()
            .any(|b| b < 0x20 || matches!(b, b'<' | b'>' | b'&' | b'"' | b'\''));
    if plain {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len() + 16);
    let mut prev_space = false;
    for (i, c) in text.char_indices() {
        match c {
            ' ' if i == 0 || prev_space || i + 1 == text.len() => out.push_str("&#32;"),
            ' ' => out.push(' '),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '&' => out.push_str("&amp;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            '\0' => {}
            c if c < ' ' => {
                out.push_str("&#");
                out.push_str(&u32::from(c).to_string());
                out.push(';');
            }
            c => out.push(c),
        }
        prev_space = out.ends_with(' ');
    }
    Cow::Owned(out)
}

// === Entry points ===

/// Encode a complete message document.
#[must_use]
pub fn encode_message(message: &Message) -> String {
    let mut w = XmlWriter::new();
    w.message(message);

    #[cfg(feature = "tracing")]
    tracing::trace!(id = %message.id, len = w.out.len(), "writer: MESSAGE");

    w.finish()
}

/// Encode a complete declaration document.
#[must_use]
pub fn encode_declaration(declaration: &Declaration) -> String {
    let mut w = XmlWriter::new();
    w.declaration(declaration);
    w.finish()
}

/// Encode a `CLASS` element.
#[must_use]
pub fn encode_class(class: &CimClass) -> String {
    encode_class_with(class, &WriteOptions::default())
}

/// Encode a `CLASS` element with `options` applied.
#[must_use]
pub fn encode_class_with(class: &CimClass, options: &WriteOptions) -> String {
    let mut w = XmlWriter::with_options(options.clone());
    w.class(class);
    w.finish()
}

/// Encode an `INSTANCE` element.
#[must_use]
pub fn encode_instance(instance: &CimInstance) -> String {
    encode_instance_with(instance, &WriteOptions::default())
}

/// Encode an `INSTANCE` element with `options` applied.
#[must_use]
pub fn encode_instance_with(instance: &CimInstance, options: &WriteOptions) -> String {
    let mut w = XmlWriter::with_options(options.clone());
    w.instance(instance);
    w.finish()
}

/// Encode a `CLASS` or `INSTANCE` element.
#[must_use]
pub fn encode_object(object: &CimObject) -> String {
    encode_object_with(object, &WriteOptions::default())
}

/// Encode a `CLASS` or `INSTANCE` element with `options` applied.
#[must_use]
pub fn encode_object_with(object: &CimObject, options: &WriteOptions) -> String {
    let mut w = XmlWriter::with_options(options.clone());
    w.object(object);
    w.finish()
}

/// Encode a `QUALIFIER.DECLARATION` element.
#[must_use]
pub fn encode_qualifier_decl(decl: &QualifierDecl) -> String {
    let mut w = XmlWriter::new();
    w.qualifier_decl(decl);
    w.finish()
}

/// Encode a value as `VALUE`, `VALUE.ARRAY`, `VALUE.REFERENCE` or
/// `VALUE.REFARRAY`. Nulls encode as nothing.
#[must_use]
pub fn encode_value(value: &CimValue) -> String {
    let mut w = XmlWriter::new();
    w.value(value);
    w.finish()
}

/// Encode a path as `VALUE.REFERENCE`.
#[must_use]
pub fn encode_reference(path: &ObjectPath) -> String {
    let mut w = XmlWriter::new();
    w.value_reference(path);
    w.finish()
}
