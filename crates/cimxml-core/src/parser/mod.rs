//! CIM-XML decoder.
//!
//! A recursive-descent reader over the token vector produced by the
//! [lexer](crate::lexer). Grammar functions come in two shapes:
//!
//! - `*_element` functions return `Ok(None)` without consuming anything
//!   when the next token does not start their element, so alternatives can
//!   be tried in turn.
//! - `expect_*` functions fail with a validation error naming the element
//!   they wanted.
//!
//! Any error unwinds the whole decode; there is no recovery inside an
//! element. Embedded objects (XML carried as the text of a string value)
//! are decoded by a nested [`Decoder`] over just that text.

mod message;
mod object;
mod path;
mod value;

use crate::convert::{check_uint_bounds, parse_unsigned};
use crate::error::DecodeError;
use crate::lexer::{tokenize, EntryKind, XmlEntry};
use crate::message::{Declaration, Message};
use crate::model::{CimClass, CimInstance, CimName, CimObject, CimType, CimValue, QualifierDecl};
use crate::options::DecodeOptions;

/// CIM-XML decoder over one document.
pub struct Decoder {
    /// Tokens from the lexer.
    tokens: Vec<XmlEntry>,
    /// Current position in the token vector.
    pos: usize,
    /// Decode limits.
    options: DecodeOptions,
    /// Embedded object nesting level, 0 for the outer document.
    depth: usize,
}

impl Decoder {
    /// Tokenize `source` and create a decoder with default limits.
    ///
    /// # Errors
    ///
    /// Returns an XML error if the source is not well-formed.
    pub fn new(source: &str) -> Result<Self, DecodeError> {
        Self::with_options(source, DecodeOptions::default())
    }

    /// Tokenize `source` and create a decoder with the given limits.
    ///
    /// # Errors
    ///
    /// Returns an XML error if the source is not well-formed.
    pub fn with_options(source: &str, options: DecodeOptions) -> Result<Self, DecodeError> {
        Ok(Self::from_tokens(tokenize(source)?, options))
    }

    /// Create a decoder over already tokenized input.
    #[must_use]
    pub fn from_tokens(tokens: Vec<XmlEntry>, options: DecodeOptions) -> Self {
        Self {
            tokens,
            pos: 0,
            options,
            depth: 0,
        }
    }

    /// Embedded object nesting level of this decoder.
    #[must_use]
    pub const fn depth(&self) -> usize {
        self.depth
    }

    /// Create a decoder for an embedded object found at `line`.
    fn nested(&self, source: &str, line: u32) -> Result<Self, DecodeError> {
        let depth = self.depth + 1;
        if depth > self.options.max_embedded_depth {
            return Err(DecodeError::validation(
                line,
                "Common.XmlReader.EMBEDDED_DEPTH_EXCEEDED",
                format!(
                    "embedded objects nested deeper than {} levels",
                    self.options.max_embedded_depth
                ),
                vec![self.options.max_embedded_depth.to_string()],
            ));
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(depth, line, "decoder: embedded object");

        Ok(Self {
            tokens: tokenize(source)?,
            pos: 0,
            options: self.options.clone(),
            depth,
        })
    }

    // === Token access methods ===

    /// Check if all tokens are consumed.
    #[must_use]
    pub fn is_eof(&self) -> bool {
        self.pos >= self.tokens.len()
    }

    /// Peek at the current token.
    fn peek(&self) -> Option<&XmlEntry> {
        self.tokens.get(self.pos)
    }

    /// Advance and return the current token.
    fn advance(&mut self) -> Option<XmlEntry> {
        let entry = self.tokens.get(self.pos).cloned();
        if entry.is_some() {
            self.pos += 1;
        }
        entry
    }

    /// Line of the last consumed token.
    fn line(&self) -> u32 {
        self.pos
            .checked_sub(1)
            .and_then(|i| self.tokens.get(i))
            .map_or(1, |e| e.line)
    }

    /// Line of the next token, or of the last one at end of input.
    fn next_line(&self) -> u32 {
        self.peek().map_or_else(|| self.line(), |e| e.line)
    }

    /// Check if the current token is a tag of `kind` named `name`.
    fn check_tag(&self, kind: EntryKind, name: &str) -> bool {
        self.peek().is_some_and(|e| e.kind == kind && e.text == name)
    }

    // === Tag helpers ===

    /// Consume `<name>` if it is next.
    fn test_start_tag(&mut self, name: &str) -> Option<XmlEntry> {
        if self.check_tag(EntryKind::StartTag, name) {
            self.advance()
        } else {
            None
        }
    }

    /// Consume `<name>` or `<name/>` if it is next.
    fn test_start_or_empty(&mut self, name: &str) -> Option<XmlEntry> {
        if self.peek().is_some_and(|e| e.is_open(name)) {
            self.advance()
        } else {
            None
        }
    }

    /// Consume `</name>` if it is next.
    fn test_end_tag(&mut self, name: &str) -> bool {
        if self.check_tag(EntryKind::EndTag, name) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Consume content or CDATA if it is next.
    fn test_content(&mut self) -> Option<String> {
        match self.peek() {
            Some(e) if matches!(e.kind, EntryKind::Content | EntryKind::CData) => {
                self.advance().map(|e| e.text)
            }
            _ => None,
        }
    }

    /// Consume `<name>`.
    fn expect_start_tag(&mut self, name: &str) -> Result<XmlEntry, DecodeError> {
        self.test_start_tag(name).ok_or_else(|| {
            DecodeError::validation(
                self.next_line(),
                "Common.XmlReader.EXPECTED_OPEN",
                format!("Expected open of {name} element"),
                vec![name.into()],
            )
        })
    }

    /// Consume `</name>`.
    fn expect_end_tag(&mut self, name: &str) -> Result<(), DecodeError> {
        if self.test_end_tag(name) {
            return Ok(());
        }
        let got = self.peek().map_or_else(|| "end of input".to_owned(), describe);
        Err(DecodeError::validation(
            self.next_line(),
            "Common.XmlReader.EXPECTED_CLOSE",
            format!("Expected close of {name} element, got {got} instead"),
            vec![name.into(), got],
        ))
    }

    /// Consume `<?xml ...?>` if it is next.
    fn test_xml_declaration(&mut self) -> bool {
        if self
            .peek()
            .is_some_and(|e| e.kind == EntryKind::XmlDeclaration)
        {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Fail unless every token has been consumed.
    ///
    /// # Errors
    ///
    /// Returns a validation error naming the first unconsumed token.
    pub fn expect_end_of_input(&self) -> Result<(), DecodeError> {
        match self.peek() {
            None => Ok(()),
            Some(entry) => Err(DecodeError::validation(
                entry.line,
                "Common.XmlReader.UNEXPECTED_TRAILING_CONTENT",
                format!("unexpected {} after end of document", describe(entry)),
                vec![describe(entry)],
            )),
        }
    }
}

// === Documents ===

/// Decode one complete document with `read`.
///
/// An optional `<?xml ...?>` declaration is skipped first and nothing may
/// follow the element `read` consumes.
///
/// # Errors
///
/// Returns the first XML, validation or semantic error found.
pub fn decode_document<T>(
    source: &str,
    options: DecodeOptions,
    read: impl FnOnce(&mut Decoder) -> Result<T, DecodeError>,
) -> Result<T, DecodeError> {
    let mut decoder = Decoder::with_options(source, options)?;
    decoder.test_xml_declaration();
    let result = read(&mut decoder).and_then(|value| {
        decoder.expect_end_of_input()?;
        Ok(value)
    });

    #[cfg(feature = "tracing")]
    if let Err(e) = &result {
        tracing::debug!(line = e.line, key = e.key, "decoder: failed");
    }

    result
}

/// Decode a `CIM` document holding a `MESSAGE`.
///
/// # Errors
///
/// See [`decode_document`].
pub fn decode_message(source: &str) -> Result<Message, DecodeError> {
    decode_document(source, DecodeOptions::default(), Decoder::expect_message)
}

/// Decode a `CIM` document holding a `DECLARATION`.
///
/// # Errors
///
/// See [`decode_document`].
pub fn decode_declaration(source: &str) -> Result<Declaration, DecodeError> {
    decode_document(source, DecodeOptions::default(), Decoder::expect_declaration)
}

/// Decode a standalone `CLASS` element.
///
/// # Errors
///
/// See [`decode_document`].
pub fn decode_class(source: &str) -> Result<CimClass, DecodeError> {
    decode_document(source, DecodeOptions::default(), Decoder::expect_class)
}

/// Decode a standalone `INSTANCE` element.
///
/// # Errors
///
/// See [`decode_document`].
pub fn decode_instance(source: &str) -> Result<CimInstance, DecodeError> {
    decode_document(source, DecodeOptions::default(), Decoder::expect_instance)
}

/// Decode a standalone `CLASS` or `INSTANCE` element.
///
/// # Errors
///
/// See [`decode_document`].
pub fn decode_object(source: &str) -> Result<CimObject, DecodeError> {
    decode_document(source, DecodeOptions::default(), Decoder::expect_object)
}

/// Decode a standalone `QUALIFIER.DECLARATION` element.
///
/// # Errors
///
/// See [`decode_document`].
pub fn decode_qualifier_decl(source: &str) -> Result<QualifierDecl, DecodeError> {
    decode_document(source, DecodeOptions::default(), Decoder::expect_qualifier_decl)
}

/// Decode a standalone value element of type `ty`.
///
/// # Errors
///
/// See [`decode_document`].
pub fn decode_value(source: &str, ty: CimType) -> Result<CimValue, DecodeError> {
    decode_document(source, DecodeOptions::default(), |d| d.expect_value(ty))
}

/// How an `EmbeddedObject` marker reinterprets a string value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Embedded {
    /// Plain string.
    No,
    /// An embedded class or instance.
    Object,
    /// An embedded instance.
    Instance,
}

impl Embedded {
    /// The type a string value decodes to under this marker.
    const fn effective_type(self, ty: CimType) -> CimType {
        match self {
            Self::No => ty,
            Self::Object => CimType::Object,
            Self::Instance => CimType::Instance,
        }
    }
}

/// Short description of a token for error messages.
fn describe(entry: &XmlEntry) -> String {
    match entry.kind {
        EntryKind::XmlDeclaration => "XML declaration".into(),
        EntryKind::StartTag => format!("<{}>", entry.text),
        EntryKind::EndTag => format!("</{}>", entry.text),
        EntryKind::EmptyTag => format!("<{}/>", entry.text),
        EntryKind::Content | EntryKind::CData => "content".into(),
    }
}

// === Attribute helpers ===

fn missing_attribute(entry: &XmlEntry, element: &str, attr: &str) -> DecodeError {
    let arg = format!("{element}.{attr}");
    DecodeError::validation(
        entry.line,
        "Common.XmlReader.MISSING_ATTRIBUTE",
        format!("missing {arg} attribute"),
        vec![arg],
    )
}

fn illegal_attribute(entry: &XmlEntry, element: &str, attr: &str) -> DecodeError {
    let arg = format!("{element}.{attr}");
    DecodeError::semantic(
        entry.line,
        "Common.XmlReader.ILLEGAL_VALUE_FOR_ATTRIBUTE",
        format!("Illegal value for {arg} attribute"),
        vec![arg],
    )
}

/// Get a required attribute that has its own message key.
fn required_attr<'e>(
    entry: &'e XmlEntry,
    attr: &str,
    key: &'static str,
    message: &str,
) -> Result<&'e str, DecodeError> {
    entry
        .attribute(attr)
        .ok_or_else(|| DecodeError::validation(entry.line, key, message.into(), Vec::new()))
}

/// Get the required `NAME` attribute as a CIM name.
fn name_attr(entry: &XmlEntry, element: &str) -> Result<CimName, DecodeError> {
    required_name(entry, element, "NAME")
}

/// Get the required `CLASSNAME` attribute.
fn class_name_attr(entry: &XmlEntry, element: &str) -> Result<CimName, DecodeError> {
    required_name(entry, element, "CLASSNAME")
}

fn required_name(entry: &XmlEntry, element: &str, attr: &str) -> Result<CimName, DecodeError> {
    let value = entry
        .attribute(attr)
        .ok_or_else(|| missing_attribute(entry, element, attr))?;
    CimName::new(value).map_err(|_| illegal_attribute(entry, element, attr))
}

/// Get an optional name attribute (`CLASSORIGIN`, `REFERENCECLASS`,
/// `SUPERCLASS`). Absent or empty gives the null name.
fn optional_name_attr(entry: &XmlEntry, element: &str, attr: &str) -> Result<CimName, DecodeError> {
    match entry.attribute(attr) {
        None | Some("") => Ok(CimName::null()),
        Some(value) => CimName::new(value).map_err(|_| illegal_attribute(entry, element, attr)),
    }
}

/// Get a `TYPE` or `PARAMTYPE` attribute.
///
/// `reference` is only a legal value of `PARAMTYPE`; properties and
/// qualifiers say so through their element name instead.
fn type_attr(
    entry: &XmlEntry,
    element: &str,
    attr: &str,
    required: bool,
) -> Result<Option<CimType>, DecodeError> {
    let Some(value) = entry.attribute(attr) else {
        return if required {
            Err(missing_attribute(entry, element, attr))
        } else {
            Ok(None)
        };
    };
    match CimType::from_wire_name(value) {
        Some(CimType::Reference) if attr != "PARAMTYPE" => Err(illegal_attribute(entry, element, attr)),
        Some(ty) => Ok(Some(ty)),
        None => Err(illegal_attribute(entry, element, attr)),
    }
}

/// Get the required `TYPE` attribute.
fn required_type_attr(entry: &XmlEntry, element: &str) -> Result<CimType, DecodeError> {
    type_attr(entry, element, "TYPE", true)?.ok_or_else(|| missing_attribute(entry, element, "TYPE"))
}

/// Get an optional `true`/`false` attribute.
fn bool_attr(entry: &XmlEntry, element: &str, attr: &str, default: bool) -> Result<bool, DecodeError> {
    match entry.attribute(attr) {
        None => Ok(default),
        Some("true") => Ok(true),
        Some("false") => Ok(false),
        Some(_) => {
            let arg = format!("{attr}.{element}");
            Err(DecodeError::semantic(
                entry.line,
                "Common.XmlReader.INVALID_ATTRIBUTE",
                format!("Invalid {arg} attribute value"),
                vec![arg],
            ))
        }
    }
}

/// Get the `ARRAYSIZE` attribute, 0 if absent.
fn array_size_attr(entry: &XmlEntry, element: &str) -> Result<u32, DecodeError> {
    let Some(value) = entry.attribute("ARRAYSIZE") else {
        return Ok(0);
    };
    let illegal = || {
        let arg = format!("{element}.ARRAYSIZE");
        DecodeError::semantic(
            entry.line,
            "Common.XmlReader.ILLEGAL_VALUE",
            format!("Illegal value for {arg}"),
            vec![arg],
        )
    };
    match parse_unsigned(value) {
        Some(size) if size != 0 && check_uint_bounds(size, CimType::Uint32) => {
            u32::try_from(size).map_err(|_| illegal())
        }
        _ => Err(illegal()),
    }
}

/// Get the `EmbeddedObject` (or `EMBEDDEDOBJECT`) attribute.
fn embedded_attr(entry: &XmlEntry, element: &str) -> Result<Embedded, DecodeError> {
    let (attr, value) = match (entry.attribute("EmbeddedObject"), entry.attribute("EMBEDDEDOBJECT")) {
        (Some(v), _) => ("EmbeddedObject", v),
        (None, Some(v)) => ("EMBEDDEDOBJECT", v),
        (None, None) => return Ok(Embedded::No),
    };
    match value {
        "object" => Ok(Embedded::Object),
        "instance" => Ok(Embedded::Instance),
        _ => Err(illegal_attribute(entry, element, attr)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DecodeErrorKind;

    fn entry(source: &str) -> XmlEntry {
        tokenize(source).unwrap().remove(0)
    }

    #[test]
    fn test_tag_helpers() {
        let mut d = Decoder::new("<A>\n<B/>\n</A>").unwrap();
        assert!(d.test_start_tag("B").is_none());
        assert!(d.expect_start_tag("A").is_ok());
        assert!(d.test_start_tag("B").is_none());
        assert!(d.test_start_or_empty("B").is_some());

        let err = d.expect_end_tag("B").unwrap_err();
        assert_eq!(err.key, "Common.XmlReader.EXPECTED_CLOSE");
        assert_eq!(err.args, vec!["B".to_string(), "</A>".to_string()]);
        assert_eq!(err.line, 3);

        d.expect_end_tag("A").unwrap();
        assert!(d.is_eof());
        d.expect_end_of_input().unwrap();
    }

    #[test]
    fn test_expect_open_error() {
        let mut d = Decoder::new("<A/>").unwrap();
        let err = d.expect_start_tag("CLASS").unwrap_err();
        assert_eq!(err.kind, DecodeErrorKind::Validation);
        assert_eq!(err.key, "Common.XmlReader.EXPECTED_OPEN");
        assert_eq!(err.message, "Expected open of CLASS element");
    }

    #[test]
    fn test_decode_document_bounds() {
        let value = decode_value("<?xml version=\"1.0\"?>\n<VALUE>7</VALUE>", CimType::Uint8).unwrap();
        assert_eq!(value, CimValue::from(7u8));

        let err = decode_value("<VALUE>7</VALUE>\n<VALUE>8</VALUE>", CimType::Uint8).unwrap_err();
        assert_eq!(err.key, "Common.XmlReader.UNEXPECTED_TRAILING_CONTENT");
        assert_eq!(err.line, 2);
    }

    #[test]
    fn test_name_attributes() {
        let e = entry(r#"<PROPERTY NAME="Size" CLASSORIGIN="" REFERENCECLASS="9bad"/>"#);
        assert_eq!(name_attr(&e, "PROPERTY").unwrap().as_str(), "Size");
        assert!(optional_name_attr(&e, "PROPERTY", "CLASSORIGIN").unwrap().is_null());
        assert!(optional_name_attr(&e, "PROPERTY", "SUPERCLASS").unwrap().is_null());

        let err = optional_name_attr(&e, "PROPERTY", "REFERENCECLASS").unwrap_err();
        assert!(err.is_semantic());

        let err = class_name_attr(&e, "INSTANCE").unwrap_err();
        assert!(err.is_validation());
        assert_eq!(err.args, vec!["INSTANCE.CLASSNAME".to_string()]);
    }

    #[test]
    fn test_type_attribute() {
        let e = entry(r#"<PARAMVALUE TYPE="reference" PARAMTYPE="reference"/>"#);
        assert_eq!(
            type_attr(&e, "PARAMVALUE", "PARAMTYPE", false).unwrap(),
            Some(CimType::Reference)
        );
        assert!(type_attr(&e, "PARAMVALUE", "TYPE", true).unwrap_err().is_semantic());

        let e = entry(r#"<PROPERTY TYPE="object"/>"#);
        assert!(required_type_attr(&e, "PROPERTY").unwrap_err().is_semantic());

        let e = entry("<PROPERTY/>");
        assert!(required_type_attr(&e, "PROPERTY").unwrap_err().is_validation());
        assert_eq!(type_attr(&e, "PROPERTY", "TYPE", false).unwrap(), None);
    }

    #[test]
    fn test_boolean_and_size_attributes() {
        let e = entry(r#"<QUALIFIER PROPAGATED="TRUE" ISARRAY="true" ARRAYSIZE="0x10"/>"#);
        assert!(bool_attr(&e, "QUALIFIER", "ISARRAY", false).unwrap());
        assert!(!bool_attr(&e, "QUALIFIER", "OVERRIDABLE", false).unwrap());
        let err = bool_attr(&e, "QUALIFIER", "PROPAGATED", false).unwrap_err();
        assert_eq!(err.key, "Common.XmlReader.INVALID_ATTRIBUTE");
        assert_eq!(array_size_attr(&e, "QUALIFIER").unwrap(), 16);

        let e = entry(r#"<PROPERTY.ARRAY ARRAYSIZE="0"/>"#);
        assert!(array_size_attr(&e, "PROPERTY.ARRAY").is_err());
        let e = entry(r#"<PROPERTY.ARRAY ARRAYSIZE="4294967296"/>"#);
        assert!(array_size_attr(&e, "PROPERTY.ARRAY").is_err());
    }

    #[test]
    fn test_embedded_attribute() {
        let e = entry(r#"<PROPERTY EMBEDDEDOBJECT="instance"/>"#);
        assert_eq!(embedded_attr(&e, "PROPERTY").unwrap(), Embedded::Instance);
        let e = entry(r#"<PROPERTY EmbeddedObject="object"/>"#);
        assert_eq!(embedded_attr(&e, "PROPERTY").unwrap(), Embedded::Object);
        let e = entry(r#"<PROPERTY EmbeddedObject="Object"/>"#);
        assert!(embedded_attr(&e, "PROPERTY").unwrap_err().is_semantic());
        let e = entry("<PROPERTY/>");
        assert_eq!(embedded_attr(&e, "PROPERTY").unwrap(), Embedded::No);
    }

    #[test]
    fn test_embedded_depth_limit() {
        let d = Decoder::with_options("<A/>", DecodeOptions::default().with_max_embedded_depth(0))
            .unwrap();
        let err = d.nested("<INSTANCE CLASSNAME=\"X\"/>", 7).err().unwrap();
        assert_eq!(err.key, "Common.XmlReader.EMBEDDED_DEPTH_EXCEEDED");
        assert_eq!(err.line, 7);
    }
}
