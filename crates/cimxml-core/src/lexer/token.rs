//! Structural XML tokens.

/// Token kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntryKind {
    /// `<?xml ...?>`.
    XmlDeclaration,
    /// `<NAME ...>`.
    StartTag,
    /// `</NAME>`.
    EndTag,
    /// `<NAME .../>`.
    EmptyTag,
    /// Character data between tags, unescaped and trimmed.
    Content,
    /// `<![CDATA[...]]>`, verbatim.
    CData,
}

/// One `name="value"` attribute, value unescaped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Attribute {
    /// Attribute name.
    pub name: String,
    /// Unescaped value.
    pub value: String,
}

/// One structural token.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct XmlEntry {
    /// The kind of token.
    pub kind: EntryKind,
    /// Tag name for tags, text for content and CDATA.
    pub text: String,
    /// 1-based source line where the token ends.
    pub line: u32,
    /// Attributes, in source order. Empty for non-tags.
    pub attributes: Vec<Attribute>,
}

impl XmlEntry {
    /// Create a token with no attributes.
    #[must_use]
    pub fn new(kind: EntryKind, text: impl Into<String>, line: u32) -> Self {
        Self {
            kind,
            text: text.into(),
            line,
            attributes: Vec::new(),
        }
    }

    /// Look up an attribute value by exact name.
    #[must_use]
    pub fn attribute(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Check for a start or empty tag named `name`.
    #[must_use]
    pub fn is_open(&self, name: &str) -> bool {
        matches!(self.kind, EntryKind::StartTag | EntryKind::EmptyTag) && self.text == name
    }

    /// Check for an empty tag.
    #[must_use]
    pub fn is_empty_tag(&self) -> bool {
        self.kind == EntryKind::EmptyTag
    }
}
