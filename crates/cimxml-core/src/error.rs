//! Error types shared by the data model and the codec.

use std::fmt;

use thiserror::Error;

use crate::model::CimType;

/// Contract violation while building or manipulating data-model objects.
///
/// These never come from well-formed wire input on their own; the decoder
/// wraps them in [`DecodeError`] with the line that triggered them.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum ModelError {
    /// A second qualifier, property, method or parameter with the same name.
    #[error("{kind} \"{name}\" already exists")]
    AlreadyExists {
        /// Container member kind ("qualifier", "property", ...).
        kind: &'static str,
        /// The duplicated name.
        name: String,
    },
    /// Positional access past the end of a container.
    #[error("index {index} out of bounds (len {len})")]
    IndexOutOfBounds {
        /// Requested index.
        index: usize,
        /// Container length.
        len: usize,
    },
    /// Value type or array-ness does not match what the caller asked for.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        /// What the operation required.
        expected: TypeDesc,
        /// What the value actually is.
        found: TypeDesc,
    },
    /// Not a legal CIM identifier.
    #[error("invalid CIM name: \"{0}\"")]
    InvalidName(String),
    /// Not a legal namespace name.
    #[error("invalid namespace name: \"{0}\"")]
    InvalidNamespaceName(String),
    /// Object path string could not be parsed.
    #[error("malformed object path \"{path}\": {reason}")]
    MalformedObjectPath {
        /// The offending input.
        path: String,
        /// What went wrong.
        reason: String,
    },
    /// Datetime string is not a valid timestamp or interval.
    #[error("invalid datetime value: \"{0}\"")]
    InvalidDateTime(String),
    /// A key property is absent or null when building a path.
    #[error("key property \"{property}\" of class \"{class}\" has no value")]
    MissingKey {
        /// Class whose keys were being extracted.
        class: String,
        /// The missing key property.
        property: String,
    },
    /// A named class does not exist in the schema.
    #[error("no such class: \"{0}\"")]
    NoSuchClass(String),
    /// Superclass does not match the class being resolved.
    #[error("invalid superclass \"{superclass}\" for class \"{class}\"")]
    InvalidSuperclass {
        /// Class being resolved.
        class: String,
        /// Superclass that was given or named.
        superclass: String,
    },
    /// Reference-typed property or parameter without a reference class.
    #[error("reference \"{0}\" has no reference class")]
    ReferenceWithoutClass(String),
    /// A non-association class declares a reference property.
    #[error("non-association class \"{class}\" contains reference property \"{property}\"")]
    NonAssociationReference {
        /// Offending class.
        class: String,
        /// Reference property.
        property: String,
    },
}

/// A CIM type plus array-ness, used in [`ModelError::TypeMismatch`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TypeDesc {
    /// Scalar type.
    pub ty: CimType,
    /// Whether the value is an array.
    pub is_array: bool,
}

impl TypeDesc {
    /// Create a new type descriptor.
    #[must_use]
    pub const fn new(ty: CimType, is_array: bool) -> Self {
        Self { ty, is_array }
    }
}

impl fmt::Display for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_array {
            write!(f, "{}[]", self.ty)
        } else {
            write!(f, "{}", self.ty)
        }
    }
}

/// Which family of decode failure occurred.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DecodeErrorKind {
    /// Structural violation: wrong or missing tag, missing required attribute.
    Validation,
    /// Well-formed but invalid: bad name, out-of-range number, unknown type.
    Semantic,
    /// The tokenizer rejected the input as malformed XML.
    Xml,
    /// Building a data-model object failed.
    Model,
}

impl fmt::Display for DecodeErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Validation => write!(f, "validation error"),
            Self::Semantic => write!(f, "semantic error"),
            Self::Xml => write!(f, "XML error"),
            Self::Model => write!(f, "model error"),
        }
    }
}

/// A line-numbered decode failure.
///
/// `key` names the message in the localization catalog and `args` are its
/// substitution arguments; `message` is the default English rendering.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("{kind}: on line {line}: {message}")]
pub struct DecodeError {
    /// Error family.
    pub kind: DecodeErrorKind,
    /// 1-based source line.
    pub line: u32,
    /// Message catalog key.
    pub key: &'static str,
    /// Substitution arguments for the catalog message.
    pub args: Vec<String>,
    /// Default rendered message.
    pub message: String,
    /// Underlying model error, for [`DecodeErrorKind::Model`].
    #[source]
    pub source: Option<ModelError>,
}

impl DecodeError {
    /// Create a validation error.
    #[must_use]
    pub fn validation(line: u32, key: &'static str, message: String, args: Vec<String>) -> Self {
        Self {
            kind: DecodeErrorKind::Validation,
            line,
            key,
            args,
            message,
            source: None,
        }
    }

    /// Create a semantic error.
    #[must_use]
    pub fn semantic(line: u32, key: &'static str, message: String, args: Vec<String>) -> Self {
        Self {
            kind: DecodeErrorKind::Semantic,
            line,
            key,
            args,
            message,
            source: None,
        }
    }

    /// Create a tokenizer error.
    #[must_use]
    pub fn xml(line: u32, message: String) -> Self {
        Self {
            kind: DecodeErrorKind::Xml,
            line,
            key: "Common.XmlParser.MALFORMED",
            args: Vec::new(),
            message,
            source: None,
        }
    }

    /// Wrap a model error raised at `line`.
    #[must_use]
    pub fn model(line: u32, key: &'static str, error: ModelError) -> Self {
        Self {
            kind: DecodeErrorKind::Model,
            line,
            key,
            args: Vec::new(),
            message: format!("{error}"),
            source: Some(error),
        }
    }

    /// Whether this is a validation error.
    #[must_use]
    pub fn is_validation(&self) -> bool {
        self.kind == DecodeErrorKind::Validation
    }

    /// Whether this is a semantic error.
    #[must_use]
    pub fn is_semantic(&self) -> bool {
        self.kind == DecodeErrorKind::Semantic
    }
}
