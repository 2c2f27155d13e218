//! CIM type enumeration.

use std::fmt;

/// CIM data type.
///
/// `Object` and `Instance` describe embedded objects carried inside string
/// values. They never appear in a wire `TYPE` attribute; the decoder infers
/// them from an `EmbeddedObject`/`EmbeddedInstance` marker.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CimType {
    /// Boolean.
    Boolean,
    /// Unsigned 8-bit integer.
    Uint8,
    /// Signed 8-bit integer.
    Sint8,
    /// Unsigned 16-bit integer.
    Uint16,
    /// Signed 16-bit integer.
    Sint16,
    /// Unsigned 32-bit integer.
    Uint32,
    /// Signed 32-bit integer.
    Sint32,
    /// Unsigned 64-bit integer.
    Uint64,
    /// Signed 64-bit integer.
    Sint64,
    /// IEEE 4-byte floating point.
    Real32,
    /// IEEE 8-byte floating point.
    Real64,
    /// UCS-2 character.
    Char16,
    /// String.
    String,
    /// Datetime (timestamp or interval).
    DateTime,
    /// Object path reference.
    Reference,
    /// Embedded class or instance.
    Object,
    /// Embedded instance.
    Instance,
}

impl CimType {
    /// All types, in declaration order.
    pub const ALL: [CimType; 17] = [
        Self::Boolean,
        Self::Uint8,
        Self::Sint8,
        Self::Uint16,
        Self::Sint16,
        Self::Uint32,
        Self::Sint32,
        Self::Uint64,
        Self::Sint64,
        Self::Real32,
        Self::Real64,
        Self::Char16,
        Self::String,
        Self::DateTime,
        Self::Reference,
        Self::Object,
        Self::Instance,
    ];

    /// Get the type keyword as it appears in `TYPE`/`PARAMTYPE` attributes.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Boolean => "boolean",
            Self::Uint8 => "uint8",
            Self::Sint8 => "sint8",
            Self::Uint16 => "uint16",
            Self::Sint16 => "sint16",
            Self::Uint32 => "uint32",
            Self::Sint32 => "sint32",
            Self::Uint64 => "uint64",
            Self::Sint64 => "sint64",
            Self::Real32 => "real32",
            Self::Real64 => "real64",
            Self::Char16 => "char16",
            Self::String => "string",
            Self::DateTime => "datetime",
            Self::Reference => "reference",
            Self::Object => "object",
            Self::Instance => "instance",
        }
    }

    /// Look up a wire type keyword.
    ///
    /// Only the DMTF keywords are recognized; `object` and `instance` are
    /// not valid wire types. Matching is exact (case-sensitive).
    #[must_use]
    pub fn from_wire_name(s: &str) -> Option<Self> {
        match s {
            "boolean" => Some(Self::Boolean),
            "string" => Some(Self::String),
            "char16" => Some(Self::Char16),
            "uint8" => Some(Self::Uint8),
            "sint8" => Some(Self::Sint8),
            "uint16" => Some(Self::Uint16),
            "sint16" => Some(Self::Sint16),
            "uint32" => Some(Self::Uint32),
            "sint32" => Some(Self::Sint32),
            "uint64" => Some(Self::Uint64),
            "sint64" => Some(Self::Sint64),
            "datetime" => Some(Self::DateTime),
            "real32" => Some(Self::Real32),
            "real64" => Some(Self::Real64),
            "reference" => Some(Self::Reference),
            _ => None,
        }
    }

    /// Check for an unsigned integer type.
    #[must_use]
    pub const fn is_unsigned(&self) -> bool {
        matches!(self, Self::Uint8 | Self::Uint16 | Self::Uint32 | Self::Uint64)
    }

    /// Check for a signed integer type.
    #[must_use]
    pub const fn is_signed(&self) -> bool {
        matches!(self, Self::Sint8 | Self::Sint16 | Self::Sint32 | Self::Sint64)
    }

    /// Check for any integer type.
    #[must_use]
    pub const fn is_integer(&self) -> bool {
        self.is_unsigned() || self.is_signed()
    }

    /// Check for a floating-point type.
    #[must_use]
    pub const fn is_real(&self) -> bool {
        matches!(self, Self::Real32 | Self::Real64)
    }

    /// Check for the embedded object pseudo-types.
    #[must_use]
    pub const fn is_embedded(&self) -> bool {
        matches!(self, Self::Object | Self::Instance)
    }
}

impl fmt::Display for CimType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
