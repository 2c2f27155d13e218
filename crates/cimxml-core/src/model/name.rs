//! Validated CIM identifiers and namespace names.

use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};

use crate::error::ModelError;

/// Check whether `s` is a legal CIM identifier.
///
/// A legal name starts with an ASCII letter or underscore, followed by
/// ASCII letters, digits or underscores.
#[must_use]
pub fn is_legal_name(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Check whether `s` is a legal namespace name (slash-separated legal names).
///
/// A single leading slash is tolerated.
#[must_use]
pub fn is_legal_namespace(s: &str) -> bool {
    let s = s.strip_prefix('/').unwrap_or(s);
    !s.is_empty() && s.split('/').all(is_legal_name)
}

/// A CIM name (class, property, qualifier, method or parameter name).
///
/// Names compare case-insensitively. The null name (empty string) is a
/// sentinel for "no name", e.g. the superclass of a root class.
#[derive(Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct CimName(String);

impl CimName {
    /// Create a name, validating it.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidName`] if `s` is not a legal identifier.
    pub fn new(s: impl Into<String>) -> Result<Self, ModelError> {
        let s = s.into();
        if is_legal_name(&s) {
            Ok(Self(s))
        } else {
            Err(ModelError::InvalidName(s))
        }
    }

    /// The null name.
    #[must_use]
    pub const fn null() -> Self {
        Self(String::new())
    }

    /// Check if this is the null name.
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.0.is_empty()
    }

    /// Get the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Case-insensitive comparison against a string.
    #[must_use]
    pub fn eq_str(&self, other: &str) -> bool {
        self.0.eq_ignore_ascii_case(other)
    }
}

impl PartialEq for CimName {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Eq for CimName {}

impl Hash for CimName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for b in self.0.bytes() {
            state.write_u8(b.to_ascii_lowercase());
        }
    }
}

impl PartialOrd for CimName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for CimName {
    fn cmp(&self, other: &Self) -> Ordering {
        cmp_ignore_case(&self.0, &other.0)
    }
}

impl fmt::Debug for CimName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "CimName({:?})", self.0)
    }
}

impl fmt::Display for CimName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<&str> for CimName {
    type Error = ModelError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        Self::new(s)
    }
}

impl AsRef<str> for CimName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// A CIM namespace name such as `root/cimv2`.
///
/// Compares case-insensitively. The null namespace is the empty string.
#[derive(Clone, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct NamespaceName(String);

impl NamespaceName {
    /// Create a namespace name, validating it. A leading slash is dropped.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::InvalidNamespaceName`] for illegal input.
    pub fn new(s: impl Into<String>) -> Result<Self, ModelError> {
        let s = s.into();
        if !is_legal_namespace(&s) {
            return Err(ModelError::InvalidNamespaceName(s));
        }
        match s.strip_prefix('/') {
            Some(rest) => Ok(Self(rest.to_owned())),
            None => Ok(Self(s)),
        }
    }

    /// The null namespace.
    #[must_use]
    pub const fn null() -> Self {
        Self(String::new())
    }

    /// Check if this is the null namespace.
    #[must_use]
    pub fn is_null(&self) -> bool {
        self.0.is_empty()
    }

    /// Get the namespace as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Iterate over the slash-separated components.
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.0.split('/').filter(|c| !c.is_empty())
    }
}

impl PartialEq for NamespaceName {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq_ignore_ascii_case(&other.0)
    }
}

impl Eq for NamespaceName {}

impl Hash for NamespaceName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        for b in self.0.bytes() {
            state.write_u8(b.to_ascii_lowercase());
        }
    }
}

impl PartialOrd for NamespaceName {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for NamespaceName {
    fn cmp(&self, other: &Self) -> Ordering {
        cmp_ignore_case(&self.0, &other.0)
    }
}

impl fmt::Debug for NamespaceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NamespaceName({:?})", self.0)
    }
}

impl fmt::Display for NamespaceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// ASCII case-insensitive ordering of two strings.
pub(crate) fn cmp_ignore_case(a: &str, b: &str) -> Ordering {
    a.bytes()
        .map(|b| b.to_ascii_lowercase())
        .cmp(b.bytes().map(|b| b.to_ascii_lowercase()))
}
