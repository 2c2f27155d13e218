//! Object paths and key bindings.
//!
//! An object path names a class or instance:
//!
//! ```text
//! //host:5988/root/cimv2:CIM_Person.Id=12,Name="Mike",Active=TRUE
//! ```
//!
//! Key bindings are kept sorted case-insensitively by name, so two paths
//! can be compared component by component without re-sorting.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use super::name::{cmp_ignore_case, CimName, NamespaceName};
use super::types::CimType;
use super::value::{CimValue, Scalar};
use crate::convert::{parse_signed, parse_unsigned};
use crate::error::{ModelError, TypeDesc};

/// How a key binding value is to be interpreted.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum KeyBindingKind {
    /// Quoted string (also char16 and datetime keys).
    String,
    /// `TRUE` or `FALSE`.
    Boolean,
    /// Integer (or real) literal.
    Numeric,
    /// Serialized object path.
    Reference,
}

impl KeyBindingKind {
    /// Get the `VALUETYPE` attribute value used on the wire.
    ///
    /// References have no `VALUETYPE`; they are written as `VALUE.REFERENCE`.
    #[must_use]
    pub const fn value_type(&self) -> &'static str {
        match self {
            Self::String | Self::Reference => "string",
            Self::Boolean => "boolean",
            Self::Numeric => "numeric",
        }
    }
}

/// One `name=value` key of an instance path.
#[derive(Clone, Debug)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct KeyBinding {
    name: CimName,
    value: String,
    kind: KeyBindingKind,
}

impl KeyBinding {
    /// Create a key binding from its string form.
    #[must_use]
    pub fn new(name: CimName, value: impl Into<String>, kind: KeyBindingKind) -> Self {
        Self {
            name,
            value: value.into(),
            kind,
        }
    }

    /// Create a key binding from a typed value.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::TypeMismatch`] for arrays, nulls and embedded
    /// objects, which cannot be keys.
    pub fn from_value(name: CimName, value: &CimValue) -> Result<Self, ModelError> {
        let mismatch = || ModelError::TypeMismatch {
            expected: TypeDesc::new(CimType::String, false),
            found: TypeDesc::new(value.cim_type(), value.is_array()),
        };
        let scalar = value.as_scalar().ok_or_else(mismatch)?;
        let kind = match scalar.cim_type() {
            CimType::Boolean => KeyBindingKind::Boolean,
            CimType::Char16 | CimType::String | CimType::DateTime => KeyBindingKind::String,
            CimType::Reference => KeyBindingKind::Reference,
            CimType::Object | CimType::Instance => return Err(mismatch()),
            _ => KeyBindingKind::Numeric,
        };
        Ok(Self::new(name, scalar.to_string(), kind))
    }

    /// Get the key name.
    #[must_use]
    pub fn name(&self) -> &CimName {
        &self.name
    }

    /// Get the value in its string form.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Get the value kind.
    #[must_use]
    pub const fn kind(&self) -> KeyBindingKind {
        self.kind
    }

    /// Check whether this key holds the same value as a typed value.
    #[must_use]
    pub fn matches_value(&self, value: &CimValue) -> bool {
        match Self::from_value(self.name.clone(), value) {
            Ok(other) => self.kind == other.kind && compare_values(self, &other) == Ordering::Equal,
            Err(_) => false,
        }
    }

    /// Normalize a reference value so its nested keys are sorted.
    fn normalize(&mut self) {
        if self.kind == KeyBindingKind::Reference {
            if let Ok(path) = self.value.parse::<ObjectPath>() {
                self.value = path.to_string();
            }
        }
    }
}

/// Numeric key as a wide integer, if it parses in any radix.
fn numeric_key(s: &str) -> Option<i128> {
    parse_unsigned(s)
        .map(i128::from)
        .or_else(|| parse_signed(s).map(i128::from))
}

/// Compare two key values of the same kind.
///
/// Values that parse (as numbers or paths) order before values that do
/// not; unparseable values fall back to plain string order.
fn compare_values(a: &KeyBinding, b: &KeyBinding) -> Ordering {
    match a.kind {
        KeyBindingKind::String => a.value.cmp(&b.value),
        KeyBindingKind::Boolean => cmp_ignore_case(&a.value, &b.value),
        KeyBindingKind::Numeric => match (numeric_key(&a.value), numeric_key(&b.value)) {
            (Some(x), Some(y)) => x.cmp(&y),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.value.cmp(&b.value),
        },
        KeyBindingKind::Reference => {
            match (a.value.parse::<ObjectPath>(), b.value.parse::<ObjectPath>()) {
                (Ok(x), Ok(y)) => x.cmp(&y),
                (Ok(_), Err(_)) => Ordering::Less,
                (Err(_), Ok(_)) => Ordering::Greater,
                (Err(_), Err(_)) => a.value.cmp(&b.value),
            }
        }
    }
}

impl PartialEq for KeyBinding {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for KeyBinding {}

impl PartialOrd for KeyBinding {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for KeyBinding {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name
            .cmp(&other.name)
            .then_with(|| self.kind.cmp(&other.kind))
            .then_with(|| compare_values(self, other))
    }
}

/// A class or instance path.
#[derive(Clone, Debug, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ObjectPath {
    host: String,
    namespace: NamespaceName,
    class_name: CimName,
    keys: Vec<KeyBinding>,
}

impl ObjectPath {
    /// Create a class path with no host or namespace.
    #[must_use]
    pub fn new(class_name: CimName) -> Self {
        Self {
            class_name,
            ..Self::default()
        }
    }

    /// Set the host (`name` or `name:port`).
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Set the namespace.
    #[must_use]
    pub fn with_namespace(mut self, namespace: NamespaceName) -> Self {
        self.namespace = namespace;
        self
    }

    /// Set the key bindings.
    #[must_use]
    pub fn with_keys(mut self, keys: Vec<KeyBinding>) -> Self {
        self.set_key_bindings(keys);
        self
    }

    /// Get the host, empty if none.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Set the host.
    pub fn set_host(&mut self, host: impl Into<String>) {
        self.host = host.into();
    }

    /// Get the namespace, null if none.
    #[must_use]
    pub fn namespace(&self) -> &NamespaceName {
        &self.namespace
    }

    /// Set the namespace.
    pub fn set_namespace(&mut self, namespace: NamespaceName) {
        self.namespace = namespace;
    }

    /// Get the class name.
    #[must_use]
    pub fn class_name(&self) -> &CimName {
        &self.class_name
    }

    /// Set the class name.
    pub fn set_class_name(&mut self, class_name: CimName) {
        self.class_name = class_name;
    }

    /// Get the key bindings, sorted by name.
    #[must_use]
    pub fn key_bindings(&self) -> &[KeyBinding] {
        &self.keys
    }

    /// Replace the key bindings. They are sorted by name and reference
    /// values are normalized.
    pub fn set_key_bindings(&mut self, mut keys: Vec<KeyBinding>) {
        for key in &mut keys {
            key.normalize();
        }
        keys.sort_by(|a, b| a.name.cmp(&b.name));
        self.keys = keys;
    }

    /// Find a key binding by name.
    #[must_use]
    pub fn key(&self, name: &str) -> Option<&KeyBinding> {
        self.keys.iter().find(|k| k.name.eq_str(name))
    }

    /// Check whether this names an instance (has keys).
    #[must_use]
    pub fn is_instance_path(&self) -> bool {
        !self.keys.is_empty()
    }

    /// Drop host and namespace.
    #[must_use]
    pub fn to_local(&self) -> Self {
        Self {
            host: String::new(),
            namespace: NamespaceName::null(),
            class_name: self.class_name.clone(),
            keys: self.keys.clone(),
        }
    }

    /// Deep structural equality (host compared case-insensitively).
    #[must_use]
    pub fn identical(&self, other: &Self) -> bool {
        self == other
    }

    /// Render a string form that is equal for equal paths.
    ///
    /// Host, namespace, class and key names are lowercased, booleans are
    /// lowercased, numeric keys are rendered in decimal and reference keys
    /// are canonicalized recursively.
    #[must_use]
    pub fn to_canonical_string(&self) -> String {
        let keys = self
            .keys
            .iter()
            .map(|k| {
                let value = match k.kind {
                    KeyBindingKind::Reference => match k.value.parse::<ObjectPath>() {
                        Ok(path) => path.to_canonical_string(),
                        Err(_) => k.value.clone(),
                    },
                    KeyBindingKind::Boolean => k.value.to_ascii_lowercase(),
                    KeyBindingKind::Numeric => match numeric_key(&k.value) {
                        Some(n) => n.to_string(),
                        None => k.value.clone(),
                    },
                    KeyBindingKind::String => k.value.clone(),
                };
                (k.name.as_str().to_ascii_lowercase(), value, k.kind)
            })
            .collect::<Vec<_>>();
        let mut out = String::new();
        write_path(
            &mut out,
            &self.host.to_ascii_lowercase(),
            &self.namespace.as_str().to_ascii_lowercase(),
            &self.class_name.as_str().to_ascii_lowercase(),
            keys.iter().map(|(n, v, k)| (n.as_str(), v.as_str(), *k)),
        );
        out
    }

    /// Parse the string form.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::MalformedObjectPath`] describing the first
    /// problem found.
    pub fn parse(input: &str) -> Result<Self, ModelError> {
        let malformed = |reason: &str| ModelError::MalformedObjectPath {
            path: input.into(),
            reason: reason.into(),
        };

        let mut rest = input;
        let mut host = String::new();
        let mut got_host = false;
        if let Some(after) = rest.strip_prefix("//") {
            let slash = after
                .find('/')
                .ok_or_else(|| malformed("missing slash after hostname"))?;
            let name = &after[..slash];
            if !is_valid_hostname(name) {
                return Err(malformed("invalid hostname"));
            }
            host = name.into();
            got_host = true;
            // The slash is part of the namespace.
            rest = &after[slash..];
        }

        let mut namespace = NamespaceName::null();
        let mut got_namespace = false;
        if let Some(colon) = rest.find(':') {
            // A colon after the first dot belongs to a key value.
            if rest.find('.').map_or(true, |dot| dot > colon) {
                namespace = NamespaceName::new(&rest[..colon])
                    .map_err(|_| malformed("invalid namespace name"))?;
                got_namespace = true;
                rest = &rest[colon + 1..];
            }
        }
        if got_host && !got_namespace {
            return Err(malformed("host specified, missing namespace"));
        }

        let (class, key_text) = match rest.find('.') {
            Some(dot) => (&rest[..dot], Some(&rest[dot + 1..])),
            None => (rest, None),
        };
        let class_name =
            CimName::new(class).map_err(|_| malformed("class name not a legal CIM name"))?;

        let keys = match key_text {
            Some(text) => parse_key_bindings(text, &malformed)?,
            None => Vec::new(),
        };

        Ok(Self {
            host,
            namespace,
            class_name,
            keys: Vec::new(),
        }
        .with_keys(keys))
    }
}

fn parse_key_bindings(
    mut p: &str,
    malformed: &dyn Fn(&str) -> ModelError,
) -> Result<Vec<KeyBinding>, ModelError> {
    let mut keys = Vec::new();
    while !p.is_empty() {
        let eq = p
            .find('=')
            .ok_or_else(|| malformed("invalid key-value pair, missing equal sign"))?;
        let name = CimName::new(&p[..eq])
            .map_err(|_| malformed("invalid key-value pair, invalid key name"))?;
        p = &p[eq + 1..];

        let (value, kind) = if let Some(quoted) = p.strip_prefix('"') {
            let mut value = String::new();
            let mut end = None;
            let mut chars = quoted.char_indices();
            while let Some((i, c)) = chars.next() {
                match c {
                    '\\' => match chars.next() {
                        Some((_, e @ ('\\' | '"'))) => value.push(e),
                        _ => return Err(malformed("invalid key-value pair, malformed value")),
                    },
                    '"' => {
                        end = Some(i);
                        break;
                    }
                    c => value.push(c),
                }
            }
            let end = end
                .ok_or_else(|| malformed("invalid key-value pair, missing quote in key value"))?;
            p = &quoted[end + 1..];
            // A quoted value that parses as a keyed path is taken as a reference.
            let is_reference = value.contains('=')
                && ObjectPath::parse(&value).is_ok_and(|r| r.is_instance_path());
            let kind = if is_reference {
                KeyBindingKind::Reference
            } else {
                KeyBindingKind::String
            };
            (value, kind)
        } else if p.starts_with(['t', 'T', 'f', 'F']) {
            let n = p.find(',').unwrap_or(p.len());
            let literal = p[..n].to_ascii_uppercase();
            if literal != "TRUE" && literal != "FALSE" {
                return Err(malformed(
                    "invalid key-value pair, value should be TRUE or FALSE",
                ));
            }
            p = &p[n..];
            (literal, KeyBindingKind::Boolean)
        } else {
            let n = p.find(',').unwrap_or(p.len());
            let literal = &p[..n];
            let valid = if literal.starts_with('-') {
                parse_signed(literal).is_some()
            } else {
                parse_unsigned(literal).is_some()
            };
            if !valid {
                return Err(malformed("invalid key-value pair, invalid number value"));
            }
            p = &p[n..];
            (literal.to_owned(), KeyBindingKind::Numeric)
        };

        keys.push(KeyBinding::new(name, value, kind));

        if !p.is_empty() {
            p = p.strip_prefix(',').ok_or_else(|| {
                malformed("invalid key-value pair, next key-value pair has to start with comma")
            })?;
        }
    }
    Ok(keys)
}

/// Loose hostname check: `name[:port]`, with bracketed IPv6 allowed.
fn is_valid_hostname(host: &str) -> bool {
    !host.is_empty()
        && host
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '.' | '_' | ':' | '[' | ']'))
}

fn escape_key_value(value: &str, out: &mut String) {
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            c => out.push(c),
        }
    }
}

fn write_path<'a>(
    out: &mut String,
    host: &str,
    namespace: &str,
    class: &str,
    keys: impl Iterator<Item = (&'a str, &'a str, KeyBindingKind)>,
) {
    if !host.is_empty() {
        out.push_str("//");
        out.push_str(host);
        out.push('/');
    }
    // A host forces the namespace separator even for a null namespace.
    if !namespace.is_empty() || !host.is_empty() {
        out.push_str(namespace);
        out.push(':');
    }
    out.push_str(class);
    for (i, (name, value, kind)) in keys.enumerate() {
        out.push(if i == 0 { '.' } else { ',' });
        out.push_str(name);
        out.push('=');
        match kind {
            KeyBindingKind::String | KeyBindingKind::Reference => {
                out.push('"');
                escape_key_value(value, out);
                out.push('"');
            }
            KeyBindingKind::Boolean | KeyBindingKind::Numeric => out.push_str(value),
        }
    }
}

impl fmt::Display for ObjectPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        write_path(
            &mut out,
            &self.host,
            self.namespace.as_str(),
            self.class_name.as_str(),
            self.keys
                .iter()
                .map(|k| (k.name.as_str(), k.value.as_str(), k.kind)),
        );
        f.write_str(&out)
    }
}

impl FromStr for ObjectPath {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl PartialEq for ObjectPath {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for ObjectPath {}

impl PartialOrd for ObjectPath {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ObjectPath {
    /// Host, namespace and class compare case-insensitively, then key
    /// bindings positionally.
    fn cmp(&self, other: &Self) -> Ordering {
        cmp_ignore_case(&self.host, &other.host)
            .then_with(|| self.namespace.cmp(&other.namespace))
            .then_with(|| self.class_name.cmp(&other.class_name))
            .then_with(|| self.keys.cmp(&other.keys))
    }
}

impl From<ObjectPath> for CimValue {
    fn from(path: ObjectPath) -> Self {
        CimValue::Scalar(Scalar::Reference(path))
    }
}
