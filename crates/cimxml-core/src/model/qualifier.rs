//! Qualifiers, qualifier declarations and qualifier lists.

use bitflags::bitflags;

use super::name::CimName;
use super::types::CimType;
use super::value::{CimValue, Scalar};
use crate::error::ModelError;

bitflags! {
    /// Propagation rules of a qualifier.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct Flavor: u32 {
        /// Subclasses may override the value.
        const OVERRIDABLE = 1 << 0;
        /// Inherited by subclasses.
        const TOSUBCLASS = 1 << 1;
        /// Inherited by instances.
        const TOINSTANCE = 1 << 2;
        /// The value may be localized.
        const TRANSLATABLE = 1 << 3;
        /// Subclasses may not override the value.
        const DISABLEOVERRIDE = 1 << 4;
        /// Not inherited by subclasses.
        const RESTRICTED = 1 << 5;
    }
}

impl Flavor {
    /// The wire defaults: overridable and inherited by subclasses.
    pub const DEFAULTS: Self = Self::OVERRIDABLE.union(Self::TOSUBCLASS);

    /// Build a flavor from the four wire attributes.
    #[must_use]
    pub fn from_attributes(
        overridable: bool,
        to_subclass: bool,
        to_instance: bool,
        translatable: bool,
    ) -> Self {
        let mut flavor = if overridable {
            Self::OVERRIDABLE
        } else {
            Self::DISABLEOVERRIDE
        };
        flavor |= if to_subclass {
            Self::TOSUBCLASS
        } else {
            Self::RESTRICTED
        };
        if to_instance {
            flavor |= Self::TOINSTANCE;
        }
        if translatable {
            flavor |= Self::TRANSLATABLE;
        }
        flavor
    }

    /// Whether the `OVERRIDABLE` wire attribute is true.
    #[must_use]
    pub const fn is_overridable(&self) -> bool {
        !self.contains(Self::DISABLEOVERRIDE)
    }

    /// Whether the `TOSUBCLASS` wire attribute is true.
    #[must_use]
    pub const fn is_to_subclass(&self) -> bool {
        self.contains(Self::TOSUBCLASS) && !self.contains(Self::RESTRICTED)
    }
}

impl Default for Flavor {
    fn default() -> Self {
        Self::DEFAULTS
    }
}

bitflags! {
    /// Element kinds a qualifier declaration may be applied to.
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct Scope: u32 {
        /// Classes.
        const CLASS = 1 << 0;
        /// Association classes.
        const ASSOCIATION = 1 << 1;
        /// Indication classes.
        const INDICATION = 1 << 2;
        /// Properties.
        const PROPERTY = 1 << 3;
        /// Reference properties.
        const REFERENCE = 1 << 4;
        /// Methods.
        const METHOD = 1 << 5;
        /// Method parameters.
        const PARAMETER = 1 << 6;
    }
}

impl Scope {
    /// `SCOPE` attribute names paired with their bits, in wire order.
    pub const ATTRIBUTES: [(&'static str, Scope); 7] = [
        ("CLASS", Self::CLASS),
        ("ASSOCIATION", Self::ASSOCIATION),
        ("REFERENCE", Self::REFERENCE),
        ("PROPERTY", Self::PROPERTY),
        ("METHOD", Self::METHOD),
        ("PARAMETER", Self::PARAMETER),
        ("INDICATION", Self::INDICATION),
    ];
}

/// A qualifier applied to a class, instance, property, method or parameter.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Qualifier {
    name: CimName,
    value: CimValue,
    flavor: Flavor,
    propagated: bool,
}

impl Qualifier {
    /// Create a qualifier with default flavor.
    #[must_use]
    pub fn new(name: CimName, value: CimValue) -> Self {
        Self {
            name,
            value,
            flavor: Flavor::DEFAULTS,
            propagated: false,
        }
    }

    /// Set the flavor.
    #[must_use]
    pub fn with_flavor(mut self, flavor: Flavor) -> Self {
        self.flavor = flavor;
        self
    }

    /// Set the propagated flag.
    #[must_use]
    pub fn with_propagated(mut self, propagated: bool) -> Self {
        self.propagated = propagated;
        self
    }

    /// Get the name.
    #[must_use]
    pub fn name(&self) -> &CimName {
        &self.name
    }

    /// Get the value.
    #[must_use]
    pub fn value(&self) -> &CimValue {
        &self.value
    }

    /// Replace the value, keeping its type.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::TypeMismatch`] if the type differs.
    pub fn set_value(&mut self, value: CimValue) -> Result<(), ModelError> {
        self.value.set(value)
    }

    /// Get the flavor.
    #[must_use]
    pub const fn flavor(&self) -> Flavor {
        self.flavor
    }

    /// Check whether the qualifier was inherited.
    #[must_use]
    pub const fn propagated(&self) -> bool {
        self.propagated
    }

    /// Set the propagated flag.
    pub fn set_propagated(&mut self, propagated: bool) {
        self.propagated = propagated;
    }

    /// Check for a boolean `true` value.
    #[must_use]
    pub fn is_true(&self) -> bool {
        matches!(self.value, CimValue::Scalar(Scalar::Boolean(true)))
    }
}

/// A qualifier type declaration (`QUALIFIER.DECLARATION`).
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct QualifierDecl {
    name: CimName,
    value: CimValue,
    scope: Scope,
    flavor: Flavor,
    array_size: u32,
}

impl QualifierDecl {
    /// Create a declaration. The value carries the declared type and
    /// default.
    #[must_use]
    pub fn new(name: CimName, value: CimValue, scope: Scope, flavor: Flavor) -> Self {
        Self {
            name,
            value,
            scope,
            flavor,
            array_size: 0,
        }
    }

    /// Set the fixed array size (0 for variable).
    #[must_use]
    pub fn with_array_size(mut self, array_size: u32) -> Self {
        self.array_size = array_size;
        self
    }

    /// Get the name.
    #[must_use]
    pub fn name(&self) -> &CimName {
        &self.name
    }

    /// Get the default value.
    #[must_use]
    pub fn value(&self) -> &CimValue {
        &self.value
    }

    /// Get the declared type.
    #[must_use]
    pub fn cim_type(&self) -> CimType {
        self.value.cim_type()
    }

    /// Check whether the declared type is an array.
    #[must_use]
    pub fn is_array(&self) -> bool {
        self.value.is_array()
    }

    /// Get the scope.
    #[must_use]
    pub const fn scope(&self) -> Scope {
        self.scope
    }

    /// Get the flavor.
    #[must_use]
    pub const fn flavor(&self) -> Flavor {
        self.flavor
    }

    /// Get the fixed array size, 0 if variable.
    #[must_use]
    pub const fn array_size(&self) -> u32 {
        self.array_size
    }
}

/// An ordered list of qualifiers, unique by name.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct QualifierList(Vec<Qualifier>);

impl QualifierList {
    /// Create an empty list.
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    /// Append a qualifier.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::AlreadyExists`] if the name is taken.
    pub fn add(&mut self, qualifier: Qualifier) -> Result<(), ModelError> {
        if self.find(qualifier.name.as_str()).is_some() {
            return Err(ModelError::AlreadyExists {
                kind: "qualifier",
                name: qualifier.name.to_string(),
            });
        }
        self.0.push(qualifier);
        Ok(())
    }

    /// Find a qualifier's index by name.
    #[must_use]
    pub fn find(&self, name: &str) -> Option<usize> {
        self.0.iter().position(|q| q.name.eq_str(name))
    }

    /// Get a qualifier by name.
    #[must_use]
    pub fn get_by_name(&self, name: &str) -> Option<&Qualifier> {
        self.find(name).map(|i| &self.0[i])
    }

    /// Get a qualifier by index.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::IndexOutOfBounds`] for a bad index.
    pub fn get(&self, index: usize) -> Result<&Qualifier, ModelError> {
        self.0.get(index).ok_or(ModelError::IndexOutOfBounds {
            index,
            len: self.0.len(),
        })
    }

    /// Get a mutable qualifier by index.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::IndexOutOfBounds`] for a bad index.
    pub fn get_mut(&mut self, index: usize) -> Result<&mut Qualifier, ModelError> {
        let len = self.0.len();
        self.0
            .get_mut(index)
            .ok_or(ModelError::IndexOutOfBounds { index, len })
    }

    /// Remove a qualifier by index.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::IndexOutOfBounds`] for a bad index.
    pub fn remove(&mut self, index: usize) -> Result<Qualifier, ModelError> {
        if index >= self.0.len() {
            return Err(ModelError::IndexOutOfBounds {
                index,
                len: self.0.len(),
            });
        }
        Ok(self.0.remove(index))
    }

    /// Check whether the named qualifier is present with a boolean `true`.
    #[must_use]
    pub fn is_true(&self, name: &str) -> bool {
        self.get_by_name(name).is_some_and(Qualifier::is_true)
    }

    /// Number of qualifiers.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Check for an empty list.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Keep only the qualifiers matching `keep`.
    pub fn retain<F: FnMut(&Qualifier) -> bool>(&mut self, keep: F) {
        self.0.retain(keep);
    }

    /// Iterate in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Qualifier> {
        self.0.iter()
    }
}

impl<'a> IntoIterator for &'a QualifierList {
    type Item = &'a Qualifier;
    type IntoIter = std::slice::Iter<'a, Qualifier>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key_qualifier() -> Qualifier {
        Qualifier::new(CimName::new("Key").unwrap(), CimValue::from(true))
    }

    #[test]
    fn test_flavor_from_attributes() {
        assert_eq!(Flavor::from_attributes(true, true, false, false), Flavor::DEFAULTS);
        let f = Flavor::from_attributes(false, false, true, true);
        assert!(f.contains(Flavor::DISABLEOVERRIDE | Flavor::RESTRICTED));
        assert!(f.contains(Flavor::TOINSTANCE | Flavor::TRANSLATABLE));
        assert!(!f.is_overridable());
        assert!(!f.is_to_subclass());
        assert!(Flavor::DEFAULTS.is_to_subclass());
        assert!(!Flavor::empty().is_to_subclass());
    }

    #[test]
    fn test_duplicate_qualifier() {
        let mut list = QualifierList::new();
        list.add(key_qualifier()).unwrap();
        let dup = Qualifier::new(CimName::new("KEY").unwrap(), CimValue::from(false));
        assert_eq!(
            list.add(dup),
            Err(ModelError::AlreadyExists {
                kind: "qualifier",
                name: "KEY".into()
            })
        );
        assert_eq!(list.len(), 1);
    }

    #[test]
    fn test_find_and_index() {
        let mut list = QualifierList::new();
        list.add(key_qualifier()).unwrap();
        assert_eq!(list.find("key"), Some(0));
        assert_eq!(list.find("Abstract"), None);
        assert!(list.is_true("Key"));
        assert_eq!(
            list.get(3).unwrap_err(),
            ModelError::IndexOutOfBounds { index: 3, len: 1 }
        );
        list.remove(0).unwrap();
        assert!(list.is_empty());
    }

    #[test]
    fn test_is_true_requires_boolean_true() {
        let q = Qualifier::new(CimName::new("Abstract").unwrap(), CimValue::from("true"));
        assert!(!q.is_true());
        let q = Qualifier::new(
            CimName::new("Abstract").unwrap(),
            CimValue::null(CimType::Boolean, false),
        );
        assert!(!q.is_true());
    }
}
