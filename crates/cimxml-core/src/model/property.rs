//! Properties.

use super::name::CimName;
use super::qualifier::{Qualifier, QualifierList};
use super::types::CimType;
use super::value::CimValue;
use crate::error::ModelError;

/// A class or instance property.
///
/// `class_origin` names the class that first defined the property;
/// `propagated` marks one inherited rather than declared locally.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CimProperty {
    name: CimName,
    value: CimValue,
    array_size: u32,
    reference_class: CimName,
    class_origin: CimName,
    propagated: bool,
    qualifiers: QualifierList,
}

impl CimProperty {
    /// Create a property with a value that also fixes its type.
    #[must_use]
    pub fn new(name: CimName, value: CimValue) -> Self {
        Self {
            name,
            value,
            array_size: 0,
            reference_class: CimName::null(),
            class_origin: CimName::null(),
            propagated: false,
            qualifiers: QualifierList::new(),
        }
    }

    /// Set the fixed array size.
    #[must_use]
    pub fn with_array_size(mut self, array_size: u32) -> Self {
        self.array_size = array_size;
        self
    }

    /// Set the class a reference property points to.
    #[must_use]
    pub fn with_reference_class(mut self, class: CimName) -> Self {
        self.reference_class = class;
        self
    }

    /// Set the class origin.
    #[must_use]
    pub fn with_class_origin(mut self, class_origin: CimName) -> Self {
        self.class_origin = class_origin;
        self
    }

    /// Set the propagated flag.
    #[must_use]
    pub fn with_propagated(mut self, propagated: bool) -> Self {
        self.propagated = propagated;
        self
    }

    /// Add a qualifier, builder style.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::AlreadyExists`] for a duplicate name.
    pub fn with_qualifier(mut self, qualifier: Qualifier) -> Result<Self, ModelError> {
        self.qualifiers.add(qualifier)?;
        Ok(self)
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

    /// Replace the value, keeping type and array-ness.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::TypeMismatch`] on a type change.
    pub fn set_value(&mut self, value: CimValue) -> Result<(), ModelError> {
        self.value.set(value)
    }

    /// Get the type.
    #[must_use]
    pub fn cim_type(&self) -> CimType {
        self.value.cim_type()
    }

    /// Check whether the property holds an array.
    #[must_use]
    pub fn is_array(&self) -> bool {
        self.value.is_array()
    }

    /// Get the fixed array size, 0 if variable.
    #[must_use]
    pub const fn array_size(&self) -> u32 {
        self.array_size
    }

    /// Get the reference class, null for non-references.
    #[must_use]
    pub fn reference_class(&self) -> &CimName {
        &self.reference_class
    }

    /// Get the class origin, null if unknown.
    #[must_use]
    pub fn class_origin(&self) -> &CimName {
        &self.class_origin
    }

    /// Set the class origin.
    pub fn set_class_origin(&mut self, class_origin: CimName) {
        self.class_origin = class_origin;
    }

    /// Check whether the property was inherited.
    #[must_use]
    pub const fn propagated(&self) -> bool {
        self.propagated
    }

    /// Set the propagated flag.
    pub fn set_propagated(&mut self, propagated: bool) {
        self.propagated = propagated;
    }

    /// Get the qualifiers.
    #[must_use]
    pub fn qualifiers(&self) -> &QualifierList {
        &self.qualifiers
    }

    /// Get the qualifiers mutably.
    pub fn qualifiers_mut(&mut self) -> &mut QualifierList {
        &mut self.qualifiers
    }

    /// Check for a `Key` qualifier set to true.
    #[must_use]
    pub fn is_key(&self) -> bool {
        self.qualifiers.is_true("Key")
    }

    /// Copy without qualifiers.
    #[must_use]
    pub fn without_qualifiers(&self) -> Self {
        Self {
            qualifiers: QualifierList::new(),
            ..self.clone()
        }
    }
}

/// Append `item` unless an element with the same name is present.
pub(crate) fn add_unique<T>(
    items: &mut Vec<T>,
    item: T,
    kind: &'static str,
    name_of: impl Fn(&T) -> &CimName,
) -> Result<(), ModelError> {
    let name = name_of(&item);
    if items.iter().any(|existing| name_of(existing) == name) {
        return Err(ModelError::AlreadyExists {
            kind,
            name: name.to_string(),
        });
    }
    items.push(item);
    Ok(())
}

/// Get an element by index or report the bad index.
pub(crate) fn get_index<T>(items: &[T], index: usize) -> Result<&T, ModelError> {
    items.get(index).ok_or(ModelError::IndexOutOfBounds {
        index,
        len: items.len(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_property() {
        let p = CimProperty::new(CimName::new("Id").unwrap(), CimValue::null(CimType::Uint32, false))
            .with_qualifier(Qualifier::new(CimName::new("key").unwrap(), CimValue::from(true)))
            .unwrap();
        assert!(p.is_key());
        assert!(!p.without_qualifiers().is_key());
    }

    #[test]
    fn test_identical_includes_origin() {
        let a = CimProperty::new(CimName::new("Name").unwrap(), CimValue::from("x"));
        let b = a.clone().with_class_origin(CimName::new("TST_Base").unwrap());
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn test_add_unique() {
        let mut props = Vec::new();
        let p = CimProperty::new(CimName::new("Name").unwrap(), CimValue::from("x"));
        add_unique(&mut props, p.clone(), "property", CimProperty::name).unwrap();
        assert!(matches!(
            add_unique(&mut props, p, "property", CimProperty::name),
            Err(ModelError::AlreadyExists { kind: "property", .. })
        ));
        assert!(get_index(&props, 1).is_err());
    }
}
