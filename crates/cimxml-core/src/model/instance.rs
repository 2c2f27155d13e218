//! Instances.

use super::class::CimClass;
use super::name::CimName;
use super::path::{KeyBinding, ObjectPath};
use super::property::{add_unique, get_index, CimProperty};
use super::qualifier::{Qualifier, QualifierList};
use crate::error::ModelError;

/// A CIM instance.
///
/// The path is optional and set independently of the key properties.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CimInstance {
    class_name: CimName,
    path: Option<ObjectPath>,
    qualifiers: QualifierList,
    properties: Vec<CimProperty>,
}

impl CimInstance {
    /// Create an empty instance of `class_name`.
    #[must_use]
    pub fn new(class_name: CimName) -> Self {
        Self {
            class_name,
            path: None,
            qualifiers: QualifierList::new(),
            properties: Vec::new(),
        }
    }

    /// Get the class name.
    #[must_use]
    pub fn class_name(&self) -> &CimName {
        &self.class_name
    }

    /// Get the path, if set.
    #[must_use]
    pub fn path(&self) -> Option<&ObjectPath> {
        self.path.as_ref()
    }

    /// Set the path.
    pub fn set_path(&mut self, path: ObjectPath) {
        self.path = Some(path);
    }

    /// Get the qualifiers.
    #[must_use]
    pub fn qualifiers(&self) -> &QualifierList {
        &self.qualifiers
    }

    /// Append a qualifier.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::AlreadyExists`] for a duplicate name.
    pub fn add_qualifier(&mut self, qualifier: Qualifier) -> Result<(), ModelError> {
        self.qualifiers.add(qualifier)
    }

    /// Append a property.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::AlreadyExists`] for a duplicate name.
    pub fn add_property(&mut self, property: CimProperty) -> Result<(), ModelError> {
        add_unique(&mut self.properties, property, "property", CimProperty::name)
    }

    /// Find a property's index by name.
    #[must_use]
    pub fn find_property(&self, name: &str) -> Option<usize> {
        self.properties.iter().position(|p| p.name().eq_str(name))
    }

    /// Get a property by index.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::IndexOutOfBounds`] for a bad index.
    pub fn property(&self, index: usize) -> Result<&CimProperty, ModelError> {
        get_index(&self.properties, index)
    }

    /// Get a mutable property by index.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::IndexOutOfBounds`] for a bad index.
    pub fn property_mut(&mut self, index: usize) -> Result<&mut CimProperty, ModelError> {
        let len = self.properties.len();
        self.properties
            .get_mut(index)
            .ok_or(ModelError::IndexOutOfBounds { index, len })
    }

    /// Get a property by name.
    #[must_use]
    pub fn property_by_name(&self, name: &str) -> Option<&CimProperty> {
        self.find_property(name).map(|i| &self.properties[i])
    }

    /// Remove a property by index.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::IndexOutOfBounds`] for a bad index.
    pub fn remove_property(&mut self, index: usize) -> Result<CimProperty, ModelError> {
        get_index(&self.properties, index)?;
        Ok(self.properties.remove(index))
    }

    /// Get all properties in order.
    #[must_use]
    pub fn properties(&self) -> &[CimProperty] {
        &self.properties
    }

    /// Build the instance path from the key properties of `class`.
    ///
    /// Host and namespace are taken from the current path, if any.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::MissingKey`] if a key property is absent or
    /// null, and [`ModelError::TypeMismatch`] for a key of a type that
    /// cannot be a key.
    pub fn build_path(&self, class: &CimClass) -> Result<ObjectPath, ModelError> {
        let mut keys = Vec::new();
        for key in class.key_names() {
            let missing = || ModelError::MissingKey {
                class: self.class_name.to_string(),
                property: key.to_string(),
            };
            let property = self.property_by_name(key.as_str()).ok_or_else(missing)?;
            if property.value().is_null() {
                return Err(missing());
            }
            keys.push(KeyBinding::from_value(key.clone(), property.value())?);
        }

        let mut path = ObjectPath::new(self.class_name.clone()).with_keys(keys);
        if let Some(current) = &self.path {
            path.set_host(current.host());
            path.set_namespace(current.namespace().clone());
        }
        Ok(path)
    }
}
