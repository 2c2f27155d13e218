//! Class declarations and inheritance resolution.

use super::instance::CimInstance;
use super::method::CimMethod;
use super::name::CimName;
use super::path::ObjectPath;
use super::property::{add_unique, get_index, CimProperty};
use super::qualifier::{Qualifier, QualifierList};
use super::types::CimType;
use crate::error::ModelError;
use crate::options::WriteOptions;

/// A CIM class.
///
/// Properties and methods are unique by name and keep declaration order.
/// After [`resolve`](Self::resolve), inherited members come first.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CimClass {
    class_name: CimName,
    superclass: CimName,
    path: Option<ObjectPath>,
    qualifiers: QualifierList,
    properties: Vec<CimProperty>,
    methods: Vec<CimMethod>,
}

impl CimClass {
    /// Create an empty class. A null `superclass` makes it a root class.
    #[must_use]
    pub fn new(class_name: CimName, superclass: CimName) -> Self {
        Self {
            class_name,
            superclass,
            path: None,
            qualifiers: QualifierList::new(),
            properties: Vec::new(),
            methods: Vec::new(),
        }
    }

    /// Get the class name.
    #[must_use]
    pub fn class_name(&self) -> &CimName {
        &self.class_name
    }

    /// Get the superclass name, null for a root class.
    #[must_use]
    pub fn superclass(&self) -> &CimName {
        &self.superclass
    }

    /// Get the class path, if one was attached.
    #[must_use]
    pub fn path(&self) -> Option<&ObjectPath> {
        self.path.as_ref()
    }

    /// Attach a class path.
    pub fn set_path(&mut self, path: ObjectPath) {
        self.path = Some(path);
    }

    // === Qualifiers ===

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

    /// Check for an `Association` qualifier set to true.
    #[must_use]
    pub fn is_association(&self) -> bool {
        self.qualifiers.is_true("Association")
    }

    /// Check for an `Abstract` qualifier set to true.
    #[must_use]
    pub fn is_abstract(&self) -> bool {
        self.qualifiers.is_true("Abstract")
    }

    // === Properties ===

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

    /// Check whether any property is a key.
    #[must_use]
    pub fn has_keys(&self) -> bool {
        self.properties.iter().any(CimProperty::is_key)
    }

    /// Names of the key properties, in property order.
    #[must_use]
    pub fn key_names(&self) -> Vec<CimName> {
        self.properties
            .iter()
            .filter(|p| p.is_key())
            .map(|p| p.name().clone())
            .collect()
    }

    // === Methods ===

    /// Append a method.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::AlreadyExists`] for a duplicate name.
    pub fn add_method(&mut self, method: CimMethod) -> Result<(), ModelError> {
        add_unique(&mut self.methods, method, "method", CimMethod::name)
    }

    /// Find a method's index by name.
    #[must_use]
    pub fn find_method(&self, name: &str) -> Option<usize> {
        self.methods.iter().position(|m| m.name().eq_str(name))
    }

    /// Get a method by index.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::IndexOutOfBounds`] for a bad index.
    pub fn method(&self, index: usize) -> Result<&CimMethod, ModelError> {
        get_index(&self.methods, index)
    }

    /// Get all methods in order.
    #[must_use]
    pub fn methods(&self) -> &[CimMethod] {
        &self.methods
    }

    // === Derived objects ===

    /// Build an instance skeleton holding the class's property defaults.
    ///
    /// Names in the property list that the class does not have are
    /// ignored.
    #[must_use]
    pub fn build_instance(&self, options: &WriteOptions) -> CimInstance {
        let mut instance = CimInstance::new(self.class_name.clone());
        instance.set_path(ObjectPath::new(self.class_name.clone()));

        if options.include_qualifiers {
            for q in &self.qualifiers {
                // Names are unique in the source list.
                let _ = instance.add_qualifier(q.clone());
            }
        }

        for p in &self.properties {
            if !options.includes_property(p.name()) {
                continue;
            }
            let mut p = if options.include_qualifiers {
                p.clone()
            } else {
                p.without_qualifiers()
            };
            if !options.include_class_origin {
                p.set_class_origin(CimName::null());
            }
            let _ = instance.add_property(p);
        }
        instance
    }

    /// Resolve inheritance against the superclass.
    ///
    /// Local members get their class origin, inherited members not
    /// overridden are prepended with `propagated` set, and overriding
    /// properties pick up superclass qualifiers they lack. Qualifiers
    /// without the `TOSUBCLASS` flavor stay with the superclass.
    ///
    /// # Errors
    ///
    /// - [`ModelError::NoSuchClass`] if a superclass is named but `None`
    ///   was given.
    /// - [`ModelError::InvalidSuperclass`] if the given class is not the
    ///   named superclass.
    /// - [`ModelError::NonAssociationReference`] for a reference property
    ///   on a class that is not an association.
    pub fn resolve(&mut self, superclass: Option<&CimClass>) -> Result<(), ModelError> {
        let superclass = match superclass {
            Some(given) if given.class_name != self.superclass => {
                return Err(ModelError::InvalidSuperclass {
                    class: self.class_name.to_string(),
                    superclass: given.class_name.to_string(),
                });
            }
            None if !self.superclass.is_null() => {
                return Err(ModelError::NoSuchClass(self.superclass.to_string()));
            }
            given => given,
        };

        if !self.is_association() {
            if let Some(p) = self
                .properties
                .iter()
                .find(|p| p.cim_type() == CimType::Reference)
            {
                return Err(ModelError::NonAssociationReference {
                    class: self.class_name.to_string(),
                    property: p.name().to_string(),
                });
            }
        }

        let Some(superclass) = superclass else {
            for p in &mut self.properties {
                p.set_class_origin(self.class_name.clone());
                p.set_propagated(false);
            }
            for m in &mut self.methods {
                m.set_class_origin(self.class_name.clone());
                m.set_propagated(false);
            }
            return Ok(());
        };

        for p in &mut self.properties {
            match superclass.property_by_name(p.name().as_str()) {
                None => {
                    if p.class_origin().is_null() {
                        p.set_class_origin(self.class_name.clone());
                    }
                    p.set_propagated(false);
                }
                Some(inherited) => {
                    if p.class_origin().is_null() {
                        p.set_class_origin(inherited.class_origin().clone());
                    }
                    for q in inherited.qualifiers() {
                        if !q.flavor().is_to_subclass() {
                            continue;
                        }
                        if p.qualifiers().find(q.name().as_str()).is_none() {
                            let _ = p.qualifiers_mut().add(q.clone());
                        }
                    }
                }
            }
        }

        let mut inherited_props = Vec::new();
        for p in superclass.properties() {
            if self.find_property(p.name().as_str()).is_none() {
                let mut p = p.clone().with_propagated(true);
                p.qualifiers_mut().retain(|q| q.flavor().is_to_subclass());
                inherited_props.push(p);
            }
        }
        self.properties.splice(0..0, inherited_props);

        for m in &mut self.methods {
            match superclass.find_method(m.name().as_str()) {
                None => {
                    if m.class_origin().is_null() {
                        m.set_class_origin(self.class_name.clone());
                    }
                    m.set_propagated(false);
                }
                Some(index) => {
                    if m.class_origin().is_null() {
                        m.set_class_origin(superclass.methods[index].class_origin().clone());
                    }
                }
            }
        }

        let mut inherited_methods = Vec::new();
        for m in superclass.methods() {
            if self.find_method(m.name().as_str()).is_none() {
                inherited_methods.push(m.clone().with_propagated(true));
            }
        }
        self.methods.splice(0..0, inherited_methods);

        Ok(())
    }
}
