//! Methods and parameters.

use super::name::CimName;
use super::property::{add_unique, get_index};
use super::qualifier::{Qualifier, QualifierList};
use super::types::CimType;
use crate::error::ModelError;

/// A method parameter declaration.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CimParameter {
    name: CimName,
    ty: CimType,
    is_array: bool,
    array_size: u32,
    reference_class: CimName,
    qualifiers: QualifierList,
}

impl CimParameter {
    /// Create a scalar parameter.
    #[must_use]
    pub fn new(name: CimName, ty: CimType) -> Self {
        Self {
            name,
            ty,
            is_array: false,
            array_size: 0,
            reference_class: CimName::null(),
            qualifiers: QualifierList::new(),
        }
    }

    /// Mark as array, with a fixed size or 0.
    #[must_use]
    pub fn with_array(mut self, array_size: u32) -> Self {
        self.is_array = true;
        self.array_size = array_size;
        self
    }

    /// Set the reference class.
    #[must_use]
    pub fn with_reference_class(mut self, class: CimName) -> Self {
        self.reference_class = class;
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

    /// Get the type.
    #[must_use]
    pub const fn cim_type(&self) -> CimType {
        self.ty
    }

    /// Check for an array parameter.
    #[must_use]
    pub const fn is_array(&self) -> bool {
        self.is_array
    }

    /// Get the fixed array size, 0 if variable.
    #[must_use]
    pub const fn array_size(&self) -> u32 {
        self.array_size
    }

    /// Get the reference class.
    #[must_use]
    pub fn reference_class(&self) -> &CimName {
        &self.reference_class
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
}

/// A method declaration.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CimMethod {
    name: CimName,
    return_type: CimType,
    class_origin: CimName,
    propagated: bool,
    qualifiers: QualifierList,
    parameters: Vec<CimParameter>,
}

impl CimMethod {
    /// Create a method with no parameters.
    #[must_use]
    pub fn new(name: CimName, return_type: CimType) -> Self {
        Self {
            name,
            return_type,
            class_origin: CimName::null(),
            propagated: false,
            qualifiers: QualifierList::new(),
            parameters: Vec::new(),
        }
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

    /// Get the name.
    #[must_use]
    pub fn name(&self) -> &CimName {
        &self.name
    }

    /// Get the return type.
    #[must_use]
    pub const fn return_type(&self) -> CimType {
        self.return_type
    }

    /// Get the class origin.
    #[must_use]
    pub fn class_origin(&self) -> &CimName {
        &self.class_origin
    }

    /// Set the class origin.
    pub fn set_class_origin(&mut self, class_origin: CimName) {
        self.class_origin = class_origin;
    }

    /// Check whether the method was inherited.
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

    /// Append a parameter.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::AlreadyExists`] for a duplicate name.
    pub fn add_parameter(&mut self, parameter: CimParameter) -> Result<(), ModelError> {
        add_unique(&mut self.parameters, parameter, "parameter", CimParameter::name)
    }

    /// Find a parameter's index by name.
    #[must_use]
    pub fn find_parameter(&self, name: &str) -> Option<usize> {
        self.parameters.iter().position(|p| p.name.eq_str(name))
    }

    /// Get a parameter by index.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::IndexOutOfBounds`] for a bad index.
    pub fn parameter(&self, index: usize) -> Result<&CimParameter, ModelError> {
        get_index(&self.parameters, index)
    }

    /// Get all parameters in order.
    #[must_use]
    pub fn parameters(&self) -> &[CimParameter] {
        &self.parameters
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parameters_unique() {
        let mut m = CimMethod::new(CimName::new("Reboot").unwrap(), CimType::Uint32);
        m.add_parameter(CimParameter::new(CimName::new("Force").unwrap(), CimType::Boolean))
            .unwrap();
        m.add_parameter(
            CimParameter::new(CimName::new("Targets").unwrap(), CimType::String).with_array(0),
        )
        .unwrap();
        let dup = CimParameter::new(CimName::new("force").unwrap(), CimType::Boolean);
        assert!(matches!(
            m.add_parameter(dup),
            Err(ModelError::AlreadyExists { kind: "parameter", .. })
        ));
        assert_eq!(m.find_parameter("TARGETS"), Some(1));
        assert!(m.parameter(1).unwrap().is_array());
        assert!(m.parameter(2).is_err());
    }
}
