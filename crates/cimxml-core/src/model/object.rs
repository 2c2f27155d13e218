//! Class-or-instance objects.

use super::class::CimClass;
use super::instance::CimInstance;
use super::name::CimName;
use super::path::ObjectPath;
use super::property::CimProperty;
use super::qualifier::QualifierList;

/// Either a class or an instance, for places the wire allows both.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CimObject {
    /// A class.
    Class(CimClass),
    /// An instance.
    Instance(CimInstance),
}

impl CimObject {
    /// Check for a class.
    #[must_use]
    pub const fn is_class(&self) -> bool {
        matches!(self, Self::Class(_))
    }

    /// Check for an instance.
    #[must_use]
    pub const fn is_instance(&self) -> bool {
        matches!(self, Self::Instance(_))
    }

    /// Get the class, if this is one.
    #[must_use]
    pub const fn as_class(&self) -> Option<&CimClass> {
        match self {
            Self::Class(c) => Some(c),
            Self::Instance(_) => None,
        }
    }

    /// Get the instance, if this is one.
    #[must_use]
    pub const fn as_instance(&self) -> Option<&CimInstance> {
        match self {
            Self::Instance(i) => Some(i),
            Self::Class(_) => None,
        }
    }

    /// Get the class name (of the instance's class for instances).
    #[must_use]
    pub fn class_name(&self) -> &CimName {
        match self {
            Self::Class(c) => c.class_name(),
            Self::Instance(i) => i.class_name(),
        }
    }

    /// Get the path, if set.
    #[must_use]
    pub fn path(&self) -> Option<&ObjectPath> {
        match self {
            Self::Class(c) => c.path(),
            Self::Instance(i) => i.path(),
        }
    }

    /// Set the path.
    pub fn set_path(&mut self, path: ObjectPath) {
        match self {
            Self::Class(c) => c.set_path(path),
            Self::Instance(i) => i.set_path(path),
        }
    }

    /// Get the qualifiers.
    #[must_use]
    pub fn qualifiers(&self) -> &QualifierList {
        match self {
            Self::Class(c) => c.qualifiers(),
            Self::Instance(i) => i.qualifiers(),
        }
    }

    /// Get the properties.
    #[must_use]
    pub fn properties(&self) -> &[CimProperty] {
        match self {
            Self::Class(c) => c.properties(),
            Self::Instance(i) => i.properties(),
        }
    }
}

impl From<CimClass> for CimObject {
    fn from(class: CimClass) -> Self {
        Self::Class(class)
    }
}

impl From<CimInstance> for CimObject {
    fn from(instance: CimInstance) -> Self {
        Self::Instance(instance)
    }
}
