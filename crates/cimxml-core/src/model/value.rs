//! Typed CIM values.

use std::fmt;

use super::class::CimClass;
use super::datetime::DateTime;
use super::instance::CimInstance;
use super::object::CimObject;
use super::path::ObjectPath;
use super::types::CimType;
use crate::convert::{format_real32, format_real64};
use crate::error::{ModelError, TypeDesc};

/// One non-null element of a value.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Scalar {
    /// boolean.
    Boolean(bool),
    /// uint8.
    Uint8(u8),
    /// sint8.
    Sint8(i8),
    /// uint16.
    Uint16(u16),
    /// sint16.
    Sint16(i16),
    /// uint32.
    Uint32(u32),
    /// sint32.
    Sint32(i32),
    /// uint64.
    Uint64(u64),
    /// sint64.
    Sint64(i64),
    /// real32.
    Real32(f32),
    /// real64.
    Real64(f64),
    /// char16. Always within the basic multilingual plane.
    Char16(char),
    /// string.
    String(String),
    /// datetime.
    DateTime(DateTime),
    /// reference.
    Reference(ObjectPath),
    /// Embedded class or instance.
    Object(Box<CimObject>),
    /// Embedded instance.
    Instance(Box<CimInstance>),
}

impl Scalar {
    /// Get the CIM type of this element.
    #[must_use]
    pub const fn cim_type(&self) -> CimType {
        match self {
            Self::Boolean(_) => CimType::Boolean,
            Self::Uint8(_) => CimType::Uint8,
            Self::Sint8(_) => CimType::Sint8,
            Self::Uint16(_) => CimType::Uint16,
            Self::Sint16(_) => CimType::Sint16,
            Self::Uint32(_) => CimType::Uint32,
            Self::Sint32(_) => CimType::Sint32,
            Self::Uint64(_) => CimType::Uint64,
            Self::Sint64(_) => CimType::Sint64,
            Self::Real32(_) => CimType::Real32,
            Self::Real64(_) => CimType::Real64,
            Self::Char16(_) => CimType::Char16,
            Self::String(_) => CimType::String,
            Self::DateTime(_) => CimType::DateTime,
            Self::Reference(_) => CimType::Reference,
            Self::Object(_) => CimType::Object,
            Self::Instance(_) => CimType::Instance,
        }
    }

    /// The value an empty `<VALUE/>` array slot stands for.
    ///
    /// Returns `None` for types without a meaningful default (references
    /// and embedded objects).
    #[must_use]
    pub fn default_for(ty: CimType) -> Option<Self> {
        Some(match ty {
            CimType::Boolean => Self::Boolean(false),
            CimType::Uint8 => Self::Uint8(0),
            CimType::Sint8 => Self::Sint8(0),
            CimType::Uint16 => Self::Uint16(0),
            CimType::Sint16 => Self::Sint16(0),
            CimType::Uint32 => Self::Uint32(0),
            CimType::Sint32 => Self::Sint32(0),
            CimType::Uint64 => Self::Uint64(0),
            CimType::Sint64 => Self::Sint64(0),
            CimType::Real32 => Self::Real32(0.0),
            CimType::Real64 => Self::Real64(0.0),
            CimType::Char16 => Self::Char16('\0'),
            CimType::String => Self::String(String::new()),
            CimType::DateTime => Self::DateTime(DateTime::default()),
            CimType::Reference | CimType::Object | CimType::Instance => return None,
        })
    }
}

impl fmt::Display for Scalar {
    /// The wire text form. Embedded objects render as their XML encoding.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Boolean(true) => f.write_str("TRUE"),
            Self::Boolean(false) => f.write_str("FALSE"),
            Self::Uint8(x) => write!(f, "{x}"),
            Self::Sint8(x) => write!(f, "{x}"),
            Self::Uint16(x) => write!(f, "{x}"),
            Self::Sint16(x) => write!(f, "{x}"),
            Self::Uint32(x) => write!(f, "{x}"),
            Self::Sint32(x) => write!(f, "{x}"),
            Self::Uint64(x) => write!(f, "{x}"),
            Self::Sint64(x) => write!(f, "{x}"),
            Self::Real32(x) => f.write_str(&format_real32(*x)),
            Self::Real64(x) => f.write_str(&format_real64(*x)),
            Self::Char16(c) => write!(f, "{c}"),
            Self::String(s) => f.write_str(s),
            Self::DateTime(d) => write!(f, "{d}"),
            Self::Reference(p) => write!(f, "{p}"),
            Self::Object(o) => f.write_str(&crate::writer::encode_object(o)),
            Self::Instance(i) => f.write_str(&crate::writer::encode_instance(i)),
        }
    }
}

/// A typed, possibly null, possibly array CIM value.
///
/// The type and array-ness are fixed when the value is created. Every
/// element of an array has the array's type.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum CimValue {
    /// A typed null.
    Null {
        /// Declared type.
        ty: CimType,
        /// Whether the null stands for an array.
        is_array: bool,
    },
    /// A single element.
    Scalar(Scalar),
    /// An array, possibly empty.
    Array {
        /// Element type.
        ty: CimType,
        /// Elements.
        items: Vec<Scalar>,
    },
}

impl CimValue {
    /// Create a typed null.
    #[must_use]
    pub const fn null(ty: CimType, is_array: bool) -> Self {
        Self::Null { ty, is_array }
    }

    /// Create an array value.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::TypeMismatch`] if an element does not have
    /// type `ty`.
    pub fn array(ty: CimType, items: Vec<Scalar>) -> Result<Self, ModelError> {
        if let Some(bad) = items.iter().find(|s| s.cim_type() != ty) {
            return Err(ModelError::TypeMismatch {
                expected: TypeDesc::new(ty, false),
                found: TypeDesc::new(bad.cim_type(), false),
            });
        }
        Ok(Self::Array { ty, items })
    }

    /// Get the declared type.
    #[must_use]
    pub fn cim_type(&self) -> CimType {
        match self {
            Self::Null { ty, .. } | Self::Array { ty, .. } => *ty,
            Self::Scalar(s) => s.cim_type(),
        }
    }

    /// Check whether this is an array (null arrays included).
    #[must_use]
    pub const fn is_array(&self) -> bool {
        match self {
            Self::Null { is_array, .. } => *is_array,
            Self::Scalar(_) => false,
            Self::Array { .. } => true,
        }
    }

    /// Check for null.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null { .. })
    }

    /// Get the type and array-ness.
    #[must_use]
    pub fn type_desc(&self) -> TypeDesc {
        TypeDesc::new(self.cim_type(), self.is_array())
    }

    /// Get the element of a non-null scalar.
    #[must_use]
    pub const fn as_scalar(&self) -> Option<&Scalar> {
        match self {
            Self::Scalar(s) => Some(s),
            _ => None,
        }
    }

    /// Get the elements of a non-null array.
    #[must_use]
    pub fn as_array(&self) -> Option<&[Scalar]> {
        match self {
            Self::Array { items, .. } => Some(items),
            _ => None,
        }
    }

    /// Number of elements: 0 for null, 1 for a scalar.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Null { .. } => 0,
            Self::Scalar(_) => 1,
            Self::Array { items, .. } => items.len(),
        }
    }

    /// Check whether [`len`](Self::len) is zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Replace the value, keeping the declared type and array-ness.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::TypeMismatch`] if `value` differs in type or
    /// array-ness.
    pub fn set(&mut self, value: CimValue) -> Result<(), ModelError> {
        self.check_type(value.cim_type(), value.is_array())?;
        *self = value;
        Ok(())
    }

    /// Set to null, keeping the declared type and array-ness.
    pub fn set_null(&mut self) {
        *self = Self::null(self.cim_type(), self.is_array());
    }

    fn check_type(&self, ty: CimType, is_array: bool) -> Result<(), ModelError> {
        if self.cim_type() == ty && self.is_array() == is_array {
            Ok(())
        } else {
            Err(ModelError::TypeMismatch {
                expected: self.type_desc(),
                found: TypeDesc::new(ty, is_array),
            })
        }
    }

    fn scalar_of(&self, ty: CimType) -> Result<Option<&Scalar>, ModelError> {
        self.check_type(ty, false)
            .map_err(|_| ModelError::TypeMismatch {
                expected: TypeDesc::new(ty, false),
                found: self.type_desc(),
            })?;
        Ok(self.as_scalar())
    }

    /// Get a boolean, `None` if null.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::TypeMismatch`] for any other type.
    pub fn get_boolean(&self) -> Result<Option<bool>, ModelError> {
        Ok(match self.scalar_of(CimType::Boolean)? {
            Some(Scalar::Boolean(b)) => Some(*b),
            _ => None,
        })
    }

    /// Get a string, `None` if null.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::TypeMismatch`] for any other type.
    pub fn get_string(&self) -> Result<Option<&str>, ModelError> {
        Ok(match self.scalar_of(CimType::String)? {
            Some(Scalar::String(s)) => Some(s.as_str()),
            _ => None,
        })
    }

    /// Get any unsigned integer widened to 64 bits, `None` if null.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::TypeMismatch`] for non-unsigned types.
    pub fn get_unsigned(&self) -> Result<Option<u64>, ModelError> {
        let ty = self.cim_type();
        if !ty.is_unsigned() || self.is_array() {
            return Err(ModelError::TypeMismatch {
                expected: TypeDesc::new(CimType::Uint64, false),
                found: self.type_desc(),
            });
        }
        Ok(match self.as_scalar() {
            Some(Scalar::Uint8(x)) => Some(u64::from(*x)),
            Some(Scalar::Uint16(x)) => Some(u64::from(*x)),
            Some(Scalar::Uint32(x)) => Some(u64::from(*x)),
            Some(Scalar::Uint64(x)) => Some(*x),
            _ => None,
        })
    }

    /// Get any signed integer widened to 64 bits, `None` if null.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::TypeMismatch`] for non-signed types.
    pub fn get_signed(&self) -> Result<Option<i64>, ModelError> {
        let ty = self.cim_type();
        if !ty.is_signed() || self.is_array() {
            return Err(ModelError::TypeMismatch {
                expected: TypeDesc::new(CimType::Sint64, false),
                found: self.type_desc(),
            });
        }
        Ok(match self.as_scalar() {
            Some(Scalar::Sint8(x)) => Some(i64::from(*x)),
            Some(Scalar::Sint16(x)) => Some(i64::from(*x)),
            Some(Scalar::Sint32(x)) => Some(i64::from(*x)),
            Some(Scalar::Sint64(x)) => Some(*x),
            _ => None,
        })
    }

    /// Get a reference, `None` if null.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::TypeMismatch`] for any other type.
    pub fn get_reference(&self) -> Result<Option<&ObjectPath>, ModelError> {
        Ok(match self.scalar_of(CimType::Reference)? {
            Some(Scalar::Reference(p)) => Some(p),
            _ => None,
        })
    }

    /// Get a datetime, `None` if null.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::TypeMismatch`] for any other type.
    pub fn get_datetime(&self) -> Result<Option<&DateTime>, ModelError> {
        Ok(match self.scalar_of(CimType::DateTime)? {
            Some(Scalar::DateTime(d)) => Some(d),
            _ => None,
        })
    }
}

impl fmt::Display for CimValue {
    /// Scalars print their wire form, arrays print comma-separated
    /// elements, null prints nothing.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null { .. } => Ok(()),
            Self::Scalar(s) => write!(f, "{s}"),
            Self::Array { items, .. } => {
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{item}")?;
                }
                Ok(())
            }
        }
    }
}

impl From<Scalar> for CimValue {
    fn from(s: Scalar) -> Self {
        Self::Scalar(s)
    }
}

macro_rules! impl_from_primitive {
    ($($t:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$t> for CimValue {
                fn from(x: $t) -> Self {
                    Self::Scalar(Scalar::$variant(x))
                }
            }
        )*
    };
}

impl_from_primitive! {
    bool => Boolean,
    u8 => Uint8,
    i8 => Sint8,
    u16 => Uint16,
    i16 => Sint16,
    u32 => Uint32,
    i32 => Sint32,
    u64 => Uint64,
    i64 => Sint64,
    f32 => Real32,
    f64 => Real64,
    String => String,
    DateTime => DateTime,
}

impl From<&str> for CimValue {
    fn from(s: &str) -> Self {
        Self::Scalar(Scalar::String(s.to_owned()))
    }
}

impl From<CimInstance> for CimValue {
    /// An embedded instance.
    fn from(instance: CimInstance) -> Self {
        Self::Scalar(Scalar::Instance(Box::new(instance)))
    }
}

impl From<CimClass> for CimValue {
    /// An embedded object holding a class.
    fn from(class: CimClass) -> Self {
        Self::Scalar(Scalar::Object(Box::new(CimObject::Class(class))))
    }
}

impl From<CimObject> for CimValue {
    fn from(object: CimObject) -> Self {
        Self::Scalar(Scalar::Object(Box::new(object)))
    }
}
