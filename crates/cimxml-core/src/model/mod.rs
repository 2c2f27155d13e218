//! CIM data model.
//!
//! The model is what the decoder produces and the writer consumes:
//!
//! ```text
//! CIM-XML text → Lexer → Decoder → [Model] → Writer → CIM-XML text
//! ```
//!
//! All types are plain owned values. Cloning gives an independent deep
//! copy, and `==` is deep structural equality (qualifiers, class origin
//! and propagated flags included). Names compare case-insensitively.
//!
//! # Usage
//!
//! ```ignore
//! let mut class = CimClass::new(CimName::new("TST_Person")?, CimName::null());
//! class.add_property(
//!     CimProperty::new(CimName::new("Name")?, CimValue::null(CimType::String, false))
//!         .with_qualifier(Qualifier::new(CimName::new("Key")?, CimValue::from(true)))?,
//! )?;
//! class.resolve(None)?;
//!
//! let instance = class.build_instance(&WriteOptions::default());
//! ```

mod class;
mod datetime;
mod instance;
mod method;
mod name;
mod object;
mod path;
mod property;
mod qualifier;
mod schema;
mod types;
mod value;

pub use class::CimClass;
pub use datetime::{DateTime, DateTimeKind, DATETIME_LEN};
pub use instance::CimInstance;
pub use method::{CimMethod, CimParameter};
pub use name::{is_legal_name, is_legal_namespace, CimName, NamespaceName};
pub use object::CimObject;
pub use path::{KeyBinding, KeyBindingKind, ObjectPath};
pub use property::CimProperty;
pub use qualifier::{Flavor, Qualifier, QualifierDecl, QualifierList, Scope};
pub use schema::Schema;
pub use types::CimType;
pub use value::{CimValue, Scalar};
