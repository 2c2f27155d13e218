//! cimxml-core: CIM data model and CIM-XML codec
//!
//! This crate holds the CIM object model (classes, instances, qualifiers,
//! typed values, object paths) and the CIM-XML decoder and encoder for it.
//! It does no IO: every entry point works on strings.
//!
//! ```
//! use cimxml_core::{decode_instance, encode_instance, CimValue};
//!
//! let xml = r#"<INSTANCE CLASSNAME="TST_Person">
//!   <PROPERTY NAME="Name" TYPE="string"><VALUE>Mike</VALUE></PROPERTY>
//! </INSTANCE>"#;
//! let instance = decode_instance(xml).unwrap();
//! let name = instance.property_by_name("name").unwrap();
//! assert_eq!(name.value(), &CimValue::from("Mike"));
//! assert_eq!(decode_instance(&encode_instance(&instance)).unwrap(), instance);
//! ```

pub mod convert;
pub mod error;
pub mod lexer;
pub mod message;
pub mod model;
pub mod options;
pub mod parser;
pub mod writer;

pub use error::{DecodeError, DecodeErrorKind, ModelError};
pub use message::{Declaration, Message, MessageBody};
pub use model::{
    CimClass, CimInstance, CimName, CimObject, CimProperty, CimType, CimValue, DateTime,
    NamespaceName, ObjectPath, Scalar, Schema,
};
pub use options::{DecodeOptions, WriteOptions};
pub use parser::{
    decode_class, decode_declaration, decode_document, decode_instance, decode_message,
    decode_object, decode_qualifier_decl, decode_value, Decoder,
};
pub use writer::{
    encode_class, encode_declaration, encode_instance, encode_message, encode_object,
    encode_qualifier_decl, encode_value,
};
