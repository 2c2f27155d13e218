//! CIM-XML request and response envelopes, and declaration documents.
//!
//! ```text
//! CIM
//! ├── MESSAGE
//! │   └── SIMPLEREQ | SIMPLERSP | SIMPLEEXPREQ | SIMPLEEXPRSP
//! │       └── [I|EXP]METHODCALL | [I|EXP]METHODRESPONSE
//! └── DECLARATION
//!     └── DECLGROUP | DECLGROUP.WITHNAME | DECLGROUP.WITHPATH
//! ```

use thiserror::Error;

use crate::convert::parse_boolean;
use crate::model::{
    CimClass, CimInstance, CimName, CimObject, CimType, CimValue, NamespaceName, ObjectPath,
    QualifierDecl, Scalar,
};

/// CIM version written by the encoder.
pub const CIM_VERSION: &str = "2.0";
/// DTD version written by the encoder.
pub const DTD_VERSION: &str = "2.0";
/// Protocol version written by the encoder.
pub const PROTOCOL_VERSION: &str = "1.0";

/// A `CIM` document holding one `MESSAGE`.
#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    /// `CIMVERSION` attribute of `CIM`.
    pub cim_version: String,
    /// `DTDVERSION` attribute of `CIM`.
    pub dtd_version: String,
    /// `ID` attribute of `MESSAGE`.
    pub id: String,
    /// `PROTOCOLVERSION` attribute of `MESSAGE`.
    pub protocol_version: String,
    /// The single request or response.
    pub body: MessageBody,
}

impl Message {
    /// Create a message with the default versions.
    #[must_use]
    pub fn new(id: impl Into<String>, body: MessageBody) -> Self {
        Self {
            cim_version: CIM_VERSION.into(),
            dtd_version: DTD_VERSION.into(),
            id: id.into(),
            protocol_version: PROTOCOL_VERSION.into(),
            body,
        }
    }

    /// Check whether the body is a request.
    #[must_use]
    pub const fn is_request(&self) -> bool {
        matches!(
            self.body,
            MessageBody::MethodCall(_) | MessageBody::IMethodCall(_) | MessageBody::ExportMethodCall(_)
        )
    }

    /// Get the method name of the body.
    #[must_use]
    pub fn method_name(&self) -> &CimName {
        match &self.body {
            MessageBody::MethodCall(c) => &c.name,
            MessageBody::IMethodCall(c) => &c.name,
            MessageBody::ExportMethodCall(c) => &c.name,
            MessageBody::MethodResponse(r) => &r.name,
            MessageBody::IMethodResponse(r) => &r.name,
            MessageBody::ExportMethodResponse(r) => &r.name,
        }
    }
}

/// The content of a `SIMPLEREQ`, `SIMPLERSP`, `SIMPLEEXPREQ` or
/// `SIMPLEEXPRSP`.
#[derive(Clone, Debug, PartialEq)]
pub enum MessageBody {
    /// `METHODCALL`: an extrinsic method invocation.
    MethodCall(MethodCall),
    /// `IMETHODCALL`: an intrinsic operation.
    IMethodCall(IMethodCall),
    /// `EXPMETHODCALL`: an export (indication delivery).
    ExportMethodCall(ExportMethodCall),
    /// `METHODRESPONSE`.
    MethodResponse(MethodResponse),
    /// `IMETHODRESPONSE`.
    IMethodResponse(IMethodResponse),
    /// `EXPMETHODRESPONSE`.
    ExportMethodResponse(ExportMethodResponse),
}

/// `<!ELEMENT METHODCALL ((LOCALCLASSPATH|LOCALINSTANCEPATH),PARAMVALUE*)>`
#[derive(Clone, Debug, PartialEq)]
pub struct MethodCall {
    /// Method name.
    pub name: CimName,
    /// Target class or instance, with its namespace.
    pub path: ObjectPath,
    /// Input parameters.
    pub params: Vec<ParamValue>,
}

/// `<!ELEMENT IMETHODCALL (LOCALNAMESPACEPATH,IPARAMVALUE*)>`
#[derive(Clone, Debug, PartialEq)]
pub struct IMethodCall {
    /// Operation name, e.g. `GetInstance`.
    pub name: CimName,
    /// Target namespace.
    pub namespace: NamespaceName,
    /// Input parameters.
    pub params: Vec<IParamValue>,
}

/// `<!ELEMENT EXPMETHODCALL (EXPPARAMVALUE*)>`
#[derive(Clone, Debug, PartialEq)]
pub struct ExportMethodCall {
    /// Export method name, e.g. `ExportIndication`.
    pub name: CimName,
    /// Parameters.
    pub params: Vec<ExportParamValue>,
}

/// `<!ELEMENT METHODRESPONSE (ERROR|(RETURNVALUE?,PARAMVALUE*))>`
#[derive(Clone, Debug, PartialEq)]
pub struct MethodResponse {
    /// Method name.
    pub name: CimName,
    /// Failure, in which case nothing else is set.
    pub error: Option<CimError>,
    /// `RETURNVALUE`, if present.
    pub return_value: Option<CimValue>,
    /// Output parameters.
    pub params: Vec<ParamValue>,
}

/// `<!ELEMENT IMETHODRESPONSE (ERROR|(IRETURNVALUE?,PARAMVALUE*))>`
#[derive(Clone, Debug, PartialEq)]
pub struct IMethodResponse {
    /// Operation name.
    pub name: CimName,
    /// Failure, in which case nothing else is set.
    pub error: Option<CimError>,
    /// `IRETURNVALUE`, if present.
    pub return_value: Option<IValue>,
    /// Output parameters of pull operations.
    pub params: Vec<ParamValue>,
}

/// `<!ELEMENT EXPMETHODRESPONSE (ERROR|IRETURNVALUE?)>`
#[derive(Clone, Debug, PartialEq)]
pub struct ExportMethodResponse {
    /// Export method name.
    pub name: CimName,
    /// Failure.
    pub error: Option<CimError>,
    /// `IRETURNVALUE`, if present.
    pub return_value: Option<IValue>,
}

/// `PARAMVALUE`: a named extrinsic parameter.
///
/// Untyped parameters (no `PARAMTYPE`) decode as strings with
/// `is_typed == false`, and the caller reinterprets them against the
/// method declaration.
#[derive(Clone, Debug, PartialEq)]
pub struct ParamValue {
    /// Parameter name.
    pub name: String,
    /// The value.
    pub value: CimValue,
    /// Whether the element carried a `PARAMTYPE`.
    pub is_typed: bool,
}

impl ParamValue {
    /// Create a typed parameter.
    #[must_use]
    pub fn new(name: impl Into<String>, value: CimValue) -> Self {
        Self {
            name: name.into(),
            value,
            is_typed: true,
        }
    }
}

/// `IPARAMVALUE`: a named intrinsic parameter.
#[derive(Clone, Debug, PartialEq)]
pub struct IParamValue {
    /// Parameter name.
    pub name: String,
    /// The content; [`IValue::Empty`] for a null parameter.
    pub value: IValue,
}

/// `<!ELEMENT EXPPARAMVALUE (INSTANCE?)>`
#[derive(Clone, Debug, PartialEq)]
pub struct ExportParamValue {
    /// Parameter name.
    pub name: String,
    /// The indication instance, if any.
    pub instance: Option<CimInstance>,
}

/// The content of an `IPARAMVALUE` or `IRETURNVALUE`.
///
/// Plain values carry no type on the wire and decode as strings;
/// [`IValue::as_boolean`] reads the common boolean parameters.
#[derive(Clone, Debug, PartialEq)]
pub enum IValue {
    /// No content.
    Empty,
    /// `VALUE`, `VALUE.ARRAY` or `VALUE.REFERENCE`.
    Value(CimValue),
    /// `CLASSNAME*`.
    ClassNames(Vec<CimName>),
    /// `INSTANCENAME*`.
    InstanceNames(Vec<ObjectPath>),
    /// `QUALIFIER.DECLARATION*`.
    QualifierDecls(Vec<QualifierDecl>),
    /// `CLASS*`.
    Classes(Vec<CimClass>),
    /// `INSTANCE*`.
    Instances(Vec<CimInstance>),
    /// `VALUE.NAMEDINSTANCE*`, paths set on the instances.
    NamedInstances(Vec<CimInstance>),
    /// `VALUE.OBJECT*`.
    Objects(Vec<CimObject>),
    /// `VALUE.OBJECTWITHPATH*`, paths set on the objects.
    ObjectsWithPath(Vec<CimObject>),
    /// `VALUE.OBJECTWITHLOCALPATH*`, paths set on the objects.
    ObjectsWithLocalPath(Vec<CimObject>),
    /// `OBJECTPATH*`.
    ObjectPaths(Vec<ObjectPath>),
    /// `INSTANCEPATH*`.
    InstancePaths(Vec<ObjectPath>),
    /// `VALUE.INSTANCEWITHPATH*`, paths set on the instances.
    InstancesWithPath(Vec<CimInstance>),
}

impl IValue {
    /// Read a plain `TRUE`/`FALSE` value, case-insensitively.
    #[must_use]
    pub fn as_boolean(&self) -> Option<bool> {
        match self {
            Self::Value(CimValue::Scalar(Scalar::Boolean(b))) => Some(*b),
            Self::Value(CimValue::Scalar(Scalar::String(s))) => parse_boolean(s),
            _ => None,
        }
    }

    /// Number of items: 0 for empty, 1 for a value.
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::Empty => 0,
            Self::Value(_) => 1,
            Self::ClassNames(v) => v.len(),
            Self::InstanceNames(v) | Self::ObjectPaths(v) | Self::InstancePaths(v) => v.len(),
            Self::QualifierDecls(v) => v.len(),
            Self::Classes(v) => v.len(),
            Self::Instances(v) | Self::NamedInstances(v) | Self::InstancesWithPath(v) => v.len(),
            Self::Objects(v) | Self::ObjectsWithPath(v) | Self::ObjectsWithLocalPath(v) => v.len(),
        }
    }

    /// Check whether [`len`](Self::len) is zero.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Name of the element kind the content is made of.
    #[must_use]
    pub const fn element_name(&self) -> &'static str {
        match self {
            Self::Empty => "",
            Self::Value(v) => match v {
                CimValue::Array { ty: CimType::Reference, .. } => "VALUE.REFARRAY",
                CimValue::Array { .. } => "VALUE.ARRAY",
                CimValue::Scalar(Scalar::Reference(_)) => "VALUE.REFERENCE",
                _ => "VALUE",
            },
            Self::ClassNames(_) => "CLASSNAME",
            Self::InstanceNames(_) => "INSTANCENAME",
            Self::QualifierDecls(_) => "QUALIFIER.DECLARATION",
            Self::Classes(_) => "CLASS",
            Self::Instances(_) => "INSTANCE",
            Self::NamedInstances(_) => "VALUE.NAMEDINSTANCE",
            Self::Objects(_) => "VALUE.OBJECT",
            Self::ObjectsWithPath(_) => "VALUE.OBJECTWITHPATH",
            Self::ObjectsWithLocalPath(_) => "VALUE.OBJECTWITHLOCALPATH",
            Self::ObjectPaths(_) => "OBJECTPATH",
            Self::InstancePaths(_) => "INSTANCEPATH",
            Self::InstancesWithPath(_) => "VALUE.INSTANCEWITHPATH",
        }
    }
}

/// `<!ELEMENT ERROR (INSTANCE*)>`: a failed operation.
#[derive(Clone, Debug, PartialEq, Error)]
#[error("CIM error {code}: {description}")]
pub struct CimError {
    /// DMTF status code, e.g. 6 for `CIM_ERR_NOT_FOUND`.
    pub code: u32,
    /// `DESCRIPTION` attribute, empty if absent.
    pub description: String,
    /// `CIM_Error` instances giving detail.
    pub instances: Vec<CimInstance>,
}

impl CimError {
    /// Create an error with no detail instances.
    #[must_use]
    pub fn new(code: u32, description: impl Into<String>) -> Self {
        Self {
            code,
            description: description.into(),
            instances: Vec::new(),
        }
    }
}

/// A `CIM` document holding a `DECLARATION`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Declaration {
    /// `CIMVERSION` attribute of `CIM`.
    pub cim_version: String,
    /// `DTDVERSION` attribute of `CIM`.
    pub dtd_version: String,
    /// The groups, in document order.
    pub groups: Vec<DeclGroup>,
}

impl Declaration {
    /// Create an empty declaration with the default versions.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cim_version: CIM_VERSION.into(),
            dtd_version: DTD_VERSION.into(),
            groups: Vec::new(),
        }
    }

    /// All qualifier declarations across groups.
    pub fn qualifier_decls(&self) -> impl Iterator<Item = &QualifierDecl> {
        self.groups.iter().flat_map(|g| g.qualifier_decls.iter())
    }

    /// All classes across groups.
    pub fn classes(&self) -> impl Iterator<Item = &CimClass> {
        self.groups
            .iter()
            .flat_map(|g| g.objects.iter())
            .filter_map(CimObject::as_class)
    }

    /// All instances across groups.
    pub fn instances(&self) -> impl Iterator<Item = &CimInstance> {
        self.groups
            .iter()
            .flat_map(|g| g.objects.iter())
            .filter_map(CimObject::as_instance)
    }
}

/// Which of the three `DECLGROUP` elements a group came from.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum DeclGroupKind {
    /// `DECLGROUP`: objects as `VALUE.OBJECT`.
    #[default]
    Plain,
    /// `DECLGROUP.WITHNAME`: objects as `VALUE.NAMEDOBJECT`.
    WithName,
    /// `DECLGROUP.WITHPATH`: objects with full or local paths.
    WithPath,
}

/// One declaration group.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DeclGroup {
    /// Element kind.
    pub kind: DeclGroupKind,
    /// Host of a leading `NAMESPACEPATH`, empty if none.
    pub host: String,
    /// Namespace of a leading namespace path, null if none.
    pub namespace: NamespaceName,
    /// Qualifier declarations.
    pub qualifier_decls: Vec<QualifierDecl>,
    /// Classes and instances.
    pub objects: Vec<CimObject>,
}

impl DeclGroup {
    /// Create an empty group of `kind`.
    #[must_use]
    pub fn new(kind: DeclGroupKind) -> Self {
        Self {
            kind,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ivalue_as_boolean() {
        assert_eq!(IValue::Value(CimValue::from("True")).as_boolean(), Some(true));
        assert_eq!(IValue::Value(CimValue::from(false)).as_boolean(), Some(false));
        assert_eq!(IValue::Value(CimValue::from("yes")).as_boolean(), None);
        assert_eq!(IValue::Empty.as_boolean(), None);
    }

    #[test]
    fn test_ivalue_element_names() {
        let class = CimName::new("C").unwrap();
        let reference = IValue::Value(CimValue::from(ObjectPath::new(class.clone())));
        assert_eq!(reference.element_name(), "VALUE.REFERENCE");
        assert_eq!(IValue::ClassNames(vec![class]).element_name(), "CLASSNAME");
        assert_eq!(IValue::Empty.len(), 0);
    }

    #[test]
    fn test_cim_error_display() {
        let err = CimError::new(6, "Instance not found");
        assert_eq!(err.to_string(), "CIM error 6: Instance not found");
    }

    #[test]
    fn test_message_accessors() {
        let body = MessageBody::IMethodCall(IMethodCall {
            name: CimName::new("EnumerateClasses").unwrap(),
            namespace: NamespaceName::new("root/cimv2").unwrap(),
            params: Vec::new(),
        });
        let message = Message::new("1001", body);
        assert!(message.is_request());
        assert_eq!(message.method_name().as_str(), "EnumerateClasses");
        assert_eq!(message.protocol_version, PROTOCOL_VERSION);
    }
}
