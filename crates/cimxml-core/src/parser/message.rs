//! `CIM` documents: message envelopes and declarations.

use super::{embedded_attr, name_attr, required_attr, type_attr, Decoder, Embedded};
use crate::convert::parse_unsigned;
use crate::error::DecodeError;
use crate::lexer::{EntryKind, XmlEntry};
use crate::message::{
    CimError, DeclGroup, DeclGroupKind, Declaration, ExportMethodCall, ExportMethodResponse,
    ExportParamValue, IMethodCall, IMethodResponse, IParamValue, IValue, Message, MessageBody,
    MethodCall, MethodResponse, ParamValue,
};
use crate::model::{CimObject, CimType, CimValue, Scalar};

/// Check a version string of the form `<major>.<digits>`.
fn is_supported_version(version: &str, major: &str) -> bool {
    version
        .strip_prefix(major)
        .and_then(|rest| rest.strip_prefix('.'))
        .is_some_and(|minor| !minor.is_empty() && minor.bytes().all(|b| b.is_ascii_digit()))
}

/// Get a version attribute and check it against `major`.
fn version_attr(
    entry: &XmlEntry,
    attr: &str,
    major: &str,
    missing_key: &'static str,
    unsupported_key: &'static str,
) -> Result<String, DecodeError> {
    let version = entry.attribute(attr).ok_or_else(|| {
        let arg = format!("{}.{attr}", entry.text);
        DecodeError::validation(entry.line, missing_key, format!("missing {arg} attribute"), vec![arg])
    })?;
    if !is_supported_version(version, major) {
        return Err(DecodeError::validation(
            entry.line,
            unsupported_key,
            format!("{attr} \"{version}\" is not supported"),
            vec![version.into()],
        ));
    }
    Ok(version.to_owned())
}

/// Get the required `NAME` of a call, response or parameter element.
fn call_name_attr(entry: &XmlEntry, key: &'static str) -> Result<String, DecodeError> {
    entry.attribute("NAME").map(str::to_owned).ok_or_else(|| {
        let arg = format!("{}.NAME", entry.text);
        DecodeError::validation(entry.line, key, format!("Missing {arg} attribute"), vec![arg])
    })
}

impl Decoder {
    /// `<CIM CIMVERSION="..." DTDVERSION="...">`, returning the versions.
    fn cim_start_tag(&mut self) -> Result<(String, String), DecodeError> {
        let entry = self.expect_start_tag("CIM")?;
        let cim_version = version_attr(
            &entry,
            "CIMVERSION",
            "2",
            "Common.XmlReader.MISSING_CIMVERSION_ATTRIBUTE",
            "Common.XmlReader.UNSUPPORTED_CIMVERSION",
        )?;
        let dtd_version = version_attr(
            &entry,
            "DTDVERSION",
            "2",
            "Common.XmlReader.MISSING_DTDVERSION_ATTRIBUTE",
            "Common.XmlReader.UNSUPPORTED_DTDVERSION",
        )?;
        Ok((cim_version, dtd_version))
    }

    /// A whole message document:
    /// `<?xml?>? <CIM><MESSAGE>(SIMPLEREQ|SIMPLERSP|SIMPLEEXPREQ|SIMPLEEXPRSP)</MESSAGE></CIM>`.
    ///
    /// # Errors
    ///
    /// Returns the first validation or semantic error found.
    pub fn expect_message(&mut self) -> Result<Message, DecodeError> {
        self.test_xml_declaration();
        let (cim_version, dtd_version) = self.cim_start_tag()?;

        let entry = self.expect_start_tag("MESSAGE")?;
        let id = required_attr(
            &entry,
            "ID",
            "Common.XmlReader.INVALID_MISSING_MESSAGE_ID_ATTRIBUTE",
            "Invalid or missing MESSAGE.ID attribute",
        )?
        .to_owned();
        let protocol_version = required_attr(
            &entry,
            "PROTOCOLVERSION",
            "Common.XmlReader.INVALID_MISSING_PROTOCOLVERSION_ATTRIBUTE",
            "Invalid or missing MESSAGE.PROTOCOLVERSION attribute",
        )?
        .to_owned();
        if !is_supported_version(&protocol_version, "1") {
            return Err(DecodeError::validation(
                entry.line,
                "Common.XmlReader.UNSUPPORTED_PROTOCOLVERSION",
                format!("PROTOCOLVERSION \"{protocol_version}\" is not supported"),
                vec![protocol_version],
            ));
        }

        let body = self.simple_element()?;
        self.expect_end_tag("MESSAGE")?;
        self.expect_end_tag("CIM")?;

        #[cfg(feature = "tracing")]
        tracing::trace!(id = %id, "decoder: MESSAGE");

        Ok(Message {
            cim_version,
            dtd_version,
            id,
            protocol_version,
            body,
        })
    }

    /// The single simple request or response of a message.
    fn simple_element(&mut self) -> Result<MessageBody, DecodeError> {
        let body = if self.test_start_tag("SIMPLEREQ").is_some() {
            let body = if let Some(call) = self.imethod_call_element()? {
                MessageBody::IMethodCall(call)
            } else if let Some(call) = self.method_call_element()? {
                MessageBody::MethodCall(call)
            } else {
                return Err(self.expected_one_of("IMETHODCALL or METHODCALL"));
            };
            self.expect_end_tag("SIMPLEREQ")?;
            body
        } else if self.test_start_tag("SIMPLERSP").is_some() {
            let body = if let Some(response) = self.imethod_response_element()? {
                MessageBody::IMethodResponse(response)
            } else if let Some(response) = self.method_response_element()? {
                MessageBody::MethodResponse(response)
            } else {
                return Err(self.expected_one_of("IMETHODRESPONSE or METHODRESPONSE"));
            };
            self.expect_end_tag("SIMPLERSP")?;
            body
        } else if self.test_start_tag("SIMPLEEXPREQ").is_some() {
            let call = self
                .export_method_call_element()?
                .ok_or_else(|| self.expected_one_of("EXPMETHODCALL"))?;
            self.expect_end_tag("SIMPLEEXPREQ")?;
            MessageBody::ExportMethodCall(call)
        } else if self.test_start_tag("SIMPLEEXPRSP").is_some() {
            let response = self
                .export_method_response_element()?
                .ok_or_else(|| self.expected_one_of("EXPMETHODRESPONSE"))?;
            self.expect_end_tag("SIMPLEEXPRSP")?;
            MessageBody::ExportMethodResponse(response)
        } else {
            return Err(self.expected_one_of("SIMPLEREQ, SIMPLERSP, SIMPLEEXPREQ or SIMPLEEXPRSP"));
        };
        Ok(body)
    }

    fn expected_one_of(&self, elements: &str) -> DecodeError {
        DecodeError::validation(
            self.next_line(),
            "Common.XmlReader.EXPECTED_ELEMENT",
            format!("expected {elements} element"),
            vec![elements.into()],
        )
    }

    // === Requests ===

    /// `<!ELEMENT IMETHODCALL (LOCALNAMESPACEPATH,IPARAMVALUE*)>`
    fn imethod_call_element(&mut self) -> Result<Option<IMethodCall>, DecodeError> {
        let Some(entry) = self.test_start_tag("IMETHODCALL") else {
            return Ok(None);
        };
        call_name_attr(&entry, "Common.XmlReader.MISSING_IMETHODCALL_ATTRIBUTE")?;
        let name = name_attr(&entry, "IMETHODCALL")?;
        let namespace = self.expect_local_namespace_path()?;
        let mut params = Vec::new();
        while let Some(param) = self.iparam_value_element()? {
            params.push(param);
        }
        self.expect_end_tag("IMETHODCALL")?;
        Ok(Some(IMethodCall {
            name,
            namespace,
            params,
        }))
    }

    /// `<!ELEMENT METHODCALL ((LOCALCLASSPATH|LOCALINSTANCEPATH),PARAMVALUE*)>`
    fn method_call_element(&mut self) -> Result<Option<MethodCall>, DecodeError> {
        let Some(entry) = self.test_start_tag("METHODCALL") else {
            return Ok(None);
        };
        call_name_attr(&entry, "Common.XmlReader.MISSING_METHODCALL_ATTRIBUTE")?;
        let name = name_attr(&entry, "METHODCALL")?;
        let path = self.expect_local_object_path()?;
        let mut params = Vec::new();
        while let Some(param) = self.param_value_element()? {
            params.push(param);
        }
        self.expect_end_tag("METHODCALL")?;
        Ok(Some(MethodCall { name, path, params }))
    }

    /// `<!ELEMENT EXPMETHODCALL (EXPPARAMVALUE*)>`
    fn export_method_call_element(&mut self) -> Result<Option<ExportMethodCall>, DecodeError> {
        let Some(entry) = self.test_start_tag("EXPMETHODCALL") else {
            return Ok(None);
        };
        call_name_attr(&entry, "Common.XmlReader.MISSING_EXPMETHODCALL_ATTRIBUTE")?;
        let name = name_attr(&entry, "EXPMETHODCALL")?;
        let mut params = Vec::new();
        while let Some(entry) = self.test_start_or_empty("EXPPARAMVALUE") {
            let param_name = call_name_attr(&entry, "Common.XmlReader.MISSING_EXPPARAMVALUE_ATTRIBUTE")?;
            let mut instance = None;
            if !entry.is_empty_tag() {
                instance = self.instance_element()?;
                self.expect_end_tag("EXPPARAMVALUE")?;
            }
            params.push(ExportParamValue {
                name: param_name,
                instance,
            });
        }
        self.expect_end_tag("EXPMETHODCALL")?;
        Ok(Some(ExportMethodCall { name, params }))
    }

    // === Responses ===

    /// `<!ELEMENT IMETHODRESPONSE (ERROR|(IRETURNVALUE?,PARAMVALUE*))>`
    fn imethod_response_element(&mut self) -> Result<Option<IMethodResponse>, DecodeError> {
        let Some(entry) = self.test_start_or_empty("IMETHODRESPONSE") else {
            return Ok(None);
        };
        call_name_attr(&entry, "Common.XmlReader.MISSING_IMETHODRESPONSE_ATTRIBUTE")?;
        let mut response = IMethodResponse {
            name: name_attr(&entry, "IMETHODRESPONSE")?,
            error: None,
            return_value: None,
            params: Vec::new(),
        };
        if !entry.is_empty_tag() {
            response.error = self.error_element()?;
            if response.error.is_none() {
                response.return_value = self.ireturn_value_element()?;
                while let Some(param) = self.param_value_element()? {
                    response.params.push(param);
                }
            }
            self.expect_end_tag("IMETHODRESPONSE")?;
        }
        Ok(Some(response))
    }

    /// `<!ELEMENT METHODRESPONSE (ERROR|(RETURNVALUE?,PARAMVALUE*))>`
    fn method_response_element(&mut self) -> Result<Option<MethodResponse>, DecodeError> {
        let Some(entry) = self.test_start_or_empty("METHODRESPONSE") else {
            return Ok(None);
        };
        call_name_attr(&entry, "Common.XmlReader.MISSING_METHODRESPONSE_ATTRIBUTE")?;
        let mut response = MethodResponse {
            name: name_attr(&entry, "METHODRESPONSE")?,
            error: None,
            return_value: None,
            params: Vec::new(),
        };
        if !entry.is_empty_tag() {
            response.error = self.error_element()?;
            if response.error.is_none() {
                response.return_value = self.return_value_element()?;
                while let Some(param) = self.param_value_element()? {
                    response.params.push(param);
                }
            }
            self.expect_end_tag("METHODRESPONSE")?;
        }
        Ok(Some(response))
    }

    /// `<!ELEMENT EXPMETHODRESPONSE (ERROR|IRETURNVALUE?)>`
    fn export_method_response_element(&mut self) -> Result<Option<ExportMethodResponse>, DecodeError> {
        let Some(entry) = self.test_start_or_empty("EXPMETHODRESPONSE") else {
            return Ok(None);
        };
        call_name_attr(&entry, "Common.XmlReader.MISSING_EXPMETHODRESPONSE_ATTRIBUTE")?;
        let mut response = ExportMethodResponse {
            name: name_attr(&entry, "EXPMETHODRESPONSE")?,
            error: None,
            return_value: None,
        };
        if !entry.is_empty_tag() {
            response.error = self.error_element()?;
            if response.error.is_none() {
                response.return_value = self.ireturn_value_element()?;
            }
            self.expect_end_tag("EXPMETHODRESPONSE")?;
        }
        Ok(Some(response))
    }

    /// `<!ELEMENT ERROR (INSTANCE*)>` with `CODE` and `DESCRIPTION`.
    fn error_element(&mut self) -> Result<Option<CimError>, DecodeError> {
        let Some(entry) = self.test_start_or_empty("ERROR") else {
            return Ok(None);
        };
        let code = required_attr(
            &entry,
            "CODE",
            "Common.XmlReader.MISSING_ERROR_CODE_ATTRIBUTE",
            "missing ERROR.CODE attribute",
        )?;
        let code = parse_unsigned(code)
            .and_then(|c| u32::try_from(c).ok())
            .ok_or_else(|| {
                DecodeError::semantic(
                    entry.line,
                    "Common.XmlReader.ILLEGAL_VALUE_FOR_ATTRIBUTE",
                    "Illegal value for ERROR.CODE attribute".into(),
                    vec!["ERROR.CODE".into()],
                )
            })?;
        let mut error = CimError::new(code, entry.attribute("DESCRIPTION").unwrap_or_default());
        if !entry.is_empty_tag() {
            while let Some(instance) = self.instance_element()? {
                error.instances.push(instance);
            }
            self.expect_end_tag("ERROR")?;
        }

        #[cfg(feature = "tracing")]
        tracing::debug!(code, "decoder: ERROR");

        Ok(Some(error))
    }

    // === Parameters and return values ===

    /// `<!ELEMENT PARAMVALUE (VALUE|VALUE.REFERENCE|VALUE.ARRAY|VALUE.REFARRAY)?>`
    ///
    /// Without `PARAMTYPE` a reference form is tried first and anything
    /// else decodes as a string.
    fn param_value_element(&mut self) -> Result<Option<ParamValue>, DecodeError> {
        let Some(entry) = self.test_start_or_empty("PARAMVALUE") else {
            return Ok(None);
        };
        let name = call_name_attr(&entry, "Common.XmlReader.MISSING_PARAMVALUE_ATTRIBUTE")?;
        let embedded = embedded_attr(&entry, "PARAMVALUE")?;
        let declared = type_attr(&entry, "PARAMVALUE", "PARAMTYPE", false)?;

        if entry.is_empty_tag() {
            return Ok(Some(ParamValue {
                name,
                value: CimValue::null(declared.unwrap_or(CimType::String), false),
                is_typed: declared.is_some(),
            }));
        }

        let mut is_typed = declared.is_some();
        let mut value = None;
        if matches!(declared, None | Some(CimType::Reference)) {
            if let Some(path) = self.value_reference_element()? {
                value = Some(CimValue::from(path));
            } else if let Some(paths) = self.value_reference_array_element()? {
                let items = paths.into_iter().map(Scalar::Reference).collect();
                value = Some(
                    CimValue::array(CimType::Reference, items)
                        .map_err(|e| DecodeError::model(self.line(), "Common.XmlReader.ARRAY_TYPE_MISMATCH", e))?,
                );
            }
            if value.is_some() {
                is_typed = true;
            }
        }

        let value = match value {
            Some(v) => v,
            None => {
                let ty = declared.unwrap_or(CimType::String);
                if embedded != Embedded::No && declared != Some(CimType::String) {
                    return Err(DecodeError::validation(
                        entry.line,
                        "Common.XmlReader.INVALID_EMBEDDEDOBJECT_TYPE",
                        "The EmbeddedObject attribute is only valid on string types.".into(),
                        Vec::new(),
                    ));
                }
                let ty = embedded.effective_type(ty);
                match self.value_array_element(ty)? {
                    Some(v) => v,
                    None => self.value_element(ty)?.unwrap_or(CimValue::null(ty, false)),
                }
            }
        };
        self.expect_end_tag("PARAMVALUE")?;
        Ok(Some(ParamValue {
            name,
            value,
            is_typed,
        }))
    }

    /// `<!ELEMENT RETURNVALUE (VALUE|VALUE.REFERENCE)?>`
    fn return_value_element(&mut self) -> Result<Option<CimValue>, DecodeError> {
        let Some(entry) = self.test_start_tag("RETURNVALUE") else {
            return Ok(None);
        };
        let embedded = embedded_attr(&entry, "RETURNVALUE")?;
        let declared = type_attr(&entry, "RETURNVALUE", "PARAMTYPE", false)?;

        let mut value = None;
        if matches!(declared, None | Some(CimType::Reference)) {
            value = self.value_reference_element()?.map(CimValue::from);
            if value.is_none() && declared == Some(CimType::Reference) {
                return Err(DecodeError::validation(
                    self.next_line(),
                    "Common.XmlReader.EXPECTED_VALUE_REFERENCE_ELEMENT",
                    "expected VALUE.REFERENCE element".into(),
                    Vec::new(),
                ));
            }
        }
        let value = match value {
            Some(v) => v,
            None => {
                if embedded != Embedded::No && declared != Some(CimType::String) {
                    return Err(DecodeError::validation(
                        entry.line,
                        "Common.XmlReader.INVALID_EMBEDDEDOBJECT_TYPE",
                        "The EmbeddedObject attribute is only valid on string types.".into(),
                        Vec::new(),
                    ));
                }
                let ty = embedded.effective_type(declared.unwrap_or(CimType::String));
                self.value_element(ty)?.ok_or_else(|| {
                    DecodeError::validation(
                        self.next_line(),
                        "Common.XmlReader.EXPECTED_VALUE_ELEMENT",
                        "expected VALUE element".into(),
                        Vec::new(),
                    )
                })?
            }
        };
        self.expect_end_tag("RETURNVALUE")?;
        Ok(Some(value))
    }

    /// `IPARAMVALUE` with a `NAME` and optional content.
    fn iparam_value_element(&mut self) -> Result<Option<IParamValue>, DecodeError> {
        let Some(entry) = self.test_start_or_empty("IPARAMVALUE") else {
            return Ok(None);
        };
        let name = call_name_attr(&entry, "Common.XmlReader.MISSING_IPARAMVALUE_ATTRIBUTE")?;
        let mut value = IValue::Empty;
        if !entry.is_empty_tag() {
            value = self.ivalue_content()?;
            self.expect_end_tag("IPARAMVALUE")?;
        }
        Ok(Some(IParamValue { name, value }))
    }

    /// `IRETURNVALUE` with optional content.
    fn ireturn_value_element(&mut self) -> Result<Option<IValue>, DecodeError> {
        let Some(entry) = self.test_start_or_empty("IRETURNVALUE") else {
            return Ok(None);
        };
        let mut value = IValue::Empty;
        if !entry.is_empty_tag() {
            value = self.ivalue_content()?;
            self.expect_end_tag("IRETURNVALUE")?;
        }

        #[cfg(feature = "tracing")]
        tracing::trace!(kind = value.element_name(), len = value.len(), "decoder: IRETURNVALUE");

        Ok(Some(value))
    }

    /// Read every consecutive element `read` accepts.
    fn collect<T>(
        &mut self,
        read: fn(&mut Self) -> Result<Option<T>, DecodeError>,
    ) -> Result<Vec<T>, DecodeError> {
        let mut items = Vec::new();
        while let Some(item) = read(self)? {
            items.push(item);
        }
        Ok(items)
    }

    /// The content of an `IPARAMVALUE` or `IRETURNVALUE`, chosen by the
    /// first child element. A run holds one element kind only.
    fn ivalue_content(&mut self) -> Result<IValue, DecodeError> {
        let tag = match self.peek() {
            Some(e) if matches!(e.kind, EntryKind::StartTag | EntryKind::EmptyTag) => e.text.clone(),
            _ => return Ok(IValue::Empty),
        };
        let value = match tag.as_str() {
            "VALUE" | "VALUE.ARRAY" => IValue::Value(self.expect_value(CimType::String)?),
            "VALUE.REFERENCE" | "VALUE.REFARRAY" => IValue::Value(self.expect_value(CimType::Reference)?),
            "CLASSNAME" => IValue::ClassNames(self.collect(Self::class_name_element)?),
            "INSTANCENAME" => IValue::InstanceNames(self.collect(Self::instance_name_element)?),
            "QUALIFIER.DECLARATION" => IValue::QualifierDecls(self.collect(Self::qualifier_decl_element)?),
            "CLASS" => IValue::Classes(self.collect(Self::class_element)?),
            "INSTANCE" => IValue::Instances(self.collect(Self::instance_element)?),
            "VALUE.NAMEDINSTANCE" => IValue::NamedInstances(self.collect(Self::named_instance_element)?),
            "VALUE.OBJECT" => IValue::Objects(self.collect(Self::value_object_element)?),
            "VALUE.OBJECTWITHPATH" => {
                IValue::ObjectsWithPath(self.collect(Self::value_object_with_path_element)?)
            }
            "VALUE.OBJECTWITHLOCALPATH" => {
                IValue::ObjectsWithLocalPath(self.collect(Self::value_object_with_local_path_element)?)
            }
            "OBJECTPATH" => IValue::ObjectPaths(self.collect(Self::object_path_element)?),
            "INSTANCEPATH" => IValue::InstancePaths(self.collect(Self::instance_path_element)?),
            "VALUE.INSTANCEWITHPATH" => {
                IValue::InstancesWithPath(self.collect(Self::instance_with_path_element)?)
            }
            // Left for the caller's end tag check to report.
            _ => IValue::Empty,
        };
        Ok(value)
    }

    // === Declarations ===

    /// A whole declaration document:
    /// `<?xml?>? <CIM><DECLARATION>(DECLGROUP|DECLGROUP.WITHNAME|DECLGROUP.WITHPATH)+</DECLARATION></CIM>`.
    ///
    /// # Errors
    ///
    /// Returns the first validation or semantic error found.
    pub fn expect_declaration(&mut self) -> Result<Declaration, DecodeError> {
        self.test_xml_declaration();
        let (cim_version, dtd_version) = self.cim_start_tag()?;
        self.expect_start_tag("DECLARATION")?;

        let mut groups = Vec::new();
        while let Some(group) = self.decl_group_element()? {
            groups.push(group);
        }
        if groups.is_empty() {
            return Err(self.expected_one_of("DECLGROUP, DECLGROUP.WITHNAME or DECLGROUP.WITHPATH"));
        }

        self.expect_end_tag("DECLARATION")?;
        self.expect_end_tag("CIM")?;

        #[cfg(feature = "tracing")]
        tracing::trace!(groups = groups.len(), "decoder: DECLARATION");

        Ok(Declaration {
            cim_version,
            dtd_version,
            groups,
        })
    }

    /// Any of the three declaration group elements.
    fn decl_group_element(&mut self) -> Result<Option<DeclGroup>, DecodeError> {
        let (tag, kind) = if self.test_start_tag("DECLGROUP").is_some() {
            ("DECLGROUP", DeclGroupKind::Plain)
        } else if self.test_start_tag("DECLGROUP.WITHNAME").is_some() {
            ("DECLGROUP.WITHNAME", DeclGroupKind::WithName)
        } else if self.test_start_tag("DECLGROUP.WITHPATH").is_some() {
            ("DECLGROUP.WITHPATH", DeclGroupKind::WithPath)
        } else {
            return Ok(None);
        };
        let mut group = DeclGroup::new(kind);

        if kind == DeclGroupKind::WithPath {
            loop {
                if let Some(object) = self.value_object_with_path_element()? {
                    group.objects.push(object);
                } else if let Some(object) = self.value_object_with_local_path_element()? {
                    group.objects.push(object);
                } else {
                    break;
                }
            }
        } else {
            if let Some(namespace) = self.local_namespace_path_element()? {
                group.namespace = namespace;
            } else if let Some((host, namespace)) = self.namespace_path_element()? {
                group.host = host;
                group.namespace = namespace;
            }
            group.qualifier_decls = self.collect(Self::qualifier_decl_element)?;
            group.objects = if kind == DeclGroupKind::Plain {
                self.collect(Self::value_object_element)?
            } else {
                self.collect(Self::value_named_object_element)?
            };
        }

        self.expect_end_tag(tag)?;
        Ok(Some(group))
    }

    /// `<!ELEMENT VALUE.NAMEDOBJECT (CLASS|(INSTANCENAME,INSTANCE))>`
    fn value_named_object_element(&mut self) -> Result<Option<CimObject>, DecodeError> {
        if self.test_start_tag("VALUE.NAMEDOBJECT").is_none() {
            return Ok(None);
        }
        let object = if let Some(class) = self.class_element()? {
            CimObject::Class(class)
        } else {
            let path = self.expect_instance_name()?;
            let mut instance = self.expect_instance()?;
            instance.set_path(path);
            CimObject::Instance(instance)
        };
        self.expect_end_tag("VALUE.NAMEDOBJECT")?;
        Ok(Some(object))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn message(source: &str) -> Result<Message, DecodeError> {
        let mut d = Decoder::new(source)?;
        let message = d.expect_message()?;
        d.expect_end_of_input()?;
        Ok(message)
    }

    const GET_INSTANCE: &str = r#"<?xml version="1.0" encoding="utf-8"?>
<CIM CIMVERSION="2.0" DTDVERSION="2.0">
<MESSAGE ID="1001" PROTOCOLVERSION="1.0">
<SIMPLEREQ>
<IMETHODCALL NAME="GetInstance">
<LOCALNAMESPACEPATH><NAMESPACE NAME="root"/><NAMESPACE NAME="cimv2"/></LOCALNAMESPACEPATH>
<IPARAMVALUE NAME="InstanceName">
<INSTANCENAME CLASSNAME="TST_Person"><KEYBINDING NAME="Name"><KEYVALUE>Mike</KEYVALUE></KEYBINDING></INSTANCENAME>
</IPARAMVALUE>
<IPARAMVALUE NAME="LocalOnly"><VALUE>FALSE</VALUE></IPARAMVALUE>
<IPARAMVALUE NAME="PropertyList"/>
</IMETHODCALL>
</SIMPLEREQ>
</MESSAGE>
</CIM>"#;

    #[test]
    fn test_intrinsic_request() {
        let m = message(GET_INSTANCE).unwrap();
        assert_eq!(m.id, "1001");
        assert!(m.is_request());
        let MessageBody::IMethodCall(call) = m.body else {
            panic!("expected IMETHODCALL");
        };
        assert_eq!(call.name.as_str(), "GetInstance");
        assert_eq!(call.namespace.as_str(), "root/cimv2");
        assert_eq!(call.params.len(), 3);
        assert!(matches!(&call.params[0].value, IValue::InstanceNames(names) if names.len() == 1));
        assert_eq!(call.params[1].value.as_boolean(), Some(false));
        assert_eq!(call.params[2].value, IValue::Empty);
    }

    #[test]
    fn test_version_gates() {
        assert!(is_supported_version("2.0", "2"));
        assert!(is_supported_version("2.13", "2"));
        assert!(!is_supported_version("2.", "2"));
        assert!(!is_supported_version("2.1a", "2"));
        assert!(!is_supported_version("3.0", "2"));
        assert!(!is_supported_version("20.0", "2"));

        let err = message(&GET_INSTANCE.replace("CIMVERSION=\"2.0\"", "CIMVERSION=\"3.0\"")).unwrap_err();
        assert_eq!(err.key, "Common.XmlReader.UNSUPPORTED_CIMVERSION");
        let err = message(&GET_INSTANCE.replace("PROTOCOLVERSION=\"1.0\"", "PROTOCOLVERSION=\"1.x\"")).unwrap_err();
        assert_eq!(err.key, "Common.XmlReader.UNSUPPORTED_PROTOCOLVERSION");
        let err = message(&GET_INSTANCE.replace(" ID=\"1001\"", "")).unwrap_err();
        assert_eq!(err.key, "Common.XmlReader.INVALID_MISSING_MESSAGE_ID_ATTRIBUTE");
    }

    #[test]
    fn test_intrinsic_response() {
        let m = message(
            r#"<CIM CIMVERSION="2.0" DTDVERSION="2.0"><MESSAGE ID="7" PROTOCOLVERSION="1.0"><SIMPLERSP>
               <IMETHODRESPONSE NAME="EnumerateInstanceNames"><IRETURNVALUE>
                 <INSTANCENAME CLASSNAME="C"><KEYBINDING NAME="k"><KEYVALUE>1</KEYVALUE></KEYBINDING></INSTANCENAME>
                 <INSTANCENAME CLASSNAME="C"><KEYBINDING NAME="k"><KEYVALUE>2</KEYVALUE></KEYBINDING></INSTANCENAME>
               </IRETURNVALUE></IMETHODRESPONSE>
               </SIMPLERSP></MESSAGE></CIM>"#,
        )
        .unwrap();
        let MessageBody::IMethodResponse(response) = m.body else {
            panic!("expected IMETHODRESPONSE");
        };
        assert!(response.error.is_none());
        assert_eq!(response.return_value.map(|v| v.len()), Some(2));
    }

    #[test]
    fn test_error_response() {
        let m = message(
            r#"<CIM CIMVERSION="2.0" DTDVERSION="2.1"><MESSAGE ID="7" PROTOCOLVERSION="1.0"><SIMPLERSP>
               <IMETHODRESPONSE NAME="GetClass"><ERROR CODE="6" DESCRIPTION="CIM_ERR_NOT_FOUND: TST_Missing"/></IMETHODRESPONSE>
               </SIMPLERSP></MESSAGE></CIM>"#,
        )
        .unwrap();
        let MessageBody::IMethodResponse(response) = m.body else {
            panic!("expected IMETHODRESPONSE");
        };
        let error = response.error.unwrap();
        assert_eq!(error.code, 6);
        assert_eq!(error.description, "CIM_ERR_NOT_FOUND: TST_Missing");

        let err = message(
            r#"<CIM CIMVERSION="2.0" DTDVERSION="2.0"><MESSAGE ID="7" PROTOCOLVERSION="1.0"><SIMPLERSP>
               <IMETHODRESPONSE NAME="GetClass"><ERROR DESCRIPTION="x"/></IMETHODRESPONSE>
               </SIMPLERSP></MESSAGE></CIM>"#,
        )
        .unwrap_err();
        assert_eq!(err.key, "Common.XmlReader.MISSING_ERROR_CODE_ATTRIBUTE");
    }

    #[test]
    fn test_extrinsic_call_params() {
        let m = message(
            r#"<CIM CIMVERSION="2.0" DTDVERSION="2.0"><MESSAGE ID="9" PROTOCOLVERSION="1.0"><SIMPLEREQ>
               <METHODCALL NAME="Reboot">
                 <LOCALINSTANCEPATH>
                   <LOCALNAMESPACEPATH><NAMESPACE NAME="root"/></LOCALNAMESPACEPATH>
                   <INSTANCENAME CLASSNAME="TST_Host"><KEYBINDING NAME="Name"><KEYVALUE>h1</KEYVALUE></KEYBINDING></INSTANCENAME>
                 </LOCALINSTANCEPATH>
                 <PARAMVALUE NAME="Delay" PARAMTYPE="uint32"><VALUE>30</VALUE></PARAMVALUE>
                 <PARAMVALUE NAME="Reason"><VALUE>maintenance</VALUE></PARAMVALUE>
                 <PARAMVALUE NAME="Target"><VALUE.REFERENCE><CLASSNAME NAME="TST_Host"/></VALUE.REFERENCE></PARAMVALUE>
                 <PARAMVALUE NAME="Nothing"/>
               </METHODCALL>
               </SIMPLEREQ></MESSAGE></CIM>"#,
        )
        .unwrap();
        let MessageBody::MethodCall(call) = m.body else {
            panic!("expected METHODCALL");
        };
        assert_eq!(call.path.namespace().as_str(), "root");
        assert!(call.path.is_instance_path());
        let p = &call.params;
        assert_eq!(p[0].value, CimValue::from(30u32));
        assert!(p[0].is_typed);
        assert_eq!(p[1].value, CimValue::from("maintenance"));
        assert!(!p[1].is_typed);
        assert_eq!(p[2].value.cim_type(), CimType::Reference);
        assert!(p[2].is_typed);
        assert_eq!(p[3].value, CimValue::null(CimType::String, false));
        assert!(!p[3].is_typed);
    }

    #[test]
    fn test_untyped_embedded_param_rejected() {
        let err = message(
            r#"<CIM CIMVERSION="2.0" DTDVERSION="2.0"><MESSAGE ID="9" PROTOCOLVERSION="1.0"><SIMPLEREQ>
               <METHODCALL NAME="M"><LOCALCLASSPATH><LOCALNAMESPACEPATH><NAMESPACE NAME="root"/></LOCALNAMESPACEPATH><CLASSNAME NAME="C"/></LOCALCLASSPATH>
                 <PARAMVALUE NAME="P" EmbeddedObject="instance"><VALUE>x</VALUE></PARAMVALUE>
               </METHODCALL>
               </SIMPLEREQ></MESSAGE></CIM>"#,
        )
        .unwrap_err();
        assert_eq!(err.key, "Common.XmlReader.INVALID_EMBEDDEDOBJECT_TYPE");
    }

    #[test]
    fn test_method_response_return_value() {
        let m = message(
            r#"<CIM CIMVERSION="2.0" DTDVERSION="2.0"><MESSAGE ID="9" PROTOCOLVERSION="1.0"><SIMPLERSP>
               <METHODRESPONSE NAME="Reboot">
                 <RETURNVALUE PARAMTYPE="uint32"><VALUE>0</VALUE></RETURNVALUE>
                 <PARAMVALUE NAME="Job" PARAMTYPE="string"><VALUE>j1</VALUE></PARAMVALUE>
               </METHODRESPONSE>
               </SIMPLERSP></MESSAGE></CIM>"#,
        )
        .unwrap();
        let MessageBody::MethodResponse(response) = m.body else {
            panic!("expected METHODRESPONSE");
        };
        assert_eq!(response.return_value, Some(CimValue::from(0u32)));
        assert_eq!(response.params.len(), 1);

        let err = message(
            r#"<CIM CIMVERSION="2.0" DTDVERSION="2.0"><MESSAGE ID="9" PROTOCOLVERSION="1.0"><SIMPLERSP>
               <METHODRESPONSE NAME="M"><RETURNVALUE PARAMTYPE="reference"><VALUE>x</VALUE></RETURNVALUE></METHODRESPONSE>
               </SIMPLERSP></MESSAGE></CIM>"#,
        )
        .unwrap_err();
        assert_eq!(err.key, "Common.XmlReader.EXPECTED_VALUE_REFERENCE_ELEMENT");
    }

    #[test]
    fn test_export_request() {
        let m = message(
            r#"<CIM CIMVERSION="2.0" DTDVERSION="2.0"><MESSAGE ID="3" PROTOCOLVERSION="1.0"><SIMPLEEXPREQ>
               <EXPMETHODCALL NAME="ExportIndication">
                 <EXPPARAMVALUE NAME="NewIndication"><INSTANCE CLASSNAME="CIM_AlertIndication"/></EXPPARAMVALUE>
               </EXPMETHODCALL>
               </SIMPLEEXPREQ></MESSAGE></CIM>"#,
        )
        .unwrap();
        let MessageBody::ExportMethodCall(call) = m.body else {
            panic!("expected EXPMETHODCALL");
        };
        assert_eq!(call.params[0].name, "NewIndication");
        assert!(call.params[0].instance.is_some());
    }

    #[test]
    fn test_missing_call_name() {
        let err = message(
            r#"<CIM CIMVERSION="2.0" DTDVERSION="2.0"><MESSAGE ID="3" PROTOCOLVERSION="1.0"><SIMPLEREQ>
               <IMETHODCALL><LOCALNAMESPACEPATH><NAMESPACE NAME="root"/></LOCALNAMESPACEPATH></IMETHODCALL>
               </SIMPLEREQ></MESSAGE></CIM>"#,
        )
        .unwrap_err();
        assert_eq!(err.key, "Common.XmlReader.MISSING_IMETHODCALL_ATTRIBUTE");
    }

    #[test]
    fn test_declaration_groups() {
        let mut d = Decoder::new(
            r#"<?xml version="1.0"?>
<CIM CIMVERSION="2.0" DTDVERSION="2.0"><DECLARATION>
<DECLGROUP>
  <LOCALNAMESPACEPATH><NAMESPACE NAME="root"/></LOCALNAMESPACEPATH>
  <QUALIFIER.DECLARATION NAME="Key" TYPE="boolean"><SCOPE PROPERTY="true"/><VALUE>FALSE</VALUE></QUALIFIER.DECLARATION>
  <VALUE.OBJECT><CLASS NAME="TST_Base"/></VALUE.OBJECT>
  <VALUE.OBJECT><CLASS NAME="TST_Derived" SUPERCLASS="TST_Base"/></VALUE.OBJECT>
</DECLGROUP>
<DECLGROUP.WITHNAME>
  <VALUE.NAMEDOBJECT>
    <INSTANCENAME CLASSNAME="TST_Base"><KEYBINDING NAME="k"><KEYVALUE>1</KEYVALUE></KEYBINDING></INSTANCENAME>
    <INSTANCE CLASSNAME="TST_Base"/>
  </VALUE.NAMEDOBJECT>
</DECLGROUP.WITHNAME>
</DECLARATION></CIM>"#,
        )
        .unwrap();
        let decl = d.expect_declaration().unwrap();
        d.expect_end_of_input().unwrap();
        assert_eq!(decl.groups.len(), 2);
        assert_eq!(decl.groups[0].namespace.as_str(), "root");
        assert_eq!(decl.qualifier_decls().count(), 1);
        assert_eq!(decl.classes().count(), 2);
        let instance = decl.instances().next().unwrap();
        assert!(instance.path().unwrap().is_instance_path());
        assert_eq!(decl.groups[1].kind, DeclGroupKind::WithName);
    }
}
