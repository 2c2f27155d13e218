//! Namespace, class name and object path elements.

use super::{class_name_attr, name_attr, Decoder};
use crate::error::DecodeError;
use crate::lexer::EntryKind;
use crate::model::{is_legal_name, CimName, KeyBinding, KeyBindingKind, NamespaceName, ObjectPath};

impl Decoder {
    fn expected(&self, key: &'static str, element: &str) -> DecodeError {
        DecodeError::validation(
            self.next_line(),
            key,
            format!("expected {element} element"),
            Vec::new(),
        )
    }

    /// `<!ELEMENT HOST (#PCDATA)>`
    fn host_element(&mut self) -> Result<Option<String>, DecodeError> {
        if self.test_start_tag("HOST").is_none() {
            return Ok(None);
        }
        let host = self.test_content().ok_or_else(|| {
            DecodeError::validation(
                self.next_line(),
                "Common.XmlReader.EXPECTED_CONTENT_ELEMENT",
                "expected content of HOST element".into(),
                Vec::new(),
            )
        })?;
        self.expect_end_tag("HOST")?;
        Ok(Some(host))
    }

    /// `<!ELEMENT NAMESPACE EMPTY>` with a `NAME` attribute.
    fn namespace_element(&mut self) -> Result<Option<String>, DecodeError> {
        let Some(entry) = self.test_start_or_empty("NAMESPACE") else {
            return Ok(None);
        };
        let name = entry.attribute("NAME").ok_or_else(|| {
            DecodeError::validation(
                entry.line,
                "Common.XmlReader.MISSING_ATTRIBUTE",
                "missing NAMESPACE.NAME attribute".into(),
                vec!["NAMESPACE.NAME".into()],
            )
        })?;
        if !is_legal_name(name) {
            return Err(DecodeError::semantic(
                entry.line,
                "Common.XmlReader.ILLEGAL_VALUE_FOR_ATTRIBUTE",
                "Illegal value for NAMESPACE.NAME attribute".into(),
                vec!["NAMESPACE.NAME".into()],
            ));
        }
        let name = name.to_owned();
        if !entry.is_empty_tag() {
            self.expect_end_tag("NAMESPACE")?;
        }
        Ok(Some(name))
    }

    /// `<!ELEMENT LOCALNAMESPACEPATH (NAMESPACE+)>`
    ///
    /// The components are joined with `/`.
    pub(super) fn local_namespace_path_element(&mut self) -> Result<Option<NamespaceName>, DecodeError> {
        if self.test_start_tag("LOCALNAMESPACEPATH").is_none() {
            return Ok(None);
        }
        let mut components = Vec::new();
        while let Some(component) = self.namespace_element()? {
            components.push(component);
        }
        if components.is_empty() {
            return Err(DecodeError::validation(
                self.next_line(),
                "Common.XmlReader.EXPECTED_NAMESPACE_ELEMENTS",
                "Expected one or more NAMESPACE elements within LOCALNAMESPACEPATH element".into(),
                Vec::new(),
            ));
        }
        self.expect_end_tag("LOCALNAMESPACEPATH")?;
        NamespaceName::new(components.join("/"))
            .map(Some)
            .map_err(|e| DecodeError::model(self.line(), "Common.XmlReader.ILLEGAL_NAMESPACE", e))
    }

    /// Required `LOCALNAMESPACEPATH`.
    pub(super) fn expect_local_namespace_path(&mut self) -> Result<NamespaceName, DecodeError> {
        self.local_namespace_path_element()?.ok_or_else(|| {
            self.expected(
                "Common.XmlReader.EXPECTED_LOCALNAMESPACEPATH_ELEMENT",
                "LOCALNAMESPACEPATH",
            )
        })
    }

    /// `<!ELEMENT NAMESPACEPATH (HOST,LOCALNAMESPACEPATH)>`
    pub(super) fn namespace_path_element(&mut self) -> Result<Option<(String, NamespaceName)>, DecodeError> {
        if self.test_start_tag("NAMESPACEPATH").is_none() {
            return Ok(None);
        }
        let host = self
            .host_element()?
            .ok_or_else(|| self.expected("Common.XmlReader.EXPECTED_HOST_ELEMENT", "HOST"))?;
        let namespace = self.expect_local_namespace_path()?;
        self.expect_end_tag("NAMESPACEPATH")?;
        Ok(Some((host, namespace)))
    }

    fn expect_namespace_path(&mut self) -> Result<(String, NamespaceName), DecodeError> {
        self.namespace_path_element()?.ok_or_else(|| {
            self.expected("Common.XmlReader.EXPECTED_NAMESPACEPATH_ELEMENT", "NAMESPACEPATH")
        })
    }

    /// `<!ELEMENT CLASSNAME EMPTY>` with a `NAME` attribute.
    pub(super) fn class_name_element(&mut self) -> Result<Option<CimName>, DecodeError> {
        let Some(entry) = self.test_start_or_empty("CLASSNAME") else {
            return Ok(None);
        };
        let name = name_attr(&entry, "CLASSNAME")?;
        if !entry.is_empty_tag() {
            self.expect_end_tag("CLASSNAME")?;
        }
        Ok(Some(name))
    }

    fn expect_class_name(&mut self) -> Result<CimName, DecodeError> {
        self.class_name_element()?
            .ok_or_else(|| self.expected("Common.XmlReader.EXPECTED_CLASSNAME_ELEMENT", "CLASSNAME"))
    }

    /// `<!ELEMENT KEYVALUE (#PCDATA)>` with an optional `VALUETYPE`.
    fn key_value_element(&mut self) -> Result<Option<(KeyBindingKind, String)>, DecodeError> {
        let Some(entry) = self.test_start_or_empty("KEYVALUE") else {
            return Ok(None);
        };
        let kind = match entry.attribute("VALUETYPE") {
            None | Some("string") => KeyBindingKind::String,
            Some("boolean") => KeyBindingKind::Boolean,
            Some("numeric") => KeyBindingKind::Numeric,
            Some(_) => {
                return Err(DecodeError::semantic(
                    entry.line,
                    "Common.XmlReader.ILLEGAL_VALUE_FOR_CIMVALUE_ATTRIBUTE",
                    "Illegal value for VALUETYPE attribute; CIMValue must be one of \"string\", \"boolean\", or \"numeric\"".into(),
                    vec!["KEYVALUE.VALUETYPE".into()],
                ))
            }
        };
        let mut value = String::new();
        if !entry.is_empty_tag() {
            if let Some(text) = self.test_content() {
                value = text;
            }
            self.expect_end_tag("KEYVALUE")?;
        }
        Ok(Some((kind, value)))
    }

    /// `<!ELEMENT KEYBINDING (KEYVALUE|VALUE.REFERENCE)>`
    fn key_binding_element(&mut self) -> Result<Option<KeyBinding>, DecodeError> {
        let Some(entry) = self.test_start_tag("KEYBINDING") else {
            return Ok(None);
        };
        let name = name_attr(&entry, "KEYBINDING")?;
        let binding = if let Some((kind, value)) = self.key_value_element()? {
            KeyBinding::new(name, value, kind)
        } else if let Some(path) = self.value_reference_element()? {
            KeyBinding::new(name, path.to_string(), KeyBindingKind::Reference)
        } else {
            return Err(self.expected(
                "Common.XmlReader.EXPECTED_KEYVALUE_OR_REFERENCE_ELEMENT",
                "KEYVALUE or VALUE.REFERENCE",
            ));
        };
        self.expect_end_tag("KEYBINDING")?;
        Ok(Some(binding))
    }

    /// `<!ELEMENT INSTANCENAME (KEYBINDING*|KEYVALUE?|VALUE.REFERENCE?)>`
    ///
    /// A lone `KEYVALUE` or `VALUE.REFERENCE` gives one key with a null
    /// name.
    pub(super) fn instance_name_element(&mut self) -> Result<Option<ObjectPath>, DecodeError> {
        let Some(entry) = self.test_start_or_empty("INSTANCENAME") else {
            return Ok(None);
        };
        let class_name = class_name_attr(&entry, "INSTANCENAME")?;
        let mut keys = Vec::new();

        if !entry.is_empty_tag() {
            if let Some((kind, value)) = self.key_value_element()? {
                keys.push(KeyBinding::new(CimName::null(), value, kind));
            } else if let Some(path) = self.value_reference_element()? {
                keys.push(KeyBinding::new(
                    CimName::null(),
                    path.to_string(),
                    KeyBindingKind::Reference,
                ));
            } else {
                while let Some(binding) = self.key_binding_element()? {
                    if keys.len() == self.options.max_keybindings {
                        let max = self.options.max_keybindings;
                        return Err(DecodeError::validation(
                            self.line(),
                            "Common.XmlReader.TOO_MANY_KEYBINDINGS",
                            format!("more than {max} KEYBINDING elements in INSTANCENAME"),
                            vec![max.to_string()],
                        ));
                    }
                    keys.push(binding);
                }
            }
            self.expect_end_tag("INSTANCENAME")?;
        }

        #[cfg(feature = "tracing")]
        tracing::trace!(class = %class_name, keys = keys.len(), "decoder: INSTANCENAME");

        Ok(Some(ObjectPath::new(class_name).with_keys(keys)))
    }

    pub(super) fn expect_instance_name(&mut self) -> Result<ObjectPath, DecodeError> {
        self.instance_name_element()?.ok_or_else(|| {
            self.expected("Common.XmlReader.EXPECTED_INSTANCENAME_ELEMENT", "INSTANCENAME")
        })
    }

    /// `<!ELEMENT INSTANCEPATH (NAMESPACEPATH,INSTANCENAME)>`
    pub(super) fn instance_path_element(&mut self) -> Result<Option<ObjectPath>, DecodeError> {
        if self.test_start_tag("INSTANCEPATH").is_none() {
            return Ok(None);
        }
        let (host, namespace) = self.expect_namespace_path()?;
        let path = self.expect_instance_name()?;
        self.expect_end_tag("INSTANCEPATH")?;
        Ok(Some(path.with_host(host).with_namespace(namespace)))
    }

    /// `<!ELEMENT LOCALINSTANCEPATH (LOCALNAMESPACEPATH,INSTANCENAME)>`
    pub(super) fn local_instance_path_element(&mut self) -> Result<Option<ObjectPath>, DecodeError> {
        if self.test_start_tag("LOCALINSTANCEPATH").is_none() {
            return Ok(None);
        }
        let namespace = self.expect_local_namespace_path()?;
        let path = self.expect_instance_name()?;
        self.expect_end_tag("LOCALINSTANCEPATH")?;
        Ok(Some(path.with_namespace(namespace)))
    }

    /// `<!ELEMENT CLASSPATH (NAMESPACEPATH,CLASSNAME)>`
    pub(super) fn class_path_element(&mut self) -> Result<Option<ObjectPath>, DecodeError> {
        if self.test_start_tag("CLASSPATH").is_none() {
            return Ok(None);
        }
        let (host, namespace) = self.expect_namespace_path()?;
        let class_name = self.expect_class_name()?;
        self.expect_end_tag("CLASSPATH")?;
        Ok(Some(
            ObjectPath::new(class_name)
                .with_host(host)
                .with_namespace(namespace),
        ))
    }

    /// `<!ELEMENT LOCALCLASSPATH (LOCALNAMESPACEPATH,CLASSNAME)>`
    pub(super) fn local_class_path_element(&mut self) -> Result<Option<ObjectPath>, DecodeError> {
        if self.test_start_tag("LOCALCLASSPATH").is_none() {
            return Ok(None);
        }
        let namespace = self.expect_local_namespace_path()?;
        let class_name = self.expect_class_name()?;
        self.expect_end_tag("LOCALCLASSPATH")?;
        Ok(Some(ObjectPath::new(class_name).with_namespace(namespace)))
    }

    /// `<!ELEMENT VALUE.REFERENCE (CLASSPATH|LOCALCLASSPATH|CLASSNAME|
    ///  INSTANCEPATH|LOCALINSTANCEPATH|INSTANCENAME)>`
    ///
    /// All six forms give one path; the local and bare forms leave host
    /// and namespace empty.
    pub(super) fn value_reference_element(&mut self) -> Result<Option<ObjectPath>, DecodeError> {
        if self.test_start_tag("VALUE.REFERENCE").is_none() {
            return Ok(None);
        }
        let tag = match self.peek() {
            Some(e) if matches!(e.kind, EntryKind::StartTag | EntryKind::EmptyTag) => e.text.clone(),
            _ => {
                return Err(DecodeError::validation(
                    self.next_line(),
                    "Common.XmlReader.EXPECTED_START_TAGS",
                    "Expected one of the following start tags: CLASSPATH, LOCALCLASSPATH, CLASSNAME, INSTANCEPATH, LOCALINSTANCEPATH, INSTANCENAME".into(),
                    Vec::new(),
                ))
            }
        };
        let path = match tag.as_str() {
            "CLASSPATH" => self.class_path_element()?,
            "LOCALCLASSPATH" => self.local_class_path_element()?,
            "CLASSNAME" => self.class_name_element()?.map(ObjectPath::new),
            "INSTANCEPATH" => self.instance_path_element()?,
            "LOCALINSTANCEPATH" => self.local_instance_path_element()?,
            "INSTANCENAME" => self.instance_name_element()?,
            _ => None,
        };
        let path = path.ok_or_else(|| {
            DecodeError::validation(
                self.next_line(),
                "Common.XmlReader.EXPECTED_START_TAGS",
                format!("unexpected <{tag}> in VALUE.REFERENCE"),
                vec![tag.clone()],
            )
        })?;
        self.expect_end_tag("VALUE.REFERENCE")?;
        Ok(Some(path))
    }

    /// `<!ELEMENT VALUE.REFARRAY (VALUE.REFERENCE*)>`
    pub(super) fn value_reference_array_element(&mut self) -> Result<Option<Vec<ObjectPath>>, DecodeError> {
        let Some(entry) = self.test_start_or_empty("VALUE.REFARRAY") else {
            return Ok(None);
        };
        let mut paths = Vec::new();
        if !entry.is_empty_tag() {
            while let Some(path) = self.value_reference_element()? {
                paths.push(path);
            }
            self.expect_end_tag("VALUE.REFARRAY")?;
        }
        Ok(Some(paths))
    }

    /// `<!ELEMENT OBJECTPATH (INSTANCEPATH|CLASSPATH)>`
    pub(super) fn object_path_element(&mut self) -> Result<Option<ObjectPath>, DecodeError> {
        if self.test_start_tag("OBJECTPATH").is_none() {
            return Ok(None);
        }
        let path = match self.instance_path_element()? {
            Some(path) => path,
            None => self.class_path_element()?.ok_or_else(|| {
                self.expected(
                    "Common.XmlReader.EXPECTED_INSTANCEPATH_OR_CLASSPATH_ELEMENT",
                    "INSTANCEPATH or CLASSPATH",
                )
            })?,
        };
        self.expect_end_tag("OBJECTPATH")?;
        Ok(Some(path))
    }

    /// Either a method call target path: `LOCALINSTANCEPATH` or
    /// `LOCALCLASSPATH`.
    pub(super) fn expect_local_object_path(&mut self) -> Result<ObjectPath, DecodeError> {
        if let Some(path) = self.local_instance_path_element()? {
            return Ok(path);
        }
        self.local_class_path_element()?.ok_or_else(|| {
            self.expected(
                "Common.XmlReader.EXPECTED_LOCALINSTANCEPATH_OR_LOCALCLASSPATH_ELEMENT",
                "LOCALINSTANCEPATH or LOCALCLASSPATH",
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::DecodeOptions;

    fn reference(source: &str) -> Result<ObjectPath, DecodeError> {
        let mut d = Decoder::new(source)?;
        let path = d.value_reference_element()?.unwrap();
        d.expect_end_of_input()?;
        Ok(path)
    }

    #[test]
    fn test_instance_name_string_key() {
        let mut d = Decoder::new(
            r#"<INSTANCENAME CLASSNAME="TST_Person">
                 <KEYBINDING NAME="Name"><KEYVALUE VALUETYPE="string">Mike</KEYVALUE></KEYBINDING>
               </INSTANCENAME>"#,
        )
        .unwrap();
        let path = d.instance_name_element().unwrap().unwrap();
        assert_eq!(path.class_name().as_str(), "TST_Person");
        assert_eq!(path.key_bindings().len(), 1);
        let key = &path.key_bindings()[0];
        assert_eq!(key.name().as_str(), "Name");
        assert_eq!(key.value(), "Mike");
        assert_eq!(key.kind(), KeyBindingKind::String);
        assert_eq!(path.to_string(), r#"TST_Person.Name="Mike""#);
        assert_eq!(path.to_string().parse::<ObjectPath>().unwrap(), path);
    }

    #[test]
    fn test_keys_sorted_and_typed() {
        let mut d = Decoder::new(
            r#"<INSTANCENAME CLASSNAME="C">
                 <KEYBINDING NAME="b"><KEYVALUE VALUETYPE="numeric">0x10</KEYVALUE></KEYBINDING>
                 <KEYBINDING NAME="A"><KEYVALUE VALUETYPE="boolean">TRUE</KEYVALUE></KEYBINDING>
                 <KEYBINDING NAME="c"><KEYVALUE/></KEYBINDING>
               </INSTANCENAME>"#,
        )
        .unwrap();
        let path = d.instance_name_element().unwrap().unwrap();
        let names: Vec<_> = path.key_bindings().iter().map(|k| k.name().as_str()).collect();
        assert_eq!(names, vec!["A", "b", "c"]);
        assert_eq!(path.key("b").unwrap().kind(), KeyBindingKind::Numeric);
        assert_eq!(path.key("c").unwrap().value(), "");
    }

    #[test]
    fn test_bad_value_type() {
        let mut d = Decoder::new(
            r#"<INSTANCENAME CLASSNAME="C"><KEYBINDING NAME="k"><KEYVALUE VALUETYPE="real">1</KEYVALUE></KEYBINDING></INSTANCENAME>"#,
        )
        .unwrap();
        let err = d.instance_name_element().unwrap_err();
        assert!(err.is_semantic());
        assert_eq!(err.key, "Common.XmlReader.ILLEGAL_VALUE_FOR_CIMVALUE_ATTRIBUTE");
    }

    #[test]
    fn test_keybinding_needs_value() {
        let mut d = Decoder::new(
            r#"<INSTANCENAME CLASSNAME="C"><KEYBINDING NAME="k"></KEYBINDING></INSTANCENAME>"#,
        )
        .unwrap();
        let err = d.instance_name_element().unwrap_err();
        assert_eq!(err.key, "Common.XmlReader.EXPECTED_KEYVALUE_OR_REFERENCE_ELEMENT");
    }

    #[test]
    fn test_too_many_keybindings() {
        let source = r#"<INSTANCENAME CLASSNAME="C">
            <KEYBINDING NAME="a"><KEYVALUE>1</KEYVALUE></KEYBINDING>
            <KEYBINDING NAME="b"><KEYVALUE>2</KEYVALUE></KEYBINDING>
            <KEYBINDING NAME="c"><KEYVALUE>3</KEYVALUE></KEYBINDING>
          </INSTANCENAME>"#;
        let options = DecodeOptions::default().with_max_keybindings(2);
        let mut d = Decoder::with_options(source, options).unwrap();
        let err = d.instance_name_element().unwrap_err();
        assert_eq!(err.key, "Common.XmlReader.TOO_MANY_KEYBINDINGS");

        let options = DecodeOptions::default().with_max_keybindings(3);
        let mut d = Decoder::with_options(source, options).unwrap();
        assert_eq!(d.instance_name_element().unwrap().unwrap().key_bindings().len(), 3);
    }

    #[test]
    fn test_reference_forms() {
        let path = reference(
            r#"<VALUE.REFERENCE><INSTANCEPATH>
                 <NAMESPACEPATH><HOST>srv</HOST>
                   <LOCALNAMESPACEPATH><NAMESPACE NAME="root"/><NAMESPACE NAME="cimv2"/></LOCALNAMESPACEPATH>
                 </NAMESPACEPATH>
                 <INSTANCENAME CLASSNAME="C"><KEYBINDING NAME="k"><KEYVALUE>v</KEYVALUE></KEYBINDING></INSTANCENAME>
               </INSTANCEPATH></VALUE.REFERENCE>"#,
        )
        .unwrap();
        assert_eq!(path.host(), "srv");
        assert_eq!(path.namespace().as_str(), "root/cimv2");
        assert!(path.is_instance_path());

        let path = reference(
            r#"<VALUE.REFERENCE><LOCALCLASSPATH>
                 <LOCALNAMESPACEPATH><NAMESPACE NAME="root"/></LOCALNAMESPACEPATH>
                 <CLASSNAME NAME="C"/>
               </LOCALCLASSPATH></VALUE.REFERENCE>"#,
        )
        .unwrap();
        assert_eq!(path.host(), "");
        assert_eq!(path.namespace().as_str(), "root");
        assert!(!path.is_instance_path());

        let path = reference(r#"<VALUE.REFERENCE><CLASSNAME NAME="C"/></VALUE.REFERENCE>"#).unwrap();
        assert!(path.namespace().is_null());
        assert_eq!(path.class_name().as_str(), "C");
    }

    #[test]
    fn test_reference_errors() {
        let err = reference("<VALUE.REFERENCE>text</VALUE.REFERENCE>").unwrap_err();
        assert_eq!(err.key, "Common.XmlReader.EXPECTED_START_TAGS");
        let err = reference("<VALUE.REFERENCE><VALUE/></VALUE.REFERENCE>").unwrap_err();
        assert_eq!(err.key, "Common.XmlReader.EXPECTED_START_TAGS");
        let err = reference("<VALUE.REFERENCE><LOCALCLASSPATH><CLASSNAME NAME=\"C\"/></LOCALCLASSPATH></VALUE.REFERENCE>")
            .unwrap_err();
        assert_eq!(err.key, "Common.XmlReader.EXPECTED_LOCALNAMESPACEPATH_ELEMENT");
        let err = reference("<VALUE.REFERENCE><LOCALCLASSPATH><LOCALNAMESPACEPATH></LOCALNAMESPACEPATH><CLASSNAME NAME=\"C\"/></LOCALCLASSPATH></VALUE.REFERENCE>")
            .unwrap_err();
        assert_eq!(err.key, "Common.XmlReader.EXPECTED_NAMESPACE_ELEMENTS");
    }

    #[test]
    fn test_reference_key_binding() {
        let mut d = Decoder::new(
            r#"<INSTANCENAME CLASSNAME="Assoc">
                 <KEYBINDING NAME="Ref"><VALUE.REFERENCE>
                   <INSTANCENAME CLASSNAME="C"><KEYBINDING NAME="k"><KEYVALUE VALUETYPE="numeric">1</KEYVALUE></KEYBINDING></INSTANCENAME>
                 </VALUE.REFERENCE></KEYBINDING>
               </INSTANCENAME>"#,
        )
        .unwrap();
        let path = d.instance_name_element().unwrap().unwrap();
        let key = path.key("ref").unwrap();
        assert_eq!(key.kind(), KeyBindingKind::Reference);
        assert_eq!(key.value(), "C.k=1");
    }

    #[test]
    fn test_refarray_and_objectpath() {
        let mut d = Decoder::new(
            r#"<VALUE.REFARRAY>
                 <VALUE.REFERENCE><CLASSNAME NAME="A"/></VALUE.REFERENCE>
                 <VALUE.REFERENCE><CLASSNAME NAME="B"/></VALUE.REFERENCE>
               </VALUE.REFARRAY>"#,
        )
        .unwrap();
        assert_eq!(d.value_reference_array_element().unwrap().unwrap().len(), 2);

        let mut d = Decoder::new("<OBJECTPATH><CLASSNAME NAME=\"A\"/></OBJECTPATH>").unwrap();
        let err = d.object_path_element().unwrap_err();
        assert_eq!(err.key, "Common.XmlReader.EXPECTED_INSTANCEPATH_OR_CLASSPATH_ELEMENT");
    }

    #[test]
    fn test_host_requires_content() {
        let mut d = Decoder::new("<NAMESPACEPATH><HOST></HOST></NAMESPACEPATH>").unwrap();
        let err = d.namespace_path_element().unwrap_err();
        assert_eq!(err.key, "Common.XmlReader.EXPECTED_CONTENT_ELEMENT");
    }
}
