//! Qualifiers, properties, methods, classes and instances.

use super::{
    array_size_attr, bool_attr, class_name_attr, embedded_attr, name_attr, optional_name_attr,
    required_type_attr, Decoder, Embedded,
};
use crate::error::{DecodeError, ModelError};
use crate::lexer::XmlEntry;
use crate::model::{
    CimClass, CimInstance, CimMethod, CimObject, CimParameter, CimProperty, CimType, CimValue,
    Flavor, Qualifier, QualifierDecl, QualifierList, Scope,
};

/// Report a container insertion failure at `line`.
///
/// Same-name insertions become the semantic duplicate error `key`; any
/// other model error is wrapped as is.
fn insert_error(line: u32, key: &'static str, error: ModelError) -> DecodeError {
    match error {
        ModelError::AlreadyExists { kind, name } => DecodeError::semantic(
            line,
            key,
            format!("duplicate {kind} \"{name}\""),
            vec![name],
        ),
        other => DecodeError::model(line, key, other),
    }
}

/// The four flavor attributes of `QUALIFIER` and `QUALIFIER.DECLARATION`.
fn flavor_attrs(entry: &XmlEntry, element: &str) -> Result<Flavor, DecodeError> {
    Ok(Flavor::from_attributes(
        bool_attr(entry, element, "OVERRIDABLE", true)?,
        bool_attr(entry, element, "TOSUBCLASS", true)?,
        bool_attr(entry, element, "TOINSTANCE", false)?,
        bool_attr(entry, element, "TRANSLATABLE", false)?,
    ))
}

/// The embedding a property or parameter ends up with, from its marker
/// attribute or its qualifiers.
fn effective_embedding(
    entry: &XmlEntry,
    element: &str,
    ty: CimType,
    qualifiers: &QualifierList,
) -> Result<Embedded, DecodeError> {
    let mut embedded = embedded_attr(entry, element)?;
    if embedded == Embedded::No {
        if qualifiers.is_true("EmbeddedObject") {
            embedded = Embedded::Object;
        } else if qualifiers
            .get_by_name("EmbeddedInstance")
            .and_then(|q| q.value().get_string().ok().flatten())
            .is_some_and(|class| !class.is_empty())
        {
            embedded = Embedded::Instance;
        }
    }
    if embedded != Embedded::No && ty != CimType::String {
        return Err(DecodeError::validation(
            entry.line,
            "Common.XmlReader.INVALID_EMBEDDEDOBJECT_TYPE",
            "The EmbeddedObject attribute is only valid on string types.".into(),
            Vec::new(),
        ));
    }
    Ok(embedded)
}

impl Decoder {
    // === Qualifiers ===

    /// `<!ELEMENT QUALIFIER ((VALUE|VALUE.ARRAY)?)>`
    fn qualifier_element(&mut self) -> Result<Option<Qualifier>, DecodeError> {
        let Some(entry) = self.test_start_or_empty("QUALIFIER") else {
            return Ok(None);
        };
        let name = name_attr(&entry, "QUALIFIER")?;
        let ty = required_type_attr(&entry, "QUALIFIER")?;
        let propagated = bool_attr(&entry, "QUALIFIER", "PROPAGATED", false)?;
        let flavor = flavor_attrs(&entry, "QUALIFIER")?;

        let mut value = CimValue::null(ty, false);
        if !entry.is_empty_tag() {
            if let Some(v) = self.value_array_element(ty)? {
                value = v;
            } else if let Some(v) = self.value_element(ty)? {
                value = v;
            }
            self.expect_end_tag("QUALIFIER")?;
        }

        Ok(Some(
            Qualifier::new(name, value)
                .with_flavor(flavor)
                .with_propagated(propagated),
        ))
    }

    /// Read `QUALIFIER*`, handing each to `add`.
    fn qualifier_elements(
        &mut self,
        mut add: impl FnMut(Qualifier) -> Result<(), ModelError>,
    ) -> Result<(), DecodeError> {
        while let Some(qualifier) = self.qualifier_element()? {
            add(qualifier).map_err(|e| insert_error(self.line(), "Common.XmlReader.DUPLICATE_QUALIFIER", e))?;
        }
        Ok(())
    }

    /// Read `QUALIFIER*` into a fresh list.
    fn qualifier_list(&mut self) -> Result<QualifierList, DecodeError> {
        let mut list = QualifierList::new();
        self.qualifier_elements(|q| list.add(q))?;
        Ok(list)
    }

    /// `<!ELEMENT SCOPE EMPTY>` with one boolean attribute per scope.
    fn scope_element(&mut self) -> Result<Option<Scope>, DecodeError> {
        let Some(entry) = self.test_start_or_empty("SCOPE") else {
            return Ok(None);
        };
        let mut scope = Scope::empty();
        for (attr, bit) in Scope::ATTRIBUTES {
            if bool_attr(&entry, "SCOPE", attr, false)? {
                scope |= bit;
            }
        }
        if !entry.is_empty_tag() {
            self.expect_end_tag("SCOPE")?;
        }
        Ok(Some(scope))
    }

    /// `<!ELEMENT QUALIFIER.DECLARATION (SCOPE?,(VALUE|VALUE.ARRAY)?)>`
    pub fn qualifier_decl_element(&mut self) -> Result<Option<QualifierDecl>, DecodeError> {
        const TAG: &str = "QUALIFIER.DECLARATION";
        let Some(entry) = self.test_start_or_empty(TAG) else {
            return Ok(None);
        };
        let name = name_attr(&entry, TAG)?;
        let ty = required_type_attr(&entry, TAG)?;
        let is_array = bool_attr(&entry, TAG, "ISARRAY", false)?;
        let array_size = array_size_attr(&entry, TAG)?;
        let flavor = flavor_attrs(&entry, TAG)?;

        let mut scope = Scope::empty();
        let mut value = CimValue::null(ty, is_array);
        if !entry.is_empty_tag() {
            if let Some(s) = self.scope_element()? {
                scope = s;
            }
            if let Some(v) = self.value_array_element(ty)? {
                let line = self.line();
                if !is_array {
                    return Err(DecodeError::semantic(
                        line,
                        "Common.XmlReader.ARRAY_WITHOUT_ISARRAY",
                        "VALUE.ARRAY element encountered without ISARRAY attribute".into(),
                        Vec::new(),
                    ));
                }
                if array_size != 0 && usize::try_from(array_size).ok() != Some(v.len()) {
                    return Err(DecodeError::semantic(
                        line,
                        "Common.XmlReader.ARRAY_SIZE_NOT_SAME",
                        "VALUE.ARRAY size is not the same as ARRAYSIZE attribute".into(),
                        Vec::new(),
                    ));
                }
                value = v;
            } else if let Some(v) = self.value_element(ty)? {
                if is_array {
                    return Err(DecodeError::semantic(
                        self.line(),
                        "Common.XmlReader.ARRAY_ATTRIBUTE_DIFFERENT",
                        "ISARRAY attribute used but VALUE element encountered".into(),
                        Vec::new(),
                    ));
                }
                value = v;
            }
            self.expect_end_tag(TAG)?;
        }

        #[cfg(feature = "tracing")]
        tracing::trace!(name = %name, ty = %ty, is_array, "decoder: QUALIFIER.DECLARATION");

        Ok(Some(
            QualifierDecl::new(name, value, scope, flavor).with_array_size(array_size),
        ))
    }

    /// Required `QUALIFIER.DECLARATION`.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the element is absent, or any error
    /// from decoding it.
    pub fn expect_qualifier_decl(&mut self) -> Result<QualifierDecl, DecodeError> {
        self.qualifier_decl_element()?.ok_or_else(|| {
            DecodeError::validation(
                self.next_line(),
                "Common.XmlReader.EXPECTED_QUALIFIER_DECLARATION_ELEMENT",
                "Expected QUALIFIER.DECLARATION element".into(),
                Vec::new(),
            )
        })
    }

    // === Properties ===

    /// Build a property from its start tag, qualifiers and value.
    fn finish_property(
        &self,
        entry: &XmlEntry,
        element: &str,
        value: CimValue,
        qualifiers: &QualifierList,
    ) -> Result<CimProperty, DecodeError> {
        let mut property = CimProperty::new(name_attr(entry, element)?, value)
            .with_class_origin(optional_name_attr(entry, element, "CLASSORIGIN")?)
            .with_propagated(bool_attr(entry, element, "PROPAGATED", false)?);
        for qualifier in qualifiers.iter() {
            property
                .qualifiers_mut()
                .add(qualifier.clone())
                .map_err(|e| insert_error(self.line(), "Common.XmlReader.DUPLICATE_QUALIFIER", e))?;
        }
        Ok(property)
    }

    /// `<!ELEMENT PROPERTY (QUALIFIER*,VALUE?)>`
    ///
    /// A string property marked as embedded, by attribute or by an
    /// `EmbeddedObject`/`EmbeddedInstance` qualifier, decodes its value as
    /// an object or instance and keeps the marker qualifier.
    fn property_element(&mut self) -> Result<Option<CimProperty>, DecodeError> {
        let Some(entry) = self.test_start_or_empty("PROPERTY") else {
            return Ok(None);
        };
        // Attribute errors are reported before any child is read.
        name_attr(&entry, "PROPERTY")?;
        let ty = required_type_attr(&entry, "PROPERTY")?;

        let mut qualifiers = QualifierList::new();
        let mut value = None;
        if !entry.is_empty_tag() {
            qualifiers = self.qualifier_list()?;
        }
        let ty = effective_embedding(&entry, "PROPERTY", ty, &qualifiers)?.effective_type(ty);
        if !entry.is_empty_tag() {
            value = self.value_element(ty)?;
            self.expect_end_tag("PROPERTY")?;
        }

        let value = value.unwrap_or(CimValue::null(ty, false));
        self.finish_property(&entry, "PROPERTY", value, &qualifiers)
            .map(Some)
    }

    /// `<!ELEMENT PROPERTY.ARRAY (QUALIFIER*,VALUE.ARRAY?)>`
    fn property_array_element(&mut self) -> Result<Option<CimProperty>, DecodeError> {
        const TAG: &str = "PROPERTY.ARRAY";
        let Some(entry) = self.test_start_or_empty(TAG) else {
            return Ok(None);
        };
        name_attr(&entry, TAG)?;
        let ty = required_type_attr(&entry, TAG)?;
        let array_size = array_size_attr(&entry, TAG)?;

        let mut qualifiers = QualifierList::new();
        let mut value = None;
        if !entry.is_empty_tag() {
            qualifiers = self.qualifier_list()?;
        }
        let ty = effective_embedding(&entry, TAG, ty, &qualifiers)?.effective_type(ty);
        if !entry.is_empty_tag() {
            value = self.value_array_element(ty)?;
            if let Some(v) = &value {
                if array_size != 0 && usize::try_from(array_size).ok() != Some(v.len()) {
                    return Err(DecodeError::semantic(
                        self.line(),
                        "Common.XmlReader.ARRAY_SIZE_DIFFERENT",
                        "ARRAYSIZE attribute and value-array size are different".into(),
                        Vec::new(),
                    ));
                }
            }
            self.expect_end_tag(TAG)?;
        }

        let value = value.unwrap_or(CimValue::null(ty, true));
        self.finish_property(&entry, TAG, value, &qualifiers)
            .map(|p| Some(p.with_array_size(array_size)))
    }

    /// `<!ELEMENT PROPERTY.REFERENCE (QUALIFIER*,VALUE.REFERENCE?)>`
    fn property_reference_element(&mut self) -> Result<Option<CimProperty>, DecodeError> {
        const TAG: &str = "PROPERTY.REFERENCE";
        let Some(entry) = self.test_start_or_empty(TAG) else {
            return Ok(None);
        };
        name_attr(&entry, TAG)?;
        let reference_class = optional_name_attr(&entry, TAG, "REFERENCECLASS")?;

        let mut qualifiers = QualifierList::new();
        let mut value = CimValue::null(CimType::Reference, false);
        if !entry.is_empty_tag() {
            qualifiers = self.qualifier_list()?;
            if let Some(path) = self.value_reference_element()? {
                value = CimValue::from(path);
            }
            self.expect_end_tag(TAG)?;
        }

        self.finish_property(&entry, TAG, value, &qualifiers)
            .map(|p| Some(p.with_reference_class(reference_class)))
    }

    /// Any of `PROPERTY`, `PROPERTY.ARRAY` or `PROPERTY.REFERENCE`.
    fn any_property_element(&mut self) -> Result<Option<CimProperty>, DecodeError> {
        if let Some(p) = self.property_element()? {
            return Ok(Some(p));
        }
        if let Some(p) = self.property_array_element()? {
            return Ok(Some(p));
        }
        self.property_reference_element()
    }

    /// Read properties of all three kinds, handing each to `add`.
    fn property_elements(
        &mut self,
        mut add: impl FnMut(CimProperty) -> Result<(), ModelError>,
    ) -> Result<(), DecodeError> {
        while let Some(property) = self.any_property_element()? {
            add(property).map_err(|e| insert_error(self.line(), "Common.XmlReader.DUPLICATE_PROPERTY", e))?;
        }
        Ok(())
    }

    // === Methods ===

    /// `PARAMETER`, `PARAMETER.ARRAY`, `PARAMETER.REFERENCE` or
    /// `PARAMETER.REFARRAY`, each `(QUALIFIER*)`.
    fn parameter_element(&mut self) -> Result<Option<CimParameter>, DecodeError> {
        let Some(tag) = ["PARAMETER", "PARAMETER.ARRAY", "PARAMETER.REFERENCE", "PARAMETER.REFARRAY"]
            .into_iter()
            .find(|tag| self.peek().is_some_and(|e| e.is_open(tag)))
        else {
            return Ok(None);
        };
        let Some(entry) = self.advance() else {
            return Ok(None);
        };
        let name = name_attr(&entry, tag)?;

        let mut parameter = match tag {
            "PARAMETER" => CimParameter::new(name, required_type_attr(&entry, tag)?),
            "PARAMETER.ARRAY" => CimParameter::new(name, required_type_attr(&entry, tag)?)
                .with_array(array_size_attr(&entry, tag)?),
            "PARAMETER.REFERENCE" => CimParameter::new(name, CimType::Reference)
                .with_reference_class(optional_name_attr(&entry, tag, "REFERENCECLASS")?),
            _ => CimParameter::new(name, CimType::Reference)
                .with_array(array_size_attr(&entry, tag)?)
                .with_reference_class(optional_name_attr(&entry, tag, "REFERENCECLASS")?),
        };

        if !entry.is_empty_tag() {
            let qualifiers = parameter.qualifiers_mut();
            self.qualifier_elements(|q| qualifiers.add(q))?;
            self.expect_end_tag(tag)?;
        }
        Ok(Some(parameter))
    }

    /// `<!ELEMENT METHOD (QUALIFIER*,(PARAMETER|PARAMETER.REFERENCE|
    ///  PARAMETER.ARRAY|PARAMETER.REFARRAY)*)>`
    fn method_element(&mut self) -> Result<Option<CimMethod>, DecodeError> {
        let Some(entry) = self.test_start_or_empty("METHOD") else {
            return Ok(None);
        };
        let name = name_attr(&entry, "METHOD")?;
        let ty = required_type_attr(&entry, "METHOD")?;
        let mut method = CimMethod::new(name, ty)
            .with_class_origin(optional_name_attr(&entry, "METHOD", "CLASSORIGIN")?)
            .with_propagated(bool_attr(&entry, "METHOD", "PROPAGATED", false)?);

        if !entry.is_empty_tag() {
            let qualifiers = method.qualifiers_mut();
            self.qualifier_elements(|q| qualifiers.add(q))?;
            while let Some(parameter) = self.parameter_element()? {
                method
                    .add_parameter(parameter)
                    .map_err(|e| insert_error(self.line(), "Common.XmlReader.DUPLICATE_PARAMETER", e))?;
            }
            self.expect_end_tag("METHOD")?;
        }
        Ok(Some(method))
    }

    // === Classes and instances ===

    /// `<!ELEMENT CLASS (QUALIFIER*,(PROPERTY|PROPERTY.ARRAY|
    ///  PROPERTY.REFERENCE)*,METHOD*)>`
    pub fn class_element(&mut self) -> Result<Option<CimClass>, DecodeError> {
        let Some(entry) = self.test_start_or_empty("CLASS") else {
            return Ok(None);
        };
        let name = name_attr(&entry, "CLASS")?;
        let superclass = optional_name_attr(&entry, "CLASS", "SUPERCLASS")?;
        let mut class = CimClass::new(name, superclass);

        if !entry.is_empty_tag() {
            self.qualifier_elements(|q| class.add_qualifier(q))?;
            self.property_elements(|p| class.add_property(p))?;
            while let Some(method) = self.method_element()? {
                class
                    .add_method(method)
                    .map_err(|e| insert_error(self.line(), "Common.XmlReader.DUPLICATE_METHOD", e))?;
            }
            self.expect_end_tag("CLASS")?;
        }

        #[cfg(feature = "tracing")]
        tracing::trace!(
            class = %class.class_name(),
            properties = class.properties().len(),
            methods = class.methods().len(),
            "decoder: CLASS"
        );

        Ok(Some(class))
    }

    /// Required `CLASS`.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the element is absent, or any error
    /// from decoding it.
    pub fn expect_class(&mut self) -> Result<CimClass, DecodeError> {
        self.class_element()?.ok_or_else(|| {
            DecodeError::validation(
                self.next_line(),
                "Common.XmlReader.EXPECTED_CLASS_ELEMENT",
                "Expected CLASS element".into(),
                Vec::new(),
            )
        })
    }

    /// `<!ELEMENT INSTANCE (QUALIFIER*,(PROPERTY|PROPERTY.ARRAY|
    ///  PROPERTY.REFERENCE)*)>`
    pub fn instance_element(&mut self) -> Result<Option<CimInstance>, DecodeError> {
        let Some(entry) = self.test_start_or_empty("INSTANCE") else {
            return Ok(None);
        };
        let mut instance = CimInstance::new(class_name_attr(&entry, "INSTANCE")?);

        if !entry.is_empty_tag() {
            self.qualifier_elements(|q| instance.add_qualifier(q))?;
            self.property_elements(|p| instance.add_property(p))?;
            self.expect_end_tag("INSTANCE")?;
        }

        #[cfg(feature = "tracing")]
        tracing::trace!(
            class = %instance.class_name(),
            properties = instance.properties().len(),
            "decoder: INSTANCE"
        );

        Ok(Some(instance))
    }

    /// Required `INSTANCE`.
    ///
    /// # Errors
    ///
    /// Returns a validation error if the element is absent, or any error
    /// from decoding it.
    pub fn expect_instance(&mut self) -> Result<CimInstance, DecodeError> {
        self.instance_element()?.ok_or_else(|| {
            DecodeError::validation(
                self.next_line(),
                "Common.XmlReader.EXPECTED_INSTANCE_ELEMENT",
                "Expected INSTANCE element".into(),
                Vec::new(),
            )
        })
    }

    /// `INSTANCE` or `CLASS`.
    ///
    /// # Errors
    ///
    /// Returns a validation error if neither is next.
    pub fn expect_object(&mut self) -> Result<CimObject, DecodeError> {
        if let Some(instance) = self.instance_element()? {
            return Ok(CimObject::Instance(instance));
        }
        match self.class_element()? {
            Some(class) => Ok(CimObject::Class(class)),
            None => Err(DecodeError::validation(
                self.next_line(),
                "Common.XmlReader.EXPECTED_INSTANCE_OR_CLASS_ELEMENT",
                "Expected INSTANCE or CLASS element".into(),
                Vec::new(),
            )),
        }
    }

    /// `<!ELEMENT VALUE.NAMEDINSTANCE (INSTANCENAME,INSTANCE)>`
    pub(super) fn named_instance_element(&mut self) -> Result<Option<CimInstance>, DecodeError> {
        if self.test_start_tag("VALUE.NAMEDINSTANCE").is_none() {
            return Ok(None);
        }
        let path = self.expect_instance_name()?;
        let mut instance = self.expect_instance()?;
        instance.set_path(path);
        self.expect_end_tag("VALUE.NAMEDINSTANCE")?;
        Ok(Some(instance))
    }

    /// `<!ELEMENT VALUE.INSTANCEWITHPATH (INSTANCEPATH,INSTANCE)>`
    pub(super) fn instance_with_path_element(&mut self) -> Result<Option<CimInstance>, DecodeError> {
        if self.test_start_tag("VALUE.INSTANCEWITHPATH").is_none() {
            return Ok(None);
        }
        let path = self.instance_path_element()?.ok_or_else(|| {
            DecodeError::validation(
                self.next_line(),
                "Common.XmlReader.EXPECTED_INSTANCEPATH_ELEMENT",
                "expected INSTANCEPATH element".into(),
                Vec::new(),
            )
        })?;
        let mut instance = self.expect_instance()?;
        instance.set_path(path);
        self.expect_end_tag("VALUE.INSTANCEWITHPATH")?;
        Ok(Some(instance))
    }

    /// `<!ELEMENT VALUE.OBJECT (CLASS|INSTANCE)>`
    pub(super) fn value_object_element(&mut self) -> Result<Option<CimObject>, DecodeError> {
        if self.test_start_tag("VALUE.OBJECT").is_none() {
            return Ok(None);
        }
        let object = self.expect_object()?;
        self.expect_end_tag("VALUE.OBJECT")?;
        Ok(Some(object))
    }

    /// `<!ELEMENT VALUE.OBJECTWITHPATH ((CLASSPATH,CLASS)|
    ///  (INSTANCEPATH,INSTANCE))>`
    pub(super) fn value_object_with_path_element(&mut self) -> Result<Option<CimObject>, DecodeError> {
        if self.test_start_tag("VALUE.OBJECTWITHPATH").is_none() {
            return Ok(None);
        }
        let object = if let Some(path) = self.instance_path_element()? {
            let mut instance = self.expect_instance()?;
            instance.set_path(path);
            CimObject::Instance(instance)
        } else if let Some(path) = self.class_path_element()? {
            let mut class = self.expect_class()?;
            class.set_path(path);
            CimObject::Class(class)
        } else {
            return Err(DecodeError::validation(
                self.next_line(),
                "Common.XmlReader.EXPECTED_INSTANCEPATH_OR_CLASSPATH_ELEMENT",
                "Expected INSTANCEPATH or CLASSPATH element".into(),
                Vec::new(),
            ));
        };
        self.expect_end_tag("VALUE.OBJECTWITHPATH")?;
        Ok(Some(object))
    }

    /// `<!ELEMENT VALUE.OBJECTWITHLOCALPATH ((LOCALCLASSPATH,CLASS)|
    ///  (LOCALINSTANCEPATH,INSTANCE))>`
    pub(super) fn value_object_with_local_path_element(
        &mut self,
    ) -> Result<Option<CimObject>, DecodeError> {
        if self.test_start_tag("VALUE.OBJECTWITHLOCALPATH").is_none() {
            return Ok(None);
        }
        let object = if let Some(path) = self.local_instance_path_element()? {
            let mut instance = self.expect_instance()?;
            instance.set_path(path);
            CimObject::Instance(instance)
        } else if let Some(path) = self.local_class_path_element()? {
            let mut class = self.expect_class()?;
            class.set_path(path);
            CimObject::Class(class)
        } else {
            return Err(DecodeError::validation(
                self.next_line(),
                "Common.XmlConstants.MISSING_ELEMENT_LOCALPATH",
                "Missing LOCALINSTANCEPATH or LOCALCLASSPATH element".into(),
                Vec::new(),
            ));
        };
        self.expect_end_tag("VALUE.OBJECTWITHLOCALPATH")?;
        Ok(Some(object))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Scalar;

    fn class(source: &str) -> Result<CimClass, DecodeError> {
        let mut d = Decoder::new(source)?;
        let class = d.expect_class()?;
        d.expect_end_of_input()?;
        Ok(class)
    }

    fn instance(source: &str) -> Result<CimInstance, DecodeError> {
        let mut d = Decoder::new(source)?;
        let instance = d.expect_instance()?;
        d.expect_end_of_input()?;
        Ok(instance)
    }

    #[test]
    fn test_simple_instance() {
        let i = instance(
            r#"<INSTANCE CLASSNAME="TST_Person"><PROPERTY NAME="Name" TYPE="string"><VALUE>Mike</VALUE></PROPERTY></INSTANCE>"#,
        )
        .unwrap();
        assert_eq!(i.class_name().as_str(), "TST_Person");
        assert_eq!(i.properties().len(), 1);
        let p = &i.properties()[0];
        assert_eq!(p.name().as_str(), "Name");
        assert_eq!(p.cim_type(), CimType::String);
        assert_eq!(p.value(), &CimValue::from("Mike"));
        assert!(!p.propagated());
        assert!(i.path().is_none());
    }

    #[test]
    fn test_duplicate_property() {
        let err = class(
            r#"<CLASS NAME="C">
                 <PROPERTY NAME="A" TYPE="string"/>
                 <PROPERTY NAME="a" TYPE="uint8"/>
               </CLASS>"#,
        )
        .unwrap_err();
        assert!(err.is_semantic());
        assert_eq!(err.key, "Common.XmlReader.DUPLICATE_PROPERTY");
        assert_eq!(err.line, 3);
    }

    #[test]
    fn test_two_methods() {
        let c = class(
            r#"<CLASS NAME="C" SUPERCLASS="Base">
                 <METHOD NAME="Start" TYPE="uint32"/>
                 <METHOD NAME="Stop" TYPE="uint32">
                   <PARAMETER NAME="Force" TYPE="boolean"/>
                   <PARAMETER.REFARRAY NAME="Targets" REFERENCECLASS="T" ARRAYSIZE="2"/>
                 </METHOD>
               </CLASS>"#,
        )
        .unwrap();
        assert_eq!(c.superclass().as_str(), "Base");
        assert_eq!(c.methods().len(), 2);
        let stop = &c.methods()[1];
        assert_eq!(stop.parameters().len(), 2);
        let targets = &stop.parameters()[1];
        assert!(targets.is_array());
        assert_eq!(targets.array_size(), 2);
        assert_eq!(targets.cim_type(), CimType::Reference);
        assert_eq!(targets.reference_class().as_str(), "T");

        let err = class(
            r#"<CLASS NAME="C"><METHOD NAME="M" TYPE="uint32"/><METHOD NAME="m" TYPE="uint32"/></CLASS>"#,
        )
        .unwrap_err();
        assert_eq!(err.key, "Common.XmlReader.DUPLICATE_METHOD");

        let err = class(
            r#"<CLASS NAME="C"><METHOD NAME="M" TYPE="uint32"><PARAMETER NAME="p" TYPE="string"/><PARAMETER.ARRAY NAME="P" TYPE="string"/></METHOD></CLASS>"#,
        )
        .unwrap_err();
        assert_eq!(err.key, "Common.XmlReader.DUPLICATE_PARAMETER");
    }

    #[test]
    fn test_qualifiers() {
        let c = class(
            r#"<CLASS NAME="C">
                 <QUALIFIER NAME="Description" TYPE="string" TRANSLATABLE="true"><VALUE>d</VALUE></QUALIFIER>
                 <QUALIFIER NAME="Key" TYPE="boolean" OVERRIDABLE="false" PROPAGATED="true"><VALUE>TRUE</VALUE></QUALIFIER>
                 <QUALIFIER NAME="Values" TYPE="string"><VALUE.ARRAY><VALUE>a</VALUE><VALUE>b</VALUE></VALUE.ARRAY></QUALIFIER>
                 <QUALIFIER NAME="Empty" TYPE="uint8"/>
               </CLASS>"#,
        )
        .unwrap();
        let q = c.qualifiers();
        assert_eq!(q.len(), 4);
        let desc = q.get_by_name("description").unwrap();
        assert!(desc.flavor().contains(Flavor::TRANSLATABLE | Flavor::TOSUBCLASS));
        let key = q.get_by_name("Key").unwrap();
        assert!(key.is_true());
        assert!(key.propagated());
        assert!(key.flavor().contains(Flavor::DISABLEOVERRIDE));
        assert!(!key.flavor().is_overridable());
        assert_eq!(q.get_by_name("Values").unwrap().value().len(), 2);
        assert_eq!(q.get_by_name("Empty").unwrap().value(), &CimValue::null(CimType::Uint8, false));

        let err = class(
            r#"<CLASS NAME="C"><QUALIFIER NAME="A" TYPE="string"/><QUALIFIER NAME="A" TYPE="string"/></CLASS>"#,
        )
        .unwrap_err();
        assert_eq!(err.key, "Common.XmlReader.DUPLICATE_QUALIFIER");
    }

    #[test]
    fn test_property_variants() {
        let c = class(
            r#"<CLASS NAME="C">
                 <PROPERTY.ARRAY NAME="Codes" TYPE="uint16" ARRAYSIZE="2" CLASSORIGIN="Base" PROPAGATED="true">
                   <VALUE.ARRAY><VALUE>1</VALUE><VALUE>2</VALUE></VALUE.ARRAY>
                 </PROPERTY.ARRAY>
                 <PROPERTY.REFERENCE NAME="Owner" REFERENCECLASS="TST_Person">
                   <VALUE.REFERENCE><CLASSNAME NAME="TST_Person"/></VALUE.REFERENCE>
                 </PROPERTY.REFERENCE>
                 <PROPERTY.ARRAY NAME="None" TYPE="string"/>
               </CLASS>"#,
        )
        .unwrap();
        let codes = c.property_by_name("Codes").unwrap();
        assert_eq!(codes.array_size(), 2);
        assert_eq!(codes.class_origin().as_str(), "Base");
        assert!(codes.propagated());
        assert_eq!(codes.value().as_array().unwrap(), &[Scalar::Uint16(1), Scalar::Uint16(2)]);

        let owner = c.property_by_name("Owner").unwrap();
        assert_eq!(owner.cim_type(), CimType::Reference);
        assert_eq!(owner.reference_class().as_str(), "TST_Person");
        assert!(!owner.value().is_null());

        let none = c.property_by_name("None").unwrap();
        assert_eq!(none.value(), &CimValue::null(CimType::String, true));
    }

    #[test]
    fn test_array_size_mismatch() {
        let err = class(
            r#"<CLASS NAME="C"><PROPERTY.ARRAY NAME="A" TYPE="uint8" ARRAYSIZE="3"><VALUE.ARRAY><VALUE>1</VALUE></VALUE.ARRAY></PROPERTY.ARRAY></CLASS>"#,
        )
        .unwrap_err();
        assert_eq!(err.key, "Common.XmlReader.ARRAY_SIZE_DIFFERENT");

        let err = class(r#"<CLASS NAME="C"><PROPERTY.ARRAY NAME="A" TYPE="uint8" ARRAYSIZE="0"/></CLASS>"#)
            .unwrap_err();
        assert_eq!(err.key, "Common.XmlReader.ILLEGAL_VALUE");
    }

    #[test]
    fn test_embedded_by_qualifier() {
        let i = instance(
            r#"<INSTANCE CLASSNAME="Outer">
                 <PROPERTY NAME="Inner" TYPE="string">
                   <QUALIFIER NAME="EmbeddedInstance" TYPE="string"><VALUE>Inner</VALUE></QUALIFIER>
                   <VALUE>&lt;INSTANCE CLASSNAME="Inner"/&gt;</VALUE>
                 </PROPERTY>
                 <PROPERTY NAME="Any" TYPE="string">
                   <QUALIFIER NAME="EmbeddedObject" TYPE="boolean"><VALUE>true</VALUE></QUALIFIER>
                 </PROPERTY>
               </INSTANCE>"#,
        )
        .unwrap();
        let inner = i.property_by_name("Inner").unwrap();
        assert_eq!(inner.cim_type(), CimType::Instance);
        assert_eq!(inner.qualifiers().len(), 1);
        let any = i.property_by_name("Any").unwrap();
        assert_eq!(any.value(), &CimValue::null(CimType::Object, false));
    }

    #[test]
    fn test_embedded_requires_string() {
        let err = instance(
            r#"<INSTANCE CLASSNAME="C"><PROPERTY NAME="P" TYPE="uint8" EmbeddedObject="object"/></INSTANCE>"#,
        )
        .unwrap_err();
        assert_eq!(err.key, "Common.XmlReader.INVALID_EMBEDDEDOBJECT_TYPE");
    }

    #[test]
    fn test_qualifier_decl() {
        let mut d = Decoder::new(
            r#"<QUALIFIER.DECLARATION NAME="ValueMap" TYPE="string" ISARRAY="true" TOSUBCLASS="false">
                 <SCOPE PROPERTY="true" METHOD="true" PARAMETER="true"/>
               </QUALIFIER.DECLARATION>"#,
        )
        .unwrap();
        let decl = d.expect_qualifier_decl().unwrap();
        assert!(decl.is_array());
        assert!(decl.value().is_null());
        assert_eq!(decl.scope(), Scope::PROPERTY | Scope::METHOD | Scope::PARAMETER);
        assert!(decl.flavor().contains(Flavor::RESTRICTED));
    }

    #[test]
    fn test_qualifier_decl_array_checks() {
        let decl = |s: &str| Decoder::new(s).and_then(|mut d| d.expect_qualifier_decl());
        let err = decl(
            r#"<QUALIFIER.DECLARATION NAME="Q" TYPE="string"><VALUE.ARRAY/></QUALIFIER.DECLARATION>"#,
        )
        .unwrap_err();
        assert_eq!(err.key, "Common.XmlReader.ARRAY_WITHOUT_ISARRAY");
        let err = decl(
            r#"<QUALIFIER.DECLARATION NAME="Q" TYPE="string" ISARRAY="true" ARRAYSIZE="2"><VALUE.ARRAY><VALUE>a</VALUE></VALUE.ARRAY></QUALIFIER.DECLARATION>"#,
        )
        .unwrap_err();
        assert_eq!(err.key, "Common.XmlReader.ARRAY_SIZE_NOT_SAME");
        let err = decl(
            r#"<QUALIFIER.DECLARATION NAME="Q" TYPE="string" ISARRAY="true"><VALUE>a</VALUE></QUALIFIER.DECLARATION>"#,
        )
        .unwrap_err();
        assert_eq!(err.key, "Common.XmlReader.ARRAY_ATTRIBUTE_DIFFERENT");
    }

    #[test]
    fn test_objects_with_paths() {
        let mut d = Decoder::new(
            r#"<VALUE.OBJECTWITHLOCALPATH>
                 <LOCALCLASSPATH><LOCALNAMESPACEPATH><NAMESPACE NAME="root"/></LOCALNAMESPACEPATH><CLASSNAME NAME="C"/></LOCALCLASSPATH>
                 <CLASS NAME="C"/>
               </VALUE.OBJECTWITHLOCALPATH>"#,
        )
        .unwrap();
        let object = d.value_object_with_local_path_element().unwrap().unwrap();
        assert!(object.is_class());
        assert_eq!(object.path().unwrap().namespace().as_str(), "root");

        let mut d = Decoder::new(
            r#"<VALUE.NAMEDINSTANCE>
                 <INSTANCENAME CLASSNAME="C"><KEYBINDING NAME="k"><KEYVALUE>1</KEYVALUE></KEYBINDING></INSTANCENAME>
                 <INSTANCE CLASSNAME="C"/>
               </VALUE.NAMEDINSTANCE>"#,
        )
        .unwrap();
        let named = d.named_instance_element().unwrap().unwrap();
        assert!(named.path().unwrap().is_instance_path());

        let mut d = Decoder::new("<VALUE.OBJECTWITHPATH><CLASS NAME=\"C\"/></VALUE.OBJECTWITHPATH>").unwrap();
        let err = d.value_object_with_path_element().unwrap_err();
        assert_eq!(err.key, "Common.XmlReader.EXPECTED_INSTANCEPATH_OR_CLASSPATH_ELEMENT");
    }
}
