//! Qualifiers, properties, methods, classes and instances.

use super::value::wire_type;
use super::{Tag, XmlWriter};
use crate::model::{
    CimClass, CimInstance, CimMethod, CimName, CimObject, CimParameter, CimProperty, CimType,
    CimValue, Flavor, ObjectPath, Qualifier, QualifierDecl, QualifierList, Scalar, Scope,
};

const EMBEDDED_OBJECT: &str = "EmbeddedObject";

/// How an embedded-object property is marked on the wire.
enum Marker {
    /// Plain property.
    None,
    /// `EmbeddedObject="object"` or `"instance"`.
    Attribute(&'static str),
    /// An `EmbeddedObject` qualifier, added unless already present.
    Qualifier,
}

/// Embedded instances always take the attribute. Embedded classes (and
/// nulls) take the qualifier, or the attribute when qualifiers are not
/// being written.
fn marker(value: &CimValue, include_qualifiers: bool) -> Marker {
    match value.cim_type() {
        CimType::Instance => Marker::Attribute("instance"),
        CimType::Object => {
            let first = match value {
                CimValue::Scalar(s) => Some(s),
                CimValue::Array { items, .. } => items.first(),
                CimValue::Null { .. } => None,
            };
            let holds_instance =
                matches!(first, Some(Scalar::Object(o)) if o.is_instance());
            if holds_instance || !include_qualifiers {
                Marker::Attribute("object")
            } else {
                Marker::Qualifier
            }
        }
        _ => Marker::None,
    }
}

/// Flavor attributes that differ from the defaults.
fn flavor_attrs(tag: Tag, flavor: Flavor) -> Tag {
    tag.attr_if(!flavor.contains(Flavor::OVERRIDABLE), "OVERRIDABLE", "false")
        .attr_if(!flavor.contains(Flavor::TOSUBCLASS), "TOSUBCLASS", "false")
        .attr_if(flavor.contains(Flavor::TOINSTANCE), "TOINSTANCE", "true")
        .attr_if(flavor.contains(Flavor::TRANSLATABLE), "TRANSLATABLE", "true")
}

impl XmlWriter {
    // === Qualifiers ===

    /// `<!ELEMENT QUALIFIER (VALUE|VALUE.ARRAY)?>`
    pub(super) fn qualifier(&mut self, qualifier: &Qualifier) {
        let tag = Tag::new("QUALIFIER")
            .attr("NAME", qualifier.name().as_str())
            .attr("TYPE", wire_type(qualifier.value().cim_type()))
            .attr_if(qualifier.propagated(), "PROPAGATED", "true");
        let tag = flavor_attrs(tag, qualifier.flavor());
        if qualifier.value().is_null() {
            self.empty(tag);
        } else {
            self.start(tag);
            self.value(qualifier.value());
            self.end("QUALIFIER");
        }
    }

    fn qualifiers(&mut self, qualifiers: &QualifierList) {
        for qualifier in qualifiers.iter() {
            self.qualifier(qualifier);
        }
    }

    /// `<!ELEMENT QUALIFIER.DECLARATION (SCOPE?,(VALUE|VALUE.ARRAY)?)>`
    pub(super) fn qualifier_decl(&mut self, decl: &QualifierDecl) {
        let tag = Tag::new("QUALIFIER.DECLARATION")
            .attr("NAME", decl.name().as_str())
            .attr("TYPE", wire_type(decl.cim_type()))
            .attr_if(decl.is_array(), "ISARRAY", "true");
        let size = decl.array_size().to_string();
        let tag = tag.attr_if(decl.is_array() && decl.array_size() != 0, "ARRAYSIZE", &size);
        self.start(flavor_attrs(tag, decl.flavor()));
        self.scope(decl.scope());
        self.value(decl.value());
        self.end("QUALIFIER.DECLARATION");
    }

    fn scope(&mut self, scope: Scope) {
        if scope.is_empty() {
            return;
        }
        let mut tag = Tag::new("SCOPE");
        for (name, bit) in Scope::ATTRIBUTES {
            tag = tag.attr_if(scope.contains(bit), name, "true");
        }
        self.empty(tag);
    }

    // === Properties ===

    /// `PROPERTY`, `PROPERTY.ARRAY` or `PROPERTY.REFERENCE`.
    pub(super) fn property(&mut self, property: &CimProperty) {
        let include_qualifiers = self.options.include_qualifiers;
        let origin = property.class_origin();
        let write_origin = self.options.include_class_origin && !origin.is_null();
        let value = property.value();

        let (element, tag) = if property.cim_type() == CimType::Reference && !property.is_array() {
            let class = property.reference_class();
            let tag = Tag::new("PROPERTY.REFERENCE")
                .attr("NAME", property.name().as_str())
                .attr_if(!class.is_null(), "REFERENCECLASS", class.as_str());
            ("PROPERTY.REFERENCE", tag)
        } else {
            let element = if property.is_array() {
                "PROPERTY.ARRAY"
            } else {
                "PROPERTY"
            };
            let tag = Tag::new(element)
                .attr("NAME", property.name().as_str())
                .attr("TYPE", wire_type(property.cim_type()));
            (element, tag)
        };
        let marker = marker(value, include_qualifiers);
        let tag = match marker {
            Marker::Attribute(kind) => tag.attr(EMBEDDED_OBJECT, kind),
            _ => tag,
        };
        let size = property.array_size().to_string();
        let tag = tag
            .attr_if(property.is_array() && property.array_size() != 0, "ARRAYSIZE", &size)
            .attr_if(write_origin, "CLASSORIGIN", origin.as_str())
            .attr_if(property.propagated(), "PROPAGATED", "true");
        self.start(tag);

        if include_qualifiers {
            self.qualifiers(property.qualifiers());
            if matches!(marker, Marker::Qualifier)
                && property.qualifiers().find(EMBEDDED_OBJECT).is_none()
            {
                self.start(Tag::new("QUALIFIER").attr("NAME", EMBEDDED_OBJECT).attr("TYPE", "boolean"));
                self.text_element(Tag::new("VALUE"), "TRUE");
                self.end("QUALIFIER");
            }
        }
        self.value(value);
        self.end(element);
    }

    fn properties(&mut self, properties: &[CimProperty]) {
        for property in properties {
            if self.options.includes_property(property.name()) {
                self.property(property);
            }
        }
    }

    // === Methods ===

    /// `PARAMETER`, `PARAMETER.REFERENCE`, `PARAMETER.ARRAY` or
    /// `PARAMETER.REFARRAY`.
    fn parameter(&mut self, parameter: &CimParameter) {
        let is_reference = parameter.cim_type() == CimType::Reference;
        let element = match (is_reference, parameter.is_array()) {
            (false, false) => "PARAMETER",
            (true, false) => "PARAMETER.REFERENCE",
            (false, true) => "PARAMETER.ARRAY",
            (true, true) => "PARAMETER.REFARRAY",
        };
        let mut tag = Tag::new(element).attr("NAME", parameter.name().as_str());
        if is_reference {
            let class = parameter.reference_class();
            tag = tag.attr_if(!class.is_null(), "REFERENCECLASS", class.as_str());
        } else {
            tag = tag.attr("TYPE", wire_type(parameter.cim_type()));
        }
        let size = parameter.array_size().to_string();
        let tag = tag.attr_if(parameter.is_array() && parameter.array_size() != 0, "ARRAYSIZE", &size);

        if !self.options.include_qualifiers || parameter.qualifiers().is_empty() {
            self.empty(tag);
        } else {
            self.start(tag);
            self.qualifiers(parameter.qualifiers());
            self.end(element);
        }
    }

    /// `<!ELEMENT METHOD (QUALIFIER*,(PARAMETER|PARAMETER.REFERENCE|
    /// PARAMETER.ARRAY|PARAMETER.REFARRAY)*)>`
    fn method(&mut self, method: &CimMethod) {
        let origin = method.class_origin();
        let tag = Tag::new("METHOD")
            .attr("NAME", method.name().as_str())
            .attr("TYPE", wire_type(method.return_type()))
            .attr_if(
                self.options.include_class_origin && !origin.is_null(),
                "CLASSORIGIN",
                origin.as_str(),
            )
            .attr_if(method.propagated(), "PROPAGATED", "true");
        self.start(tag);
        if self.options.include_qualifiers {
            self.qualifiers(method.qualifiers());
        }
        for parameter in method.parameters() {
            self.parameter(parameter);
        }
        self.end("METHOD");
    }

    // === Classes and instances ===

    /// `<!ELEMENT CLASS (QUALIFIER*,(PROPERTY|PROPERTY.ARRAY|
    /// PROPERTY.REFERENCE)*,METHOD*)>`
    pub(super) fn class(&mut self, class: &CimClass) {
        let superclass = class.superclass();
        let tag = Tag::new("CLASS")
            .attr("NAME", class.class_name().as_str())
            .attr_if(!superclass.is_null(), "SUPERCLASS", superclass.as_str());
        self.start(tag);
        if self.options.include_qualifiers {
            self.qualifiers(class.qualifiers());
        }
        self.properties(class.properties());
        for method in class.methods() {
            self.method(method);
        }
        self.end("CLASS");
    }

    /// `<!ELEMENT INSTANCE (QUALIFIER*,(PROPERTY|PROPERTY.ARRAY|
    /// PROPERTY.REFERENCE)*)>`
    pub(super) fn instance(&mut self, instance: &CimInstance) {
        self.start(Tag::new("INSTANCE").attr("CLASSNAME", instance.class_name().as_str()));
        if self.options.include_qualifiers {
            self.qualifiers(instance.qualifiers());
        }
        self.properties(instance.properties());
        self.end("INSTANCE");
    }

    pub(super) fn object(&mut self, object: &CimObject) {
        match object {
            CimObject::Class(class) => self.class(class),
            CimObject::Instance(instance) => self.instance(instance),
        }
    }

    // === Objects with paths ===

    /// `<!ELEMENT VALUE.OBJECT (CLASS|INSTANCE)>`
    pub(super) fn value_object(&mut self, object: &CimObject) {
        self.start(Tag::new("VALUE.OBJECT"));
        self.object(object);
        self.end("VALUE.OBJECT");
    }

    /// `<!ELEMENT VALUE.NAMEDINSTANCE (INSTANCENAME,INSTANCE)>`
    pub(super) fn value_named_instance(&mut self, instance: &CimInstance) {
        self.start(Tag::new("VALUE.NAMEDINSTANCE"));
        self.instance_name(&object_path_of(instance.path(), instance.class_name()));
        self.instance(instance);
        self.end("VALUE.NAMEDINSTANCE");
    }

    /// `<!ELEMENT VALUE.INSTANCEWITHPATH (INSTANCEPATH,INSTANCE)>`
    pub(super) fn value_instance_with_path(&mut self, instance: &CimInstance) {
        self.start(Tag::new("VALUE.INSTANCEWITHPATH"));
        self.instance_path(&object_path_of(instance.path(), instance.class_name()));
        self.instance(instance);
        self.end("VALUE.INSTANCEWITHPATH");
    }

    /// `<!ELEMENT VALUE.OBJECTWITHPATH ((CLASSPATH,CLASS)|(INSTANCEPATH,INSTANCE))>`
    pub(super) fn value_object_with_path(&mut self, object: &CimObject) {
        let path = object_path_of(object.path(), object.class_name());
        self.start(Tag::new("VALUE.OBJECTWITHPATH"));
        if object.is_class() {
            self.class_path(&path);
        } else {
            self.instance_path(&path);
        }
        self.object(object);
        self.end("VALUE.OBJECTWITHPATH");
    }

    /// `<!ELEMENT VALUE.OBJECTWITHLOCALPATH ((LOCALCLASSPATH,CLASS)|
    /// (LOCALINSTANCEPATH,INSTANCE))>`
    pub(super) fn value_object_with_local_path(&mut self, object: &CimObject) {
        let path = object_path_of(object.path(), object.class_name());
        self.start(Tag::new("VALUE.OBJECTWITHLOCALPATH"));
        if object.is_class() {
            self.local_class_path(&path);
        } else {
            self.local_instance_path(&path);
        }
        self.object(object);
        self.end("VALUE.OBJECTWITHLOCALPATH");
    }

    /// `<!ELEMENT VALUE.NAMEDOBJECT (CLASS|(INSTANCENAME,INSTANCE))>`
    pub(super) fn value_named_object(&mut self, object: &CimObject) {
        self.start(Tag::new("VALUE.NAMEDOBJECT"));
        match object {
            CimObject::Class(class) => self.class(class),
            CimObject::Instance(instance) => {
                self.instance_name(&object_path_of(instance.path(), instance.class_name()));
                self.instance(instance);
            }
        }
        self.end("VALUE.NAMEDOBJECT");
    }
}

/// The object's own path, or a bare path naming its class.
fn object_path_of(path: Option<&ObjectPath>, class_name: &CimName) -> ObjectPath {
    path.cloned()
        .unwrap_or_else(|| ObjectPath::new(class_name.clone()))
}
