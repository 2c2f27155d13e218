//! Values, names and object paths.

use super::{Tag, XmlWriter};
use crate::model::{
    CimName, CimType, CimValue, KeyBinding, KeyBindingKind, NamespaceName, ObjectPath, Scalar,
};

/// The `TYPE`/`PARAMTYPE` attribute value. Embedded objects travel as
/// strings.
pub(super) const fn wire_type(ty: CimType) -> &'static str {
    match ty {
        CimType::Object | CimType::Instance => "string",
        _ => ty.as_str(),
    }
}

impl XmlWriter {
    // === Values ===

    /// `VALUE`, `VALUE.ARRAY`, `VALUE.REFERENCE` or `VALUE.REFARRAY`;
    /// nothing for a null.
    pub(super) fn value(&mut self, value: &CimValue) {
        match value {
            CimValue::Null { .. } => {}
            CimValue::Scalar(Scalar::Reference(path)) => self.value_reference(path),
            CimValue::Scalar(scalar) => self.text_element(Tag::new("VALUE"), &scalar.to_string()),
            CimValue::Array { ty, items } if *ty == CimType::Reference => {
                self.start(Tag::new("VALUE.REFARRAY"));
                for item in items {
                    if let Scalar::Reference(path) = item {
                        self.value_reference(path);
                    }
                }
                self.end("VALUE.REFARRAY");
            }
            CimValue::Array { items, .. } => {
                self.start(Tag::new("VALUE.ARRAY"));
                for item in items {
                    self.text_element(Tag::new("VALUE"), &item.to_string());
                }
                self.end("VALUE.ARRAY");
            }
        }
    }

    /// `<!ELEMENT VALUE.REFERENCE (CLASSPATH|LOCALCLASSPATH|CLASSNAME|
    /// INSTANCEPATH|LOCALINSTANCEPATH|INSTANCENAME)>`
    pub(super) fn value_reference(&mut self, path: &ObjectPath) {
        self.start(Tag::new("VALUE.REFERENCE"));
        self.reference_path(path);
        self.end("VALUE.REFERENCE");
    }

    /// The path element the path's contents call for: host gives the full
    /// path, namespace alone the local path, neither just the name. Paths
    /// with keys are instance paths.
    fn reference_path(&mut self, path: &ObjectPath) {
        let is_instance = path.is_instance_path();
        if !path.host().is_empty() {
            if is_instance {
                self.instance_path(path);
            } else {
                self.class_path(path);
            }
        } else if !path.namespace().is_null() {
            if is_instance {
                self.local_instance_path(path);
            } else {
                self.local_class_path(path);
            }
        } else if is_instance {
            self.instance_name(path);
        } else {
            self.class_name(path.class_name());
        }
    }

    // === Names and paths ===

    pub(super) fn local_namespace_path(&mut self, namespace: &NamespaceName) {
        self.start(Tag::new("LOCALNAMESPACEPATH"));
        for component in namespace.components() {
            self.empty(Tag::new("NAMESPACE").attr("NAME", component));
        }
        self.end("LOCALNAMESPACEPATH");
    }

    pub(super) fn namespace_path(&mut self, host: &str, namespace: &NamespaceName) {
        self.start(Tag::new("NAMESPACEPATH"));
        self.text_element(Tag::new("HOST"), host);
        self.local_namespace_path(namespace);
        self.end("NAMESPACEPATH");
    }

    pub(super) fn class_name(&mut self, name: &CimName) {
        self.empty(Tag::new("CLASSNAME").attr("NAME", name.as_str()));
    }

    /// `<!ELEMENT INSTANCENAME (KEYBINDING*|KEYVALUE?|VALUE.REFERENCE?)>`
    ///
    /// A single key with a null name is written bare.
    pub(super) fn instance_name(&mut self, path: &ObjectPath) {
        let tag = Tag::new("INSTANCENAME").attr("CLASSNAME", path.class_name().as_str());
        let keys = path.key_bindings();
        if keys.is_empty() {
            self.empty(tag);
            return;
        }
        self.start(tag);
        match keys {
            [key] if key.name().is_null() => self.key_value(key),
            _ => {
                for key in keys {
                    self.start(Tag::new("KEYBINDING").attr("NAME", key.name().as_str()));
                    self.key_value(key);
                    self.end("KEYBINDING");
                }
            }
        }
        self.end("INSTANCENAME");
    }

    /// `KEYVALUE`, or `VALUE.REFERENCE` for reference keys. A reference
    /// value that does not parse is written as a string key.
    fn key_value(&mut self, key: &KeyBinding) {
        if key.kind() == KeyBindingKind::Reference {
            if let Ok(path) = ObjectPath::parse(key.value()) {
                self.value_reference(&path);
                return;
            }
        }
        let value_type = key.kind().value_type();
        self.text_element(Tag::new("KEYVALUE").attr("VALUETYPE", value_type), key.value());
    }

    pub(super) fn instance_path(&mut self, path: &ObjectPath) {
        self.start(Tag::new("INSTANCEPATH"));
        self.namespace_path(path.host(), path.namespace());
        self.instance_name(path);
        self.end("INSTANCEPATH");
    }

    pub(super) fn local_instance_path(&mut self, path: &ObjectPath) {
        self.start(Tag::new("LOCALINSTANCEPATH"));
        self.local_namespace_path(path.namespace());
        self.instance_name(path);
        self.end("LOCALINSTANCEPATH");
    }

    pub(super) fn class_path(&mut self, path: &ObjectPath) {
        self.start(Tag::new("CLASSPATH"));
        self.namespace_path(path.host(), path.namespace());
        self.class_name(path.class_name());
        self.end("CLASSPATH");
    }

    pub(super) fn local_class_path(&mut self, path: &ObjectPath) {
        self.start(Tag::new("LOCALCLASSPATH"));
        self.local_namespace_path(path.namespace());
        self.class_name(path.class_name());
        self.end("LOCALCLASSPATH");
    }

    /// `LOCALINSTANCEPATH` or `LOCALCLASSPATH`, as a method call target.
    pub(super) fn local_object_path(&mut self, path: &ObjectPath) {
        if path.is_instance_path() {
            self.local_instance_path(path);
        } else {
            self.local_class_path(path);
        }
    }

    /// `<!ELEMENT OBJECTPATH (INSTANCEPATH|CLASSPATH)>`
    pub(super) fn object_path(&mut self, path: &ObjectPath) {
        self.start(Tag::new("OBJECTPATH"));
        if path.is_instance_path() {
            self.instance_path(path);
        } else {
            self.class_path(path);
        }
        self.end("OBJECTPATH");
    }
}
