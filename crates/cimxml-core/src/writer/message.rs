//! Message envelopes and declaration documents.

use super::value::wire_type;
use super::{Tag, XmlWriter, XML_DECLARATION};
use crate::message::{
    CimError, DeclGroup, DeclGroupKind, Declaration, IParamValue, IValue, Message, MessageBody,
    ParamValue,
};
use crate::model::{CimType, CimValue, ObjectPath};

/// `PARAMTYPE` and the embedded marker it implies.
fn param_type(tag: Tag, ty: CimType) -> Tag {
    let tag = tag.attr("PARAMTYPE", wire_type(ty));
    match ty {
        CimType::Object => tag.attr("EmbeddedObject", "object"),
        CimType::Instance => tag.attr("EmbeddedObject", "instance"),
        _ => tag,
    }
}

impl XmlWriter {
    fn cim_start(&mut self, cim_version: &str, dtd_version: &str) {
        self.out.push_str(XML_DECLARATION);
        self.out.push('\n');
        self.start(
            Tag::new("CIM")
                .attr("CIMVERSION", cim_version)
                .attr("DTDVERSION", dtd_version),
        );
    }

    // === Messages ===

    pub(super) fn message(&mut self, message: &Message) {
        self.cim_start(&message.cim_version, &message.dtd_version);
        self.start(
            Tag::new("MESSAGE")
                .attr("ID", &message.id)
                .attr("PROTOCOLVERSION", &message.protocol_version),
        );
        match &message.body {
            MessageBody::MethodCall(call) => {
                self.start(Tag::new("SIMPLEREQ"));
                self.start(Tag::new("METHODCALL").attr("NAME", call.name.as_str()));
                self.local_object_path(&call.path);
                for param in &call.params {
                    self.param_value(param);
                }
                self.end("METHODCALL");
                self.end("SIMPLEREQ");
            }
            MessageBody::IMethodCall(call) => {
                self.start(Tag::new("SIMPLEREQ"));
                self.start(Tag::new("IMETHODCALL").attr("NAME", call.name.as_str()));
                self.local_namespace_path(&call.namespace);
                for param in &call.params {
                    self.iparam_value(param);
                }
                self.end("IMETHODCALL");
                self.end("SIMPLEREQ");
            }
            MessageBody::ExportMethodCall(call) => {
                self.start(Tag::new("SIMPLEEXPREQ"));
                self.start(Tag::new("EXPMETHODCALL").attr("NAME", call.name.as_str()));
                for param in &call.params {
                    let tag = Tag::new("EXPPARAMVALUE").attr("NAME", &param.name);
                    match &param.instance {
                        Some(instance) => {
                            self.start(tag);
                            self.instance(instance);
                            self.end("EXPPARAMVALUE");
                        }
                        None => self.empty(tag),
                    }
                }
                self.end("EXPMETHODCALL");
                self.end("SIMPLEEXPREQ");
            }
            MessageBody::MethodResponse(response) => {
                self.start(Tag::new("SIMPLERSP"));
                self.start(Tag::new("METHODRESPONSE").attr("NAME", response.name.as_str()));
                if let Some(error) = &response.error {
                    self.error(error);
                } else {
                    if let Some(value) = &response.return_value {
                        self.return_value(value);
                    }
                    for param in &response.params {
                        self.param_value(param);
                    }
                }
                self.end("METHODRESPONSE");
                self.end("SIMPLERSP");
            }
            MessageBody::IMethodResponse(response) => {
                self.start(Tag::new("SIMPLERSP"));
                self.start(Tag::new("IMETHODRESPONSE").attr("NAME", response.name.as_str()));
                if let Some(error) = &response.error {
                    self.error(error);
                } else {
                    if let Some(value) = &response.return_value {
                        self.ireturn_value(value);
                    }
                    for param in &response.params {
                        self.param_value(param);
                    }
                }
                self.end("IMETHODRESPONSE");
                self.end("SIMPLERSP");
            }
            MessageBody::ExportMethodResponse(response) => {
                self.start(Tag::new("SIMPLEEXPRSP"));
                self.start(Tag::new("EXPMETHODRESPONSE").attr("NAME", response.name.as_str()));
                if let Some(error) = &response.error {
                    self.error(error);
                } else if let Some(value) = &response.return_value {
                    self.ireturn_value(value);
                }
                self.end("EXPMETHODRESPONSE");
                self.end("SIMPLEEXPRSP");
            }
        }
        self.end("MESSAGE");
        self.end("CIM");
    }

    /// `<!ELEMENT ERROR (INSTANCE*)>`
    fn error(&mut self, error: &CimError) {
        let code = error.code.to_string();
        let tag = Tag::new("ERROR").attr("CODE", &code).attr_if(
            !error.description.is_empty(),
            "DESCRIPTION",
            &error.description,
        );
        if error.instances.is_empty() {
            self.empty(tag);
            return;
        }
        self.start(tag);
        for instance in &error.instances {
            self.instance(instance);
        }
        self.end("ERROR");
    }

    /// `PARAMVALUE`, typed when the parameter was. Nulls are empty tags.
    fn param_value(&mut self, param: &ParamValue) {
        let mut tag = Tag::new("PARAMVALUE").attr("NAME", &param.name);
        if param.is_typed {
            tag = param_type(tag, param.value.cim_type());
        }
        if param.value.is_null() {
            self.empty(tag);
            return;
        }
        self.start(tag);
        self.value(&param.value);
        self.end("PARAMVALUE");
    }

    /// `RETURNVALUE`. A null return value has no wire form; callers leave
    /// it out.
    fn return_value(&mut self, value: &CimValue) {
        if value.is_null() {
            return;
        }
        self.start(param_type(Tag::new("RETURNVALUE"), value.cim_type()));
        self.value(value);
        self.end("RETURNVALUE");
    }

    fn iparam_value(&mut self, param: &IParamValue) {
        let tag = Tag::new("IPARAMVALUE").attr("NAME", &param.name);
        if param.value.is_empty() {
            self.empty(tag);
            return;
        }
        self.start(tag);
        self.ivalue(&param.value);
        self.end("IPARAMVALUE");
    }

    fn ireturn_value(&mut self, value: &IValue) {
        if matches!(value, IValue::Empty) {
            self.empty(Tag::new("IRETURNVALUE"));
            return;
        }
        self.start(Tag::new("IRETURNVALUE"));
        self.ivalue(value);
        self.end("IRETURNVALUE");
    }

    /// The content of an `IPARAMVALUE` or `IRETURNVALUE`.
    fn ivalue(&mut self, value: &IValue) {
        match value {
            IValue::Empty => {}
            IValue::Value(v) => self.value(v),
            IValue::ClassNames(names) => names.iter().for_each(|n| self.class_name(n)),
            IValue::InstanceNames(paths) => paths.iter().for_each(|p| self.instance_name(p)),
            IValue::QualifierDecls(decls) => decls.iter().for_each(|d| self.qualifier_decl(d)),
            IValue::Classes(classes) => classes.iter().for_each(|c| self.class(c)),
            IValue::Instances(instances) => instances.iter().for_each(|i| self.instance(i)),
            IValue::NamedInstances(instances) => {
                instances.iter().for_each(|i| self.value_named_instance(i));
            }
            IValue::Objects(objects) => objects.iter().for_each(|o| self.value_object(o)),
            IValue::ObjectsWithPath(objects) => {
                objects.iter().for_each(|o| self.value_object_with_path(o));
            }
            IValue::ObjectsWithLocalPath(objects) => {
                objects.iter().for_each(|o| self.value_object_with_local_path(o));
            }
            IValue::ObjectPaths(paths) => paths.iter().for_each(|p| self.object_path(p)),
            IValue::InstancePaths(paths) => paths.iter().for_each(|p| self.instance_path(p)),
            IValue::InstancesWithPath(instances) => {
                instances.iter().for_each(|i| self.value_instance_with_path(i));
            }
        }
    }

    // === Declarations ===

    pub(super) fn declaration(&mut self, declaration: &Declaration) {
        self.cim_start(&declaration.cim_version, &declaration.dtd_version);
        self.start(Tag::new("DECLARATION"));
        for group in &declaration.groups {
            self.decl_group(group);
        }
        self.end("DECLARATION");
        self.end("CIM");
    }

    fn decl_group(&mut self, group: &DeclGroup) {
        let element = match group.kind {
            DeclGroupKind::Plain => "DECLGROUP",
            DeclGroupKind::WithName => "DECLGROUP.WITHNAME",
            DeclGroupKind::WithPath => "DECLGROUP.WITHPATH",
        };
        self.start(Tag::new(element));

        if group.kind == DeclGroupKind::WithPath {
            for object in &group.objects {
                let has_host = object.path().is_some_and(|p| !p.host().is_empty());
                if has_host {
                    self.value_object_with_path(object);
                } else if object.path().is_some() {
                    self.value_object_with_local_path(object);
                } else {
                    let mut object = object.clone();
                    let path = ObjectPath::new(object.class_name().clone())
                        .with_namespace(group.namespace.clone());
                    object.set_path(path);
                    self.value_object_with_local_path(&object);
                }
            }
        } else {
            if !group.host.is_empty() {
                self.namespace_path(&group.host, &group.namespace);
            } else if !group.namespace.is_null() {
                self.local_namespace_path(&group.namespace);
            }
            for decl in &group.qualifier_decls {
                self.qualifier_decl(decl);
            }
            for object in &group.objects {
                if group.kind == DeclGroupKind::Plain {
                    self.value_object(object);
                } else {
                    self.value_named_object(object);
                }
            }
        }

        self.end(element);
    }
}
