//! Integration tests over whole documents.

use cimxml_core::message::{DeclGroupKind, IMethodCall, IMethodResponse, IParamValue, IValue};
use cimxml_core::model::{KeyBinding, KeyBindingKind, Qualifier};
use cimxml_core::writer::{encode_class_with, encode_reference};
use cimxml_core::{
    decode_class, decode_declaration, decode_instance, decode_message, decode_value,
    encode_class, encode_declaration, encode_instance, encode_message, encode_value, CimClass,
    CimInstance, CimName, CimProperty, CimType, CimValue, Message, MessageBody, NamespaceName,
    ObjectPath, Scalar, Schema, WriteOptions,
};

const SCHEMA: &str = include_str!("fixtures/schema.xml");
const ENUMERATE_INSTANCES: &str = include_str!("fixtures/enumerate_instances.xml");

fn name(s: &str) -> CimName {
    CimName::new(s).unwrap()
}

fn string_key(key: &str, value: &str) -> KeyBinding {
    KeyBinding::new(name(key), value, KeyBindingKind::String)
}

/// Test the simple instance scenario.
#[test]
fn test_simple_instance() {
    let instance = decode_instance(
        r#"<INSTANCE CLASSNAME="TST_Person"><PROPERTY NAME="Name" TYPE="string"><VALUE>Mike</VALUE></PROPERTY></INSTANCE>"#,
    )
    .unwrap();

    assert_eq!(instance.class_name().as_str(), "TST_Person");
    assert_eq!(instance.properties().len(), 1);
    let property = instance.property(0).unwrap();
    assert_eq!(property.name().as_str(), "Name");
    assert_eq!(property.cim_type(), CimType::String);
    assert_eq!(property.value(), &CimValue::from("Mike"));
    assert!(!property.propagated());
}

/// Test that an INSTANCENAME key renders in the dotted key syntax and
/// parses back.
#[test]
fn test_instance_name_string_form() {
    let value = decode_value(
        r#"<VALUE.REFERENCE>
             <INSTANCENAME CLASSNAME="TST_Person">
               <KEYBINDING NAME="Name"><KEYVALUE VALUETYPE="string">Mike</KEYVALUE></KEYBINDING>
             </INSTANCENAME>
           </VALUE.REFERENCE>"#,
        CimType::Reference,
    )
    .unwrap();
    let path = value.get_reference().unwrap().unwrap();

    assert_eq!(path.key_bindings().len(), 1);
    let key = &path.key_bindings()[0];
    assert_eq!(key.name().as_str(), "Name");
    assert_eq!(key.kind(), KeyBindingKind::String);

    let text = path.to_string();
    assert_eq!(text, "TST_Person.Name=\"Mike\"");
    assert!(ObjectPath::parse(&text).unwrap().identical(path));
}

/// Test a two-level nesting of embedded instances survives a round trip
/// unchanged, both structurally and textually.
#[test]
fn test_embedded_depth_three() {
    let mut leaf = CimInstance::new(name("TST_Leaf"));
    leaf.add_property(CimProperty::new(name("Label"), CimValue::from("<&>")))
        .unwrap();
    let mut middle = CimInstance::new(name("TST_Middle"));
    middle
        .add_property(CimProperty::new(name("Leaf"), CimValue::from(leaf)))
        .unwrap();
    let mut outer = CimInstance::new(name("TST_Outer"));
    outer
        .add_property(CimProperty::new(name("Middle"), CimValue::from(middle)))
        .unwrap();

    let xml = encode_instance(&outer);
    assert!(xml.contains("EmbeddedObject=\"instance\""));

    let decoded = decode_instance(&xml).unwrap();
    assert_eq!(decoded, outer);
    assert_eq!(decoded.property(0).unwrap().cim_type(), CimType::Instance);
    assert_eq!(encode_instance(&decoded), xml);
}

/// Test uint8 literal bounds.
#[test]
fn test_uint8_bounds() {
    let err = decode_value("<VALUE>256</VALUE>", CimType::Uint8).unwrap_err();
    assert!(err.is_semantic());
    assert_eq!(err.key, "Common.XmlReader.U8_VALUE_OUT_OF_RANGE");

    let value = decode_value("<VALUE>255</VALUE>", CimType::Uint8).unwrap();
    assert_eq!(value, CimValue::from(255u8));
    let value = decode_value("<VALUE>0xFF</VALUE>", CimType::Uint8).unwrap();
    assert_eq!(value, CimValue::from(255u8));
}

/// Test duplicate property names fail and distinct methods do not.
#[test]
fn test_duplicate_detection() {
    let err = decode_class(
        r#"<CLASS NAME="TST_Dup">
             <PROPERTY NAME="Name" TYPE="string"/>
             <PROPERTY NAME="NAME" TYPE="string"/>
           </CLASS>"#,
    )
    .unwrap_err();
    assert_eq!(err.key, "Common.XmlReader.DUPLICATE_PROPERTY");
    assert_eq!(err.line, 3);

    let class = decode_class(
        r#"<CLASS NAME="TST_Methods">
             <METHOD NAME="Start" TYPE="uint32"/>
             <METHOD NAME="Stop" TYPE="uint32"/>
           </CLASS>"#,
    )
    .unwrap();
    assert_eq!(class.methods().len(), 2);
}

/// Test an empty VALUE inside VALUE.ARRAY becomes an empty slot.
#[test]
fn test_array_null_slot() {
    let value = decode_value(
        "<VALUE.ARRAY><VALUE>x</VALUE><VALUE/></VALUE.ARRAY>",
        CimType::String,
    )
    .unwrap();
    assert_eq!(value.len(), 2);
    assert_eq!(
        value.as_array().unwrap(),
        &[Scalar::String("x".into()), Scalar::String(String::new())]
    );
}

/// Test leading, trailing and repeated spaces survive text content.
#[test]
fn test_whitespace_in_values() {
    let mut instance = CimInstance::new(name("TST_Person"));
    instance
        .add_property(CimProperty::new(name("Name"), CimValue::from("  padded  ")))
        .unwrap();
    let nicknames = CimValue::array(
        CimType::String,
        vec![Scalar::String(" ".into()), Scalar::String("x".into())],
    )
    .unwrap();
    instance
        .add_property(CimProperty::new(name("Nicknames"), nicknames))
        .unwrap();
    instance
        .add_property(CimProperty::new(name("Initial"), CimValue::from(Scalar::Char16(' '))))
        .unwrap();
    instance
        .add_property(CimProperty::new(name("Note"), CimValue::from("\tline one\nline two\n")))
        .unwrap();

    let xml = encode_instance(&instance);
    assert!(xml.contains("<VALUE>&#32; padded &#32;</VALUE>"));
    let decoded = decode_instance(&xml).unwrap();
    assert_eq!(decoded, instance);
    assert_eq!(encode_instance(&decoded), xml);

    let path = ObjectPath::new(name("TST_Person")).with_keys(vec![string_key("Name", " Mike ")]);
    let value = decode_value(&encode_reference(&path), CimType::Reference).unwrap();
    let decoded = value.get_reference().unwrap().unwrap();
    assert_eq!(decoded.key_bindings()[0].value(), " Mike ");
}

/// Test a NUL char16 slot is written without a raw NUL and reads back.
#[test]
fn test_char16_nul_slot() {
    let value = decode_value(
        "<VALUE.ARRAY><VALUE>a</VALUE><VALUE/></VALUE.ARRAY>",
        CimType::Char16,
    )
    .unwrap();
    assert_eq!(value.as_array().unwrap(), &[Scalar::Char16('a'), Scalar::Char16('\0')]);

    let xml = encode_value(&value);
    assert!(!xml.contains('\0'));
    assert_eq!(decode_value(&xml, CimType::Char16).unwrap(), value);
}

/// Test path ordering is consistent with component order and numeric
/// keys compare by value.
#[test]
fn test_path_ordering() {
    let numeric = |v: &str| {
        ObjectPath::new(name("TST_Item")).with_keys(vec![KeyBinding::new(
            name("Id"),
            v,
            KeyBindingKind::Numeric,
        )])
    };
    assert_eq!(numeric("10"), numeric("0xA"));
    assert!(numeric("9") < numeric("10"));

    let a = ObjectPath::new(name("B_Class")).with_namespace(NamespaceName::new("root/a").unwrap());
    let b = ObjectPath::new(name("A_Class")).with_namespace(NamespaceName::new("root/b").unwrap());
    assert!(a < b);
    assert!(b > a);

    let h1 = b.clone().with_host("alpha");
    let h2 = a.clone().with_host("Beta");
    assert!(h1 < h2);
    assert_eq!(h1.clone().with_host("ALPHA"), h1);
}

/// Test decoding a response with named instances.
#[test]
fn test_enumerate_instances_response() {
    let message = decode_message(ENUMERATE_INSTANCES).unwrap();
    assert_eq!(message.id, "1001");
    assert_eq!(message.method_name().as_str(), "EnumerateInstances");

    let MessageBody::IMethodResponse(response) = &message.body else {
        panic!("expected IMETHODRESPONSE, got {:?}", message.body);
    };
    assert!(response.error.is_none());
    let Some(IValue::NamedInstances(instances)) = &response.return_value else {
        panic!("expected named instances");
    };
    assert_eq!(instances.len(), 2);

    let mike = &instances[0];
    assert_eq!(
        mike.path().unwrap().key("Name").unwrap().value(),
        "Mike"
    );
    assert_eq!(mike.property_by_name("Age").unwrap().value(), &CimValue::from(42u8));
    let nicknames = mike.property_by_name("Nicknames").unwrap().value();
    assert_eq!(nicknames.len(), 2);

    let anna = &instances[1];
    assert!(anna.property_by_name("Age").unwrap().value().is_null());

    let reencoded = encode_message(&message);
    assert_eq!(decode_message(&reencoded).unwrap(), message);
}

/// Test a request envelope round trip.
#[test]
fn test_message_round_trip() {
    let target = ObjectPath::new(name("TST_Person")).with_keys(vec![string_key("Name", "Mike")]);
    let call = IMethodCall {
        name: name("GetInstance"),
        namespace: NamespaceName::new("root/test").unwrap(),
        params: vec![
            IParamValue {
                name: "InstanceName".into(),
                value: IValue::InstanceNames(vec![target]),
            },
            IParamValue {
                name: "PropertyList".into(),
                value: IValue::Value(
                    CimValue::array(CimType::String, vec![Scalar::String("Name".into())]).unwrap(),
                ),
            },
        ],
    };
    let message = Message::new("42", MessageBody::IMethodCall(call));

    let xml = encode_message(&message);
    let decoded = decode_message(&xml).unwrap();
    assert_eq!(decoded, message);
    assert_eq!(encode_message(&decoded), xml);

    let response = IMethodResponse {
        name: name("GetInstance"),
        error: None,
        return_value: Some(IValue::Instances(vec![CimInstance::new(name("TST_Person"))])),
        params: Vec::new(),
    };
    let message = Message::new("42", MessageBody::IMethodResponse(response));
    assert_eq!(decode_message(&encode_message(&message)).unwrap(), message);
}

/// Test a schema declaration decodes, loads and round-trips.
#[test]
fn test_declaration_round_trip() {
    let declaration = decode_declaration(SCHEMA).unwrap();
    assert_eq!(declaration.groups.len(), 1);
    let group = &declaration.groups[0];
    assert_eq!(group.kind, DeclGroupKind::Plain);
    assert_eq!(group.namespace.as_str(), "root/test");
    assert_eq!(declaration.qualifier_decls().count(), 3);
    assert_eq!(declaration.classes().count(), 3);

    let description = declaration
        .classes()
        .next()
        .unwrap()
        .qualifiers()
        .get_by_name("Description")
        .unwrap();
    assert_eq!(
        description.value(),
        &CimValue::from("Root of the test hierarchy & friends")
    );

    let xml = encode_declaration(&declaration);
    assert_eq!(decode_declaration(&xml).unwrap(), declaration);

    let mut schema = Schema::new();
    for decl in declaration.qualifier_decls() {
        schema.add_qualifier_decl(decl.clone()).unwrap();
    }
    for class in declaration.classes() {
        schema.add_class(class.clone()).unwrap();
    }
    let person = schema.class("tst_person").unwrap();
    assert_eq!(person.properties().len(), 4);
    assert!(person.property_by_name("Caption").unwrap().propagated());
    assert_eq!(person.key_names(), vec![name("Name")]);
    assert!(schema.class("TST_Lineage").unwrap().is_association());
}

/// Test class round trips, with and without qualifiers.
#[test]
fn test_class_round_trip() {
    let declaration = decode_declaration(SCHEMA).unwrap();
    let mut schema = Schema::new();
    for class in declaration.classes() {
        schema.add_class(class.clone()).unwrap();
    }

    for class in schema.classes() {
        let xml = encode_class(class);
        assert_eq!(&decode_class(&xml).unwrap(), class, "{xml}");
    }

    let person = schema.class("TST_Person").unwrap();
    let bare = encode_class_with(person, &WriteOptions::default().with_qualifiers(false));
    assert!(!bare.contains("<QUALIFIER"));
    let decoded = decode_class(&bare).unwrap();
    assert!(!decoded.has_keys());
    assert_eq!(decoded.properties().len(), person.properties().len());
}

/// Test building an instance and its path from a class.
#[test]
fn test_build_instance_and_path() {
    let mut class = CimClass::new(name("TST_Person"), CimName::null());
    class
        .add_property(
            CimProperty::new(name("Name"), CimValue::null(CimType::String, false))
                .with_qualifier(Qualifier::new(name("Key"), CimValue::from(true)))
                .unwrap(),
        )
        .unwrap();
    class
        .add_property(CimProperty::new(name("Age"), CimValue::from(7u8)))
        .unwrap();
    class.resolve(None).unwrap();

    let options = WriteOptions::default().with_property_list(vec![name("Name"), name("Missing")]);
    let mut instance = class.build_instance(&options);
    assert_eq!(instance.properties().len(), 1);
    assert!(instance.build_path(&class).is_err());

    let index = instance.find_property("Name").unwrap();
    instance
        .property_mut(index)
        .unwrap()
        .set_value(CimValue::from("Mike"))
        .unwrap();
    let path = instance.build_path(&class).unwrap();
    assert_eq!(path.to_string(), "TST_Person.Name=\"Mike\"");

    let decoded = decode_instance(&encode_instance(&instance)).unwrap();
    assert_eq!(decoded.property_by_name("Name"), instance.property_by_name("Name"));
}
