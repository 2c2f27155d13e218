//! Loading declaration directories through the schema cache.

use std::fs;
use std::path::Path;

use cimxml_std::cache::{get_fingerprint, is_cache_valid, load_cache, load_schema_cached};
use cimxml_std::{load_schema_dir, LoaderError};

fn declaration(body: &str) -> String {
    format!(
        "<?xml version=\"1.0\" encoding=\"utf-8\" ?>\n\
         <CIM CIMVERSION=\"2.0\" DTDVERSION=\"2.0\">\n\
         <DECLARATION>\n<DECLGROUP>\n{body}\n</DECLGROUP>\n</DECLARATION>\n</CIM>\n"
    )
}

const BASE: &str = r#"<QUALIFIER.DECLARATION NAME="Key" TYPE="boolean" OVERRIDABLE="false">
<SCOPE PROPERTY="true"/>
<VALUE>FALSE</VALUE>
</QUALIFIER.DECLARATION>
<VALUE.OBJECT>
<CLASS NAME="TST_ManagedElement">
<PROPERTY NAME="InstanceID" TYPE="string">
<QUALIFIER NAME="Key" TYPE="boolean" OVERRIDABLE="false"><VALUE>TRUE</VALUE></QUALIFIER>
</PROPERTY>
</CLASS>
</VALUE.OBJECT>"#;

const DISK: &str = r#"<VALUE.OBJECT>
<CLASS NAME="TST_Disk" SUPERCLASS="TST_ManagedElement">
<PROPERTY NAME="Capacity" TYPE="uint64"><VALUE>0</VALUE></PROPERTY>
</CLASS>
</VALUE.OBJECT>"#;

fn write_schema(dir: &Path) {
    // "a" sorts before "b", so the subclass file is read first.
    fs::write(dir.join("a_disk.xml"), declaration(DISK)).unwrap();
    fs::write(dir.join("b_base.xml"), declaration(BASE)).unwrap();
    fs::write(dir.join("notes.txt"), "not a declaration").unwrap();
}

#[test]
fn test_load_schema_dir() {
    let dir = tempfile::tempdir().unwrap();
    write_schema(dir.path());

    let schema = load_schema_dir(dir.path()).unwrap();
    assert_eq!(schema.class_count(), 2);
    assert!(schema.qualifier_decl("Key").is_some());

    let disk = schema.class("TST_Disk").unwrap();
    assert_eq!(disk.key_names().len(), 1);
    let chain: Vec<_> = schema
        .superclass_chain("TST_Disk")
        .iter()
        .map(|c| c.class_name().to_string())
        .collect();
    assert_eq!(chain, ["TST_ManagedElement"]);
}

#[test]
fn test_load_schema_dir_reports_file() {
    let dir = tempfile::tempdir().unwrap();
    write_schema(dir.path());
    fs::write(dir.path().join("c_bad.xml"), declaration("<VALUE.OBJECT><CLASS/></VALUE.OBJECT>")).unwrap();

    let err = load_schema_dir(dir.path()).unwrap_err();
    let LoaderError::Decode { path, .. } = &err else {
        panic!("expected decode error, got {err}");
    };
    assert!(path.ends_with("c_bad.xml"));
    assert!(err.to_string().contains("c_bad.xml"));
}

#[test]
fn test_load_schema_cached() {
    let dir = tempfile::tempdir().unwrap();
    write_schema(dir.path());
    let cache_dir = tempfile::tempdir().unwrap();
    let cache_path = cache_dir.path().join("schema.cimx");

    let first = load_schema_cached(dir.path(), &cache_path).unwrap();
    assert!(cache_path.exists());
    let fingerprint = get_fingerprint(&fs::read(&cache_path).unwrap())
        .unwrap()
        .unwrap();
    assert!(is_cache_valid(&cache_path, &fingerprint));
    assert_eq!(load_cache(&cache_path).unwrap(), first);

    let second = load_schema_cached(dir.path(), &cache_path).unwrap();
    assert_eq!(second, first);

    // Changing a file invalidates the cache and the rebuild sees the change.
    let extra = format!(
        "{DISK}\n<VALUE.OBJECT><CLASS NAME=\"TST_Tape\" SUPERCLASS=\"TST_ManagedElement\"/></VALUE.OBJECT>"
    );
    fs::write(dir.path().join("a_disk.xml"), declaration(&extra)).unwrap();

    let third = load_schema_cached(dir.path(), &cache_path).unwrap();
    assert_eq!(third.class_count(), 3);
    assert_eq!(load_cache(&cache_path).unwrap(), third);
    assert!(!is_cache_valid(&cache_path, &fingerprint));
}
