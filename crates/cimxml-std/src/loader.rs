//! Loading declaration files into a [`Schema`].
//!
//! Each file is a `<CIM><DECLARATION>` document. Qualifier declarations
//! are added as they are read; classes are collected across all files and
//! added once their superclass is present, so files may come in any order.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use cimxml_core::error::{DecodeError, ModelError};
use cimxml_core::{decode_declaration, CimClass, Schema};

/// Schema loading error.
#[derive(Debug, thiserror::Error)]
pub enum LoaderError {
    /// A file or directory could not be read.
    #[error("{}: {source}", .path.display())]
    Io {
        /// The path being read.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: io::Error,
    },
    /// A file is not a valid declaration document.
    #[error("{}: {source}", .path.display())]
    Decode {
        /// The file being decoded.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: DecodeError,
    },
    /// A declaration could not be added to the schema.
    #[error("{}: {source}", .path.display())]
    Schema {
        /// The file the declaration came from.
        path: PathBuf,
        /// Underlying error.
        #[source]
        source: ModelError,
    },
    /// A class names a superclass no file declares.
    #[error("{}: class {class} has unknown superclass {superclass}", .path.display())]
    MissingSuperclass {
        /// The file the class came from.
        path: PathBuf,
        /// The class.
        class: String,
        /// The missing superclass.
        superclass: String,
    },
}

/// List the `*.xml` files directly inside `dir`, sorted by path.
///
/// # Errors
///
/// Returns [`LoaderError::Io`] if the directory cannot be read.
pub fn schema_files<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>, LoaderError> {
    let dir = dir.as_ref();
    let io_error = |source| LoaderError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).map_err(io_error)? {
        let path = entry.map_err(io_error)?.path();
        let is_xml = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("xml"));
        if is_xml && path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Read every file into memory.
///
/// # Errors
///
/// Returns [`LoaderError::Io`] for the first file that cannot be read.
pub fn read_sources<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<(PathBuf, String)>, LoaderError> {
    paths
        .iter()
        .map(|p| {
            let path = p.as_ref().to_path_buf();
            match fs::read_to_string(&path) {
                Ok(content) => Ok((path, content)),
                Err(source) => Err(LoaderError::Io { path, source }),
            }
        })
        .collect()
}

/// Load the given declaration files.
///
/// # Errors
///
/// Returns the first read, decode or schema error, tagged with its file.
pub fn load_schema_files<P: AsRef<Path>>(paths: &[P]) -> Result<Schema, LoaderError> {
    let sources = read_sources(paths)?;
    load_schema_sources(&sources)
}

/// Load every `*.xml` declaration file in `dir`.
///
/// # Errors
///
/// See [`load_schema_files`].
pub fn load_schema_dir<P: AsRef<Path>>(dir: P) -> Result<Schema, LoaderError> {
    let files = schema_files(dir)?;
    load_schema_files(&files)
}

/// Load declaration documents already in memory, named by their paths.
///
/// # Errors
///
/// See [`load_schema_files`].
pub fn load_schema_sources(sources: &[(PathBuf, String)]) -> Result<Schema, LoaderError> {
    let mut schema = Schema::new();
    let mut pending: Vec<(&Path, CimClass)> = Vec::new();

    for (path, content) in sources {
        let declaration = decode_declaration(content).map_err(|source| LoaderError::Decode {
            path: path.clone(),
            source,
        })?;
        for decl in declaration.qualifier_decls() {
            schema
                .add_qualifier_decl(decl.clone())
                .map_err(|source| LoaderError::Schema {
                    path: path.clone(),
                    source,
                })?;
        }
        let before = pending.len();
        pending.extend(declaration.classes().map(|c| (path.as_path(), c.clone())));

        tracing::debug!(
            path = %path.display(),
            classes = pending.len() - before,
            instances = declaration.instances().count(),
            "loader: file decoded"
        );
    }

    add_in_dependency_order(&mut schema, pending)?;

    tracing::info!(
        files = sources.len(),
        classes = schema.class_count(),
        qualifiers = schema.qualifier_decls().len(),
        "loader: schema loaded"
    );
    Ok(schema)
}

/// Add classes whose superclass is present until none are left. A pass
/// that adds nothing means some superclass is missing.
fn add_in_dependency_order(
    schema: &mut Schema,
    mut pending: Vec<(&Path, CimClass)>,
) -> Result<(), LoaderError> {
    while !pending.is_empty() {
        let mut deferred = Vec::new();
        let count = pending.len();

        for (path, class) in pending {
            let ready = class.superclass().is_null()
                || schema.class(class.superclass().as_str()).is_some();
            if !ready {
                deferred.push((path, class));
                continue;
            }
            schema.add_class(class).map_err(|source| LoaderError::Schema {
                path: path.to_path_buf(),
                source,
            })?;
        }

        if deferred.len() == count {
            let (path, class) = &deferred[0];
            return Err(LoaderError::MissingSuperclass {
                path: path.to_path_buf(),
                class: class.class_name().to_string(),
                superclass: class.superclass().to_string(),
            });
        }
        pending = deferred;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn document(body: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="utf-8" ?>
<CIM CIMVERSION="2.0" DTDVERSION="2.0"><DECLARATION><DECLGROUP>{body}</DECLGROUP></DECLARATION></CIM>"#
        )
    }

    fn class(name: &str, superclass: Option<&str>) -> String {
        let superclass = superclass.map_or(String::new(), |s| format!(" SUPERCLASS=\"{s}\""));
        format!(
            r#"<VALUE.OBJECT><CLASS NAME="{name}"{superclass}><PROPERTY NAME="{name}Prop" TYPE="string"/></CLASS></VALUE.OBJECT>"#
        )
    }

    fn source(path: &str, body: &str) -> (PathBuf, String) {
        (PathBuf::from(path), document(body))
    }

    #[test]
    fn test_superclass_in_later_file() {
        let sources = vec![
            source("b.xml", &class("TST_Child", Some("TST_Base"))),
            source("a.xml", &class("TST_Base", None)),
        ];
        let schema = load_schema_sources(&sources).unwrap();
        assert_eq!(schema.class_count(), 2);

        let child = schema.class("TST_Child").unwrap();
        assert_eq!(child.properties().len(), 2);
        assert!(child.property_by_name("TST_BaseProp").unwrap().propagated());
    }

    #[test]
    fn test_missing_superclass() {
        let sources = vec![source("x.xml", &class("TST_Orphan", Some("TST_Nowhere")))];
        let err = load_schema_sources(&sources).unwrap_err();
        assert!(matches!(
            &err,
            LoaderError::MissingSuperclass { class, superclass, .. }
                if class == "TST_Orphan" && superclass == "TST_Nowhere"
        ));
        assert!(err.to_string().starts_with("x.xml: "));
    }

    #[test]
    fn test_decode_error_names_file() {
        let sources = vec![(PathBuf::from("broken.xml"), "<CIM>".to_string())];
        let err = load_schema_sources(&sources).unwrap_err();
        assert!(matches!(&err, LoaderError::Decode { path, .. } if path == Path::new("broken.xml")));
    }

    #[test]
    fn test_duplicate_class_across_files() {
        let sources = vec![
            source("a.xml", &class("TST_Base", None)),
            source("b.xml", &class("TST_BASE", None)),
        ];
        let err = load_schema_sources(&sources).unwrap_err();
        assert!(matches!(&err, LoaderError::Schema { path, .. } if path == Path::new("b.xml")));
    }

    #[test]
    fn test_qualifier_decls_loaded() {
        let body = format!(
            r#"<QUALIFIER.DECLARATION NAME="Key" TYPE="boolean"><SCOPE PROPERTY="true"/><VALUE>FALSE</VALUE></QUALIFIER.DECLARATION>{}"#,
            class("TST_Base", None)
        );
        let schema = load_schema_sources(&[source("q.xml", &body)]).unwrap();
        assert!(schema.qualifier_decl("key").is_some());
        assert!(schema.class("tst_base").is_some());
    }
}
