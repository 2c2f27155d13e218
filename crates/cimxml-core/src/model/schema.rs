//! An in-memory store of qualifier declarations and resolved classes.

use std::collections::BTreeMap;

use super::class::CimClass;
use super::name::CimName;
use super::qualifier::QualifierDecl;
use crate::error::ModelError;

/// Classes and qualifier declarations of one namespace.
///
/// Classes are resolved against their superclass as they are added, so a
/// superclass must be added before its subclasses.
#[derive(Clone, Debug, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Schema {
    qualifier_decls: Vec<QualifierDecl>,
    classes: Vec<CimClass>,
    class_index: BTreeMap<CimName, usize>,
}

impl Schema {
    /// Create an empty schema.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a qualifier declaration.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::AlreadyExists`] if the name is taken.
    pub fn add_qualifier_decl(&mut self, decl: QualifierDecl) -> Result<(), ModelError> {
        if self.qualifier_decl(decl.name().as_str()).is_some() {
            return Err(ModelError::AlreadyExists {
                kind: "qualifier declaration",
                name: decl.name().to_string(),
            });
        }
        self.qualifier_decls.push(decl);
        Ok(())
    }

    /// Resolve a class against its superclass and add it.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::AlreadyExists`] for a duplicate class name,
    /// [`ModelError::NoSuchClass`] if the superclass is not present, or any
    /// error from [`CimClass::resolve`].
    pub fn add_class(&mut self, mut class: CimClass) -> Result<(), ModelError> {
        if self.class_index.contains_key(class.class_name()) {
            return Err(ModelError::AlreadyExists {
                kind: "class",
                name: class.class_name().to_string(),
            });
        }
        let superclass = if class.superclass().is_null() {
            None
        } else {
            Some(
                self.class(class.superclass().as_str())
                    .ok_or_else(|| ModelError::NoSuchClass(class.superclass().to_string()))?,
            )
        };
        class.resolve(superclass)?;

        #[cfg(feature = "tracing")]
        tracing::trace!(class = %class.class_name(), "schema: class added");

        self.class_index
            .insert(class.class_name().clone(), self.classes.len());
        self.classes.push(class);
        Ok(())
    }

    /// Look up a class by name.
    #[must_use]
    pub fn class(&self, name: &str) -> Option<&CimClass> {
        let key = CimName::new(name).ok()?;
        self.class_index.get(&key).map(|&i| &self.classes[i])
    }

    /// Look up a qualifier declaration by name.
    #[must_use]
    pub fn qualifier_decl(&self, name: &str) -> Option<&QualifierDecl> {
        self.qualifier_decls.iter().find(|d| d.name().eq_str(name))
    }

    /// Superclasses of `name`, nearest first. Empty for a root or unknown
    /// class.
    #[must_use]
    pub fn superclass_chain(&self, name: &str) -> Vec<&CimClass> {
        let mut chain = Vec::new();
        let mut current = self.class(name);
        while let Some(class) = current {
            if class.superclass().is_null() {
                break;
            }
            current = self.class(class.superclass().as_str());
            if let Some(parent) = current {
                chain.push(parent);
            }
        }
        chain
    }

    /// Names of classes derived from `name`, in insertion order.
    ///
    /// With `deep`, indirect subclasses are included.
    #[must_use]
    pub fn subclass_names(&self, name: &str, deep: bool) -> Vec<CimName> {
        let mut out: Vec<CimName> = Vec::new();
        for class in &self.classes {
            let parent = class.superclass();
            if parent.is_null() {
                continue;
            }
            // Parents are inserted before children, so one pass is enough.
            if parent.eq_str(name) || (deep && out.contains(parent)) {
                out.push(class.class_name().clone());
            }
        }
        out
    }

    /// All classes in insertion order.
    #[must_use]
    pub fn classes(&self) -> &[CimClass] {
        &self.classes
    }

    /// All qualifier declarations in insertion order.
    #[must_use]
    pub fn qualifier_decls(&self) -> &[QualifierDecl] {
        &self.qualifier_decls
    }

    /// Number of classes.
    #[must_use]
    pub fn class_count(&self) -> usize {
        self.classes.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CimProperty, CimType, CimValue, Flavor, Scope};

    fn name(s: &str) -> CimName {
        CimName::new(s).unwrap()
    }

    fn class(n: &str, parent: &str) -> CimClass {
        let parent = if parent.is_empty() {
            CimName::null()
        } else {
            name(parent)
        };
        let mut c = CimClass::new(name(n), parent);
        c.add_property(CimProperty::new(
            name(&format!("{n}Prop")),
            CimValue::null(CimType::String, false),
        ))
        .unwrap();
        c
    }

    fn sample() -> Schema {
        let mut s = Schema::new();
        s.add_class(class("A", "")).unwrap();
        s.add_class(class("B", "A")).unwrap();
        s.add_class(class("C", "B")).unwrap();
        s.add_class(class("D", "A")).unwrap();
        s
    }

    #[test]
    fn test_add_resolves() {
        let s = sample();
        let c = s.class("c").unwrap();
        assert_eq!(c.properties().len(), 3);
        assert!(c.property_by_name("AProp").unwrap().propagated());
    }

    #[test]
    fn test_add_errors() {
        let mut s = sample();
        assert_eq!(
            s.add_class(class("E", "Missing")),
            Err(ModelError::NoSuchClass("Missing".into()))
        );
        assert!(matches!(
            s.add_class(class("b", "A")),
            Err(ModelError::AlreadyExists { kind: "class", .. })
        ));
    }

    #[test]
    fn test_hierarchy_queries() {
        let s = sample();
        let chain: Vec<_> = s
            .superclass_chain("C")
            .iter()
            .map(|c| c.class_name().as_str())
            .collect();
        assert_eq!(chain, vec!["B", "A"]);
        assert_eq!(s.subclass_names("A", false), vec![name("B"), name("D")]);
        assert_eq!(
            s.subclass_names("A", true),
            vec![name("B"), name("C"), name("D")]
        );
        assert!(s.superclass_chain("A").is_empty());
    }

    #[test]
    fn test_qualifier_decls() {
        let mut s = Schema::new();
        let decl = QualifierDecl::new(
            name("Key"),
            CimValue::from(false),
            Scope::PROPERTY | Scope::REFERENCE,
            Flavor::DISABLEOVERRIDE | Flavor::TOSUBCLASS,
        );
        s.add_qualifier_decl(decl.clone()).unwrap();
        assert!(s.add_qualifier_decl(decl).is_err());
        assert_eq!(s.qualifier_decl("KEY").map(QualifierDecl::cim_type), Some(CimType::Boolean));
    }
}
