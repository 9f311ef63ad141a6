//! Entity descriptions and the built-in declaration generator.
//!
//! An [`EntitySpec`] is the minimal JSON-ingestable description the binary
//! runs on: name, dotted namespace, parent entities, and attributes. The
//! built-in generator turns one spec into a fresh [`SourceUnit`]; richer
//! domain generators plug in behind the batch layer's source trait instead.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::ForgeError;
use crate::model::{
    Callable, Declaration, DocBlock, Parameter, Record, SourceUnit, SupertypeRef,
};
use crate::schedule::{Reference, ScheduleNode};

// ---------------------------------------------------------------------------
// EntitySpec
// ---------------------------------------------------------------------------

/// One entity of the declarative model, as read from the entity list file.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EntitySpec {
    /// Declaration name, e.g. `Customer`.
    pub name: String,

    /// Dotted namespace, e.g. `crm.model`. Empty means the root namespace.
    #[serde(default)]
    pub namespace: String,

    /// Parent entity names. The first is the primary parent.
    #[serde(default)]
    pub parents: Vec<String>,

    /// Attribute descriptions, in declaration order.
    #[serde(default)]
    pub attributes: Vec<AttributeSpec>,

    /// One-line documentation summary.
    #[serde(default)]
    pub doc: Option<String>,
}

/// One attribute of an entity.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AttributeSpec {
    pub name: String,

    #[serde(default = "default_attribute_type")]
    pub ty: String,

    #[serde(default)]
    pub mutable: bool,

    #[serde(default)]
    pub doc: Option<String>,
}

fn default_attribute_type() -> String {
    "String".to_owned()
}

impl EntitySpec {
    /// Fully qualified name: `namespace.Name`, or just the name at the root.
    #[must_use]
    pub fn qualified_name(&self) -> String {
        if self.namespace.is_empty() {
            self.name.clone()
        } else {
            format!("{}.{}", self.namespace, self.name)
        }
    }

    /// Output path relative to a source root: namespace segments as
    /// directories, then `<Name>.<ext>`.
    #[must_use]
    pub fn relative_path(&self, extension: &str) -> PathBuf {
        let mut path: PathBuf = self.namespace.split('.').filter(|s| !s.is_empty()).collect();
        path.push(format!("{}.{extension}", self.name));
        path
    }

    /// Reject descriptions the generator cannot work with.
    ///
    /// # Errors
    /// Returns [`ForgeError::InvalidEntity`] for an empty name, an entity
    /// listing itself as a parent, or duplicate attribute names.
    pub fn validate(&self) -> Result<(), ForgeError> {
        if self.name.trim().is_empty() {
            return Err(ForgeError::InvalidEntity {
                name: self.name.clone(),
                reason: "entity name is empty".to_owned(),
            });
        }
        if self.parents.iter().any(|p| p == &self.name) {
            return Err(ForgeError::InvalidEntity {
                name: self.name.clone(),
                reason: "lists itself as a parent".to_owned(),
            });
        }
        for (i, attr) in self.attributes.iter().enumerate() {
            if self.attributes[..i].iter().any(|a| a.name == attr.name) {
                return Err(ForgeError::InvalidEntity {
                    name: self.name.clone(),
                    reason: format!("duplicate attribute '{}'", attr.name),
                });
            }
        }
        Ok(())
    }
}

impl ScheduleNode for EntitySpec {
    fn id(&self) -> &str {
        &self.name
    }

    fn parent_ids(&self) -> &[String] {
        &self.parents
    }
}

/// Load and validate an entity list from a JSON file.
///
/// # Errors
/// I/O failure, malformed JSON, or any invalid entity description.
pub fn load_entities(path: &Path) -> Result<Vec<EntitySpec>, ForgeError> {
    let text = std::fs::read_to_string(path).map_err(|e| ForgeError::io("read", path, e))?;
    let entities: Vec<EntitySpec> = serde_json::from_str(&text).map_err(|e| {
        ForgeError::Config {
            path: path.to_owned(),
            detail: format!("invalid entity list: {e}"),
        }
    })?;
    for entity in &entities {
        entity.validate()?;
    }
    Ok(entities)
}

// ---------------------------------------------------------------------------
// Built-in generator
// ---------------------------------------------------------------------------

/// Generate the declaration tree for one entity.
///
/// The entity becomes a record whose constructor parameters are its
/// attributes; parents become supertypes (the first one primary, passing no
/// constructor arguments), and resolved parent references from other
/// namespaces become imports.
#[must_use]
pub fn generate_unit(spec: &EntitySpec, resolved: &BTreeMap<String, Reference>) -> SourceUnit {
    let mut doc = DocBlock::default();
    if let Some(summary) = &spec.doc {
        doc.summary.push(summary.clone());
    }
    for attr in &spec.attributes {
        if let Some(text) = &attr.doc {
            doc.params.push((attr.name.clone(), text.clone()));
        }
    }

    let ctor_params = spec
        .attributes
        .iter()
        .map(|a| Parameter::new(&a.name, &a.ty))
        .collect();

    let supertypes = spec
        .parents
        .iter()
        .enumerate()
        .map(|(i, parent)| {
            if i == 0 {
                SupertypeRef::primary(parent, Vec::new())
            } else {
                SupertypeRef::plain(parent)
            }
        })
        .collect();

    let mut record = Record {
        name: spec.name.clone(),
        ctor_params,
        supertypes,
        doc,
        ..Record::default()
    };

    let mut describe = Callable::new("describe");
    describe.ret = Some("String".to_owned());
    describe.body = vec![format!("return \"{}(\" + {} + \")\"", spec.name, describe_args(spec))];
    record.body.callables.push(describe);

    let mut unit = SourceUnit::new(vec![Declaration::Record(record)]);
    for parent in &spec.parents {
        if let Some(reference) = resolved.get(parent) {
            if namespace_of(&reference.qualified_name) != spec.namespace {
                unit.imports.push(reference.qualified_name.clone());
            }
        }
    }
    unit
}

fn describe_args(spec: &EntitySpec) -> String {
    if spec.attributes.is_empty() {
        "\"\"".to_owned()
    } else {
        spec.attributes
            .iter()
            .map(|a| a.name.as_str())
            .collect::<Vec<_>>()
            .join(" + \", \" + ")
    }
}

fn namespace_of(qualified: &str) -> &str {
    qualified.rsplit_once('.').map_or("", |(ns, _)| ns)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
