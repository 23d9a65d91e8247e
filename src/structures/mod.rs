//! Named structure definitions and the index used to resolve references to
//! them.

mod resolver;

pub use resolver::{flatten_structure_fields, structure_fields_by_ref, ResolveContext, SchemaField};

use crate::types::normalize_struct_ref;
use ahash::AHashMap;
use serde::Deserialize;

/// A named, optionally generic record type usable as a variable's type.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructureDefinition {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
    #[serde(default)]
    pub type_parameters: Vec<TypeParameter>,
    #[serde(default)]
    pub is_generic: bool,
    #[serde(default)]
    pub flow_id: Option<String>,
}

impl StructureDefinition {
    /// The name shown to users; the raw id is the last resort.
    pub fn display_name(&self) -> &str {
        if !self.name.is_empty() {
            &self.name
        } else if let Some(full_name) = self.full_name.as_deref() {
            full_name
        } else {
            &self.id
        }
    }

    pub fn type_parameter_names(&self) -> impl Iterator<Item = &str> {
        self.type_parameters
            .iter()
            .map(|parameter| parameter.name.as_str())
            .filter(|name| !name.is_empty())
    }
}

/// One field of a structure definition.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldDefinition {
    #[serde(default)]
    pub name: String,
    #[serde(default, rename = "type")]
    pub field_type: String,
    /// Element type for `array`/`list` fields.
    #[serde(default)]
    pub item_type: Option<String>,
    /// Reference to another structure for `object` fields.
    #[serde(default)]
    pub ref_structure: Option<String>,
    /// Inline children, the fallback when no structure is referenced.
    #[serde(default)]
    pub children: Vec<FieldDefinition>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub description: Option<String>,
}

/// A type parameter of a generic structure (`T`, `K`, `V`).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TypeParameter {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
}

/// How a node configuration binds one generic parameter of a structure.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenericTypeArg {
    #[serde(default)]
    pub is_array: bool,
    #[serde(default)]
    pub element_type: Option<String>,
    #[serde(default)]
    pub collection_type: Option<String>,
    #[serde(default)]
    pub key_type: Option<String>,
    #[serde(default)]
    pub value_type: Option<String>,
}

/// Bindings for all parameters of one generic structure, keyed by parameter
/// name.
pub type GenericTypeArgs = AHashMap<String, GenericTypeArg>;

/// Lookup index over a snapshot of structure definitions.
///
/// Ids are preferred over full names, and full names over bare names, because
/// names are not guaranteed unique across project and flow scopes.
#[derive(Debug)]
pub struct StructureIndex<'a> {
    by_id: AHashMap<&'a str, &'a StructureDefinition>,
    by_full_name: AHashMap<&'a str, &'a StructureDefinition>,
    by_name: AHashMap<&'a str, &'a StructureDefinition>,
}

impl<'a> StructureIndex<'a> {
    pub fn new(structures: &'a [StructureDefinition]) -> Self {
        let mut by_id = AHashMap::new();
        let mut by_full_name = AHashMap::new();
        let mut by_name = AHashMap::new();
        for structure in structures {
            if !structure.id.is_empty() {
                by_id.entry(structure.id.as_str()).or_insert(structure);
            }
            if let Some(full_name) = structure.full_name.as_deref() {
                if !full_name.is_empty() {
                    by_full_name.entry(full_name).or_insert(structure);
                }
            }
            if !structure.name.is_empty() {
                by_name.entry(structure.name.as_str()).or_insert(structure);
            }
        }
        StructureIndex {
            by_id,
            by_full_name,
            by_name,
        }
    }

    /// Resolves a reference string to a structure definition. The reference
    /// may carry any number of redundant `struct:` prefixes; lookup order is
    /// id, then full name, then name. Returns `None` instead of failing.
    pub fn resolve(&self, reference: &str) -> Option<&'a StructureDefinition> {
        let reference = normalize_struct_ref(reference);
        if reference.is_empty() {
            return None;
        }
        self.by_id
            .get(reference)
            .or_else(|| self.by_full_name.get(reference))
            .or_else(|| self.by_name.get(reference))
            .copied()
    }

    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty() && self.by_name.is_empty() && self.by_full_name.is_empty()
    }
}
