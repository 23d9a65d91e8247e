//! The variable catalog: for any node, the complete set of variables visible
//! to it, grouped by origin.
//!
//! A catalog is a pure derivation of the input snapshots. Nothing is cached
//! across builds; identical inputs always produce an identical catalog, so
//! callers are free to memoize by input identity.

mod builder;
mod outputs;
mod subflow;

pub use outputs::{node_output_fields, node_output_schema_fields, OutputField};

use crate::flow::{ConstantDefinition, EnumDefinition, FlowGraph, NodeKind, SubflowDefinition};
use crate::structures::{StructureDefinition, StructureIndex};
use crate::types::{normalize_struct_ref, TypeRef};
use indexmap::{IndexMap, IndexSet};
use std::fmt;

/// One selectable variable.
#[derive(Debug, Clone, PartialEq)]
pub struct Variable {
    /// Unique key within the catalog, e.g. `nodes.api-1.body` or `var.total`.
    pub key: String,
    pub name: String,
    pub label: String,
    pub ty: TypeRef,
    pub description: Option<String>,
    /// Display origin, e.g. the producing node's label.
    pub group: String,
    pub source_node_id: Option<String>,
}

impl Variable {
    /// The user-facing type label (`array` always renders as `List`).
    pub fn type_label(&self, index: &StructureIndex<'_>) -> String {
        self.ty.label(index)
    }

    /// The coarse base type, as selector widgets filter on.
    pub fn base_type(&self) -> &'static str {
        self.ty.base_type()
    }
}

/// All variables one origin contributes.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableGroup {
    pub name: String,
    pub variables: Vec<Variable>,
}

/// A user-visible validation warning. Warnings never fail a build; the
/// catalog is still produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CatalogWarning {
    /// The same variable name is assigned more than once. Legal (overwrite
    /// semantics at runtime) but likely a mistake; the first assignment
    /// defines the type.
    DuplicateAssignment { name: String, node_id: String },
}

impl fmt::Display for CatalogWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CatalogWarning::DuplicateAssignment { name, node_id } => write!(
                f,
                "variable '{name}' is assigned more than once (node '{node_id}'); \
                 the first assignment defines its type"
            ),
        }
    }
}

/// The computed catalog for one target node.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    pub groups: Vec<VariableGroup>,
    pub warnings: Vec<CatalogWarning>,
}

impl Catalog {
    pub fn variables(&self) -> impl Iterator<Item = &Variable> {
        self.groups.iter().flat_map(|group| group.variables.iter())
    }

    /// Looks a variable up by its full key. Keys are unique per origin; on a
    /// collision the earliest group wins.
    pub fn find_by_key(&self, key: &str) -> Option<&Variable> {
        self.variables().find(|variable| variable.key == key)
    }

    /// Flattens all groups into a name-keyed map. Groups are visited in
    /// build order, which lists ancestor output groups nearest-first, and
    /// the first occurrence of a bare name wins: the nearest producer of a
    /// name takes precedence over farther ones.
    pub fn variables_by_name(&self) -> IndexMap<&str, &Variable> {
        let mut by_name = IndexMap::new();
        for variable in self.variables() {
            by_name.entry(variable.name.as_str()).or_insert(variable);
        }
        by_name
    }

    pub fn group(&self, name: &str) -> Option<&VariableGroup> {
        self.groups.iter().find(|group| group.name == name)
    }
}

/// Options for one catalog build.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuildOptions {
    /// Skip subflow output expansion. Used when a subflow resolves its own
    /// parent scope, where recursing into sibling subflows could loop.
    pub skip_subflow: bool,
}

/// Builds catalogs over one set of input snapshots. All inputs are borrowed
/// read-only; the builder owns nothing but its lookup index.
pub struct CatalogBuilder<'a> {
    graph: &'a FlowGraph,
    index: StructureIndex<'a>,
    constants: &'a [ConstantDefinition],
    enums: &'a [EnumDefinition],
    subflows: &'a [SubflowDefinition],
}

impl<'a> CatalogBuilder<'a> {
    pub fn new(
        graph: &'a FlowGraph,
        structures: &'a [StructureDefinition],
        constants: &'a [ConstantDefinition],
        enums: &'a [EnumDefinition],
        subflows: &'a [SubflowDefinition],
    ) -> Self {
        CatalogBuilder {
            graph,
            index: StructureIndex::new(structures),
            constants,
            enums,
            subflows,
        }
    }

    pub fn graph(&self) -> &'a FlowGraph {
        self.graph
    }

    pub fn index(&self) -> &StructureIndex<'a> {
        &self.index
    }

    /// Computes the catalog for `target_node_id`.
    pub fn build(&self, target_node_id: &str) -> Catalog {
        self.build_with(target_node_id, BuildOptions::default())
    }
}

/// Type parameter names available for output-type selection: the parameters
/// of every generic structure referenced by a Start input, in first-seen
/// order.
pub fn available_generic_params(
    graph: &FlowGraph,
    structures: &[StructureDefinition],
) -> Vec<String> {
    let index = StructureIndex::new(structures);
    let Some(start) = graph.start_node() else {
        return Vec::new();
    };
    let NodeKind::Start(config) = &start.kind else {
        return Vec::new();
    };

    let mut params = IndexSet::new();
    for input in &config.variables {
        if input.input_type != "structure" {
            continue;
        }
        let Some(reference) = input.structure_ref.as_deref() else {
            continue;
        };
        let Some(structure) = index.resolve(normalize_struct_ref(reference)) else {
            continue;
        };
        if !structure.is_generic {
            continue;
        }
        for name in structure.type_parameter_names() {
            params.insert(name.to_string());
        }
    }
    params.into_iter().collect()
}
