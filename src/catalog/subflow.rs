//! Output variables of subflow nodes, inferred from the referenced reusable
//! flow's End node.
//!
//! Everything here fails soft: a missing subflow, unparseable graph data or
//! an absent End node yields no dynamic outputs, never an error. The meta
//! outputs (`_status`, `_executionId`) are always present.

use super::builder::nested_structure_variables;
use super::outputs::standard_outputs;
use super::{BuildOptions, CatalogBuilder, Variable};
use crate::flow::{FlowGraph, Node, NodeKind, OutputVariableConfig, SubflowConfig};
use crate::template::expression_key;
use crate::types::TypeRef;
use ahash::AHashMap;
use indexmap::IndexMap;

/// All output variables of a subflow node: the referenced flow's End-node
/// outputs (with generic parameters bound from the input mappings), each
/// expanded into its nested structure fields, followed by the meta outputs.
pub(super) fn subflow_output_variables(
    builder: &CatalogBuilder<'_>,
    node: &Node,
    config: &SubflowConfig,
) -> Vec<Variable> {
    let mut variables = dynamic_output_variables(builder, node, config);

    for spec in standard_outputs(&node.kind) {
        variables.push(Variable {
            key: format!("nodes.{}.{}", node.id, spec.name),
            name: spec.name.to_string(),
            label: spec.label.to_string(),
            ty: TypeRef::Primitive(spec.scalar),
            description: Some(spec.description.to_string()),
            group: node.display_label().to_string(),
            source_node_id: Some(node.id.clone()),
        });
    }

    variables
}

fn dynamic_output_variables(
    builder: &CatalogBuilder<'_>,
    node: &Node,
    config: &SubflowConfig,
) -> Vec<Variable> {
    let Some(subflow_id) = config.subflow_id.as_deref().filter(|id| !id.is_empty()) else {
        return Vec::new();
    };
    let Some(subflow) = builder
        .subflows
        .iter()
        .find(|subflow| subflow.id == subflow_id)
    else {
        tracing::warn!(subflow_id, node_id = %node.id, "subflow reference did not resolve");
        return Vec::new();
    };
    let Some(graph_data) = subflow.graph_data.as_deref() else {
        return Vec::new();
    };
    let subflow_graph = match FlowGraph::from_json(graph_data) {
        Ok(graph) => graph,
        Err(error) => {
            tracing::warn!(subflow_id, %error, "subflow graph data is unparseable");
            return Vec::new();
        }
    };

    // All End nodes contribute; the first declaration of a name wins.
    let mut outputs: IndexMap<&str, &OutputVariableConfig> = IndexMap::new();
    for end_node in &subflow_graph.nodes {
        if let NodeKind::End(end_config) = &end_node.kind {
            for output in &end_config.output_variables {
                if output.name.is_empty() {
                    continue;
                }
                outputs.entry(output.name.as_str()).or_insert(output);
            }
        }
    }
    if outputs.is_empty() {
        return Vec::new();
    }

    let bindings = generic_bindings(builder, node, config, &subflow_graph);

    outputs
        .into_values()
        .flat_map(|output| {
            let ty = TypeRef::from_parts(
                output.value_type.as_deref().or(Some("object")),
                output.type_ref.as_deref(),
                output.item_type_ref.as_deref(),
                builder.index(),
            )
            .substitute(&bindings);

            let base = Variable {
                key: format!("nodes.{}.{}", node.id, output.name),
                name: output.name.clone(),
                label: if output.label.is_empty() {
                    output.name.clone()
                } else {
                    output.label.clone()
                },
                ty,
                description: output.description.clone().or_else(|| {
                    output
                        .expression
                        .as_ref()
                        .map(|expression| format!("From: {expression}"))
                }),
                group: node.display_label().to_string(),
                source_node_id: Some(node.id.clone()),
            };
            let nested = nested_structure_variables(&base, builder.index());
            std::iter::once(base).chain(nested)
        })
        .collect()
}

/// Infers concrete bindings for the subflow's generic input parameters by
/// tracing each input mapping's source expression back to a variable in the
/// parent scope. The parent catalog is built with subflow expansion skipped
/// so that sibling subflows cannot recurse into each other.
fn generic_bindings(
    builder: &CatalogBuilder<'_>,
    node: &Node,
    config: &SubflowConfig,
    subflow_graph: &FlowGraph,
) -> AHashMap<String, TypeRef> {
    let mut bindings = AHashMap::new();
    if config.input_mappings.is_empty() {
        return bindings;
    }

    let subflow_inputs = match subflow_graph.start_node().map(|start| &start.kind) {
        Some(NodeKind::Start(start_config)) => start_config.variables.as_slice(),
        _ => &[],
    };

    let parent_scope = builder.build_with(
        &node.id,
        BuildOptions {
            skip_subflow: true,
        },
    );

    for mapping in &config.input_mappings {
        let target = mapping.target_variable.trim();
        if target.is_empty() {
            continue;
        }
        let Some(input) = subflow_inputs.iter().find(|input| input.name == target) else {
            continue;
        };
        let Some(reference) = input.structure_ref.as_deref() else {
            continue;
        };
        let params = generic_param_names(reference, builder);
        // Only single-parameter structures can be bound from one source.
        if params.len() != 1 {
            continue;
        }
        let Some(source_key) = mapping
            .source_expression
            .as_deref()
            .and_then(expression_key)
        else {
            continue;
        };
        let Some(source) = parent_scope.find_by_key(&source_key) else {
            continue;
        };
        let binding = source
            .ty
            .element()
            .cloned()
            .unwrap_or_else(|| source.ty.clone());
        bindings.insert(params[0].clone(), binding);
    }

    bindings
}

/// The generic parameter names of the structure behind `reference`. The
/// built-in collection structures have well-known parameters.
fn generic_param_names(reference: &str, builder: &CatalogBuilder<'_>) -> Vec<String> {
    let lower = reference.to_ascii_lowercase();
    if lower.contains("list") || lower.contains("set") {
        return vec!["T".to_string()];
    }
    if lower.contains("map") {
        return vec!["K".to_string(), "V".to_string()];
    }
    let Some(structure) = builder.index().resolve(reference) else {
        return Vec::new();
    };
    if !structure.is_generic {
        return Vec::new();
    }
    structure
        .type_parameter_names()
        .map(str::to_string)
        .collect()
}
