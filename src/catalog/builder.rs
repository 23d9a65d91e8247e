//! Catalog assembly: one group per variable origin, in a fixed, documented
//! order.
//!
//! Group order doubles as name precedence (see
//! [`Catalog::variables_by_name`]): user inputs, execution context,
//! constants, enums, alias groups, flow variables, then one group per
//! ancestor node nearest-first, and finally the target node's own iteration
//! or local-assignment variables.

use super::outputs::{
    apply_generic_output_ref, code_custom_outputs, flatten_json_parser_fields, node_output_fields,
    node_output_schema_fields, schema_root,
};
use super::subflow::subflow_output_variables;
use super::{BuildOptions, Catalog, CatalogBuilder, CatalogWarning, Variable, VariableGroup};
use crate::flow::{InputVariable, Node, NodeKind};
use crate::graph;
use crate::structures::{structure_fields_by_ref, StructureIndex};
use crate::template::expression_key;
use crate::transform::assignment_result_type;
use crate::types::{CollectionKind, ScalarType, TypeRef};
use ahash::AHashSet;
use indexmap::IndexMap;
use itertools::Itertools;

const USER_INPUTS_GROUP: &str = "User inputs";
const CONTEXT_GROUP: &str = "Execution context";
const PROJECT_CONSTANTS_GROUP: &str = "Project constants";
const FLOW_CONSTANTS_GROUP: &str = "Flow constants";
const ENUMS_GROUP: &str = "Enums";
const FLOW_VARIABLES_GROUP: &str = "Flow variables";
const ITERATION_GROUP: &str = "Iteration variables";
const LOCAL_VARIABLES_GROUP: &str = "Local variables";

impl<'a> CatalogBuilder<'a> {
    pub fn build_with(&self, target_node_id: &str, options: BuildOptions) -> Catalog {
        let mut groups = Vec::new();
        let mut warnings = Vec::new();

        self.start_input_group(&mut groups);
        groups.push(context_group());
        self.constant_groups(&mut groups);
        self.enum_group(&mut groups);
        self.alias_groups(&mut groups);

        // Nearest-first; the target itself is the first element.
        let ancestor_ids = graph::ancestors(target_node_id, &self.graph.edges);

        self.flow_variable_group(&ancestor_ids, target_node_id, &mut groups, &mut warnings);
        self.ancestor_output_groups(&ancestor_ids, target_node_id, options, &mut groups);
        self.iteration_group(target_node_id, &mut groups);
        self.local_assignment_group(target_node_id, &mut groups, &mut warnings);

        Catalog { groups, warnings }
    }

    fn start_input_group(&self, groups: &mut Vec<VariableGroup>) {
        let Some(start) = self.graph.start_node() else {
            return;
        };
        let NodeKind::Start(config) = &start.kind else {
            return;
        };
        if config.variables.is_empty() {
            return;
        }

        let mut variables = Vec::new();
        for input in &config.variables {
            let base = self.start_input_variable(input);
            let nested = nested_structure_variables(&base, &self.index);
            variables.push(base);
            variables.extend(nested);
        }
        groups.push(VariableGroup {
            name: USER_INPUTS_GROUP.to_string(),
            variables,
        });
    }

    fn start_input_variable(&self, input: &InputVariable) -> Variable {
        let ty = if input.input_type == "structure" {
            self.start_structure_type(input.structure_ref.as_deref())
        } else {
            match input.input_type.as_str() {
                "number" => TypeRef::Primitive(ScalarType::Number),
                "text" | "paragraph" | "select" => TypeRef::Primitive(ScalarType::String),
                other => ScalarType::parse(other)
                    .map(TypeRef::Primitive)
                    .unwrap_or(TypeRef::Primitive(ScalarType::String)),
            }
        };
        Variable {
            key: format!("input.{}", input.name),
            name: input.name.clone(),
            label: if input.label.is_empty() {
                input.name.clone()
            } else {
                input.label.clone()
            },
            ty,
            description: input.description.clone(),
            group: USER_INPUTS_GROUP.to_string(),
            source_node_id: None,
        }
    }

    /// Maps a structure-typed Start input to its type: the built-in `List`
    /// and `Set` structures become arrays of their first type parameter,
    /// `Map` becomes its value parameter (erased to object downstream), and
    /// everything else is a plain structure reference.
    fn start_structure_type(&self, reference: Option<&str>) -> TypeRef {
        let Some(structure) = reference.and_then(|r| self.index.resolve(r)) else {
            return TypeRef::Primitive(ScalarType::Object);
        };
        let name = structure.name.to_ascii_lowercase();
        let mut params = structure.type_parameter_names();
        match name.as_str() {
            "list" | "set" => {
                let element = params
                    .next()
                    .map(|param| TypeRef::Generic(param.to_string()))
                    .unwrap_or(TypeRef::Dynamic);
                TypeRef::Collection {
                    kind: CollectionKind::List,
                    element: Box::new(element),
                    key: None,
                }
            }
            "map" => {
                let names: Vec<&str> = params.collect();
                names
                    .get(1)
                    .or_else(|| names.first())
                    .map(|param| TypeRef::Generic(param.to_string()))
                    .unwrap_or(TypeRef::Primitive(ScalarType::Object))
            }
            _ => TypeRef::Struct(structure.id.clone()),
        }
    }

    fn constant_groups(&self, groups: &mut Vec<VariableGroup>) {
        if self.constants.is_empty() {
            return;
        }
        let flow_names: AHashSet<&str> = self
            .constants
            .iter()
            .filter(|constant| constant.flow_id.is_some())
            .map(|constant| constant.name.as_str())
            .collect();

        let to_variable = |constant: &crate::flow::ConstantDefinition, group: &str| Variable {
            key: format!("const.{}", constant.name),
            name: constant.name.clone(),
            label: constant.name.clone(),
            ty: constant
                .value_type
                .as_deref()
                .and_then(ScalarType::parse)
                .map(TypeRef::Primitive)
                .unwrap_or(TypeRef::Primitive(ScalarType::String)),
            description: constant.description.clone(),
            group: group.to_string(),
            source_node_id: None,
        };

        // Flow-level constants shadow project-level ones of the same name.
        let project: Vec<Variable> = self
            .constants
            .iter()
            .filter(|constant| {
                constant.flow_id.is_none()
                    && !constant.name.trim().is_empty()
                    && !flow_names.contains(constant.name.as_str())
            })
            .map(|constant| to_variable(constant, PROJECT_CONSTANTS_GROUP))
            .collect();
        if !project.is_empty() {
            groups.push(VariableGroup {
                name: PROJECT_CONSTANTS_GROUP.to_string(),
                variables: project,
            });
        }

        let flow: Vec<Variable> = self
            .constants
            .iter()
            .filter(|constant| constant.flow_id.is_some() && !constant.name.trim().is_empty())
            .map(|constant| to_variable(constant, FLOW_CONSTANTS_GROUP))
            .collect();
        if !flow.is_empty() {
            groups.push(VariableGroup {
                name: FLOW_CONSTANTS_GROUP.to_string(),
                variables: flow,
            });
        }
    }

    fn enum_group(&self, groups: &mut Vec<VariableGroup>) {
        let variables: Vec<Variable> = self
            .enums
            .iter()
            .filter(|definition| !definition.name.trim().is_empty())
            .map(|definition| Variable {
                key: format!("enum.{}", definition.name),
                name: definition.name.clone(),
                label: definition.name.clone(),
                ty: TypeRef::Primitive(ScalarType::String),
                description: definition.description.clone(),
                group: ENUMS_GROUP.to_string(),
                source_node_id: None,
            })
            .collect();
        if !variables.is_empty() {
            groups.push(VariableGroup {
                name: ENUMS_GROUP.to_string(),
                variables,
            });
        }
    }

    /// Nodes carrying the same output alias share one group; the first such
    /// node's outputs are representative.
    fn alias_groups(&self, groups: &mut Vec<VariableGroup>) {
        let mut by_alias: IndexMap<&str, Vec<&Node>> = IndexMap::new();
        for node in &self.graph.nodes {
            if matches!(node.kind, NodeKind::Start(_)) {
                continue;
            }
            if let Some(alias) = node.kind.output_alias() {
                by_alias.entry(alias).or_default().push(node);
            }
        }

        for (alias, nodes) in by_alias {
            let representative = nodes[0];
            let sources = nodes.iter().map(|node| node.display_label()).join(", ");
            let output_fields = node_output_fields(representative);
            let schema_fields = node_output_schema_fields(representative, &self.index);
            if output_fields.is_empty() && schema_fields.is_empty() {
                continue;
            }
            let prefix = schema_root(&output_fields);

            let mut variables = Vec::new();
            let mut used = AHashSet::new();
            for field in &schema_fields {
                let path = match prefix {
                    Some(prefix) => format!("{prefix}.{}", field.path),
                    None => field.path.clone(),
                };
                variables.push(Variable {
                    key: format!("{alias}.{path}"),
                    name: path.clone(),
                    label: path.clone(),
                    ty: field.ty.clone(),
                    description: Some(format!(
                        "{} (from: {sources})",
                        field.description.as_deref().unwrap_or("Output schema field")
                    )),
                    group: alias.to_string(),
                    source_node_id: Some(representative.id.clone()),
                });
                used.insert(path);
            }
            for field in &output_fields {
                if used.contains(&field.name) {
                    continue;
                }
                variables.push(Variable {
                    key: format!("{alias}.{}", field.name),
                    name: field.name.clone(),
                    label: field.label.clone(),
                    ty: field.ty.clone(),
                    description: Some(match &field.description {
                        Some(description) => format!("{description} (from: {sources})"),
                        None => format!("From: {sources}"),
                    }),
                    group: alias.to_string(),
                    source_node_id: Some(representative.id.clone()),
                });
            }

            groups.push(VariableGroup {
                name: alias.to_string(),
                variables,
            });
        }
    }

    /// Variables defined by variable-assigner nodes upstream of the target.
    /// The first assignment of a name (nearest ancestor, insertion order
    /// within a node) defines its type; later assignments are overwrites and
    /// are surfaced as warnings.
    fn flow_variable_group(
        &self,
        ancestor_ids: &[String],
        target_node_id: &str,
        groups: &mut Vec<VariableGroup>,
        warnings: &mut Vec<CatalogWarning>,
    ) {
        let mut variables: IndexMap<String, Variable> = IndexMap::new();
        for ancestor_id in ancestor_ids {
            if ancestor_id == target_node_id {
                continue;
            }
            let Some(node) = self.graph.node(ancestor_id) else {
                continue;
            };
            let NodeKind::VariableAssigner(config) = &node.kind else {
                continue;
            };
            self.collect_assignments(node, config, &mut variables, warnings, FLOW_VARIABLES_GROUP);
        }

        if !variables.is_empty() {
            groups.push(VariableGroup {
                name: FLOW_VARIABLES_GROUP.to_string(),
                variables: variables.into_values().collect(),
            });
        }
    }

    fn collect_assignments(
        &self,
        node: &Node,
        config: &crate::flow::VariableAssignerConfig,
        variables: &mut IndexMap<String, Variable>,
        warnings: &mut Vec<CatalogWarning>,
        group: &str,
    ) {
        for assignment in &config.assignments {
            let name = assignment.variable_name.trim();
            if name.is_empty() {
                continue;
            }
            if variables.contains_key(name) {
                warnings.push(CatalogWarning::DuplicateAssignment {
                    name: name.to_string(),
                    node_id: node.id.clone(),
                });
                continue;
            }
            let result_type = assignment_result_type(assignment);
            variables.insert(
                name.to_string(),
                Variable {
                    key: format!("var.{name}"),
                    name: name.to_string(),
                    label: name.to_string(),
                    ty: TypeRef::parse_label(&result_type, &self.index),
                    description: Some(format!("Flow variable (defined by {})", node.display_label())),
                    group: group.to_string(),
                    source_node_id: Some(node.id.clone()),
                },
            );
        }
    }

    /// One group per ancestor node, nearest-first, deduplicated by node id.
    fn ancestor_output_groups(
        &self,
        ancestor_ids: &[String],
        target_node_id: &str,
        options: BuildOptions,
        groups: &mut Vec<VariableGroup>,
    ) {
        for ancestor_id in ancestor_ids {
            if ancestor_id == target_node_id {
                continue;
            }
            let Some(node) = self.graph.node(ancestor_id) else {
                continue;
            };

            let variables = match &node.kind {
                // Start inputs and assigner variables have their own groups;
                // end and note nodes produce nothing.
                NodeKind::Start(_)
                | NodeKind::End(_)
                | NodeKind::VariableAssigner(_)
                | NodeKind::Note(_) => Vec::new(),
                NodeKind::Transform(config) => config
                    .mappings
                    .iter()
                    .filter(|mapping| !mapping.target.trim().is_empty())
                    .map(|mapping| Variable {
                        key: format!("nodes.{}.{}", node.id, mapping.target),
                        name: mapping.target.clone(),
                        label: mapping.target.clone(),
                        // Unknown until the transformation runs.
                        ty: TypeRef::Dynamic,
                        description: mapping
                            .source
                            .as_ref()
                            .map(|source| format!("From: {source}"))
                            .or_else(|| {
                                mapping
                                    .expression
                                    .as_ref()
                                    .map(|expression| format!("Expression: {expression}"))
                            }),
                        group: node.display_label().to_string(),
                        source_node_id: Some(node.id.clone()),
                    })
                    .collect(),
                NodeKind::JsonParser(config) => flatten_json_parser_fields(
                    &config.output_fields,
                    &node.id,
                    node.display_label(),
                ),
                NodeKind::Subflow(config) => {
                    if options.skip_subflow {
                        continue;
                    }
                    subflow_output_variables(self, node, config)
                }
                NodeKind::Code(config) if config.output_mode.as_deref() == Some("custom") => {
                    code_custom_outputs(node, config)
                }
                _ => self.standard_node_outputs(node),
            };

            if !variables.is_empty() {
                groups.push(VariableGroup {
                    name: node.display_label().to_string(),
                    variables,
                });
            }
        }
    }

    /// Standard outputs of an ancestor, with the declared output schema
    /// expanded under the `body`/`result` root and callback fields filtered
    /// by configuration.
    fn standard_node_outputs(&self, node: &Node) -> Vec<Variable> {
        let mut output_fields = node_output_fields(node);

        // Callback outputs only exist when the node waits for a callback.
        let waiting = match &node.kind {
            NodeKind::Api(config) => config.wait_for_callback,
            NodeKind::Kafka(config) => config.wait_for_callback,
            _ => true,
        };
        if !waiting {
            output_fields
                .retain(|field| field.name != "callbackKey" && field.name != "callbackData");
        }

        let schema_fields = node_output_schema_fields(node, &self.index);
        let prefix = schema_root(&output_fields);
        let schema = node.kind.output_schema();
        let generic_ref = schema.and_then(|schema| schema.generic_output_ref());

        let mut variables = Vec::new();
        let mut used = AHashSet::new();
        for field in &schema_fields {
            let name = match prefix {
                Some(prefix) => format!("{prefix}.{}", field.path),
                None => field.path.clone(),
            };
            variables.push(Variable {
                key: format!("nodes.{}.{name}", node.id),
                name: name.clone(),
                label: name.clone(),
                ty: field.ty.clone(),
                description: field
                    .description
                    .clone()
                    .or_else(|| Some("Output schema field".to_string())),
                group: node.display_label().to_string(),
                source_node_id: Some(node.id.clone()),
            });
            used.insert(name);
        }

        for field in &output_fields {
            if used.contains(&field.name) {
                continue;
            }
            let mut ty = field.ty.clone();
            if let (Some(generic_ref), Some(root)) = (generic_ref, prefix) {
                if field.name == root {
                    apply_generic_output_ref(
                        &mut ty,
                        generic_ref,
                        schema.and_then(|schema| schema.collection_type()),
                        &self.index,
                    );
                }
            }
            variables.push(Variable {
                key: format!("nodes.{}.{}", node.id, field.name),
                name: field.name.clone(),
                label: field.label.clone(),
                ty,
                description: field.description.clone(),
                group: node.display_label().to_string(),
                source_node_id: Some(node.id.clone()),
            });
        }

        variables
    }

    /// Iteration variables, present only when the target itself is a
    /// for-each node: the item (typed from the source collection's element)
    /// and the index.
    fn iteration_group(&self, target_node_id: &str, groups: &mut Vec<VariableGroup>) {
        let Some(node) = self.graph.node(target_node_id) else {
            return;
        };
        let NodeKind::ForEach(config) = &node.kind else {
            return;
        };
        let Some(items_expression) = config
            .items_expression
            .as_deref()
            .map(str::trim)
            .filter(|expression| !expression.is_empty())
        else {
            return;
        };

        let source_key = expression_key(items_expression)
            .unwrap_or_else(|| items_expression.to_string());
        let source = groups
            .iter()
            .flat_map(|group| group.variables.iter())
            .find(|variable| variable.key == source_key);

        let item_name = config
            .item_variable
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or("item");
        let index_name = config
            .index_variable
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .unwrap_or("index");

        let item_ty = match source {
            Some(variable) if variable.ty.is_array() => variable
                .ty
                .element()
                .cloned()
                .unwrap_or(TypeRef::Primitive(ScalarType::Object)),
            _ => TypeRef::Dynamic,
        };

        let item = Variable {
            key: item_name.to_string(),
            name: item_name.to_string(),
            label: item_name.to_string(),
            ty: item_ty,
            description: source
                .map(|variable| format!("From: {}", variable.label))
                .or_else(|| Some("Iteration item".to_string())),
            group: ITERATION_GROUP.to_string(),
            source_node_id: None,
        };
        let nested = nested_structure_variables(&item, &self.index);

        let mut variables = vec![item];
        variables.extend(nested);
        variables.push(Variable {
            key: index_name.to_string(),
            name: index_name.to_string(),
            label: index_name.to_string(),
            ty: TypeRef::Primitive(ScalarType::Number),
            description: Some("Iteration index".to_string()),
            group: ITERATION_GROUP.to_string(),
            source_node_id: None,
        });

        groups.push(VariableGroup {
            name: ITERATION_GROUP.to_string(),
            variables,
        });
    }

    /// The target node's own assignments, present only when the target is a
    /// variable-assigner. Its variables are not upstream of itself, but the
    /// configuration panel needs them for self-reference.
    fn local_assignment_group(
        &self,
        target_node_id: &str,
        groups: &mut Vec<VariableGroup>,
        warnings: &mut Vec<CatalogWarning>,
    ) {
        let Some(node) = self.graph.node(target_node_id) else {
            return;
        };
        let NodeKind::VariableAssigner(config) = &node.kind else {
            return;
        };
        let mut variables: IndexMap<String, Variable> = IndexMap::new();
        self.collect_assignments(node, config, &mut variables, warnings, LOCAL_VARIABLES_GROUP);
        if !variables.is_empty() {
            groups.push(VariableGroup {
                name: LOCAL_VARIABLES_GROUP.to_string(),
                variables: variables.into_values().collect(),
            });
        }
    }
}

fn context_group() -> VariableGroup {
    let variable = |key: &str, name: &str, label: &str, scalar: ScalarType, description: &str| {
        Variable {
            key: key.to_string(),
            name: name.to_string(),
            label: label.to_string(),
            ty: TypeRef::Primitive(scalar),
            description: Some(description.to_string()),
            group: CONTEXT_GROUP.to_string(),
            source_node_id: None,
        }
    };
    VariableGroup {
        name: CONTEXT_GROUP.to_string(),
        variables: vec![
            variable(
                "context.executionId",
                "executionId",
                "Execution id",
                ScalarType::String,
                "Unique id of the current flow execution",
            ),
            variable(
                "context.flowId",
                "flowId",
                "Flow id",
                ScalarType::String,
                "Id of the current flow definition",
            ),
            variable(
                "context.timestamp",
                "timestamp",
                "Timestamp",
                ScalarType::Number,
                "Timestamp of the current execution",
            ),
        ],
    }
}

/// Expands a structure-typed variable into one additional variable per
/// flattened field, keyed and named under the base variable.
pub(super) fn nested_structure_variables(
    base: &Variable,
    index: &StructureIndex<'_>,
) -> Vec<Variable> {
    let Some(reference) = base.ty.struct_ref() else {
        return Vec::new();
    };
    structure_fields_by_ref(reference, index, None)
        .into_iter()
        .map(|field| Variable {
            key: format!("{}.{}", base.key, field.path),
            name: format!("{}.{}", base.name, field.path),
            label: format!("{}.{}", base.name, field.path),
            ty: field.ty,
            description: field
                .description
                .or_else(|| Some(format!("Field of {}", base.label))),
            group: base.group.clone(),
            source_node_id: base.source_node_id.clone(),
        })
        .collect()
}
