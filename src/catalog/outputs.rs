//! Per-kind node output variables: the static table, the dynamic variants
//! (LLM JSON fields, vector-store filtering, collection rewriting) and the
//! expansion of declared output schemas.

use crate::catalog::Variable;
use crate::flow::{CodeConfig, JsonParserField, Node, NodeKind};
use crate::structures::{
    flatten_structure_fields, ResolveContext, SchemaField, StructureIndex,
};
use crate::types::{CollectionKind, ScalarType, TypeRef};

/// One standard output a node kind always exposes.
#[derive(Debug, Clone, Copy)]
pub struct OutputSpec {
    pub name: &'static str,
    pub label: &'static str,
    pub scalar: ScalarType,
    pub description: &'static str,
}

const fn out(
    name: &'static str,
    label: &'static str,
    scalar: ScalarType,
    description: &'static str,
) -> OutputSpec {
    OutputSpec {
        name,
        label,
        scalar,
        description,
    }
}

const API_OUTPUTS: &[OutputSpec] = &[
    out("statusCode", "Status code", ScalarType::Number, "HTTP response status code"),
    out("body", "Response body", ScalarType::Object, "HTTP response content"),
    out("headers", "Response headers", ScalarType::Object, "HTTP response headers"),
    out("callbackKey", "Callback key", ScalarType::String, "Correlation key while waiting for a callback"),
    out("callbackData", "Callback data", ScalarType::Object, "Data returned by the callback"),
];

const KAFKA_OUTPUTS: &[OutputSpec] = &[
    out("topic", "Topic", ScalarType::String, "Topic the message was sent to"),
    out("messageKey", "Message key", ScalarType::String, "Key of the produced message"),
    out("callbackKey", "Callback key", ScalarType::String, "Correlation key while waiting for a callback"),
    out("callbackData", "Callback data", ScalarType::Object, "Data returned by the callback"),
];

const CODE_OUTPUTS: &[OutputSpec] = &[
    out("result", "Result", ScalarType::Object, "Structured data returned by the code"),
    out("stdout", "Standard output", ScalarType::String, "Captured standard output"),
    out("stderr", "Error output", ScalarType::String, "Captured error output"),
    out("durationMs", "Duration", ScalarType::Number, "Execution time in milliseconds"),
];

const CONDITION_OUTPUTS: &[OutputSpec] = &[out(
    "result",
    "Result",
    ScalarType::Boolean,
    "Result of the condition expression",
)];

const TRANSFORM_OUTPUTS: &[OutputSpec] = &[out(
    "data",
    "Transformed data",
    ScalarType::Object,
    "Result of the data transformation",
)];

// Meta fields only; the real outputs come from the referenced flow's End
// node.
const SUBFLOW_OUTPUTS: &[OutputSpec] = &[
    out("_status", "Status", ScalarType::String, "Subflow execution status"),
    out("_executionId", "Execution id", ScalarType::String, "Subflow execution instance id"),
];

const FOREACH_OUTPUTS: &[OutputSpec] = &[
    out("mode", "Mode", ScalarType::String, "Sequential or parallel"),
    out("total", "Total", ScalarType::Number, "Number of iterated elements"),
    out("successCount", "Succeeded", ScalarType::Number, "Number of successful iterations"),
    out("failedCount", "Failed", ScalarType::Number, "Number of failed iterations"),
    out("results", "Results", ScalarType::Array, "Per-item output (index/item/output/error)"),
];

const LLM_OUTPUTS: &[OutputSpec] = &[
    out("text", "Text", ScalarType::String, "Text returned by the model"),
    out("model", "Model", ScalarType::String, "Model that was actually called"),
    out("usage", "Usage", ScalarType::Object, "Token usage statistics"),
    out("response", "Raw response", ScalarType::Object, "Raw model response"),
];

const VECTOR_STORE_OUTPUTS: &[OutputSpec] = &[
    out("operation", "Operation", ScalarType::String, "Vector store operation"),
    out("count", "Count", ScalarType::Number, "Number of written or deleted entries"),
    out("matches", "Matches", ScalarType::Array, "Similarity search results"),
    out("matchedIds", "Matched ids", ScalarType::Array, "Ids above the score threshold"),
    out("raw", "Raw response", ScalarType::Object, "Raw vector store response"),
];

const SIMHASH_OUTPUTS: &[OutputSpec] = &[
    out("simhash", "Simhash", ScalarType::String, "64-bit simhash (hex)"),
    out("stored", "Stored", ScalarType::Boolean, "Whether the hash was persisted"),
    out("matchedContentIds", "Matched content ids", ScalarType::Array, "Content ids within the distance threshold"),
    out("matches", "Match details", ScalarType::Array, "Match details (contentId/flowId/distance/simhash)"),
];

const KEYWORD_MATCH_OUTPUTS: &[OutputSpec] = &[
    out("hit", "Hit", ScalarType::Boolean, "Whether any keyword matched"),
    out("actionLevel", "Action level", ScalarType::String, "Highest matched action level"),
    out("matchedTerms", "Matched terms", ScalarType::Array, "Matched keywords"),
    out("matchedGroups", "Matched groups", ScalarType::Array, "Matched rule groups"),
];

/// The static outputs of a node kind. Kinds with only dynamic outputs (start,
/// end, variable-assigner, json-parser, note) have none.
pub fn standard_outputs(kind: &NodeKind) -> &'static [OutputSpec] {
    match kind {
        NodeKind::Api(_) => API_OUTPUTS,
        NodeKind::Kafka(_) => KAFKA_OUTPUTS,
        NodeKind::Code(_) => CODE_OUTPUTS,
        NodeKind::Condition(_) => CONDITION_OUTPUTS,
        NodeKind::Transform(_) => TRANSFORM_OUTPUTS,
        NodeKind::Subflow(_) => SUBFLOW_OUTPUTS,
        NodeKind::ForEach(_) => FOREACH_OUTPUTS,
        NodeKind::Llm(_) => LLM_OUTPUTS,
        NodeKind::VectorStore(_) => VECTOR_STORE_OUTPUTS,
        NodeKind::Simhash(_) => SIMHASH_OUTPUTS,
        NodeKind::KeywordMatch(_) => KEYWORD_MATCH_OUTPUTS,
        NodeKind::Start(_)
        | NodeKind::End(_)
        | NodeKind::VariableAssigner(_)
        | NodeKind::JsonParser(_)
        | NodeKind::Note(_) => &[],
    }
}

/// One concrete output field of a node, after configuration is applied.
#[derive(Debug, Clone, PartialEq)]
pub struct OutputField {
    pub name: String,
    pub label: String,
    pub ty: TypeRef,
    pub description: Option<String>,
}

impl OutputField {
    fn from_spec(spec: &OutputSpec) -> OutputField {
        OutputField {
            name: spec.name.to_string(),
            label: spec.label.to_string(),
            ty: TypeRef::Primitive(spec.scalar),
            description: Some(spec.description.to_string()),
        }
    }
}

/// The output fields of a node with its configuration applied: vector-store
/// outputs are filtered by operation and score threshold, LLM JSON-mode
/// fields are added (standard outputs win on a name collision), and a
/// declared `list`/`set` collection type rewrites the scalar result to an
/// array.
pub fn node_output_fields(node: &Node) -> Vec<OutputField> {
    let static_outputs = standard_outputs(&node.kind);

    if let NodeKind::VectorStore(config) = &node.kind {
        let operation = config.operation.as_deref().unwrap_or("");
        let has_threshold = config.has_score_threshold();
        return static_outputs
            .iter()
            .filter(|spec| match operation {
                "search" => {
                    spec.name != "count" && (has_threshold || spec.name != "matchedIds")
                }
                "upsert" | "delete" => spec.name != "matches" && spec.name != "matchedIds",
                _ => has_threshold || spec.name != "matchedIds",
            })
            .map(OutputField::from_spec)
            .collect();
    }

    if let NodeKind::Llm(config) = &node.kind {
        let mut fields = Vec::new();
        if config.output_json_enabled {
            let existing: Vec<&str> = static_outputs.iter().map(|spec| spec.name).collect();
            for field in &config.output_json_fields {
                let name = field.trim();
                if name.is_empty() || existing.contains(&name) {
                    continue;
                }
                fields.push(OutputField {
                    name: name.to_string(),
                    label: name.to_string(),
                    ty: TypeRef::Primitive(ScalarType::Object),
                    description: Some("Parsed from JSON output".to_string()),
                });
            }
        }
        fields.extend(static_outputs.iter().map(OutputField::from_spec));
        return fields;
    }

    let mut fields: Vec<OutputField> = static_outputs.iter().map(OutputField::from_spec).collect();

    if let Some(schema) = node.kind.output_schema() {
        if matches!(schema.collection_type(), Some("list") | Some("set")) {
            let target = if matches!(node.kind, NodeKind::Api(_)) {
                "body"
            } else {
                "result"
            };
            for field in &mut fields {
                if field.name == target {
                    field.ty = TypeRef::Primitive(ScalarType::Array);
                }
            }
        }
    }

    fields
}

/// Expands a node's declared output schema into flattened fields. Nodes
/// without a schema, schemas pointing at a generic parameter, unknown
/// structures and `map` collections all yield nothing.
pub fn node_output_schema_fields(node: &Node, index: &StructureIndex<'_>) -> Vec<SchemaField> {
    let Some(schema) = node.kind.output_schema() else {
        return Vec::new();
    };
    if !schema.enable_output_schema {
        return Vec::new();
    }
    let Some(structure_id) = schema.output_structure_id.as_deref() else {
        return Vec::new();
    };
    if structure_id.starts_with("generic:") {
        return Vec::new();
    }
    let Some(structure) = index.resolve(structure_id) else {
        tracing::debug!(
            node_id = %node.id,
            structure_id,
            "output schema references an unknown structure"
        );
        return Vec::new();
    };
    if schema.collection_type() == Some("map") {
        return Vec::new();
    }

    let mut context = ResolveContext {
        index,
        generic_args: schema.generic_type_args.as_ref(),
        generic_param_names: structure
            .type_parameter_names()
            .map(str::to_string)
            .collect(),
        visited: vec![structure.id.clone()],
    };
    flatten_structure_fields(&structure.fields, &mut context)
}

/// The schema root among a node's static outputs: `body` when present, then
/// `result`, else none.
pub fn schema_root<'f>(fields: &'f [OutputField]) -> Option<&'f str> {
    if fields.iter().any(|field| field.name == "body") {
        Some("body")
    } else if fields.iter().any(|field| field.name == "result") {
        Some("result")
    } else {
        None
    }
}

/// Flattens a json-parser node's declared output fields into dotted-path
/// variables.
pub fn flatten_json_parser_fields(
    fields: &[JsonParserField],
    node_id: &str,
    node_label: &str,
) -> Vec<Variable> {
    let mut variables = Vec::new();
    flatten_json_parser_into(fields, node_id, node_label, "", &mut variables);
    variables
}

fn flatten_json_parser_into(
    fields: &[JsonParserField],
    node_id: &str,
    node_label: &str,
    parent_path: &str,
    output: &mut Vec<Variable>,
) {
    for field in fields {
        let segment = field.path.trim();
        if segment.is_empty() {
            continue;
        }
        let full_path = if parent_path.is_empty() {
            segment.to_string()
        } else {
            format!("{parent_path}.{segment}")
        };
        let ty = field
            .field_type
            .as_deref()
            .and_then(ScalarType::parse)
            .map(TypeRef::Primitive)
            .unwrap_or(TypeRef::Primitive(ScalarType::String));
        output.push(Variable {
            key: format!("nodes.{node_id}.{full_path}"),
            name: full_path.clone(),
            label: full_path.clone(),
            ty,
            description: field
                .description
                .clone()
                .or_else(|| Some("Parsed JSON field".to_string())),
            group: node_label.to_string(),
            source_node_id: Some(node_id.to_string()),
        });
        if !field.children.is_empty() {
            flatten_json_parser_into(&field.children, node_id, node_label, &full_path, output);
        }
    }
}

/// Custom outputs of a code node in `custom` output mode: the user-declared
/// fields under `result.<name>`, then the standard outputs not shadowed by a
/// custom name.
pub fn code_custom_outputs(node: &Node, config: &CodeConfig) -> Vec<Variable> {
    let customs: Vec<_> = config
        .custom_outputs
        .iter()
        .filter(|output| !output.name.trim().is_empty())
        .collect();
    let custom_names: Vec<&str> = customs.iter().map(|output| output.name.as_str()).collect();

    let mut variables: Vec<Variable> = customs
        .iter()
        .map(|output| Variable {
            key: format!("nodes.{}.result.{}", node.id, output.name),
            name: output.name.clone(),
            label: output.label.clone().unwrap_or_else(|| output.name.clone()),
            ty: output
                .value_type
                .as_deref()
                .and_then(ScalarType::parse)
                .map(TypeRef::Primitive)
                .unwrap_or(TypeRef::Primitive(ScalarType::Object)),
            description: output
                .description
                .clone()
                .or_else(|| Some("Custom output field".to_string())),
            group: node.display_label().to_string(),
            source_node_id: Some(node.id.clone()),
        })
        .collect();

    for spec in standard_outputs(&node.kind) {
        if custom_names.contains(&spec.name) {
            continue;
        }
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

/// Rewrites a schema root output for a schema that targets a generic
/// parameter: `list`/`set` collections become arrays of the parameter,
/// everything else becomes an object of it.
pub fn apply_generic_output_ref(
    ty: &mut TypeRef,
    generic_ref: &str,
    collection_type: Option<&str>,
    index: &StructureIndex<'_>,
) {
    let element = TypeRef::from_tag(generic_ref, index);
    *ty = match collection_type {
        Some("list") | Some("set") => TypeRef::Collection {
            kind: CollectionKind::List,
            element: Box::new(element),
            key: None,
        },
        _ => element,
    };
}
