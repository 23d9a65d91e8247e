//! Per-kind node configuration structs.
//!
//! Every field is defaulted: a node saved with a partial configuration must
//! still deserialize, the engine degrades instead of rejecting the snapshot.

use crate::structures::GenericTypeArgs;
use crate::transform::{SourceDataType, TransformOperation};
use serde::Deserialize;

/// A user input declared on the Start node.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputVariable {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub label: String,
    /// `text`, `paragraph`, `select`, `number`, or `structure`.
    #[serde(default, rename = "type")]
    pub input_type: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub default_value: Option<serde_json::Value>,
    #[serde(default)]
    pub description: Option<String>,
    /// Structure reference for `structure`-typed inputs.
    #[serde(default)]
    pub structure_ref: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StartConfig {
    #[serde(default)]
    pub variables: Vec<InputVariable>,
}

/// One output variable declared on an End node.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputVariableConfig {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub label: String,
    #[serde(default, rename = "type")]
    pub value_type: Option<String>,
    #[serde(default)]
    pub type_ref: Option<String>,
    #[serde(default)]
    pub item_type_ref: Option<String>,
    #[serde(default)]
    pub expression: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndConfig {
    #[serde(default)]
    pub output_variables: Vec<OutputVariableConfig>,
}

/// Typed output schema shared by the node kinds that can declare one.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputSchemaConfig {
    #[serde(default)]
    pub enable_output_schema: bool,
    #[serde(default)]
    pub output_structure_id: Option<String>,
    #[serde(default)]
    pub generic_type_args: Option<GenericTypeArgs>,
    /// `list`, `set`, or `map`; empty means a plain scalar result.
    #[serde(default)]
    pub output_collection_type: Option<String>,
}

impl OutputSchemaConfig {
    pub fn collection_type(&self) -> Option<&str> {
        self.output_collection_type
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    /// Set when the schema points at a generic parameter instead of a
    /// concrete structure.
    pub fn generic_output_ref(&self) -> Option<&str> {
        if !self.enable_output_schema {
            return None;
        }
        self.output_structure_id
            .as_deref()
            .filter(|id| id.starts_with("generic:"))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiConfig {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub method: Option<String>,
    #[serde(default)]
    pub headers: Option<serde_json::Value>,
    #[serde(default)]
    pub body_template: Option<String>,
    #[serde(default)]
    pub timeout: Option<serde_json::Value>,
    #[serde(default)]
    pub wait_for_callback: bool,
    #[serde(default)]
    pub output_alias: Option<String>,
    #[serde(flatten)]
    pub schema: OutputSchemaConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KafkaConfig {
    #[serde(default)]
    pub topic: Option<String>,
    #[serde(default)]
    pub key_expression: Option<String>,
    #[serde(default)]
    pub message_template: Option<String>,
    #[serde(default)]
    pub wait_for_callback: bool,
    #[serde(default)]
    pub output_alias: Option<String>,
    #[serde(flatten)]
    pub schema: OutputSchemaConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeOutputVariable {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default, rename = "type")]
    pub value_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CodeConfig {
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    /// Named input expressions made visible to the code body.
    #[serde(default)]
    pub inputs: Vec<serde_json::Value>,
    /// `auto`, `custom`, or `schema`.
    #[serde(default)]
    pub output_mode: Option<String>,
    #[serde(default)]
    pub custom_outputs: Vec<CodeOutputVariable>,
    #[serde(default)]
    pub output_alias: Option<String>,
    #[serde(flatten)]
    pub schema: OutputSchemaConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConditionConfig {
    #[serde(default)]
    pub expression: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformMapping {
    #[serde(default)]
    pub target: String,
    #[serde(default)]
    pub source: Option<String>,
    #[serde(default)]
    pub expression: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformConfig {
    #[serde(default)]
    pub mappings: Vec<TransformMapping>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubflowInputMapping {
    #[serde(default)]
    pub target_variable: String,
    #[serde(default)]
    pub source_expression: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubflowConfig {
    #[serde(default)]
    pub subflow_id: Option<String>,
    #[serde(default)]
    pub subflow_name: Option<String>,
    #[serde(default)]
    pub input_mappings: Vec<SubflowInputMapping>,
    #[serde(default)]
    pub output_alias: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForEachConfig {
    #[serde(default)]
    pub items_expression: Option<String>,
    #[serde(default)]
    pub item_variable: Option<String>,
    #[serde(default)]
    pub index_variable: Option<String>,
    #[serde(default)]
    pub subflow_id: Option<String>,
    #[serde(default)]
    pub input_mappings: Vec<SubflowInputMapping>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LlmConfig {
    #[serde(default)]
    pub model: Option<String>,
    #[serde(default)]
    pub system_prompt: Option<String>,
    #[serde(default)]
    pub user_prompt: Option<String>,
    #[serde(default)]
    pub output_json_enabled: bool,
    #[serde(default)]
    pub output_json_fields: Vec<String>,
    #[serde(default)]
    pub output_alias: Option<String>,
    #[serde(flatten)]
    pub schema: OutputSchemaConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VectorStoreConfig {
    /// `upsert`, `delete`, or `search`.
    #[serde(default)]
    pub operation: Option<String>,
    /// Number or non-empty string; either form counts as configured.
    #[serde(default)]
    pub score_threshold: Option<serde_json::Value>,
    #[serde(default)]
    pub output_alias: Option<String>,
    #[serde(flatten)]
    pub schema: OutputSchemaConfig,
}

impl VectorStoreConfig {
    pub fn has_score_threshold(&self) -> bool {
        match &self.score_threshold {
            Some(serde_json::Value::Number(_)) => true,
            Some(serde_json::Value::String(text)) => !text.trim().is_empty(),
            _ => false,
        }
    }
}

/// How one variable-assigner entry produces its value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentMode {
    #[default]
    Set,
    Assign,
    Transform,
}

/// One entry of a variable-assigner node. Exactly one of the value, the
/// source expression, or the source expression plus operation is meaningful,
/// selected by `mode`.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentItem {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub variable_name: String,
    #[serde(default)]
    pub mode: AssignmentMode,
    #[serde(default)]
    pub value_type: Option<String>,
    #[serde(default)]
    pub value: Option<serde_json::Value>,
    #[serde(default)]
    pub source_expression: Option<String>,
    #[serde(default)]
    pub source_type: Option<SourceDataType>,
    /// Full display type of the source, e.g. `List<ContentVO>`.
    #[serde(default)]
    pub source_full_type: Option<String>,
    /// Element type when the source is an array.
    #[serde(default)]
    pub element_type: Option<String>,
    #[serde(default)]
    pub operation: Option<TransformOperation>,
    #[serde(default)]
    pub operation_params: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VariableAssignerConfig {
    #[serde(default)]
    pub assignments: Vec<AssignmentItem>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonParserField {
    #[serde(default)]
    pub path: String,
    #[serde(default, rename = "type")]
    pub field_type: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub children: Vec<JsonParserField>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JsonParserConfig {
    #[serde(default)]
    pub source_expression: Option<String>,
    #[serde(default)]
    pub output_fields: Vec<JsonParserField>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimhashConfig {
    #[serde(default)]
    pub output_alias: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeywordMatchConfig {
    #[serde(default)]
    pub output_alias: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteConfig {
    #[serde(default)]
    pub text: Option<String>,
}
