//! The transform/assignment type engine.
//!
//! A closed table maps each source data type to its legal operations and
//! their result kinds. Adding a source type or an operation is a deliberate
//! schema change, not a plugin point: the table and both enums are meant to
//! change together.

use crate::catalog::Catalog;
use crate::flow::{AssignmentItem, AssignmentMode};
use crate::structures::StructureIndex;
use crate::template::expression_key;
use crate::types::{extract_element_type, resolve_type_ref, TypeRef};
use serde::{Deserialize, Serialize};

/// The coarse type of a transform source variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceDataType {
    String,
    Number,
    Boolean,
    Object,
    Array,
    Unknown,
}

impl SourceDataType {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceDataType::String => "string",
            SourceDataType::Number => "number",
            SourceDataType::Boolean => "boolean",
            SourceDataType::Object => "object",
            SourceDataType::Array => "array",
            SourceDataType::Unknown => "unknown",
        }
    }

    /// Maps a flattened type string (`number`, `integer`, `List<ContentVO>`,
    /// `ContentVO[]`) to a source type. Anything unrecognized is `Unknown`.
    pub fn from_label(label: &str) -> SourceDataType {
        let trimmed = label.trim();
        let lower = trimmed.to_ascii_lowercase();
        let is_array = lower == "array"
            || lower == "list"
            || lower.starts_with("list<")
            || lower.starts_with("arraylist<")
            || lower.starts_with("set<")
            || lower.starts_with("collection<")
            || lower.starts_with("array<")
            || trimmed.ends_with("[]");
        if is_array {
            return SourceDataType::Array;
        }
        match lower.as_str() {
            "string" => SourceDataType::String,
            "number" | "integer" | "float" | "double" => SourceDataType::Number,
            "boolean" => SourceDataType::Boolean,
            "object" => SourceDataType::Object,
            _ => SourceDataType::Unknown,
        }
    }

    pub fn from_type_ref(ty: &TypeRef) -> SourceDataType {
        if ty.is_array() {
            return SourceDataType::Array;
        }
        match ty.base_type() {
            "string" => SourceDataType::String,
            "number" => SourceDataType::Number,
            "boolean" => SourceDataType::Boolean,
            "object" => SourceDataType::Object,
            "array" => SourceDataType::Array,
            _ => SourceDataType::Unknown,
        }
    }
}

/// A user-selectable transform operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformOperation {
    GetFirst,
    GetLast,
    GetIndex,
    Length,
    Slice,
    Reverse,
    Unique,
    Join,
    Append,
    RemoveFirst,
    RemoveLast,
    Trim,
    Uppercase,
    Lowercase,
    RegexReplace,
    RegexExtract,
    Add,
    Subtract,
    Multiply,
    Divide,
    Round,
    Floor,
    Ceil,
    Abs,
    GetField,
    Keys,
    Values,
    Not,
}

/// How an operation's result type is derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultKind {
    /// A fixed primitive type name.
    Fixed(&'static str),
    /// The element type of the source array.
    Element,
    /// Cannot be determined statically; reported as `unknown`.
    Dynamic,
}

/// One row of the operation table.
#[derive(Debug, Clone, Copy)]
pub struct OperationSpec {
    pub op: TransformOperation,
    pub result: ResultKind,
    pub params: &'static [&'static str],
}

const fn spec(
    op: TransformOperation,
    result: ResultKind,
    params: &'static [&'static str],
) -> OperationSpec {
    OperationSpec { op, result, params }
}

const ARRAY_OPERATIONS: &[OperationSpec] = &[
    spec(TransformOperation::GetFirst, ResultKind::Element, &[]),
    spec(TransformOperation::GetLast, ResultKind::Element, &[]),
    spec(TransformOperation::GetIndex, ResultKind::Element, &["arrayIndex"]),
    spec(TransformOperation::Length, ResultKind::Fixed("number"), &[]),
    spec(TransformOperation::Slice, ResultKind::Fixed("array"), &["sliceStart", "sliceEnd"]),
    spec(TransformOperation::Reverse, ResultKind::Fixed("array"), &[]),
    spec(TransformOperation::Unique, ResultKind::Fixed("array"), &[]),
    spec(TransformOperation::Join, ResultKind::Fixed("string"), &["joinSeparator"]),
    spec(TransformOperation::Append, ResultKind::Fixed("array"), &["appendValue"]),
    spec(TransformOperation::RemoveFirst, ResultKind::Fixed("array"), &[]),
    spec(TransformOperation::RemoveLast, ResultKind::Fixed("array"), &[]),
];

const STRING_OPERATIONS: &[OperationSpec] = &[
    spec(TransformOperation::Length, ResultKind::Fixed("number"), &[]),
    spec(TransformOperation::Trim, ResultKind::Fixed("string"), &[]),
    spec(TransformOperation::Uppercase, ResultKind::Fixed("string"), &[]),
    spec(TransformOperation::Lowercase, ResultKind::Fixed("string"), &[]),
    spec(
        TransformOperation::RegexReplace,
        ResultKind::Fixed("string"),
        &["regexPattern", "regexFlags", "regexReplace"],
    ),
    spec(
        TransformOperation::RegexExtract,
        ResultKind::Fixed("string"),
        &["regexPattern", "regexFlags", "regexGroup"],
    ),
];

const NUMBER_OPERATIONS: &[OperationSpec] = &[
    spec(TransformOperation::Add, ResultKind::Fixed("number"), &["arithmeticValue"]),
    spec(TransformOperation::Subtract, ResultKind::Fixed("number"), &["arithmeticValue"]),
    spec(TransformOperation::Multiply, ResultKind::Fixed("number"), &["arithmeticValue"]),
    spec(TransformOperation::Divide, ResultKind::Fixed("number"), &["arithmeticValue"]),
    spec(TransformOperation::Round, ResultKind::Fixed("number"), &[]),
    spec(TransformOperation::Floor, ResultKind::Fixed("number"), &[]),
    spec(TransformOperation::Ceil, ResultKind::Fixed("number"), &[]),
    spec(TransformOperation::Abs, ResultKind::Fixed("number"), &[]),
];

const OBJECT_OPERATIONS: &[OperationSpec] = &[
    spec(TransformOperation::GetField, ResultKind::Dynamic, &["fieldPath"]),
    spec(TransformOperation::Keys, ResultKind::Fixed("array"), &[]),
    spec(TransformOperation::Values, ResultKind::Fixed("array"), &[]),
];

const BOOLEAN_OPERATIONS: &[OperationSpec] =
    &[spec(TransformOperation::Not, ResultKind::Fixed("boolean"), &[])];

/// The legal operations for a source type. Unknown sources have none.
pub fn operations_for(source: SourceDataType) -> &'static [OperationSpec] {
    match source {
        SourceDataType::Array => ARRAY_OPERATIONS,
        SourceDataType::String => STRING_OPERATIONS,
        SourceDataType::Number => NUMBER_OPERATIONS,
        SourceDataType::Object => OBJECT_OPERATIONS,
        SourceDataType::Boolean => BOOLEAN_OPERATIONS,
        SourceDataType::Unknown => &[],
    }
}

/// Looks up one operation in the table for `source`.
pub fn operation_spec(
    source: SourceDataType,
    operation: TransformOperation,
) -> Option<&'static OperationSpec> {
    operations_for(source).iter().find(|spec| spec.op == operation)
}

/// Computes the result type of an assignment.
///
/// `set` takes the chosen value type; `assign` preserves the source's full
/// display type; `transform` consults the operation table, reporting
/// `unknown` when the operation is missing from the table for that source.
pub fn compute_result_type(
    mode: AssignmentMode,
    value_type: Option<&str>,
    source_type: Option<SourceDataType>,
    operation: Option<TransformOperation>,
    element_type: Option<&str>,
    source_full_type: Option<&str>,
) -> String {
    match mode {
        AssignmentMode::Set => value_type.unwrap_or("unknown").to_string(),
        AssignmentMode::Assign => source_full_type
            .filter(|full| !full.is_empty())
            .map(str::to_string)
            .or_else(|| source_type.map(|source| source.as_str().to_string()))
            .unwrap_or_else(|| "unknown".to_string()),
        AssignmentMode::Transform => {
            let (Some(source), Some(operation)) = (source_type, operation) else {
                return "unknown".to_string();
            };
            match operation_spec(source, operation) {
                Some(spec) => match spec.result {
                    ResultKind::Fixed(name) => name.to_string(),
                    ResultKind::Element => element_type.unwrap_or("object").to_string(),
                    ResultKind::Dynamic => "unknown".to_string(),
                },
                None => "unknown".to_string(),
            }
        }
    }
}

/// Result type for one assignment item as persisted in a node configuration.
/// Older snapshots may lack the stored source type; the full type string is
/// the fallback.
pub fn assignment_result_type(item: &AssignmentItem) -> String {
    let source_type = item.source_type.or_else(|| {
        item.source_full_type
            .as_deref()
            .map(SourceDataType::from_label)
    });
    compute_result_type(
        item.mode,
        item.value_type.as_deref(),
        source_type,
        item.operation,
        item.element_type.as_deref(),
        item.source_full_type.as_deref(),
    )
}

/// The inferred type of a transform source variable.
#[derive(Debug, Clone, PartialEq)]
pub struct SourceTypeInfo {
    pub base_type: SourceDataType,
    /// Full display type, e.g. `List<ContentVO>`.
    pub full_type: String,
    /// Element type when the source is an array.
    pub element_type: Option<String>,
}

impl Default for SourceTypeInfo {
    fn default() -> Self {
        SourceTypeInfo {
            base_type: SourceDataType::Unknown,
            full_type: "unknown".to_string(),
            element_type: None,
        }
    }
}

/// Resolves a `{{key}}` expression against a catalog's variables and infers
/// the source type information needed to drive the operation menu.
pub fn infer_source_type_info(
    expression: &str,
    catalog: &Catalog,
    index: &StructureIndex<'_>,
) -> SourceTypeInfo {
    let Some(key) = expression_key(expression) else {
        return SourceTypeInfo::default();
    };
    let Some(variable) = catalog.find_by_key(&key) else {
        return SourceTypeInfo::default();
    };

    let full_type = variable.ty.label(index);
    let base_type = SourceDataType::from_type_ref(&variable.ty);

    let element_type = if base_type == SourceDataType::Array {
        variable
            .ty
            .element()
            .map(|element| element.label(index))
            .filter(|label| label != "dynamic")
            .or_else(|| extract_element_type(&full_type))
            .and_then(|element| {
                // A tag that slipped through still resolves to a name here.
                if element.starts_with("struct:") || element.starts_with("generic:") {
                    resolve_type_ref(&element, index)
                } else {
                    Some(element)
                }
            })
    } else {
        None
    };

    SourceTypeInfo {
        base_type,
        full_type,
        element_type,
    }
}
