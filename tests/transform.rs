//! Tests for the transform/assignment type engine.
mod common;

use common::*;
use pretty_assertions::assert_eq;
use suiron::flow::{AssignmentItem, AssignmentMode};
use suiron::prelude::*;
use suiron::transform::{assignment_result_type, operation_spec, ResultKind};

#[test]
fn source_type_classification_from_labels() {
    assert_eq!(SourceDataType::from_label("number"), SourceDataType::Number);
    assert_eq!(SourceDataType::from_label("integer"), SourceDataType::Number);
    assert_eq!(SourceDataType::from_label("List<ContentVO>"), SourceDataType::Array);
    assert_eq!(SourceDataType::from_label("ContentVO[]"), SourceDataType::Array);
    assert_eq!(SourceDataType::from_label("Set<string>"), SourceDataType::Array);
    assert_eq!(SourceDataType::from_label("array"), SourceDataType::Array);
    assert_eq!(SourceDataType::from_label("boolean"), SourceDataType::Boolean);
    assert_eq!(SourceDataType::from_label("ContentVO"), SourceDataType::Unknown);
}

#[test]
fn operation_table_is_closed_per_source_type() {
    let array_ops = operations_for(SourceDataType::Array);
    assert!(array_ops.iter().any(|spec| spec.op == TransformOperation::GetFirst));
    assert!(array_ops.iter().any(|spec| spec.op == TransformOperation::Join));
    // String operations never leak into the array menu.
    assert!(!array_ops.iter().any(|spec| spec.op == TransformOperation::Uppercase));

    assert!(operations_for(SourceDataType::Unknown).is_empty());

    let not = operations_for(SourceDataType::Boolean);
    assert_eq!(not.len(), 1);
    assert_eq!(not[0].op, TransformOperation::Not);
}

#[test]
fn operation_specs_declare_their_parameters() {
    let get_index = operation_spec(SourceDataType::Array, TransformOperation::GetIndex).unwrap();
    assert_eq!(get_index.params, &["arrayIndex"]);
    assert_eq!(get_index.result, ResultKind::Element);

    let replace =
        operation_spec(SourceDataType::String, TransformOperation::RegexReplace).unwrap();
    assert_eq!(replace.params, &["regexPattern", "regexFlags", "regexReplace"]);

    // Operations are scoped to their source type.
    assert!(operation_spec(SourceDataType::String, TransformOperation::Add).is_none());
}

#[test]
fn set_mode_takes_the_declared_value_type() {
    let result = compute_result_type(AssignmentMode::Set, Some("boolean"), None, None, None, None);
    assert_eq!(result, "boolean");

    let missing = compute_result_type(AssignmentMode::Set, None, None, None, None, None);
    assert_eq!(missing, "unknown");
}

#[test]
fn assign_mode_preserves_the_full_source_type() {
    let full = compute_result_type(
        AssignmentMode::Assign,
        None,
        Some(SourceDataType::Array),
        None,
        None,
        Some("List<ContentVO>"),
    );
    assert_eq!(full, "List<ContentVO>");

    // Without a full type the coarse source type is the fallback.
    let coarse = compute_result_type(
        AssignmentMode::Assign,
        None,
        Some(SourceDataType::Number),
        None,
        None,
        None,
    );
    assert_eq!(coarse, "number");

    let nothing = compute_result_type(AssignmentMode::Assign, None, None, None, None, None);
    assert_eq!(nothing, "unknown");
}

#[test]
fn transform_mode_consults_the_operation_table() {
    let element = compute_result_type(
        AssignmentMode::Transform,
        None,
        Some(SourceDataType::Array),
        Some(TransformOperation::GetFirst),
        Some("ContentVO"),
        Some("List<ContentVO>"),
    );
    assert_eq!(element, "ContentVO");

    // Element-kind results without a known element degrade to object.
    let no_element = compute_result_type(
        AssignmentMode::Transform,
        None,
        Some(SourceDataType::Array),
        Some(TransformOperation::GetLast),
        None,
        None,
    );
    assert_eq!(no_element, "object");

    let length = compute_result_type(
        AssignmentMode::Transform,
        None,
        Some(SourceDataType::Array),
        Some(TransformOperation::Length),
        None,
        None,
    );
    assert_eq!(length, "number");

    let upper = compute_result_type(
        AssignmentMode::Transform,
        None,
        Some(SourceDataType::String),
        Some(TransformOperation::Uppercase),
        None,
        None,
    );
    assert_eq!(upper, "string");

    // get_field cannot be typed statically.
    let field = compute_result_type(
        AssignmentMode::Transform,
        None,
        Some(SourceDataType::Object),
        Some(TransformOperation::GetField),
        None,
        None,
    );
    assert_eq!(field, "unknown");

    // An operation that does not exist for the source type.
    let mismatch = compute_result_type(
        AssignmentMode::Transform,
        None,
        Some(SourceDataType::String),
        Some(TransformOperation::Add),
        None,
        None,
    );
    assert_eq!(mismatch, "unknown");

    let incomplete =
        compute_result_type(AssignmentMode::Transform, None, None, None, None, None);
    assert_eq!(incomplete, "unknown");
}

#[test]
fn assignment_items_fall_back_to_the_stored_full_type() {
    // Older snapshots carry only the full type string.
    let item: AssignmentItem = serde_json::from_value(serde_json::json!({
        "variableName": "first",
        "mode": "transform",
        "sourceExpression": "{{nodes.api.body}}",
        "sourceFullType": "List<ContentVO>",
        "elementType": "ContentVO",
        "operation": "get_first",
    }))
    .unwrap();
    assert_eq!(assignment_result_type(&item), "ContentVO");

    let assign: AssignmentItem = serde_json::from_value(serde_json::json!({
        "variableName": "copy",
        "mode": "assign",
        "sourceExpression": "{{nodes.api.body}}",
        "sourceFullType": "List<number>",
    }))
    .unwrap();
    assert_eq!(assignment_result_type(&assign), "List<number>");
}

#[test]
fn source_type_inference_resolves_catalog_variables() {
    let structures = user_structures();
    let flow = graph(
        vec![
            start_node(serde_json::json!([])),
            node("assign", "variable_assigner", serde_json::json!({
                "assignments": [{
                    "variableName": "users",
                    "mode": "assign",
                    "sourceExpression": "{{nodes.api.body}}",
                    "sourceFullType": "List<UserVO>",
                }],
            })),
            node("end", "end", serde_json::json!({})),
        ],
        chain(&["start", "assign", "end"]),
    );
    let builder = CatalogBuilder::new(&flow, &structures, &[], &[], &[]);
    let catalog = builder.build("end");

    let info = infer_source_type_info("{{var.users}}", &catalog, builder.index());
    assert_eq!(info.base_type, SourceDataType::Array);
    assert_eq!(info.full_type, "List<UserVO>");
    assert_eq!(info.element_type, Some("UserVO".to_string()));

    let scalar = infer_source_type_info("{{context.timestamp}}", &catalog, builder.index());
    assert_eq!(scalar.base_type, SourceDataType::Number);
    assert_eq!(scalar.element_type, None);

    let unknown = infer_source_type_info("{{var.missing}}", &catalog, builder.index());
    assert_eq!(unknown, SourceTypeInfo::default());
    assert_eq!(unknown.full_type, "unknown");
}
