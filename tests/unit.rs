//! Unit tests for the type model, structure resolution, graph traversal and
//! template scanning.
mod common;

use common::*;
use pretty_assertions::assert_eq;
use suiron::prelude::*;
use suiron::structures::structure_fields_by_ref;
use suiron::template::{expression_key, extract_reference_paths};
use suiron::{graph, types};

#[test]
fn scalar_parse_folds_backend_aliases() {
    assert_eq!(ScalarType::parse("integer"), Some(ScalarType::Number));
    assert_eq!(ScalarType::parse("float"), Some(ScalarType::Number));
    assert_eq!(ScalarType::parse("Double"), Some(ScalarType::Number));
    assert_eq!(ScalarType::parse("list"), Some(ScalarType::Array));
    assert_eq!(ScalarType::parse("string"), Some(ScalarType::String));
    assert_eq!(ScalarType::parse("timestamp"), None);
}

#[test]
fn struct_ref_normalization_strips_stacked_prefixes() {
    assert_eq!(normalize_struct_ref("struct:abc"), "abc");
    assert_eq!(normalize_struct_ref("struct:struct:struct:abc"), "abc");
    assert_eq!(normalize_struct_ref("abc"), "abc");
    assert_eq!(normalize_struct_ref("  struct:abc"), "abc");
}

#[test]
fn array_always_displays_as_list() {
    assert_eq!(display_type("array"), "List");
    assert_eq!(display_type("Array"), "List");
    assert_eq!(display_type("list"), "List");
    assert_eq!(display_type("string"), "string");
    assert_eq!(display_type("ContentVO"), "ContentVO");
}

#[test]
fn element_type_extraction_handles_wrapper_spellings() {
    assert_eq!(
        extract_element_type("List<ContentVO>"),
        Some("ContentVO".to_string())
    );
    assert_eq!(
        extract_element_type("arraylist<Number>"),
        Some("Number".to_string())
    );
    assert_eq!(
        extract_element_type("ContentVO[]"),
        Some("ContentVO".to_string())
    );
    assert_eq!(
        extract_element_type("Set< UserVO >"),
        Some("UserVO".to_string())
    );
    assert_eq!(extract_element_type("string"), None);
    assert_eq!(extract_element_type(""), None);
}

#[test]
fn type_tags_parse_into_structured_refs() {
    let structures = user_structures();
    let index = StructureIndex::new(&structures);

    assert_eq!(
        TypeRef::from_tag("struct:s-user", &index),
        TypeRef::Struct("s-user".to_string())
    );
    assert_eq!(
        TypeRef::from_tag("generic:T", &index),
        TypeRef::Generic("T".to_string())
    );
    assert_eq!(
        TypeRef::from_tag("number", &index),
        TypeRef::Primitive(ScalarType::Number)
    );

    let list = TypeRef::from_tag("list:struct:s-user", &index);
    assert!(list.is_array());
    assert_eq!(list.struct_ref(), Some("s-user"));
    assert_eq!(list.label(&index), "List<UserVO>");
}

#[test]
fn labels_round_trip_through_parse_label() {
    let structures = user_structures();
    let index = StructureIndex::new(&structures);

    for label in ["number", "List<UserVO>", "Set<string>", "Map<string, number>", "UserVO"] {
        let parsed = TypeRef::parse_label(label, &index);
        assert_eq!(parsed.label(&index), label, "label '{label}'");
    }
}

#[test]
fn base_types_erase_structs_and_generics_to_object() {
    let structures = user_structures();
    let index = StructureIndex::new(&structures);

    assert_eq!(TypeRef::Struct("s-user".to_string()).base_type(), "object");
    assert_eq!(TypeRef::Generic("T".to_string()).base_type(), "object");
    assert_eq!(TypeRef::parse_label("List<UserVO>", &index).base_type(), "array");
    assert_eq!(TypeRef::parse_label("Map<string, number>", &index).base_type(), "object");
    assert_eq!(TypeRef::Dynamic.base_type(), "dynamic");
}

#[test]
fn substitution_binds_generics_recursively() {
    let structures = user_structures();
    let index = StructureIndex::new(&structures);

    let mut bindings = ahash::AHashMap::new();
    bindings.insert("T".to_string(), TypeRef::Primitive(ScalarType::Number));

    let bound = TypeRef::parse_label("List<T>", &index).substitute(&bindings);
    assert_eq!(bound.label(&index), "List<number>");

    // Unbound parameters stay in place.
    let unbound = TypeRef::Generic("U".to_string()).substitute(&bindings);
    assert_eq!(unbound, TypeRef::Generic("U".to_string()));
}

#[test]
fn structure_index_prefers_id_over_full_name_over_name() {
    let structures = vec![
        structure(serde_json::json!({ "id": "shared", "name": "ById" })),
        structure(serde_json::json!({ "id": "other", "fullName": "shared", "name": "ByFullName" })),
        structure(serde_json::json!({ "id": "a", "fullName": "dup", "name": "A" })),
        structure(serde_json::json!({ "id": "b", "name": "dup" })),
    ];
    let index = StructureIndex::new(&structures);

    assert_eq!(index.resolve("shared").unwrap().id, "shared");
    assert_eq!(index.resolve("struct:struct:shared").unwrap().id, "shared");
    assert_eq!(index.resolve("dup").unwrap().id, "a");
    assert_eq!(index.resolve("ByFullName").unwrap().id, "other");
    assert!(index.resolve("missing").is_none());
}

#[test]
fn structure_fields_flatten_with_dotted_paths() {
    let structures = user_structures();
    let index = StructureIndex::new(&structures);

    let fields = structure_fields_by_ref("s-user", &index, None);
    let paths: Vec<&str> = fields.iter().map(|field| field.path.as_str()).collect();
    assert_eq!(paths, vec!["name", "age", "address", "address.city"]);

    let age = fields.iter().find(|field| field.path == "age").unwrap();
    assert_eq!(age.ty, TypeRef::Primitive(ScalarType::Number));
    let address = fields.iter().find(|field| field.path == "address").unwrap();
    assert_eq!(address.ty, TypeRef::Struct("s-address".to_string()));
}

#[test]
fn self_referential_structures_expand_one_level() {
    let structures = vec![structure(serde_json::json!({
        "id": "s-tree",
        "name": "TreeNode",
        "fields": [
            { "name": "value", "type": "string" },
            { "name": "parent", "type": "object", "refStructure": "s-tree" },
        ],
    }))];
    let index = StructureIndex::new(&structures);

    let fields = structure_fields_by_ref("s-tree", &index, None);
    let paths: Vec<&str> = fields.iter().map(|field| field.path.as_str()).collect();
    assert_eq!(paths, vec!["value", "parent"]);

    // The cyclic field is truncated to a bare object.
    let parent = fields.iter().find(|field| field.path == "parent").unwrap();
    assert_eq!(parent.ty, TypeRef::Primitive(ScalarType::Object));
}

#[test]
fn unknown_and_generic_refs_resolve_to_nothing() {
    let index = StructureIndex::new(&[]);
    assert!(structure_fields_by_ref("missing", &index, None).is_empty());
    assert!(structure_fields_by_ref("generic:T", &index, None).is_empty());
    assert!(structure_fields_by_ref("", &index, None).is_empty());
}

#[test]
fn ancestors_are_nearest_first_and_include_the_target() {
    // a -> b -> d, a -> c -> d
    let edges = vec![edge("a", "b"), edge("a", "c"), edge("b", "d"), edge("c", "d")];
    assert_eq!(graph::ancestors("d", &edges), vec!["d", "b", "c", "a"]);
    assert_eq!(graph::descendants("a", &edges), vec!["a", "b", "c", "d"]);
}

#[test]
fn traversal_terminates_on_cycles() {
    let edges = vec![edge("a", "b"), edge("b", "a")];
    assert_eq!(graph::ancestors("a", &edges), vec!["a", "b"]);
    assert_eq!(graph::descendants("a", &edges), vec!["a", "b"]);
}

#[test]
fn expression_key_takes_the_first_reference() {
    assert_eq!(
        expression_key("{{nodes.api.body}}"),
        Some("nodes.api.body".to_string())
    );
    assert_eq!(
        expression_key("prefix {{ var.total }} and {{var.other}}"),
        Some("var.total".to_string())
    );
    assert_eq!(expression_key("no reference"), None);
}

#[test]
fn references_reduce_to_the_last_segment() {
    let config = serde_json::json!({
        "url": "https://api/{{input.userId}}",
        "headers": [
            { "value": "{{nodes.api.body}}" },
            { "value": "{{input.userId}}" },
        ],
        "count": 3,
        "flag": true,
    });
    assert_eq!(extract_references(&config), vec!["userId", "body"]);
    assert_eq!(
        extract_reference_paths(&config),
        vec!["input.userId", "nodes.api.body"]
    );
}

#[test]
fn required_inputs_match_on_the_reduced_name() {
    let graph = simple_flow();
    let NodeKind::Start(start) = &graph.start_node().unwrap().kind else {
        panic!("expected a start node");
    };
    let config = serde_json::json!({ "url": "https://api/{{input.userId}}" });
    let inputs = required_inputs(&config, &start.variables);
    assert_eq!(inputs.len(), 1);
    assert_eq!(inputs[0].name, "userId");

    let unrelated = serde_json::json!({ "url": "https://api/{{var.other}}" });
    assert!(required_inputs(&unrelated, &start.variables).is_empty());
}

#[test]
fn snapshot_errors_render_their_context() {
    let error = FlowGraph::from_json("not json").unwrap_err();
    assert!(error.to_string().contains("flow snapshot"));

    let missing = SnapshotError::NodeNotFound("node-7".to_string());
    assert!(missing.to_string().contains("node-7"));
}

#[test]
fn unknown_node_types_are_rejected_at_the_boundary() {
    let result = FlowGraph::from_json(
        r#"{ "nodes": [{ "id": "x", "nodeType": "teleport", "config": {} }], "edges": [] }"#,
    );
    assert!(result.is_err());
}

#[test]
fn missing_config_deserializes_as_empty() {
    let graph =
        FlowGraph::from_json(r#"{ "nodes": [{ "id": "c", "nodeType": "condition" }], "edges": [] }"#)
            .unwrap();
    assert!(matches!(graph.node("c").unwrap().kind, NodeKind::Condition(_)));
}

#[test]
fn resolve_type_ref_erases_generics_and_resolves_structs() {
    let structures = user_structures();
    let index = StructureIndex::new(&structures);

    assert_eq!(
        types::resolve_type_ref("struct:s-user", &index),
        Some("UserVO".to_string())
    );
    assert_eq!(types::resolve_type_ref("struct:missing", &index), None);
    assert_eq!(
        types::resolve_type_ref("generic:T", &index),
        Some("object".to_string())
    );
    assert_eq!(
        types::resolve_type_ref("number", &index),
        Some("number".to_string())
    );
}
