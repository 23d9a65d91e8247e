//! Common test utilities for building flow graphs and snapshot data.
use suiron::prelude::*;

/// Builds a node from its wire representation.
#[allow(dead_code)]
pub fn node(id: &str, node_type: &str, config: serde_json::Value) -> Node {
    serde_json::from_value(serde_json::json!({
        "id": id,
        "label": id,
        "nodeType": node_type,
        "config": config,
    }))
    .expect("valid node JSON")
}

/// Same as [`node`], with an explicit display label.
#[allow(dead_code)]
pub fn labeled_node(id: &str, label: &str, node_type: &str, config: serde_json::Value) -> Node {
    serde_json::from_value(serde_json::json!({
        "id": id,
        "label": label,
        "nodeType": node_type,
        "config": config,
    }))
    .expect("valid node JSON")
}

#[allow(dead_code)]
pub fn edge(source: &str, target: &str) -> Edge {
    serde_json::from_value(serde_json::json!({ "source": source, "target": target }))
        .expect("valid edge JSON")
}

/// Edges for a linear chain of node ids.
#[allow(dead_code)]
pub fn chain(ids: &[&str]) -> Vec<Edge> {
    ids.windows(2).map(|pair| edge(pair[0], pair[1])).collect()
}

#[allow(dead_code)]
pub fn graph(nodes: Vec<Node>, edges: Vec<Edge>) -> FlowGraph {
    FlowGraph { nodes, edges }
}

/// A Start node declaring the given input variables.
#[allow(dead_code)]
pub fn start_node(variables: serde_json::Value) -> Node {
    node("start", "start", serde_json::json!({ "variables": variables }))
}

#[allow(dead_code)]
pub fn structure(value: serde_json::Value) -> StructureDefinition {
    serde_json::from_value(value).expect("valid structure JSON")
}

/// `UserVO { name: string, age: number, address: AddressVO }` plus
/// `AddressVO { city: string }`.
#[allow(dead_code)]
pub fn user_structures() -> Vec<StructureDefinition> {
    vec![
        structure(serde_json::json!({
            "id": "s-user",
            "name": "UserVO",
            "fullName": "com.example.UserVO",
            "fields": [
                { "name": "name", "type": "string" },
                { "name": "age", "type": "integer" },
                { "name": "address", "type": "object", "refStructure": "s-address" },
            ],
        })),
        structure(serde_json::json!({
            "id": "s-address",
            "name": "AddressVO",
            "fields": [
                { "name": "city", "type": "string" },
            ],
        })),
    ]
}

/// A generic `PageResult<T> { total: number, records: T[] }`.
#[allow(dead_code)]
pub fn page_result_structure() -> StructureDefinition {
    structure(serde_json::json!({
        "id": "s-page",
        "name": "PageResult",
        "isGeneric": true,
        "typeParameters": [{ "name": "T" }],
        "fields": [
            { "name": "total", "type": "number" },
            { "name": "records", "type": "array", "itemType": "T" },
        ],
    }))
}

/// `Start(userId: number) -> api -> end`.
#[allow(dead_code)]
pub fn simple_flow() -> FlowGraph {
    graph(
        vec![
            start_node(serde_json::json!([
                { "name": "userId", "label": "User id", "type": "number", "required": true },
            ])),
            node("api", "api", serde_json::json!({})),
            node("end", "end", serde_json::json!({})),
        ],
        chain(&["start", "api", "end"]),
    )
}
