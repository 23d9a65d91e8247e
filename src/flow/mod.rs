//! The node-graph snapshot the engine computes over.
//!
//! A node's kind is a tagged union: each kind carries its own strongly typed
//! configuration, and every per-kind dispatch in the engine is an exhaustive
//! match over [`NodeKind`].

mod config;

pub use config::*;

use crate::error::SnapshotError;
use serde::de::{self, Deserializer};
use serde::Deserialize;

/// One step of a flow.
#[derive(Debug, Clone)]
pub struct Node {
    pub id: String,
    pub label: String,
    pub kind: NodeKind,
}

/// The discriminated configuration of a node.
#[derive(Debug, Clone)]
pub enum NodeKind {
    Start(StartConfig),
    End(EndConfig),
    Api(ApiConfig),
    Kafka(KafkaConfig),
    Code(CodeConfig),
    Condition(ConditionConfig),
    Transform(TransformConfig),
    Subflow(SubflowConfig),
    ForEach(ForEachConfig),
    Llm(LlmConfig),
    VectorStore(VectorStoreConfig),
    VariableAssigner(VariableAssignerConfig),
    JsonParser(JsonParserConfig),
    Simhash(SimhashConfig),
    KeywordMatch(KeywordMatchConfig),
    Note(NoteConfig),
}

impl NodeKind {
    /// The wire name of this kind.
    pub fn name(&self) -> &'static str {
        match self {
            NodeKind::Start(_) => "start",
            NodeKind::End(_) => "end",
            NodeKind::Api(_) => "api",
            NodeKind::Kafka(_) => "kafka",
            NodeKind::Code(_) => "code",
            NodeKind::Condition(_) => "condition",
            NodeKind::Transform(_) => "transform",
            NodeKind::Subflow(_) => "subflow",
            NodeKind::ForEach(_) => "foreach",
            NodeKind::Llm(_) => "llm",
            NodeKind::VectorStore(_) => "vector_store",
            NodeKind::VariableAssigner(_) => "variable_assigner",
            NodeKind::JsonParser(_) => "json_parser",
            NodeKind::Simhash(_) => "simhash",
            NodeKind::KeywordMatch(_) => "keyword_match",
            NodeKind::Note(_) => "note",
        }
    }

    /// The output alias configured on this node, if its kind supports one.
    pub fn output_alias(&self) -> Option<&str> {
        let alias = match self {
            NodeKind::Api(config) => config.output_alias.as_deref(),
            NodeKind::Kafka(config) => config.output_alias.as_deref(),
            NodeKind::Code(config) => config.output_alias.as_deref(),
            NodeKind::Subflow(config) => config.output_alias.as_deref(),
            NodeKind::Llm(config) => config.output_alias.as_deref(),
            NodeKind::VectorStore(config) => config.output_alias.as_deref(),
            NodeKind::Simhash(config) => config.output_alias.as_deref(),
            NodeKind::KeywordMatch(config) => config.output_alias.as_deref(),
            _ => None,
        };
        alias.map(str::trim).filter(|alias| !alias.is_empty())
    }

    /// The typed output schema declared on this node, if its kind supports
    /// one.
    pub fn output_schema(&self) -> Option<&OutputSchemaConfig> {
        match self {
            NodeKind::Api(config) => Some(&config.schema),
            NodeKind::Kafka(config) => Some(&config.schema),
            NodeKind::Code(config) => Some(&config.schema),
            NodeKind::Llm(config) => Some(&config.schema),
            NodeKind::VectorStore(config) => Some(&config.schema),
            _ => None,
        }
    }
}

impl Node {
    /// Group label shown for this node's outputs.
    pub fn display_label(&self) -> &str {
        if self.label.is_empty() {
            &self.id
        } else {
            &self.label
        }
    }
}

// The editor serializes nodes as `{ id, label, nodeType, config }`. A missing
// config is treated as empty rather than rejected.
impl<'de> Deserialize<'de> for Node {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(rename_all = "camelCase")]
        struct RawNode {
            id: String,
            #[serde(default)]
            label: String,
            node_type: String,
            #[serde(default)]
            config: Option<serde_json::Value>,
        }

        let raw = RawNode::deserialize(deserializer)?;
        let config = raw
            .config
            .unwrap_or_else(|| serde_json::Value::Object(Default::default()));

        fn parse<'a, T, E>(config: serde_json::Value) -> Result<T, E>
        where
            T: serde::de::DeserializeOwned,
            E: de::Error,
        {
            serde_json::from_value(config).map_err(de::Error::custom)
        }

        let kind = match raw.node_type.as_str() {
            "start" => NodeKind::Start(parse(config)?),
            "end" => NodeKind::End(parse(config)?),
            "api" => NodeKind::Api(parse(config)?),
            "kafka" => NodeKind::Kafka(parse(config)?),
            "code" => NodeKind::Code(parse(config)?),
            "condition" => NodeKind::Condition(parse(config)?),
            "transform" => NodeKind::Transform(parse(config)?),
            "subflow" => NodeKind::Subflow(parse(config)?),
            "foreach" => NodeKind::ForEach(parse(config)?),
            "llm" => NodeKind::Llm(parse(config)?),
            "vector_store" => NodeKind::VectorStore(parse(config)?),
            "variable_assigner" => NodeKind::VariableAssigner(parse(config)?),
            "json_parser" => NodeKind::JsonParser(parse(config)?),
            "simhash" => NodeKind::Simhash(parse(config)?),
            "keyword_match" => NodeKind::KeywordMatch(parse(config)?),
            "note" => NodeKind::Note(parse(config)?),
            other => {
                return Err(de::Error::custom(format!(
                    "unknown node type '{other}' on node '{}'",
                    raw.id
                )));
            }
        };

        Ok(Node {
            id: raw.id,
            label: raw.label,
            kind,
        })
    }
}

/// A directed connection between two nodes. Multiple edges may share a
/// source; `source_handle` disambiguates branch outputs.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Edge {
    pub source: String,
    pub target: String,
    #[serde(default)]
    pub source_handle: Option<String>,
}

/// A full snapshot of a flow's nodes and edges.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FlowGraph {
    #[serde(default)]
    pub nodes: Vec<Node>,
    #[serde(default)]
    pub edges: Vec<Edge>,
}

impl FlowGraph {
    pub fn from_json(json: &str) -> Result<FlowGraph, SnapshotError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn node(&self, node_id: &str) -> Option<&Node> {
        self.nodes.iter().find(|node| node.id == node_id)
    }

    pub fn start_node(&self) -> Option<&Node> {
        self.nodes
            .iter()
            .find(|node| matches!(node.kind, NodeKind::Start(_)))
    }
}

/// A reusable flow referenced by subflow nodes. `graph_data` holds the
/// serialized graph JSON of the flow.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubflowDefinition {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub graph_data: Option<String>,
}

/// A named constant scoped to the project or, when `flow_id` is set, to one
/// flow.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConstantDefinition {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub value_type: Option<String>,
    #[serde(default)]
    pub value: Option<serde_json::Value>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub flow_id: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumValue {
    #[serde(default)]
    pub value: String,
    #[serde(default)]
    pub label: String,
}

/// A named enumeration; referenced by value in node configurations.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnumDefinition {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub values: Vec<EnumValue>,
}
