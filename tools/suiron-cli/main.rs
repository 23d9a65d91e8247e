use clap::Parser;
use std::fs;
use std::process;
use std::time::Instant;
use suiron::catalog::CatalogBuilder;
use suiron::flow::{ConstantDefinition, EnumDefinition, FlowGraph, SubflowDefinition};
use suiron::structures::StructureDefinition;
use suiron::template::{extract_references, required_inputs};

/// Inspect the variables visible to a node of a flow graph.
#[derive(Parser, Debug)]
#[command(name = "suiron-cli", version, about)]
struct Args {
    /// Path to the flow graph JSON (nodes + edges).
    flow: String,

    /// Id of the node to compute the catalog for.
    #[arg(short, long)]
    node: String,

    /// Path to a JSON array of structure definitions.
    #[arg(long)]
    structures: Option<String>,

    /// Path to a JSON array of constant definitions.
    #[arg(long)]
    constants: Option<String>,

    /// Path to a JSON array of enum definitions.
    #[arg(long)]
    enums: Option<String>,

    /// Path to a JSON array of reusable subflow definitions.
    #[arg(long)]
    subflows: Option<String>,

    /// Also print the `{{...}}` references used by the node's configuration
    /// and the start inputs they require.
    #[arg(long)]
    refs: bool,
}

fn load_list<T: serde::de::DeserializeOwned>(path: Option<&str>, what: &str) -> Vec<T> {
    let Some(path) = path else {
        return Vec::new();
    };
    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(error) => {
            eprintln!("error: cannot read {what} file '{path}': {error}");
            process::exit(1);
        }
    };
    match serde_json::from_str(&content) {
        Ok(list) => list,
        Err(error) => {
            eprintln!("error: cannot parse {what} file '{path}': {error}");
            process::exit(1);
        }
    }
}

fn main() {
    let args = Args::parse();

    let flow_json = match fs::read_to_string(&args.flow) {
        Ok(content) => content,
        Err(error) => {
            eprintln!("error: cannot read flow file '{}': {error}", args.flow);
            process::exit(1);
        }
    };
    let graph = match FlowGraph::from_json(&flow_json) {
        Ok(graph) => graph,
        Err(error) => {
            eprintln!("error: {error}");
            process::exit(1);
        }
    };
    if graph.node(&args.node).is_none() {
        eprintln!(
            "error: {}",
            suiron::error::SnapshotError::NodeNotFound(args.node.clone())
        );
        process::exit(1);
    }

    let structures: Vec<StructureDefinition> =
        load_list(args.structures.as_deref(), "structures");
    let constants: Vec<ConstantDefinition> = load_list(args.constants.as_deref(), "constants");
    let enums: Vec<EnumDefinition> = load_list(args.enums.as_deref(), "enums");
    let subflows: Vec<SubflowDefinition> = load_list(args.subflows.as_deref(), "subflows");

    let start = Instant::now();
    let builder = CatalogBuilder::new(&graph, &structures, &constants, &enums, &subflows);
    let catalog = builder.build(&args.node);
    let elapsed = start.elapsed();

    println!("Catalog for node '{}' ({:.2?})", args.node, elapsed);
    for group in &catalog.groups {
        println!("\n  [{}]", group.name);
        for variable in &group.variables {
            println!(
                "    {{{{{}}}}}  {}",
                variable.key,
                variable.type_label(builder.index())
            );
        }
    }

    if !catalog.warnings.is_empty() {
        println!("\nWarnings:");
        for warning in &catalog.warnings {
            println!("  - {warning}");
        }
    }

    if args.refs {
        print_references(&flow_json, &graph, &args.node);
    }
}

/// References need the raw configuration JSON, which the typed graph does
/// not retain; re-read it from the flow document.
fn print_references(flow_json: &str, graph: &FlowGraph, node_id: &str) {
    let document: serde_json::Value = match serde_json::from_str(flow_json) {
        Ok(document) => document,
        Err(_) => return,
    };
    let config = document
        .get("nodes")
        .and_then(|nodes| nodes.as_array())
        .and_then(|nodes| {
            nodes
                .iter()
                .find(|node| node.get("id").and_then(|id| id.as_str()) == Some(node_id))
        })
        .and_then(|node| node.get("config"))
        .cloned()
        .unwrap_or(serde_json::Value::Null);

    let references = extract_references(&config);
    println!("\nReferenced names:");
    if references.is_empty() {
        println!("  (none)");
    }
    for name in &references {
        println!("  - {name}");
    }

    if let Some(start) = graph.start_node() {
        if let suiron::flow::NodeKind::Start(start_config) = &start.kind {
            let inputs = required_inputs(&config, &start_config.variables);
            println!("\nRequired start inputs:");
            if inputs.is_empty() {
                println!("  (none)");
            }
            for input in inputs {
                println!("  - {} ({})", input.name, input.input_type);
            }
        }
    }
}
