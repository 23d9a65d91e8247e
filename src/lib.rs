//! # Suiron - Variable Resolution and Type Inference for Node Graphs
//!
//! **Suiron** computes, for any node of a dataflow graph, the complete set of
//! variables visible to it: inputs declared on the Start node, outputs of
//! every upstream node, constants, enums, and locally assigned flow
//! variables. Each variable carries a structural type (primitive, generic
//! parameter, named structure, or a collection around any of those), and the
//! engine derives the result types of user-authored transform and assignment
//! operations.
//!
//! The engine predicts types and visibility; it never executes anything.
//! `{{...}}` expression templates are only scanned, never evaluated.
//!
//! ## Core Workflow
//!
//! 1. **Load snapshots**: deserialize the flow graph, structure definitions,
//!    constants, enums and reusable subflows from the editor's JSON.
//! 2. **Build a catalog**: [`catalog::CatalogBuilder`] walks the target
//!    node's ancestors and emits one variable group per origin, with all
//!    structure references recursively expanded.
//! 3. **Drive the editor**: the grouped variables feed selector widgets, the
//!    transform table ([`transform::operations_for`]) feeds the per-type
//!    operation menu, and [`template::extract_references`] derives the
//!    required inputs for debug execution.
//!
//! Every function is a pure, synchronous computation over its input
//! snapshots: identical inputs always yield identical outputs, so callers
//! can memoize freely. Failures degrade instead of propagating — a missing
//! structure or an unparseable subflow produces a smaller catalog, not an
//! error.
//!
//! ## Quick Start
//!
//! ```
//! use suiron::prelude::*;
//!
//! # fn main() -> Result<()> {
//! let graph: FlowGraph = serde_json::from_str(
//!     r#"{
//!       "nodes": [
//!         {"id": "start", "label": "Start", "nodeType": "start",
//!          "config": {"variables": [
//!            {"name": "userId", "label": "User id", "type": "number", "required": true}
//!          ]}},
//!         {"id": "api", "label": "Fetch user", "nodeType": "api", "config": {}},
//!         {"id": "end", "label": "Done", "nodeType": "end", "config": {}}
//!       ],
//!       "edges": [
//!         {"source": "start", "target": "api"},
//!         {"source": "api", "target": "end"}
//!       ]
//!     }"#,
//! )?;
//!
//! let builder = CatalogBuilder::new(&graph, &[], &[], &[], &[]);
//! let catalog = builder.build("end");
//!
//! // The end node sees the start input and the API node's outputs.
//! assert!(catalog.find_by_key("input.userId").is_some());
//! assert!(catalog.find_by_key("nodes.api.statusCode").is_some());
//! # Ok(())
//! # }
//! ```

pub mod catalog;
pub mod error;
pub mod flow;
pub mod graph;
pub mod prelude;
pub mod structures;
pub mod template;
pub mod transform;
pub mod types;
