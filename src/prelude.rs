//! Prelude module for convenient imports
//!
//! Re-exports the most commonly used types and functions of the crate.
//!
//! # Example
//!
//! ```rust,no_run
//! use suiron::prelude::*;
//!
//! # fn run_example() -> Result<()> {
//! let graph_json = std::fs::read_to_string("path/to/flow.json")?;
//! let graph = FlowGraph::from_json(&graph_json)?;
//!
//! let builder = CatalogBuilder::new(&graph, &[], &[], &[], &[]);
//! let catalog = builder.build("some-node-id");
//! for group in &catalog.groups {
//!     println!("{} ({} variables)", group.name, group.variables.len());
//! }
//! # Ok(())
//! # }
//! ```

// Catalog computation
pub use crate::catalog::{
    available_generic_params, BuildOptions, Catalog, CatalogBuilder, CatalogWarning, Variable,
    VariableGroup,
};

// Graph snapshot types
pub use crate::flow::{
    AssignmentItem, AssignmentMode, ConstantDefinition, Edge, EnumDefinition, FlowGraph,
    InputVariable, Node, NodeKind, SubflowDefinition,
};

// Type model
pub use crate::types::{
    display_type, extract_element_type, normalize_struct_ref, CollectionKind, ScalarType, TypeRef,
};

// Structures
pub use crate::structures::{StructureDefinition, StructureIndex};

// Transform engine
pub use crate::transform::{
    compute_result_type, infer_source_type_info, operations_for, SourceDataType, SourceTypeInfo,
    TransformOperation,
};

// Template scanning
pub use crate::template::{extract_references, required_inputs};

// Error types
pub use crate::error::SnapshotError;

// Result type alias for convenience
pub type Result<T> = std::result::Result<T, Box<dyn std::error::Error>>;
