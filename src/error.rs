use thiserror::Error;

/// Errors at the snapshot parse boundary.
///
/// The engine core is fail-soft and never returns errors: a missing
/// structure, an unparseable subflow or an unknown operation all degrade to
/// a best-effort value. Only feeding malformed JSON into the engine is
/// reported as an error, and only at the boundary where that JSON enters.
#[derive(Error, Debug)]
pub enum SnapshotError {
    #[error("failed to parse flow snapshot JSON: {0}")]
    GraphParse(#[from] serde_json::Error),

    #[error("flow snapshot has no node with id '{0}'")]
    NodeNotFound(String),
}
