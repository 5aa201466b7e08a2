//! Core error types for flowgen-core.
//!
//! Uses `thiserror` for structured, matchable error variants covering the
//! failure modes of the graph data model.

use crate::id::{DeclId, NodeId};
use thiserror::Error;

/// Core errors produced by the flowgen-core crate.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A node id was not found in the graph.
    #[error("node not found: NodeId({id})", id = id.0)]
    NodeNotFound { id: NodeId },

    /// Inserting a node whose id is already taken.
    #[error("duplicate node id: NodeId({id})", id = id.0)]
    DuplicateNode { id: NodeId },

    /// A declaration id was not found in the class declaration.
    #[error("declaration not found: DeclId({id})", id = id.0)]
    DeclNotFound { id: DeclId },

    /// Two declarations share the same id.
    #[error("duplicate declaration id: DeclId({id})", id = id.0)]
    DuplicateDecl { id: DeclId },

    /// A graph document could not be parsed.
    #[error("invalid graph document: {0}")]
    InvalidDocument(#[from] serde_json::Error),
}
