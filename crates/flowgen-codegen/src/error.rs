//! Codegen error types covering all generation failure modes.

use flowgen_check::AnalysisError;
use flowgen_core::id::NodeId;
use flowgen_core::CoreError;
use serde::{Deserialize, Serialize};

/// Errors that can occur while generating source for a graph.
#[derive(Debug, thiserror::Error)]
pub enum CodegenError {
    /// A member reference could not be resolved to a declaration.
    #[error("unresolved reference in {declaration}: {reference}")]
    UnresolvedReference {
        reference: String,
        declaration: String,
    },

    /// A construct was used somewhere it is not supported.
    #[error("invalid target: {construct} {reason}")]
    InvalidTarget { construct: String, reason: String },

    /// A node asked to become state after class-body emission began.
    #[error("node {node} registered as state after class body emission began")]
    ClassificationOrder { node: NodeId },

    /// Begin/end markers in generated text do not pair up.
    #[error("malformed marker at line {line}, column {column}: {reason}")]
    MalformedMarker {
        line: usize,
        column: usize,
        reason: String,
    },

    /// A value node depends on its own value.
    #[error("value cycle through node {node}")]
    ValueCycle { node: NodeId },

    /// Any of the above, attributed to the node being emitted.
    #[error("node {node} in {owner}: {source}")]
    Node {
        node: NodeId,
        owner: String,
        #[source]
        source: Box<CodegenError>,
    },

    #[error("analysis failed: {0}")]
    Analysis(#[from] AnalysisError),

    #[error("graph error: {0}")]
    Core(#[from] CoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CodegenError {
    pub fn invalid(construct: impl Into<String>, reason: impl Into<String>) -> Self {
        CodegenError::InvalidTarget {
            construct: construct.into(),
            reason: reason.into(),
        }
    }

    /// Attributes the error to `node`. Errors that already carry a node keep
    /// the innermost one.
    pub fn in_node(self, node: NodeId, owner: &str) -> Self {
        match self {
            CodegenError::Node { .. } => self,
            other => CodegenError::Node {
                node,
                owner: owner.to_string(),
                source: Box::new(other),
            },
        }
    }

    /// The node an error is attributed to, if any.
    pub fn node(&self) -> Option<NodeId> {
        match self {
            CodegenError::Node { node, .. } => Some(*node),
            CodegenError::ClassificationOrder { node } | CodegenError::ValueCycle { node } => {
                Some(*node)
            }
            _ => None,
        }
    }

    /// The error without node attribution.
    pub fn root(&self) -> &CodegenError {
        match self {
            CodegenError::Node { source, .. } => source.root(),
            other => other,
        }
    }
}

/// A failure recorded instead of aborting a batched pass.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Name of the graph being generated.
    pub graph: String,
    /// `None` for failures outside any node, e.g. a graph that could not be
    /// analysed at all.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node: Option<NodeId>,
    /// Declaration whose body contained the node.
    pub owner: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn in_node_wraps_once() {
        let err = CodegenError::invalid("wait", "outside a state unit")
            .in_node(NodeId(3), "Update")
            .in_node(NodeId(1), "Update");
        assert_eq!(err.node(), Some(NodeId(3)));
        assert!(matches!(err.root(), CodegenError::InvalidTarget { .. }));
        assert_eq!(
            err.to_string(),
            "node 3 in Update: invalid target: wait outside a state unit"
        );
    }

    #[test]
    fn analysis_errors_convert() {
        let err: CodegenError = AnalysisError::UnknownNode { node: NodeId(2) }.into();
        assert!(err.to_string().contains("node 2"));
    }
}
