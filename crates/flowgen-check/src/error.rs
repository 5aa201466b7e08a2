//! Analysis error types.
//!
//! Every variant carries the [`NodeId`] it is about so callers can attach the
//! owning declaration when reporting.

use flowgen_core::id::NodeId;
use serde::{Deserialize, Serialize};

/// Errors produced while building connectivity or classifying nodes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, thiserror::Error)]
pub enum AnalysisError {
    /// A connection (or an entry point, when `referrer` is `None`) targets a
    /// node that does not exist. Only reported in strict mode.
    #[error("unresolved target: node {target} referenced by {}", referrer.map(|r| format!("node {r}")).unwrap_or_else(|| "an entry point".to_string()))]
    UnresolvedTarget {
        target: NodeId,
        referrer: Option<NodeId>,
    },

    /// A query named a node that is not part of the connectivity table.
    #[error("node {node} is not reachable from any entry point")]
    UnknownNode { node: NodeId },

    /// State classification changed after class-body emission began.
    #[error("cannot register node {node} as state: classification is sealed")]
    ClassificationSealed { node: NodeId },

    /// Flow output ports are addressed with 16-bit indices.
    #[error("node {node} has flow output port {port}, beyond the addressable range")]
    PortOutOfRange { node: NodeId, port: usize },

    /// Only flow nodes can run as suspended units.
    #[error("node {node} is a value node and cannot be registered as state")]
    NotAFlowNode { node: NodeId },
}
