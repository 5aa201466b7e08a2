//! Explicit port lists.
//!
//! Every node kind declares its connections through [`PortSource`]. The
//! connectivity builder only ever sees a node through this trait, so the set
//! of nodes reachable from an entry point is discovered generically without
//! knowing anything about concrete node kinds.

use serde::{Deserialize, Serialize};

use crate::id::NodeId;
use crate::member::MemberRef;

/// An outgoing control-flow connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FlowPort {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<NodeId>,
}

impl FlowPort {
    pub fn new(name: &str, target: Option<NodeId>) -> Self {
        FlowPort {
            name: name.to_string(),
            target,
        }
    }
}

/// A data input: a named slot holding a member reference.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ValuePort {
    pub name: String,
    pub value: MemberRef,
}

impl ValuePort {
    pub fn new(name: &str, value: MemberRef) -> Self {
        ValuePort {
            name: name.to_string(),
            value,
        }
    }
}

/// Every connection a node owns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NodePorts {
    /// Outgoing flow ports, in port order.
    pub flow_outputs: Vec<FlowPort>,
    /// Value inputs, in port order.
    pub value_inputs: Vec<ValuePort>,
    /// Entry nodes of embedded sub-graphs (a lambda body, a state scope).
    pub children: Vec<NodeId>,
    /// Nodes referenced without a port, e.g. a unit whose status is polled.
    pub references: Vec<NodeId>,
}

impl NodePorts {
    pub fn flow(mut self, name: &str, target: Option<NodeId>) -> Self {
        self.flow_outputs.push(FlowPort::new(name, target));
        self
    }

    pub fn value(mut self, name: &str, value: MemberRef) -> Self {
        self.value_inputs.push(ValuePort::new(name, value));
        self
    }

    pub fn child(mut self, entry: Option<NodeId>) -> Self {
        self.children.extend(entry);
        self
    }

    pub fn reference(mut self, node: Option<NodeId>) -> Self {
        self.references.extend(node);
        self
    }

    /// Connected flow targets, in port order.
    pub fn flow_targets(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.flow_outputs.iter().filter_map(|p| p.target)
    }

    /// Nodes read through value inputs, deduplicated, in port order.
    pub fn value_sources(&self) -> Vec<NodeId> {
        let mut out: Vec<NodeId> = Vec::new();
        for port in &self.value_inputs {
            for id in port.value.node_references() {
                if !out.contains(&id) {
                    out.push(id);
                }
            }
        }
        out
    }
}

/// The port contract every node kind implements.
pub trait PortSource {
    /// Human readable name used in diagnostics and generated comments.
    fn title(&self) -> String;

    /// `true` for nodes that take part in control flow, `false` for pure
    /// value nodes.
    fn is_flow(&self) -> bool;

    fn ports(&self) -> NodePorts;

    /// The node suspends execution (waits, yields) and therefore has to run
    /// inside a resumable unit.
    fn requires_suspension(&self) -> bool {
        false
    }

    /// The node owns a stateful sub-graph: every flow node inside its
    /// children is emitted as a resumable unit.
    fn is_stateful_scope(&self) -> bool {
        false
    }

    /// Index into [`NodePorts::flow_outputs`] of the port that continues the
    /// chain after this node's own statements. The generator follows this
    /// port itself; the node emits every other flow output.
    fn continuation(&self) -> Option<usize> {
        None
    }
}

impl<T: PortSource + ?Sized> PortSource for Box<T> {
    fn title(&self) -> String {
        (**self).title()
    }

    fn is_flow(&self) -> bool {
        (**self).is_flow()
    }

    fn ports(&self) -> NodePorts {
        (**self).ports()
    }

    fn requires_suspension(&self) -> bool {
        (**self).requires_suspension()
    }

    fn is_stateful_scope(&self) -> bool {
        (**self).is_stateful_scope()
    }

    fn continuation(&self) -> Option<usize> {
        (**self).continuation()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::literal::Literal;

    #[test]
    fn flow_targets_skip_unconnected_ports() {
        let ports = NodePorts::default()
            .flow("true", Some(NodeId(2)))
            .flow("false", None)
            .flow("next", Some(NodeId(3)));
        assert_eq!(ports.flow_targets().collect::<Vec<_>>(), vec![NodeId(2), NodeId(3)]);
    }

    #[test]
    fn value_sources_are_deduplicated() {
        let ports = NodePorts::default()
            .value("a", MemberRef::output(NodeId(5)))
            .value("b", MemberRef::Literal(Literal::int(1)))
            .value("c", MemberRef::NodeOutput { node: NodeId(5), port: 1 })
            .value("d", MemberRef::output(NodeId(6)));
        assert_eq!(ports.value_sources(), vec![NodeId(5), NodeId(6)]);
    }

    #[test]
    fn child_and_reference_ignore_none() {
        let ports = NodePorts::default().child(None).reference(Some(NodeId(1)));
        assert!(ports.children.is_empty());
        assert_eq!(ports.references, vec![NodeId(1)]);
    }
}
