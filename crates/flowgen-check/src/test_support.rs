//! Minimal node kind for analysis tests.

use flowgen_core::decl::{ClassDecl, EventDecl};
use flowgen_core::graph::NodeGraph;
use flowgen_core::id::{DeclId, NodeId};
use flowgen_core::member::MemberRef;
use flowgen_core::port::{NodePorts, PortSource};

#[derive(Debug, Clone, Default)]
pub struct TestNode {
    pub is_flow: bool,
    pub next: Vec<NodeId>,
    pub reads: Vec<NodeId>,
    pub children: Vec<NodeId>,
    pub suspends: bool,
    pub scope: bool,
}

impl TestNode {
    pub fn flow(next: &[u32]) -> Self {
        TestNode {
            is_flow: true,
            next: next.iter().map(|n| NodeId(*n)).collect(),
            ..TestNode::default()
        }
    }

    pub fn value(reads: &[u32]) -> Self {
        TestNode {
            reads: reads.iter().map(|n| NodeId(*n)).collect(),
            ..TestNode::default()
        }
    }

    pub fn reading(mut self, reads: &[u32]) -> Self {
        self.reads = reads.iter().map(|n| NodeId(*n)).collect();
        self
    }

    pub fn with_children(mut self, children: &[u32]) -> Self {
        self.children = children.iter().map(|n| NodeId(*n)).collect();
        self
    }

    pub fn suspending(mut self) -> Self {
        self.suspends = true;
        self
    }

    pub fn stateful(mut self) -> Self {
        self.scope = true;
        self
    }
}

impl PortSource for TestNode {
    fn title(&self) -> String {
        "Test".to_string()
    }

    fn is_flow(&self) -> bool {
        self.is_flow
    }

    fn ports(&self) -> NodePorts {
        let mut ports = NodePorts::default();
        for (i, n) in self.next.iter().enumerate() {
            ports = ports.flow(&format!("out{i}"), Some(*n));
        }
        for (i, n) in self.reads.iter().enumerate() {
            ports = ports.value(&format!("in{i}"), MemberRef::output(*n));
        }
        for c in &self.children {
            ports = ports.child(Some(*c));
        }
        ports
    }

    fn requires_suspension(&self) -> bool {
        self.suspends
    }

    fn is_stateful_scope(&self) -> bool {
        self.scope
    }
}

/// A graph of the given nodes with a single event entry at `entry`.
pub fn graph_of(entry: u32, nodes: Vec<(u32, TestNode)>) -> NodeGraph<TestNode> {
    let mut class = ClassDecl::new("T");
    class.events.push(EventDecl {
        id: DeclId(0),
        name: "Start".into(),
        params: vec![],
        entry: Some(NodeId(entry)),
    });
    let mut graph = NodeGraph::new("T", class);
    for (id, node) in nodes {
        graph
            .insert(NodeId(id), node)
            .expect("test graphs use unique ids");
    }
    graph
}

/// `0 -> 1 -> ... -> n-1`, entered at 0.
pub fn chain_graph(n: u32) -> NodeGraph<TestNode> {
    let nodes = (0..n)
        .map(|i| {
            let next: Vec<u32> = if i + 1 < n { vec![i + 1] } else { vec![] };
            (i, TestNode::flow(&next))
        })
        .collect();
    graph_of(0, nodes)
}
