//! Shared fixtures for unit tests.

use flowgen_core::decl::{ClassDecl, EventDecl};
use flowgen_core::graph::NodeGraph;
use flowgen_core::id::{DeclId, NodeId};
use flowgen_core::member::{MemberItem, MemberRef};
use flowgen_core::types::TypeRef;

use crate::builtin::BuiltinNode;
use crate::context::GenerationContext;
use crate::node::{boxed, Graph};
use crate::GeneratorConfig;

pub fn empty_graph() -> Graph {
    Graph::new("Test", ClassDecl::new("Test"))
}

/// Runs `f` against a prepared context for `graph`.
pub fn with_cx<R>(graph: &Graph, f: impl FnOnce(&mut GenerationContext<'_>) -> R) -> R {
    let config = GeneratorConfig::default();
    let mut cx = GenerationContext::new(graph, &config).expect("test graph builds");
    cx.prepare().expect("test graph prepares");
    f(&mut cx)
}

/// `Name();` on the generated class, continuing to `next`.
pub fn call_node(name: &str, next: Option<u32>) -> BuiltinNode {
    BuiltinNode::Invoke {
        call: MemberRef::this_chain(vec![MemberItem::method(name, TypeRef::Void, vec![], vec![])]),
        next: next.map(NodeId),
    }
}

/// Class `Test` with an `Update` event entered at the first node.
pub fn event_graph(nodes: Vec<(u32, BuiltinNode)>) -> Graph {
    let mut class = ClassDecl::new("Test");
    class.events.push(EventDecl {
        id: DeclId(100),
        name: "Update".into(),
        params: vec![],
        entry: nodes.first().map(|(id, _)| NodeId(*id)),
    });
    let mut graph = NodeGraph::new("Test", class);
    for (id, node) in nodes {
        graph
            .insert(NodeId(id), node)
            .expect("test graphs use unique ids");
    }
    boxed(graph)
}

/// Generated source of `graph` with the default configuration.
pub fn generate_source(graph: &Graph) -> String {
    let (artifact, diagnostics) =
        crate::driver::generate_graph(graph, &GeneratorConfig::default()).expect("graph generates");
    assert!(diagnostics.is_empty(), "{diagnostics:?}");
    artifact.source
}
