//! Connectivity table: who flows into whom, who reads whose value.
//!
//! [`ConnectivityTable::build`] starts at every entry point of a graph's class
//! declaration and walks flow ports, value inputs, nested sub-graph children
//! and plain node references. Each node is registered once. Connections are
//! stored twice: as per-node adjacency lists in [`NodeData`] for direct
//! lookups, and as a petgraph `StableGraph` for traversals.
//!
//! The table is built once per generation pass and not modified afterwards.
//! Flow reachability sets are derived lazily on first query.

use std::cell::OnceCell;
use std::collections::BTreeSet;

use flowgen_core::decl::EntryPoint;
use flowgen_core::graph::NodeGraph;
use flowgen_core::id::NodeId;
use flowgen_core::port::PortSource;
use indexmap::IndexMap;
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableGraph;
use petgraph::visit::EdgeRef;
use petgraph::{Directed, Direction};
use serde::{Deserialize, Serialize};

use crate::error::AnalysisError;

static EMPTY: BTreeSet<NodeId> = BTreeSet::new();

/// Edge weight of the connectivity graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Link {
    /// Control flow through output port `port` of the source node.
    Flow { port: u16 },
    /// The target reads the source's value.
    Value,
    /// The target is the entry of a sub-graph embedded in the source.
    Child,
    /// The source refers to the target without a port.
    Reference,
}

/// How a build treats connections to nodes that do not exist.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConnectivityOptions {
    /// Fail with [`AnalysisError::UnresolvedTarget`] instead of skipping.
    pub strict: bool,
}

/// Connectivity record of a single node.
#[derive(Debug, Clone)]
pub struct NodeData {
    pub id: NodeId,
    pub title: String,
    pub is_flow: bool,
    pub suspends: bool,
    pub stateful_scope: bool,
    /// Distinct flow successors in port order.
    pub flow_next: Vec<NodeId>,
    /// Distinct flow predecessors in discovery order.
    pub flow_prev: Vec<NodeId>,
    /// Number of incoming flow edges, counting repeated predecessors.
    pub flow_in_edges: usize,
    pub value_inputs: Vec<NodeId>,
    pub value_outputs: Vec<NodeId>,
    pub children: Vec<NodeId>,
    /// The node whose sub-graph this node is the entry of.
    pub parent: Option<NodeId>,
    pub references: Vec<NodeId>,
    /// Declarations whose body starts at this node.
    pub entries: Vec<EntryPoint>,
    index: NodeIndex<u32>,
    reach_out: OnceCell<BTreeSet<NodeId>>,
    reach_in: OnceCell<BTreeSet<NodeId>>,
}

impl NodeData {
    fn new<N: PortSource>(id: NodeId, node: &N, index: NodeIndex<u32>) -> Self {
        NodeData {
            id,
            title: node.title(),
            is_flow: node.is_flow(),
            suspends: node.requires_suspension(),
            stateful_scope: node.is_stateful_scope(),
            flow_next: Vec::new(),
            flow_prev: Vec::new(),
            flow_in_edges: 0,
            value_inputs: Vec::new(),
            value_outputs: Vec::new(),
            children: Vec::new(),
            parent: None,
            references: Vec::new(),
            entries: Vec::new(),
            index,
            reach_out: OnceCell::new(),
            reach_in: OnceCell::new(),
        }
    }
}

fn push_unique(list: &mut Vec<NodeId>, id: NodeId) {
    if !list.contains(&id) {
        list.push(id);
    }
}

/// Resolved connections of every node reachable from an entry point.
#[derive(Debug, Clone, Default)]
pub struct ConnectivityTable {
    nodes: IndexMap<NodeId, NodeData>,
    graph: StableGraph<NodeId, Link, Directed, u32>,
    entries: Vec<EntryPoint>,
}

impl ConnectivityTable {
    /// Walks `graph` from every entry point of its class declaration.
    pub fn build<N: PortSource>(
        graph: &NodeGraph<N>,
        options: ConnectivityOptions,
    ) -> Result<Self, AnalysisError> {
        let mut table = ConnectivityTable::default();
        let mut stack: Vec<NodeId> = Vec::new();

        for entry in graph.class.entry_points() {
            let Some(node) = graph.get(entry.node) else {
                unresolved(entry.node, None, options)?;
                continue;
            };
            if table.register(entry.node, node) {
                stack.push(entry.node);
            }
            table.entries.push(entry);
            if let Some(data) = table.nodes.get_mut(&entry.node) {
                data.entries.push(entry);
            }
        }

        while let Some(id) = stack.pop() {
            let Some(node) = graph.get(id) else { continue };
            let ports = node.ports();

            for (index, flow) in ports.flow_outputs.iter().enumerate() {
                let Some(target) = flow.target else { continue };
                let port = u16::try_from(index)
                    .map_err(|_| AnalysisError::PortOutOfRange { node: id, port: index })?;
                if !table.connect(graph, &mut stack, id, target, options)? {
                    continue;
                }
                table.add_link(id, target, Link::Flow { port });
                if let Some(data) = table.nodes.get_mut(&id) {
                    push_unique(&mut data.flow_next, target);
                }
                if let Some(data) = table.nodes.get_mut(&target) {
                    push_unique(&mut data.flow_prev, id);
                    data.flow_in_edges += 1;
                }
            }

            for source in ports.value_sources() {
                if !table.connect(graph, &mut stack, id, source, options)? {
                    continue;
                }
                table.add_link(source, id, Link::Value);
                if let Some(data) = table.nodes.get_mut(&id) {
                    push_unique(&mut data.value_inputs, source);
                }
                if let Some(data) = table.nodes.get_mut(&source) {
                    push_unique(&mut data.value_outputs, id);
                }
            }

            for child in ports.children {
                if !table.connect(graph, &mut stack, id, child, options)? {
                    continue;
                }
                table.add_link(id, child, Link::Child);
                if let Some(data) = table.nodes.get_mut(&id) {
                    push_unique(&mut data.children, child);
                }
                if let Some(data) = table.nodes.get_mut(&child) {
                    data.parent.get_or_insert(id);
                }
            }

            for reference in ports.references {
                if !table.connect(graph, &mut stack, id, reference, options)? {
                    continue;
                }
                table.add_link(id, reference, Link::Reference);
                if let Some(data) = table.nodes.get_mut(&id) {
                    push_unique(&mut data.references, reference);
                }
            }
        }

        tracing::debug!(
            nodes = table.nodes.len(),
            entries = table.entries.len(),
            "connectivity built for {}",
            graph.name
        );
        Ok(table)
    }

    /// Registers `id` if unseen. Returns `true` the first time.
    fn register<N: PortSource>(&mut self, id: NodeId, node: &N) -> bool {
        if self.nodes.contains_key(&id) {
            return false;
        }
        let index = self.graph.add_node(id);
        self.nodes.insert(id, NodeData::new(id, node, index));
        true
    }

    /// Makes sure `target` is registered, queueing it for a visit when new.
    /// Returns `false` when the target does not exist and was skipped.
    fn connect<N: PortSource>(
        &mut self,
        graph: &NodeGraph<N>,
        stack: &mut Vec<NodeId>,
        from: NodeId,
        target: NodeId,
        options: ConnectivityOptions,
    ) -> Result<bool, AnalysisError> {
        match graph.get(target) {
            Some(node) => {
                if self.register(target, node) {
                    stack.push(target);
                }
                Ok(true)
            }
            None => {
                unresolved(target, Some(from), options)?;
                Ok(false)
            }
        }
    }

    fn add_link(&mut self, from: NodeId, to: NodeId, link: Link) {
        if let (Some(a), Some(b)) = (self.nodes.get(&from), self.nodes.get(&to)) {
            self.graph.add_edge(a.index, b.index, link);
        }
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn get(&self, id: NodeId) -> Option<&NodeData> {
        self.nodes.get(&id)
    }

    pub fn node(&self, id: NodeId) -> Result<&NodeData, AnalysisError> {
        self.nodes.get(&id).ok_or(AnalysisError::UnknownNode { node: id })
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Records in visit order.
    pub fn iter(&self) -> impl Iterator<Item = &NodeData> {
        self.nodes.values()
    }

    /// Entry points that resolved to an existing node.
    pub fn entries(&self) -> &[EntryPoint] {
        &self.entries
    }

    /// The underlying petgraph graph; node weights are node ids.
    pub fn graph(&self) -> &StableGraph<NodeId, Link, Directed, u32> {
        &self.graph
    }

    /// Nodes reachable from `id` through one or more flow edges. Contains
    /// `id` itself only when `id` lies on a flow cycle.
    pub fn flow_reachable(&self, id: NodeId) -> &BTreeSet<NodeId> {
        match self.nodes.get(&id) {
            Some(data) => data
                .reach_out
                .get_or_init(|| self.walk_flow(data.index, Direction::Outgoing)),
            None => &EMPTY,
        }
    }

    /// Nodes that reach `id` through one or more flow edges.
    pub fn flow_reaching(&self, id: NodeId) -> &BTreeSet<NodeId> {
        match self.nodes.get(&id) {
            Some(data) => data
                .reach_in
                .get_or_init(|| self.walk_flow(data.index, Direction::Incoming)),
            None => &EMPTY,
        }
    }

    /// Flow nodes inside the sub-graphs embedded in `owner`: its children and
    /// everything they flow into.
    pub fn scope_members(&self, owner: NodeId) -> BTreeSet<NodeId> {
        let mut out = BTreeSet::new();
        let Some(data) = self.nodes.get(&owner) else {
            return out;
        };
        for &child in &data.children {
            out.insert(child);
            out.extend(self.flow_reachable(child).iter().copied());
        }
        out.retain(|id| self.nodes.get(id).is_some_and(|d| d.is_flow));
        out
    }

    /// A node reached by more than one flow edge or entry point. Regular
    /// nodes of this kind are emitted once and called from each site.
    pub fn is_shared(&self, id: NodeId) -> bool {
        self.nodes
            .get(&id)
            .is_some_and(|d| d.flow_in_edges + d.entries.len() > 1)
    }

    fn walk_flow(&self, start: NodeIndex<u32>, direction: Direction) -> BTreeSet<NodeId> {
        let mut seen = BTreeSet::new();
        let mut stack = vec![start];
        while let Some(index) = stack.pop() {
            for edge in self.graph.edges_directed(index, direction) {
                if !matches!(edge.weight(), Link::Flow { .. }) {
                    continue;
                }
                let next = match direction {
                    Direction::Outgoing => edge.target(),
                    Direction::Incoming => edge.source(),
                };
                if seen.insert(self.graph[next]) {
                    stack.push(next);
                }
            }
        }
        seen
    }
}

fn unresolved(
    target: NodeId,
    referrer: Option<NodeId>,
    options: ConnectivityOptions,
) -> Result<(), AnalysisError> {
    if options.strict {
        return Err(AnalysisError::UnresolvedTarget { target, referrer });
    }
    tracing::warn!(
        missing = target.0,
        referrer = referrer.map(|r| r.0),
        "skipping connection to missing node"
    );
    Ok(())
}
