//! NodeGraph: the container the generator consumes.
//!
//! [`NodeGraph`] is generic over the node payload so the same container holds
//! a serializable node enum while a document is loaded and boxed node kinds
//! while code is generated ([`NodeGraph::map_nodes`] converts between them).
//! Nodes keep their insertion order; ids are stable and never reused.
//!
//! [`GraphDocument`] is the on-disk JSON shape of a graph.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::decl::ClassDecl;
use crate::error::CoreError;
use crate::id::NodeId;

/// One graph: a class declaration plus the nodes its bodies are made of.
#[derive(Debug, Clone)]
pub struct NodeGraph<N> {
    pub name: String,
    pub class: ClassDecl,
    nodes: IndexMap<NodeId, N>,
    next_id: u32,
}

impl<N> NodeGraph<N> {
    pub fn new(name: &str, class: ClassDecl) -> Self {
        NodeGraph {
            name: name.to_string(),
            class,
            nodes: IndexMap::new(),
            next_id: 0,
        }
    }

    /// Adds a node under a fresh id.
    pub fn add(&mut self, node: N) -> NodeId {
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, node);
        id
    }

    /// Adds a node under a caller-chosen id.
    pub fn insert(&mut self, id: NodeId, node: N) -> Result<(), CoreError> {
        if self.nodes.contains_key(&id) {
            return Err(CoreError::DuplicateNode { id });
        }
        self.next_id = self.next_id.max(id.0 + 1);
        self.nodes.insert(id, node);
        Ok(())
    }

    /// Replaces the payload of an existing node.
    pub fn replace(&mut self, id: NodeId, node: N) -> Result<N, CoreError> {
        match self.nodes.get_mut(&id) {
            Some(slot) => Ok(std::mem::replace(slot, node)),
            None => Err(CoreError::NodeNotFound { id }),
        }
    }

    pub fn get(&self, id: NodeId) -> Option<&N> {
        self.nodes.get(&id)
    }

    pub fn node(&self, id: NodeId) -> Result<&N, CoreError> {
        self.nodes.get(&id).ok_or(CoreError::NodeNotFound { id })
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

    /// Nodes in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &N)> {
        self.nodes.iter().map(|(id, n)| (*id, n))
    }

    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.nodes.keys().copied()
    }

    /// Converts every node payload, keeping ids, order and declarations.
    pub fn map_nodes<M>(self, mut f: impl FnMut(N) -> M) -> NodeGraph<M> {
        NodeGraph {
            name: self.name,
            class: self.class,
            nodes: self.nodes.into_iter().map(|(id, n)| (id, f(n))).collect(),
            next_id: self.next_id,
        }
    }
}

// ---------------------------------------------------------------------------
// Documents
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeEntry<N> {
    pub id: NodeId,
    pub node: N,
}

/// Serialized form of a [`NodeGraph`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(deserialize = "N: Deserialize<'de>"))]
pub struct GraphDocument<N> {
    pub name: String,
    pub class: ClassDecl,
    #[serde(default)]
    pub nodes: Vec<NodeEntry<N>>,
}

impl<N> GraphDocument<N> {
    /// Builds the graph, rejecting duplicate node or declaration ids.
    pub fn into_graph(self) -> Result<NodeGraph<N>, CoreError> {
        self.class.validate()?;
        let mut graph = NodeGraph::new(&self.name, self.class);
        for entry in self.nodes {
            graph.insert(entry.id, entry.node)?;
        }
        Ok(graph)
    }

    pub fn from_graph(graph: NodeGraph<N>) -> Self {
        GraphDocument {
            name: graph.name,
            class: graph.class,
            nodes: graph
                .nodes
                .into_iter()
                .map(|(id, node)| NodeEntry { id, node })
                .collect(),
        }
    }
}

impl<N: for<'de> Deserialize<'de>> GraphDocument<N> {
    /// Parses a JSON document.
    pub fn from_json(text: &str) -> Result<Self, CoreError> {
        Ok(serde_json::from_str(text)?)
    }
}
