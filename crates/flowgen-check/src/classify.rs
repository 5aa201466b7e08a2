//! Node classification: regular (inlined) vs state (out-of-line unit).
//!
//! A flow node is *state* when it, or anything it flows into, is a seed:
//!
//! - explicitly registered through [`Classifier::register_state`],
//! - a node that requires suspension,
//! - a node on a flow cycle back to itself,
//! - a flow node inside the sub-graph of a stateful scope.
//!
//! State-ness spreads backwards along flow edges only. A node that merely
//! reads a state node's value stays regular.
//!
//! Queries are memoized until the next registration. [`Classifier::seal`]
//! freezes the result before any class body is emitted; registering after
//! that is an error, since regular nodes may already be inlined.

use std::collections::{BTreeSet, HashMap};

use flowgen_core::id::NodeId;

use crate::connectivity::ConnectivityTable;
use crate::error::AnalysisError;

/// The frozen outcome of classification.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Classification {
    state: BTreeSet<NodeId>,
    recursive: BTreeSet<NodeId>,
}

impl Classification {
    pub fn is_state(&self, id: NodeId) -> bool {
        self.state.contains(&id)
    }

    pub fn is_recursive(&self, id: NodeId) -> bool {
        self.recursive.contains(&id)
    }

    /// State nodes in id order.
    pub fn state_nodes(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.state.iter().copied()
    }

    pub fn state_count(&self) -> usize {
        self.state.len()
    }
}

/// Memoizing classifier. Owns the connectivity table it classifies.
#[derive(Debug)]
pub struct Classifier {
    table: ConnectivityTable,
    explicit: BTreeSet<NodeId>,
    seeds: Option<BTreeSet<NodeId>>,
    state_out: HashMap<NodeId, bool>,
    recursive: HashMap<NodeId, bool>,
    sealed: Option<Classification>,
}

impl Classifier {
    pub fn new(table: ConnectivityTable) -> Self {
        Classifier {
            table,
            explicit: BTreeSet::new(),
            seeds: None,
            state_out: HashMap::new(),
            recursive: HashMap::new(),
            sealed: None,
        }
    }

    pub fn table(&self) -> &ConnectivityTable {
        &self.table
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed.is_some()
    }

    /// Forces `id` into state classification.
    pub fn register_state(&mut self, id: NodeId) -> Result<(), AnalysisError> {
        if self.sealed.is_some() {
            return Err(AnalysisError::ClassificationSealed { node: id });
        }
        let data = self.table.node(id)?;
        if !data.is_flow {
            return Err(AnalysisError::NotAFlowNode { node: id });
        }
        if self.explicit.insert(id) {
            tracing::debug!(node = id.0, "registered state node");
            // Memoized answers predate this seed.
            self.seeds = None;
            self.state_out.clear();
        }
        Ok(())
    }

    /// `true` when `id` flows back into itself, directly or through a cycle.
    pub fn is_recursive(&mut self, id: NodeId) -> bool {
        if let Some(sealed) = &self.sealed {
            return sealed.is_recursive(id);
        }
        if let Some(&hit) = self.recursive.get(&id) {
            return hit;
        }
        let hit = self.table.flow_reachable(id).contains(&id);
        self.recursive.insert(id, hit);
        hit
    }

    /// `true` when `id` is a seed or flows into one. This is the state test.
    pub fn has_state_flow_output(&mut self, id: NodeId) -> bool {
        if let Some(sealed) = &self.sealed {
            return sealed.is_state(id);
        }
        if self.explicit.contains(&id) {
            return true;
        }
        if let Some(&hit) = self.state_out.get(&id) {
            return hit;
        }
        let is_flow = self.table.get(id).is_some_and(|d| d.is_flow);
        let hit = is_flow && {
            self.ensure_seeds();
            let seeds = self.seeds.as_ref();
            seeds.is_some_and(|seeds| {
                seeds.contains(&id) || self.table.flow_reachable(id).iter().any(|n| seeds.contains(n))
            })
        };
        self.state_out.insert(id, hit);
        hit
    }

    /// `true` when any flow predecessor of `id` is a state node, i.e. `id`
    /// runs inside a resumable unit even if it is regular itself.
    pub fn has_state_flow_input(&mut self, id: NodeId) -> bool {
        let prev = match self.table.get(id) {
            Some(data) => data.flow_prev.clone(),
            None => return false,
        };
        prev.into_iter().any(|p| self.has_state_flow_output(p))
    }

    pub fn is_state(&mut self, id: NodeId) -> bool {
        self.has_state_flow_output(id)
    }

    /// Freezes classification. Later registrations fail.
    pub fn seal(&mut self) -> &Classification {
        if self.sealed.is_none() {
            let ids: Vec<NodeId> = self.table.iter().map(|d| d.id).collect();
            let mut result = Classification::default();
            for id in ids {
                if self.has_state_flow_output(id) {
                    result.state.insert(id);
                }
                if self.is_recursive(id) {
                    result.recursive.insert(id);
                }
            }
            tracing::debug!(
                state = result.state.len(),
                recursive = result.recursive.len(),
                "classification sealed"
            );
            self.sealed = Some(result);
        }
        self.sealed.get_or_insert_with(Classification::default)
    }

    pub fn classification(&self) -> Option<&Classification> {
        self.sealed.as_ref()
    }

    fn ensure_seeds(&mut self) {
        if self.seeds.is_some() {
            return;
        }
        let table = &self.table;
        let mut seeds = self.explicit.clone();
        for data in table.iter().filter(|d| d.is_flow) {
            let recursive = *self
                .recursive
                .entry(data.id)
                .or_insert_with(|| table.flow_reachable(data.id).contains(&data.id));
            if data.suspends || recursive {
                seeds.insert(data.id);
            }
            if data.stateful_scope {
                seeds.extend(table.scope_members(data.id));
            }
        }
        self.seeds = Some(seeds);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connectivity::ConnectivityOptions;
    use crate::test_support::{chain_graph, graph_of, TestNode};
    use proptest::prelude::*;

    fn table(graph: &flowgen_core::graph::NodeGraph<TestNode>) -> ConnectivityTable {
        ConnectivityTable::build(graph, ConnectivityOptions::default()).unwrap()
    }

    #[test]
    fn direct_self_loop_is_recursive() {
        let graph = graph_of(0, vec![(0, TestNode::flow(&[0]))]);
        let t = table(&graph);
        let mut c = Classifier::new(t);
        assert!(c.is_recursive(NodeId(0)));
        assert!(c.is_state(NodeId(0)));
    }

    #[test]
    fn indirect_cycle_is_recursive() {
        let graph = graph_of(
            0,
            vec![
                (0, TestNode::flow(&[1])),
                (1, TestNode::flow(&[2])),
                (2, TestNode::flow(&[0])),
            ],
        );
        let t = table(&graph);
        let mut c = Classifier::new(t);
        for id in 0..3 {
            assert!(c.is_recursive(NodeId(id)));
        }
    }

    #[test]
    fn diamond_is_not_recursive() {
        let graph = graph_of(
            0,
            vec![
                (0, TestNode::flow(&[1, 2])),
                (1, TestNode::flow(&[3])),
                (2, TestNode::flow(&[3])),
                (3, TestNode::flow(&[])),
            ],
        );
        let t = table(&graph);
        let mut c = Classifier::new(t);
        for id in 0..4 {
            assert!(!c.is_recursive(NodeId(id)));
        }
        assert_eq!(c.seal().state_count(), 0);
    }

    #[test]
    fn linear_chain_is_all_regular() {
        let graph = chain_graph(3);
        let t = table(&graph);
        let mut c = Classifier::new(t);
        let sealed = c.seal();
        assert_eq!(sealed.state_count(), 0);
    }

    #[test]
    fn suspension_spreads_backwards_only() {
        // 0 -> 1(wait) -> 2
        let graph = graph_of(
            0,
            vec![
                (0, TestNode::flow(&[1])),
                (1, TestNode::flow(&[2]).suspending()),
                (2, TestNode::flow(&[])),
            ],
        );
        let t = table(&graph);
        let mut c = Classifier::new(t);
        assert!(c.is_state(NodeId(0)));
        assert!(c.is_state(NodeId(1)));
        assert!(!c.is_state(NodeId(2)));
        assert!(c.has_state_flow_input(NodeId(2)));
        assert!(!c.has_state_flow_input(NodeId(0)));
    }

    #[test]
    fn value_readers_stay_regular() {
        // 0 reads value node 5, which reads 1; 1 suspends but is only
        // reached through a value edge.
        let graph = graph_of(
            0,
            vec![
                (0, TestNode::flow(&[]).reading(&[5])),
                (5, TestNode::value(&[1])),
                (1, TestNode::flow(&[]).suspending()),
            ],
        );
        let t = table(&graph);
        let mut c = Classifier::new(t);
        assert!(!c.is_state(NodeId(0)));
        assert!(!c.is_state(NodeId(5)));
    }

    #[test]
    fn stateful_scope_members_are_state() {
        let graph = graph_of(
            0,
            vec![
                (0, TestNode::flow(&[]).with_children(&[1]).stateful()),
                (1, TestNode::flow(&[2])),
                (2, TestNode::flow(&[])),
            ],
        );
        let t = table(&graph);
        let mut c = Classifier::new(t);
        assert!(c.is_state(NodeId(1)));
        assert!(c.is_state(NodeId(2)));
        assert!(!c.is_state(NodeId(0)));
    }

    #[test]
    fn explicit_registration_invalidates_memo() {
        let graph = chain_graph(3);
        let t = table(&graph);
        let mut c = Classifier::new(t);
        assert!(!c.is_state(NodeId(0)));
        c.register_state(NodeId(2)).unwrap();
        assert!(c.is_state(NodeId(0)));
        assert!(c.is_state(NodeId(1)));
    }

    #[test]
    fn registering_after_seal_fails() {
        let graph = chain_graph(2);
        let t = table(&graph);
        let mut c = Classifier::new(t);
        c.seal();
        assert_eq!(
            c.register_state(NodeId(1)),
            Err(AnalysisError::ClassificationSealed { node: NodeId(1) })
        );
    }

    #[test]
    fn value_nodes_cannot_be_state() {
        let graph = graph_of(0, vec![(0, TestNode::flow(&[]).reading(&[1])), (1, TestNode::value(&[]))]);
        let t = table(&graph);
        let mut c = Classifier::new(t);
        assert_eq!(
            c.register_state(NodeId(1)),
            Err(AnalysisError::NotAFlowNode { node: NodeId(1) })
        );
    }

    fn arb_graph() -> impl Strategy<Value = Vec<(Vec<u32>, bool)>> {
        (2u32..12).prop_flat_map(|n| {
            prop::collection::vec(
                (prop::collection::vec(0..n, 0..3), prop::bool::weighted(0.2)),
                n as usize,
            )
        })
    }

    proptest! {
        #[test]
        fn state_is_closed_under_flow_predecessors(shape in arb_graph()) {
            let nodes: Vec<(u32, TestNode)> = shape
                .iter()
                .enumerate()
                .map(|(i, (next, suspends))| {
                    let node = TestNode::flow(next);
                    (i as u32, if *suspends { node.suspending() } else { node })
                })
                .collect();
            // Every node is an entry so the whole graph is registered.
            let mut graph = graph_of(0, nodes);
            for i in 1..shape.len() as u32 {
                graph.class.events.push(flowgen_core::decl::EventDecl {
                    id: flowgen_core::id::DeclId(i),
                    name: format!("E{i}"),
                    params: vec![],
                    entry: Some(NodeId(i)),
                });
            }
            let t = table(&graph);
            let mut c = Classifier::new(t);
            let sealed = c.seal().clone();
            for (i, (next, _)) in shape.iter().enumerate() {
                for &n in next {
                    if sealed.is_state(NodeId(n)) {
                        prop_assert!(sealed.is_state(NodeId(i as u32)));
                    }
                }
            }
            for (i, (_, suspends)) in shape.iter().enumerate() {
                if *suspends {
                    prop_assert!(sealed.is_state(NodeId(i as u32)));
                }
            }
        }
    }
}
