//! The contract every node kind implements to take part in generation.
//!
//! Ports are declared through [`PortSource`]; emission goes through the three
//! hooks below. [`NodeKind::initialize`] runs for every reachable node before
//! any body is emitted and is the only place a node may force itself into
//! state classification.

use std::fmt;

use flowgen_core::graph::NodeGraph;
use flowgen_core::id::NodeId;
use flowgen_core::port::PortSource;

use crate::context::GenerationContext;
use crate::error::CodegenError;

pub trait NodeKind: PortSource + fmt::Debug {
    /// Registers variables, node setups or state classification.
    fn initialize(&self, _id: NodeId, _cx: &mut GenerationContext<'_>) -> Result<(), CodegenError> {
        Ok(())
    }

    /// Statement text for a flow node. Flow outputs other than
    /// [`PortSource::continuation`] are emitted by the node itself.
    fn generate_code(&self, _id: NodeId, _cx: &mut GenerationContext<'_>) -> Result<String, CodegenError> {
        Err(CodegenError::invalid(
            format!("node `{}`", self.title()),
            "cannot be used as a statement",
        ))
    }

    /// Expression text for output `port`.
    fn generate_value(
        &self,
        _id: NodeId,
        port: u16,
        _cx: &mut GenerationContext<'_>,
    ) -> Result<String, CodegenError> {
        Err(CodegenError::invalid(
            format!("output {port} of node `{}`", self.title()),
            "does not produce a value",
        ))
    }
}

/// A graph of boxed node kinds, the form the generator consumes.
pub type Graph = NodeGraph<Box<dyn NodeKind>>;

/// Boxes every node of a concrete graph.
pub fn boxed<N: NodeKind + 'static>(graph: NodeGraph<N>) -> Graph {
    graph.map_nodes(|node| Box::new(node) as Box<dyn NodeKind>)
}
