//! Graph analysis for the flowgen code generator.
//!
//! - [`connectivity`]: which nodes each node flows into and reads from,
//!   discovered from the declared entry points of a graph.
//! - [`classify`]: recursion detection and regular/state classification.
//!
//! Both operate on any node type implementing
//! [`flowgen_core::port::PortSource`] and never modify the graph.

pub mod classify;
pub mod connectivity;
pub mod error;

#[cfg(test)]
mod test_support;

pub use classify::{Classification, Classifier};
pub use connectivity::{ConnectivityOptions, ConnectivityTable, Link, NodeData};
pub use error::AnalysisError;
