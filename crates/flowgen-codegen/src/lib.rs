//! Source generation for flowgen node graphs.
//!
//! This crate lowers a [`node::Graph`] into the text of one generated class:
//! member declarations, inlined flow, out-of-line state units behind a single
//! coroutine dispatcher, and an optional source map back to graph nodes.
//!
//! # Modules
//!
//! - [`error`] -- Error and diagnostic types for all generation failure modes
//! - [`names`], [`usings`], [`symbols`] -- identifiers, imports and members
//! - [`expr`], [`stmt`] -- expression and statement text builders
//! - [`coroutine`] -- state unit slots and the dispatcher
//! - [`markers`] -- source markers and source-map extraction
//! - [`context`] -- per-graph generation state
//! - [`assemble`] -- class and file assembly
//! - [`driver`] -- passes, scheduling and the single-pass guard
//! - [`node`], [`builtin`] -- the node-kind contract and built-in kinds

pub mod assemble;
pub mod builtin;
pub mod context;
pub mod coroutine;
pub mod driver;
pub mod error;
pub mod expr;
pub mod markers;
pub mod names;
pub mod node;
pub mod stmt;
pub mod symbols;
pub mod usings;

#[cfg(test)]
mod test_support;

pub use driver::{generate, generate_graph, GenerationJob, PassGuard, Scheduler};
pub use error::{CodegenError, Diagnostic};
pub use node::{Graph, NodeKind};

use serde::{Deserialize, Serialize};

use markers::SourceMap;

/// How a pass schedules its work items.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Scheduling {
    /// Run to completion on the calling thread. The first error aborts.
    #[default]
    Synchronous,
    /// Queue work items and let a scheduler drain up to `queue_depth` per
    /// tick. Node failures become diagnostics instead of aborting.
    Batched { queue_depth: usize },
}

/// Options controlling a generation pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Namespace of the generated types. `None` uses the class declaration's.
    pub namespace: Option<String>,

    /// Namespaces imported in addition to those the emitted code needs.
    pub usings: Vec<String>,

    /// Embed node and declaration markers and return a source map.
    pub traceable: bool,

    /// Emit `GetVariable`/`SetVariable` switch methods over declared
    /// variables for dynamic access by name.
    pub optimize_variable_access: bool,

    pub scheduling: Scheduling,

    /// Fail on connections to missing nodes instead of skipping them.
    pub strict_connectivity: bool,

    /// Fully qualified name of the runtime support type.
    pub runtime_type: String,

    /// Emit the auto-generated comment and warning suppression header.
    pub header: bool,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        GeneratorConfig {
            namespace: None,
            usings: Vec::new(),
            traceable: false,
            optimize_variable_access: false,
            scheduling: Scheduling::Synchronous,
            strict_connectivity: false,
            runtime_type: "Flowgen.Runtime.FlowRuntime".to_string(),
            header: true,
        }
    }
}

impl GeneratorConfig {
    pub fn is_batched(&self) -> bool {
        matches!(self.scheduling, Scheduling::Batched { .. })
    }

    /// Work items drained per scheduler tick.
    pub fn queue_depth(&self) -> usize {
        match self.scheduling {
            Scheduling::Synchronous => usize::MAX,
            Scheduling::Batched { queue_depth } => queue_depth.max(1),
        }
    }
}

/// Generated source of one type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedArtifact {
    pub type_name: String,
    /// Suggested file name, `<Type>.cs`.
    pub file_name: String,
    /// Marker-free source text.
    pub source: String,
    /// Present when the pass was traceable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_map: Option<SourceMap>,
}

/// Result of a pass over one or more graphs.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationOutput {
    pub artifacts: Vec<GeneratedArtifact>,
    /// Node failures recorded in batched mode. Callers must check this
    /// before treating the artifacts as usable.
    pub diagnostics: Vec<Diagnostic>,
}

impl GenerationOutput {
    pub fn is_clean(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = GeneratorConfig::default();
        assert_eq!(config.scheduling, Scheduling::Synchronous);
        assert!(!config.traceable);
        assert!(config.header);
        assert_eq!(config.runtime_type, "Flowgen.Runtime.FlowRuntime");
        assert_eq!(config.queue_depth(), usize::MAX);
    }

    #[test]
    fn partial_config_fills_defaults() {
        let config: GeneratorConfig =
            serde_json::from_str(r#"{"traceable":true,"scheduling":{"Batched":{"queue_depth":0}}}"#)
                .unwrap();
        assert!(config.traceable);
        assert!(config.is_batched());
        assert_eq!(config.queue_depth(), 1);
        assert!(config.namespace.is_none());
    }

    #[test]
    fn config_serde_roundtrip() {
        let config = GeneratorConfig {
            namespace: Some("Game.Generated".to_string()),
            usings: vec!["System.Linq".to_string()],
            optimize_variable_access: true,
            ..GeneratorConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: GeneratorConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
