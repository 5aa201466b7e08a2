//! flowgen command-line generator.
//!
//! Provides the `flowgen` binary. `compile` reads one or more JSON graph
//! documents authored with the built-in node library, runs a generation pass
//! and writes one `.cs` file per graph (plus a `.map.json` source map when
//! requested).
//!
//! Uses the same `flowgen_codegen::generate()` pipeline library callers use.

use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};

use flowgen_codegen::builtin::BuiltinNode;
use flowgen_codegen::node::{boxed, Graph};
use flowgen_codegen::{CodegenError, GenerationOutput, GeneratorConfig, Scheduling};
use flowgen_core::graph::GraphDocument;

/// Node-graph to C# source generator.
#[derive(Parser)]
#[command(name = "flowgen", about = "Generate C# classes from flowgen node graphs")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate source files from graph documents.
    Compile {
        /// Graph document (JSON). Repeat for several graphs in one pass.
        #[arg(short, long, required = true)]
        input: Vec<PathBuf>,

        /// Directory receiving the generated files.
        #[arg(short, long, default_value = "./generated")]
        output_dir: PathBuf,

        /// Namespace of the generated types.
        #[arg(short, long)]
        namespace: Option<String>,

        /// JSON generator configuration; flags override its values.
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Embed markers and write `<Type>.map.json` next to each file.
        #[arg(long)]
        source_map: bool,

        /// Batched scheduling with the given queue depth. Node failures
        /// become diagnostics instead of aborting.
        #[arg(long, value_name = "DEPTH")]
        batched: Option<usize>,

        /// Emit `GetVariable`/`SetVariable` accessors.
        #[arg(long)]
        optimize: bool,

        /// Fail on connections to missing nodes.
        #[arg(long)]
        strict: bool,
    },
}

/// Flag values layered over the configuration file.
struct Overrides {
    namespace: Option<String>,
    source_map: bool,
    batched: Option<usize>,
    optimize: bool,
    strict: bool,
}

fn main() {
    tracing_subscriber::fmt().with_writer(std::io::stderr).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Compile {
            input,
            output_dir,
            namespace,
            config,
            source_map,
            batched,
            optimize,
            strict,
        } => {
            let overrides = Overrides {
                namespace,
                source_map,
                batched,
                optimize,
                strict,
            };
            let exit_code = run_compile(&input, &output_dir, config.as_deref(), overrides);
            process::exit(exit_code);
        }
    }
}

/// Execute the compile subcommand.
///
/// Returns exit code: 0 = success, 1 = generation error,
/// 2 = completed with diagnostics, 3 = I/O or input error.
fn run_compile(inputs: &[PathBuf], output_dir: &Path, config_path: Option<&Path>, overrides: Overrides) -> i32 {
    let config = match load_config(config_path, overrides) {
        Ok(config) => config,
        Err(msg) => {
            eprintln!("Error: {msg}");
            return 3;
        }
    };

    let mut graphs = Vec::with_capacity(inputs.len());
    for path in inputs {
        match load_graph(path) {
            Ok(graph) => graphs.push(graph),
            Err(msg) => {
                eprintln!("Error: {msg}");
                return 3;
            }
        }
    }

    let output = match flowgen_codegen::generate(&graphs, &config, |fraction, message| {
        tracing::debug!(progress = fraction, "{message}");
    }) {
        Ok(output) => output,
        Err(CodegenError::Io(e)) => {
            eprintln!("I/O error: {e}");
            return 3;
        }
        Err(e) => {
            eprintln!("Generation error: {e}");
            return 1;
        }
    };

    if let Err(e) = write_artifacts(&output, output_dir) {
        eprintln!("Error: failed to write to '{}': {e}", output_dir.display());
        return 3;
    }

    // Machine-readable summary on stdout.
    let summary = serde_json::json!({
        "files": output.artifacts.iter().map(|a| output_dir.join(&a.file_name)).collect::<Vec<_>>(),
        "diagnostics": output.diagnostics,
    });
    println!(
        "{}",
        serde_json::to_string_pretty(&summary)
            .unwrap_or_else(|e| format!("{{\"error\": \"failed to serialize summary: {e}\"}}"))
    );

    if output.is_clean() {
        0
    } else {
        eprintln!("Generation finished with {} diagnostic(s):", output.diagnostics.len());
        for d in &output.diagnostics {
            match d.node {
                Some(node) => eprintln!("  - {} node {node} in {}: {}", d.graph, d.owner, d.message),
                None => eprintln!("  - {} in {}: {}", d.graph, d.owner, d.message),
            }
        }
        2
    }
}

/// The configuration file (or defaults) with flags applied on top.
fn load_config(path: Option<&Path>, overrides: Overrides) -> Result<GeneratorConfig, String> {
    let mut config = match path {
        Some(path) => {
            let text = fs::read_to_string(path)
                .map_err(|e| format!("failed to read config '{}': {e}", path.display()))?;
            serde_json::from_str(&text)
                .map_err(|e| format!("invalid config '{}': {e}", path.display()))?
        }
        None => GeneratorConfig::default(),
    };
    if overrides.namespace.is_some() {
        config.namespace = overrides.namespace;
    }
    if let Some(queue_depth) = overrides.batched {
        config.scheduling = Scheduling::Batched { queue_depth };
    }
    config.traceable |= overrides.source_map;
    config.optimize_variable_access |= overrides.optimize;
    config.strict_connectivity |= overrides.strict;
    Ok(config)
}

fn load_graph(path: &Path) -> Result<Graph, String> {
    let text = fs::read_to_string(path)
        .map_err(|e| format!("failed to read graph '{}': {e}", path.display()))?;
    let document = GraphDocument::<BuiltinNode>::from_json(&text)
        .map_err(|e| format!("'{}': {e}", path.display()))?;
    let graph = document
        .into_graph()
        .map_err(|e| format!("'{}': {e}", path.display()))?;
    tracing::info!(graph = %graph.name, nodes = graph.len(), "loaded graph document");
    Ok(boxed(graph))
}

fn write_artifacts(output: &GenerationOutput, dir: &Path) -> std::io::Result<()> {
    fs::create_dir_all(dir)?;
    for artifact in &output.artifacts {
        fs::write(dir.join(&artifact.file_name), &artifact.source)?;
        if let Some(map) = &artifact.source_map {
            let json = serde_json::to_string_pretty(map).map_err(std::io::Error::other)?;
            fs::write(dir.join(format!("{}.map.json", artifact.type_name)), json)?;
        }
    }
    Ok(())
}
