//! Generation passes: work queue, scheduling and the single-pass guard.
//!
//! A pass over a set of graphs is a [`GenerationJob`]. Its work is split
//! into items (prepare a graph, emit one entry point, assemble the type)
//! held in a queue. Synchronous callers drain the whole queue at once;
//! cooperative callers drain up to the configured queue depth per scheduler
//! tick and yield in between.
//!
//! Only one pass may run per process. Every job holds a [`PassGuard`] for
//! its whole lifetime; the guard is released on drop, so a pass that fails
//! or is abandoned never blocks the next one.

use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use flowgen_core::decl::EntryPoint;

use crate::context::GenerationContext;
use crate::error::{CodegenError, Diagnostic};
use crate::node::Graph;
use crate::{GeneratedArtifact, GenerationOutput, GeneratorConfig};

// ---------------------------------------------------------------------------
// Single-pass guard
// ---------------------------------------------------------------------------

static ACTIVE: Mutex<bool> = Mutex::new(false);
static RELEASED: Condvar = Condvar::new();

fn active_flag() -> MutexGuard<'static, bool> {
    // The flag is a plain bool; a panic while holding the lock cannot leave
    // it inconsistent.
    ACTIVE.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Proof that the calling pass is the only active one.
#[derive(Debug)]
pub struct PassGuard {
    _private: (),
}

impl PassGuard {
    /// Blocks the calling thread until no other pass is active.
    pub fn acquire() -> PassGuard {
        let mut active = active_flag();
        while *active {
            active = RELEASED
                .wait(active)
                .unwrap_or_else(PoisonError::into_inner);
        }
        *active = true;
        tracing::debug!("generation pass guard acquired");
        PassGuard { _private: () }
    }

    pub fn try_acquire() -> Option<PassGuard> {
        let mut active = active_flag();
        if *active {
            return None;
        }
        *active = true;
        Some(PassGuard { _private: () })
    }

    /// Waits for the active pass to finish by yielding to `scheduler`
    /// between attempts instead of blocking.
    pub fn acquire_with(scheduler: &mut impl Scheduler) -> PassGuard {
        loop {
            if let Some(guard) = PassGuard::try_acquire() {
                return guard;
            }
            scheduler.yield_now();
        }
    }

    pub fn is_active() -> bool {
        *active_flag()
    }
}

impl Drop for PassGuard {
    fn drop(&mut self) {
        *active_flag() = false;
        RELEASED.notify_all();
        tracing::debug!("generation pass guard released");
    }
}

// ---------------------------------------------------------------------------
// Scheduling
// ---------------------------------------------------------------------------

/// The host loop a cooperative pass yields to between drains.
pub trait Scheduler {
    fn yield_now(&mut self);
}

/// Yields the OS thread. The scheduler of synchronous passes.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadYield;

impl Scheduler for ThreadYield {
    fn yield_now(&mut self) {
        std::thread::yield_now();
    }
}

impl<F: FnMut()> Scheduler for F {
    fn yield_now(&mut self) {
        self()
    }
}

// ---------------------------------------------------------------------------
// Jobs
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
enum WorkItem {
    Prepare(usize),
    EmitEntry(usize, EntryPoint),
    Assemble(usize),
}

impl WorkItem {
    fn graph(&self) -> usize {
        match *self {
            WorkItem::Prepare(g) | WorkItem::EmitEntry(g, _) | WorkItem::Assemble(g) => g,
        }
    }
}

type Progress<'g> = Box<dyn FnMut(f32, &str) + 'g>;

/// One pass over a set of graphs.
pub struct GenerationJob<'g> {
    graphs: &'g [Graph],
    config: &'g GeneratorConfig,
    queue: VecDeque<WorkItem>,
    total: usize,
    done: usize,
    current: Option<GenerationContext<'g>>,
    output: GenerationOutput,
    progress: Option<Progress<'g>>,
    started: Instant,
    _guard: PassGuard,
}

impl<'g> GenerationJob<'g> {
    /// Starts a pass, blocking until no other pass is active.
    pub fn new(graphs: &'g [Graph], config: &'g GeneratorConfig) -> Self {
        GenerationJob::with_guard(graphs, config, PassGuard::acquire())
    }

    /// Starts a pass, yielding to `scheduler` while another pass is active.
    pub fn start_with(
        graphs: &'g [Graph],
        config: &'g GeneratorConfig,
        scheduler: &mut impl Scheduler,
    ) -> Self {
        GenerationJob::with_guard(graphs, config, PassGuard::acquire_with(scheduler))
    }

    fn with_guard(graphs: &'g [Graph], config: &'g GeneratorConfig, guard: PassGuard) -> Self {
        let mut queue = VecDeque::new();
        for (index, graph) in graphs.iter().enumerate() {
            queue.push_back(WorkItem::Prepare(index));
            for entry in graph.class.entry_points() {
                queue.push_back(WorkItem::EmitEntry(index, entry));
            }
            queue.push_back(WorkItem::Assemble(index));
        }
        tracing::info!(graphs = graphs.len(), items = queue.len(), "generation pass started");
        GenerationJob {
            graphs,
            config,
            total: queue.len(),
            queue,
            done: 0,
            current: None,
            output: GenerationOutput::default(),
            progress: None,
            started: Instant::now(),
            _guard: guard,
        }
    }

    /// Reports `(fraction done, message)` after every work item.
    pub fn on_progress(mut self, progress: impl FnMut(f32, &str) + 'g) -> Self {
        self.progress = Some(Box::new(progress));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Work items still queued.
    pub fn pending(&self) -> usize {
        self.queue.len()
    }

    /// Runs up to the configured queue depth of work items and returns how
    /// many ran. In synchronous mode the first error empties the queue and
    /// is returned.
    pub fn drain(&mut self) -> Result<usize, CodegenError> {
        let depth = self.config.queue_depth();
        let mut ran = 0;
        while ran < depth {
            let Some(item) = self.queue.pop_front() else {
                break;
            };
            ran += 1;
            if let Err(err) = self.run_item(item) {
                self.current = None;
                if self.config.is_batched() {
                    self.skip_graph(item.graph(), err);
                } else {
                    self.queue.clear();
                    tracing::info!(error = %err, "generation pass aborted");
                    return Err(err);
                }
            }
        }
        Ok(ran)
    }

    /// Drains until the queue is empty, yielding to `scheduler` between
    /// drains.
    pub fn wait_until_empty(&mut self, scheduler: &mut impl Scheduler) -> Result<(), CodegenError> {
        while !self.is_empty() {
            self.drain()?;
            if !self.is_empty() {
                scheduler.yield_now();
            }
        }
        Ok(())
    }

    /// Runs the whole pass and returns its output.
    pub fn run_with(mut self, scheduler: &mut impl Scheduler) -> Result<GenerationOutput, CodegenError> {
        self.wait_until_empty(scheduler)?;
        self.finish()
    }

    /// The output of a drained job.
    pub fn finish(self) -> Result<GenerationOutput, CodegenError> {
        if !self.queue.is_empty() {
            return Err(CodegenError::invalid(
                "generation job",
                format!("finished with {} work items queued", self.queue.len()),
            ));
        }
        tracing::info!(
            artifacts = self.output.artifacts.len(),
            diagnostics = self.output.diagnostics.len(),
            elapsed_ms = self.started.elapsed().as_millis() as u64,
            "generation pass finished"
        );
        Ok(self.output)
    }

    fn run_item(&mut self, item: WorkItem) -> Result<(), CodegenError> {
        let graphs = self.graphs;
        let graph = &graphs[item.graph()];
        let message = match item {
            WorkItem::Prepare(_) => {
                let mut cx = GenerationContext::new(graph, self.config)?;
                cx.prepare()?;
                self.current = Some(cx);
                format!("prepared {}", graph.name)
            }
            WorkItem::EmitEntry(_, entry) => {
                let cx = self.current.as_mut().ok_or_else(|| {
                    CodegenError::invalid(format!("entry of {}", graph.name), "emitted before preparation")
                })?;
                cx.emit_entry(&entry)?;
                format!("emitted entry {} of {}", entry.node, graph.name)
            }
            WorkItem::Assemble(_) => {
                let cx = self.current.take().ok_or_else(|| {
                    CodegenError::invalid(format!("type {}", graph.name), "assembled before preparation")
                })?;
                let (artifact, diagnostics) = cx.finish()?;
                self.output.diagnostics.extend(diagnostics);
                self.output.artifacts.push(artifact);
                format!("assembled {}", graph.name)
            }
        };
        self.done += 1;
        if let Some(progress) = self.progress.as_mut() {
            progress(self.done as f32 / self.total.max(1) as f32, &message);
        }
        Ok(())
    }

    /// Records a graph-level failure and drops the graph's remaining items.
    fn skip_graph(&mut self, index: usize, err: CodegenError) {
        let graphs = self.graphs;
        let graph = &graphs[index];
        tracing::warn!(graph = %graph.name, error = %err, "graph skipped");
        let before = self.queue.len();
        self.queue.retain(|item| item.graph() != index);
        self.done += before - self.queue.len() + 1;
        self.output.diagnostics.push(Diagnostic {
            graph: graph.name.clone(),
            node: err.node(),
            owner: graph.class.name.clone(),
            message: err.root().to_string(),
        });
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Generates every graph on the calling thread.
///
/// Pipeline per graph:
/// 1. Build connectivity from the class's entry points
/// 2. Register declarations and run every node's initialization
/// 3. Seal classification
/// 4. Emit each entry point's body (state units on first reach)
/// 5. Assemble the type and file, extracting the source map
pub fn generate<'g>(
    graphs: &'g [Graph],
    config: &'g GeneratorConfig,
    progress: impl FnMut(f32, &str) + 'g,
) -> Result<GenerationOutput, CodegenError> {
    GenerationJob::new(graphs, config)
        .on_progress(progress)
        .run_with(&mut ThreadYield)
}

/// Generates a single graph.
pub fn generate_graph(
    graph: &Graph,
    config: &GeneratorConfig,
) -> Result<(GeneratedArtifact, Vec<Diagnostic>), CodegenError> {
    let mut output = generate(std::slice::from_ref(graph), config, |_, _| {})?;
    match output.artifacts.pop() {
        Some(artifact) => Ok((artifact, output.diagnostics)),
        None => {
            let reason = output
                .diagnostics
                .first()
                .map(|d| d.message.clone())
                .unwrap_or_else(|| "produced no artifact".to_string());
            Err(CodegenError::invalid(format!("graph {}", graph.name), reason))
        }
    }
}
