use std::path::Path;

use crate::domain::error::TraceResult;
use crate::domain::flowgraph::FlowGraph;
use crate::domain::location::SourceLocation;
use crate::domain::session::Granularity;
use crate::domain::trace_graph::TraceGraph;

pub mod flowchart_exporter;

/// Process-control primitive the session drives. Implementations own the
/// live process exclusively.
pub trait ProcessControl {
    /// Pass arguments to the target before launch.
    fn set_arguments(&mut self, args: &[String]) -> TraceResult<()>;

    /// Whether the target already has a live frame.
    fn is_running(&mut self) -> bool;

    /// Launch the target and stop at its entry point.
    fn launch(&mut self) -> TraceResult<()>;

    /// Advance one unit. Blocks until the next stop. An exited process is
    /// reported as `TraceError::SteppingError`.
    fn step(&mut self, granularity: Granularity) -> TraceResult<()>;

    /// Source location of the current stop, `Ok(None)` without debug info.
    fn current_location(&mut self) -> TraceResult<Option<SourceLocation>>;

    fn is_terminated(&self) -> bool;

    /// Path of the loaded executable, when known.
    fn program_path(&self) -> Option<&Path>;
}

/// Cancellation check evaluated between steps.
pub trait Interrupt {
    fn is_interrupted(&self) -> bool;
}

impl<F: Fn() -> bool> Interrupt for F {
    fn is_interrupted(&self) -> bool {
        self()
    }
}

/// Never fires.
pub struct NoInterrupt;

impl Interrupt for NoInterrupt {
    fn is_interrupted(&self) -> bool {
        false
    }
}

/// Writes graph artifacts in one format.
pub trait OutputExporter {
    fn render_trace(&self, graph: &TraceGraph) -> String;
    fn render_flow(&self, graph: &FlowGraph) -> String;

    fn export_trace(&self, graph: &TraceGraph, path: &Path) -> std::io::Result<()> {
        std::fs::write(path, self.render_trace(graph))
    }

    fn export_flow(&self, graph: &FlowGraph, path: &Path) -> std::io::Result<()> {
        std::fs::write(path, self.render_flow(graph))
    }
}
