// Infrastructure implementations for flowtrace.

use crate::api::dto::GraphDto;
use crate::domain::flowgraph::FlowGraph;
use crate::domain::trace_graph::TraceGraph;
use crate::ports::OutputExporter;

pub mod config;
pub mod gdb_mi;
pub mod graphviz;
pub mod interrupt;
pub mod logging;
pub mod mi_record;

pub use crate::ports::flowchart_exporter::DotExporter;
pub use gdb_mi::GdbMiBackend;
pub use interrupt::InterruptFlag;

/// Pretty-printed JSON graph export.
pub struct JsonExporter;

impl JsonExporter {
    fn to_json(dto: &GraphDto) -> String {
        // GraphDto only holds strings and vectors, so serialization cannot fail.
        let mut json = serde_json::to_string_pretty(dto).unwrap_or_else(|_| "{}".to_string());
        json.push('\n');
        json
    }
}

impl OutputExporter for JsonExporter {
    fn render_trace(&self, graph: &TraceGraph) -> String {
        Self::to_json(&GraphDto::from(graph))
    }

    fn render_flow(&self, graph: &FlowGraph) -> String {
        Self::to_json(&GraphDto::from(graph))
    }
}
