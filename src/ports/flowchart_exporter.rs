//! Flowchart DOT Exporter
//!
//! Exports trace graphs as Graphviz DOT for an external `dot` run.

use crate::domain::flowgraph::{FlowGraph, FlowNodeType};
use crate::domain::location::TracePoint;
use crate::domain::trace_graph::TraceGraph;
use crate::ports::OutputExporter;

pub struct DotExporter;

impl DotExporter {
    /// Live graph: one node per location, one edge per recorded transition.
    pub fn trace_to_dot(graph: &TraceGraph) -> String {
        let mut lines = Vec::new();

        lines.push("digraph ControlFlow {".to_string());
        lines.push("  node [shape=box, style=filled, fillcolor=lightblue];".to_string());

        for node in &graph.nodes {
            match &node.point {
                TracePoint::Start => lines.push(format!(
                    "  node{} [label=\"{}\", shape=oval, fillcolor=green];",
                    node.id,
                    TracePoint::START_LABEL
                )),
                TracePoint::Location(loc) => lines.push(format!(
                    "  node{} [label=\"{}\"];",
                    node.id,
                    Self::escape_label(&loc.to_string())
                )),
            }
        }

        for (from, to) in &graph.edges {
            lines.push(format!("  node{} -> node{};", from, to));
        }

        lines.push("}".to_string());
        lines.push(String::new());
        lines.join("\n")
    }

    /// Simplified graph: `basename\nLine N` labels, left-to-right layout.
    pub fn flow_to_dot(flow: &FlowGraph) -> String {
        let mut lines = Vec::new();

        lines.push("digraph ControlFlow {".to_string());
        lines.push("  node [shape=box, style=filled, fillcolor=lightblue];".to_string());
        lines.push("  edge [color=darkblue];".to_string());
        lines.push("  rankdir=LR;".to_string());

        for node in &flow.nodes {
            match node.node_type {
                FlowNodeType::Entry => lines.push(format!(
                    "  {} [label=\"{}\", shape=oval, fillcolor=green];",
                    node.id,
                    TracePoint::START_LABEL
                )),
                FlowNodeType::Statement => lines.push(format!(
                    "  {} [label=\"{}\\nLine {}\"];",
                    node.id,
                    Self::escape_label(&node.file),
                    Self::escape_label(&node.line)
                )),
            }
        }

        for edge in &flow.edges {
            lines.push(format!("  {} -> {};", edge.from, edge.to));
        }

        lines.push("}".to_string());
        lines.push(String::new());
        lines.join("\n")
    }

    fn escape_label(label: &str) -> String {
        label
            .replace('\\', "\\\\")
            .replace('"', "\\\"")
            .replace('\n', "\\n")
    }
}

impl OutputExporter for DotExporter {
    fn render_trace(&self, graph: &TraceGraph) -> String {
        Self::trace_to_dot(graph)
    }

    fn render_flow(&self, graph: &FlowGraph) -> String {
        Self::flow_to_dot(graph)
    }
}
