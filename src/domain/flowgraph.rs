//! FlowGraph Data Structure
//!
//! The post-processed control-flow graph: nodes keyed by `basename:line`,
//! edges deduplicated into a set, START kept as its own node.

use std::collections::{HashMap, HashSet};

use super::location::{basename, TracePoint};
use super::trace_log::TraceEvent;

/// Id used for the START node in the simplified graph.
pub const START_ID: &str = "start";

/// Simplified execution flow graph.
#[derive(Debug, Clone, Default)]
pub struct FlowGraph {
    /// Nodes in first-seen order
    pub nodes: Vec<FlowNode>,
    /// Distinct edges in first-seen order
    pub edges: Vec<FlowEdge>,
}

/// A node in the flow graph
#[derive(Debug, Clone, PartialEq)]
pub struct FlowNode {
    /// `start` or `nodeN`
    pub id: String,
    /// Basename of the source file (`START` for the sentinel)
    pub file: String,
    /// Line number as written in the log (`?` when absent)
    pub line: String,
    pub node_type: FlowNodeType,
}

/// Classification of node types for visual styling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlowNodeType {
    /// The synthetic START sentinel (green oval)
    Entry,
    /// A visited source line (light blue box)
    Statement,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FlowEdge {
    pub from: String,
    pub to: String,
}

/// Collapse runs of identical consecutive transitions into their first
/// occurrence. Non-adjacent repeats are kept.
pub fn simplify_transitions(events: &[TraceEvent]) -> Vec<TraceEvent> {
    let mut simplified: Vec<TraceEvent> = Vec::with_capacity(events.len());
    for event in events {
        if simplified.last() != Some(event) {
            simplified.push(event.clone());
        }
    }
    simplified
}

/// Split a log endpoint into `(basename, line)`. Endpoints without a colon
/// keep their text and get `?` as line.
pub fn extract_file_info(endpoint: &str) -> (String, String) {
    match endpoint.rsplit_once(':') {
        Some((path, line)) => (basename(path).to_string(), line.to_string()),
        None => (endpoint.to_string(), "?".to_string()),
    }
}

impl FlowGraph {
    pub fn from_transitions(transitions: &[TraceEvent]) -> Self {
        let mut builder = FlowGraphBuilder::default();
        for event in transitions {
            let from = builder.node_for(&event.from);
            let to = builder.node_for(&event.to);
            builder.add_edge(from, to);
        }
        builder.graph
    }

    pub fn node(&self, id: &str) -> Option<&FlowNode> {
        self.nodes.iter().find(|n| n.id == id)
    }

    /// Statement node for a `basename:line` key, if present.
    pub fn find(&self, file: &str, line: &str) -> Option<&FlowNode> {
        self.nodes
            .iter()
            .find(|n| n.node_type == FlowNodeType::Statement && n.file == file && n.line == line)
    }
}

#[derive(Default)]
struct FlowGraphBuilder {
    graph: FlowGraph,
    by_key: HashMap<String, String>,
    seen_edges: HashSet<FlowEdge>,
    counter: usize,
}

impl FlowGraphBuilder {
    fn node_for(&mut self, endpoint: &str) -> String {
        if endpoint == TracePoint::START_LABEL {
            if !self.by_key.contains_key(TracePoint::START_LABEL) {
                self.by_key
                    .insert(TracePoint::START_LABEL.to_string(), START_ID.to_string());
                self.graph.nodes.push(FlowNode {
                    id: START_ID.to_string(),
                    file: TracePoint::START_LABEL.to_string(),
                    line: String::new(),
                    node_type: FlowNodeType::Entry,
                });
            }
            return START_ID.to_string();
        }

        let (file, line) = extract_file_info(endpoint);
        let key = format!("{file}:{line}");
        if let Some(id) = self.by_key.get(&key) {
            return id.clone();
        }

        self.counter += 1;
        let id = format!("node{}", self.counter);
        self.by_key.insert(key, id.clone());
        self.graph.nodes.push(FlowNode {
            id: id.clone(),
            file,
            line,
            node_type: FlowNodeType::Statement,
        });
        id
    }

    fn add_edge(&mut self, from: String, to: String) {
        let edge = FlowEdge { from, to };
        if self.seen_edges.insert(edge.clone()) {
            self.graph.edges.push(edge);
        }
    }
}
