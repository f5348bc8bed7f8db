//! Live trace graph.
//!
//! A multigraph built while stepping: every distinct [`TracePoint`] gets a
//! sequential id on first sight, and every accepted transition appends an
//! edge, repeats included, so loop iteration counts stay recoverable.

use std::collections::HashMap;

use super::location::TracePoint;

pub type NodeId = u32;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceNode {
    pub id: NodeId,
    pub point: TracePoint,
}

/// Accumulates nodes and edges for one session.
#[derive(Debug, Default)]
pub struct TraceGraphBuilder {
    ids: HashMap<TracePoint, NodeId>,
    nodes: Vec<TraceNode>,
    edges: Vec<(NodeId, NodeId)>,
}

impl TraceGraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Id for `point`, assigning the next one if it has not been seen.
    pub fn node_id(&mut self, point: &TracePoint) -> NodeId {
        if let Some(id) = self.ids.get(point) {
            return *id;
        }
        let id = self.nodes.len() as NodeId + 1;
        self.ids.insert(point.clone(), id);
        self.nodes.push(TraceNode {
            id,
            point: point.clone(),
        });
        id
    }

    pub fn lookup(&self, point: &TracePoint) -> Option<NodeId> {
        self.ids.get(point).copied()
    }

    pub fn record_transition(&mut self, from: &TracePoint, to: &TracePoint) -> (NodeId, NodeId) {
        let from_id = self.node_id(from);
        let to_id = self.node_id(to);
        self.edges.push((from_id, to_id));
        (from_id, to_id)
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Snapshot of everything recorded so far. Does not consume the builder,
    /// so it can be taken mid-session and repeatedly.
    pub fn snapshot(&self) -> TraceGraph {
        TraceGraph {
            nodes: self.nodes.clone(),
            edges: self.edges.clone(),
        }
    }
}

/// Immutable view of a live graph, in first-seen / insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TraceGraph {
    pub nodes: Vec<TraceNode>,
    pub edges: Vec<(NodeId, NodeId)>,
}

impl TraceGraph {
    /// Number of times the `from -> to` transition was recorded.
    pub fn multiplicity(&self, from: NodeId, to: NodeId) -> usize {
        self.edges.iter().filter(|e| **e == (from, to)).count()
    }
}
