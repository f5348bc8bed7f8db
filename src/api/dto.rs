use serde::{Deserialize, Serialize};

use crate::domain::flowgraph::{FlowGraph, FlowNodeType};
use crate::domain::location::TracePoint;
use crate::domain::trace_graph::TraceGraph;

/// JSON form of either graph, for tools that do not read DOT.
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct GraphDto {
    pub nodes: Vec<NodeDto>,
    pub edges: Vec<EdgeDto>,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct NodeDto {
    pub id: String,
    pub label: String,
    /// `start` or `location`
    pub kind: String,
}

#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct EdgeDto {
    pub from: String,
    pub to: String,
}

impl From<&TraceGraph> for GraphDto {
    fn from(graph: &TraceGraph) -> Self {
        let nodes = graph
            .nodes
            .iter()
            .map(|n| NodeDto {
                id: format!("node{}", n.id),
                label: n.point.to_string(),
                kind: kind_of(n.point.is_start()).to_string(),
            })
            .collect();

        // Multigraph: one entry per recorded transition.
        let edges = graph
            .edges
            .iter()
            .map(|(from, to)| EdgeDto {
                from: format!("node{from}"),
                to: format!("node{to}"),
            })
            .collect();

        GraphDto { nodes, edges }
    }
}

impl From<&FlowGraph> for GraphDto {
    fn from(flow: &FlowGraph) -> Self {
        let nodes = flow
            .nodes
            .iter()
            .map(|n| {
                let is_start = n.node_type == FlowNodeType::Entry;
                NodeDto {
                    id: n.id.clone(),
                    label: if is_start {
                        TracePoint::START_LABEL.to_string()
                    } else {
                        format!("{}:{}", n.file, n.line)
                    },
                    kind: kind_of(is_start).to_string(),
                }
            })
            .collect();

        let edges = flow
            .edges
            .iter()
            .map(|e| EdgeDto {
                from: e.from.clone(),
                to: e.to.clone(),
            })
            .collect();

        GraphDto { nodes, edges }
    }
}

fn kind_of(is_start: bool) -> &'static str {
    if is_start {
        "start"
    } else {
        "location"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::location::SourceLocation;
    use crate::domain::trace_graph::TraceGraphBuilder;
    use crate::domain::trace_log::TraceEvent;

    #[test]
    fn test_trace_graph_dto() {
        let mut b = TraceGraphBuilder::new();
        let a: TracePoint = SourceLocation::new("m.c", 1).into();
        b.record_transition(&TracePoint::Start, &a);
        b.record_transition(&a, &a);
        let dto = GraphDto::from(&b.snapshot());
        assert_eq!(dto.nodes[0].kind, "start");
        assert_eq!(dto.nodes[1].label, "m.c:1");
        assert_eq!(dto.edges.len(), 2);
        assert_eq!(dto.edges[1].from, "node2");
    }

    #[test]
    fn test_flow_graph_dto_roundtrips_through_json() {
        let flow = FlowGraph::from_transitions(&[TraceEvent::new("START", "/x/m.c:3")]);
        let dto = GraphDto::from(&flow);
        assert_eq!(dto.nodes[1].label, "m.c:3");
        let json = serde_json::to_string(&dto).unwrap();
        let back: GraphDto = serde_json::from_str(&json).unwrap();
        assert_eq!(back, dto);
    }
}
