// Domain types for flowtrace: locations, filtering, graphs and the trace log.

pub mod annotation;
pub mod error;
pub mod flowgraph;
pub mod location;
pub mod session;
pub mod source_filter;
pub mod trace_graph;
pub mod trace_log;
