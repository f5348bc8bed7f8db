//! Trace Post-Processor
//!
//! Stateless batch pass over a finished trace log: simplify, rebuild a
//! deduplicated graph, and optionally annotate one source file.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Serialize;
use tracing::{info, warn};

use crate::domain::annotation::{execution_orders, render_annotated};
use crate::domain::error::TraceError;
use crate::domain::flowgraph::{simplify_transitions, FlowGraph};
use crate::domain::trace_log::{read_trace_file, TraceEvent};

use super::ExportTarget;

#[derive(Debug, Clone)]
pub struct VisualizeRequest {
    pub trace_log: PathBuf,
    pub source_file: Option<PathBuf>,
    /// Defaults to `<source>.annotated.txt`.
    pub annotated_path: Option<PathBuf>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct VisualizeReport {
    pub transitions: usize,
    pub malformed_lines: usize,
    pub simplified: usize,
    pub nodes: usize,
    pub edges: usize,
    pub annotated: Option<PathBuf>,
    pub artifacts: Vec<PathBuf>,
}

pub struct PostProcessor<'a> {
    pub exports: Vec<ExportTarget<'a>>,
}

impl<'a> PostProcessor<'a> {
    pub fn run(&self, request: &VisualizeRequest) -> Result<VisualizeReport> {
        info!("Parsing trace file: {}", request.trace_log.display());
        let parsed = read_trace_file(&request.trace_log)
            .with_context(|| format!("Failed to read trace log {}", request.trace_log.display()))?;
        if parsed.malformed > 0 {
            warn!("Skipped {} malformed trace lines", parsed.malformed);
        }
        info!("Found {} transitions", parsed.events.len());

        let simplified = simplify_transitions(&parsed.events);
        info!("Simplified to {} transitions", simplified.len());

        let flow = FlowGraph::from_transitions(&simplified);
        let mut report = VisualizeReport {
            transitions: parsed.events.len(),
            malformed_lines: parsed.malformed,
            simplified: simplified.len(),
            nodes: flow.nodes.len(),
            edges: flow.edges.len(),
            ..VisualizeReport::default()
        };

        for target in &self.exports {
            target
                .exporter
                .export_flow(&flow, &target.path)
                .with_context(|| format!("Failed to write {}", target.path.display()))?;
            info!(
                "Generated graph with {} nodes and {} edges: {}",
                report.nodes,
                report.edges,
                target.path.display()
            );
            report.artifacts.push(target.path.clone());
        }

        if let Some(source) = &request.source_file {
            let out = request
                .annotated_path
                .clone()
                .unwrap_or_else(|| default_annotated_path(source));
            match annotate_source(&parsed.events, source, &out) {
                Ok(()) => {
                    info!("Annotated source created: {}", out.display());
                    report.annotated = Some(out.clone());
                    report.artifacts.push(out);
                }
                Err(e) => warn!("{e:#}; skipping annotation"),
            }
        }

        Ok(report)
    }
}

pub fn default_annotated_path(source: &Path) -> PathBuf {
    let mut name = source.as_os_str().to_os_string();
    name.push(".annotated.txt");
    PathBuf::from(name)
}

/// Write the execution-order listing of `source` to `out`. A missing
/// source file is reported as [`TraceError::MissingAnnotationSource`].
pub fn annotate_source(events: &[TraceEvent], source: &Path, out: &Path) -> Result<()> {
    if !source.exists() {
        return Err(TraceError::MissingAnnotationSource(source.to_path_buf()).into());
    }
    let text = fs::read_to_string(source)
        .with_context(|| format!("Failed to read source file {}", source.display()))?;
    let source_name = source.to_string_lossy();
    let orders = execution_orders(events, &source_name);
    let listing = render_annotated(&source_name, &text, &orders);
    fs::write(out, listing).with_context(|| format!("Failed to write {}", out.display()))?;
    Ok(())
}
