//! Tracing loop.
//!
//! Steps the target through a [`SessionController`], filters every stop,
//! and feeds accepted transitions to the live graph and the trace log.
//! All session state lives in [`Tracer`]; nothing is global.

use std::io::Write;

use tracing::{debug, info, warn};

use crate::domain::error::TraceResult;
use crate::domain::location::{SourceLocation, TracePoint};
use crate::domain::session::{Scope, StopReason, TraceConfig, TraceSummary};
use crate::domain::source_filter::SourceFilter;
use crate::domain::trace_graph::{TraceGraph, TraceGraphBuilder};
use crate::domain::trace_log::TraceLogWriter;
use crate::ports::{Interrupt, ProcessControl};

use super::session::SessionController;

const SKIP_REPORT_EVERY: u64 = 100;

/// What happened to one stop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Observation {
    Recorded,
    /// Same file and line as the previous accepted stop.
    Unchanged,
    Foreign,
    NoSymbol,
}

pub struct Tracer<W: Write> {
    config: TraceConfig,
    filter: SourceFilter,
    graph: TraceGraphBuilder,
    log: TraceLogWriter<W>,
    last: Option<SourceLocation>,
    transitions: u64,
    skipped_foreign: u64,
    skipped_no_symbol: u64,
    steps: u64,
}

impl<W: Write> Tracer<W> {
    pub fn new(config: TraceConfig, filter: SourceFilter, log: TraceLogWriter<W>) -> Self {
        Self {
            config,
            filter,
            graph: TraceGraphBuilder::new(),
            log,
            last: None,
            transitions: 0,
            skipped_foreign: 0,
            skipped_no_symbol: 0,
            steps: 0,
        }
    }

    pub fn config(&self) -> &TraceConfig {
        &self.config
    }

    /// Classify one stop and record it if it is a new accepted location.
    /// The first accepted location is linked from START, however many
    /// stops were rejected before it.
    pub fn observe(&mut self, location: Option<SourceLocation>) -> TraceResult<Observation> {
        let Some(location) = location else {
            self.skipped_no_symbol += 1;
            return Ok(Observation::NoSymbol);
        };

        if self.config.scope == Scope::ProgramOnly && !self.filter.is_in_scope(Some(&location)) {
            self.skipped_foreign += 1;
            if self.skipped_foreign % SKIP_REPORT_EVERY == 0 {
                info!("Skipped {} statements from library/system code...", self.skipped_foreign);
            }
            return Ok(Observation::Foreign);
        }

        if self.last.as_ref() == Some(&location) {
            return Ok(Observation::Unchanged);
        }

        let from = match self.last.take() {
            Some(prev) => TracePoint::Location(prev),
            None => {
                info!("Starting trace at {location}");
                TracePoint::Start
            }
        };
        let to = TracePoint::Location(location.clone());
        self.last = Some(location);

        self.graph.record_transition(&from, &to);
        self.transitions += 1;
        self.log.append(&from, &to)?;

        if self.transitions % self.config.progress_interval() == 0 {
            info!("Traced {} statements...", self.transitions);
            self.log.flush()?;
        }
        Ok(Observation::Recorded)
    }

    /// Drive the session until the process ends, stepping fails, or
    /// `interrupt` fires. The controller must already be started. Always
    /// returns a terminal reason; the accumulated graph stays available.
    pub fn run<C: ProcessControl>(
        &mut self,
        controller: &mut SessionController<C>,
        interrupt: &dyn Interrupt,
    ) -> StopReason {
        let reason = self.drive(controller, interrupt);
        if let Err(e) = self.log.flush() {
            warn!("Failed to flush trace log: {e}");
        }
        controller.finish(reason).clone()
    }

    fn drive<C: ProcessControl>(
        &mut self,
        controller: &mut SessionController<C>,
        interrupt: &dyn Interrupt,
    ) -> StopReason {
        match controller.current_location() {
            Ok(initial) => {
                if initial.is_none() {
                    warn!("Could not determine initial position in source code");
                }
                if let Err(e) = self.observe(initial) {
                    return StopReason::Error(e.to_string());
                }
            }
            Err(e) => return StopReason::Error(e.to_string()),
        }

        loop {
            if interrupt.is_interrupted() {
                info!("Tracing stopped by user.");
                return StopReason::Interrupted;
            }

            if let Err(e) = controller.step_once(self.config.granularity) {
                if controller.is_terminated() {
                    info!("Program execution completed: {e}");
                    return StopReason::Normal;
                }
                warn!("Stepping failed: {e}");
                return StopReason::Error(e.to_string());
            }
            self.steps += 1;

            let location = match controller.current_location() {
                Ok(location) => location,
                Err(e) => {
                    warn!("Location lookup failed: {e}");
                    return StopReason::Error(e.to_string());
                }
            };

            match self.observe(location) {
                Ok(obs) => debug!(step = self.steps, ?obs, "stop"),
                Err(e) => {
                    warn!("Failed to record transition: {e}");
                    return StopReason::Error(e.to_string());
                }
            }
        }
    }

    /// Snapshot of the live graph; callable at any time.
    pub fn graph(&self) -> TraceGraph {
        self.graph.snapshot()
    }

    pub fn summary(&self, stop_reason: Option<StopReason>) -> TraceSummary {
        TraceSummary {
            transitions: self.transitions,
            skipped_foreign: self.skipped_foreign,
            skipped_no_symbol: self.skipped_no_symbol,
            steps: self.steps,
            nodes: self.graph.node_count(),
            stop_reason,
            artifacts: Vec::new(),
        }
    }

    pub fn into_log(self) -> TraceResult<W> {
        self.log.into_inner()
    }
}
