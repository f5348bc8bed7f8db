// Use cases for flowtrace: a live tracing session and the offline visualize pass.

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::domain::session::{TraceConfig, TraceSummary};
use crate::domain::source_filter::{ProgramIdentity, SourceFilter};
use crate::domain::trace_log::TraceLogWriter;
use crate::ports::{Interrupt, OutputExporter, ProcessControl};

pub mod postprocess;
pub mod session;
pub mod tracer;

pub use postprocess::{PostProcessor, VisualizeReport, VisualizeRequest};
pub use session::{SessionController, StartOutcome};
pub use tracer::{Observation, Tracer};

/// An exporter paired with its output path.
pub struct ExportTarget<'a> {
    pub exporter: &'a dyn OutputExporter,
    pub path: PathBuf,
}

pub struct TraceUsecase<'a> {
    pub config: TraceConfig,
    pub source_extensions: Option<Vec<String>>,
    pub system_roots: Option<Vec<String>>,
    pub trace_log: PathBuf,
    pub exports: Vec<ExportTarget<'a>>,
}

impl<'a> TraceUsecase<'a> {
    /// Run one session end to end. The graph is exported whatever way the
    /// session ends; only a failure to launch returns early, before anything
    /// was recorded.
    pub fn run<C: ProcessControl>(
        &self,
        control: C,
        program_args: &[String],
        interrupt: &dyn Interrupt,
    ) -> Result<TraceSummary> {
        let mut controller = SessionController::new(control, self.config.fault_tolerant);
        controller.start(program_args).context("Error starting program")?;

        let identity = match controller.program_path() {
            Some(path) => {
                info!("Tracing program: {}", path.display());
                ProgramIdentity::from_path(path)
            }
            None => {
                warn!("Could not determine program name");
                ProgramIdentity::unknown()
            }
        };
        let filter = self.build_filter(identity);

        let log = TraceLogWriter::create(&self.trace_log)
            .with_context(|| format!("Failed to create trace log {}", self.trace_log.display()))?;
        info!("Tracing program execution to {}", self.trace_log.display());
        info!(
            granularity = %self.config.granularity,
            scope = %self.config.scope,
            fault_tolerant = self.config.fault_tolerant,
            "Press Ctrl+C to stop tracing at any time."
        );

        let mut tracer = Tracer::new(self.config.clone(), filter, log);
        let reason = tracer.run(&mut controller, interrupt);
        info!("Session {reason}");

        let graph = tracer.graph();
        let mut summary = tracer.summary(Some(reason));
        summary.artifacts.push(self.trace_log.clone());

        let mut first_error = None;
        for target in &self.exports {
            match target.exporter.export_trace(&graph, &target.path) {
                Ok(()) => {
                    info!("Control flow graph saved to {}", target.path.display());
                    summary.artifacts.push(target.path.clone());
                }
                Err(e) => {
                    warn!("Failed to write {}: {e}", target.path.display());
                    first_error.get_or_insert_with(|| {
                        anyhow::Error::new(e).context(format!("Failed to write {}", target.path.display()))
                    });
                }
            }
        }

        match first_error {
            Some(e) => Err(e),
            None => Ok(summary),
        }
    }

    fn build_filter(&self, identity: ProgramIdentity) -> SourceFilter {
        let mut filter = SourceFilter::new(identity);
        if let Some(exts) = &self.source_extensions {
            filter = filter.with_source_extensions(exts.clone());
        }
        if let Some(roots) = &self.system_roots {
            filter = filter.with_system_roots(roots.clone());
        }
        filter
    }
}
