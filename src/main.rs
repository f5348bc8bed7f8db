// Command-line entry point for flowtrace.

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, warn};

use flowtrace::application::{ExportTarget, PostProcessor, TraceUsecase, VisualizeRequest};
use flowtrace::domain::session::{Granularity, Scope, StopReason, TraceSummary};
use flowtrace::infrastructure::config::{FileConfig, TraceOverrides};
use flowtrace::infrastructure::logging::init_logging;
use flowtrace::infrastructure::{graphviz, DotExporter, GdbMiBackend, InterruptFlag, JsonExporter};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// TOML config file; command-line flags override it
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Single-step a program under gdb and record the source lines it visits
    Trace {
        /// Program to trace (built with debug info)
        program: PathBuf,

        /// Arguments passed to the program
        #[arg(last = true)]
        args: Vec<String>,

        /// Step unit (instruction, statement)
        #[arg(short, long)]
        granularity: Option<Granularity>,

        /// Which stops to record (all, program-only)
        #[arg(short, long)]
        scope: Option<Scope>,

        /// End the session on backend errors during location lookups
        #[arg(long)]
        strict: bool,

        /// Progress message every N recorded transitions
        #[arg(long)]
        progress_every: Option<u64>,

        /// Trace log path
        #[arg(long)]
        trace_log: Option<PathBuf>,

        /// Graphviz DOT output path
        #[arg(long)]
        dot: Option<PathBuf>,

        /// Also write the graph as JSON
        #[arg(long)]
        json: Option<PathBuf>,

        /// gdb executable
        #[arg(long)]
        gdb: Option<String>,

        /// Render the DOT file with Graphviz (png, svg, pdf, ...)
        #[arg(long)]
        render: Option<String>,

        /// Write the session summary as JSON
        #[arg(long)]
        summary_json: Option<PathBuf>,
    },

    /// Simplify a trace log into a cleaner graph and annotate a source file
    Visualize {
        /// Trace log written by `trace`
        trace_log: PathBuf,

        /// Source file to annotate with execution order
        source_file: Option<PathBuf>,

        /// Simplified DOT output path
        #[arg(long)]
        dot: Option<PathBuf>,

        /// Annotated listing path (default: <SOURCE_FILE>.annotated.txt)
        #[arg(long)]
        annotated: Option<PathBuf>,

        /// Also write the simplified graph as JSON
        #[arg(long)]
        json: Option<PathBuf>,

        /// Render the DOT file with Graphviz (png, svg, pdf, ...)
        #[arg(long)]
        render: Option<String>,
    },
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(cli) {
        Ok(code) => code,
        Err(e) => {
            error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<ExitCode> {
    let file_config = match &cli.config {
        Some(path) => FileConfig::load(path)?,
        None => FileConfig::default(),
    };

    match cli.command {
        Commands::Trace {
            program,
            args,
            granularity,
            scope,
            strict,
            progress_every,
            trace_log,
            dot,
            json,
            gdb,
            render,
            summary_json,
        } => {
            let overrides = TraceOverrides {
                granularity,
                scope,
                strict,
                progress_every,
                gdb,
                trace_log,
                dot_file: dot,
            };
            let settings = file_config.resolve_trace(&overrides);

            let interrupt = InterruptFlag::new();
            interrupt.register_signals()?;

            let backend = GdbMiBackend::spawn(&settings.gdb, &program)
                .with_context(|| format!("Failed to load {} into gdb", program.display()))?;

            let mut exports = vec![ExportTarget {
                exporter: &DotExporter,
                path: settings.dot_file.clone(),
            }];
            if let Some(path) = json {
                exports.push(ExportTarget {
                    exporter: &JsonExporter,
                    path,
                });
            }

            let usecase = TraceUsecase {
                config: settings.config.clone(),
                source_extensions: settings.source_extensions.clone(),
                system_roots: settings.system_roots.clone(),
                trace_log: settings.trace_log.clone(),
                exports,
            };
            let mut summary = usecase.run(backend, &args, &interrupt)?;

            finish_render(&settings.dot_file, render.as_deref(), &mut summary.artifacts);
            print_trace_summary(&summary);

            if let Some(path) = summary_json {
                let json = serde_json::to_string_pretty(&summary)?;
                std::fs::write(&path, json)
                    .with_context(|| format!("Failed to write {}", path.display()))?;
            }

            Ok(match summary.stop_reason {
                Some(StopReason::Error(_)) => ExitCode::from(2),
                _ => ExitCode::SUCCESS,
            })
        }

        Commands::Visualize {
            trace_log,
            source_file,
            dot,
            annotated,
            json,
            render,
        } => {
            let dot_file = file_config.simplified_dot_file(dot.as_ref());
            let mut exports = vec![ExportTarget {
                exporter: &DotExporter,
                path: dot_file.clone(),
            }];
            if let Some(path) = json {
                exports.push(ExportTarget {
                    exporter: &JsonExporter,
                    path,
                });
            }

            let request = VisualizeRequest {
                trace_log,
                source_file,
                annotated_path: annotated,
            };
            let mut report = PostProcessor { exports }.run(&request)?;
            finish_render(&dot_file, render.as_deref(), &mut report.artifacts);

            println!("Found {} transitions", report.transitions);
            println!("Simplified to {} unique transitions", report.simplified);
            println!("Generated graph with {} nodes and {} edges", report.nodes, report.edges);
            for artifact in &report.artifacts {
                println!("  wrote {}", artifact.display());
            }
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn finish_render(dot_file: &Path, format: Option<&str>, artifacts: &mut Vec<PathBuf>) {
    match format {
        Some(format) => match graphviz::render(dot_file, format) {
            Ok(image) => artifacts.push(image),
            Err(e) => warn!("Rendering skipped: {e:#}"),
        },
        None => {
            println!("You can visualize the graph using Graphviz:");
            println!("  {}", graphviz::render_hint(dot_file));
        }
    }
}

fn print_trace_summary(summary: &TraceSummary) {
    if let Some(reason) = &summary.stop_reason {
        println!("Session {reason}.");
    }
    println!("Traced {} statements from your source code.", summary.transitions);
    println!("Skipped {} statements from library/system code.", summary.skipped_foreign);
    if summary.skipped_no_symbol > 0 {
        println!("Skipped {} stops without debug information.", summary.skipped_no_symbol);
    }
    for artifact in &summary.artifacts {
        println!("  wrote {}", artifact.display());
    }
}
