//! Session configuration, lifecycle state and the end-of-session summary.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Unit of a single step.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Granularity {
    /// One machine instruction (`stepi`).
    Instruction,
    /// One source statement, stepping over calls (`next`).
    #[default]
    Statement,
}

/// Which stops become transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scope {
    /// Every stop with a source location.
    All,
    /// Only stops the source filter classifies as program code.
    #[default]
    ProgramOnly,
}

impl Scope {
    /// Default progress interval. Program-only sessions accept far fewer
    /// stops per unit of time, so they report more often.
    pub fn default_progress_every(self) -> u64 {
        match self {
            Scope::All => 100,
            Scope::ProgramOnly => 10,
        }
    }
}

impl FromStr for Granularity {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "instruction" | "stepi" | "insn" => Ok(Granularity::Instruction),
            "statement" | "next" | "line" => Ok(Granularity::Statement),
            other => Err(format!("unknown granularity '{other}' (expected instruction|statement)")),
        }
    }
}

impl FromStr for Scope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "all" => Ok(Scope::All),
            "program-only" | "program" | "program_only" => Ok(Scope::ProgramOnly),
            other => Err(format!("unknown scope '{other}' (expected all|program-only)")),
        }
    }
}

impl fmt::Display for Granularity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Granularity::Instruction => "instruction",
            Granularity::Statement => "statement",
        })
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Scope::All => "all",
            Scope::ProgramOnly => "program-only",
        })
    }
}

/// Tracer configuration. One tracer covers the instruction-level,
/// source-filtered and fault-tolerant variants.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TraceConfig {
    pub granularity: Granularity,
    pub scope: Scope,
    /// Treat backend failures during location lookups as "no location".
    pub fault_tolerant: bool,
    /// Progress interval in accepted transitions. `None` uses the scope default.
    pub progress_every: Option<u64>,
}

impl Default for TraceConfig {
    fn default() -> Self {
        Self {
            granularity: Granularity::Statement,
            scope: Scope::ProgramOnly,
            fault_tolerant: true,
            progress_every: None,
        }
    }
}

impl TraceConfig {
    pub fn progress_interval(&self) -> u64 {
        self.progress_every
            .filter(|n| *n > 0)
            .unwrap_or_else(|| self.scope.default_progress_every())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "detail", rename_all = "kebab-case")]
pub enum StopReason {
    /// The target ran to completion (or the step primitive reported the end).
    Normal,
    /// An unrecoverable backend failure.
    Error(String),
    /// The cancellation check fired between steps.
    Interrupted,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StopReason::Normal => f.write_str("completed"),
            StopReason::Error(msg) => write!(f, "stopped on error: {msg}"),
            StopReason::Interrupted => f.write_str("interrupted"),
        }
    }
}

/// `NotStarted -> Running -> Stopped(_)`. Every stopped state is terminal.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SessionState {
    #[default]
    NotStarted,
    Running,
    Stopped(StopReason),
}

impl SessionState {
    pub fn is_running(&self) -> bool {
        matches!(self, SessionState::Running)
    }

    pub fn is_stopped(&self) -> bool {
        matches!(self, SessionState::Stopped(_))
    }
}

/// What a finished session reports to the user.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TraceSummary {
    pub transitions: u64,
    pub skipped_foreign: u64,
    pub skipped_no_symbol: u64,
    pub steps: u64,
    pub nodes: usize,
    pub stop_reason: Option<StopReason>,
    pub artifacts: Vec<PathBuf>,
}
