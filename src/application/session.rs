//! Session Controller
//!
//! Owns the traced process through a [`ProcessControl`] backend and walks
//! the `NotStarted -> Running -> Stopped` lifecycle. Knows nothing about
//! graphs or filtering.

use std::path::Path;

use tracing::{debug, info, warn};

use crate::domain::error::{TraceError, TraceResult};
use crate::domain::location::SourceLocation;
use crate::domain::session::{Granularity, SessionState, StopReason};
use crate::ports::ProcessControl;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Launched,
    /// The target already had a live frame; tracing continues from there.
    AlreadyRunning,
}

pub struct SessionController<C: ProcessControl> {
    control: C,
    state: SessionState,
    fault_tolerant: bool,
}

impl<C: ProcessControl> SessionController<C> {
    pub fn new(control: C, fault_tolerant: bool) -> Self {
        Self {
            control,
            state: SessionState::NotStarted,
            fault_tolerant,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn program_path(&self) -> Option<&Path> {
        self.control.program_path()
    }

    pub fn is_terminated(&self) -> bool {
        self.control.is_terminated()
    }

    /// Start (or adopt) the target. Starting twice is not an error: the
    /// second call logs a notice and reports `AlreadyRunning`.
    pub fn start(&mut self, args: &[String]) -> TraceResult<StartOutcome> {
        match &self.state {
            SessionState::Running => {
                info!("{}; continuing with tracing", TraceError::AlreadyRunning);
                return Ok(StartOutcome::AlreadyRunning);
            }
            SessionState::Stopped(reason) => {
                return Err(TraceError::SteppingError(format!("session already ended ({reason})")));
            }
            SessionState::NotStarted => {}
        }

        if !args.is_empty() {
            match self.control.set_arguments(args) {
                Ok(()) => info!("Set program arguments: {}", args.join(" ")),
                Err(e) => warn!("Could not set arguments: {e}"),
            }
        }

        if self.control.is_running() {
            info!("Program is already running, continuing with tracing");
            self.state = SessionState::Running;
            return Ok(StartOutcome::AlreadyRunning);
        }

        info!("Starting program...");
        self.control.launch()?;
        self.state = SessionState::Running;
        Ok(StartOutcome::Launched)
    }

    /// Advance by exactly one instruction or statement. Any failure of the
    /// primitive, including "process exited", surfaces as `SteppingError`.
    pub fn step_once(&mut self, granularity: Granularity) -> TraceResult<()> {
        if !self.state.is_running() {
            return Err(TraceError::SteppingError(format!(
                "cannot step in state {:?}",
                self.state
            )));
        }
        self.control.step(granularity).map_err(|e| match e {
            TraceError::SteppingError(msg) => TraceError::SteppingError(msg),
            other => TraceError::SteppingError(other.to_string()),
        })
    }

    /// Current source location. Missing debug info is `Ok(None)`; backend
    /// failures are folded into `Ok(None)` as well when fault tolerant.
    pub fn current_location(&mut self) -> TraceResult<Option<SourceLocation>> {
        match self.control.current_location() {
            Ok(loc) => Ok(loc),
            Err(e) if self.fault_tolerant => {
                debug!("location lookup failed, treating as {}: {e}", TraceError::NoSymbolInformation);
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    /// Move to a terminal state. The first reason wins.
    pub fn finish(&mut self, reason: StopReason) -> &StopReason {
        if !self.state.is_stopped() {
            self.state = SessionState::Stopped(reason);
        }
        match &self.state {
            SessionState::Stopped(reason) => reason,
            _ => unreachable!("state was just set to Stopped"),
        }
    }

    pub fn into_inner(self) -> C {
        self.control
    }
}
