//! Scripted process-control backend for driving sessions without gdb.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::path::{Path, PathBuf};

use flowtrace::domain::error::{TraceError, TraceResult};
use flowtrace::domain::location::SourceLocation;
use flowtrace::domain::session::Granularity;
use flowtrace::ports::ProcessControl;

/// What the fake debugger reports at one stop.
#[derive(Debug, Clone)]
pub enum Stop {
    At(SourceLocation),
    NoSymbols,
    /// The location lookup itself fails.
    LookupError(String),
}

pub fn at(file: &str, line: u32) -> Stop {
    Stop::At(SourceLocation::new(file, line))
}

/// Replays a fixed list of stops. The first entry is where `launch`
/// leaves the target; every `step` pops the next one. Stepping past the end
/// exits the process.
pub struct ScriptedProcess {
    program: PathBuf,
    stops: VecDeque<Stop>,
    current: Option<Stop>,
    running: bool,
    already_running: bool,
    terminated: bool,
    /// Fail a step with a non-exit error after this many steps.
    fail_step_after: Option<usize>,
    pub steps: usize,
    pub launches: usize,
    pub arguments: Vec<String>,
    pub granularities: Vec<Granularity>,
}

impl ScriptedProcess {
    pub fn new(program: &str, stops: Vec<Stop>) -> Self {
        Self {
            program: PathBuf::from(program),
            stops: stops.into(),
            current: None,
            running: false,
            already_running: false,
            terminated: false,
            fail_step_after: None,
            steps: 0,
            launches: 0,
            arguments: Vec::new(),
            granularities: Vec::new(),
        }
    }

    /// Pretend the target was started outside the session.
    pub fn already_running(mut self) -> Self {
        self.already_running = true;
        self.running = true;
        self.current = self.stops.pop_front();
        self
    }

    pub fn fail_step_after(mut self, steps: usize) -> Self {
        self.fail_step_after = Some(steps);
        self
    }
}

impl ProcessControl for ScriptedProcess {
    fn set_arguments(&mut self, args: &[String]) -> TraceResult<()> {
        self.arguments = args.to_vec();
        Ok(())
    }

    fn is_running(&mut self) -> bool {
        self.running && !self.terminated
    }

    fn launch(&mut self) -> TraceResult<()> {
        self.launches += 1;
        self.running = true;
        self.current = self.stops.pop_front();
        Ok(())
    }

    fn step(&mut self, granularity: Granularity) -> TraceResult<()> {
        if self.terminated || !self.running {
            return Err(TraceError::SteppingError("The program is not being run.".to_string()));
        }
        if self.fail_step_after == Some(self.steps) {
            return Err(TraceError::Backend("Cannot access memory at address 0x0".to_string()));
        }
        self.steps += 1;
        self.granularities.push(granularity);
        match self.stops.pop_front() {
            Some(stop) => {
                self.current = Some(stop);
                Ok(())
            }
            None => {
                self.terminated = true;
                self.current = None;
                Err(TraceError::SteppingError("program exited-normally".to_string()))
            }
        }
    }

    fn current_location(&mut self) -> TraceResult<Option<SourceLocation>> {
        match &self.current {
            Some(Stop::At(loc)) => Ok(Some(loc.clone())),
            Some(Stop::NoSymbols) | None => Ok(None),
            Some(Stop::LookupError(msg)) => Err(TraceError::Backend(msg.clone())),
        }
    }

    fn is_terminated(&self) -> bool {
        self.terminated
    }

    fn program_path(&self) -> Option<&Path> {
        Some(&self.program)
    }
}
