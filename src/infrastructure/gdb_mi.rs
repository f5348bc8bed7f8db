/// GDB machine-interface backend.
///
/// Drives `gdb --interpreter=mi2` as a child process and implements
/// [`ProcessControl`] on top of it:
/// - start: `-exec-arguments`, then `-exec-run --start` (stops at `main`)
/// - step: `-exec-next` / `-exec-step-instruction`, waiting for `*stopped`
/// - location: `-stack-info-frame`
///
/// gdb runs in its own process group so a terminal Ctrl+C only reaches the
/// tracer, which then stops between steps.

use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};

use tracing::{debug, info, trace};

use super::mi_record::{parse_line, MiLine, MiRecord, MiValue, RecordKind};
use crate::domain::error::{TraceError, TraceResult};
use crate::domain::location::SourceLocation;
use crate::domain::session::Granularity;
use crate::ports::ProcessControl;

// ═══════════════════════════════════════════════════════════════════════════
// Testable Command Builder
// ═══════════════════════════════════════════════════════════════════════════

/// The gdb invocation for a given program.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GdbCommandSpec {
    pub program: String,
    pub args: Vec<String>,
}

pub fn build_command_spec(gdb: &str, target: &Path) -> GdbCommandSpec {
    GdbCommandSpec {
        program: gdb.to_string(),
        args: vec![
            "--interpreter=mi2".to_string(),
            "-q".to_string(),
            "-nx".to_string(),
            target.to_string_lossy().into_owned(),
        ],
    }
}

/// MI command for one step of the given granularity.
pub fn step_command(granularity: Granularity) -> &'static str {
    match granularity {
        Granularity::Instruction => "-exec-step-instruction",
        Granularity::Statement => "-exec-next",
    }
}

/// Quote a program argument for `-exec-arguments`. gdb hands the argument
/// string to the shell, and MI itself unescapes C strings, so unsafe
/// arguments are shell-quoted and then wrapped as an MI C string.
pub fn quote_argument(arg: &str) -> String {
    let safe = !arg.is_empty()
        && arg
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "_./=:,+-@%".contains(c));
    if safe {
        return arg.to_string();
    }
    let shell = format!("'{}'", arg.replace('\'', "'\\''"));
    format!("\"{}\"", shell.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Extract a location from a frame tuple. `file` (the symtab name) is
/// preferred over `fullname`; frames without both file and line have no
/// usable debug info.
pub fn frame_location(frame: &MiValue) -> Option<SourceLocation> {
    let file = frame
        .get("file")
        .or_else(|| frame.get("fullname"))
        .and_then(MiValue::as_str)?;
    let line: u32 = frame.get("line").and_then(MiValue::as_str)?.parse().ok()?;
    if file.is_empty() || line == 0 {
        return None;
    }
    Some(SourceLocation::new(file, line))
}

// ═══════════════════════════════════════════════════════════════════════════
// Backend
// ═══════════════════════════════════════════════════════════════════════════

pub struct GdbMiBackend {
    child: Child,
    stdin: ChildStdin,
    stdout: BufReader<ChildStdout>,
    target: PathBuf,
    next_token: u64,
    pending_stop: Option<MiRecord>,
    terminated: bool,
}

impl GdbMiBackend {
    /// Spawn gdb with `target` loaded and wait for its first prompt.
    pub fn spawn(gdb: &str, target: &Path) -> TraceResult<Self> {
        let spec = build_command_spec(gdb, target);
        let mut command = Command::new(&spec.program);
        command
            .args(&spec.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            command.process_group(0);
        }

        let mut child = command
            .spawn()
            .map_err(|e| TraceError::Backend(format!("failed to launch {gdb}: {e}")))?;
        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| TraceError::Backend("gdb stdin unavailable".to_string()))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| TraceError::Backend("gdb stdout unavailable".to_string()))?;

        let mut backend = Self {
            child,
            stdin,
            stdout: BufReader::new(stdout),
            target: target.to_path_buf(),
            next_token: 1,
            pending_stop: None,
            terminated: false,
        };
        backend.wait_for_prompt()?;
        backend.expect_done("-gdb-set pagination off")?;
        backend.expect_done("-gdb-set confirm off")?;
        info!("gdb ready with {}", target.display());
        Ok(backend)
    }

    fn wait_for_prompt(&mut self) -> TraceResult<()> {
        loop {
            match self.read_line()? {
                MiLine::Prompt => return Ok(()),
                other => self.note(other),
            }
        }
    }

    fn read_line(&mut self) -> TraceResult<MiLine> {
        let mut buf = String::new();
        if self.stdout.read_line(&mut buf)? == 0 {
            self.terminated = true;
            return Err(TraceError::Backend("gdb closed its output".to_string()));
        }
        trace!(mi = buf.trim_end(), "<-");
        Ok(parse_line(&buf))
    }

    /// Handle anything that is not the record being waited for.
    fn note(&mut self, line: MiLine) {
        match line {
            MiLine::Record(r) if r.kind == RecordKind::Exec && r.class == "stopped" => {
                self.pending_stop = Some(r);
            }
            MiLine::Record(r) if r.kind == RecordKind::Notify && r.class == "thread-group-exited" => {
                self.terminated = true;
            }
            MiLine::Record(r) => trace!(class = %r.class, "async record"),
            MiLine::Stream { channel: '@', text } => print!("{text}"),
            MiLine::Stream { text, .. } => debug!(target: "gdb", "{}", text.trim_end()),
            MiLine::Other(text) => println!("{text}"),
            MiLine::Prompt => {}
        }
    }

    fn send(&mut self, command: &str) -> TraceResult<u64> {
        let token = self.next_token;
        self.next_token += 1;
        trace!(mi = command, token, "->");
        writeln!(self.stdin, "{token}{command}")?;
        self.stdin.flush()?;
        Ok(token)
    }

    /// Send a command and return its result record, whatever its class.
    fn execute(&mut self, command: &str) -> TraceResult<MiRecord> {
        let token = self.send(command)?;
        loop {
            match self.read_line()? {
                MiLine::Record(r) if r.kind == RecordKind::Result && r.token == Some(token) => {
                    if r.class == "exit" {
                        self.terminated = true;
                    }
                    return Ok(r);
                }
                other => self.note(other),
            }
        }
    }

    fn expect_done(&mut self, command: &str) -> TraceResult<MiRecord> {
        let result = self.execute(command)?;
        if result.class == "error" {
            return Err(TraceError::Backend(error_message(&result)));
        }
        Ok(result)
    }

    /// Run an execution command and wait for the inferior to stop again.
    /// Errors from the command itself are stepping errors.
    fn run_until_stopped(&mut self, command: &str) -> TraceResult<MiRecord> {
        self.pending_stop = None;
        let result = self.execute(command)?;
        if result.class == "error" {
            return Err(TraceError::SteppingError(error_message(&result)));
        }
        loop {
            if let Some(stop) = self.pending_stop.take() {
                return Ok(stop);
            }
            let line = self.read_line()?;
            self.note(line);
        }
    }

    /// Mark the inferior gone if `stop` says so.
    fn check_exit(&mut self, stop: &MiRecord) -> TraceResult<()> {
        let reason = stop.get_str("reason").unwrap_or("unknown");
        if reason.starts_with("exited") {
            self.terminated = true;
            let detail = match stop.get_str("exit-code").or_else(|| stop.get_str("signal-name")) {
                Some(code) => format!("program {reason} ({code})"),
                None => format!("program {reason}"),
            };
            return Err(TraceError::SteppingError(detail));
        }
        Ok(())
    }
}

fn error_message(record: &MiRecord) -> String {
    record.get_str("msg").unwrap_or("unknown gdb error").to_string()
}

impl ProcessControl for GdbMiBackend {
    fn set_arguments(&mut self, args: &[String]) -> TraceResult<()> {
        let quoted: Vec<String> = args.iter().map(|a| quote_argument(a)).collect();
        self.expect_done(&format!("-exec-arguments {}", quoted.join(" ")))?;
        Ok(())
    }

    fn is_running(&mut self) -> bool {
        if self.terminated {
            return false;
        }
        matches!(self.execute("-stack-info-frame"), Ok(r) if r.class == "done")
    }

    fn launch(&mut self) -> TraceResult<()> {
        let stop = self
            .run_until_stopped("-exec-run --start")
            .map_err(|e| TraceError::Backend(format!("could not start program: {e}")))?;
        self.check_exit(&stop)
            .map_err(|e| TraceError::Backend(format!("{e} before reaching main")))?;
        Ok(())
    }

    fn step(&mut self, granularity: Granularity) -> TraceResult<()> {
        if self.terminated {
            return Err(TraceError::SteppingError("The program is not being run.".to_string()));
        }
        let stop = self.run_until_stopped(step_command(granularity))?;
        self.check_exit(&stop)
    }

    fn current_location(&mut self) -> TraceResult<Option<SourceLocation>> {
        if self.terminated {
            return Err(TraceError::Backend("No stack.".to_string()));
        }
        let result = self.expect_done("-stack-info-frame")?;
        Ok(result.get("frame").and_then(frame_location))
    }

    fn is_terminated(&self) -> bool {
        self.terminated
    }

    fn program_path(&self) -> Option<&Path> {
        Some(&self.target)
    }
}

impl Drop for GdbMiBackend {
    fn drop(&mut self) {
        let _ = writeln!(self.stdin, "-gdb-exit");
        let _ = self.stdin.flush();
        if let Ok(None) = self.child.try_wait() {
            let _ = self.child.kill();
        }
        let _ = self.child.wait();
    }
}
