//! Durable trace log: one `from -> to` transition per line, in execution order.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use tracing::debug;

use super::error::{TraceError, TraceResult};
use super::location::TracePoint;

pub const ARROW: &str = " -> ";

/// A raw transition read back from a log. Endpoints stay as text: the
/// post-processing pass re-keys them itself.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TraceEvent {
    pub from: String,
    pub to: String,
}

impl TraceEvent {
    pub fn new(from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            from: from.into(),
            to: to.into(),
        }
    }

    pub fn format(from: &TracePoint, to: &TracePoint) -> String {
        format!("{from}{ARROW}{to}")
    }

    /// Parse one log line. `line_no` is 1-based and only used for the error.
    pub fn parse_line(line_no: usize, line: &str) -> TraceResult<Self> {
        let trimmed = line.trim();
        let malformed = || TraceError::MalformedLogLine {
            line: line_no,
            content: trimmed.to_string(),
        };
        let (from, to) = trimmed.split_once("->").ok_or_else(malformed)?;
        let (from, to) = (from.trim(), to.trim());
        if from.is_empty() || to.is_empty() {
            return Err(malformed());
        }
        Ok(Self::new(from, to))
    }
}

/// Parsed log contents plus how many lines were dropped.
#[derive(Debug, Default)]
pub struct ParsedLog {
    pub events: Vec<TraceEvent>,
    pub malformed: usize,
}

pub fn parse_trace<R: BufRead>(reader: R) -> TraceResult<ParsedLog> {
    let mut parsed = ParsedLog::default();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match TraceEvent::parse_line(idx + 1, &line) {
            Ok(event) => parsed.events.push(event),
            Err(e) => {
                debug!("skipping trace line: {e}");
                parsed.malformed += 1;
            }
        }
    }
    Ok(parsed)
}

pub fn read_trace_file(path: &Path) -> TraceResult<ParsedLog> {
    let file = File::open(path)?;
    parse_trace(BufReader::new(file))
}

/// Single writer for a session's log.
pub struct TraceLogWriter<W: Write> {
    out: W,
    written: u64,
}

impl TraceLogWriter<BufWriter<File>> {
    pub fn create(path: &Path) -> TraceResult<Self> {
        let file = File::create(path)?;
        Ok(Self::new(BufWriter::new(file)))
    }
}

impl<W: Write> TraceLogWriter<W> {
    pub fn new(out: W) -> Self {
        Self { out, written: 0 }
    }

    pub fn append(&mut self, from: &TracePoint, to: &TracePoint) -> TraceResult<()> {
        writeln!(self.out, "{}", TraceEvent::format(from, to))?;
        self.written += 1;
        Ok(())
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    pub fn flush(&mut self) -> TraceResult<()> {
        self.out.flush()?;
        Ok(())
    }

    pub fn into_inner(mut self) -> TraceResult<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::location::SourceLocation;

    #[test]
    fn test_writer_format() {
        let mut w = TraceLogWriter::new(Vec::new());
        let a: TracePoint = SourceLocation::new("main.c", 10).into();
        let b: TracePoint = SourceLocation::new("main.c", 11).into();
        w.append(&TracePoint::Start, &a).unwrap();
        w.append(&a, &b).unwrap();
        assert_eq!(w.written(), 2);
        let text = String::from_utf8(w.into_inner().unwrap()).unwrap();
        assert_eq!(text, "START -> main.c:10\nmain.c:10 -> main.c:11\n");
    }

    #[test]
    fn test_parse_skips_malformed_lines() {
        let log = "START -> f.c:1\nnot a transition\n\nf.c:1 -> f.c:2\n -> f.c:3\n";
        let parsed = parse_trace(log.as_bytes()).unwrap();
        assert_eq!(
            parsed.events,
            vec![TraceEvent::new("START", "f.c:1"), TraceEvent::new("f.c:1", "f.c:2")]
        );
        assert_eq!(parsed.malformed, 2);
    }

    #[test]
    fn test_parse_line_error_carries_position() {
        match TraceEvent::parse_line(7, "garbage") {
            Err(TraceError::MalformedLogLine { line, content }) => {
                assert_eq!(line, 7);
                assert_eq!(content, "garbage");
            }
            other => panic!("unexpected: {other:?}"),
        }
    }
}
