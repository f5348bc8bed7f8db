//! Source locations and the START sentinel.

use std::fmt;
use std::path::Path;

use serde::Serialize;

/// A `file:line` pair observed at a stop.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct SourceLocation {
    pub file: String,
    pub line: u32,
}

impl SourceLocation {
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }

    /// Parse `file:line`, splitting at the last colon so that paths
    /// containing colons survive. Returns `None` for line 0 or garbage.
    pub fn parse(s: &str) -> Option<Self> {
        let (file, line) = s.trim().rsplit_once(':')?;
        let line: u32 = line.trim().parse().ok()?;
        if file.is_empty() || line == 0 {
            return None;
        }
        Some(Self::new(file, line))
    }

    /// File name without directory components.
    pub fn basename(&self) -> &str {
        basename(&self.file)
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

/// An endpoint of a transition: either the synthetic START or a real location.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum TracePoint {
    Start,
    Location(SourceLocation),
}

impl TracePoint {
    pub const START_LABEL: &'static str = "START";

    pub fn is_start(&self) -> bool {
        matches!(self, TracePoint::Start)
    }

    pub fn location(&self) -> Option<&SourceLocation> {
        match self {
            TracePoint::Start => None,
            TracePoint::Location(loc) => Some(loc),
        }
    }
}

impl From<SourceLocation> for TracePoint {
    fn from(loc: SourceLocation) -> Self {
        TracePoint::Location(loc)
    }
}

impl fmt::Display for TracePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TracePoint::Start => f.write_str(Self::START_LABEL),
            TracePoint::Location(loc) => loc.fmt(f),
        }
    }
}

/// Strip directory components from a path string.
pub fn basename(path: &str) -> &str {
    Path::new(path)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(path)
}
