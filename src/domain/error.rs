//! Error taxonomy for tracing sessions and trace post-processing.

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TraceError {
    /// A session was started while the target was already running.
    #[error("target is already running")]
    AlreadyRunning,

    /// The step primitive failed. Usually the process exited.
    #[error("stepping failed: {0}")]
    SteppingError(String),

    /// The current stop has no resolvable source location.
    #[error("no symbol information for the current stop")]
    NoSymbolInformation,

    #[error("line {line} of the trace log has no `->` separator: {content:?}")]
    MalformedLogLine { line: usize, content: String },

    #[error("annotation source {0} not found")]
    MissingAnnotationSource(PathBuf),

    /// The process-control backend failed in a way unrelated to stepping.
    #[error("debugger backend error: {0}")]
    Backend(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type TraceResult<T> = Result<T, TraceError>;
