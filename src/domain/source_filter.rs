//! Source Filter
//!
//! Decides whether a stop belongs to the traced program or to foreign
//! (library/runtime) code, from the filename alone.

use std::path::Path;

use super::location::{basename, SourceLocation};

pub const DEFAULT_SOURCE_EXTENSIONS: &[&str] = &["c", "h"];
pub const DEFAULT_SYSTEM_ROOTS: &[&str] = &["/usr/"];

/// Identity of the traced program, fixed at session start.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramIdentity {
    /// Base name of the executable up to its first `.`; empty when unknown.
    stem: String,
}

impl ProgramIdentity {
    pub fn from_path(program: impl AsRef<Path>) -> Self {
        let name = program
            .as_ref()
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let stem = name.split('.').next().unwrap_or_default().to_string();
        Self { stem }
    }

    pub fn unknown() -> Self {
        Self::default()
    }

    pub fn stem(&self) -> &str {
        &self.stem
    }
}

/// Program-vs-foreign classification. Rules are applied in order, first
/// match wins:
/// 1. no filename => foreign
/// 2. basename starts with the program stem => program
/// 3. program-source extension outside every system root => program
/// 4. foreign
#[derive(Debug, Clone)]
pub struct SourceFilter {
    identity: ProgramIdentity,
    source_extensions: Vec<String>,
    system_roots: Vec<String>,
}

impl SourceFilter {
    pub fn new(identity: ProgramIdentity) -> Self {
        Self {
            identity,
            source_extensions: DEFAULT_SOURCE_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            system_roots: DEFAULT_SYSTEM_ROOTS.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn with_source_extensions(mut self, exts: Vec<String>) -> Self {
        self.source_extensions = exts;
        self
    }

    pub fn with_system_roots(mut self, roots: Vec<String>) -> Self {
        self.system_roots = roots;
        self
    }

    pub fn identity(&self) -> &ProgramIdentity {
        &self.identity
    }

    pub fn is_in_scope(&self, location: Option<&SourceLocation>) -> bool {
        match location {
            Some(loc) => self.is_program_file(&loc.file),
            None => false,
        }
    }

    pub fn is_program_file(&self, filename: &str) -> bool {
        if filename.is_empty() {
            return false;
        }

        let file_base = basename(filename);
        let stem = self.identity.stem();
        if !stem.is_empty() && file_base.starts_with(stem) {
            return true;
        }

        let has_source_ext = self
            .source_extensions
            .iter()
            .any(|ext| file_base.ends_with(&format!(".{ext}")));
        let under_system_root = self.system_roots.iter().any(|root| filename.contains(root.as_str()));

        has_source_ext && !under_system_root
    }
}
