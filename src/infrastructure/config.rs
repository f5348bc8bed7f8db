/// Configuration file support.
///
/// An optional TOML file supplies defaults; command-line flags override
/// whatever it sets. Every key is optional.
///
/// ```toml
/// [session]
/// granularity = "statement"
/// scope = "program-only"
/// fault_tolerant = true
///
/// [filter]
/// source_extensions = ["c", "h"]
/// ```

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::domain::session::{Granularity, Scope, TraceConfig};

pub const DEFAULT_TRACE_LOG: &str = "statement_trace.txt";
pub const DEFAULT_DOT_FILE: &str = "control_flow.dot";
pub const DEFAULT_SIMPLIFIED_DOT_FILE: &str = "simplified_control_flow.dot";
pub const DEFAULT_GDB: &str = "gdb";

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    #[serde(default)]
    pub session: SessionSection,
    #[serde(default)]
    pub filter: FilterSection,
    #[serde(default)]
    pub output: OutputSection,
}

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SessionSection {
    pub granularity: Option<Granularity>,
    pub scope: Option<Scope>,
    pub fault_tolerant: Option<bool>,
    pub progress_every: Option<u64>,
    pub gdb: Option<String>,
}

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct FilterSection {
    pub source_extensions: Option<Vec<String>>,
    pub system_roots: Option<Vec<String>>,
}

#[derive(Debug, Default, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct OutputSection {
    pub trace_log: Option<PathBuf>,
    pub dot_file: Option<PathBuf>,
    pub simplified_dot_file: Option<PathBuf>,
}

impl FileConfig {
    pub fn load(path: &Path) -> Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("Cannot read config file {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("Invalid config file {}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self> {
        Ok(toml::from_str(text)?)
    }
}

/// Flags given on the command line for a `trace` run.
#[derive(Debug, Clone, Default)]
pub struct TraceOverrides {
    pub granularity: Option<Granularity>,
    pub scope: Option<Scope>,
    pub strict: bool,
    pub progress_every: Option<u64>,
    pub gdb: Option<String>,
    pub trace_log: Option<PathBuf>,
    pub dot_file: Option<PathBuf>,
}

/// Fully resolved settings for a tracing session.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTraceSettings {
    pub config: TraceConfig,
    pub gdb: String,
    pub trace_log: PathBuf,
    pub dot_file: PathBuf,
    pub source_extensions: Option<Vec<String>>,
    pub system_roots: Option<Vec<String>>,
}

impl FileConfig {
    /// CLI flags first, then the file, then built-in defaults.
    pub fn resolve_trace(&self, cli: &TraceOverrides) -> ResolvedTraceSettings {
        let s = &self.session;
        let fault_tolerant = if cli.strict {
            false
        } else {
            s.fault_tolerant.unwrap_or(true)
        };
        ResolvedTraceSettings {
            config: TraceConfig {
                granularity: cli.granularity.or(s.granularity).unwrap_or_default(),
                scope: cli.scope.or(s.scope).unwrap_or_default(),
                fault_tolerant,
                progress_every: cli.progress_every.or(s.progress_every),
            },
            gdb: cli
                .gdb
                .clone()
                .or_else(|| s.gdb.clone())
                .unwrap_or_else(|| DEFAULT_GDB.to_string()),
            trace_log: cli
                .trace_log
                .clone()
                .or_else(|| self.output.trace_log.clone())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_TRACE_LOG)),
            dot_file: cli
                .dot_file
                .clone()
                .or_else(|| self.output.dot_file.clone())
                .unwrap_or_else(|| PathBuf::from(DEFAULT_DOT_FILE)),
            source_extensions: self.filter.source_extensions.clone(),
            system_roots: self.filter.system_roots.clone(),
        }
    }

    pub fn simplified_dot_file(&self, cli: Option<&PathBuf>) -> PathBuf {
        cli.cloned()
            .or_else(|| self.output.simplified_dot_file.clone())
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SIMPLIFIED_DOT_FILE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_empty_config_gives_defaults() {
        let cfg = FileConfig::parse("").unwrap();
        let r = cfg.resolve_trace(&TraceOverrides::default());
        assert_eq!(r.config, TraceConfig::default());
        assert_eq!(r.gdb, "gdb");
        assert_eq!(r.trace_log, PathBuf::from(DEFAULT_TRACE_LOG));
        assert_eq!(r.dot_file, PathBuf::from(DEFAULT_DOT_FILE));
        assert!(r.source_extensions.is_none());
    }

    #[test]
    fn test_file_values_apply() {
        let cfg = FileConfig::parse(
            r#"
            [session]
            granularity = "instruction"
            scope = "all"
            fault_tolerant = false
            progress_every = 500

            [filter]
            source_extensions = ["c", "h", "cc"]

            [output]
            trace_log = "out/trace.txt"
            "#,
        )
        .unwrap();
        let r = cfg.resolve_trace(&TraceOverrides::default());
        assert_eq!(r.config.granularity, Granularity::Instruction);
        assert_eq!(r.config.scope, Scope::All);
        assert!(!r.config.fault_tolerant);
        assert_eq!(r.config.progress_interval(), 500);
        assert_eq!(r.source_extensions.unwrap().len(), 3);
        assert_eq!(r.trace_log, PathBuf::from("out/trace.txt"));
    }

    #[test]
    fn test_cli_overrides_file() {
        let cfg = FileConfig::parse("[session]\nscope = \"all\"\ngdb = \"/opt/gdb\"\n").unwrap();
        let cli = TraceOverrides {
            scope: Some(Scope::ProgramOnly),
            strict: true,
            ..TraceOverrides::default()
        };
        let r = cfg.resolve_trace(&cli);
        assert_eq!(r.config.scope, Scope::ProgramOnly);
        assert!(!r.config.fault_tolerant);
        assert_eq!(r.gdb, "/opt/gdb");
    }

    #[test]
    fn test_unknown_keys_rejected() {
        assert!(FileConfig::parse("[session]\ngranularty = \"statement\"\n").is_err());
        assert!(FileConfig::parse("[session]\nscope = \"everything\"\n").is_err());
    }

    #[test]
    fn test_load_from_disk() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("flowtrace.toml");
        fs::write(&path, "[output]\nsimplified_dot_file = \"s.dot\"\n").unwrap();
        let cfg = FileConfig::load(&path).unwrap();
        assert_eq!(cfg.simplified_dot_file(None), PathBuf::from("s.dot"));
        assert_eq!(
            cfg.simplified_dot_file(Some(&PathBuf::from("cli.dot"))),
            PathBuf::from("cli.dot")
        );
        assert!(FileConfig::load(&dir.path().join("missing.toml")).is_err());
    }
}
