/// Graphviz renderer.
///
/// Optional post-export step: turns a written `.dot` file into an image by
/// running the external `dot` tool. A missing tool is reported, never fatal
/// for the artifacts already on disk.

use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{bail, Context, Result};
use tracing::info;

pub const DOT_COMMAND: &str = "dot";

/// Describes the command that would be run for a given render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderCommandSpec {
    pub program: String,
    pub args: Vec<String>,
    pub output: PathBuf,
}

pub fn build_command_spec(dot_file: &Path, format: &str) -> RenderCommandSpec {
    let output = dot_file.with_extension(format);
    RenderCommandSpec {
        program: DOT_COMMAND.to_string(),
        args: vec![
            format!("-T{format}"),
            dot_file.to_string_lossy().into_owned(),
            "-o".to_string(),
            output.to_string_lossy().into_owned(),
        ],
        output,
    }
}

/// Hint printed when no renderer was requested.
pub fn render_hint(dot_file: &Path) -> String {
    let spec = build_command_spec(dot_file, "png");
    format!("{} {}", spec.program, spec.args.join(" "))
}

/// Render `dot_file` to `format` (png, svg, pdf, ...). Returns the image path.
pub fn render(dot_file: &Path, format: &str) -> Result<PathBuf> {
    check_renderer_available()?;
    let spec = build_command_spec(dot_file, format);
    let status = Command::new(&spec.program)
        .args(&spec.args)
        .status()
        .with_context(|| format!("Failed to execute {}", spec.program))?;
    if !status.success() {
        bail!("{} failed with exit code: {:?}", spec.program, status.code());
    }
    info!("Rendered {}", spec.output.display());
    Ok(spec.output)
}

fn check_renderer_available() -> Result<()> {
    match Command::new(DOT_COMMAND).arg("-V").output() {
        Ok(output) if output.status.success() => Ok(()),
        Ok(output) => bail!("{DOT_COMMAND} found but returned error: {:?}", output.status.code()),
        Err(_) => bail!("{DOT_COMMAND} not found in PATH. Install Graphviz: https://graphviz.org/download/"),
    }
}
