/// Logging setup.
///
/// Diagnostics go through `tracing` to stderr. `RUST_LOG` wins when set;
/// otherwise the verbosity flag picks the level.

use tracing_subscriber::EnvFilter;

pub fn level_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "info",
        1 => "debug",
        _ => "trace",
    }
}

/// Install the global subscriber. Safe to call more than once; later calls
/// are ignored.
pub fn init_logging(verbosity: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| {
            let level = level_for(verbosity);
            EnvFilter::new(format!("flowtrace={level},gdb={level}"))
        });

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
