//! Logging setup for the netfacts CLI
//!
//! Engine events go to stderr, or to a log file when `--log-file` is given.
//! `RUST_LOG` takes precedence over the `-v` count.

use anyhow::{anyhow, Context, Result};
use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Crates whose events are shown
const TARGETS: &[&str] = &["netfacts", "netfacts_core", "netfacts_rules"];

/// Level selected by the number of `-v` flags
pub fn level_for(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "error",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

/// Default log file location, timestamped so runs do not overwrite each other
pub fn default_log_path() -> PathBuf {
    let timestamp = chrono::Local::now().format("%Y%m%d_%H%M%S");
    std::env::temp_dir().join(format!("netfacts-{}.log", timestamp))
}

fn filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let directives: Vec<String> = TARGETS.iter().map(|t| format!("{}={}", t, level)).collect();
        EnvFilter::new(directives.join(","))
    })
}

/// Install the global subscriber.
///
/// `log_file` is `Some(None)` for `--log-file` without a path. Returns the
/// log file in use, if any. File logging records at least debug events.
pub fn init_logging(verbosity: u8, log_file: Option<Option<PathBuf>>) -> Result<Option<PathBuf>> {
    match log_file {
        None => {
            tracing_subscriber::fmt()
                .with_env_filter(filter(level_for(verbosity)))
                .with_writer(std::io::stderr)
                .with_target(false)
                .try_init()
                .map_err(|e| anyhow!("Failed to initialise logging: {}", e))?;
            Ok(None)
        }
        Some(path) => {
            let path = path.unwrap_or_else(default_log_path);
            let file = File::create(&path)
                .with_context(|| format!("Failed to create log file {}", path.display()))?;

            tracing_subscriber::fmt()
                .with_env_filter(filter(level_for(verbosity.max(2))))
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .try_init()
                .map_err(|e| anyhow!("Failed to initialise logging: {}", e))?;
            Ok(Some(path))
        }
    }
}
