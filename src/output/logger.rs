//! Diagnostic logging to a per-run file, keeping the terminal clean.

use anyhow::{anyhow, Context, Result};
use chrono::Utc;
use std::env;
use std::fs::File;
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

/// Create the log directory and return a fresh, timestamped log file path.
pub fn setup_log_file() -> Result<PathBuf> {
    let log_dir = log_directory();
    std::fs::create_dir_all(&log_dir)
        .with_context(|| format!("Failed to create log directory '{}'", log_dir.display()))?;

    let timestamp = Utc::now().format("%Y%m%d-%H%M%S").to_string();
    Ok(log_dir.join(format!("{}.log", timestamp)))
}

/// `$TMPDIR/agent-cli/logs/<project>`, where project is the name of the
/// current directory.
pub fn log_directory() -> PathBuf {
    let base_dir = env::var("TMPDIR")
        .or_else(|_| env::var("XDG_RUNTIME_DIR"))
        .unwrap_or_else(|_| "/tmp".to_string());

    let project_name = env::current_dir()
        .ok()
        .and_then(|p| p.file_name().map(|n| n.to_string_lossy().to_string()))
        .unwrap_or_else(|| "unknown".to_string());

    PathBuf::from(base_dir)
        .join("agent-cli")
        .join("logs")
        .join(project_name)
}

/// Parse a filter directive, falling back to `warn` when it is malformed.
pub fn env_filter(directive: &str) -> EnvFilter {
    EnvFilter::try_new(directive).unwrap_or_else(|_| EnvFilter::new("warn"))
}

/// Install the global subscriber writing to a new log file. Returns the path.
pub fn init(directive: &str) -> Result<PathBuf> {
    let path = setup_log_file()?;
    let file = File::create(&path)
        .with_context(|| format!("Failed to create log file '{}'", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(env_filter(directive))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(|e| anyhow!("Failed to initialize logging: {}", e))?;

    tracing::info!(path = %path.display(), "logging initialized");
    Ok(path)
}
