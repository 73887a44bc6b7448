//! Settings file discovery and loading.
//!
//! Settings live in an optional `.agent-cli.toml`. Discovery walks up from the
//! current directory; when no file is found, built-in defaults apply and the
//! current directory acts as the root for relative paths.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::{env, fs};

pub const SETTINGS_FILE: &str = ".agent-cli.toml";

/// Settings discovered for the current working directory.
#[derive(Debug, Clone)]
pub struct Workspace {
    /// Directory containing `.agent-cli.toml`, or the start directory.
    pub root: PathBuf,
    /// Path of the settings file, when one was found.
    pub source: Option<PathBuf>,
    pub settings: Settings,
}

/// Contents of `.agent-cli.toml`.
#[derive(Debug, Clone, Deserialize, Default)]
pub struct Settings {
    #[serde(default)]
    pub history: HistorySettings,
    #[serde(default)]
    pub mock: MockSettings,
    #[serde(default)]
    pub render: RenderSettings,
    #[serde(default)]
    pub foundry: FoundrySettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HistorySettings {
    #[serde(default = "default_history_file")]
    pub file: String,
    /// Entries shown by the `history` command.
    #[serde(default = "default_recent")]
    pub recent: usize,
}

impl Default for HistorySettings {
    fn default() -> Self {
        Self {
            file: default_history_file(),
            recent: default_recent(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct MockSettings {
    #[serde(default = "default_min_delay_ms")]
    pub min_delay_ms: u64,
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
    #[serde(default = "default_tool_call_probability")]
    pub tool_call_probability: f64,
}

impl Default for MockSettings {
    fn default() -> Self {
        Self {
            min_delay_ms: default_min_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            tool_call_probability: default_tool_call_probability(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct RenderSettings {
    #[serde(default = "default_max_width")]
    pub max_width: usize,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            max_width: default_max_width(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct FoundrySettings {
    #[serde(default = "default_instructions")]
    pub instructions: String,
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
    #[serde(default = "default_run_timeout_secs")]
    pub run_timeout_secs: u64,
}

impl Default for FoundrySettings {
    fn default() -> Self {
        Self {
            instructions: default_instructions(),
            poll_interval_ms: default_poll_interval_ms(),
            run_timeout_secs: default_run_timeout_secs(),
        }
    }
}

fn default_history_file() -> String {
    ".agent-cli/chat_history".to_string()
}

fn default_recent() -> usize {
    crate::history::DEFAULT_RECENT
}

fn default_min_delay_ms() -> u64 {
    100
}

fn default_max_delay_ms() -> u64 {
    300
}

fn default_tool_call_probability() -> f64 {
    0.3
}

fn default_max_width() -> usize {
    100
}

fn default_instructions() -> String {
    "You are a helpful assistant. Use the tools provided to answer questions.".to_string()
}

fn default_poll_interval_ms() -> u64 {
    500
}

fn default_run_timeout_secs() -> u64 {
    120
}

/// Discover settings by walking up from CWD.
pub fn discover() -> Result<Workspace> {
    let cwd = env::current_dir().context("Failed to get current directory")?;
    discover_from(&cwd)
}

/// Discover settings starting from a specific directory.
fn discover_from(start: &Path) -> Result<Workspace> {
    let mut current = start;

    loop {
        let settings_path = current.join(SETTINGS_FILE);
        if settings_path.is_file() {
            let settings = load_settings(&settings_path)?;
            return Ok(Workspace {
                root: current.to_path_buf(),
                source: Some(settings_path),
                settings,
            });
        }

        match current.parent() {
            Some(parent) => current = parent,
            None => {
                return Ok(Workspace {
                    root: start.to_path_buf(),
                    source: None,
                    settings: Settings::default(),
                })
            }
        }
    }
}

fn load_settings(path: &Path) -> Result<Settings> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read '{}'", path.display()))?;
    let settings: Settings = toml::from_str(&content)
        .with_context(|| format!("Invalid settings in '{}'", path.display()))?;
    Ok(settings)
}
