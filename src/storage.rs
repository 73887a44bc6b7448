//! Persisted session state for the remote agent.
//!
//! A small JSON document stored next to the history file so that the remote
//! conversation thread survives restarts.

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thread_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub agent_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<String>,
}

#[derive(Debug, Clone)]
pub struct SessionStore {
    path: PathBuf,
}

impl SessionStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the stored state. Missing or unreadable JSON yields the default
    /// state; the next `save` overwrites it.
    pub fn load(&self) -> SessionState {
        let Ok(content) = fs::read_to_string(&self.path) else {
            return SessionState::default();
        };

        match serde_json::from_str(&content) {
            Ok(state) => state,
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "discarding corrupt session state");
                SessionState::default()
            }
        }
    }

    pub fn save(&self, state: &SessionState) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create state directory '{}'", parent.display())
                })?;
            }
        }

        let stamped = SessionState {
            updated_at: Some(Utc::now().to_rfc3339()),
            ..state.clone()
        };
        let json = serde_json::to_string_pretty(&stamped)?;
        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write session state '{}'", self.path.display()))?;

        Ok(())
    }

    /// Remove the stored state. Removing a missing file is not an error.
    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e)
                .with_context(|| format!("Failed to remove session state '{}'", self.path.display())),
        }
    }
}
