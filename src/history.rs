//! Append-only input history file.
//!
//! One raw input line per row. The file is opened and closed on every append;
//! the process is the only writer.

use anyhow::{Context, Result};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Default number of entries shown by the `history` command.
pub const DEFAULT_RECENT: usize = 10;

#[derive(Debug, Clone)]
pub struct HistoryFile {
    path: PathBuf,
}

impl HistoryFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read every stored line, oldest first. A missing file is empty history.
    /// Bytes that are not valid UTF-8 are replaced per line rather than
    /// failing the whole file.
    pub fn load(&self) -> Result<Vec<String>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let content = fs::read(&self.path)
            .with_context(|| format!("Failed to read history file '{}'", self.path.display()))?;

        let mut rows: Vec<&[u8]> = content.split(|b| *b == b'\n').collect();
        if rows.last().is_some_and(|row| row.is_empty()) {
            rows.pop();
        }

        Ok(rows
            .into_iter()
            .map(|row| {
                let row = row.strip_suffix(b"\r").unwrap_or(row);
                String::from_utf8_lossy(row).into_owned()
            })
            .collect())
    }

    /// The last `n` lines, oldest first.
    pub fn recent(&self, n: usize) -> Result<Vec<String>> {
        let mut lines = self.load()?;
        let skip = lines.len().saturating_sub(n);
        Ok(lines.split_off(skip))
    }

    /// Append one submitted line. Embedded line breaks are flattened so the
    /// one-line-per-entry layout holds.
    pub fn append(&self, line: &str) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create history directory '{}'", parent.display())
                })?;
            }
        }

        let entry = line.replace(['\r', '\n'], " ");
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("Failed to open history file '{}'", self.path.display()))?;
        writeln!(file, "{}", entry)
            .with_context(|| format!("Failed to write history file '{}'", self.path.display()))?;

        Ok(())
    }
}
