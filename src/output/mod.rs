//! Terminal output: markdown rendering, panels, spinner and the log file.

pub mod formatter;
pub mod logger;
pub mod markdown;
pub mod panel;
pub mod spinner;
