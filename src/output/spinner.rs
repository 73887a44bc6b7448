//! Transient "thinking" indicator drawn on stderr while a source call runs.

use colored::Colorize;
use crossterm::{cursor, execute, terminal};
use std::io::{self, IsTerminal, Write};
use std::time::Duration;
use tokio::task::JoinHandle;

const FRAMES: [&str; 10] = ["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏"];
const TICK: Duration = Duration::from_millis(80);

/// Running spinner. Stops and erases itself when dropped.
pub struct Spinner {
    task: Option<JoinHandle<()>>,
}

impl Spinner {
    /// Start spinning with `label`. Does nothing unless stderr is a terminal.
    pub fn start(label: &str) -> Self {
        if !io::stderr().is_terminal() {
            return Self { task: None };
        }

        let label = label.to_string();
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(TICK);
            let mut frame = 0usize;
            loop {
                ticker.tick().await;
                let mut stderr = io::stderr();
                let _ = write!(
                    stderr,
                    "\r{} {}",
                    FRAMES[frame % FRAMES.len()].cyan(),
                    label.dimmed()
                );
                let _ = stderr.flush();
                frame = frame.wrapping_add(1);
            }
        });

        Self { task: Some(task) }
    }

    /// A spinner that never draws.
    pub fn disabled() -> Self {
        Self { task: None }
    }

    pub fn is_active(&self) -> bool {
        self.task.is_some()
    }

    pub fn stop(mut self) {
        self.halt();
    }

    fn halt(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
            let _ = execute!(
                io::stderr(),
                cursor::MoveToColumn(0),
                terminal::Clear(terminal::ClearType::CurrentLine)
            );
        }
    }
}

impl Drop for Spinner {
    fn drop(&mut self) {
        self.halt();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_spinner_is_inert() {
        let spinner = Spinner::disabled();
        assert!(!spinner.is_active());
        spinner.stop();
    }

    #[tokio::test]
    async fn start_and_stop_do_not_panic() {
        let spinner = Spinner::start("Thinking...");
        tokio::time::sleep(Duration::from_millis(10)).await;
        spinner.stop();
    }
}
