//! The interactive read loop.
//!
//! `ChatSession` owns the transcript and drives one turn at a time:
//! read a line, classify it, run a command or forward it to the response
//! source, and render whatever comes back.

use anyhow::Result;
use crossterm::{cursor, execute, terminal};
use rustyline::error::ReadlineError;
use rustyline::DefaultEditor;
use std::io::Write;
use std::path::PathBuf;

use crate::agent::ResponseSource;
use crate::command::{parse_input, Command, Input};
use crate::history::HistoryFile;
use crate::interrupt::InFlight;
use crate::message::Message;
use crate::output::formatter;
use crate::output::panel::frame_width;
use crate::output::spinner::Spinner;
use crate::storage::SessionStore;

pub const PROMPT: &str = "💬 You: ";

/// Messages replayed by `help` so the conversation stays in view.
pub const HELP_REPLAY: usize = 6;

/// What a single `read_line` produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadOutcome {
    Line(String),
    /// Ctrl+C at the prompt.
    Interrupted,
    /// Ctrl+D or end of input.
    Eof,
}

/// Source of input lines. The terminal implementation uses rustyline; tests
/// script it.
pub trait LineReader {
    fn read_line(&mut self, prompt: &str) -> Result<ReadOutcome>;

    /// Make an accepted line available to in-session recall (arrow keys).
    fn remember(&mut self, _line: &str) {}
}

/// Line editor on the controlling terminal.
///
/// Recall is seeded from the history file; the file itself is written only
/// through `HistoryFile`, so the editor never saves its own history.
pub struct Terminal {
    editor: DefaultEditor,
}

impl Terminal {
    pub fn new(seed: &[String]) -> Result<Self> {
        let config = rustyline::Config::builder().auto_add_history(false).build();
        let mut editor = DefaultEditor::with_config(config)?;
        for entry in seed {
            editor.add_history_entry(entry.as_str())?;
        }
        Ok(Self { editor })
    }
}

impl LineReader for Terminal {
    fn read_line(&mut self, prompt: &str) -> Result<ReadOutcome> {
        match self.editor.readline(prompt) {
            Ok(line) => Ok(ReadOutcome::Line(line)),
            Err(ReadlineError::Interrupted) => Ok(ReadOutcome::Interrupted),
            Err(ReadlineError::Eof) => Ok(ReadOutcome::Eof),
            Err(e) => Err(e.into()),
        }
    }

    fn remember(&mut self, line: &str) {
        if let Err(e) = self.editor.add_history_entry(line) {
            tracing::debug!(error = %e, "could not add line to editor history");
        }
    }
}

/// Whether the loop should keep reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Continue,
    Exit,
}

/// Why the session ended. All of these are a normal exit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    ExitCommand,
    Interrupted,
    EndOfInput,
}

#[derive(Debug, Clone)]
pub struct ChatOptions {
    /// Fixed frame width; `None` measures the terminal on every render.
    pub width: Option<usize>,
    pub max_width: usize,
    /// Entries shown by `history`.
    pub history_recent: usize,
    /// Draw the thinking spinner during source calls.
    pub spinner: bool,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            width: None,
            max_width: 100,
            history_recent: crate::history::DEFAULT_RECENT,
            spinner: true,
        }
    }
}

pub struct ChatSession<R, W> {
    reader: R,
    out: W,
    source: Box<dyn ResponseSource>,
    history: HistoryFile,
    store: SessionStore,
    transcript: Vec<Message>,
    options: ChatOptions,
}

impl<R: LineReader, W: Write> ChatSession<R, W> {
    pub fn new(
        reader: R,
        out: W,
        source: Box<dyn ResponseSource>,
        history: HistoryFile,
        store: SessionStore,
        options: ChatOptions,
    ) -> Self {
        Self {
            reader,
            out,
            source,
            history,
            store,
            transcript: Vec::new(),
            options,
        }
    }

    pub fn transcript(&self) -> &[Message] {
        &self.transcript
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    pub fn history_path(&self) -> PathBuf {
        self.history.path().to_path_buf()
    }

    /// Run until `exit`, Ctrl+C at the prompt or end of input.
    pub async fn run(&mut self) -> Result<SessionEnd> {
        self.clear_screen()?;
        self.show_welcome()?;

        loop {
            match self.reader.read_line(PROMPT)? {
                ReadOutcome::Line(line) => {
                    if self.handle_line(&line).await? == Outcome::Exit {
                        return Ok(SessionEnd::ExitCommand);
                    }
                }
                ReadOutcome::Interrupted => {
                    writeln!(self.out)?;
                    writeln!(self.out, "{}", formatter::goodbye())?;
                    return Ok(SessionEnd::Interrupted);
                }
                ReadOutcome::Eof => {
                    writeln!(self.out, "{}", formatter::goodbye())?;
                    return Ok(SessionEnd::EndOfInput);
                }
            }
        }
    }

    /// Process one raw input line.
    pub async fn handle_line(&mut self, line: &str) -> Result<Outcome> {
        match parse_input(line) {
            Input::Empty => Ok(Outcome::Continue),
            Input::Command(command) => self.run_command(command).await,
            Input::Chat(text) => {
                self.chat(text).await?;
                Ok(Outcome::Continue)
            }
        }
    }

    async fn run_command(&mut self, command: Command) -> Result<Outcome> {
        tracing::debug!(command = command.keyword(), "running command");

        match command {
            Command::Exit => {
                writeln!(self.out, "{}", formatter::goodbye())?;
                self.out.flush()?;
                return Ok(Outcome::Exit);
            }
            Command::Clear => {
                self.transcript.clear();
                let reset = {
                    let _in_flight = InFlight::begin();
                    self.source.reset().await
                };
                if let Err(e) = reset {
                    tracing::warn!(error = %e, "failed to reset response source");
                }
                if let Err(e) = self.store.clear() {
                    tracing::warn!(error = %format!("{:#}", e), "failed to clear session state");
                }
                self.clear_screen()?;
                self.show_welcome()?;
            }
            Command::Help => {
                self.clear_screen()?;
                self.show_welcome()?;
                let start = self.transcript.len().saturating_sub(HELP_REPLAY);
                let recent = self.transcript[start..].to_vec();
                for message in &recent {
                    self.show(message)?;
                }
            }
            Command::History => self.show_history()?,
            Command::Status => {
                let rendered =
                    formatter::status(&self.source.status(), self.transcript.len(), self.width());
                self.emit(&rendered)?;
            }
        }

        Ok(Outcome::Continue)
    }

    async fn chat(&mut self, text: String) -> Result<()> {
        if let Err(e) = self.history.append(&text) {
            tracing::warn!(error = %format!("{:#}", e), "failed to append to history file");
        }
        self.reader.remember(&text);

        let user = Message::user(text);
        self.show(&user)?;
        let turn_start = self.transcript.len();
        self.transcript.push(user.clone());

        let spinner = if self.options.spinner {
            Spinner::start("Thinking...")
        } else {
            Spinner::disabled()
        };
        let result = {
            let _in_flight = InFlight::begin();
            self.source.send(user.content()).await
        };
        spinner.stop();

        let restored: Vec<Message> = self
            .source
            .take_restored()
            .into_iter()
            .map(|event| event.into_message())
            .collect();
        if !restored.is_empty() {
            writeln!(self.out, "{}", formatter::restored(restored.len()))?;
            let turn = self.transcript.split_off(turn_start);
            self.transcript.extend(restored);
            self.transcript.extend(turn);
        }

        match result {
            Ok(events) => {
                for event in events {
                    let message = event.into_message();
                    self.show(&message)?;
                    self.transcript.push(message);
                }
            }
            Err(e) => {
                tracing::error!(error = %e, "response source failed");
                let message = Message::system(format!("Error: {}", e));
                self.show(&message)?;
                self.transcript.push(message);
            }
        }

        Ok(())
    }

    fn show_history(&mut self) -> Result<()> {
        let rendered = match self.history.load() {
            Ok(lines) => {
                let start = lines.len().saturating_sub(self.options.history_recent);
                formatter::history(&lines[start..], start + 1, self.width())
            }
            Err(e) => formatter::render_message(
                &Message::system(format!("Error: {:#}", e)),
                self.source.name(),
                self.width(),
            ),
        };
        self.emit(&rendered)
    }

    fn show_welcome(&mut self) -> Result<()> {
        let kind = self.source.status().kind;
        let rendered = formatter::welcome(
            self.source.name(),
            kind,
            self.history.path(),
            self.width(),
        );
        self.emit(&rendered)
    }

    fn show(&mut self, message: &Message) -> Result<()> {
        let rendered = formatter::render_message(message, self.source.name(), self.width());
        self.emit(&rendered)
    }

    fn emit(&mut self, block: &str) -> Result<()> {
        writeln!(self.out, "{}", block)?;
        writeln!(self.out)?;
        self.out.flush()?;
        Ok(())
    }

    fn clear_screen(&mut self) -> Result<()> {
        execute!(
            self.out,
            terminal::Clear(terminal::ClearType::All),
            cursor::MoveTo(0, 0)
        )?;
        Ok(())
    }

    fn width(&self) -> usize {
        self.options
            .width
            .unwrap_or_else(|| frame_width(self.options.max_width))
    }
}
