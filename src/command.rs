//! Input line classification: reserved commands vs chat messages.

/// Reserved keywords recognised at the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Exit,
    Clear,
    Help,
    History,
    Status,
}

impl Command {
    /// Match a whole keyword, case-insensitively. No prefix matching.
    fn from_keyword(word: &str) -> Option<Self> {
        match word.to_ascii_lowercase().as_str() {
            "exit" => Some(Command::Exit),
            "clear" => Some(Command::Clear),
            "help" => Some(Command::Help),
            "history" => Some(Command::History),
            "status" => Some(Command::Status),
            _ => None,
        }
    }

    pub fn keyword(&self) -> &'static str {
        match self {
            Command::Exit => "exit",
            Command::Clear => "clear",
            Command::Help => "help",
            Command::History => "history",
            Command::Status => "status",
        }
    }
}

/// Result of classifying one raw input line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Blank or whitespace-only; ignored.
    Empty,
    Command(Command),
    /// The raw line, untouched.
    Chat(String),
}

/// Classify a raw line read from the prompt.
pub fn parse_input(line: &str) -> Input {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Input::Empty;
    }

    match Command::from_keyword(trimmed) {
        Some(command) => Input::Command(command),
        None => Input::Chat(line.to_string()),
    }
}
