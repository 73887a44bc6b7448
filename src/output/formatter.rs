//! Terminal output formatting: message blocks and informational panels.
//!
//! Everything here returns strings; the chat loop decides where they go.

use colored::{Color, Colorize};
use std::path::Path;

use super::markdown::{render_markdown, Style, StyledLine};
use super::panel::{inner_width, panel};
use crate::agent::SourceStatus;
use crate::message::{Message, Role};

pub const EMPTY_HISTORY: &str = "No chat history yet.";

/// Border/title color of a role.
pub fn role_color(role: Role) -> Color {
    match role {
        Role::User => Color::Blue,
        Role::Assistant => Color::Green,
        Role::Tool => Color::Yellow,
        Role::System => Color::Red,
    }
}

/// Panel title of a message, icon included.
pub fn message_title(message: &Message, agent_name: &str) -> String {
    match message.role() {
        Role::User => "👤 User".to_string(),
        Role::Assistant => format!("🤖 {}", agent_name),
        Role::Tool => format!(
            "🔧 {} → {}",
            agent_name,
            message.tool_name().unwrap_or("tool")
        ),
        Role::System => "⚠ System".to_string(),
    }
}

/// Render one message as a bordered block `width` columns wide.
pub fn render_message(message: &Message, agent_name: &str, width: usize) -> String {
    let body = render_markdown(message.content(), inner_width(width));
    panel(
        &message_title(message, agent_name),
        &body,
        role_color(message.role()),
        width,
    )
}

pub fn welcome(agent_name: &str, kind: &str, history_file: &Path, width: usize) -> String {
    let text = format!(
        "# Welcome to Agent CLI! 🚀

Currently using: **{name}** ({kind})

A prototype testing environment for AI agents:

- 💬 **Interactive chat** with markdown support
- 🎨 **Bordered messages** colored by role
- 📝 **Input history** saved to `{history}`
- 🤖 **Pluggable agents**: local mock or remote service

## Commands

- Type your message and press **Enter** to chat
- `exit`, **Ctrl+C** or **Ctrl+D** to quit
- `clear` to start a fresh conversation
- `help` to show this message again
- `history` to see your recent inputs
- `status` to see agent information

---
*Start chatting below!*",
        name = agent_name,
        kind = kind,
        history = history_file.display(),
    );

    panel(
        "🤖 Agent CLI",
        &render_markdown(&text, inner_width(width)),
        Color::Cyan,
        width,
    )
}

/// Numbered history entries, oldest first. `first_number` is the position of
/// the first entry in the whole file.
pub fn history(entries: &[String], first_number: usize, width: usize) -> String {
    if entries.is_empty() {
        return EMPTY_HISTORY.dimmed().to_string();
    }

    let digits = (first_number + entries.len() - 1).to_string().len();
    let mut body = vec![
        StyledLine::styled(format!("Last {} inputs", entries.len()), Style::bold()),
        StyledLine::default(),
    ];
    for (i, entry) in entries.iter().enumerate() {
        let mut line = StyledLine::styled(
            format!("{:>width$}. ", first_number + i, width = digits),
            Style::dim(),
        );
        line.push(entry, Style::PLAIN);
        body.push(line);
    }

    panel("📚 History", &body, Color::Yellow, width)
}

pub fn status(status: &SourceStatus, transcript_len: usize, width: usize) -> String {
    let mut rows = vec![
        ("Name".to_string(), status.name.clone()),
        ("Type".to_string(), status.kind.to_string()),
        (
            "Initialized".to_string(),
            if status.initialized { "yes" } else { "no" }.to_string(),
        ),
        ("Conversation length".to_string(), format!("{} messages", transcript_len)),
    ];
    rows.extend(status.details.iter().cloned());

    let body: Vec<StyledLine> = rows
        .into_iter()
        .map(|(key, value)| {
            let mut line = StyledLine::styled(format!("{}: ", key), Style::bold());
            line.push(&value, Style::PLAIN);
            line
        })
        .collect();

    panel("📊 Agent Status", &body, Color::Magenta, width)
}

/// Note shown once earlier turns of a resumed conversation are loaded.
pub fn restored(count: usize) -> String {
    format!(
        "↺ Restored {} earlier message{} from this conversation. Type 'help' to see them.",
        count,
        if count == 1 { "" } else { "s" }
    )
    .dimmed()
    .to_string()
}

pub fn goodbye() -> String {
    "👋 Goodbye! Thanks for testing the Agent CLI!"
        .cyan()
        .bold()
        .to_string()
}
