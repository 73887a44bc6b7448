//! Rounded, titled frames around styled lines.

use colored::{Color, Colorize};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use super::markdown::{wrap_line, StyledLine};

/// Narrowest frame drawn, whatever the terminal reports.
pub const MIN_WIDTH: usize = 40;

/// Columns of blank space between the border and the text.
const PAD_X: usize = 2;
/// Blank rows above and below the text.
const PAD_Y: usize = 1;

/// Frame width for the current terminal, clamped to `[MIN_WIDTH, max_width]`.
pub fn frame_width(max_width: usize) -> usize {
    let columns = crossterm::terminal::size()
        .map(|(w, _)| w as usize)
        .unwrap_or(80);
    clamp_width(columns, max_width)
}

pub fn clamp_width(columns: usize, max_width: usize) -> usize {
    columns.clamp(MIN_WIDTH, max_width.max(MIN_WIDTH))
}

/// Columns available for text inside a frame of `width`.
pub fn inner_width(width: usize) -> usize {
    width.saturating_sub(2 + 2 * PAD_X)
}

/// Draw `body` inside a frame exactly `width` columns wide.
///
/// Lines wider than the inner width are wrapped again, so callers may pass
/// unwrapped text.
pub fn panel(title: &str, body: &[StyledLine], color: Color, width: usize) -> String {
    let width = width.max(MIN_WIDTH);
    let inner = inner_width(width);
    let side = "│".color(color).to_string();
    let mut out = String::new();

    out.push_str(&top_border(title, color, width));
    out.push('\n');

    let blank = format!("{}{}{}\n", side, " ".repeat(width - 2), side);
    for _ in 0..PAD_Y {
        out.push_str(&blank);
    }

    for line in body {
        for row in fit(line, inner) {
            let fill = inner.saturating_sub(row.width());
            out.push_str(&side);
            out.push_str(&" ".repeat(PAD_X));
            out.push_str(&row.to_ansi());
            out.push_str(&" ".repeat(fill + PAD_X));
            out.push_str(&side);
            out.push('\n');
        }
    }

    for _ in 0..PAD_Y {
        out.push_str(&blank);
    }

    let bottom = format!("╰{}╯", "─".repeat(width - 2));
    out.push_str(&bottom.color(color).to_string());
    out
}

fn fit(line: &StyledLine, inner: usize) -> Vec<StyledLine> {
    if line.width() <= inner {
        vec![line.clone()]
    } else {
        wrap_line(line, inner)
    }
}

/// `╭─ title ───╮`, truncating the title if it does not fit.
fn top_border(title: &str, color: Color, width: usize) -> String {
    // Corners, one dash before the title, spaces around it, one dash after.
    let max_title = width.saturating_sub(6);
    let title = truncate(title, max_title);

    if title.is_empty() {
        return format!("╭{}╮", "─".repeat(width - 2)).color(color).to_string();
    }

    let used = 2 + 1 + 2 + title.width();
    let dashes = width.saturating_sub(used);
    format!(
        "{}{}{}",
        "╭─ ".color(color),
        title.color(color).bold(),
        format!(" {}╮", "─".repeat(dashes)).color(color)
    )
}

fn truncate(text: &str, max: usize) -> String {
    if text.width() <= max {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let w = ch.width().unwrap_or(0);
        if used + w + 1 > max {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(rendered: &str) -> Vec<&str> {
        rendered.lines().collect()
    }

    fn no_color() {
        colored::control::set_override(false);
    }

    #[test]
    fn width_is_clamped() {
        assert_eq!(clamp_width(20, 100), 40);
        assert_eq!(clamp_width(80, 100), 80);
        assert_eq!(clamp_width(200, 100), 100);
        assert_eq!(clamp_width(200, 10), 40);
    }

    #[test]
    fn every_row_has_frame_width() {
        no_color();
        let body = vec![StyledLine::plain("hello"), StyledLine::plain("日本語")];
        let rendered = panel("👤 User", &body, Color::Blue, 40);
        for row in rows(&rendered) {
            assert_eq!(row.width(), 40, "row {:?}", row);
        }
    }

    #[test]
    fn layout_has_padding_and_corners() {
        no_color();
        let rendered = panel("Title", &[StyledLine::plain("body")], Color::Cyan, 40);
        let rows = rows(&rendered);
        assert_eq!(rows.len(), 5);
        assert!(rows[0].starts_with("╭─ Title ─"));
        assert!(rows[0].ends_with('╮'));
        assert_eq!(rows[1].trim_matches('│').trim(), "");
        assert!(rows[2].starts_with("│  body "));
        assert!(rows[4].starts_with('╰') && rows[4].ends_with('╯'));
    }

    #[test]
    fn long_body_lines_are_rewrapped() {
        no_color();
        let long = StyledLine::plain("word ".repeat(30));
        let rendered = panel("T", &[long], Color::Green, 40);
        assert!(rows(&rendered).len() > 5);
        for row in rows(&rendered) {
            assert_eq!(row.width(), 40);
        }
    }

    #[test]
    fn long_title_is_truncated() {
        no_color();
        let title = "x".repeat(80);
        let rendered = panel(&title, &[], Color::Yellow, 40);
        let top = rows(&rendered)[0];
        assert_eq!(top.width(), 40);
        assert!(top.contains('…'));
    }
}
