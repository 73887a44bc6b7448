//! Markdown to styled terminal lines.
//!
//! Text is parsed with pulldown-cmark and flattened into `StyledLine`s that
//! are already wrapped to a target width, so callers only have to pad and
//! frame them.

use colored::{ColoredString, Colorize};
use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Style {
    pub bold: bool,
    pub italic: bool,
    pub strike: bool,
    pub code: bool,
    pub heading: bool,
    pub link: bool,
    pub dim: bool,
}

impl Style {
    pub const PLAIN: Style = Style {
        bold: false,
        italic: false,
        strike: false,
        code: false,
        heading: false,
        link: false,
        dim: false,
    };

    pub fn bold() -> Self {
        Style { bold: true, ..Style::PLAIN }
    }

    pub fn dim() -> Self {
        Style { dim: true, ..Style::PLAIN }
    }

    fn paint(&self, text: &str) -> ColoredString {
        let mut out = text.normal();
        if self.heading {
            out = out.cyan().bold();
        }
        if self.code {
            out = out.yellow();
        }
        if self.link {
            out = out.blue().underline();
        }
        if self.bold {
            out = out.bold();
        }
        if self.italic {
            out = out.italic();
        }
        if self.strike {
            out = out.strikethrough();
        }
        if self.dim {
            out = out.dimmed();
        }
        out
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub style: Style,
}

/// One terminal row of styled text.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StyledLine {
    pub spans: Vec<Span>,
}

impl StyledLine {
    pub fn plain(text: impl Into<String>) -> Self {
        Self::styled(text, Style::PLAIN)
    }

    pub fn styled(text: impl Into<String>, style: Style) -> Self {
        let mut line = StyledLine::default();
        line.push(&text.into(), style);
        line
    }

    pub fn push(&mut self, text: &str, style: Style) {
        if text.is_empty() {
            return;
        }
        match self.spans.last_mut() {
            Some(last) if last.style == style => last.text.push_str(text),
            _ => self.spans.push(Span {
                text: text.to_string(),
                style,
            }),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.spans.iter().all(|s| s.text.is_empty())
    }

    /// Display width in terminal columns.
    pub fn width(&self) -> usize {
        self.spans.iter().map(|s| s.text.width()).sum()
    }

    /// Text without styling.
    pub fn text(&self) -> String {
        self.spans.iter().map(|s| s.text.as_str()).collect()
    }

    pub fn to_ansi(&self) -> String {
        self.spans
            .iter()
            .map(|s| s.style.paint(&s.text).to_string())
            .collect()
    }

    fn trim_end(&mut self) {
        while let Some(last) = self.spans.last_mut() {
            let trimmed = last.text.trim_end().len();
            last.text.truncate(trimmed);
            if last.text.is_empty() {
                self.spans.pop();
            } else {
                break;
            }
        }
    }
}

/// Render markdown into lines no wider than `width` columns.
pub fn render_markdown(source: &str, width: usize) -> Vec<StyledLine> {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_STRIKETHROUGH);
    options.insert(Options::ENABLE_TASKLISTS);

    let mut renderer = Renderer::new(width.max(1));
    for event in Parser::new_ext(source, options) {
        renderer.handle(event);
    }
    renderer.finish()
}

/// Greedy word wrap. Words wider than `width` are broken by character.
pub fn wrap_line(line: &StyledLine, width: usize) -> Vec<StyledLine> {
    let width = width.max(1);
    let mut out = Vec::new();
    let mut current = StyledLine::default();
    let mut used = 0;

    for span in &line.spans {
        for token in tokens(&span.text) {
            let token_width = token.width();
            let is_space = token.chars().all(char::is_whitespace);

            if is_space {
                if used == 0 {
                    continue;
                }
                if used + token_width > width {
                    current.trim_end();
                    out.push(std::mem::take(&mut current));
                    used = 0;
                    continue;
                }
                current.push(token, span.style);
                used += token_width;
                continue;
            }

            if used > 0 && used + token_width > width {
                current.trim_end();
                out.push(std::mem::take(&mut current));
                used = 0;
            }

            if token_width <= width {
                current.push(token, span.style);
                used += token_width;
                continue;
            }

            let mut buf = [0u8; 4];
            for ch in token.chars() {
                let ch_width = ch.width().unwrap_or(0);
                if used > 0 && used + ch_width > width {
                    out.push(std::mem::take(&mut current));
                    used = 0;
                }
                current.push(ch.encode_utf8(&mut buf), span.style);
                used += ch_width;
            }
        }
    }

    current.trim_end();
    if !current.is_empty() || out.is_empty() {
        out.push(current);
    }
    out
}

/// Split into alternating runs of whitespace and non-whitespace.
fn tokens(text: &str) -> Vec<&str> {
    let mut out = Vec::new();
    let mut start = 0;
    let mut last_space: Option<bool> = None;

    for (i, ch) in text.char_indices() {
        let space = ch.is_whitespace();
        if let Some(prev) = last_space {
            if prev != space {
                out.push(&text[start..i]);
                start = i;
            }
        }
        last_space = Some(space);
    }
    if start < text.len() {
        out.push(&text[start..]);
    }
    out
}

struct ListLevel {
    next: Option<u64>,
    marker_width: usize,
}

const BULLETS: [&str; 3] = ["•", "◦", "▪"];

struct Renderer {
    width: usize,
    lines: Vec<StyledLine>,
    current: StyledLine,
    bold: usize,
    italic: usize,
    strike: usize,
    heading: bool,
    links: Vec<String>,
    lists: Vec<ListLevel>,
    /// Marker still to be printed on the first row of the current item.
    marker: Option<String>,
    quote_depth: usize,
    code: Option<String>,
}

impl Renderer {
    fn new(width: usize) -> Self {
        Self {
            width,
            lines: Vec::new(),
            current: StyledLine::default(),
            bold: 0,
            italic: 0,
            strike: 0,
            heading: false,
            links: Vec::new(),
            lists: Vec::new(),
            marker: None,
            quote_depth: 0,
            code: None,
        }
    }

    fn style(&self) -> Style {
        Style {
            bold: self.bold > 0,
            italic: self.italic > 0 || self.quote_depth > 0,
            strike: self.strike > 0,
            heading: self.heading,
            link: !self.links.is_empty(),
            ..Style::PLAIN
        }
    }

    fn handle(&mut self, event: Event) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => match self.code.as_mut() {
                Some(buf) => buf.push_str(&text),
                None => {
                    let style = self.style();
                    self.current.push(&text, style);
                }
            },
            Event::Code(code) => {
                let style = Style {
                    code: true,
                    ..self.style()
                };
                self.current.push(&code, style);
            }
            Event::Html(html) | Event::InlineHtml(html) => {
                let style = self.style();
                self.current.push(html.trim_end_matches('\n'), style);
            }
            Event::SoftBreak => {
                let style = self.style();
                self.current.push(" ", style);
            }
            Event::HardBreak => self.flush(),
            Event::Rule => {
                self.flush();
                self.gap();
                let rule = "─".repeat(self.width);
                self.lines.push(StyledLine::styled(rule, Style::dim()));
            }
            Event::TaskListMarker(done) => {
                let style = self.style();
                self.current.push(if done { "[x] " } else { "[ ] " }, style);
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag) {
        match tag {
            Tag::Paragraph => {
                if self.lists.is_empty() {
                    self.gap();
                }
            }
            Tag::Heading { .. } => {
                self.flush();
                self.gap();
                self.heading = true;
            }
            Tag::BlockQuote { .. } => {
                self.flush();
                if self.quote_depth == 0 && self.lists.is_empty() {
                    self.gap();
                }
                self.quote_depth += 1;
            }
            Tag::CodeBlock(kind) => {
                self.flush();
                if self.lists.is_empty() {
                    self.gap();
                }
                if let CodeBlockKind::Fenced(lang) = kind {
                    if !lang.is_empty() {
                        self.lines.push(self.prefixed(StyledLine::styled(lang.to_string(), Style::dim())));
                    }
                }
                self.code = Some(String::new());
            }
            Tag::List(start) => {
                self.flush();
                if self.lists.is_empty() && self.quote_depth == 0 {
                    self.gap();
                }
                let marker_width = match start {
                    Some(n) => format!("{}. ", n).width(),
                    None => 2,
                };
                self.lists.push(ListLevel {
                    next: start,
                    marker_width,
                });
            }
            Tag::Item => {
                self.flush();
                let depth = self.lists.len();
                if let Some(level) = self.lists.last_mut() {
                    let marker = match level.next.as_mut() {
                        Some(n) => {
                            let marker = format!("{}. ", n);
                            *n += 1;
                            marker
                        }
                        None => format!("{} ", BULLETS[(depth - 1) % BULLETS.len()]),
                    };
                    level.marker_width = level.marker_width.max(marker.width());
                    self.marker = Some(marker);
                }
            }
            Tag::Emphasis => self.italic += 1,
            Tag::Strong => self.bold += 1,
            Tag::Strikethrough => self.strike += 1,
            Tag::Link { dest_url, .. } => self.links.push(dest_url.to_string()),
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => self.flush(),
            TagEnd::Heading { .. } => {
                self.flush_with(Style {
                    heading: true,
                    ..Style::PLAIN
                });
                self.heading = false;
            }
            TagEnd::BlockQuote { .. } => {
                self.flush();
                self.quote_depth = self.quote_depth.saturating_sub(1);
            }
            TagEnd::CodeBlock => {
                let code = self.code.take().unwrap_or_default();
                let style = Style {
                    code: true,
                    ..Style::PLAIN
                };
                let indent = "  ";
                let available = self
                    .width
                    .saturating_sub(self.prefix_width() + indent.width())
                    .max(1);
                for raw in code.trim_end_matches('\n').split('\n') {
                    for chunk in hard_wrap(raw, available) {
                        let mut line = StyledLine::plain(indent);
                        line.push(&chunk, style);
                        self.lines.push(self.prefixed(line));
                    }
                }
            }
            TagEnd::List { .. } => {
                self.flush();
                self.lists.pop();
            }
            TagEnd::Item => {
                self.flush();
                self.marker = None;
            }
            TagEnd::Emphasis => self.italic = self.italic.saturating_sub(1),
            TagEnd::Strong => self.bold = self.bold.saturating_sub(1),
            TagEnd::Strikethrough => self.strike = self.strike.saturating_sub(1),
            TagEnd::Link => {
                if let Some(url) = self.links.pop() {
                    let label = self.current.text();
                    if !url.is_empty() && !label.ends_with(url.as_str()) {
                        self.current.push(&format!(" ({})", url), Style::dim());
                    }
                }
            }
            _ => {}
        }
    }

    /// Separate blocks with a single blank line.
    fn gap(&mut self) {
        if self.lines.last().is_some_and(|l| !l.is_empty()) {
            self.lines.push(StyledLine::default());
        }
    }

    /// Quote bars plus list indentation that precede every row.
    fn prefix(&self) -> String {
        let mut prefix = "│ ".repeat(self.quote_depth);
        if let Some((_, outer)) = self.lists.split_last() {
            for level in outer {
                prefix.push_str(&" ".repeat(level.marker_width));
            }
        }
        prefix
    }

    fn prefix_width(&self) -> usize {
        let marker = self.lists.last().map(|l| l.marker_width).unwrap_or(0);
        self.prefix().width() + marker
    }

    fn prefixed(&self, line: StyledLine) -> StyledLine {
        let mut out = StyledLine::styled(self.prefix(), Style::dim());
        if let Some(level) = self.lists.last() {
            out.push(&" ".repeat(level.marker_width), Style::PLAIN);
        }
        out.spans.extend(line.spans);
        out
    }

    fn flush(&mut self) {
        self.flush_with(Style::PLAIN);
    }

    fn flush_with(&mut self, marker_style: Style) {
        if self.current.is_empty() {
            self.current = StyledLine::default();
            return;
        }

        let line = std::mem::take(&mut self.current);
        let prefix = self.prefix();
        let marker_width = self.lists.last().map(|l| l.marker_width).unwrap_or(0);
        let available = self
            .width
            .saturating_sub(prefix.width() + marker_width)
            .max(1);
        let marker = self.marker.take();

        for (i, wrapped) in wrap_line(&line, available).into_iter().enumerate() {
            let mut out = StyledLine::styled(prefix.clone(), Style::dim());
            match (&marker, i) {
                (Some(marker), 0) => {
                    let pad = marker_width.saturating_sub(marker.width());
                    out.push(&format!("{}{}", marker, " ".repeat(pad)), marker_style);
                }
                _ => out.push(&" ".repeat(marker_width), Style::PLAIN),
            }
            out.spans.extend(wrapped.spans);
            self.lines.push(out);
        }
    }

    fn finish(mut self) -> Vec<StyledLine> {
        self.flush();
        while self.lines.last().is_some_and(StyledLine::is_empty) {
            self.lines.pop();
        }
        self.lines
    }
}

fn hard_wrap(text: &str, width: usize) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut used = 0;

    for ch in text.chars() {
        let ch_width = ch.width().unwrap_or(0);
        if used > 0 && used + ch_width > width {
            out.push(std::mem::take(&mut current));
            used = 0;
        }
        current.push(ch);
        used += ch_width;
    }
    out.push(current);
    out
}
