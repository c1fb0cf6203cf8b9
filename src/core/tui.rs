use colored::{ColoredString, Colorize};
use std::env;
use std::io::{self, Write};

const MIN_BOX_WIDTH: usize = 40;
const MAX_BOX_WIDTH: usize = 50;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum BoxStyle {
    Info,
    Warning,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ItemStatus {
    Created,
    Updated,
    Removed,
    Skipped,
    Failed,
    Info,
}

impl ItemStatus {
    pub fn icon(&self) -> &'static str {
        match self {
            ItemStatus::Created => "✨",
            ItemStatus::Updated => "🔄",
            ItemStatus::Removed => "🗑",
            ItemStatus::Skipped => "⏭",
            ItemStatus::Failed => "💥",
            ItemStatus::Info => "💡",
        }
    }

    fn paint(&self, s: &str) -> ColoredString {
        match self {
            ItemStatus::Created => s.bright_green(),
            ItemStatus::Updated => s.bright_yellow(),
            ItemStatus::Removed | ItemStatus::Failed => s.bright_red(),
            ItemStatus::Skipped => s.bright_black(),
            ItemStatus::Info => s.cyan(),
        }
    }
}

pub fn terminal_width() -> usize {
    env::var("TERM_WIDTH")
        .ok()
        .and_then(|w| w.parse().ok())
        .or_else(|| env::var("COLUMNS").ok().and_then(|c| c.parse().ok()))
        .unwrap_or(80)
}

fn effective_width() -> usize {
    terminal_width().clamp(MIN_BOX_WIDTH, MAX_BOX_WIDTH)
}

pub fn box_top(width: usize) -> String {
    format!("╔{}╗", "═".repeat(width.saturating_sub(2)))
}

pub fn box_bottom(width: usize) -> String {
    format!("╚{}╝", "═".repeat(width.saturating_sub(2)))
}

/// Centre `content` between `left` and `right` in a row `width` chars wide.
pub fn box_row(left: &str, content: &str, right: &str, width: usize) -> String {
    let content_len = content.chars().count();
    let padding = width.saturating_sub(2).saturating_sub(content_len);
    let left_pad = padding / 2;
    let right_pad = padding - left_pad;
    format!(
        "{}{}{}{}{}",
        left,
        " ".repeat(left_pad),
        content,
        " ".repeat(right_pad),
        right
    )
}

pub fn render_box(out: &mut dyn Write, title: &str, subtitle: &str, style: BoxStyle) -> io::Result<()> {
    let width = effective_width();
    let paint = |s: String, bold: bool| -> ColoredString {
        let c = match style {
            BoxStyle::Info => s.as_str().bright_cyan(),
            BoxStyle::Warning => s.as_str().bright_yellow(),
        };
        if bold { c.bold() } else { c }
    };

    writeln!(out, "{}", paint(box_top(width), false))?;
    writeln!(out, "{}", paint(box_row("║", title, "║", width), true))?;
    if !subtitle.is_empty() {
        writeln!(out, "{}", paint(box_row("║", subtitle, "║", width), false))?;
    }
    writeln!(out, "{}", paint(box_bottom(width), false))
}

pub fn print_status_line(out: &mut dyn Write, message: &str, status: ItemStatus) -> io::Result<()> {
    writeln!(
        out,
        "  {} {}",
        status.paint(status.icon()),
        message.bright_white()
    )
}
