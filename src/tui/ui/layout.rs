//! Layout calculations and text utilities for the TUI.

use ratatui::layout::{Constraint, Direction, Layout, Rect};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Vertical regions of the board screen.
#[derive(Debug, Clone, Copy)]
pub struct ScreenAreas {
    pub header: Rect,
    pub help_line: Rect,
    pub columns: Rect,
    pub filter_bar: Option<Rect>,
    pub footer: Rect,
}

/// Split the frame into header, help line, columns, optional filter bar, footer.
pub fn screen_areas(area: Rect, filter_bar_visible: bool) -> ScreenAreas {
    let mut constraints = vec![
        Constraint::Length(1), // Header
        Constraint::Length(1), // Key hints
        Constraint::Min(0),    // Column boxes
    ];
    if filter_bar_visible {
        constraints.push(Constraint::Length(2));
    }
    constraints.push(Constraint::Length(1)); // Footer

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    ScreenAreas {
        header: chunks[0],
        help_line: chunks[1],
        columns: chunks[2],
        filter_bar: filter_bar_visible.then(|| chunks[3]),
        footer: chunks[chunks.len() - 1],
    }
}

/// Split the column region by percentage hints.
pub fn column_rects(area: Rect, widths: [u16; 3]) -> [Rect; 3] {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints(widths.map(Constraint::Percentage))
        .split(area);
    [chunks[0], chunks[1], chunks[2]]
}

/// Calculate the display width of text (accounting for Unicode).
pub fn display_width(text: &str) -> usize {
    UnicodeWidthStr::width(text)
}

/// Truncate text to a maximum display width.
pub fn truncate_to_width(text: &str, max_width: usize) -> String {
    if max_width == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in text.chars() {
        let ch_width = UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + ch_width > max_width {
            break;
        }
        out.push(ch);
        used += ch_width;
    }
    out
}

/// Truncate text with an ellipsis if it exceeds max width.
pub fn truncate_with_ellipsis(text: &str, max_width: usize) -> String {
    if max_width == 0 {
        return String::new();
    }
    if display_width(text) <= max_width {
        return text.to_string();
    }
    if max_width == 1 {
        return "…".to_string();
    }
    let truncated = truncate_to_width(text, max_width - 1);
    format!("{truncated}…")
}

/// Calculate a centered popup rectangle within a container.
pub fn popup_rect(
    percent_x: u16,
    percent_y: u16,
    min_width: u16,
    min_height: u16,
    r: Rect,
) -> Rect {
    let max_width = r.width.saturating_sub(2).max(1);
    let max_height = r.height.saturating_sub(2).max(1);

    let width = (r.width.saturating_mul(percent_x) / 100)
        .max(min_width)
        .min(max_width);
    let height = (r.height.saturating_mul(percent_y) / 100)
        .max(min_height)
        .min(max_height);

    Rect {
        x: r.x + r.width.saturating_sub(width) / 2,
        y: r.y + r.height.saturating_sub(height) / 2,
        width,
        height,
    }
}
