//! Column boxes. Each box draws only the rows inside its window.

use super::layout::{column_rects, truncate_with_ellipsis};
use crate::data::{Scope, Ticket};
use crate::tui::board::{Board, Column};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

pub const LOADING_PLACEHOLDER: &str = "(loading…)";
pub const EMPTY_PLACEHOLDER: &str = "(empty)";
const SUBTASK_INDENT: &str = "  └─ ";

pub fn draw_columns(f: &mut Frame, board: &Board, area: Rect) {
    let window = board.window_height();
    let rects = column_rects(area, board.column_widths);

    for (idx, (col, rect)) in board.columns.iter().zip(rects).enumerate() {
        let selected = idx == board.selected_column;
        let border_style = if selected {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(Color::DarkGray)
        };
        let block = Block::default()
            .title(format!(" {} ({}) ", col.title(), col.issues.len()))
            .borders(Borders::ALL)
            .border_style(border_style);
        let inner = block.inner(rect);

        let lines = column_lines(
            col,
            board.scope,
            selected,
            board.show_extra_fields,
            window,
            inner.width as usize,
        );
        f.render_widget(Paragraph::new(lines).block(block), rect);
    }
}

/// Lines for one box body: indicator, windowed rows, indicator.
pub fn column_lines(
    col: &Column,
    scope: Scope,
    selected: bool,
    show_extra: bool,
    window: usize,
    width: usize,
) -> Vec<Line<'static>> {
    let muted = Style::default().fg(Color::DarkGray);

    if col.issues.is_empty() {
        let placeholder = if col.has_scope(scope) {
            EMPTY_PLACEHOLDER
        } else {
            LOADING_PLACEHOLDER
        };
        return vec![Line::from(Span::styled(placeholder, muted))];
    }

    let start = col.offset.min(col.issues.len());
    let end = (start + window).min(col.issues.len());
    let mut lines = Vec::with_capacity(end - start + 2);

    lines.push(if start > 0 {
        Line::from(Span::styled(format!("… {} above", start), muted))
    } else {
        Line::default()
    });

    for (idx, ticket) in col.issues[start..end].iter().enumerate() {
        let text = truncate_with_ellipsis(&row_text(ticket, col.backlog_mix, show_extra), width);
        let style = if selected && start + idx == col.cursor {
            Style::default()
                .fg(Color::Black)
                .bg(Color::Cyan)
                .add_modifier(Modifier::BOLD)
        } else if ticket.is_backlog() {
            muted
        } else {
            Style::default()
        };
        lines.push(Line::from(Span::styled(text, style)));
    }

    let below = col.issues.len() - end;
    lines.push(if below > 0 {
        Line::from(Span::styled(format!("… {} below", below), muted))
    } else {
        Line::default()
    });

    lines
}

/// Plain text of one ticket row, before truncation.
pub fn row_text(ticket: &Ticket, backlog_mix: bool, show_extra: bool) -> String {
    let mut line = String::new();
    if ticket.parent_key().is_some() {
        line.push_str(SUBTASK_INDENT);
    }
    if backlog_mix {
        line.push_str(if ticket.is_backlog() { "[Backlog] " } else { "[To Do] " });
    }
    line.push_str(&ticket.key);
    line.push_str(" — ");
    line.push_str(&ticket.summary);

    if show_extra {
        let mut tags = vec![match ticket.assignee_short() {
            Some(name) => format!("@{}", name),
            None => "@unassigned".to_string(),
        }];
        if let Some(priority) = ticket.priority_short() {
            tags.push(format!("P:{}", priority));
        }
        line.push_str(" [");
        line.push_str(&tags.join(" "));
        line.push(']');
    }
    line
}
