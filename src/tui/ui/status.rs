//! Header, key hints, filter bar and footer.

use crate::tui::board::{Board, LoadState};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

pub fn header_text(board: &Board) -> String {
    format!(
        "Personal Kanban — Projects: {} — Scope: {}",
        board.projects.join(", "),
        board.scope.label()
    )
}

pub fn draw_header(f: &mut Frame, board: &Board, area: Rect) {
    let line = Line::from(Span::styled(
        header_text(board),
        Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD),
    ));
    f.render_widget(Paragraph::new(line), area);
}

pub fn draw_help_line(f: &mut Frame, area: Rect) {
    let key = Style::default().fg(Color::Yellow);
    let text = Style::default().fg(Color::DarkGray);
    let hints = [
        ("h/l", "column"),
        ("j/k", "move"),
        ("s", "scope"),
        ("r", "refresh"),
        ("/", "filter"),
        ("o", "open"),
        ("b", "branch"),
        ("Enter", "start"),
        ("?", "help"),
        ("q", "quit"),
    ];

    let mut spans = Vec::with_capacity(hints.len() * 2);
    for (k, desc) in hints {
        spans.push(Span::styled(k, key));
        spans.push(Span::styled(format!(" {}  ", desc), text));
    }
    f.render_widget(Paragraph::new(Line::from(spans)), area);
}

pub fn draw_filter_bar(f: &mut Frame, board: &Board, area: Rect) {
    let mut input = vec![
        Span::styled("Filter: ", Style::default().fg(Color::Yellow)),
        Span::raw(board.filter.clone()),
    ];
    let hint = if board.filtering {
        input.push(Span::styled("▏", Style::default().fg(Color::Cyan)));
        "Esc keep filter · Enter start · Ctrl+u clear"
    } else {
        "/ to edit"
    };

    let lines = vec![
        Line::from(input),
        Line::from(Span::styled(hint, Style::default().fg(Color::DarkGray))),
    ];
    f.render_widget(Paragraph::new(lines), area);
}

pub fn draw_footer(f: &mut Frame, board: &Board, spinner: char, area: Rect) {
    let mut spans = match &board.state {
        LoadState::Loading => vec![Span::styled(
            format!("{} Loading {}…", spinner, board.scope.label()),
            Style::default().fg(Color::Yellow),
        )],
        LoadState::Error(msg) => vec![Span::styled(
            format!("Error: {}", msg),
            Style::default().fg(Color::Red),
        )],
        LoadState::Ready => vec![Span::styled("Ready", Style::default().fg(Color::Green))],
    };

    if !board.filter.is_empty() {
        let matches: usize = board.columns.iter().map(|c| c.issues.len()).sum();
        spans.push(Span::styled(
            format!("  filter \"{}\": {} matches", board.filter, matches),
            Style::default().fg(Color::DarkGray),
        ));
    }

    f.render_widget(Paragraph::new(Line::from(spans)), area);
}
