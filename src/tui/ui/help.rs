use super::layout::popup_rect;
use crate::tui::board::Board;
use crate::tui::input::KEY_HELP;
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

/// Centered, scrollable key reference.
pub fn draw_help_popup(f: &mut Frame, board: &Board) {
    let area = popup_rect(60, 70, 44, 10, f.area());
    f.render_widget(Clear, area);

    let key_width = KEY_HELP.iter().map(|(k, _)| k.chars().count()).max().unwrap_or(0);
    let lines: Vec<Line> = KEY_HELP
        .iter()
        .skip(board.help_offset)
        .map(|(key, desc)| {
            Line::from(vec![
                Span::styled(
                    format!("  {:<width$}  ", key, width = key_width),
                    Style::default().fg(Color::Yellow),
                ),
                Span::raw(*desc),
            ])
        })
        .collect();

    let block = Block::default()
        .title(" Keys ")
        .title_bottom(Line::from(" j/k scroll · Esc close ").style(Style::default().fg(Color::DarkGray)))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
    f.render_widget(Paragraph::new(lines).block(block), area);
}
