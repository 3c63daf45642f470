//! TUI rendering module.
//!
//! Drawing is a pure read of [`Board`]: nothing here mutates state.
//!
//! - `layout` - screen regions and text width utilities
//! - `columns` - the three windowed column boxes
//! - `status` - header, key hints, filter bar, footer
//! - `help` - help overlay

pub mod columns;
mod help;
pub mod layout;
mod status;

use crate::tui::board::Board;
use ratatui::Frame;

pub use status::header_text;

/// Braille spinner frames for loading animation
pub const SPINNER_FRAMES: &[char] = &['⠋', '⠙', '⠹', '⠸', '⠼', '⠴', '⠦', '⠧', '⠇', '⠏'];

/// Main draw function - renders the entire board.
pub fn draw(f: &mut Frame, board: &Board, spinner: char) {
    let areas = layout::screen_areas(f.area(), board.filter_bar_visible());

    status::draw_header(f, board, areas.header);
    status::draw_help_line(f, areas.help_line);
    columns::draw_columns(f, board, areas.columns);
    if let Some(bar) = areas.filter_bar {
        status::draw_filter_bar(f, board, bar);
    }
    status::draw_footer(f, board, spinner, areas.footer);

    if board.show_help {
        help::draw_help_popup(f, board);
    }
}
