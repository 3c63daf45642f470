//! Row budget for the column lists and cursor-following scroll.
//!
//! Only the three integers cursor, offset and len are touched, so the cost is
//! the same for ten tickets or ten thousand.

/// Rows outside the column boxes: header, help line, footer, box borders.
pub const RESERVED_ROWS: u16 = 5;
/// "… N above" / "… N below" rows inside each box.
pub const INDICATOR_ROWS: u16 = 2;
/// Filter input and its hint line.
pub const FILTER_BAR_ROWS: u16 = 2;

/// Ticket rows drawn per column for a terminal `terminal_height` rows tall.
pub fn window_height(terminal_height: u16, filter_bar_visible: bool) -> usize {
    let mut reserved = RESERVED_ROWS + INDICATOR_ROWS;
    if filter_bar_visible {
        reserved += FILTER_BAR_ROWS;
    }
    usize::from(terminal_height.saturating_sub(reserved)).max(1)
}

/// Clamp `cursor` into the list and scroll `offset` so the cursor is visible.
pub fn ensure_cursor_visible(cursor: &mut usize, offset: &mut usize, len: usize, window: usize) {
    let window = window.max(1);
    if len == 0 {
        *cursor = 0;
        *offset = 0;
        return;
    }

    *cursor = (*cursor).min(len - 1);
    if *cursor < *offset {
        *offset = *cursor;
    } else if *cursor >= *offset + window {
        *offset = *cursor + 1 - window;
    }
    *offset = (*offset).min(len.saturating_sub(window));
}
