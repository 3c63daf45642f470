//! Key events to board [`Message`]s. Help and filter modes take their keys
//! first; everything else goes through the normal-mode table.

use super::{Board, Message};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::time::{Duration, Instant};

/// Key reference shown in the help overlay, in display order.
pub const KEY_HELP: &[(&str, &str)] = &[
    ("j / ↓", "Move down"),
    ("k / ↑", "Move up"),
    ("gg / Home", "First ticket"),
    ("G / End", "Last ticket"),
    ("Ctrl+d / PgDn", "Half page down"),
    ("Ctrl+u / PgUp", "Half page up"),
    ("l / → / Tab", "Next column"),
    ("h / ← / Shift+Tab", "Previous column"),
    ("s", "Cycle scope"),
    ("r", "Refresh"),
    ("/", "Filter (Esc keeps text, Ctrl+u clears)"),
    ("x", "Toggle assignee/priority tags"),
    ("[ / ]", "Narrow / widen column"),
    ("o", "Open ticket in browser"),
    ("b", "Quit and check out a branch"),
    ("Enter", "Quit and start interactive mode"),
    ("?", "Toggle this help"),
    ("q / Ctrl+c", "Quit"),
];

/// How long the first `g` waits for the second.
pub const CHORD_TIMEOUT: Duration = Duration::from_millis(500);

/// First key of a `gg` chord and when it was pressed. The event loop expires
/// it between polls, so dispatch never blocks waiting for the second key.
#[derive(Debug, Default)]
pub struct InputState {
    pending: Option<(KeyCode, Instant)>,
}

impl InputState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn pending(&self) -> Option<KeyCode> {
        self.pending.map(|(key, _)| key)
    }

    pub fn begin_chord(&mut self, key: KeyCode) {
        self.pending = Some((key, Instant::now()));
    }

    pub fn expired_at(&self, now: Instant) -> bool {
        self.pending
            .is_some_and(|(_, since)| now.saturating_duration_since(since) > CHORD_TIMEOUT)
    }

    pub fn clear(&mut self) {
        self.pending = None;
    }

    fn take(&mut self) -> Option<KeyCode> {
        self.pending.take().map(|(key, _)| key)
    }
}

/// Map key events to messages based on current board mode.
pub fn dispatch(board: &Board, input: &mut InputState, key: KeyEvent) -> Message {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        input.clear();
        return Message::Quit;
    }

    if let Some(pending) = input.take() {
        if let Some(msg) = handle_chord(pending, key.code) {
            return msg;
        }
    }

    if board.show_help {
        dispatch_help(key)
    } else if board.filtering {
        dispatch_filter(key)
    } else {
        dispatch_normal(input, key)
    }
}

/// Complete a chord; `None` lets the second key dispatch normally.
fn handle_chord(first: KeyCode, second: KeyCode) -> Option<Message> {
    match (first, second) {
        (KeyCode::Char('g'), KeyCode::Char('g')) => Some(Message::GotoTop),
        _ => None,
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Mode-specific dispatch functions
// ─────────────────────────────────────────────────────────────────────────────

fn dispatch_normal(input: &mut InputState, key: KeyEvent) -> Message {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
    match key.code {
        KeyCode::Char('q') => Message::Quit,
        KeyCode::Char('j') | KeyCode::Down => Message::MoveDown,
        KeyCode::Char('k') | KeyCode::Up => Message::MoveUp,
        KeyCode::Char('d') if ctrl => Message::PageDown,
        KeyCode::Char('u') if ctrl => Message::PageUp,
        KeyCode::PageDown => Message::PageDown,
        KeyCode::PageUp => Message::PageUp,
        KeyCode::Char('g') => {
            input.begin_chord(KeyCode::Char('g'));
            Message::None
        }
        KeyCode::Home => Message::GotoTop,
        KeyCode::Char('G') | KeyCode::End => Message::GotoBottom,
        KeyCode::Char('l') | KeyCode::Right | KeyCode::Tab => Message::NextColumn,
        KeyCode::Char('h') | KeyCode::Left | KeyCode::BackTab => Message::PrevColumn,
        KeyCode::Char('s') => Message::CycleScope,
        KeyCode::Char('r') => Message::Refresh,
        KeyCode::Char('/') => Message::EnterFilter,
        KeyCode::Char('?') => Message::ToggleHelp,
        KeyCode::Char('x') => Message::ToggleExtraFields,
        KeyCode::Char('[') => Message::NarrowColumn,
        KeyCode::Char(']') => Message::WidenColumn,
        KeyCode::Char('o') => Message::OpenInBrowser,
        KeyCode::Char('b') => Message::CreateBranch,
        KeyCode::Enter => Message::StartInteractive,
        _ => Message::None,
    }
}

fn dispatch_filter(key: KeyEvent) -> Message {
    match key.code {
        KeyCode::Esc => Message::ExitFilter,
        KeyCode::Enter => Message::ConfirmFilter,
        KeyCode::Backspace => Message::FilterBackspace,
        KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
            Message::ClearFilter
        }
        KeyCode::Down => Message::MoveDown,
        KeyCode::Up => Message::MoveUp,
        KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
            Message::FilterInput(c)
        }
        _ => Message::None,
    }
}

fn dispatch_help(key: KeyEvent) -> Message {
    match key.code {
        KeyCode::Esc | KeyCode::Char('q') | KeyCode::Char('?') => Message::CloseHelp,
        KeyCode::Char('j') | KeyCode::Down => Message::HelpScroll(1),
        KeyCode::Char('k') | KeyCode::Up => Message::HelpScroll(-1),
        KeyCode::PageDown => Message::HelpScroll(10),
        KeyCode::PageUp => Message::HelpScroll(-10),
        KeyCode::Home => Message::HelpTop,
        KeyCode::End => Message::HelpBottom,
        _ => Message::None,
    }
}
