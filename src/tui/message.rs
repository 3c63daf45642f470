//! Message enum for Elm Architecture (TEA) pattern.
//!
//! All possible user actions on the board are represented as messages.
//! This enables unidirectional data flow and testable update logic.

/// All possible user actions on the board.
///
/// Messages are dispatched from key events and processed by `Board::update()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    // ─────────────────────────────────────────────────────────────────────────
    // Session
    // ─────────────────────────────────────────────────────────────────────────
    /// Quit the board
    Quit,
    /// Reload the current scope from the tracker
    Refresh,
    /// Switch to the next scope
    CycleScope,
    /// Terminal was resized to (width, height)
    Resize(u16, u16),

    // ─────────────────────────────────────────────────────────────────────────
    // Navigation
    // ─────────────────────────────────────────────────────────────────────────
    MoveUp,
    MoveDown,
    GotoTop,
    GotoBottom,
    /// Half a window up
    PageUp,
    /// Half a window down
    PageDown,
    /// Next column (wraps)
    NextColumn,
    /// Previous column (wraps)
    PrevColumn,

    // ─────────────────────────────────────────────────────────────────────────
    // Filter
    // ─────────────────────────────────────────────────────────────────────────
    EnterFilter,
    /// Leave filter mode, keeping the text
    ExitFilter,
    /// Leave filter mode and activate the selected ticket
    ConfirmFilter,
    FilterInput(char),
    FilterBackspace,
    ClearFilter,

    // ─────────────────────────────────────────────────────────────────────────
    // Help overlay
    // ─────────────────────────────────────────────────────────────────────────
    ToggleHelp,
    CloseHelp,
    /// Scroll the help overlay by this many lines
    HelpScroll(i32),
    HelpTop,
    HelpBottom,

    // ─────────────────────────────────────────────────────────────────────────
    // Display
    // ─────────────────────────────────────────────────────────────────────────
    ToggleExtraFields,
    NarrowColumn,
    WidenColumn,

    // ─────────────────────────────────────────────────────────────────────────
    // Ticket actions
    // ─────────────────────────────────────────────────────────────────────────
    OpenInBrowser,
    /// Quit and check out a branch for the selected ticket
    CreateBranch,
    /// Quit and start interactive mode (worktree/branch + assistant)
    StartInteractive,

    /// No-op (unrecognized key)
    None,
}
