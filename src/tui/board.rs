//! Board model: columns, per-scope cache, cursor state and load lifecycle.
//!
//! The board never does I/O. `update` and `apply` return [`Command`]s that the
//! caller executes; load results come back as [`LoadEvent`]s. All mutation of
//! board state happens on those two paths.

use super::input::KEY_HELP;
use super::message::Message;
use super::search::filter_and_group;
use super::viewport;
use crate::config::prefs::{adjust_column_width, UiPrefs, COLUMN_WIDTH_STEP};
use crate::data::grouping::has_backlog_mix;
use crate::data::{Scope, StatusCategory, Ticket};
use crate::integrations::loader::{FanOutError, LoadReport};
use std::collections::BTreeMap;

pub const DEFAULT_WIDTH: u16 = 80;
pub const DEFAULT_HEIGHT: u16 = 24;

/// One status-category column.
#[derive(Debug, Clone)]
pub struct Column {
    pub category: StatusCategory,
    /// Last fetched raw list per scope
    pub all_by_scope: BTreeMap<Scope, Vec<Ticket>>,
    /// Raw list for the active scope
    pub all_issues: Vec<Ticket>,
    /// Displayed list: `all_issues` filtered and grouped
    pub issues: Vec<Ticket>,
    /// To Do column holds both active and backlog tickets
    pub backlog_mix: bool,
    pub cursor: usize,
    pub offset: usize,
}

impl Column {
    pub fn new(category: StatusCategory) -> Self {
        Self {
            category,
            all_by_scope: BTreeMap::new(),
            all_issues: Vec::new(),
            issues: Vec::new(),
            backlog_mix: false,
            cursor: 0,
            offset: 0,
        }
    }

    pub fn title(&self) -> &'static str {
        self.category.title()
    }

    pub fn has_scope(&self, scope: Scope) -> bool {
        self.all_by_scope.contains_key(&scope)
    }

    pub fn selected(&self) -> Option<&Ticket> {
        self.issues.get(self.cursor)
    }

    fn rederive(&mut self, filter: &str) {
        self.issues = filter_and_group(self.category, &self.all_issues, filter);
        self.backlog_mix =
            self.category == StatusCategory::ToDo && has_backlog_mix(&self.issues);
    }

    fn show_scope(&mut self, scope: Scope, filter: &str) -> bool {
        match self.all_by_scope.get(&scope) {
            Some(cached) => {
                self.all_issues = cached.clone();
                self.rederive(filter);
                true
            }
            None => {
                self.all_issues.clear();
                self.issues.clear();
                self.backlog_mix = false;
                false
            }
        }
    }

    pub fn ensure_cursor_visible(&mut self, window: usize) {
        viewport::ensure_cursor_visible(&mut self.cursor, &mut self.offset, self.issues.len(), window);
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    /// Primary load outstanding
    Loading,
    Ready,
    /// Last primary load failed; earlier data stays visible
    Error(String),
}

/// What to do after quitting the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchMode {
    /// Check out a branch in the current repository
    Branch,
    /// Worktree or branch, then the assistant when enabled
    Interactive,
}

/// Side effects requested by the board.
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// Fetch every column of `scope` in the foreground
    PrimaryLoad { epoch: u64, scope: Scope },
    /// Fetch `columns` of `scope` in the background
    Prefetch { scope: Scope, columns: Vec<usize> },
    OpenInBrowser { key: String },
    Launch { ticket: Ticket, mode: LaunchMode },
    Quit,
}

/// Completed loads, delivered back to the board.
#[derive(Debug)]
pub enum LoadEvent {
    Primary {
        epoch: u64,
        scope: Scope,
        outcome: Result<LoadReport, FanOutError>,
    },
    Prefetch {
        scope: Scope,
        report: LoadReport,
    },
}

pub struct Board {
    pub columns: [Column; 3],
    pub selected_column: usize,
    pub scope: Scope,
    pub filter: String,
    pub filtering: bool,
    pub state: LoadState,
    pub show_help: bool,
    pub help_offset: usize,
    pub show_extra_fields: bool,
    pub column_widths: [u16; 3],
    pub width: u16,
    pub height: u16,
    pub projects: Vec<String>,
    epoch: u64,
    span: tracing::Span,
}

impl Board {
    pub fn new(projects: Vec<String>, default_scope: Scope, prefs: &UiPrefs) -> Self {
        let span = tracing::info_span!("board", projects = %projects.join(","));
        Self {
            columns: StatusCategory::ALL.map(Column::new),
            selected_column: prefs.last_selected_col.min(2),
            scope: prefs.last_scope.unwrap_or(default_scope),
            filter: String::new(),
            filtering: false,
            state: LoadState::Loading,
            show_help: false,
            help_offset: 0,
            show_extra_fields: prefs.show_extra_fields,
            column_widths: prefs.column_widths,
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            projects,
            epoch: 0,
            span,
        }
    }

    /// Logging context for this session; loads run under it.
    pub fn span(&self) -> &tracing::Span {
        &self.span
    }

    /// First load of the session.
    pub fn init(&mut self) -> Vec<Command> {
        self.begin_primary_load()
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn is_loading(&self) -> bool {
        self.state == LoadState::Loading
    }

    pub fn error(&self) -> Option<&str> {
        match &self.state {
            LoadState::Error(msg) => Some(msg),
            _ => None,
        }
    }

    pub fn filter_bar_visible(&self) -> bool {
        self.filtering || !self.filter.is_empty()
    }

    pub fn window_height(&self) -> usize {
        viewport::window_height(self.height, self.filter_bar_visible())
    }

    pub fn selected_ticket(&self) -> Option<&Ticket> {
        self.columns[self.selected_column].selected()
    }

    pub fn prefs(&self) -> UiPrefs {
        UiPrefs {
            last_scope: Some(self.scope),
            last_selected_col: self.selected_column,
            column_widths: self.column_widths,
            show_extra_fields: self.show_extra_fields,
        }
    }

    /// Handle one user message.
    pub fn update(&mut self, msg: Message) -> Vec<Command> {
        let span = self.span.clone();
        let _enter = span.enter();

        let commands = match msg {
            Message::Quit => vec![Command::Quit],
            Message::Refresh => self.begin_primary_load(),
            Message::CycleScope => self.cycle_scope(),
            Message::Resize(width, height) => {
                self.width = width;
                self.height = height;
                vec![]
            }

            Message::MoveUp => self.move_cursor(-1),
            Message::MoveDown => self.move_cursor(1),
            Message::PageUp => self.move_cursor(-self.half_page()),
            Message::PageDown => self.move_cursor(self.half_page()),
            Message::GotoTop => {
                self.current_column_mut().cursor = 0;
                vec![]
            }
            Message::GotoBottom => {
                let col = self.current_column_mut();
                col.cursor = col.issues.len().saturating_sub(1);
                vec![]
            }
            Message::NextColumn => {
                self.selected_column = (self.selected_column + 1) % 3;
                vec![]
            }
            Message::PrevColumn => {
                self.selected_column = (self.selected_column + 2) % 3;
                vec![]
            }

            Message::EnterFilter => {
                self.filtering = true;
                vec![]
            }
            Message::ExitFilter => {
                self.filtering = false;
                vec![]
            }
            Message::ConfirmFilter => {
                self.filtering = false;
                self.launch(LaunchMode::Interactive)
            }
            Message::FilterInput(c) => {
                self.filter.push(c);
                self.rederive_all();
                vec![]
            }
            Message::FilterBackspace => {
                self.filter.pop();
                self.rederive_all();
                vec![]
            }
            Message::ClearFilter => {
                self.filter.clear();
                self.rederive_all();
                vec![]
            }

            Message::ToggleHelp => {
                self.show_help = !self.show_help;
                self.help_offset = 0;
                vec![]
            }
            Message::CloseHelp => {
                self.show_help = false;
                vec![]
            }
            Message::HelpScroll(delta) => {
                let max = KEY_HELP.len().saturating_sub(1);
                let next = self.help_offset as i64 + i64::from(delta);
                self.help_offset = next.clamp(0, max as i64) as usize;
                vec![]
            }
            Message::HelpTop => {
                self.help_offset = 0;
                vec![]
            }
            Message::HelpBottom => {
                self.help_offset = KEY_HELP.len().saturating_sub(1);
                vec![]
            }

            Message::ToggleExtraFields => {
                self.show_extra_fields = !self.show_extra_fields;
                vec![]
            }
            Message::NarrowColumn => {
                self.resize_selected_column(-(COLUMN_WIDTH_STEP as i16));
                vec![]
            }
            Message::WidenColumn => {
                self.resize_selected_column(COLUMN_WIDTH_STEP as i16);
                vec![]
            }

            Message::OpenInBrowser => match self.selected_ticket() {
                Some(ticket) => vec![Command::OpenInBrowser {
                    key: ticket.key.clone(),
                }],
                None => vec![],
            },
            Message::CreateBranch => self.launch(LaunchMode::Branch),
            Message::StartInteractive => self.launch(LaunchMode::Interactive),

            Message::None => vec![],
        };

        self.clamp_all();
        commands
    }

    /// Merge a finished load.
    pub fn apply(&mut self, event: LoadEvent) -> Vec<Command> {
        let span = self.span.clone();
        let _enter = span.enter();

        let commands = match event {
            LoadEvent::Primary {
                epoch,
                scope,
                outcome,
            } => self.apply_primary(epoch, scope, outcome),
            LoadEvent::Prefetch { scope, report } => {
                tracing::debug!(
                    scope = scope.config_key(),
                    columns = report.results.len(),
                    "prefetch merged"
                );
                self.merge(scope, report.results);
                vec![]
            }
        };

        self.clamp_all();
        commands
    }

    fn apply_primary(
        &mut self,
        epoch: u64,
        scope: Scope,
        outcome: Result<LoadReport, FanOutError>,
    ) -> Vec<Command> {
        let current = epoch == self.epoch;
        match outcome {
            Ok(report) => {
                let timed_out = report.timed_out;
                self.merge(scope, report.results);
                if !current {
                    tracing::debug!(epoch, latest = self.epoch, "stale primary load merged into cache");
                    return vec![];
                }
                if timed_out {
                    tracing::warn!(scope = scope.config_key(), "primary load incomplete at deadline");
                }
                self.state = LoadState::Ready;
                Scope::ALL
                    .into_iter()
                    .filter(|s| *s != scope)
                    .map(|s| Command::Prefetch {
                        scope: s,
                        columns: vec![0, 1, 2],
                    })
                    .collect()
            }
            Err(err) => {
                let message = err.source.to_string();
                self.merge(scope, err.partial.results);
                if current {
                    tracing::error!(column = err.column, "load failed: {}", message);
                    self.state = LoadState::Error(message);
                }
                vec![]
            }
        }
    }

    /// Cache results for `scope`; refresh visible columns only for the active scope.
    fn merge(&mut self, scope: Scope, results: BTreeMap<usize, Vec<Ticket>>) {
        let visible = scope == self.scope;
        for (idx, tickets) in results {
            let Some(col) = self.columns.get_mut(idx) else {
                tracing::warn!(column = idx, "result for unknown column dropped");
                continue;
            };
            if visible {
                col.all_issues = tickets.clone();
                col.all_by_scope.insert(scope, tickets);
                col.rederive(&self.filter);
            } else {
                col.all_by_scope.insert(scope, tickets);
            }
        }
    }

    fn begin_primary_load(&mut self) -> Vec<Command> {
        self.epoch += 1;
        self.state = LoadState::Loading;
        tracing::info!(epoch = self.epoch, scope = self.scope.config_key(), "primary load");
        vec![Command::PrimaryLoad {
            epoch: self.epoch,
            scope: self.scope,
        }]
    }

    fn cycle_scope(&mut self) -> Vec<Command> {
        self.scope = self.scope.next();
        let mut missing = Vec::new();
        for (idx, col) in self.columns.iter_mut().enumerate() {
            if !col.show_scope(self.scope, &self.filter) {
                missing.push(idx);
            }
        }
        tracing::debug!(scope = self.scope.config_key(), ?missing, "scope changed");

        if missing.is_empty() {
            vec![]
        } else {
            vec![Command::Prefetch {
                scope: self.scope,
                columns: missing,
            }]
        }
    }

    fn rederive_all(&mut self) {
        for col in &mut self.columns {
            col.rederive(&self.filter);
        }
    }

    fn half_page(&self) -> isize {
        (self.window_height() / 2).max(1) as isize
    }

    fn move_cursor(&mut self, delta: isize) -> Vec<Command> {
        let col = self.current_column_mut();
        if !col.issues.is_empty() {
            let last = col.issues.len() - 1;
            col.cursor = col.cursor.saturating_add_signed(delta).min(last);
        }
        vec![]
    }

    fn resize_selected_column(&mut self, delta: i16) {
        self.column_widths = adjust_column_width(self.column_widths, self.selected_column, delta);
    }

    /// Ticket actions fall back to the first non-empty column.
    fn launch(&mut self, mode: LaunchMode) -> Vec<Command> {
        if self.selected_ticket().is_none() {
            if let Some(idx) = self.columns.iter().position(|c| !c.issues.is_empty()) {
                self.selected_column = idx;
                self.columns[idx].cursor = 0;
            }
        }
        match self.selected_ticket() {
            Some(ticket) => vec![Command::Launch {
                ticket: ticket.clone(),
                mode,
            }],
            None => vec![],
        }
    }

    fn current_column_mut(&mut self) -> &mut Column {
        &mut self.columns[self.selected_column]
    }

    fn clamp_all(&mut self) {
        let window = self.window_height();
        for col in &mut self.columns {
            col.ensure_cursor_visible(window);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board() -> Board {
        Board::new(vec!["WEB".into()], Scope::Assigned, &UiPrefs::default())
    }

    fn tickets(prefix: &str, n: usize) -> Vec<Ticket> {
        (0..n)
            .map(|i| Ticket {
                key: format!("{}-{}", prefix, i),
                summary: format!("ticket {}", i),
                status: "Open".into(),
                ..Default::default()
            })
            .collect()
    }

    fn report(cols: &[(usize, Vec<Ticket>)]) -> LoadReport {
        LoadReport {
            results: cols.iter().cloned().collect(),
            timed_out: false,
        }
    }

    #[test]
    fn starts_loading_with_one_primary_load() {
        let mut b = board();
        assert_eq!(b.state, LoadState::Loading);
        assert_eq!(
            b.init(),
            vec![Command::PrimaryLoad {
                epoch: 1,
                scope: Scope::Assigned
            }]
        );
    }

    #[test]
    fn prefs_seed_scope_and_column() {
        let prefs = UiPrefs {
            last_scope: Some(Scope::Unassigned),
            last_selected_col: 2,
            ..Default::default()
        };
        let b = Board::new(vec![], Scope::Assigned, &prefs);
        assert_eq!(b.scope, Scope::Unassigned);
        assert_eq!(b.selected_column, 2);
        assert_eq!(b.prefs().last_scope, Some(Scope::Unassigned));
    }

    #[test]
    fn columns_wrap_both_ways() {
        let mut b = board();
        b.update(Message::PrevColumn);
        assert_eq!(b.selected_column, 2);
        b.update(Message::NextColumn);
        assert_eq!(b.selected_column, 0);
    }

    #[test]
    fn page_moves_half_a_window() {
        let mut b = board();
        b.init();
        b.apply(LoadEvent::Primary {
            epoch: 1,
            scope: Scope::Assigned,
            outcome: Ok(report(&[(0, tickets("T", 100))])),
        });
        b.update(Message::Resize(100, 27)); // window 20
        b.update(Message::PageDown);
        assert_eq!(b.columns[0].cursor, 10);
        b.update(Message::GotoBottom);
        assert_eq!(b.columns[0].cursor, 99);
        assert_eq!(b.columns[0].offset, 80);
    }

    #[test]
    fn help_scroll_is_bounded() {
        let mut b = board();
        b.update(Message::ToggleHelp);
        b.update(Message::HelpScroll(-3));
        assert_eq!(b.help_offset, 0);
        b.update(Message::HelpScroll(1000));
        assert_eq!(b.help_offset, KEY_HELP.len() - 1);
        b.update(Message::CloseHelp);
        assert!(!b.show_help);
    }

    #[test]
    fn launch_with_nothing_loaded_is_noop() {
        let mut b = board();
        assert!(b.update(Message::StartInteractive).is_empty());
        assert!(b.update(Message::OpenInBrowser).is_empty());
    }
}
