//! Runtime side of the board: executes [`Command`]s and feeds load results back.

use super::board::{Board, Command, LaunchMode, LoadEvent};
use super::message::Message;
use super::ui::SPINNER_FRAMES;
use crate::data::Ticket;
use crate::integrations::jira;
use crate::integrations::loader::{FanOut, FetchTask};
use crate::integrations::{self, TicketFetcher};
use crate::util::send_or_log;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Ticket chosen on the board, handled after the terminal is restored.
#[derive(Debug, Clone, PartialEq)]
pub struct LaunchRequest {
    pub ticket: Ticket,
    pub mode: LaunchMode,
}

pub struct App {
    pub board: Board,
    fetcher: Arc<dyn TicketFetcher>,
    browse_base: String,
    /// Channel for background load results
    load_tx: mpsc::Sender<LoadEvent>,
    load_rx: mpsc::Receiver<LoadEvent>,
    pub spinner_frame: usize,
    pub launch: Option<LaunchRequest>,
    quit: bool,
}

impl App {
    pub fn new(board: Board, fetcher: Arc<dyn TicketFetcher>, browse_base: impl Into<String>) -> Self {
        let (load_tx, load_rx) = mpsc::channel(100);
        Self {
            board,
            fetcher,
            browse_base: browse_base.into(),
            load_tx,
            load_rx,
            spinner_frame: 0,
            launch: None,
            quit: false,
        }
    }

    /// Kick off the first load. The board is drawable immediately.
    pub fn start(&mut self) {
        let commands = self.board.init();
        self.execute(commands);
    }

    pub fn should_quit(&self) -> bool {
        self.quit
    }

    pub fn handle(&mut self, msg: Message) {
        let commands = self.board.update(msg);
        self.execute(commands);
    }

    /// Apply every load result that has arrived (non-blocking).
    /// Returns how many were applied.
    pub fn poll_loads(&mut self) -> usize {
        let mut applied = 0;
        while let Ok(event) = self.load_rx.try_recv() {
            let commands = self.board.apply(event);
            self.execute(commands);
            applied += 1;
        }
        applied
    }

    /// Wait for the next load result and apply it.
    pub async fn next_load(&mut self) -> bool {
        match self.load_rx.recv().await {
            Some(event) => {
                let commands = self.board.apply(event);
                self.execute(commands);
                true
            }
            None => false,
        }
    }

    /// Advance spinner frame (call on tick while loading)
    pub fn tick_spinner(&mut self) {
        if self.board.is_loading() {
            self.spinner_frame = (self.spinner_frame + 1) % SPINNER_FRAMES.len();
        }
    }

    pub fn spinner_char(&self) -> char {
        SPINNER_FRAMES[self.spinner_frame % SPINNER_FRAMES.len()]
    }

    fn execute(&mut self, commands: Vec<Command>) {
        for command in commands {
            match command {
                Command::PrimaryLoad { epoch, scope } => {
                    let fetcher = Arc::clone(&self.fetcher);
                    let tx = self.load_tx.clone();
                    let fan_out = FanOut::primary().in_span(self.board.span().clone());
                    tokio::spawn(async move {
                        let outcome = fan_out.run(&*fetcher, FetchTask::all_columns(scope)).await;
                        send_or_log(
                            &tx,
                            LoadEvent::Primary {
                                epoch,
                                scope,
                                outcome,
                            },
                            "primary load result",
                        )
                        .await;
                    });
                }
                Command::Prefetch { scope, columns } => {
                    let fetcher = Arc::clone(&self.fetcher);
                    let tx = self.load_tx.clone();
                    let fan_out = FanOut::prefetch().in_span(self.board.span().clone());
                    tokio::spawn(async move {
                        let tasks = FetchTask::for_columns(scope, &columns);
                        // Prefetch failures are already dropped per task
                        let report = fan_out.run(&*fetcher, tasks).await.unwrap_or_else(|e| e.partial);
                        send_or_log(&tx, LoadEvent::Prefetch { scope, report }, "prefetch result").await;
                    });
                }
                Command::OpenInBrowser { key } => {
                    let url = jira::browse_url(&self.browse_base, &key);
                    if let Err(e) = integrations::open_url(&url) {
                        tracing::warn!("Failed to open {}: {:#}", url, e);
                    }
                }
                Command::Launch { ticket, mode } => {
                    tracing::info!(key = %ticket.key, ?mode, "ticket selected");
                    self.launch = Some(LaunchRequest { ticket, mode });
                    self.quit = true;
                }
                Command::Quit => self.quit = true,
            }
        }
    }
}
