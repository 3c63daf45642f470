mod app;
pub mod board;
pub mod input;
mod message;
pub mod search;
pub mod ui;
pub mod viewport;

use crate::config::prefs::PrefsStore;
use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{self, disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::time::Duration;

pub use app::{App, LaunchRequest};
pub use board::{Board, Command, LaunchMode, LoadEvent, LoadState};
pub use message::Message;

/// Input poll interval; load results are drained on every iteration.
pub const TICK_RATE: Duration = Duration::from_millis(100);

/// Run the board until the user quits. Returns the ticket to act on, if any.
pub async fn run(mut app: App, prefs: &PrefsStore) -> Result<Option<LaunchRequest>> {
    crate::util::require_tty_on(atty::Stream::Stdout)?;

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    if let Ok((width, height)) = terminal::size() {
        app.handle(Message::Resize(width, height));
    }

    // UI shows immediately with loading state
    app.start();

    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    prefs.save(&app.board.prefs());

    result.map(|()| app.launch.take())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    let mut last_tick = std::time::Instant::now();
    let mut input_state = input::InputState::new();

    loop {
        terminal.draw(|f| ui::draw(f, &app.board, app.spinner_char()))?;

        let timeout = TICK_RATE.saturating_sub(last_tick.elapsed());

        if event::poll(timeout)? {
            match event::read()? {
                Event::Resize(width, height) => app.handle(Message::Resize(width, height)),
                Event::Key(key) if key.kind != KeyEventKind::Release => {
                    let msg = input::dispatch(&app.board, &mut input_state, key);
                    app.handle(msg);
                }
                _ => {}
            }
        }

        if app.should_quit() {
            return Ok(());
        }

        if input_state.expired_at(std::time::Instant::now()) {
            input_state.clear();
        }

        app.poll_loads();

        if last_tick.elapsed() >= TICK_RATE {
            app.tick_spinner();
            last_tick = std::time::Instant::now();
        }

        // Let spawned loads make progress on the current-thread scheduler too
        tokio::task::yield_now().await;
    }
}
