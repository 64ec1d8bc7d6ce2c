//! Terminal UI for ReelForge.
//!
//! Exposes the application state, reducer, renderer and the event loop
//! behind `reelforge ui`.

pub mod action;
pub mod app;
pub mod input;
pub mod reducer;
pub mod render;
pub mod runtime;
pub mod streaming;

use std::io;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::event::{DisableBracketedPaste, EnableBracketedPaste, EventStream};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use futures_util::StreamExt;
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tokio::sync::mpsc;
use tracing::info;

pub use action::{Action, Effect, Job};
pub use app::{AppOptions, AppState};
pub use input::map_event;
pub use reducer::reduce;
pub use render::draw_ui;
pub use runtime::{EffectRunner, Services};
pub use streaming::stream_topics;

const TICK: Duration = Duration::from_millis(250);

/// Restores the terminal on every exit path, panics included.
struct TuiGuard;

impl Drop for TuiGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(
            io::stdout(),
            LeaveAlternateScreen,
            DisableBracketedPaste,
            crossterm::cursor::Show
        );
    }
}

/// Run the UI until the user quits.
pub async fn run(services: Services, options: AppOptions) -> Result<()> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableBracketedPaste).context("Failed to enter alternate screen")?;
    let _guard = TuiGuard;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;

    let (tx, mut rx) = mpsc::unbounded_channel();
    let runner = EffectRunner::new(services, tx);

    let mut state = AppState::new(options);
    if state.points_enabled {
        runner.run(Effect::RefreshWallet);
    }
    info!(points = state.points_enabled, "TUI started");

    let mut events = EventStream::new();
    let mut ticker = tokio::time::interval(TICK);

    while !state.should_quit {
        terminal.draw(|f| draw_ui(f, &state))?;

        let action = tokio::select! {
            Some(Ok(event)) = events.next() => map_event(&event, &state),
            Some(action) = rx.recv() => Some(action),
            _ = ticker.tick() => Some(Action::Tick),
        };
        if let Some(action) = action {
            for effect in reduce(&mut state, action) {
                runner.run(effect);
            }
        }
    }

    info!("TUI exited");
    Ok(())
}
