//! timelapse: step through the Mercurial history of a file in the terminal.
//!
//! # Startup sequence
//!
//! 1. Parse flags, start file logging, load config. All before terminal init
//!    so errors still reach stderr.
//! 2. Bind the session to the file argument, if any. Fetching starts here and
//!    runs on the session's worker thread.
//! 3. `install_panic_hook()`, `register_sigterm()`, `init_tui()`, then the
//!    event task.
//!
//! The loop exits only via `break`, so `restore_tui()` always runs. Fetch
//! results are pulled in by `Timelapse::update()` right before each draw.

mod app;
mod config;
mod event;
mod logging;
mod theme;
mod tui;
mod ui;

use std::sync::atomic::Ordering;

use clap::Parser;
use timelapse_core::Timelapse;

use crate::event::AppEvent;
use crate::ui::keybindings::{self, KeyAction};

#[tokio::main]
async fn main() -> std::io::Result<()> {
    let cli = config::Cli::parse();

    let log_path = cli.log_file.clone().unwrap_or_else(logging::default_log_path);
    let _log_guard = match logging::init_logging(&log_path) {
        Ok(guard) => Some(guard),
        Err(e) => {
            eprintln!("timelapse: logging disabled, cannot open {:?}: {}", log_path, e);
            None
        }
    };

    let config_path = cli.config.clone().unwrap_or_else(config::config_path);
    let config = config::load_config(&config_path).with_overrides(&cli);
    tracing::info!(hg = %config.hg, limit = config.revision_limit, theme = %config.theme, "starting");

    let theme = theme::Theme::from_name(&config.theme);
    let mut timelapse = Timelapse::with_hg(config.hg.clone());
    let mut state = app::AppState::new(config.revision_limit);
    if let Some(file) = &cli.file {
        state.open_file(&mut timelapse, file);
    }

    tui::install_panic_hook();
    let term_flag = tui::register_sigterm();
    let mut terminal = tui::init_tui()?;

    let handler = event::EventHandler::new();
    event::spawn_event_task(handler.tx.clone());
    let mut rx = handler.rx;

    let mut result = Ok(());
    'event_loop: loop {
        tokio::select! {
            // Keeps the SIGTERM flag polled on an idle terminal.
            _ = tokio::time::sleep(std::time::Duration::from_millis(50)) => {
                if term_flag.load(Ordering::Relaxed) {
                    break 'event_loop;
                }
            }
            maybe_event = rx.recv() => {
                match maybe_event {
                    Some(AppEvent::Render) => {
                        timelapse.update();
                        if let Err(e) = terminal.draw(|frame| ui::render(frame, &mut state, &timelapse, &theme)) {
                            result = Err(e);
                            break 'event_loop;
                        }
                    }
                    Some(AppEvent::Key(key)) => {
                        if keybindings::handle_key(key, &mut state, &mut timelapse) == KeyAction::Quit {
                            break 'event_loop;
                        }
                    }
                    Some(AppEvent::Mouse(mouse)) => {
                        keybindings::handle_mouse(mouse, &mut state, &mut timelapse);
                    }
                    Some(AppEvent::Tick) => state.expire_status(std::time::Instant::now()),
                    // Picked up by frame.area() on the next Render.
                    Some(AppEvent::Resize(_, _)) => {}
                    None => break 'event_loop,
                }
                if term_flag.load(Ordering::Relaxed) {
                    break 'event_loop;
                }
            }
        }
    }

    tui::restore_tui()?;
    timelapse.shutdown();
    tracing::info!("exiting");
    result
}
