//! Terminal setup and teardown.
//!
//! ratatui does not restore the terminal on drop, so `restore_tui` runs on
//! every exit path: after the event loop, and from the panic hook.

use crossterm::event::{DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use signal_hook::consts::SIGTERM;
use std::io::{stdout, BufWriter, Stdout};
use std::panic;
use std::sync::{atomic::AtomicBool, Arc};

/// Crossterm backend over buffered stdout; one flush per frame.
pub type Tui = Terminal<CrosstermBackend<BufWriter<Stdout>>>;

/// Enables raw mode, enters the alternate screen and turns on mouse capture.
pub fn init_tui() -> std::io::Result<Tui> {
    let mut out = BufWriter::new(stdout());
    enable_raw_mode()?;
    execute!(out, EnterAlternateScreen, EnableMouseCapture)?;
    Terminal::new(CrosstermBackend::new(out))
}

/// Undoes [`init_tui`]. Safe to call more than once.
pub fn restore_tui() -> std::io::Result<()> {
    disable_raw_mode()?;
    execute!(stdout(), LeaveAlternateScreen, DisableMouseCapture)?;
    Ok(())
}

/// Chains a hook that restores the terminal before the previous hook prints
/// the panic. Install before [`init_tui`].
pub fn install_panic_hook() {
    let previous = panic::take_hook();
    panic::set_hook(Box::new(move |info| {
        let _ = restore_tui();
        tracing::error!(%info, "panic");
        previous(info);
    }));
}

/// Flag set when the process receives SIGTERM; polled by the event loop.
///
/// Registration failure is logged and the flag simply never flips.
pub fn register_sigterm() -> Arc<AtomicBool> {
    let term = Arc::new(AtomicBool::new(false));
    if let Err(e) = signal_hook::flag::register(SIGTERM, Arc::clone(&term)) {
        tracing::warn!(error = %e, "could not register SIGTERM handler");
    }
    term
}
