//! File logging for the viewer.
//!
//! The terminal belongs to the TUI, so `tracing` output goes to a file through
//! a non-blocking `tracing-appender` writer. Filter with `RUST_LOG`; the default
//! level is `info`.

use std::path::{Path, PathBuf};

use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// `$XDG_STATE_HOME/timelapse/timelapse.log`, falling back to
/// `~/.local/state/timelapse/timelapse.log`.
pub fn default_log_path() -> PathBuf {
    let base = std::env::var("XDG_STATE_HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var("HOME")
                .ok()
                .map(|h| PathBuf::from(h).join(".local").join("state"))
        })
        .unwrap_or_else(|| PathBuf::from("."));
    base.join("timelapse").join("timelapse.log")
}

/// Installs the global subscriber writing to `path` (appending).
///
/// Keep the returned guard alive until exit or buffered lines are lost.
pub fn init_logging(path: &Path) -> std::io::Result<WorkerGuard> {
    if let Some(dir) = path.parent() {
        std::fs::create_dir_all(dir)?;
    }
    let file = std::fs::OpenOptions::new().create(true).append(true).open(path)?;
    let (writer, guard) = tracing_appender::non_blocking(file);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .init();
    Ok(guard)
}
