//! Error types for session setup and external command execution.
//!
//! Neither type crosses the worker/render boundary: the worker turns a
//! `CommandError` into empty output before building its completion payload.

use std::path::PathBuf;
use std::process::ExitStatus;

/// Why `Timelapse::setup` rejected a path.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    #[error("file not found: {}", .0.display())]
    NotFound(PathBuf),
    #[error("not a regular file: {}", .0.display())]
    NotAFile(PathBuf),
    #[error("file has no containing directory: {}", .0.display())]
    NoParentDirectory(PathBuf),
    #[error("cannot resolve {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Failure running an external command.
#[derive(Debug, thiserror::Error)]
pub enum CommandError {
    #[error("failed to spawn `{program}`: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },
    #[error("`{program}` exited with {status}: {stderr}")]
    Failed {
        program: String,
        status: ExitStatus,
        stderr: String,
    },
}
