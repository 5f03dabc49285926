//! The "run external command and capture output" seam.
//!
//! The fetch worker only ever talks to a [`CommandRunner`]; tests substitute
//! a scripted implementation.

use std::path::Path;
use std::process::Command;

use crate::error::CommandError;

pub trait CommandRunner: Send + Sync {
    /// Runs `program` with `args` inside `working_dir`, blocking until it exits.
    fn run(&self, program: &str, args: &[String], working_dir: &Path)
        -> Result<String, CommandError>;
}

/// Spawns real processes with `std::process::Command`.
#[derive(Debug, Default)]
pub struct ProcessCommandRunner;

impl CommandRunner for ProcessCommandRunner {
    fn run(
        &self,
        program: &str,
        args: &[String],
        working_dir: &Path,
    ) -> Result<String, CommandError> {
        let output = Command::new(program)
            .args(args)
            .current_dir(working_dir)
            .output()
            .map_err(|source| CommandError::Spawn { program: program.to_owned(), source })?;

        if !output.status.success() {
            return Err(CommandError::Failed {
                program: program.to_owned(),
                status: output.status,
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_owned(),
            });
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_program_is_a_spawn_error() {
        let err = ProcessCommandRunner
            .run("timelapse-no-such-binary", &[], Path::new("."))
            .unwrap_err();
        assert!(matches!(err, CommandError::Spawn { .. }));
    }
}
