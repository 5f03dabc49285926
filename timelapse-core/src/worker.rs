//! Background thread that runs every external command for a `Timelapse` handle.
//!
//! The thread is the only place that blocks on `hg`. Jobs come in over one
//! crossbeam channel and immutable completion payloads go out over another;
//! the UI thread drains completions in `Timelapse::update`. Each job and
//! completion is tagged with the session epoch it belongs to.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, TryIter};

use crate::hg::{self, CommandLine, HgCommands};
use crate::runner::CommandRunner;
use crate::types::{Revision, RevisionDetails};

/// Work requested by the scheduler.
#[derive(Debug, Clone)]
pub enum FetchJob {
    /// Enumerate the most recent `limit` revisions of `file`.
    ListRevisions {
        epoch: u64,
        file: PathBuf,
        cwd: PathBuf,
        limit: usize,
    },
    /// Blame, patch and merge metadata for one revision.
    FetchDetails {
        epoch: u64,
        id: i64,
        revision_ref: String,
        file: PathBuf,
        cwd: PathBuf,
    },
}

impl FetchJob {
    pub fn epoch(&self) -> u64 {
        match self {
            FetchJob::ListRevisions { epoch, .. } | FetchJob::FetchDetails { epoch, .. } => *epoch,
        }
    }
}

/// Result of a finished job. Failures are already folded into empty payloads.
#[derive(Debug, Clone)]
pub enum FetchCompletion {
    Revisions { epoch: u64, revisions: Vec<Revision> },
    Details { epoch: u64, id: i64, details: RevisionDetails },
}

impl FetchCompletion {
    pub fn epoch(&self) -> u64 {
        match self {
            FetchCompletion::Revisions { epoch, .. } | FetchCompletion::Details { epoch, .. } => {
                *epoch
            }
        }
    }
}

/// Owning handle for the worker thread and both ends of its channels.
///
/// Dropping the handle closes the job channel; the thread finishes whatever
/// command it is running and exits on its own.
pub struct FetchWorker {
    job_tx: Sender<FetchJob>,
    completion_rx: Receiver<FetchCompletion>,
    live_epoch: Arc<AtomicU64>,
}

impl FetchWorker {
    pub fn spawn(runner: Arc<dyn CommandRunner>, commands: HgCommands) -> Self {
        let (job_tx, job_rx) = crossbeam_channel::unbounded();
        let (completion_tx, completion_rx) = crossbeam_channel::unbounded();
        let live_epoch = Arc::new(AtomicU64::new(0));

        let epoch = Arc::clone(&live_epoch);
        std::thread::spawn(move || {
            fetch_worker_loop(runner.as_ref(), &commands, &epoch, job_rx, completion_tx)
        });

        Self { job_tx, completion_rx, live_epoch }
    }

    /// Queues `job`. Returns `false` if the worker thread is gone.
    pub fn submit(&self, job: FetchJob) -> bool {
        self.job_tx.send(job).is_ok()
    }

    /// Publishes the epoch of the live session so queued stale jobs are skipped.
    pub fn set_live_epoch(&self, epoch: u64) {
        self.live_epoch.store(epoch, Ordering::Release);
    }

    /// Completions that are ready now, without blocking.
    pub fn completions(&self) -> TryIter<'_, FetchCompletion> {
        self.completion_rx.try_iter()
    }
}

/// Loops over incoming jobs until the job channel is closed.
///
/// Jobs whose epoch no longer matches `live_epoch` are dropped before any
/// command runs. A job that was already running when its session was replaced
/// still reports back; `Timelapse::update` discards it.
pub fn fetch_worker_loop(
    runner: &dyn CommandRunner,
    commands: &HgCommands,
    live_epoch: &AtomicU64,
    rx: Receiver<FetchJob>,
    tx: Sender<FetchCompletion>,
) {
    for job in rx {
        if job.epoch() != live_epoch.load(Ordering::Acquire) {
            tracing::debug!(epoch = job.epoch(), "skipping job for replaced session");
            continue;
        }
        let completion = handle_job(runner, commands, job);
        if tx.send(completion).is_err() {
            break;
        }
    }
    tracing::debug!("fetch worker exiting");
}

fn handle_job(runner: &dyn CommandRunner, commands: &HgCommands, job: FetchJob) -> FetchCompletion {
    match job {
        FetchJob::ListRevisions { epoch, file, cwd, limit } => {
            let output = run_text(runner, commands.revision_list(&file, limit), &cwd);
            let revisions = hg::parse_revision_list(&output);
            tracing::info!(count = revisions.len(), file = %file.display(), "revision list fetched");
            FetchCompletion::Revisions { epoch, revisions }
        }
        FetchJob::FetchDetails { epoch, id, revision_ref, file, cwd } => {
            let details = fetch_details(runner, commands, &revision_ref, &file, &cwd);
            tracing::debug!(id, lines = details.annotations.len(), "revision details fetched");
            FetchCompletion::Details { epoch, id, details }
        }
    }
}

fn fetch_details(
    runner: &dyn CommandRunner,
    commands: &HgCommands,
    revision: &str,
    file: &Path,
    cwd: &Path,
) -> RevisionDetails {
    let annotations = hg::parse_annotations(&run_text(runner, commands.annotate(revision, file), cwd));

    let patch = run_text(runner, commands.patch(revision, file), cwd);
    let patch = (!patch.is_empty()).then_some(patch);

    let (branch, date_relative) =
        hg::parse_branch_and_age(&run_text(runner, commands.branch_and_age(revision), cwd));

    let (merged_date, base_pr_summary) =
        match hg::parse_merge_info(&run_text(runner, commands.merge_info(revision), cwd)) {
            Some((date, summary)) => (Some(date), Some(summary)),
            None => (None, None),
        };

    RevisionDetails { annotations, patch, branch, date_relative, merged_date, base_pr_summary }
}

/// Runs `cmd`, mapping any failure to empty output.
fn run_text(runner: &dyn CommandRunner, cmd: CommandLine, cwd: &Path) -> String {
    match runner.run(&cmd.program, &cmd.args, cwd) {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(error = %e, args = ?cmd.args, "command failed");
            String::new()
        }
    }
}
