//! The `Timelapse` handle: the single object the viewer polls every frame.
//!
//! A handle owns one fetch worker and at most one live session. `setup`
//! replaces the session wholesale and bumps the epoch; completions tagged with
//! an older epoch are discarded in `update`, which is also the only place the
//! revision store is mutated from worker results.
//!
//! Every method is non-blocking.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::SetupError;
use crate::hg::HgCommands;
use crate::runner::{CommandRunner, ProcessCommandRunner};
use crate::store::RevisionStore;
use crate::types::Revision;
use crate::worker::{FetchCompletion, FetchJob, FetchWorker};

/// Where a session is in its background population.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FetchState {
    /// Set up, nothing requested yet.
    #[default]
    Idle,
    /// The revision-list query is in flight.
    FetchingRevisionList,
    /// Per-revision details are being fetched one revision at a time.
    FetchingAnnotations,
    /// Every known revision has its details; no more background work.
    Settled,
}

/// Counts consumed by progress indicators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FetchProgress {
    pub completed: usize,
    pub total: usize,
}

impl FetchProgress {
    /// Completed fraction in `0.0..=1.0`; an empty session counts as done.
    pub fn ratio(&self) -> f64 {
        if self.total == 0 {
            1.0
        } else {
            self.completed as f64 / self.total as f64
        }
    }
}

struct Session {
    file_path: PathBuf,
    working_dir: PathBuf,
    epoch: u64,
    revisions: RevisionStore,
    cursor: Option<usize>,
    state: FetchState,
    fetching_annotation: Option<i64>,
}

impl Session {
    fn new(file_path: PathBuf, working_dir: PathBuf, epoch: u64) -> Self {
        Self {
            file_path,
            working_dir,
            epoch,
            revisions: RevisionStore::new(),
            cursor: None,
            state: FetchState::Idle,
            fetching_annotation: None,
        }
    }

    fn apply(&mut self, completion: FetchCompletion) {
        match completion {
            FetchCompletion::Revisions { revisions, .. } => {
                if self.state != FetchState::FetchingRevisionList {
                    tracing::debug!(state = ?self.state, "ignoring unexpected revision list");
                    return;
                }
                for revision in revisions {
                    let id = revision.id;
                    if !self.revisions.insert_sorted(revision) {
                        tracing::debug!(id, "dropping duplicate revision");
                    }
                }
                if self.cursor.is_none() && !self.revisions.is_empty() {
                    self.cursor = Some(self.revisions.len() - 1);
                }
                self.state = if self.revisions.is_empty() {
                    tracing::info!(file = %self.file_path.display(), "no revisions found");
                    FetchState::Settled
                } else {
                    FetchState::FetchingAnnotations
                };
            }
            FetchCompletion::Details { id, details, .. } => {
                if !self.revisions.set_details(id, details) {
                    tracing::debug!(id, "details already applied");
                }
                if self.fetching_annotation == Some(id) {
                    self.fetching_annotation = None;
                }
            }
        }
    }

    /// Dispatches the next details fetch, or settles when none is left.
    fn advance(&mut self, worker: &FetchWorker) {
        if self.state != FetchState::FetchingAnnotations || self.fetching_annotation.is_some() {
            return;
        }
        let Some(next) = self.revisions.next_pending() else {
            tracing::info!(count = self.revisions.len(), "all revisions fetched");
            self.state = FetchState::Settled;
            return;
        };
        let id = next.id;
        let job = FetchJob::FetchDetails {
            epoch: self.epoch,
            id,
            revision_ref: next.revision_ref.clone(),
            file: self.file_path.clone(),
            cwd: self.working_dir.clone(),
        };
        if worker.submit(job) {
            tracing::debug!(id, "details fetch dispatched");
            self.fetching_annotation = Some(id);
        } else {
            tracing::error!("fetch worker is gone; leaving remaining revisions unfetched");
            self.state = FetchState::Settled;
        }
    }

    fn current(&self) -> Option<&Revision> {
        self.cursor.and_then(|i| self.revisions.get(i))
    }
}

/// Explicitly owned session handle. See the module docs.
pub struct Timelapse {
    worker: FetchWorker,
    session: Option<Session>,
    epoch: u64,
}

impl Timelapse {
    pub fn new(runner: Arc<dyn CommandRunner>, commands: HgCommands) -> Self {
        Self { worker: FetchWorker::spawn(runner, commands), session: None, epoch: 0 }
    }

    /// A handle that runs the real `hg` binary at `binary`.
    pub fn with_hg(binary: impl Into<String>) -> Self {
        Self::new(Arc::new(ProcessCommandRunner), HgCommands::new(binary))
    }

    /// Binds the handle to `file_path`, replacing any previous session.
    ///
    /// The path must resolve to an existing regular file. Its containing
    /// directory becomes the working directory for every command. On error
    /// the previous session, if any, is left as it was. Does not start
    /// fetching; call [`Timelapse::fetch_revisions`].
    pub fn setup(&mut self, file_path: impl AsRef<Path>) -> Result<(), SetupError> {
        let requested = file_path.as_ref();
        let resolved = std::fs::canonicalize(requested).map_err(|source| {
            if source.kind() == ErrorKind::NotFound {
                SetupError::NotFound(requested.to_path_buf())
            } else {
                SetupError::Io { path: requested.to_path_buf(), source }
            }
        })?;
        if !resolved.is_file() {
            return Err(SetupError::NotAFile(resolved));
        }
        let working_dir = match resolved.parent() {
            Some(dir) => dir.to_path_buf(),
            None => return Err(SetupError::NoParentDirectory(resolved)),
        };

        self.epoch += 1;
        self.worker.set_live_epoch(self.epoch);
        tracing::info!(epoch = self.epoch, file = %resolved.display(), "session set up");
        self.session = Some(Session::new(resolved, working_dir, self.epoch));
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.session.is_some()
    }

    /// Starts background population of the current session.
    ///
    /// Idempotent: once started, later calls return `true` without queueing
    /// anything. Returns `false` when there is no valid session.
    pub fn fetch_revisions(&mut self, limit: usize) -> bool {
        let Some(session) = self.session.as_mut() else {
            return false;
        };
        if session.state != FetchState::Idle {
            return true;
        }
        let job = FetchJob::ListRevisions {
            epoch: session.epoch,
            file: session.file_path.clone(),
            cwd: session.working_dir.clone(),
            limit,
        };
        if !self.worker.submit(job) {
            tracing::error!("fetch worker is gone; cannot list revisions");
            session.state = FetchState::Settled;
            return false;
        }
        tracing::debug!(limit, "revision list dispatched");
        session.state = FetchState::FetchingRevisionList;
        true
    }

    /// Applies finished background work and dispatches the next fetch.
    ///
    /// Call once per frame. Completions from a replaced session are dropped.
    pub fn update(&mut self) {
        let live_epoch = self.session.as_ref().map(|s| s.epoch);
        for completion in self.worker.completions() {
            match self.session.as_mut() {
                Some(session) if Some(completion.epoch()) == live_epoch => session.apply(completion),
                _ => tracing::debug!(epoch = completion.epoch(), "discarding stale completion"),
            }
        }
        if let Some(session) = self.session.as_mut() {
            session.advance(&self.worker);
        }
    }

    /// Drops the session. Anything still in flight is discarded on arrival.
    pub fn shutdown(&mut self) {
        self.epoch += 1;
        self.worker.set_live_epoch(self.epoch);
        if self.session.take().is_some() {
            tracing::info!("session shut down");
        }
    }

    pub fn fetch_state(&self) -> Option<FetchState> {
        self.session.as_ref().map(|s| s.state)
    }

    pub fn has_revisions(&self) -> bool {
        self.session.as_ref().is_some_and(|s| !s.revisions.is_empty())
    }

    pub fn is_fetching_revisions(&self) -> bool {
        self.fetch_state() == Some(FetchState::FetchingRevisionList)
    }

    /// The `id` of the revision whose details are in flight, if any.
    pub fn is_fetching_annotations(&self) -> Option<i64> {
        self.session.as_ref().and_then(|s| s.fetching_annotation)
    }

    pub fn progress(&self) -> FetchProgress {
        self.session
            .as_ref()
            .map(|s| FetchProgress {
                completed: s.revisions.completed_count(),
                total: s.revisions.len(),
            })
            .unwrap_or_default()
    }

    /// All known revisions, ascending by `id`.
    pub fn revisions(&self) -> &[Revision] {
        self.session.as_ref().map(|s| s.revisions.as_slice()).unwrap_or_default()
    }

    pub fn current_revision(&self) -> Option<&Revision> {
        self.session.as_ref().and_then(Session::current)
    }

    /// Index of the current revision, `None` while the store is empty.
    pub fn revision_cursor(&self) -> Option<usize> {
        self.session.as_ref().and_then(|s| s.cursor)
    }

    /// Moves the cursor to `index`, clamped into range. Returns the applied index.
    pub fn set_revision_cursor(&mut self, index: isize) -> Option<usize> {
        let session = self.session.as_mut()?;
        session.cursor = clamp_index(index, session.revisions.len());
        session.cursor
    }

    /// Moves the cursor by `delta` positions, clamped into range.
    pub fn step_revision(&mut self, delta: isize) -> Option<usize> {
        let current = self.revision_cursor()? as isize;
        self.set_revision_cursor(current.saturating_add(delta))
    }

    /// Selects revision `id`, or the one with the nearest `id` when it is not
    /// present. Returns the `id` actually selected.
    pub fn set_current_revision_by_id(&mut self, id: i64) -> Option<i64> {
        let session = self.session.as_mut()?;
        let index = nearest_index(session.revisions.as_slice(), id)?;
        session.cursor = Some(index);
        session.revisions.get(index).map(|r| r.id)
    }

    pub fn file_path(&self) -> Option<&Path> {
        self.session.as_ref().map(|s| s.file_path.as_path())
    }

    pub fn working_dir(&self) -> Option<&Path> {
        self.session.as_ref().map(|s| s.working_dir.as_path())
    }

    /// The `revision_ref` of the current revision.
    pub fn rev_node(&self) -> Option<&str> {
        self.current_revision().map(|r| r.revision_ref.as_str())
    }
}

fn clamp_index(index: isize, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    Some(index.clamp(0, len as isize - 1) as usize)
}

/// Position of `id` in `revisions` (sorted by id), or of the closest id.
/// Ties resolve to the lower id.
fn nearest_index(revisions: &[Revision], id: i64) -> Option<usize> {
    if revisions.is_empty() {
        return None;
    }
    let pos = revisions.partition_point(|r| r.id < id);
    if pos == revisions.len() {
        return Some(pos - 1);
    }
    if pos == 0 || revisions[pos].id == id {
        return Some(pos);
    }
    let below = id - revisions[pos - 1].id;
    let above = revisions[pos].id - id;
    Some(if above < below { pos } else { pos - 1 })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn revs(ids: &[i64]) -> Vec<Revision> {
        ids.iter().map(|&id| Revision::new(id, "a", format!("r{id}"), "d", 0, "x")).collect()
    }

    #[test]
    fn clamp_index_bounds() {
        assert_eq!(clamp_index(-5, 0), None);
        assert_eq!(clamp_index(0, 0), None);
        assert_eq!(clamp_index(-1, 3), Some(0));
        assert_eq!(clamp_index(1, 3), Some(1));
        assert_eq!(clamp_index(3, 3), Some(2));
        assert_eq!(clamp_index(isize::MAX, 3), Some(2));
    }

    #[test]
    fn nearest_index_prefers_exact_then_closest() {
        let r = revs(&[2, 5, 9]);
        assert_eq!(nearest_index(&r, 5), Some(1));
        assert_eq!(nearest_index(&r, 0), Some(0));
        assert_eq!(nearest_index(&r, 100), Some(2));
        assert_eq!(nearest_index(&r, 8), Some(2));
        assert_eq!(nearest_index(&r, 3), Some(0));
        // 7 is two away from both 5 and 9.
        assert_eq!(nearest_index(&r, 7), Some(1));
        assert_eq!(nearest_index(&[], 7), None);
    }

    #[test]
    fn progress_ratio() {
        assert_eq!(FetchProgress { completed: 0, total: 0 }.ratio(), 1.0);
        assert_eq!(FetchProgress { completed: 1, total: 4 }.ratio(), 0.25);
    }

    #[test]
    fn setup_rejects_missing_and_directories() {
        let mut t = Timelapse::with_hg("hg");
        let dir = tempfile::TempDir::new().unwrap();

        let missing = dir.path().join("nope.rs");
        assert!(matches!(t.setup(&missing), Err(SetupError::NotFound(_))));
        assert!(matches!(t.setup(dir.path()), Err(SetupError::NotAFile(_))));
        assert!(!t.is_valid());
        assert!(!t.fetch_revisions(10));
        assert!(t.revisions().is_empty());
        assert_eq!(t.set_revision_cursor(0), None);
    }
}
