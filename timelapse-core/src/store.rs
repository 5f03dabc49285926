//! Ordered revision storage.
//!
//! Records are kept sorted ascending by `id` with no duplicates. Nothing is
//! ever removed; a new session gets a new store. Per-revision details are
//! written at most once, so applying the same completion twice (or two
//! completions in either order) leaves the store in the same state.

use crate::types::{Revision, RevisionDetails};

#[derive(Debug, Default, Clone)]
pub struct RevisionStore {
    revisions: Vec<Revision>,
}

impl RevisionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `revision` at its sorted position.
    ///
    /// Returns `false` and leaves the store unchanged when a record with the
    /// same `id` already exists.
    pub fn insert_sorted(&mut self, revision: Revision) -> bool {
        match self.revisions.binary_search_by_key(&revision.id, |r| r.id) {
            Ok(_) => false,
            Err(pos) => {
                self.revisions.insert(pos, revision);
                true
            }
        }
    }

    pub fn get(&self, index: usize) -> Option<&Revision> {
        self.revisions.get(index)
    }

    pub fn position_of(&self, id: i64) -> Option<usize> {
        self.revisions.binary_search_by_key(&id, |r| r.id).ok()
    }

    /// Fills in the fetched details for revision `id` and marks it extra-fetched.
    ///
    /// Returns `false` if `id` is unknown or was already filled; the existing
    /// payload is never overwritten.
    pub fn set_details(&mut self, id: i64, details: RevisionDetails) -> bool {
        let Some(pos) = self.position_of(id) else {
            return false;
        };
        let revision = &mut self.revisions[pos];
        if revision.extra_fetched {
            return false;
        }
        revision.annotations = details.annotations;
        revision.patch = details.patch;
        revision.branch = details.branch;
        revision.date_relative = details.date_relative;
        revision.merged_date = details.merged_date;
        revision.base_pr_summary = details.base_pr_summary;
        revision.extra_fetched = true;
        true
    }

    /// The lowest-id revision whose details have not been fetched yet.
    pub fn next_pending(&self) -> Option<&Revision> {
        self.revisions.iter().find(|r| !r.extra_fetched)
    }

    pub fn completed_count(&self) -> usize {
        self.revisions.iter().filter(|r| r.extra_fetched).count()
    }

    pub fn as_slice(&self) -> &[Revision] {
        &self.revisions
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Revision> {
        self.revisions.iter()
    }

    pub fn len(&self) -> usize {
        self.revisions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.revisions.is_empty()
    }
}
