//! Owned revision data shared between the fetch worker and the UI thread.
//!
//! Everything here is plain owned data (`Send`) so worker results can be moved
//! across the completion channel and stored without borrowing.

/// One historical change to the tracked file.
///
/// The metadata fields come from the revision-list query and never change
/// afterwards. The `annotations` / `patch` group starts empty and is filled
/// exactly once, after which `extra_fetched` is `true`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Revision {
    pub id: i64,              // local revision number, unique per repository
    pub revision_ref: String, // short node hash used in later queries
    pub author: String,
    pub branch: String,
    pub date: String,
    pub date_relative: String,
    pub merged_date: Option<String>,
    pub description: String,
    pub base_pr_summary: Option<String>,
    pub modification_count: u32,
    pub annotations: Vec<String>,
    pub patch: Option<String>,
    pub extra_fetched: bool,
}

impl Revision {
    /// Builds a list-level record with no per-revision details yet.
    pub fn new(
        id: i64,
        author: impl Into<String>,
        revision_ref: impl Into<String>,
        date: impl Into<String>,
        modification_count: u32,
        description: impl Into<String>,
    ) -> Self {
        Self {
            id,
            revision_ref: revision_ref.into(),
            author: author.into(),
            date: date.into(),
            modification_count,
            description: description.into(),
            ..Self::default()
        }
    }

    /// Parses every annotation line, flagging the ones this revision introduced.
    pub fn annotation_lines(&self) -> impl Iterator<Item = AnnotationLine<'_>> {
        self.annotations
            .iter()
            .map(|line| AnnotationLine::parse(line, &self.revision_ref))
    }
}

/// Result of the per-revision "extra" fetch: blame, patch and merge metadata.
///
/// Every field degrades to empty / `None` when its command fails.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RevisionDetails {
    pub annotations: Vec<String>,
    pub patch: Option<String>,
    pub branch: String,
    pub date_relative: String,
    pub merged_date: Option<String>,
    pub base_pr_summary: Option<String>,
}

/// A borrowed view of one `"<author> <revision>: <code>"` blame line.
///
/// Lines that do not follow that shape are kept as unattributed: `author`
/// and `revision` are `None` and `code` holds the whole line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AnnotationLine<'a> {
    pub author: Option<&'a str>,
    pub revision: Option<&'a str>,
    pub code: &'a str,
    /// True when the line was last changed by the revision being viewed.
    pub highlighted: bool,
}

impl<'a> AnnotationLine<'a> {
    /// Parses `line` and compares its revision token against `current_ref`.
    pub fn parse(line: &'a str, current_ref: &str) -> Self {
        match crate::hg::split_annotation_prefix(line) {
            Some((author, revision, code)) => Self {
                author: Some(author),
                revision: Some(revision),
                code,
                highlighted: !current_ref.is_empty() && revision == current_ref,
            },
            None => Self { author: None, revision: None, code: line, highlighted: false },
        }
    }
}
