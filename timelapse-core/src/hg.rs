//! Mercurial command lines and the parsers for their output.
//!
//! Commands are built as an argument vector (never a shell string) so file
//! paths with spaces or quotes need no escaping.

use std::path::Path;

use crate::types::Revision;

/// Number of revisions requested by the revision-list query when the caller
/// does not specify one.
pub const DEFAULT_REVISION_LIMIT: usize = 50;

const LOG_TEMPLATE: &str = "{rev}|{author|user}|{node|short}|{date|shortdate}|\
                            {count(file_mods)}|{desc|strip|firstline}\\n";
const BRANCH_AGE_TEMPLATE: &str = "{branch}|{date|age}";
const MERGE_TEMPLATE: &str = "{date|shortdate}|{desc|strip|firstline}\\n";

/// A program plus its arguments, ready for a `CommandRunner`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine {
    pub program: String,
    pub args: Vec<String>,
}

/// Builds every `hg` invocation the fetch worker issues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HgCommands {
    binary: String,
}

impl Default for HgCommands {
    fn default() -> Self {
        Self::new("hg")
    }
}

impl HgCommands {
    pub fn new(binary: impl Into<String>) -> Self {
        Self { binary: binary.into() }
    }

    pub fn binary(&self) -> &str {
        &self.binary
    }

    fn command<I, S>(&self, args: I) -> CommandLine
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CommandLine {
            program: self.binary.clone(),
            args: args.into_iter().map(Into::into).collect(),
        }
    }

    /// Up to `limit` most recent non-merge changes touching `file`.
    pub fn revision_list(&self, file: &Path, limit: usize) -> CommandLine {
        self.command([
            "log".to_owned(),
            "--template".to_owned(),
            LOG_TEMPLATE.to_owned(),
            "--no-merges".to_owned(),
            "-l".to_owned(),
            limit.to_string(),
            path_arg(file),
        ])
    }

    /// Per-line blame of `file` as of `revision`.
    pub fn annotate(&self, revision: &str, file: &Path) -> CommandLine {
        self.command([
            "annotate", "--user", "-c", "-w", "-b", "-B", "-r", revision,
        ])
        .with_arg(path_arg(file))
    }

    /// Changes `revision` made to `file`.
    pub fn patch(&self, revision: &str, file: &Path) -> CommandLine {
        self.command(["diff", "-c", revision]).with_arg(path_arg(file))
    }

    /// Branch name and relative age of `revision`.
    pub fn branch_and_age(&self, revision: &str) -> CommandLine {
        self.command(["log", "-r", revision, "--template", BRANCH_AGE_TEMPLATE])
    }

    /// The first merge that brought `revision` into another line of history.
    pub fn merge_info(&self, revision: &str) -> CommandLine {
        self.command([
            "log".to_owned(),
            "-r".to_owned(),
            format!("first(descendants({revision}) and merge())"),
            "--template".to_owned(),
            MERGE_TEMPLATE.to_owned(),
        ])
    }
}

impl CommandLine {
    fn with_arg(mut self, arg: String) -> Self {
        self.args.push(arg);
        self
    }
}

fn path_arg(file: &Path) -> String {
    file.to_string_lossy().into_owned()
}

/// Parses revision-list output into records, in output order.
///
/// Each line is `id|author|ref|date|mods|description`. The description is the
/// last field and may itself contain `|`. Lines with fewer fields or
/// non-numeric id / modification count are skipped.
pub fn parse_revision_list(text: &str) -> Vec<Revision> {
    text.lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| {
            let parsed = parse_revision_line(line);
            if parsed.is_none() {
                tracing::debug!(line, "skipping malformed log line");
            }
            parsed
        })
        .collect()
}

fn parse_revision_line(line: &str) -> Option<Revision> {
    let mut fields = line.splitn(6, '|');
    let id = fields.next()?.trim().parse().ok()?;
    let author = fields.next()?;
    let revision_ref = fields.next()?;
    let date = fields.next()?;
    let modification_count = fields.next()?.trim().parse().ok()?;
    let description = fields.next()?;
    Some(Revision::new(id, author, revision_ref, date, modification_count, description))
}

/// Splits annotate output into one owned string per source line.
pub fn parse_annotations(text: &str) -> Vec<String> {
    text.lines().map(str::to_owned).collect()
}

/// Splits a blame line into `(author, revision, code)`.
///
/// Leading padding is ignored. The author is the first whitespace-delimited
/// token and may not contain `:`; the revision is the next token and must end
/// in `:`. One space after the colon separates the code. Returns `None` for
/// any other shape.
pub fn split_annotation_prefix(line: &str) -> Option<(&str, &str, &str)> {
    let (author, rest) = line.trim_start().split_once(char::is_whitespace)?;
    if author.is_empty() || author.contains(':') {
        return None;
    }
    let (revision, code) = rest.trim_start().split_once(':')?;
    if revision.is_empty() || revision.contains(char::is_whitespace) {
        return None;
    }
    Some((author, revision, code.strip_prefix(' ').unwrap_or(code)))
}

/// Parses `branch|age` output. Missing pieces come back empty.
pub fn parse_branch_and_age(text: &str) -> (String, String) {
    let line = text.lines().next().unwrap_or_default();
    match line.split_once('|') {
        Some((branch, age)) => (branch.trim().to_owned(), age.trim().to_owned()),
        None => (line.trim().to_owned(), String::new()),
    }
}

/// Parses `date|summary` merge output; `None` when the revision was never merged.
pub fn parse_merge_info(text: &str) -> Option<(String, String)> {
    let line = text.lines().find(|l| !l.trim().is_empty())?;
    let (date, summary) = line.split_once('|')?;
    Some((date.trim().to_owned(), summary.trim().to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_six_field_log_lines() {
        let out = "3|alice|abc123|2024-01-01|2|fix bug\n2|bob|def456|2023-12-01|1|init\n";
        let revs = parse_revision_list(out);
        assert_eq!(revs.len(), 2);
        assert_eq!(revs[0].id, 3);
        assert_eq!(revs[0].author, "alice");
        assert_eq!(revs[0].revision_ref, "abc123");
        assert_eq!(revs[0].date, "2024-01-01");
        assert_eq!(revs[0].modification_count, 2);
        assert_eq!(revs[0].description, "fix bug");
        assert!(!revs[0].extra_fetched);
        assert_eq!(revs[1].id, 2);
    }

    #[test]
    fn description_keeps_pipes() {
        let revs = parse_revision_list("7|carol|aaa111|2024-02-02|1|a | b | c");
        assert_eq!(revs[0].description, "a | b | c");
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let out = "garbage\nx|alice|abc|2024|1|bad id\n4|alice|abc|2024|many|bad mods\n\
                   5|dave|ccc333|2024-03-03|0|ok\r\n4|short|line\n";
        let revs = parse_revision_list(out);
        assert_eq!(revs.iter().map(|r| r.id).collect::<Vec<_>>(), vec![5]);
        assert_eq!(revs[0].description, "ok");
    }

    #[test]
    fn empty_output_yields_nothing() {
        assert!(parse_revision_list("").is_empty());
        assert!(parse_annotations("").is_empty());
    }

    #[test]
    fn splits_padded_annotation_prefix() {
        assert_eq!(
            split_annotation_prefix("   alice abc123: int x = 1;"),
            Some(("alice", "abc123", "int x = 1;"))
        );
        assert_eq!(
            split_annotation_prefix("bob def456: a: b"),
            Some(("bob", "def456", "a: b"))
        );
        assert_eq!(split_annotation_prefix("bob def456:"), Some(("bob", "def456", "")));
    }

    #[test]
    fn delimiter_collisions_are_unattributed() {
        assert_eq!(split_annotation_prefix("al:ice abc123: x"), None);
        assert_eq!(split_annotation_prefix("alice abc 123: x"), None);
        assert_eq!(split_annotation_prefix("alice abc123 x"), None);
        assert_eq!(split_annotation_prefix(""), None);
    }

    #[test]
    fn log_command_shape() {
        let cmd = HgCommands::new("/opt/hg").revision_list(Path::new("/repo/a b.rs"), 25);
        assert_eq!(cmd.program, "/opt/hg");
        assert_eq!(cmd.args[0], "log");
        assert!(cmd.args.contains(&"--no-merges".to_owned()));
        assert_eq!(&cmd.args[4..], &["-l", "25", "/repo/a b.rs"]);
    }

    #[test]
    fn annotate_command_shape() {
        let cmd = HgCommands::default().annotate("abc123", Path::new("f.c"));
        assert_eq!(
            cmd.args,
            vec!["annotate", "--user", "-c", "-w", "-b", "-B", "-r", "abc123", "f.c"]
        );
    }

    #[test]
    fn metadata_parsers() {
        assert_eq!(
            parse_branch_and_age("default|3 weeks ago"),
            ("default".to_owned(), "3 weeks ago".to_owned())
        );
        assert_eq!(parse_branch_and_age(""), (String::new(), String::new()));
        assert_eq!(
            parse_merge_info("\n2024-01-05|Merge PR #12: widgets\n"),
            Some(("2024-01-05".to_owned(), "Merge PR #12: widgets".to_owned()))
        );
        assert_eq!(parse_merge_info(""), None);
    }
}
