//! Drives the `Timelapse` handle end to end against a scripted `hg`.
//!
//! Exercises: setup, fetch_revisions, update, the one-at-a-time details
//! pipeline, failure degradation, epoch-based discarding, cursor clamping.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, Sender};
use timelapse_core::hg::HgCommands;
use timelapse_core::{CommandError, CommandRunner, FetchState, Timelapse};

type Script = Box<dyn Fn(&[String]) -> Option<String> + Send + Sync>;

/// Answers commands from a script. With a gate, every call blocks until the
/// test sends one token, so the test decides when each command finishes.
struct ScriptedRunner {
    script: Script,
    gate: Option<Receiver<()>>,
    calls: Mutex<Vec<Vec<String>>>,
}

impl ScriptedRunner {
    fn new(script: Script) -> Self {
        Self { script, gate: None, calls: Mutex::new(Vec::new()) }
    }

    fn gated(script: Script) -> (Self, Sender<()>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        let mut runner = Self::new(script);
        runner.gate = Some(rx);
        (runner, tx)
    }

    fn calls(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }

    fn calls_to(&self, subcommand: &str) -> Vec<Vec<String>> {
        self.calls().into_iter().filter(|c| c[0] == subcommand).collect()
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, program: &str, args: &[String], _cwd: &Path) -> Result<String, CommandError> {
        self.calls.lock().unwrap().push(args.to_vec());
        if let Some(gate) = &self.gate {
            let _ = gate.recv();
        }
        (self.script)(args).ok_or_else(|| CommandError::Spawn {
            program: program.to_owned(),
            source: io::Error::new(io::ErrorKind::Other, "scripted failure"),
        })
    }
}

const LOG: &str = "3|alice|abc123|2024-01-01|2|fix bug\n2|bob|def456|2023-12-01|1|init\n";

fn annotate_for(rev: &str) -> Option<String> {
    match rev {
        "abc123" => Some("alice abc123: int x = 1;\nbob def456: int y = 2;\n".to_owned()),
        "def456" => Some("bob def456: int y = 2;\n".to_owned()),
        _ => None,
    }
}

/// Standard script: `log_for(file)` answers the revision list, everything
/// else gets fixed metadata.
fn script(log_for: impl Fn(&str) -> Option<String> + Send + Sync + 'static) -> Script {
    Box::new(move |args: &[String]| {
        let is = |flag: &str| args.iter().any(|a| a == flag);
        match args[0].as_str() {
            "log" if is("--no-merges") => log_for(args.last()?.as_str()),
            "log" if args[2].starts_with("first(") => Some(String::new()),
            "log" => Some("default|2 days ago".to_owned()),
            "annotate" => annotate_for(&args[7]),
            "diff" => Some(format!("diff -r {}\n", args[2])),
            _ => None,
        }
    })
}

fn fixed_log(log: &'static str) -> Script {
    script(move |_| Some(log.to_owned()))
}

fn handle(runner: &Arc<ScriptedRunner>) -> Timelapse {
    let dyn_runner: Arc<dyn CommandRunner> = runner.clone();
    Timelapse::new(dyn_runner, HgCommands::default())
}

fn tracked_file(dir: &tempfile::TempDir, name: &str) -> PathBuf {
    let path = dir.path().join(name);
    std::fs::write(&path, "int x = 1;\nint y = 2;\n").unwrap();
    path
}

fn pump_until(t: &mut Timelapse, mut done: impl FnMut(&Timelapse) -> bool) {
    let deadline = Instant::now() + Duration::from_secs(5);
    loop {
        t.update();
        if done(t) {
            return;
        }
        assert!(Instant::now() < deadline, "timed out waiting for fetch progress");
        thread::sleep(Duration::from_millis(2));
    }
}

fn wait_for_calls(runner: &ScriptedRunner, n: usize) {
    let deadline = Instant::now() + Duration::from_secs(5);
    while runner.calls().len() < n {
        assert!(Instant::now() < deadline, "worker never issued call #{n}");
        thread::sleep(Duration::from_millis(2));
    }
}

fn settled(t: &Timelapse) -> bool {
    t.fetch_state() == Some(FetchState::Settled)
}

fn ids(t: &Timelapse) -> Vec<i64> {
    t.revisions().iter().map(|r| r.id).collect()
}

#[test]
fn log_and_annotations_end_to_end() {
    let dir = tempfile::TempDir::new().unwrap();
    let file = tracked_file(&dir, "main.c");
    let runner = Arc::new(ScriptedRunner::new(fixed_log(LOG)));
    let mut t = handle(&runner);

    t.setup(&file).unwrap();
    assert!(t.is_valid());
    assert_eq!(t.fetch_state(), Some(FetchState::Idle));
    assert!(t.fetch_revisions(50));
    pump_until(&mut t, settled);

    assert!(!t.is_fetching_revisions());
    assert_eq!(t.is_fetching_annotations(), None);
    assert!(t.has_revisions());
    assert_eq!(ids(&t), vec![2, 3]);
    assert_eq!(t.revision_cursor(), Some(1));
    assert_eq!(t.current_revision().map(|r| r.id), Some(3));
    assert_eq!(t.rev_node(), Some("abc123"));

    let current = t.current_revision().unwrap();
    assert!(current.extra_fetched);
    assert_eq!(
        current.annotations,
        vec!["alice abc123: int x = 1;".to_owned(), "bob def456: int y = 2;".to_owned()]
    );
    let flags: Vec<bool> = current.annotation_lines().map(|l| l.highlighted).collect();
    assert_eq!(flags, vec![true, false]);
    assert_eq!(current.patch.as_deref(), Some("diff -r abc123\n"));
    assert_eq!(current.branch, "default");
    assert_eq!(current.date_relative, "2 days ago");
    assert_eq!(current.merged_date, None);

    let canonical = std::fs::canonicalize(&file).unwrap();
    assert_eq!(t.file_path(), Some(canonical.as_path()));
    assert_eq!(t.working_dir(), canonical.parent());
    assert_eq!(t.progress().completed, 2);
    assert_eq!(t.progress().total, 2);
}

#[test]
fn fetch_revisions_is_idempotent() {
    let dir = tempfile::TempDir::new().unwrap();
    let file = tracked_file(&dir, "main.c");
    let runner = Arc::new(ScriptedRunner::new(fixed_log(LOG)));
    let mut t = handle(&runner);

    t.setup(&file).unwrap();
    assert!(t.fetch_revisions(50));
    assert!(t.fetch_revisions(50));
    pump_until(&mut t, settled);
    assert!(t.fetch_revisions(50));
    t.update();

    let list_calls: Vec<_> =
        runner.calls_to("log").into_iter().filter(|c| c.contains(&"--no-merges".to_owned())).collect();
    assert_eq!(list_calls.len(), 1);
    assert_eq!(runner.calls_to("annotate").len(), 2);
}

#[test]
fn details_are_fetched_one_at_a_time_in_id_order() {
    let dir = tempfile::TempDir::new().unwrap();
    let file = tracked_file(&dir, "main.c");
    let (runner, gate) = ScriptedRunner::gated(fixed_log(LOG));
    let runner = Arc::new(runner);
    let mut t = handle(&runner);

    t.setup(&file).unwrap();
    t.fetch_revisions(50);
    wait_for_calls(&runner, 1);
    t.update();
    assert!(t.is_fetching_revisions());
    assert!(!t.has_revisions());
    assert_eq!(t.is_fetching_annotations(), None);

    // Revision list finishes; the lowest id is dispatched first.
    gate.send(()).unwrap();
    pump_until(&mut t, |t| t.is_fetching_annotations() == Some(2));
    assert!(!t.is_fetching_revisions());
    assert_eq!(t.fetch_state(), Some(FetchState::FetchingAnnotations));
    assert_eq!(ids(&t), vec![2, 3]);

    // Each details job issues four commands.
    for _ in 0..4 {
        gate.send(()).unwrap();
    }
    pump_until(&mut t, |t| t.is_fetching_annotations() == Some(3));
    // One log call, four for revision 2, then revision 3's annotate.
    wait_for_calls(&runner, 6);
    assert!(t.revisions()[0].extra_fetched);
    assert!(!t.revisions()[1].extra_fetched);
    assert_eq!(runner.calls_to("annotate").len(), 2);

    for _ in 0..4 {
        gate.send(()).unwrap();
    }
    pump_until(&mut t, settled);
    assert_eq!(t.is_fetching_annotations(), None);

    let annotated: Vec<String> = runner.calls_to("annotate").iter().map(|c| c[7].clone()).collect();
    assert_eq!(annotated, vec!["def456", "abc123"]);
}

#[test]
fn failed_annotation_degrades_to_empty() {
    let dir = tempfile::TempDir::new().unwrap();
    let file = tracked_file(&dir, "main.c");
    let log = "4|carol|bad999|2024-02-01|1|broken\n3|alice|abc123|2024-01-01|2|fix bug\n";
    let runner = Arc::new(ScriptedRunner::new(fixed_log(log)));
    let mut t = handle(&runner);

    t.setup(&file).unwrap();
    t.fetch_revisions(50);
    pump_until(&mut t, settled);

    let broken = &t.revisions()[1];
    assert_eq!(broken.id, 4);
    assert!(broken.extra_fetched);
    assert!(broken.annotations.is_empty());
    assert_eq!(runner.calls_to("annotate").len(), 2);
}

#[test]
fn empty_or_failed_log_leaves_store_empty() {
    for answer in [Some(String::new()), Some("not a log line\n".to_owned()), None] {
        let dir = tempfile::TempDir::new().unwrap();
        let file = tracked_file(&dir, "main.c");
        let runner = Arc::new(ScriptedRunner::new(script(move |_| answer.clone())));
        let mut t = handle(&runner);

        t.setup(&file).unwrap();
        t.fetch_revisions(50);
        pump_until(&mut t, settled);

        assert!(!t.has_revisions());
        assert!(!t.is_fetching_revisions());
        assert_eq!(t.revision_cursor(), None);
        assert!(t.current_revision().is_none());
        assert_eq!(t.rev_node(), None);
        assert!(runner.calls_to("annotate").is_empty());
    }
}

#[test]
fn repeated_log_entries_are_deduplicated() {
    let dir = tempfile::TempDir::new().unwrap();
    let file = tracked_file(&dir, "main.c");
    let log = "3|alice|abc123|2024-01-01|2|fix bug\n3|alice|abc123|2024-01-01|2|fix bug\n\
               2|bob|def456|2023-12-01|1|init\n";
    let runner = Arc::new(ScriptedRunner::new(fixed_log(log)));
    let mut t = handle(&runner);

    t.setup(&file).unwrap();
    t.fetch_revisions(50);
    pump_until(&mut t, settled);
    assert_eq!(ids(&t), vec![2, 3]);
}

#[test]
fn stale_completion_after_setup_is_discarded() {
    let dir = tempfile::TempDir::new().unwrap();
    let old_file = tracked_file(&dir, "old.c");
    let new_file = tracked_file(&dir, "new.c");
    let (runner, gate) = ScriptedRunner::gated(script(|file: &str| {
        if file.ends_with("old.c") {
            Some("11|zed|fff111|2020-01-02|1|old b\n10|zed|eee000|2020-01-01|1|old a\n".to_owned())
        } else {
            Some(LOG.to_owned())
        }
    }));
    let runner = Arc::new(runner);
    let mut t = handle(&runner);

    t.setup(&old_file).unwrap();
    t.fetch_revisions(50);
    // The old session's log command is now running inside the worker.
    wait_for_calls(&runner, 1);

    t.setup(&new_file).unwrap();
    assert_eq!(t.fetch_state(), Some(FetchState::Idle));
    t.fetch_revisions(50);

    for _ in 0..20 {
        gate.send(()).unwrap();
    }
    pump_until(&mut t, settled);

    assert_eq!(ids(&t), vec![2, 3]);
    let annotated: Vec<String> = runner.calls_to("annotate").iter().map(|c| c[7].clone()).collect();
    assert_eq!(annotated, vec!["def456", "abc123"]);
}

#[test]
fn shutdown_drops_in_flight_work() {
    let dir = tempfile::TempDir::new().unwrap();
    let file = tracked_file(&dir, "main.c");
    let (runner, gate) = ScriptedRunner::gated(fixed_log(LOG));
    let runner = Arc::new(runner);
    let mut t = handle(&runner);

    t.setup(&file).unwrap();
    t.fetch_revisions(50);
    wait_for_calls(&runner, 1);
    t.shutdown();
    assert!(!t.is_valid());

    gate.send(()).unwrap();
    thread::sleep(Duration::from_millis(20));
    t.update();
    assert!(t.revisions().is_empty());
    assert_eq!(t.fetch_state(), None);

    // The handle is reusable after shutdown.
    for _ in 0..20 {
        gate.send(()).unwrap();
    }
    t.setup(&file).unwrap();
    t.fetch_revisions(50);
    pump_until(&mut t, settled);
    assert_eq!(ids(&t), vec![2, 3]);
}

#[test]
fn cursor_is_clamped_and_selectable_by_id() {
    let dir = tempfile::TempDir::new().unwrap();
    let file = tracked_file(&dir, "main.c");
    let runner = Arc::new(ScriptedRunner::new(fixed_log(LOG)));
    let mut t = handle(&runner);

    t.setup(&file).unwrap();
    assert_eq!(t.revision_cursor(), None);
    assert_eq!(t.set_revision_cursor(4), None);
    t.fetch_revisions(50);
    pump_until(&mut t, settled);

    assert_eq!(t.set_revision_cursor(-3), Some(0));
    assert_eq!(t.rev_node(), Some("def456"));
    assert_eq!(t.set_revision_cursor(10), Some(1));
    assert_eq!(t.step_revision(-1), Some(0));
    assert_eq!(t.step_revision(-1), Some(0));
    assert_eq!(t.set_current_revision_by_id(3), Some(3));
    assert_eq!(t.revision_cursor(), Some(1));
    assert_eq!(t.set_current_revision_by_id(-7), Some(2));
    assert_eq!(t.set_current_revision_by_id(100), Some(3));
}

#[test]
fn failed_setup_keeps_previous_session() {
    let dir = tempfile::TempDir::new().unwrap();
    let file = tracked_file(&dir, "main.c");
    let runner = Arc::new(ScriptedRunner::new(fixed_log(LOG)));
    let mut t = handle(&runner);

    t.setup(&file).unwrap();
    t.fetch_revisions(50);
    pump_until(&mut t, settled);

    assert!(t.setup(dir.path().join("missing.c")).is_err());
    assert!(t.is_valid());
    assert_eq!(ids(&t), vec![2, 3]);
}
