//! End-to-end engine scenarios against real processes.
//!
//! These run `cp`, `sh` and small shell scripts, so they are Unix-only.
#![cfg(unix)]

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use steady::cache::DigestCache;
use steady::digest::digest_path;
use steady::engine::{Engine, StepOutcome};
use steady::step::{Arg, ProcessStep, Step, StepError};
use tempfile::{tempdir, TempDir};

struct Fixture {
    work: TempDir,
    cache: TempDir,
}

impl Fixture {
    fn new() -> Self {
        Self {
            work: tempdir().unwrap(),
            cache: tempdir().unwrap(),
        }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.work.path().join(name)
    }

    fn cache(&self) -> DigestCache {
        DigestCache::new(self.cache.path())
    }

    fn engine(&self) -> Engine {
        Engine::new(self.cache())
    }

    fn write_script(&self, name: &str, body: &str) -> PathBuf {
        let path = self.path(name);
        fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();
        path
    }
}

fn copy_step(from: &Path, to: &Path) -> ProcessStep {
    ProcessStep::new("Copy", "cp", [Arg::input(from), Arg::output(to)])
}

fn shell_step(name: &str, script: &str, args: impl IntoIterator<Item = Arg>) -> ProcessStep {
    let mut all = vec![Arg::pass("-c"), Arg::pass(script)];
    all.extend(args);
    ProcessStep::new(name, "sh", all)
}

#[test]
fn test_copy_scenario_tamper_and_restore() {
    let fx = Fixture::new();
    let a = fx.path("a.txt");
    let b = fx.path("b.txt");
    fs::write(&a, "hello\n").unwrap();

    let mut engine = fx.engine();
    engine.add_step(copy_step(&a, &b)).unwrap();

    let report = engine.execute(false, false);
    assert_eq!(report.outcome_of("Copy"), Some(&StepOutcome::Executed));
    assert_eq!(fs::read_to_string(&b).unwrap(), "hello\n");

    let report = engine.execute(false, false);
    assert_eq!(report.outcome_of("Copy"), Some(&StepOutcome::UpToDate));

    fs::write(&b, "tampered\n").unwrap();
    let report = engine.execute(false, false);
    assert_eq!(report.outcome_of("Copy"), Some(&StepOutcome::Executed));
    assert_eq!(fs::read_to_string(&b).unwrap(), "hello\n");

    let report = engine.execute(false, false);
    assert_eq!(report.outcome_of("Copy"), Some(&StepOutcome::UpToDate));
}

#[test]
fn test_second_run_executes_nothing() {
    let fx = Fixture::new();
    let a = fx.path("a.txt");
    let b = fx.path("b.txt");
    let c = fx.path("c.txt");
    fs::write(&a, "data").unwrap();

    let mut engine = fx.engine();
    engine
        .add_step(ProcessStep::new("First", "cp", [Arg::input(&a), Arg::output(&b)]))
        .unwrap();
    engine
        .add_step(ProcessStep::new("Second", "cp", [Arg::input(&b), Arg::output(&c)]))
        .unwrap();

    let first = engine.execute(false, false);
    assert_eq!(first.executed(), 2);

    let second = engine.execute(false, false);
    assert!(second.is_success());
    assert_eq!(second.executed(), 0);
    assert_eq!(second.count(&StepOutcome::UpToDate), 2);
}

#[test]
fn test_input_change_triggers_rerun() {
    let fx = Fixture::new();
    let a = fx.path("a.txt");
    let b = fx.path("b.txt");
    fs::write(&a, "v1").unwrap();

    let cache = fx.cache();
    let step = copy_step(&a, &b);
    step.execute(&cache, false).unwrap();
    assert!(!step.needs_update(&cache));

    fs::write(&a, "v2").unwrap();
    assert!(step.needs_update(&cache));
}

#[test]
fn test_deleted_output_triggers_rerun() {
    let fx = Fixture::new();
    let a = fx.path("a.txt");
    let b = fx.path("b.txt");
    fs::write(&a, "content").unwrap();

    let mut engine = fx.engine();
    engine.add_step(copy_step(&a, &b)).unwrap();
    engine.execute(false, false);

    fs::remove_file(&b).unwrap();
    let report = engine.execute(false, false);
    assert_eq!(report.outcome_of("Copy"), Some(&StepOutcome::Executed));
    assert!(b.exists());
}

#[test]
fn test_hidden_output_loss_detected() {
    let fx = Fixture::new();
    let a = fx.path("a.txt");
    let b = fx.path("b.txt");
    let log = fx.path("b.log");
    fs::write(&a, "content").unwrap();

    let cache = fx.cache();
    let step = ProcessStep::new(
        "CopyWithLog",
        fx.write_script("copy.sh", &format!("cp \"$1\" \"$2\" && echo done > '{}'", log.display())),
        [Arg::input(&a), Arg::output(&b), Arg::hidden_output(&log)],
    );
    step.execute(&cache, false).unwrap();
    assert!(!step.needs_update(&cache));

    fs::remove_file(&log).unwrap();
    assert!(step.needs_update(&cache));
}

#[test]
fn test_executable_change_triggers_rerun() {
    let fx = Fixture::new();
    let a = fx.path("a.txt");
    let b = fx.path("b.txt");
    fs::write(&a, "content").unwrap();
    let script = fx.write_script("tool.sh", "cp \"$1\" \"$2\"");

    let cache = fx.cache();
    let step = ProcessStep::new("Tool", &script, [Arg::input(&a), Arg::output(&b)]);
    step.execute(&cache, false).unwrap();
    assert!(!step.needs_update(&cache));

    fx.write_script("tool.sh", "# rebuilt\ncp \"$1\" \"$2\"");
    assert!(step.needs_update(&cache));
}

#[test]
fn test_hidden_input_tracked_but_not_passed() {
    let fx = Fixture::new();
    let a = fx.path("a.txt");
    let b = fx.path("b.txt");
    let settings = fx.path("settings.ini");
    fs::write(&a, "content").unwrap();
    fs::write(&settings, "level=1").unwrap();

    let cache = fx.cache();
    let step = shell_step(
        "Args",
        "printf '%s\\n' \"$@\" > \"$0\"",
        [Arg::output(&b), Arg::input(&a), Arg::hidden_input(&settings)],
    );
    step.execute(&cache, false).unwrap();

    let recorded = fs::read_to_string(&b).unwrap();
    assert!(recorded.contains("a.txt"));
    assert!(!recorded.contains("settings.ini"));
    assert!(!step.needs_update(&cache));

    fs::write(&settings, "level=2").unwrap();
    assert!(step.needs_update(&cache));
}

#[test]
fn test_directory_input_change_triggers_rerun() {
    let fx = Fixture::new();
    let data = fx.path("data");
    fs::create_dir(&data).unwrap();
    fs::write(data.join("one.txt"), "1").unwrap();
    let listing = fx.path("listing.txt");

    let cache = fx.cache();
    let step = shell_step("List", "ls \"$0\" > \"$1\"", [Arg::input(&data), Arg::output(&listing)]);
    step.execute(&cache, false).unwrap();
    assert!(!step.needs_update(&cache));

    fs::write(data.join("two.txt"), "2").unwrap();
    assert!(step.needs_update(&cache));
}

#[test]
fn test_failure_halts_run_and_records_nothing() {
    let fx = Fixture::new();
    let a = fx.path("a.txt");
    let b = fx.path("b.txt");
    fs::write(&a, "content").unwrap();

    let mut engine = fx.engine();
    engine
        .add_step(shell_step("Fail", "exit 3", [Arg::hidden_input(&a)]))
        .unwrap();
    engine.add_step(copy_step(&a, &b)).unwrap();

    let report = engine.execute(false, false);
    let failed = report.failed_step().unwrap();
    assert_eq!(failed.name, "Fail");
    match &failed.outcome {
        StepOutcome::Failed { error } => assert!(error.contains("exit status: 3"), "{error}"),
        other => panic!("unexpected outcome {other:?}"),
    }
    assert_eq!(report.outcome_of("Copy"), Some(&StepOutcome::NotEvaluated));
    assert!(!b.exists());

    let failing = shell_step("Fail", "exit 3", [Arg::hidden_input(&a)]);
    assert!(failing.needs_update(engine.cache()));
}

#[test]
fn test_non_zero_exit_error() {
    let fx = Fixture::new();
    let step = shell_step("Fail", "exit 7", Vec::new());

    let err = step.execute(&fx.cache(), true).unwrap_err();
    assert!(matches!(err, StepError::NonZeroExit { .. }));
    assert_eq!(err.exit_code(), Some(7));
}

#[test]
fn test_missing_executable_fails_to_launch() {
    let fx = Fixture::new();
    let step = ProcessStep::new("Ghost", fx.path("no-such-tool"), Vec::new());
    let cache = fx.cache();

    assert!(step.needs_update(&cache));
    let err = step.execute(&cache, false).unwrap_err();
    assert!(matches!(err, StepError::Launch { .. }));
}

#[test]
fn test_clear_cache_forces_rerun() {
    let fx = Fixture::new();
    let a = fx.path("a.txt");
    let b = fx.path("b.txt");
    fs::write(&a, "content").unwrap();

    let mut engine = fx.engine();
    engine.add_step(copy_step(&a, &b)).unwrap();
    engine.execute(false, false);

    engine.clear_cache().unwrap();
    let report = engine.execute(true, false);
    assert_eq!(report.outcome_of("Copy"), Some(&StepOutcome::WouldExecute));
}

#[test]
fn test_dry_run_executes_nothing() {
    let fx = Fixture::new();
    let a = fx.path("a.txt");
    let b = fx.path("b.txt");
    fs::write(&a, "content").unwrap();

    let mut engine = fx.engine();
    engine.add_step(copy_step(&a, &b)).unwrap();

    let report = engine.execute(true, false);
    assert!(report.is_success());
    assert!(report.dry_run);
    assert_eq!(report.outcome_of("Copy"), Some(&StepOutcome::WouldExecute));
    assert!(!b.exists());
}

#[test]
fn test_cache_holds_current_digests_after_success() {
    let fx = Fixture::new();
    let a = fx.path("a.txt");
    let b = fx.path("b.txt");
    fs::write(&a, "content").unwrap();

    let cache = fx.cache();
    let step = copy_step(&a, &b);
    step.execute(&cache, false).unwrap();

    for path in step.tracked_paths() {
        assert_eq!(
            cache.lookup("Copy", path),
            Some(digest_path(path).unwrap()),
            "{}",
            path.display()
        );
    }
}

#[test]
fn test_steps_share_paths_without_sharing_records() {
    let fx = Fixture::new();
    let a = fx.path("a.txt");
    let b = fx.path("b.txt");
    let c = fx.path("c.txt");
    fs::write(&a, "content").unwrap();

    let cache = fx.cache();
    let first = ProcessStep::new("First", "cp", [Arg::input(&a), Arg::output(&b)]);
    let second = ProcessStep::new("Second", "cp", [Arg::input(&a), Arg::output(&c)]);

    first.execute(&cache, false).unwrap();
    assert!(!first.needs_update(&cache));
    assert!(second.needs_update(&cache));
}
