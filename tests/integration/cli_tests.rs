//! `run_app` end to end: manifest on disk, real commands, exit codes.
#![cfg(unix)]

use std::fs;
use std::path::{Path, PathBuf};

use clap::Parser;
use steady::cache::DigestCache;
use steady::cli::Cli;
use steady::error::ExitCode;
use steady::run_app;
use tempfile::{tempdir, TempDir};

use super::env_lock::lock_env;

struct Project {
    dir: TempDir,
}

impl Project {
    fn new() -> Self {
        let project = Self {
            dir: tempdir().unwrap(),
        };
        fs::write(project.path("steady.toml"), "").unwrap();
        fs::create_dir(project.path("cache")).unwrap();
        project
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn write_manifest(&self, body: &str) -> PathBuf {
        let path = self.path("pipeline.toml");
        fs::write(&path, body).unwrap();
        path
    }

    /// Copy pipeline: a.txt -> b.txt -> c.txt
    fn copy_pipeline(&self) -> PathBuf {
        fs::write(self.path("a.txt"), "payload\n").unwrap();
        self.write_manifest(&format!(
            r#"
cache_dir = '{cache}'

[[step]]
name = "First"
command = ["cp", {{ input = '{a}' }}, {{ output = '{b}' }}]

[[step]]
name = "Second"
command = ["cp", {{ input = '{b}' }}, {{ output = '{c}' }}]
"#,
            cache = self.path("cache").display(),
            a = self.path("a.txt").display(),
            b = self.path("b.txt").display(),
            c = self.path("c.txt").display(),
        ))
    }

    /// Runs with the `STEADY_*` environment cleared and locked.
    fn run(&self, args: &[&str]) -> anyhow::Result<ExitCode> {
        let _lock = lock_env();
        let config = self.path("steady.toml");
        let mut argv = vec![
            "steady".to_string(),
            "--no-color".to_string(),
            "--config".to_string(),
            config.display().to_string(),
        ];
        argv.extend(args.iter().map(|a| a.to_string()));
        run_app(Cli::try_parse_from(argv).unwrap())
    }
}

fn s(path: &Path) -> String {
    path.display().to_string()
}

#[test]
fn test_run_then_rerun() {
    let project = Project::new();
    let manifest = project.copy_pipeline();

    let code = project.run(&["run", &s(&manifest)]).unwrap();
    assert_eq!(code, ExitCode::Success);
    assert_eq!(fs::read_to_string(project.path("c.txt")).unwrap(), "payload\n");

    fs::remove_file(project.path("c.txt")).unwrap();
    let code = project.run(&["run", &s(&manifest)]).unwrap();
    assert_eq!(code, ExitCode::Success);
    assert!(project.path("c.txt").exists());
}

#[test]
fn test_status_runs_nothing() {
    let project = Project::new();
    let manifest = project.copy_pipeline();

    let code = project.run(&["status", &s(&manifest), "--output", "json"]).unwrap();
    assert_eq!(code, ExitCode::Success);
    assert!(!project.path("b.txt").exists());
}

#[test]
fn test_cache_dir_flag_overrides_manifest() {
    let project = Project::new();
    let manifest = project.copy_pipeline();
    let other = project.path("other-cache");
    fs::create_dir(&other).unwrap();

    project
        .run(&["run", &s(&manifest), "--cache-dir", &s(&other)])
        .unwrap();

    let cache = DigestCache::new(&other);
    assert!(cache.lookup("First", &project.path("a.txt")).is_some());
    let manifest_cache = DigestCache::new(project.path("cache"));
    assert!(manifest_cache.lookup("First", &project.path("a.txt")).is_none());
}

#[test]
fn test_clear_then_force() {
    let project = Project::new();
    let manifest = project.copy_pipeline();
    project.run(&["run", &s(&manifest)]).unwrap();

    let cache = DigestCache::new(project.path("cache"));
    assert!(cache.lookup("Second", &project.path("c.txt")).is_some());

    let code = project.run(&["clear", &s(&manifest)]).unwrap();
    assert_eq!(code, ExitCode::Success);
    assert!(cache.lookup("Second", &project.path("c.txt")).is_none());

    let code = project.run(&["run", &s(&manifest), "--force"]).unwrap();
    assert_eq!(code, ExitCode::Success);
    assert!(cache.lookup("Second", &project.path("c.txt")).is_some());
}

#[test]
fn test_failing_step_exit_code() {
    let project = Project::new();
    let manifest = project.write_manifest(&format!(
        r#"
cache_dir = '{cache}'

[[step]]
name = "Broken"
command = ["sh", "-c", "exit 1"]

[[step]]
name = "Never"
command = ["sh", "-c", "touch \"$0\"", {{ output = '{marker}' }}]
"#,
        cache = project.path("cache").display(),
        marker = project.path("marker").display(),
    ));

    let code = project.run(&["run", &s(&manifest)]).unwrap();
    assert_eq!(code, ExitCode::StepFailed);
    assert!(!project.path("marker").exists());
}

#[test]
fn test_missing_manifest_is_error() {
    let project = Project::new();
    let result = project.run(&["run", &s(&project.path("missing.toml"))]);
    let err = result.unwrap_err();
    assert!(format!("{err:#}").contains("Failed to load manifest"));
}

#[test]
fn test_duplicate_step_names_is_error() {
    let project = Project::new();
    let manifest = project.write_manifest(
        r#"
[[step]]
name = "same"
command = ["true"]

[[step]]
name = "same"
command = ["true"]
"#,
    );

    let err = project.run(&["status", &s(&manifest)]).unwrap_err();
    assert!(format!("{err:#}").contains("Duplicate step name"));
}

#[test]
fn test_env_cache_dir_loses_to_manifest() {
    let project = Project::new();
    let manifest = project.copy_pipeline();
    let env_cache = project.path("env-cache");

    let code = {
        let _lock = lock_env();
        std::env::set_var("STEADY_CACHE_DIR", &env_cache);
        let config = project.path("steady.toml");
        let cli = Cli::try_parse_from([
            "steady".to_string(),
            "--no-color".to_string(),
            "--config".to_string(),
            s(&config),
            "run".to_string(),
            s(&manifest),
        ])
        .unwrap();
        let code = run_app(cli);
        std::env::remove_var("STEADY_CACHE_DIR");
        code.unwrap()
    };

    assert_eq!(code, ExitCode::Success);
    assert!(!env_cache.exists());
    let cache = DigestCache::new(project.path("cache"));
    assert!(cache.lookup("First", &project.path("a.txt")).is_some());
}

#[test]
fn test_invalid_config_is_error() {
    let project = Project::new();
    let manifest = project.copy_pipeline();
    fs::write(project.path("steady.toml"), "cache_dri = \"/tmp\"\n").unwrap();

    let err = project.run(&["status", &s(&manifest)]).unwrap_err();
    let message = format!("{err:#}");
    assert!(message.contains("Failed to load configuration"));
    assert!(message.contains("cache_dir"));
}
