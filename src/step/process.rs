//! Step that runs an external command-line executable.
//!
//! # Overview
//!
//! A [`ProcessStep`] tracks three kinds of paths:
//!
//! - the **executable** itself (a new build of a tool can change its output
//!   even when the inputs are identical)
//! - its **inputs** (`Input` and `HiddenInput` arguments)
//! - its **outputs** (`Output` and `HiddenOutput` arguments)
//!
//! The step is stale when any tracked path has no cached digest, when its
//! current digest differs from (or cannot be compared with) the cached one,
//! or when a declared output no longer exists.
//!
//! After a successful run the digests of all tracked paths are recomputed
//! and written to the cache.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::Command;

use super::arg::{Arg, ResolvedArgs};
use super::{Step, StepError};
use crate::cache::{CacheResult, DigestCache};
use crate::digest::Hasher;

/// A step wrapping one invocation of an external executable.
#[derive(Debug, Clone)]
pub struct ProcessStep {
    name: String,
    executable: PathBuf,
    argv: Vec<OsString>,
    inputs: Vec<PathBuf>,
    outputs: Vec<PathBuf>,
    hasher: Hasher,
}

impl ProcessStep {
    /// Build a step from an executable and its tagged arguments.
    ///
    /// A bare executable name such as `cp` is looked up on `PATH` so the
    /// binary's digest can be tracked. If the lookup fails the name is kept
    /// as given; the step will then always be stale and fail to launch.
    ///
    /// # Example
    ///
    /// ```
    /// use steady::step::{Arg, ProcessStep};
    ///
    /// let step = ProcessStep::new(
    ///     "Resample",
    ///     "/opt/tools/resample",
    ///     [
    ///         Arg::pass("--spacing"),
    ///         Arg::pass("0.5"),
    ///         Arg::input("scan.nrrd"),
    ///         Arg::output("scan_resampled.nrrd"),
    ///     ],
    /// );
    /// assert_eq!(step.args().len(), 4);
    /// assert_eq!(step.inputs().len(), 1);
    /// ```
    pub fn new<I>(name: impl Into<String>, executable: impl Into<PathBuf>, args: I) -> Self
    where
        I: IntoIterator<Item = Arg>,
    {
        let args: Vec<Arg> = args.into_iter().collect();
        let ResolvedArgs {
            argv,
            inputs,
            outputs,
        } = ResolvedArgs::resolve(&args);

        Self {
            name: name.into(),
            executable: resolve_executable(executable.into()),
            argv,
            inputs,
            outputs,
            hasher: Hasher::new(),
        }
    }

    /// Build a step from a full command whose first token is the executable.
    ///
    /// The executable may be given as a plain (`PassThrough`) token or as an
    /// `Input`; either way it is tracked as the executable.
    ///
    /// # Errors
    ///
    /// Returns [`StepError::InvalidCommand`] if the command is empty or its
    /// first token is an output or a hidden argument.
    pub fn from_command<I>(name: impl Into<String>, command: I) -> Result<Self, StepError>
    where
        I: IntoIterator<Item = Arg>,
    {
        let name = name.into();
        let mut tokens = command.into_iter();

        let executable = match tokens.next() {
            Some(Arg::PassThrough(program)) => PathBuf::from(program),
            Some(Arg::Input(program)) => program,
            Some(other) => {
                return Err(StepError::InvalidCommand {
                    step: name,
                    reason: format!("executable cannot be tagged as {}", tag_name(&other)),
                })
            }
            None => {
                return Err(StepError::InvalidCommand {
                    step: name,
                    reason: "empty command".to_string(),
                })
            }
        };

        Ok(Self::new(name, executable, tokens))
    }

    /// Resolved path of the executable.
    #[must_use]
    pub fn executable(&self) -> &Path {
        &self.executable
    }

    /// Arguments passed to the executable (hidden arguments excluded).
    #[must_use]
    pub fn args(&self) -> &[OsString] {
        &self.argv
    }

    /// Tracked inputs.
    #[must_use]
    pub fn inputs(&self) -> &[PathBuf] {
        &self.inputs
    }

    /// Tracked outputs.
    #[must_use]
    pub fn outputs(&self) -> &[PathBuf] {
        &self.outputs
    }

    /// Every path whose digest decides staleness: executable, inputs, outputs.
    pub fn tracked_paths(&self) -> impl Iterator<Item = &Path> {
        std::iter::once(self.executable.as_path())
            .chain(self.inputs.iter().map(PathBuf::as_path))
            .chain(self.outputs.iter().map(PathBuf::as_path))
    }

    /// The invocation as a display string, each token double-quoted.
    #[must_use]
    pub fn command_line(&self) -> String {
        std::iter::once(self.executable.as_os_str())
            .chain(self.argv.iter().map(OsString::as_os_str))
            .map(|token| format!("\"{}\"", token.to_string_lossy()))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Recompute and store the digest of every tracked path.
    ///
    /// A path that cannot be digested has its record removed instead, so
    /// the next staleness check sees "no entry" and re-runs the step.
    fn record_digests(&self, cache: &DigestCache) {
        for path in self.tracked_paths() {
            match self.hasher.digest_path(path) {
                Ok(digest) => {
                    if let Err(e) = cache.store(&self.name, path, &digest) {
                        log::warn!(
                            "Could not write SHA-256 record for \"{}\" in step \"{}\": {}",
                            path.display(),
                            self.name,
                            e
                        );
                    }
                }
                Err(e) => {
                    log::warn!(
                        "Could not compute SHA-256 for \"{}\" in step \"{}\": {}",
                        path.display(),
                        self.name,
                        e
                    );
                    if let Err(e) = cache.remove(&self.name, path) {
                        log::warn!("{}", e);
                    }
                }
            }
        }
    }
}

impl Step for ProcessStep {
    fn name(&self) -> &str {
        &self.name
    }

    fn needs_update(&self, cache: &DigestCache) -> bool {
        for path in self.tracked_paths() {
            let Some(cached) = cache.lookup(&self.name, path) else {
                log::debug!(
                    "Step \"{}\": no cached digest for \"{}\"",
                    self.name,
                    path.display()
                );
                return true;
            };

            match self.hasher.digest_path(path) {
                Ok(fresh) if fresh == cached => {}
                Ok(_) => {
                    log::debug!("Step \"{}\": \"{}\" changed", self.name, path.display());
                    return true;
                }
                Err(e) => {
                    log::debug!(
                        "Step \"{}\": assuming stale, cannot digest: {}",
                        self.name,
                        e
                    );
                    return true;
                }
            }
        }

        if let Some(missing) = self.outputs.iter().find(|output| !output.exists()) {
            log::debug!(
                "Step \"{}\": output \"{}\" is missing",
                self.name,
                missing.display()
            );
            return true;
        }

        false
    }

    fn execute(&self, cache: &DigestCache, verbose: bool) -> Result<(), StepError> {
        log::info!("Executing step \"{}\"", self.name);
        if verbose {
            log::info!("Command: {}", self.command_line());
        }

        let status = Command::new(&self.executable)
            .args(&self.argv)
            .status()
            .map_err(|source| StepError::Launch {
                program: self.executable.clone(),
                source,
            })?;

        if !status.success() {
            if verbose {
                log::error!("Failed command: {}", self.command_line());
            }
            return Err(StepError::NonZeroExit {
                program: self.executable.clone(),
                status,
            });
        }

        self.record_digests(cache);
        Ok(())
    }

    fn clear_cache(&self, cache: &DigestCache) -> CacheResult<()> {
        let removed = cache.clear(&self.name, self.tracked_paths())?;
        log::debug!(
            "Step \"{}\": removed {} cache records",
            self.name,
            removed
        );
        Ok(())
    }
}

/// Look a bare program name up on `PATH`; anything with a directory part is
/// kept as given.
fn resolve_executable(executable: PathBuf) -> PathBuf {
    let is_bare = executable.components().count() == 1
        && executable.parent().is_some_and(|p| p.as_os_str().is_empty());
    if !is_bare {
        return executable;
    }

    match which::which(&executable) {
        Ok(resolved) => {
            log::trace!(
                "Resolved \"{}\" to \"{}\"",
                executable.display(),
                resolved.display()
            );
            resolved
        }
        Err(e) => {
            log::debug!("Could not find \"{}\" on PATH: {}", executable.display(), e);
            executable
        }
    }
}

fn tag_name(arg: &Arg) -> &'static str {
    match arg {
        Arg::Input(_) => "input",
        Arg::Output(_) => "output",
        Arg::HiddenInput(_) => "hidden_input",
        Arg::HiddenOutput(_) => "hidden_output",
        Arg::PassThrough(_) => "pass_through",
    }
}
