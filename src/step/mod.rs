//! Steps: the units of work an engine runs.
//!
//! A step answers three questions for the [`Engine`](crate::engine::Engine):
//!
//! 1. [`Step::needs_update`]: has anything it depends on changed?
//! 2. [`Step::execute`]: do the work and record fresh digests.
//! 3. [`Step::clear_cache`]: forget everything recorded, forcing a re-run.
//!
//! [`ProcessStep`] is the implementation used for external commands. Other
//! kinds of work (an in-process transform, say) implement the same trait and
//! need no engine changes.
//!
//! # Example
//!
//! ```no_run
//! use steady::cache::DigestCache;
//! use steady::step::{Arg, ProcessStep, Step};
//!
//! let step = ProcessStep::new(
//!     "Copy",
//!     "/bin/cp",
//!     [Arg::input("/tmp/a.txt"), Arg::output("/tmp/b.txt")],
//! );
//!
//! let cache = DigestCache::with_default_root();
//! if step.needs_update(&cache) {
//!     step.execute(&cache, true).expect("copy failed");
//! }
//! ```

pub mod arg;
pub mod process;

use std::io;
use std::path::PathBuf;
use std::process::ExitStatus;

use crate::cache::{CacheResult, DigestCache};

pub use arg::{Arg, ResolvedArgs};
pub use process::ProcessStep;

/// A cacheable unit of work.
///
/// Step names are the cache namespace: two steps with the same name in one
/// cache root overwrite each other's records.
pub trait Step {
    /// Name of the step, unique within an engine.
    fn name(&self) -> &str;

    /// Whether the step has to run.
    ///
    /// Errors while checking (unreadable files, corrupt cache artifacts)
    /// count as "needs update"; this never skips work it cannot verify.
    fn needs_update(&self, cache: &DigestCache) -> bool;

    /// Run the step and, on success, record fresh digests in `cache`.
    ///
    /// With `verbose`, the full invocation is logged.
    ///
    /// # Errors
    ///
    /// Returns a [`StepError`] if the work failed. Failing to record a digest
    /// afterwards is logged and does not fail the step.
    fn execute(&self, cache: &DigestCache, verbose: bool) -> Result<(), StepError>;

    /// Delete every cache record this step owns.
    ///
    /// # Errors
    ///
    /// Returns the first [`CacheError`](crate::cache::CacheError) hit while
    /// deleting; missing records are not errors.
    fn clear_cache(&self, cache: &DigestCache) -> CacheResult<()>;
}

impl<S: Step + ?Sized> Step for Box<S> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn needs_update(&self, cache: &DigestCache) -> bool {
        (**self).needs_update(cache)
    }

    fn execute(&self, cache: &DigestCache, verbose: bool) -> Result<(), StepError> {
        (**self).execute(cache, verbose)
    }

    fn clear_cache(&self, cache: &DigestCache) -> CacheResult<()> {
        (**self).clear_cache(cache)
    }
}

/// Errors that fail a step (and with it, the run).
#[derive(thiserror::Error, Debug)]
pub enum StepError {
    /// The command could not be started at all.
    #[error("Failed to run command-line executable {program}: {source}")]
    Launch {
        /// Executable that failed to start
        program: PathBuf,
        /// The underlying I/O error
        #[source]
        source: io::Error,
    },

    /// The command ran but did not exit successfully.
    #[error("Process {program} returned {status}")]
    NonZeroExit {
        /// Executable that failed
        program: PathBuf,
        /// How it exited
        status: ExitStatus,
    },

    /// The step was described in a way that cannot be run.
    #[error("Invalid command for step \"{step}\": {reason}")]
    InvalidCommand {
        /// Step name
        step: String,
        /// What is wrong with it
        reason: String,
    },

    /// Any other failure, for step kinds outside this crate.
    #[error("{0}")]
    Other(String),
}

impl StepError {
    /// Exit code of a process that ran and failed, if it exited normally.
    #[must_use]
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            Self::NonZeroExit { status, .. } => status.code(),
            _ => None,
        }
    }
}
