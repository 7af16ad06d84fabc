//! Sequential engine: check each step, run the stale ones, stop at the
//! first failure.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use super::report::{RunReport, StepOutcome};
use crate::cache::DigestCache;
use crate::step::Step;

/// Errors from configuring or maintaining an engine.
#[derive(thiserror::Error, Debug)]
pub enum EngineError {
    /// A step with this name is already registered. Names key the cache,
    /// so a duplicate would overwrite the other step's records.
    #[error("Duplicate step name: \"{0}\"")]
    DuplicateStep(String),

    /// Clearing the cache failed for some steps.
    #[error("Failed to clear cache for {failed} step(s)")]
    ClearCache {
        /// Number of steps whose records could not all be removed
        failed: usize,
    },
}

/// Ordered collection of steps sharing one digest cache.
///
/// Steps run strictly in the order they were added, one at a time. A step
/// is never looked at before every earlier step has finished.
pub struct Engine {
    cache: DigestCache,
    steps: Vec<Box<dyn Step>>,
    names: HashSet<String>,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("cache", &self.cache)
            .field("steps", &self.step_names().collect::<Vec<_>>())
            .finish()
    }
}

impl Default for Engine {
    fn default() -> Self {
        Self::new(DigestCache::with_default_root())
    }
}

impl Engine {
    /// Create an empty engine recording digests in `cache`.
    #[must_use]
    pub fn new(cache: DigestCache) -> Self {
        Self {
            cache,
            steps: Vec::new(),
            names: HashSet::new(),
            shutdown_flag: None,
        }
    }

    /// Set the shutdown flag checked before and after each step.
    ///
    /// Once the flag is set, the step currently running finishes, no
    /// further step is evaluated and the report is marked interrupted.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// The cache this engine reads and writes.
    #[must_use]
    pub fn cache(&self) -> &DigestCache {
        &self.cache
    }

    /// Replace the cache (and with it the cache root).
    pub fn set_cache(&mut self, cache: DigestCache) {
        self.cache = cache;
    }

    /// Append a step. It will run after every step added before it.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::DuplicateStep`] if a step with the same name
    /// is already registered.
    pub fn add_step(&mut self, step: impl Step + 'static) -> Result<(), EngineError> {
        self.add_boxed_step(Box::new(step))
    }

    /// Append an already boxed step.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::DuplicateStep`] if a step with the same name
    /// is already registered.
    pub fn add_boxed_step(&mut self, step: Box<dyn Step>) -> Result<(), EngineError> {
        if !self.names.insert(step.name().to_string()) {
            return Err(EngineError::DuplicateStep(step.name().to_string()));
        }
        self.steps.push(step);
        Ok(())
    }

    /// Registered step names, in run order.
    pub fn step_names(&self) -> impl Iterator<Item = &str> {
        self.steps.iter().map(|s| s.name())
    }

    /// Number of registered steps.
    #[must_use]
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether no steps are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Run every stale step in order.
    ///
    /// - Up-to-date steps are skipped.
    /// - With `dry_run`, stale steps are reported but not executed and are
    ///   treated as successful.
    /// - The first failing step stops the run; the steps after it are
    ///   reported as [`StepOutcome::NotEvaluated`].
    /// - `verbose` is passed through to each step's execution.
    pub fn execute(&self, dry_run: bool, verbose: bool) -> RunReport {
        let mut report = RunReport::new(dry_run);
        let mut halted = false;

        for step in &self.steps {
            let name = step.name();

            if !halted && self.is_shutdown_requested() {
                log::warn!("Interrupted before step \"{}\"; stopping", name);
                report.interrupted = true;
                halted = true;
            }
            if halted {
                report.record(name, StepOutcome::NotEvaluated, 0);
                continue;
            }

            let started = Instant::now();
            let outcome = self.run_step(step.as_ref(), dry_run, verbose);
            if matches!(outcome, StepOutcome::Failed { .. }) {
                halted = true;
            }
            report.record(name, outcome, started.elapsed().as_millis() as u64);

            // Ctrl+C usually lands while a child is running
            if self.is_shutdown_requested() {
                log::warn!("Interrupted during step \"{}\"; stopping", name);
                report.interrupted = true;
                halted = true;
            }
        }

        log::debug!(
            "Run finished: {} executed, {} up-to-date, {} not evaluated",
            report.executed(),
            report.count(&StepOutcome::UpToDate),
            report.count(&StepOutcome::NotEvaluated)
        );
        report
    }

    fn run_step(&self, step: &dyn Step, dry_run: bool, verbose: bool) -> StepOutcome {
        let name = step.name();

        if !step.needs_update(&self.cache) {
            log::info!("Workflow step \"{}\" is up-to-date.", name);
            return StepOutcome::UpToDate;
        }

        log::info!("Workflow step \"{}\" needs to be executed.", name);
        if dry_run {
            return StepOutcome::WouldExecute;
        }

        match step.execute(&self.cache, verbose) {
            Ok(()) => StepOutcome::Executed,
            Err(e) => {
                log::error!("Workflow step \"{}\" failed: {}", name, e);
                StepOutcome::Failed {
                    error: e.to_string(),
                }
            }
        }
    }

    /// Delete the cache records of every step, forcing all of them to run
    /// next time.
    ///
    /// Every step is cleared even if an earlier one fails.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::ClearCache`] with the number of steps whose
    /// records could not all be removed.
    pub fn clear_cache(&self) -> Result<(), EngineError> {
        log::info!("Clearing cache in \"{}\"", self.cache.root().display());

        let mut failed = 0;
        for step in &self.steps {
            if let Err(e) = step.clear_cache(&self.cache) {
                log::warn!("Failed to clear cache for step \"{}\": {}", step.name(), e);
                failed += 1;
            }
        }

        if failed == 0 {
            Ok(())
        } else {
            Err(EngineError::ClearCache { failed })
        }
    }
}
