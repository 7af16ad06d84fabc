//! What happened to each step during a run.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Outcome of one step within one run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepOutcome {
    /// Nothing changed since the last successful run; skipped.
    UpToDate,
    /// Stale, executed, succeeded.
    Executed,
    /// Stale, but this was a dry run.
    WouldExecute,
    /// Stale, executed, failed. The run stopped here.
    Failed {
        /// Human-readable failure
        error: String,
    },
    /// Never looked at because an earlier step failed or the run was interrupted.
    NotEvaluated,
}

/// One step's entry in a [`RunReport`].
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    /// Step name
    pub name: String,
    /// What happened
    #[serde(flatten)]
    pub outcome: StepOutcome,
    /// Time spent checking and (if needed) executing the step
    pub duration_ms: u64,
}

/// Per-step results of one [`Engine::execute`](super::Engine::execute) call.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// When the run started
    pub started_at: DateTime<Utc>,
    /// Whether stale steps were only reported, not executed
    pub dry_run: bool,
    /// Whether the run stopped because shutdown was requested
    pub interrupted: bool,
    /// One entry per registered step, in registration order
    pub steps: Vec<StepReport>,
}

impl RunReport {
    /// Start an empty report.
    #[must_use]
    pub fn new(dry_run: bool) -> Self {
        Self {
            started_at: Utc::now(),
            dry_run,
            interrupted: false,
            steps: Vec::new(),
        }
    }

    pub(crate) fn record(&mut self, name: &str, outcome: StepOutcome, duration_ms: u64) {
        self.steps.push(StepReport {
            name: name.to_string(),
            outcome,
            duration_ms,
        });
    }

    /// True if no step failed and the run was not interrupted.
    #[must_use]
    pub fn is_success(&self) -> bool {
        !self.interrupted && self.failed_step().is_none()
    }

    /// The step that stopped the run, if any.
    #[must_use]
    pub fn failed_step(&self) -> Option<&StepReport> {
        self.steps
            .iter()
            .find(|s| matches!(s.outcome, StepOutcome::Failed { .. }))
    }

    /// Outcome of the named step.
    #[must_use]
    pub fn outcome_of(&self, name: &str) -> Option<&StepOutcome> {
        self.steps.iter().find(|s| s.name == name).map(|s| &s.outcome)
    }

    /// Number of steps with exactly this outcome kind (payload ignored).
    #[must_use]
    pub fn count(&self, outcome: &StepOutcome) -> usize {
        self.steps
            .iter()
            .filter(|s| std::mem::discriminant(&s.outcome) == std::mem::discriminant(outcome))
            .count()
    }

    /// Number of steps that actually ran.
    #[must_use]
    pub fn executed(&self) -> usize {
        self.count(&StepOutcome::Executed)
    }
}
