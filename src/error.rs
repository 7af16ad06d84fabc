//! Structured error handling and exit codes.

use serde::Serialize;

use crate::engine::RunReport;

/// Exit codes for the steady binary.
///
/// - 0: Success (every step up-to-date, executed, or would execute)
/// - 1: General error (bad manifest, bad config, cache trouble)
/// - 2: Step failed (a step's command could not run or exited non-zero)
/// - 130: Interrupted by user (Ctrl+C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Success: the run completed.
    Success = 0,
    /// General error: an unexpected error occurred.
    GeneralError = 1,
    /// Step failed: the run stopped at a failing step.
    StepFailed = 2,
    /// Interrupted: the run was stopped by the user (Ctrl+C).
    Interrupted = 130,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "ST000",
            Self::GeneralError => "ST001",
            Self::StepFailed => "ST002",
            Self::Interrupted => "ST130",
        }
    }

    /// Exit code summarizing a finished run.
    ///
    /// Interruption wins over a failure recorded before it.
    #[must_use]
    pub fn from_report(report: &RunReport) -> Self {
        if report.interrupted {
            Self::Interrupted
        } else if report.failed_step().is_some() {
            Self::StepFailed
        } else {
            Self::Success
        }
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "ST001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message
    pub message: String,
    /// Whether the operation was interrupted
    pub interrupted: bool,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{err:#}"),
            interrupted: exit_code == ExitCode::Interrupted,
        }
    }
}
