//! JSON output formatter for run reports.
//!
//! # Output Schema
//!
//! ```json
//! {
//!   "started_at": "2026-01-01T12:00:00Z",
//!   "dry_run": false,
//!   "interrupted": false,
//!   "steps": [
//!     { "name": "Threshold", "status": "up_to_date", "duration_ms": 3 },
//!     { "name": "Surface", "status": "executed", "duration_ms": 1250 },
//!     { "name": "Copy", "status": "failed", "error": "Process /bin/cp returned exit status: 1", "duration_ms": 4 },
//!     { "name": "Render", "status": "not_evaluated", "duration_ms": 0 }
//!   ],
//!   "exit_code": 2,
//!   "exit_code_name": "ST002"
//! }
//! ```

use std::io::Write;

use serde::Serialize;

use crate::engine::RunReport;
use crate::error::ExitCode;

/// Complete JSON output structure.
#[derive(Debug, Clone, Serialize)]
pub struct JsonOutput<'a> {
    /// The run being reported
    #[serde(flatten)]
    pub report: &'a RunReport,
    /// The exit code number
    pub exit_code: i32,
    /// The machine-readable exit code name (e.g., "ST000")
    pub exit_code_name: &'static str,
}

impl<'a> JsonOutput<'a> {
    /// Wrap a report with the exit code the run will end with.
    #[must_use]
    pub fn new(report: &'a RunReport, exit_code: ExitCode) -> Self {
        Self {
            report,
            exit_code: exit_code.as_i32(),
            exit_code_name: exit_code.code_prefix(),
        }
    }

    /// Serialize to compact JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Serialize to pretty-printed JSON string.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json_pretty(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Write JSON followed by a newline.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W, pretty: bool) -> Result<(), JsonOutputError> {
        let json = if pretty {
            self.to_json_pretty()?
        } else {
            self.to_json()?
        };
        writer.write_all(json.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }
}

/// Errors that can occur during JSON output.
#[derive(thiserror::Error, Debug)]
pub enum JsonOutputError {
    /// JSON serialization error
    #[error("JSON serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error during writing
    #[error("I/O error during JSON generation: {0}")]
    Io(#[from] std::io::Error),
}
