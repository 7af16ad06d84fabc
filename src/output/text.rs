//! Human-readable run summary.
//!
//! ```text
//! Threshold  up-to-date
//! Surface    executed (1250 ms)
//! Copy       failed
//!              Process /bin/cp returned exit status: 1
//! Render     not evaluated
//!
//! 4 steps: 1 executed, 1 up-to-date, 1 not evaluated; stopped at "Copy"
//! ```

use std::fmt::Write as _;
use std::io::{self, Write};

use yansi::Paint;

use crate::engine::{RunReport, StepOutcome};

/// Text formatter for a [`RunReport`].
#[derive(Debug, Clone, Copy)]
pub struct TextOutput<'a> {
    report: &'a RunReport,
}

impl<'a> TextOutput<'a> {
    /// Create a formatter for `report`.
    #[must_use]
    pub fn new(report: &'a RunReport) -> Self {
        Self { report }
    }

    /// Render the per-step table and the summary line.
    #[must_use]
    pub fn render(&self) -> String {
        let width = self
            .report
            .steps
            .iter()
            .map(|s| s.name.chars().count())
            .max()
            .unwrap_or(0);

        let mut out = String::new();
        for step in &self.report.steps {
            let _ = write!(out, "{:<width$}  ", step.name);
            match &step.outcome {
                StepOutcome::UpToDate => {
                    let _ = writeln!(out, "{}", "up-to-date".green());
                }
                StepOutcome::Executed => {
                    let _ = writeln!(
                        out,
                        "{} {}",
                        "executed".cyan().bold(),
                        format!("({} ms)", step.duration_ms).dim()
                    );
                }
                StepOutcome::WouldExecute => {
                    let _ = writeln!(out, "{}", "would execute".yellow());
                }
                StepOutcome::Failed { error } => {
                    let _ = writeln!(out, "{}", "failed".red().bold());
                    let _ = writeln!(out, "{:indent$}{}", "", error, indent = width + 4);
                }
                StepOutcome::NotEvaluated => {
                    let _ = writeln!(out, "{}", "not evaluated".dim());
                }
            }
        }

        if !self.report.steps.is_empty() {
            out.push('\n');
        }
        out.push_str(&self.summary_line());
        out.push('\n');
        out
    }

    /// One-line summary, e.g. `3 steps: 1 executed, 2 up-to-date`.
    #[must_use]
    pub fn summary_line(&self) -> String {
        let report = self.report;
        let total = report.steps.len();

        let mut parts = Vec::new();
        for (outcome, label) in [
            (StepOutcome::Executed, "executed"),
            (StepOutcome::WouldExecute, "would execute"),
            (StepOutcome::UpToDate, "up-to-date"),
            (StepOutcome::NotEvaluated, "not evaluated"),
        ] {
            let n = report.count(&outcome);
            if n > 0 {
                parts.push(format!("{n} {label}"));
            }
        }

        let mut line = format!(
            "{} step{}",
            total,
            if total == 1 { "" } else { "s" }
        );
        if !parts.is_empty() {
            line.push_str(": ");
            line.push_str(&parts.join(", "));
        }

        if let Some(failed) = report.failed_step() {
            let _ = write!(line, "; stopped at \"{}\"", failed.name);
            line.red().to_string()
        } else if report.interrupted {
            line.push_str("; interrupted");
            line.yellow().to_string()
        } else {
            line
        }
    }

    /// Write the rendered summary.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(self.render().as_bytes())
    }
}
