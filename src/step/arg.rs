//! Command arguments tagged with their role in staleness tracking.
//!
//! Each token of a step's command is one [`Arg`]. The tags are resolved
//! once, when the step is built, into three collections:
//!
//! | Variant        | On command line | Tracked as |
//! |----------------|-----------------|------------|
//! | `Input`        | yes             | input      |
//! | `Output`       | yes             | output     |
//! | `HiddenInput`  | no              | input      |
//! | `HiddenOutput` | no              | output     |
//! | `PassThrough`  | yes             | -          |

use std::ffi::OsString;
use std::path::{Path, PathBuf};

use serde::Deserialize;

/// One token of a step command.
///
/// In pipeline manifests the tagged variants are written as single-key
/// tables, e.g. `{ input = "a.txt" }` or `{ hidden_output = "log/" }`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Arg {
    /// A file or directory the command reads, passed on the command line.
    Input(PathBuf),
    /// A file or directory the command writes, passed on the command line.
    Output(PathBuf),
    /// Read by the command but not named on its command line
    /// (a config file it finds by itself, a sidecar index...).
    HiddenInput(PathBuf),
    /// Written by the command but not named on its command line.
    HiddenOutput(PathBuf),
    /// Literal argument; never tracked.
    PassThrough(String),
}

impl Arg {
    /// Tracked input passed on the command line.
    pub fn input(path: impl Into<PathBuf>) -> Self {
        Self::Input(path.into())
    }

    /// Tracked output passed on the command line.
    pub fn output(path: impl Into<PathBuf>) -> Self {
        Self::Output(path.into())
    }

    /// Tracked input left off the command line.
    pub fn hidden_input(path: impl Into<PathBuf>) -> Self {
        Self::HiddenInput(path.into())
    }

    /// Tracked output left off the command line.
    pub fn hidden_output(path: impl Into<PathBuf>) -> Self {
        Self::HiddenOutput(path.into())
    }

    /// Untracked literal argument.
    pub fn pass(value: impl Into<String>) -> Self {
        Self::PassThrough(value.into())
    }

    /// The value handed to the process, or `None` for hidden arguments.
    #[must_use]
    pub fn command_line_value(&self) -> Option<OsString> {
        match self {
            Self::Input(path) | Self::Output(path) => Some(path.clone().into_os_string()),
            Self::PassThrough(value) => Some(OsString::from(value)),
            Self::HiddenInput(_) | Self::HiddenOutput(_) => None,
        }
    }

    /// The tracked input path, if this argument is one.
    #[must_use]
    pub fn as_input(&self) -> Option<&Path> {
        match self {
            Self::Input(path) | Self::HiddenInput(path) => Some(path),
            _ => None,
        }
    }

    /// The tracked output path, if this argument is one.
    #[must_use]
    pub fn as_output(&self) -> Option<&Path> {
        match self {
            Self::Output(path) | Self::HiddenOutput(path) => Some(path),
            _ => None,
        }
    }
}

impl From<&str> for Arg {
    fn from(value: &str) -> Self {
        Self::PassThrough(value.to_string())
    }
}

impl From<String> for Arg {
    fn from(value: String) -> Self {
        Self::PassThrough(value)
    }
}

/// Arguments split into what the process sees and what the cache tracks.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedArgs {
    /// Values passed to the process, in original order.
    pub argv: Vec<OsString>,
    /// Tracked inputs, in first-seen order, without duplicates.
    pub inputs: Vec<PathBuf>,
    /// Tracked outputs, in first-seen order, without duplicates.
    pub outputs: Vec<PathBuf>,
}

impl ResolvedArgs {
    /// Resolve a list of tagged arguments.
    #[must_use]
    pub fn resolve<'a, I>(args: I) -> Self
    where
        I: IntoIterator<Item = &'a Arg>,
    {
        let mut resolved = Self::default();

        for arg in args {
            if let Some(value) = arg.command_line_value() {
                resolved.argv.push(value);
            }
            if let Some(path) = arg.as_input() {
                push_unique(&mut resolved.inputs, path);
            }
            if let Some(path) = arg.as_output() {
                push_unique(&mut resolved.outputs, path);
            }
        }

        resolved
    }
}

fn push_unique(paths: &mut Vec<PathBuf>, path: &Path) {
    if !paths.iter().any(|p| p == path) {
        paths.push(path.to_path_buf());
    }
}
