//! Pipeline manifests: steps described in a TOML file.
//!
//! # Format
//!
//! ```toml
//! # Optional; overrides the configured cache directory
//! cache_dir = "/var/tmp/steady"
//!
//! [[step]]
//! name = "Threshold"
//! command = [
//!     "threshold-image",
//!     "--level", "120",
//!     { input = "scan.nrrd" },
//!     { output = "mask.nrrd" },
//!     { hidden_output = "mask.log" },
//! ]
//!
//! [[step]]
//! name = "Surface"
//! command = ["python3", { input = "surface.py" }, { input = "mask.nrrd" }, { output = "mask.vtp" }]
//! ```
//!
//! The first token of `command` is the executable. Plain strings are
//! pass-through arguments; tables with a single `input`, `output`,
//! `hidden_input`, `hidden_output` or `pass_through` key are tagged.
//!
//! Relative paths are used as written, i.e. relative to the directory
//! steady is run from.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::cache::DigestCache;
use crate::engine::{Engine, EngineError};
use crate::step::{Arg, ProcessStep, StepError};

/// Errors that can occur while loading a manifest.
#[derive(thiserror::Error, Debug)]
pub enum ManifestError {
    /// The manifest file could not be read.
    #[error("Failed to read manifest {path}: {source}")]
    Read {
        /// Manifest path
        path: PathBuf,
        /// The underlying I/O error
        #[source]
        source: std::io::Error,
    },

    /// The manifest is not valid TOML or does not match the format.
    #[error("Invalid manifest: {0}")]
    Parse(#[from] toml::de::Error),

    /// A step's command cannot be run.
    #[error(transparent)]
    Step(#[from] StepError),

    /// Steps could not be registered (duplicate names).
    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// One command token as written in the manifest.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum CommandToken {
    /// Bare string: pass-through argument (or the executable)
    Plain(String),
    /// Single-key table: tagged argument
    Tagged(Arg),
}

impl From<CommandToken> for Arg {
    fn from(token: CommandToken) -> Self {
        match token {
            CommandToken::Plain(value) => Arg::PassThrough(value),
            CommandToken::Tagged(arg) => arg,
        }
    }
}

/// A `[[step]]` table.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StepSpec {
    /// Unique step name
    pub name: String,
    /// Executable followed by its arguments
    pub command: Vec<CommandToken>,
}

impl StepSpec {
    /// Build the process step this table describes.
    ///
    /// # Errors
    ///
    /// Returns [`StepError::InvalidCommand`] for an empty command or a
    /// tagged output/hidden executable.
    pub fn to_step(&self) -> Result<ProcessStep, StepError> {
        ProcessStep::from_command(
            self.name.clone(),
            self.command.iter().cloned().map(Arg::from),
        )
    }
}

/// A parsed pipeline manifest.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    /// Cache root for this pipeline, if it sets one
    #[serde(default)]
    pub cache_dir: Option<PathBuf>,
    /// Steps in run order
    #[serde(default, rename = "step")]
    pub steps: Vec<StepSpec>,
}

impl Manifest {
    /// Read and parse a manifest file.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::Read`] or [`ManifestError::Parse`].
    pub fn load(path: &Path) -> Result<Self, ManifestError> {
        let content = fs::read_to_string(path).map_err(|source| ManifestError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let manifest = Self::from_toml_str(&content)?;
        log::debug!(
            "Loaded {} step(s) from {}",
            manifest.steps.len(),
            path.display()
        );
        Ok(manifest)
    }

    /// Parse a manifest from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ManifestError::Parse`] if the text is not a valid manifest.
    pub fn from_toml_str(content: &str) -> Result<Self, ManifestError> {
        Ok(toml::from_str(content)?)
    }

    /// Build an engine running this manifest's steps against `cache`.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid commands or duplicate step names.
    pub fn build_engine(&self, cache: DigestCache) -> Result<Engine, ManifestError> {
        let mut engine = Engine::new(cache);
        for spec in &self.steps {
            engine.add_step(spec.to_step()?)?;
        }
        Ok(engine)
    }
}
