//! Application configuration management.
//!
//! Settings are layered, later layers winning:
//!
//! 1. Built-in defaults
//! 2. TOML config file (platform config dir, or `--config PATH`)
//! 3. `STEADY_*` environment variables (`STEADY_CACHE_DIR`, `STEADY_ECHO_COMMANDS`)
//! 4. CLI flags and the pipeline manifest, applied by the caller
//!
//! # Example config file
//!
//! ```toml
//! cache_dir = "/var/tmp/steady"
//! echo_commands = true
//! ```

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

/// Prefix of environment variables read into the config.
pub const ENV_PREFIX: &str = "STEADY_";

/// Keys accepted in the config file and environment.
const KNOWN_KEYS: &[&str] = &["cache_dir", "echo_commands"];

/// Errors that can occur while loading configuration.
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    /// An explicitly requested config file does not exist.
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// The config names a key steady does not know.
    #[error("Unknown config key \"{key}\"{}", did_you_mean(.suggestion))]
    UnknownKey {
        /// The offending key
        key: String,
        /// Closest known key, if any is close
        suggestion: Option<String>,
    },

    /// The config could not be parsed or has a value of the wrong type.
    #[error("Invalid configuration: {0}")]
    Invalid(#[source] Box<figment::Error>),
}

fn did_you_mean(suggestion: &Option<String>) -> String {
    match suggestion {
        Some(s) => format!(" (did you mean \"{s}\"?)"),
        None => String::new(),
    }
}

/// Application configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Cache root. `None` means the platform temp location.
    pub cache_dir: Option<PathBuf>,
    /// Log every command before running it, even without `-v`.
    pub echo_commands: bool,
}

impl Config {
    /// Load from `explicit` if given, else from the default config path.
    ///
    /// A missing default config file is fine; a missing explicit one is not.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] if the file or environment holds an
    /// unknown key or an invalid value.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        match explicit {
            Some(path) if !path.is_file() => Err(ConfigError::NotFound(path.to_path_buf())),
            Some(path) => Self::load_from_path(path),
            None => match Self::default_path() {
                Some(path) => Self::load_from_path(&path),
                None => Self::extract(Self::base()),
            },
        }
    }

    /// Load defaults, then `path` (if it exists), then the environment.
    ///
    /// # Errors
    ///
    /// Returns a [`ConfigError`] for unknown keys or invalid values.
    pub fn load_from_path(path: &Path) -> Result<Self, ConfigError> {
        log::debug!("Loading config from {}", path.display());
        Self::extract(Self::base().merge(Toml::file(path)).merge(Self::env()))
    }

    /// The platform-specific config file location.
    #[must_use]
    pub fn default_path() -> Option<PathBuf> {
        ProjectDirs::from("org", "steady", "steady")
            .map(|dirs| dirs.config_dir().join("config.toml"))
    }

    fn base() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
    }

    fn env() -> Env {
        Env::prefixed(ENV_PREFIX).only(KNOWN_KEYS)
    }

    fn extract(figment: Figment) -> Result<Self, ConfigError> {
        figment.extract().map_err(|err| {
            if let figment::error::Kind::UnknownField(key, _) = &err.kind {
                return ConfigError::UnknownKey {
                    key: key.clone(),
                    suggestion: suggest_key(key),
                };
            }
            ConfigError::Invalid(Box::new(err))
        })
    }
}

/// Closest known key to `key`, if it is similar enough to be a typo.
#[must_use]
pub fn suggest_key(key: &str) -> Option<String> {
    KNOWN_KEYS
        .iter()
        .map(|known| (known, strsim::jaro_winkler(key, known)))
        .filter(|(_, score)| *score >= 0.8)
        .max_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(known, _)| (*known).to_string())
}
