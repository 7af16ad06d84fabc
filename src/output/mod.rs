//! Output formatters for run reports.
//!
//! - Text for people (colored unless `--no-color` / `NO_COLOR`)
//! - JSON for scripting
//!
//! # Example
//!
//! ```no_run
//! use steady::engine::Engine;
//! use steady::error::ExitCode;
//! use steady::output::{JsonOutput, TextOutput};
//!
//! let engine = Engine::default();
//! let report = engine.execute(true, false);
//!
//! TextOutput::new(&report).write_to(&mut std::io::stdout()).unwrap();
//!
//! let json = JsonOutput::new(&report, ExitCode::from_report(&report));
//! println!("{}", json.to_json_pretty().unwrap());
//! ```

pub mod json;
pub mod text;

pub use json::{JsonOutput, JsonOutputError};
pub use text::TextOutput;
