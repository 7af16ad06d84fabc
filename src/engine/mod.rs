//! Sequential pipeline engine.
//!
//! # Overview
//!
//! The engine owns an ordered list of [`Step`](crate::step::Step)s and a
//! [`DigestCache`](crate::cache::DigestCache). Running it walks the steps in
//! order:
//!
//! 1. **Check**: ask the step whether it needs an update
//! 2. **Skip**: up-to-date steps are logged and left alone
//! 3. **Execute**: stale steps run (unless this is a dry run)
//! 4. **Halt**: the first failure ends the run
//!
//! # Example
//!
//! ```no_run
//! use steady::cache::DigestCache;
//! use steady::engine::Engine;
//! use steady::step::{Arg, ProcessStep};
//!
//! let mut engine = Engine::new(DigestCache::new("/var/tmp/pipeline-cache"));
//! engine.add_step(ProcessStep::new(
//!     "Copy",
//!     "cp",
//!     [Arg::input("/tmp/a.txt"), Arg::output("/tmp/b.txt")],
//! ))?;
//!
//! let report = engine.execute(false, false);
//! println!("{} step(s) executed", report.executed());
//! # Ok::<(), steady::engine::EngineError>(())
//! ```

pub mod report;
pub mod runner;

pub use report::{RunReport, StepOutcome, StepReport};
pub use runner::{Engine, EngineError};
