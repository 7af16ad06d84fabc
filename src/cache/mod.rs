//! Digest cache for steady.
//!
//! This module records, for every step, the digest each tracked path had
//! when the step last succeeded. The next run compares fresh digests
//! against these records to decide whether the step has to run again.
//!
//! # Architecture
//!
//! The cache is split into two components:
//!
//! * [`key`]: Maps (step name, tracked path) to a unique artifact file name.
//! * [`store`]: Reads, writes and deletes the artifacts under a cache root.
//!
//! # Artifact format
//!
//! One file per (step, path), holding a single lowercase hex SHA-256
//! followed by `\n`. Anything else (empty, truncated, extra lines) is
//! read back as "no entry", which makes the step stale.
//!
//! # Limitations
//!
//! No locking is done. Running two engines against the same cache root
//! and step names at the same time is not supported.

pub mod key;
pub mod store;

pub use key::artifact_path;
pub use store::{parse_artifact, CacheError, CacheResult, DigestCache};
