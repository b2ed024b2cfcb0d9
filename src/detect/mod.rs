//! Detectors formulated as integer programs over candidate reachable sets.
pub mod deadlock;

pub use deadlock::{DeadlockOutcome, DeadlockResult, IlpDeadlockDetector};
