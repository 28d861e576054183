//! Hong-Ou-Mandel delay-temperature map acquisition engine.
//!
//! Sweeps a crystal's temperature (outer axis) and an optical-delay stage
//! (inner axis), takes an averaged photon-coincidence measurement at every
//! point and persists one `.dat` file per temperature line. The engine is
//! deliberately single-threaded and blocking: one orchestrator instance
//! exclusively owns the hardware for the duration of a run.

pub mod config;
pub mod counters;
pub mod error;
pub mod grid;
pub mod hardware;
pub mod line;
pub mod protocol;
pub mod storage;
pub mod sweep;
