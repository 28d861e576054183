//! Custom error types for the scan engine.
//!
//! This module defines the primary error type, `ScanError`, for the entire
//! crate. Using the `thiserror` crate, it provides a centralized and
//! consistent way to handle the failure kinds the sweep can hit, from bad
//! configuration values to serial I/O problems.
//!
//! ## Propagation policy
//!
//! Every kind except `ResourceRelease` is fatal to the current run: the
//! orchestrator aborts the remaining sweep immediately and propagates the
//! error after tearing down the hardware. `ResourceRelease` is raised only
//! during teardown; it is logged and reported in the run summary but never
//! re-raised, so releasing one resource cannot prevent releasing the other
//! or mask an in-flight failure from the loop body.

use crate::counters::Channel;
use thiserror::Error;

/// Convenience alias for results using the crate error type.
pub type ScanResult<T> = std::result::Result<T, ScanError>;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Counter '{channel}' returned unparseable reading {raw:?}")]
    Parse { channel: Channel, raw: String },

    #[error("Counter source unavailable: {0}")]
    SourceUnavailable(String),

    #[error("Transport failure on '{device}': {message}")]
    Transport { device: String, message: String },

    #[error("Failed to release {resource}: {message}")]
    ResourceRelease {
        resource: &'static str,
        message: String,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0}")]
    Storage(#[from] csv::Error),

    #[error("Configuration load error: {0}")]
    ConfigLoad(#[from] Box<figment::Error>),

    #[error("Configuration validation error: {0}")]
    Config(String),
}

impl ScanError {
    /// Build a transport failure with the device name attached.
    pub fn transport(device: impl Into<String>, message: impl ToString) -> Self {
        ScanError::Transport {
            device: device.into(),
            message: message.to_string(),
        }
    }
}

impl From<figment::Error> for ScanError {
    fn from(err: figment::Error) -> Self {
        ScanError::ConfigLoad(Box::new(err))
    }
}
