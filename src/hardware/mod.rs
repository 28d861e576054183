//! Narrow interfaces to the experiment hardware, plus their serial-backed
//! implementations and mocks.
//!
//! The orchestrator only ever talks to these traits; the vendor specifics
//! (binary stage protocol, TC200 command set, counter readout) live behind
//! them so the sweep logic can be exercised against fakes.

pub mod counter_box;
pub mod mock;
pub mod tc200;
pub mod zaber;

use crate::error::ScanResult;
use crate::protocol::CommandFrame;

/// Transport for the delay-stage binary command channel.
///
/// Fire-and-wait-fixed-delay contract: `send` does not parse an
/// acknowledgment, and the caller owns the settle delay after each command.
pub trait ActuatorPort {
    fn send(&mut self, frame: &CommandFrame) -> ScanResult<()>;

    /// Release the underlying transport. Called exactly once at teardown;
    /// failures surface as `ScanError::ResourceRelease`.
    fn release(&mut self) -> ScanResult<()>;
}

/// Temperature-controller session: set-only, no readback consumed.
pub trait TemperatureController {
    fn set_point(&mut self, celsius: f64) -> ScanResult<()>;

    /// Release the session. Same teardown contract as `ActuatorPort`.
    fn release(&mut self) -> ScanResult<()>;
}
