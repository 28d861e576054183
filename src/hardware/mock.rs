//! Mock hardware for dry runs and tests.
//!
//! The mocks record every interaction behind shared handles so a test (or
//! the `--mock` dry run) can keep observing them after the orchestrator has
//! taken ownership of the boxed instances.

use crate::counters::{Channel, CounterSource};
use crate::error::{ScanError, ScanResult};
use crate::hardware::{ActuatorPort, TemperatureController};
use crate::protocol::CommandFrame;
use log::debug;
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Recording actuator port: stores every frame, flags release.
#[derive(Default)]
pub struct MockActuatorPort {
    pub frames: Arc<Mutex<Vec<CommandFrame>>>,
    pub released: Arc<AtomicBool>,
    /// When set, `release` fails with a `ResourceRelease` error.
    pub fail_release: bool,
}

impl MockActuatorPort {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ActuatorPort for MockActuatorPort {
    fn send(&mut self, frame: &CommandFrame) -> ScanResult<()> {
        debug!("mock actuator frame: {frame:?}");
        self.frames
            .lock()
            .map_err(|_| ScanError::transport("mock actuator", "frame log poisoned"))?
            .push(*frame);
        Ok(())
    }

    fn release(&mut self) -> ScanResult<()> {
        self.released.store(true, Ordering::SeqCst);
        if self.fail_release {
            return Err(ScanError::ResourceRelease {
                resource: "actuator port",
                message: "mock release failure".into(),
            });
        }
        Ok(())
    }
}

/// Recording temperature controller: stores every set point, flags release.
#[derive(Default)]
pub struct MockTemperatureController {
    pub set_points: Arc<Mutex<Vec<f64>>>,
    pub released: Arc<AtomicBool>,
    pub fail_release: bool,
}

impl MockTemperatureController {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TemperatureController for MockTemperatureController {
    fn set_point(&mut self, celsius: f64) -> ScanResult<()> {
        debug!("mock controller set point: {celsius:.2}");
        self.set_points
            .lock()
            .map_err(|_| ScanError::transport("mock controller", "set-point log poisoned"))?
            .push(celsius);
        Ok(())
    }

    fn release(&mut self) -> ScanResult<()> {
        self.released.store(true, Ordering::SeqCst);
        if self.fail_release {
            return Err(ScanError::ResourceRelease {
                resource: "temperature controller",
                message: "mock release failure".into(),
            });
        }
        Ok(())
    }
}

/// Counter source yielding the same value per channel on every read.
pub struct FixedCounterSource {
    v: f64,
    h: f64,
    c: f64,
    pub reads: Arc<AtomicUsize>,
}

impl FixedCounterSource {
    pub fn new(v: f64, h: f64, c: f64) -> Self {
        Self {
            v,
            h,
            c,
            reads: Arc::new(AtomicUsize::new(0)),
        }
    }
}

impl CounterSource for FixedCounterSource {
    fn read_counter(&mut self, channel: Channel) -> ScanResult<String> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        let value = match channel {
            Channel::V => self.v,
            Channel::H => self.h,
            Channel::C => self.c,
        };
        Ok(value.to_string())
    }
}

/// One scripted counter response.
#[derive(Debug, Clone)]
pub enum ScriptedRead {
    /// Raw text handed back to the sampler (may be unparseable on purpose).
    Text(String),
    /// Simulate a reading primitive that cannot locate its target.
    Unavailable,
}

/// Counter source replaying a fixed script; exhaustion reports
/// `SourceUnavailable`.
pub struct ScriptedCounterSource {
    script: VecDeque<ScriptedRead>,
    pub reads: Arc<AtomicUsize>,
}

impl ScriptedCounterSource {
    pub fn new(script: impl IntoIterator<Item = ScriptedRead>) -> Self {
        Self {
            script: script.into_iter().collect(),
            reads: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Script entry yielding `text` on one read.
    pub fn text(text: &str) -> ScriptedRead {
        ScriptedRead::Text(text.to_string())
    }
}

impl CounterSource for ScriptedCounterSource {
    fn read_counter(&mut self, channel: Channel) -> ScanResult<String> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        match self.script.pop_front() {
            Some(ScriptedRead::Text(text)) => Ok(text),
            Some(ScriptedRead::Unavailable) => Err(ScanError::SourceUnavailable(format!(
                "scripted unavailability at channel {channel}"
            ))),
            None => Err(ScanError::SourceUnavailable(format!(
                "counter script exhausted at channel {channel}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol;

    #[test]
    fn test_mock_actuator_records_frames_and_release() {
        let mut port = MockActuatorPort::new();
        let frames = Arc::clone(&port.frames);
        let released = Arc::clone(&port.released);

        port.send(&protocol::encode_home(0)).unwrap();
        port.release().unwrap();

        assert_eq!(frames.lock().unwrap().len(), 1);
        assert!(released.load(Ordering::SeqCst));
    }

    #[test]
    fn test_fixed_source_counts_reads() {
        let mut source = FixedCounterSource::new(10.0, 10.0, 5.0);
        let reads = Arc::clone(&source.reads);
        assert_eq!(source.read_counter(Channel::C).unwrap(), "5");
        assert_eq!(reads.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_scripted_source_exhaustion_is_unavailable() {
        let mut source = ScriptedCounterSource::new([ScriptedCounterSource::text("7")]);
        assert_eq!(source.read_counter(Channel::V).unwrap(), "7");
        assert!(matches!(
            source.read_counter(Channel::H).unwrap_err(),
            ScanError::SourceUnavailable(_)
        ));
    }
}
