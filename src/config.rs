//! Run configuration loading and validation.
//!
//! Configuration is loaded from a TOML file plus environment variables
//! prefixed with `HOMSCAN_` (double underscore separates nested keys):
//!
//! ```text
//! HOMSCAN_PORTS__ACTUATOR=/dev/ttyUSB3
//! HOMSCAN_SAMPLING__REPETITIONS=10
//! ```
//!
//! All dwell durations accept humantime strings ("10s", "200ms", "1min").
//! The reference values mirror the lab procedure this crate automates:
//! temperatures 45.0 to 75.0 C (exclusive) in 0.2 C steps, a delay travel
//! of about 533333 device counts in 10000-count steps, 60 s temperature
//! stabilization, 10 s homing settle, 1 s move settle, and 5 reads of one
//! second each per grid point.

use crate::error::{ScanError, ScanResult};
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Top-level run configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Serial port assignments
    pub ports: PortConfig,
    /// Temperature-controller PID gains, applied once at session open
    #[serde(default)]
    pub controller_pid: PidConfig,
    /// Temperature sweep bounds (outer axis)
    pub temperature: TemperatureConfig,
    /// Delay sweep bounds in actuator counts (inner axis)
    pub delay: DelayConfig,
    /// Fixed dwell durations
    #[serde(default)]
    pub timing: TimingConfig,
    /// Measurement averaging parameters
    #[serde(default)]
    pub sampling: SamplingConfig,
    /// Output file placement and naming
    pub output: OutputConfig,
}

/// Serial port assignments for the three instruments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PortConfig {
    /// Delay-stage port (binary protocol)
    pub actuator: String,
    #[serde(default = "default_actuator_baud")]
    pub actuator_baud: u32,
    /// Temperature-controller port
    pub controller: String,
    #[serde(default = "default_controller_baud")]
    pub controller_baud: u32,
    /// Coincidence-counter readout port
    pub counters: String,
    #[serde(default = "default_counters_baud")]
    pub counters_baud: u32,
}

/// PID gains written to the temperature controller at session open.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PidConfig {
    pub proportional: u32,
    pub integral: u32,
    pub derivative: u32,
}

impl Default for PidConfig {
    fn default() -> Self {
        Self {
            proportional: 120,
            integral: 60,
            derivative: 30,
        }
    }
}

/// Temperature sweep: `start_c, start_c + step_c, ...` strictly below `stop_c`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TemperatureConfig {
    pub start_c: f64,
    /// Exclusive upper bound
    pub stop_c: f64,
    pub step_c: f64,
}

/// Delay sweep: positions `0, step_counts, ...` strictly below `travel_counts`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DelayConfig {
    /// Total travel in device counts (exclusive upper bound, may be fractional)
    pub travel_counts: f64,
    /// Step per grid point in device counts
    pub step_counts: u32,
}

/// Fixed dwell durations for the sweep state machine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimingConfig {
    /// Wait after opening the actuator port, before the first line
    #[serde(with = "humantime_serde", default = "default_startup_delay")]
    pub startup_delay: Duration,
    /// Wait after the pre-line home command
    #[serde(with = "humantime_serde", default = "default_homing_settle")]
    pub homing_settle: Duration,
    /// Wait after each temperature set point (no readback verification)
    #[serde(with = "humantime_serde", default = "default_stabilization")]
    pub stabilization: Duration,
    /// Wait after each move-absolute command
    #[serde(with = "humantime_serde", default = "default_move_settle")]
    pub move_settle: Duration,
    /// Pause between successive counter reads within one sample
    #[serde(with = "humantime_serde", default = "default_inter_read_delay")]
    pub inter_read_delay: Duration,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            startup_delay: default_startup_delay(),
            homing_settle: default_homing_settle(),
            stabilization: default_stabilization(),
            move_settle: default_move_settle(),
            inter_read_delay: default_inter_read_delay(),
        }
    }
}

/// Measurement averaging parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingConfig {
    /// Reads per channel per grid point
    pub repetitions: u32,
}

impl Default for SamplingConfig {
    fn default() -> Self {
        Self { repetitions: 5 }
    }
}

/// Output file placement and naming.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory for the per-line `.dat` files (created if missing)
    pub directory: PathBuf,
    /// Suffix after the rounded temperature in each file name
    pub file_suffix: String,
}

fn default_actuator_baud() -> u32 {
    9600
}

fn default_controller_baud() -> u32 {
    115200
}

fn default_counters_baud() -> u32 {
    9600
}

fn default_startup_delay() -> Duration {
    Duration::from_secs(5)
}

fn default_homing_settle() -> Duration {
    Duration::from_secs(10)
}

fn default_stabilization() -> Duration {
    Duration::from_secs(60)
}

fn default_move_settle() -> Duration {
    Duration::from_secs(1)
}

fn default_inter_read_delay() -> Duration {
    Duration::from_millis(200)
}

impl ScanConfig {
    /// Load configuration from a TOML file merged with `HOMSCAN_` environment
    /// overrides.
    pub fn load(path: impl AsRef<Path>) -> ScanResult<Self> {
        let config: ScanConfig = Figment::new()
            .merge(Toml::file(path.as_ref()))
            .merge(Env::prefixed("HOMSCAN_").split("__"))
            .extract()?;
        Ok(config)
    }

    /// Semantic validation beyond what deserialization can catch.
    pub fn validate(&self) -> ScanResult<()> {
        if self.ports.actuator.is_empty()
            || self.ports.controller.is_empty()
            || self.ports.counters.is_empty()
        {
            return Err(ScanError::Config("port names must be non-empty".into()));
        }
        if self.temperature.step_c <= 0.0 {
            return Err(ScanError::Config(format!(
                "temperature step must be positive, got {}",
                self.temperature.step_c
            )));
        }
        if self.temperature.stop_c <= self.temperature.start_c {
            return Err(ScanError::Config(format!(
                "temperature stop ({}) must exceed start ({})",
                self.temperature.stop_c, self.temperature.start_c
            )));
        }
        if self.delay.travel_counts <= 0.0 {
            return Err(ScanError::Config(format!(
                "delay travel must be positive, got {}",
                self.delay.travel_counts
            )));
        }
        if self.delay.step_counts == 0 {
            return Err(ScanError::Config("delay step must be positive".into()));
        }
        if self.delay.travel_counts > i32::MAX as f64 {
            return Err(ScanError::Config(format!(
                "delay travel {} exceeds the 32-bit count range of the actuator",
                self.delay.travel_counts
            )));
        }
        if self.sampling.repetitions == 0 {
            return Err(ScanError::Config(
                "sampling repetitions must be at least 1".into(),
            ));
        }
        if self.output.file_suffix.is_empty() {
            return Err(ScanError::Config("output file suffix must be non-empty".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> ScanConfig {
        ScanConfig {
            ports: PortConfig {
                actuator: "/dev/ttyUSB0".into(),
                actuator_baud: default_actuator_baud(),
                controller: "/dev/ttyUSB1".into(),
                controller_baud: default_controller_baud(),
                counters: "/dev/ttyUSB2".into(),
                counters_baud: default_counters_baud(),
            },
            controller_pid: PidConfig::default(),
            temperature: TemperatureConfig {
                start_c: 45.0,
                stop_c: 75.0,
                step_c: 0.2,
            },
            delay: DelayConfig {
                travel_counts: 533_333.3,
                step_counts: 10_000,
            },
            timing: TimingConfig::default(),
            sampling: SamplingConfig::default(),
            output: OutputConfig {
                directory: PathBuf::from("data"),
                file_suffix: "hom_line".into(),
            },
        }
    }

    #[test]
    fn test_valid_config_passes() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_reference_defaults() {
        let config = valid_config();
        assert_eq!(config.controller_pid.proportional, 120);
        assert_eq!(config.controller_pid.integral, 60);
        assert_eq!(config.controller_pid.derivative, 30);
        assert_eq!(config.timing.stabilization, Duration::from_secs(60));
        assert_eq!(config.timing.homing_settle, Duration::from_secs(10));
        assert_eq!(config.timing.move_settle, Duration::from_secs(1));
        assert_eq!(config.sampling.repetitions, 5);
    }

    #[test]
    fn test_rejects_zero_repetitions() {
        let mut config = valid_config();
        config.sampling.repetitions = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_inverted_temperature_bounds() {
        let mut config = valid_config();
        config.temperature.stop_c = 40.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_zero_delay_step() {
        let mut config = valid_config();
        config.delay.step_counts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_rejects_travel_beyond_i32() {
        let mut config = valid_config();
        config.delay.travel_counts = 3.0e9;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("homscan.toml");
        std::fs::write(
            &path,
            r#"
[ports]
actuator = "/dev/ttyUSB0"
controller = "/dev/ttyUSB1"
counters = "/dev/ttyUSB2"

[temperature]
start_c = 45.0
stop_c = 75.0
step_c = 0.2

[delay]
travel_counts = 533333.3
step_counts = 10000

[timing]
stabilization = "1min"
inter_read_delay = "200ms"

[output]
directory = "data"
file_suffix = "hom_line"
"#,
        )
        .unwrap();

        let config = ScanConfig::load(&path).unwrap();
        config.validate().unwrap();
        assert_eq!(config.ports.controller_baud, 115200);
        assert_eq!(config.timing.stabilization, Duration::from_secs(60));
        assert_eq!(config.timing.inter_read_delay, Duration::from_millis(200));
        assert_eq!(config.timing.homing_settle, Duration::from_secs(10));
    }
}
