//! Sweep orchestration: the nested temperature/delay state machine.
//!
//! One orchestrator instance exclusively owns the actuator transport, the
//! temperature-controller session, the counter source and the line sink for
//! the whole run. The sequence per temperature set point is home, stabilize,
//! then per delay position move, settle, measure, record, and finally
//! persist the completed line. Everything is blocking and single-threaded;
//! every wait is an unconditional fixed delay.
//!
//! Teardown is guaranteed: `run` consumes the orchestrator and releases both
//! hardware resources on the success and the failure path. A release failure
//! is logged and reported in the summary but never masks an in-flight error
//! and never prevents releasing the other resource.

use crate::config::ScanConfig;
use crate::counters::{ChannelReading, CounterSource, MeasurementSampler};
use crate::error::{ScanError, ScanResult};
use crate::grid::{DelayGrid, TemperatureGrid};
use crate::hardware::{ActuatorPort, TemperatureController};
use crate::line::LineBuffer;
use crate::protocol::{self, BROADCAST_DEVICE};
use crate::storage::LineSink;
use log::{error, info, warn};
use std::thread;
use std::time::{Duration, Instant};

/// Wait criterion applied after each temperature set point.
///
/// The reference behavior is a fixed dwell with no readback verification -
/// a known limitation of the procedure, kept deliberately. A closed-loop
/// criterion (poll a readback within tolerance, bounded timeout) can replace
/// it without touching the orchestrator's control flow.
pub trait StabilizationPolicy {
    fn wait_until_stable(&self, setpoint_c: f64) -> ScanResult<()>;
}

/// Fixed-dwell stabilization: sleep a constant duration, assume stable.
pub struct FixedDwell {
    dwell: Duration,
}

impl FixedDwell {
    pub fn new(dwell: Duration) -> Self {
        Self { dwell }
    }
}

impl StabilizationPolicy for FixedDwell {
    fn wait_until_stable(&self, setpoint_c: f64) -> ScanResult<()> {
        info!(
            "Set point {setpoint_c:.2} C, stabilizing for {:.0} s",
            self.dwell.as_secs_f64()
        );
        thread::sleep(self.dwell);
        Ok(())
    }
}

/// Dwell durations owned by the orchestrator itself.
#[derive(Debug, Clone)]
pub struct SweepTiming {
    /// Wait once after the hardware is opened, before the first line
    pub startup_delay: Duration,
    /// Wait after the pre-line home command
    pub homing_settle: Duration,
    /// Wait after each move-absolute command
    pub move_settle: Duration,
}

/// Outcome of a completed run.
#[derive(Debug, Default)]
pub struct SweepSummary {
    /// Temperature lines persisted
    pub lines_written: usize,
    /// Release failures captured at teardown (logged, never re-raised)
    pub release_failures: Vec<ScanError>,
    /// Wall-clock duration of the whole run including teardown
    pub elapsed: Duration,
}

/// The top-level state machine driving one delay-temperature map.
pub struct SweepOrchestrator {
    actuator: Box<dyn ActuatorPort>,
    controller: Box<dyn TemperatureController>,
    counters: Box<dyn CounterSource>,
    sink: Box<dyn LineSink>,
    temperatures: TemperatureGrid,
    delays: DelayGrid,
    sampler: MeasurementSampler,
    stabilization: Box<dyn StabilizationPolicy>,
    timing: SweepTiming,
    line: LineBuffer,
}

impl SweepOrchestrator {
    /// Wire an orchestrator from a validated configuration and the four
    /// collaborators. Grids are computed here and stay immutable for the
    /// run; the line buffer is allocated once, sized to the delay grid.
    pub fn from_config(
        config: &ScanConfig,
        actuator: Box<dyn ActuatorPort>,
        controller: Box<dyn TemperatureController>,
        counters: Box<dyn CounterSource>,
        sink: Box<dyn LineSink>,
    ) -> ScanResult<Self> {
        let temperatures = TemperatureGrid::new(
            config.temperature.start_c,
            config.temperature.stop_c,
            config.temperature.step_c,
        )?;
        let delays = DelayGrid::new(config.delay.travel_counts, config.delay.step_counts)?;
        let line = LineBuffer::new(delays.grid_size());
        let sampler = MeasurementSampler::new(
            config.sampling.repetitions,
            config.timing.inter_read_delay,
        );

        Ok(Self {
            actuator,
            controller,
            counters,
            sink,
            temperatures,
            delays,
            sampler,
            stabilization: Box::new(FixedDwell::new(config.timing.stabilization)),
            timing: SweepTiming {
                startup_delay: config.timing.startup_delay,
                homing_settle: config.timing.homing_settle,
                move_settle: config.timing.move_settle,
            },
            line,
        })
    }

    /// Substitute the stabilization policy (default: fixed dwell).
    pub fn with_stabilization(mut self, policy: Box<dyn StabilizationPolicy>) -> Self {
        self.stabilization = policy;
        self
    }

    pub fn temperatures(&self) -> &TemperatureGrid {
        &self.temperatures
    }

    pub fn delays(&self) -> &DelayGrid {
        &self.delays
    }

    /// Run the whole map. Consumes the orchestrator; both hardware
    /// resources are released on every exit path before this returns.
    pub fn run(mut self) -> ScanResult<SweepSummary> {
        let started = Instant::now();
        let outcome = self.run_sweep();
        let release_failures = self.release_hardware();

        match outcome {
            Ok(lines_written) => {
                info!(
                    "Sweep finished: {lines_written} lines in {:.1} s",
                    started.elapsed().as_secs_f64()
                );
                Ok(SweepSummary {
                    lines_written,
                    release_failures,
                    elapsed: started.elapsed(),
                })
            }
            Err(err) => {
                error!("Sweep aborted: {err}");
                Err(err)
            }
        }
    }

    fn run_sweep(&mut self) -> ScanResult<usize> {
        let temps = self.temperatures.points().to_vec();
        let positions = self.delays.positions().to_vec();

        info!(
            "Starting sweep: {} temperatures x {} delay positions",
            temps.len(),
            positions.len()
        );
        thread::sleep(self.timing.startup_delay);

        // Drive toward the first set point while the stage is still homing.
        if let Some(&first) = temps.first() {
            self.controller.set_point(first)?;
        }

        let mut lines_written = 0;
        for &tset in &temps {
            let line_started = Instant::now();

            self.home_stage()?;

            self.controller.set_point(tset)?;
            self.stabilization.wait_until_stable(tset)?;

            self.line.reset();
            for (jj, &pos) in positions.iter().enumerate() {
                self.actuator
                    .send(&protocol::encode_move_absolute(BROADCAST_DEVICE, pos))?;
                thread::sleep(self.timing.move_settle);

                let reading = self.sampler.sample(self.counters.as_mut())?;
                self.line.set(jj, &reading)?;
                log_progress(jj, &reading);
            }

            self.sink.write_line(tset, &self.line)?;
            lines_written += 1;
            info!(
                "Line {tset:.1} C done in {:.1} s",
                line_started.elapsed().as_secs_f64()
            );
        }

        Ok(lines_written)
    }

    fn home_stage(&mut self) -> ScanResult<()> {
        info!("Homing delay stage");
        self.actuator.send(&protocol::encode_home(BROADCAST_DEVICE))?;
        thread::sleep(self.timing.homing_settle);
        Ok(())
    }

    /// Release both resources unconditionally. Each failure is logged and
    /// collected; one resource failing never skips the other.
    fn release_hardware(&mut self) -> Vec<ScanError> {
        let mut failures = Vec::new();

        if let Err(err) = self.actuator.release() {
            error!("Actuator release failed: {err}");
            failures.push(err);
        }
        if let Err(err) = self.controller.release() {
            error!("Temperature-controller release failed: {err}");
            failures.push(err);
        }

        if !failures.is_empty() {
            warn!(
                "{} resource(s) failed to release cleanly; check the hardware before the next run",
                failures.len()
            );
        }
        failures
    }
}

/// Progress-only diagnostic: the visibility proxy C/(V+H). Never persisted;
/// "undefined" when the denominator is zero.
fn log_progress(jj: usize, reading: &ChannelReading) {
    let denom = reading.v + reading.h;
    if denom == 0.0 {
        info!("[{jj:03}] C/(V+H) undefined (V+H = 0), C = {:.0}", reading.c);
    } else {
        info!(
            "[{jj:03}] C/(V+H) = {:.4}, C = {:.0}",
            reading.c / denom,
            reading.c
        );
    }
}
