//! Coincidence-counter channels and the measurement-averaging engine.
//!
//! A `CounterSource` yields one raw scalar reading per channel; the
//! `MeasurementSampler` takes a configured number of reads per channel,
//! pausing between repetitions, and reduces them to per-channel mean and
//! population standard deviation (divisor = sample count, not count - 1).

use crate::error::{ScanError, ScanResult};
use log::debug;
use std::fmt;
use std::thread;
use std::time::Duration;

/// One of the three measured photon-coincidence counters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Channel {
    V,
    H,
    C,
}

impl Channel {
    /// Read order within one repetition: V, then H, then C.
    pub const ALL: [Channel; 3] = [Channel::V, Channel::H, Channel::C];

    pub fn label(self) -> &'static str {
        match self {
            Channel::V => "V",
            Channel::H => "H",
            Channel::C => "C",
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Averaged result of one grid point: three channel means and their
/// population standard deviations. All six values are finite.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ChannelReading {
    pub v: f64,
    pub h: f64,
    pub c: f64,
    pub ev: f64,
    pub eh: f64,
    pub ec: f64,
}

/// External reading primitive: one raw scalar per channel per call.
///
/// Implementations report `ScanError::SourceUnavailable` when the underlying
/// counter cannot be located; that is fatal for the run since it means the
/// measurement apparatus is not correctly connected.
pub trait CounterSource {
    fn read_counter(&mut self, channel: Channel) -> ScanResult<String>;
}

/// Repeated-read averaging of the three counter channels.
#[derive(Debug, Clone)]
pub struct MeasurementSampler {
    repetitions: u32,
    inter_read_delay: Duration,
}

impl MeasurementSampler {
    pub fn new(repetitions: u32, inter_read_delay: Duration) -> Self {
        Self {
            repetitions,
            inter_read_delay,
        }
    }

    /// Take `repetitions` reads of each channel and reduce them to one
    /// `ChannelReading`. Fails before any read when `repetitions` is zero;
    /// any unreadable scalar aborts the whole call with no partial result.
    pub fn sample(&self, source: &mut dyn CounterSource) -> ScanResult<ChannelReading> {
        if self.repetitions == 0 {
            return Err(ScanError::InvalidArgument(
                "sample repetitions must be a positive integer".into(),
            ));
        }

        let n = self.repetitions as usize;
        let mut v = Vec::with_capacity(n);
        let mut h = Vec::with_capacity(n);
        let mut c = Vec::with_capacity(n);

        for i in 0..n {
            v.push(self.read_scalar(source, Channel::V)?);
            h.push(self.read_scalar(source, Channel::H)?);
            c.push(self.read_scalar(source, Channel::C)?);

            // Pause between repetitions, not after the last one.
            if i + 1 < n {
                thread::sleep(self.inter_read_delay);
            }
        }

        Ok(ChannelReading {
            v: mean(&v),
            h: mean(&h),
            c: mean(&c),
            ev: population_std(&v),
            eh: population_std(&h),
            ec: population_std(&c),
        })
    }

    fn read_scalar(&self, source: &mut dyn CounterSource, channel: Channel) -> ScanResult<f64> {
        let raw = source.read_counter(channel)?;
        // Counter GUIs pad with whitespace and thousands separators.
        let cleaned: String = raw.trim().replace(',', "");
        let value = cleaned.parse::<f64>().map_err(|_| ScanError::Parse {
            channel,
            raw: raw.clone(),
        })?;
        if !value.is_finite() {
            return Err(ScanError::Parse { channel, raw });
        }
        debug!("Counter {channel} read {value}");
        Ok(value)
    }
}

fn mean(samples: &[f64]) -> f64 {
    samples.iter().sum::<f64>() / samples.len() as f64
}

/// Standard deviation with divisor = sample count (population, ddof 0).
fn population_std(samples: &[f64]) -> f64 {
    let m = mean(samples);
    let variance = samples.iter().map(|x| (x - m).powi(2)).sum::<f64>() / samples.len() as f64;
    variance.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::VecDeque;

    /// Fake source replaying a fixed script of raw readings.
    struct ScriptSource {
        script: VecDeque<String>,
        reads: usize,
    }

    impl ScriptSource {
        fn new(script: &[&str]) -> Self {
            Self {
                script: script.iter().map(|s| s.to_string()).collect(),
                reads: 0,
            }
        }
    }

    impl CounterSource for ScriptSource {
        fn read_counter(&mut self, channel: Channel) -> ScanResult<String> {
            self.reads += 1;
            self.script.pop_front().ok_or_else(|| {
                ScanError::SourceUnavailable(format!("script exhausted at channel {channel}"))
            })
        }
    }

    #[test]
    fn test_sample_matches_closed_form_statistics() {
        // Two repetitions: V = [10, 20], H = [4, 4], C = [1, 3].
        let mut source = ScriptSource::new(&["10", "4", "1", "20", "4", "3"]);
        let sampler = MeasurementSampler::new(2, Duration::ZERO);
        let reading = sampler.sample(&mut source).unwrap();

        assert!((reading.v - 15.0).abs() < 1e-12);
        assert!((reading.h - 4.0).abs() < 1e-12);
        assert!((reading.c - 2.0).abs() < 1e-12);
        // Population std: divisor 2, so std([10, 20]) = 5, not ~7.07.
        assert!((reading.ev - 5.0).abs() < 1e-12);
        assert!((reading.eh - 0.0).abs() < 1e-12);
        assert!((reading.ec - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_repetitions_fails_before_any_read() {
        let mut source = ScriptSource::new(&["10"]);
        let sampler = MeasurementSampler::new(0, Duration::ZERO);

        let err = sampler.sample(&mut source).unwrap_err();
        assert!(matches!(err, ScanError::InvalidArgument(_)));
        assert_eq!(source.reads, 0);
    }

    #[test]
    fn test_raw_text_is_cleaned_before_parsing() {
        let mut source = ScriptSource::new(&[" 1,234 ", "10", "5"]);
        let sampler = MeasurementSampler::new(1, Duration::ZERO);
        let reading = sampler.sample(&mut source).unwrap();
        assert!((reading.v - 1234.0).abs() < 1e-12);
    }

    #[test]
    fn test_unparseable_reading_names_channel_and_raw_text() {
        let mut source = ScriptSource::new(&["10", "x42x", "5"]);
        let sampler = MeasurementSampler::new(1, Duration::ZERO);

        match sampler.sample(&mut source).unwrap_err() {
            ScanError::Parse { channel, raw } => {
                assert_eq!(channel, Channel::H);
                assert_eq!(raw, "x42x");
            }
            other => panic!("expected parse error, got {other}"),
        }
    }

    #[test]
    fn test_non_finite_reading_is_rejected() {
        let mut source = ScriptSource::new(&["NaN", "10", "5"]);
        let sampler = MeasurementSampler::new(1, Duration::ZERO);
        assert!(matches!(
            sampler.sample(&mut source).unwrap_err(),
            ScanError::Parse { channel: Channel::V, .. }
        ));
    }

    #[test]
    fn test_source_unavailable_propagates() {
        let mut source = ScriptSource::new(&[]);
        let sampler = MeasurementSampler::new(1, Duration::ZERO);
        assert!(matches!(
            sampler.sample(&mut source).unwrap_err(),
            ScanError::SourceUnavailable(_)
        ));
    }
}
