//! Immutable sweep axes.
//!
//! Both grids are computed once at orchestration start and never mutated.
//! Generation follows open-ended `arange` semantics: values run from the
//! start in fixed steps and stop strictly before the exclusive upper bound.

use crate::error::{ScanError, ScanResult};

/// Ordered temperature set points in degrees Celsius (outer sweep axis).
#[derive(Debug, Clone, PartialEq)]
pub struct TemperatureGrid {
    points: Vec<f64>,
}

impl TemperatureGrid {
    /// Generate `start_c, start_c + step_c, ...` strictly below `stop_c`.
    pub fn new(start_c: f64, stop_c: f64, step_c: f64) -> ScanResult<Self> {
        if !step_c.is_finite() || step_c <= 0.0 {
            return Err(ScanError::InvalidArgument(format!(
                "temperature step must be positive, got {step_c}"
            )));
        }
        if stop_c <= start_c {
            return Err(ScanError::InvalidArgument(format!(
                "temperature stop ({stop_c}) must exceed start ({start_c})"
            )));
        }

        let mut points = Vec::new();
        let mut i = 0usize;
        loop {
            // Multiply rather than accumulate so rounding error stays bounded.
            let t = start_c + (i as f64) * step_c;
            if t >= stop_c {
                break;
            }
            points.push(t);
            i += 1;
        }
        Ok(Self { points })
    }

    pub fn points(&self) -> &[f64] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}

/// Ordered absolute actuator positions in device counts (inner sweep axis).
///
/// Positions are signed 32-bit counts because that is the native integer
/// width of the actuator's binary command payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DelayGrid {
    positions: Vec<i32>,
}

impl DelayGrid {
    /// Generate `0, step_counts, 2*step_counts, ...` strictly below
    /// `travel_counts`. The travel may be fractional; the grid size then
    /// matches the reference `round(travel/step) + 1` arithmetic.
    pub fn new(travel_counts: f64, step_counts: u32) -> ScanResult<Self> {
        if !travel_counts.is_finite() || travel_counts <= 0.0 {
            return Err(ScanError::InvalidArgument(format!(
                "delay travel must be positive, got {travel_counts}"
            )));
        }
        if step_counts == 0 {
            return Err(ScanError::InvalidArgument(
                "delay step must be positive".into(),
            ));
        }

        let step = i64::from(step_counts);
        let mut positions = Vec::new();
        let mut pos: i64 = 0;
        while (pos as f64) < travel_counts {
            let counts = i32::try_from(pos).map_err(|_| {
                ScanError::InvalidArgument(format!(
                    "delay position {pos} exceeds the 32-bit count range"
                ))
            })?;
            positions.push(counts);
            pos += step;
        }
        Ok(Self { positions })
    }

    pub fn positions(&self) -> &[i32] {
        &self.positions
    }

    /// Number of grid points; the line buffer is sized to this.
    pub fn grid_size(&self) -> usize {
        self.positions.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_temperature_grid_reference_bounds() {
        let grid = TemperatureGrid::new(45.0, 75.0, 0.2).unwrap();
        let points = grid.points();

        assert_eq!(points.len(), 150);
        assert!((points[0] - 45.0).abs() < 1e-9);
        assert!((points[1] - 45.2).abs() < 1e-9);
        assert!((points[149] - 74.8).abs() < 1e-9);
        // Exclusive stop: 75.0 itself never appears.
        assert!(points.iter().all(|&t| t < 75.0));
        // Strictly ascending, so no duplicates.
        assert!(points.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_temperature_grid_rejects_bad_bounds() {
        assert!(TemperatureGrid::new(45.0, 75.0, 0.0).is_err());
        assert!(TemperatureGrid::new(45.0, 75.0, -0.2).is_err());
        assert!(TemperatureGrid::new(75.0, 45.0, 0.2).is_err());
    }

    #[test]
    fn test_delay_grid_reference_arithmetic() {
        // Reference travel: 25.4 / 0.047625 * 1000 counts, step 10000.
        let travel = 25.4 / 0.047_625 * 1000.0;
        let grid = DelayGrid::new(travel, 10_000).unwrap();

        // round(travel/step) + 1 = round(53.33) + 1 = 54
        let expected = (travel / 10_000.0).round() as usize + 1;
        assert_eq!(grid.grid_size(), expected);
        assert_eq!(grid.positions()[0], 0);
        assert_eq!(grid.positions()[1], 10_000);
        assert_eq!(*grid.positions().last().unwrap(), 530_000);
    }

    #[test]
    fn test_delay_grid_small() {
        let grid = DelayGrid::new(25_000.0, 10_000).unwrap();
        assert_eq!(grid.positions(), &[0, 10_000, 20_000]);
    }

    #[test]
    fn test_delay_grid_rejects_bad_bounds() {
        assert!(DelayGrid::new(0.0, 10_000).is_err());
        assert!(DelayGrid::new(-1.0, 10_000).is_err());
        assert!(DelayGrid::new(25_000.0, 0).is_err());
    }
}
