//! Per-temperature-line result accumulation.

use crate::counters::ChannelReading;
use crate::error::{ScanError, ScanResult};

/// Column header shared by the buffer and the persisted files.
pub const COLUMN_HEADER: [&str; 6] = ["V", "H", "C", "eV", "eH", "eC"];

/// Six parallel columns holding one temperature line's averaged readings,
/// indexed by delay-grid position.
///
/// The buffer is allocated once per run and cleared in place between lines;
/// `reset` never resizes, so stale values from a previous line cannot leak
/// into a new line's output.
#[derive(Debug, Clone)]
pub struct LineBuffer {
    v: Vec<f64>,
    h: Vec<f64>,
    c: Vec<f64>,
    ev: Vec<f64>,
    eh: Vec<f64>,
    ec: Vec<f64>,
}

impl LineBuffer {
    pub fn new(grid_size: usize) -> Self {
        Self {
            v: vec![0.0; grid_size],
            h: vec![0.0; grid_size],
            c: vec![0.0; grid_size],
            ev: vec![0.0; grid_size],
            eh: vec![0.0; grid_size],
            ec: vec![0.0; grid_size],
        }
    }

    pub fn grid_size(&self) -> usize {
        self.v.len()
    }

    /// Zero all six columns in place, keeping the allocation.
    pub fn reset(&mut self) {
        self.v.fill(0.0);
        self.h.fill(0.0);
        self.c.fill(0.0);
        self.ev.fill(0.0);
        self.eh.fill(0.0);
        self.ec.fill(0.0);
    }

    /// Write all six fields of `reading` at `index`.
    ///
    /// The index check is defensive: the orchestrator only ever supplies
    /// indices from the fixed delay grid this buffer was sized to.
    pub fn set(&mut self, index: usize, reading: &ChannelReading) -> ScanResult<()> {
        if index >= self.grid_size() {
            return Err(ScanError::InvalidArgument(format!(
                "line index {index} out of range for grid size {}",
                self.grid_size()
            )));
        }
        self.v[index] = reading.v;
        self.h[index] = reading.h;
        self.c[index] = reading.c;
        self.ev[index] = reading.ev;
        self.eh[index] = reading.eh;
        self.ec[index] = reading.ec;
        Ok(())
    }

    /// The six columns in the fixed persistence order V, H, C, eV, eH, eC.
    pub fn columns(&self) -> [&[f64]; 6] {
        [&self.v, &self.h, &self.c, &self.ev, &self.eh, &self.ec]
    }

    /// Row view of the buffer, one row per delay index in index order.
    pub fn rows(&self) -> impl Iterator<Item = [f64; 6]> + '_ {
        (0..self.grid_size()).map(|i| {
            [
                self.v[i], self.h[i], self.c[i], self.ev[i], self.eh[i], self.ec[i],
            ]
        })
    }
}
