//! Per-line output records.
//!
//! Each completed temperature line is persisted as one comma-separated
//! `.dat` file named by the rounded set point, e.g. `45.2_hom_line.dat`,
//! with the literal header `V,H,C,eV,eH,eC`, one row per delay index and no
//! comment markers or trailing metadata. Records are write-once: the sweep
//! never revisits a temperature line.

use crate::error::ScanResult;
use crate::line::{LineBuffer, COLUMN_HEADER};
use log::info;
use std::fs;
use std::path::{Path, PathBuf};

/// Persistence sink for completed temperature lines.
pub trait LineSink {
    fn write_line(&mut self, tset_c: f64, line: &LineBuffer) -> ScanResult<()>;
}

/// `LineSink` writing one `.dat` file per line into a fixed directory.
pub struct DatFileSink {
    directory: PathBuf,
    file_suffix: String,
}

impl DatFileSink {
    pub fn new(directory: impl Into<PathBuf>, file_suffix: impl Into<String>) -> Self {
        Self {
            directory: directory.into(),
            file_suffix: file_suffix.into(),
        }
    }

    /// File path for a given set point: `<dir>/<tset rounded to 0.1>_<suffix>.dat`.
    pub fn file_path(&self, tset_c: f64) -> PathBuf {
        self.directory
            .join(format!("{tset_c:.1}_{}.dat", self.file_suffix))
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }
}

impl LineSink for DatFileSink {
    fn write_line(&mut self, tset_c: f64, line: &LineBuffer) -> ScanResult<()> {
        fs::create_dir_all(&self.directory)?;

        let path = self.file_path(tset_c);
        let mut writer = csv::Writer::from_path(&path)?;
        writer.write_record(COLUMN_HEADER)?;
        for row in line.rows() {
            writer.write_record(row.iter().map(|value| value.to_string()))?;
        }
        writer.flush()?;

        info!(
            "Wrote temperature line {:.1} C ({} rows) to {}",
            tset_c,
            line.grid_size(),
            path.display()
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counters::ChannelReading;

    #[test]
    fn test_file_naming_rounds_to_one_decimal() {
        let sink = DatFileSink::new("/tmp/out", "hom_line");
        assert_eq!(
            sink.file_path(45.199_999_9),
            PathBuf::from("/tmp/out/45.2_hom_line.dat")
        );
        assert_eq!(
            sink.file_path(45.0),
            PathBuf::from("/tmp/out/45.0_hom_line.dat")
        );
    }

    #[test]
    fn test_written_file_format() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = DatFileSink::new(dir.path(), "test");

        let mut line = LineBuffer::new(2);
        line.set(
            0,
            &ChannelReading {
                v: 10.0,
                h: 10.0,
                c: 5.0,
                ev: 0.0,
                eh: 0.0,
                ec: 0.0,
            },
        )
        .unwrap();
        line.set(
            1,
            &ChannelReading {
                v: 1.5,
                h: 2.5,
                c: 3.5,
                ev: 0.5,
                eh: 0.25,
                ec: 0.125,
            },
        )
        .unwrap();

        sink.write_line(61.4, &line).unwrap();

        let contents = std::fs::read_to_string(dir.path().join("61.4_test.dat")).unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines[0], "V,H,C,eV,eH,eC");
        assert_eq!(lines[1], "10,10,5,0,0,0");
        assert_eq!(lines[2], "1.5,2.5,3.5,0.5,0.25,0.125");
        assert_eq!(lines.len(), 3);
    }

    #[test]
    fn test_creates_missing_output_directory() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("run7").join("lines");
        let mut sink = DatFileSink::new(&nested, "t");

        sink.write_line(50.0, &LineBuffer::new(1)).unwrap();
        assert!(nested.join("50.0_t.dat").exists());
    }
}
