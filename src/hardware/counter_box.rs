//! Serial readout of the coincidence-counter channels.
//!
//! Query-response over a blocking serial line: `V?`, `H?` or `C?` followed
//! by one CR/LF-terminated decimal reply. A read timeout or empty reply is
//! reported as `SourceUnavailable` - it means the counter unit is not
//! correctly connected, which is fatal for the run.

use crate::counters::{Channel, CounterSource};
use crate::error::{ScanError, ScanResult};
use log::info;
use std::io::{BufRead, BufReader, Write};
use std::time::Duration;

const READ_TIMEOUT: Duration = Duration::from_secs(2);

/// `CounterSource` backed by a serial counter unit.
pub struct SerialCounterBox {
    port: Box<dyn serialport::SerialPort>,
    port_name: String,
}

impl SerialCounterBox {
    pub fn open(path: &str, baud: u32) -> ScanResult<Self> {
        let port = serialport::new(path, baud)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .timeout(READ_TIMEOUT)
            .open()
            .map_err(|e| ScanError::transport(path, e))?;

        info!("Counter readout '{path}' opened at {baud} baud");
        Ok(Self {
            port,
            port_name: path.to_string(),
        })
    }
}

impl CounterSource for SerialCounterBox {
    fn read_counter(&mut self, channel: Channel) -> ScanResult<String> {
        self.port
            .write_all(channel.label().as_bytes())
            .and_then(|_| self.port.write_all(b"?\r"))
            .and_then(|_| self.port.flush())
            .map_err(|e| ScanError::transport(&self.port_name, e))?;

        let mut response = String::new();
        let mut reader = BufReader::new(&mut self.port);
        match reader.read_line(&mut response) {
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => {
                return Err(ScanError::SourceUnavailable(format!(
                    "no response for channel {channel} on '{}'",
                    self.port_name
                )));
            }
            Err(e) => return Err(ScanError::transport(&self.port_name, e)),
        }

        if response.trim().is_empty() {
            return Err(ScanError::SourceUnavailable(format!(
                "empty reply for channel {channel} on '{}'",
                self.port_name
            )));
        }
        Ok(response)
    }
}
