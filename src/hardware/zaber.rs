//! Serial transport for the delay stage's binary command protocol.

use crate::error::{ScanError, ScanResult};
use crate::hardware::ActuatorPort;
use crate::protocol::CommandFrame;
use log::{debug, info};
use std::io::Write;
use std::time::Duration;

/// Read timeout applied when the port is opened; the sweep itself never
/// reads, so this only bounds the open call and any future drains.
const READ_TIMEOUT: Duration = Duration::from_secs(10);

/// Blocking serial port speaking the 6-byte binary command frames.
pub struct ZaberBinaryPort {
    port: Option<Box<dyn serialport::SerialPort>>,
    port_name: String,
}

impl ZaberBinaryPort {
    /// Open the stage port. 8N1, no flow control, per the Binary protocol.
    pub fn open(path: &str, baud: u32) -> ScanResult<Self> {
        let port = serialport::new(path, baud)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .flow_control(serialport::FlowControl::None)
            .timeout(READ_TIMEOUT)
            .open()
            .map_err(|e| ScanError::transport(path, e))?;

        info!("Actuator port '{path}' opened at {baud} baud");
        Ok(Self {
            port: Some(port),
            port_name: path.to_string(),
        })
    }
}

impl ActuatorPort for ZaberBinaryPort {
    fn send(&mut self, frame: &CommandFrame) -> ScanResult<()> {
        let port = self
            .port
            .as_mut()
            .ok_or_else(|| ScanError::transport(&self.port_name, "port not open"))?;

        port.write_all(frame)
            .and_then(|_| port.flush())
            .map_err(|e| ScanError::transport(&self.port_name, e))?;

        debug!(
            "Sent frame to device {} (command {})",
            frame[0], frame[1]
        );
        Ok(())
    }

    fn release(&mut self) -> ScanResult<()> {
        if let Some(mut port) = self.port.take() {
            port.flush().map_err(|e| ScanError::ResourceRelease {
                resource: "actuator port",
                message: e.to_string(),
            })?;
            debug!("Actuator port '{}' closed", self.port_name);
        }
        Ok(())
    }
}
