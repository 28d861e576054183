//! Thorlabs TC200 temperature-controller session.
//!
//! ASCII command set over RS-232, CR-terminated, fire-and-forget: the sweep
//! sets PID gains once at open, enables the output stage, and afterwards
//! only writes set points. No readback is consumed; stabilization is a fixed
//! dwell owned by the orchestrator's stabilization policy.

use crate::config::PidConfig;
use crate::error::{ScanError, ScanResult};
use crate::hardware::TemperatureController;
use log::{debug, info};
use std::io::Write;
use std::time::Duration;

const READ_TIMEOUT: Duration = Duration::from_secs(2);

/// Blocking serial session to the TC200.
pub struct Tc200Session {
    port: Option<Box<dyn serialport::SerialPort>>,
    port_name: String,
}

impl Tc200Session {
    /// Open the controller port, apply the PID gains and enable the output.
    pub fn open(path: &str, baud: u32, pid: &PidConfig) -> ScanResult<Self> {
        let port = serialport::new(path, baud)
            .data_bits(serialport::DataBits::Eight)
            .parity(serialport::Parity::None)
            .stop_bits(serialport::StopBits::One)
            .timeout(READ_TIMEOUT)
            .open()
            .map_err(|e| ScanError::transport(path, e))?;

        let mut session = Self {
            port: Some(port),
            port_name: path.to_string(),
        };

        session.write_command(&format!("pgain={}", pid.proportional))?;
        session.write_command(&format!("igain={}", pid.integral))?;
        session.write_command(&format!("dgain={}", pid.derivative))?;
        session.write_command("ens")?;

        info!(
            "Temperature controller '{path}' configured (PID {}/{}/{}) and enabled",
            pid.proportional, pid.integral, pid.derivative
        );
        Ok(session)
    }

    fn write_command(&mut self, command: &str) -> ScanResult<()> {
        let port = self
            .port
            .as_mut()
            .ok_or_else(|| ScanError::transport(&self.port_name, "session not open"))?;

        port.write_all(command.as_bytes())
            .and_then(|_| port.write_all(b"\r"))
            .and_then(|_| port.flush())
            .map_err(|e| ScanError::transport(&self.port_name, e))?;

        debug!("TC200 command: {command}");
        Ok(())
    }
}

impl TemperatureController for Tc200Session {
    fn set_point(&mut self, celsius: f64) -> ScanResult<()> {
        self.write_command(&format!("tset={celsius:.2}"))?;
        info!("Temperature set point {celsius:.2} C");
        Ok(())
    }

    fn release(&mut self) -> ScanResult<()> {
        if let Some(mut port) = self.port.take() {
            port.flush().map_err(|e| ScanError::ResourceRelease {
                resource: "temperature controller",
                message: e.to_string(),
            })?;
            debug!("Temperature controller '{}' closed", self.port_name);
        }
        Ok(())
    }
}
