//! Serial transport implementation

use super::Transport;
use crate::error::Result;
use serialport::{DataBits, FlowControl, Parity, SerialPort, StopBits};
use std::io::{Read, Write};
use std::time::Duration;

/// Read timeout. Short enough that the reader thread notices shutdown
/// promptly; a timed-out read is reported as `Ok(0)`.
const READ_TIMEOUT_MS: u64 = 10;

/// Serial transport for UART-attached TNCs
pub struct SerialTransport {
    path: String,
    baud_rate: u32,
    port: Box<dyn SerialPort>,
}

impl SerialTransport {
    /// Open a serial port at 8N1 with no flow control
    ///
    /// # Arguments
    /// * `path` - Serial port path (e.g., "/dev/ttyUSB0")
    /// * `baud_rate` - Baud rate (e.g., 9600)
    pub fn open(path: &str, baud_rate: u32) -> Result<Self> {
        let port = Self::open_port(path, baud_rate)?;
        log::info!("Opened serial port: {} at {} baud", path, baud_rate);
        Ok(SerialTransport {
            path: path.to_string(),
            baud_rate,
            port,
        })
    }

    fn open_port(path: &str, baud_rate: u32) -> Result<Box<dyn SerialPort>> {
        Ok(serialport::new(path, baud_rate)
            .data_bits(DataBits::Eight)
            .parity(Parity::None)
            .stop_bits(StopBits::One)
            .flow_control(FlowControl::None)
            .timeout(Duration::from_millis(READ_TIMEOUT_MS))
            .open()?)
    }
}

impl Transport for SerialTransport {
    fn read(&mut self, buffer: &mut [u8]) -> Result<usize> {
        match self.port.read(buffer) {
            Ok(n) => Ok(n),
            Err(e) if e.kind() == std::io::ErrorKind::TimedOut => Ok(0),
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => Ok(0),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&mut self, data: &[u8]) -> Result<usize> {
        Ok(self.port.write(data)?)
    }

    fn flush(&mut self) -> Result<()> {
        self.port.flush()?;
        Ok(())
    }

    fn reconnect(&mut self) -> Result<()> {
        log::info!("Reopening serial port: {}", self.path);
        self.port = Self::open_port(&self.path, self.baud_rate)?;
        Ok(())
    }
}
