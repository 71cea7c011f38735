//! Transport layer for I/O abstraction

use crate::error::{Error, Result};

mod serial;
pub use serial::SerialTransport;

mod mock;
pub use mock::MockTransport;

/// Byte-stream endpoint a session speaks KISS over
pub trait Transport: Send {
    /// Read available bytes into the buffer; `Ok(0)` when nothing arrived
    /// within the transport's read timeout.
    fn read(&mut self, buffer: &mut [u8]) -> Result<usize>;

    /// Write bytes, returning how many were accepted
    fn write(&mut self, data: &[u8]) -> Result<usize>;

    /// Flush any pending writes
    fn flush(&mut self) -> Result<()>;

    /// Tear down and re-establish the endpoint after an I/O failure
    fn reconnect(&mut self) -> Result<()>;

    /// Write the whole buffer, looping over short writes
    fn write_all(&mut self, mut data: &[u8]) -> Result<()> {
        while !data.is_empty() {
            let n = self.write(data)?;
            if n == 0 {
                return Err(Error::Io(std::io::ErrorKind::WriteZero.into()));
            }
            data = &data[n..];
        }
        Ok(())
    }
}
