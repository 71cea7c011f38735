//! Mock transport for testing

use super::Transport;
use crate::error::{Error, Result};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Mock transport for unit testing
///
/// Clones share the same buffers, so a test can keep a handle while the
/// session owns the transport. Write and reconnect failures can be injected
/// to exercise the reconnect path.
#[derive(Clone, Default)]
pub struct MockTransport {
    inner: Arc<Mutex<MockTransportInner>>,
}

#[derive(Default)]
struct MockTransportInner {
    read_buffer: VecDeque<u8>,
    write_buffer: Vec<u8>,
    fail_next_writes: u32,
    fail_reconnect: bool,
    reconnects: u32,
}

impl MockTransport {
    /// Create a new mock transport
    pub fn new() -> Self {
        Self::default()
    }

    /// Inject data to be read
    pub fn inject_read(&self, data: &[u8]) {
        let mut inner = self.inner.lock().unwrap();
        inner.read_buffer.extend(data);
    }

    /// Get all written data
    pub fn get_written(&self) -> Vec<u8> {
        let inner = self.inner.lock().unwrap();
        inner.write_buffer.clone()
    }

    /// Clear written data
    pub fn clear_written(&self) {
        let mut inner = self.inner.lock().unwrap();
        inner.write_buffer.clear();
    }

    /// Make the next `n` writes fail with a broken-pipe error
    pub fn fail_next_writes(&self, n: u32) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_next_writes = n;
    }

    /// Make reconnect attempts fail
    pub fn fail_reconnect(&self, fail: bool) {
        let mut inner = self.inner.lock().unwrap();
        inner.fail_reconnect = fail;
    }

    /// Number of reconnects performed
    pub fn reconnect_count(&self) -> u32 {
        let inner = self.inner.lock().unwrap();
        inner.reconnects
    }
}

impl Transport for MockTransport {
    fn read(&mut self, buffer: &mut [u8]) -> Result<usize> {
        let mut inner = self.inner.lock().unwrap();
        let available = inner.read_buffer.len().min(buffer.len());

        for item in buffer.iter_mut().take(available) {
            *item = inner.read_buffer.pop_front().unwrap();
        }

        Ok(available)
    }

    fn write(&mut self, data: &[u8]) -> Result<usize> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_next_writes > 0 {
            inner.fail_next_writes -= 1;
            return Err(Error::Io(std::io::ErrorKind::BrokenPipe.into()));
        }
        inner.write_buffer.extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    fn reconnect(&mut self) -> Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_reconnect {
            return Err(Error::Io(std::io::ErrorKind::NotFound.into()));
        }
        inner.reconnects += 1;
        Ok(())
    }
}
