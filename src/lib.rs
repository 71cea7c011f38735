//! xkiss-io - KISS / XKISS / SMACK protocol library for serial TNCs
//!
//! This library speaks the KISS family of host-to-TNC framing protocols
//! over a byte-oriented serial link:
//!
//! - Standard KISS framing (TAPR) with the classic command set
//! - Extended KISS (XKISS/BPQ multi-drop): high-nibble TNC addressing and
//!   the 0x0E POLL command, with active and passive polling engines
//! - SMACK CRC-16 data-frame protection with automatic one-way
//!   per-peer negotiation
//! - Optional 1-byte XOR checksum (Kantronics/BPQ style)
//!
//! # Example
//!
//! ```no_run
//! use xkiss_io::{Session, SessionConfig};
//!
//! # fn main() -> xkiss_io::Result<()> {
//! let config = SessionConfig::new("/dev/ttyUSB0");
//! let mut session = Session::open(config)?;
//!
//! session.set_on_frame(|addr, port, payload| {
//!     println!("RX addr={} port={} len={}", addr, port, payload.len());
//! });
//!
//! session.send(b"Hello", 0)?;
//! session.close()?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod protocol;
pub mod session;
pub mod transport;

// Re-export commonly used types
pub use config::{PollingMode, SessionConfig};
pub use error::{Error, Result};
pub use protocol::{Command, Frame};
pub use session::{ErrorEvent, ErrorKind, Session, StatsSnapshot};
pub use transport::{MockTransport, SerialTransport, Transport};
