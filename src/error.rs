//! Error types for xkiss-io
//!
//! # Error Recovery Strategies
//!
//! Different error types require different recovery approaches:
//!
//! ## Configuration Errors (Fix and Retry)
//!
//! - **`InvalidConfig`**: Rejected synchronously by [`Session::open`] before
//!   any I/O happens. Fix the offending field and reopen.
//! - **`InvalidAddress`**: An address or port outside 0-15 was passed to an
//!   API call. Also raised before any I/O.
//!
//! ## Protocol Errors (Drop and Continue)
//!
//! - **`FrameDecode`**: Malformed escape sequence or truncated frame. The
//!   frame is dropped, a counter incremented, and the receive loop continues.
//! - **`Checksum`** / **`Crc`**: XOR or SMACK CRC-16 mismatch. Mandated
//!   behavior is to drop the frame without transmitting anything back; the
//!   per-session counters record the loss. These variants reach application
//!   code only through the error event handler, never as a returned error.
//!
//! ## Transport Errors (One Reconnect, Then Fatal)
//!
//! - **`Serial`** / **`Io`**: Serial port communication failure. The owning
//!   thread attempts a single reconnect and retries the failed operation.
//! - **`Transport`**: The reconnect also failed. The session moves to a
//!   failed state; subsequent `send` calls return this variant. Deeper retry
//!   policies belong in a supervisor above this crate.
//!
//! ## Lifecycle
//!
//! - **`Closed`**: An operation was invoked on a session after `close()`.
//!
//! [`Session::open`]: crate::Session::open

use thiserror::Error;

/// Errors that can occur in xkiss-io
///
/// See module-level documentation for recovery strategies.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Serial port error: {0}")]
    Serial(#[from] serialport::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Address or port out of range (0-15): {0}")]
    InvalidAddress(u8),

    #[error("Config error: {0}")]
    InvalidConfig(String),

    #[error("Frame decode error: {0}")]
    FrameDecode(String),

    #[error("XOR checksum mismatch: received=0x{received:02X}, computed=0x{computed:02X}")]
    Checksum { received: u8, computed: u8 },

    #[error("SMACK CRC mismatch: received=0x{received:04X}, computed=0x{computed:04X}")]
    Crc { received: u16, computed: u16 },

    #[error("Transport failed: {0}")]
    Transport(String),

    #[error("Session is closed")]
    Closed,
}

pub type Result<T> = std::result::Result<T, Error>;
