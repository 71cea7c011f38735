//! User-registered event handlers
//!
//! Handler slots are swappable at any time. Callers snapshot the `Arc` under
//! the handler lock and invoke it after releasing, so a handler may call
//! back into the session (e.g. `send` from `on_frame`) without deadlocking.

use std::sync::Arc;

/// Called for every valid DATA frame: `(address, port, payload)`
pub type FrameHandler = Arc<dyn Fn(u8, u8, &[u8]) + Send + Sync>;

/// Called for every valid POLL frame: `(address)`
pub type PollHandler = Arc<dyn Fn(u8) + Send + Sync>;

/// Called when a full queue dropped its oldest entry:
/// `(address, port, dropped_payload)`
pub type OverflowHandler = Arc<dyn Fn(u8, u8, &[u8]) + Send + Sync>;

/// Called for non-fatal decode/checksum/transport problems
pub type ErrorHandler = Arc<dyn Fn(&ErrorEvent) + Send + Sync>;

#[derive(Default)]
pub struct Handlers {
    pub on_frame: Option<FrameHandler>,
    pub on_poll: Option<PollHandler>,
    pub on_overflow: Option<OverflowHandler>,
    pub on_error: Option<ErrorHandler>,
}

/// Non-fatal problem reported through the error handler
#[derive(Debug, Clone)]
pub struct ErrorEvent {
    pub kind: ErrorKind,
    pub detail: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed escape sequence or truncated frame
    Decode,
    /// XOR checksum mismatch
    Checksum,
    /// SMACK CRC-16 mismatch
    Crc,
    /// Read/write failure (reconnect may have recovered it)
    Transport,
}
