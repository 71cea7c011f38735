//! KISS command table
//!
//! The low nibble of the type byte selects the command. RETURN (0xFF) is the
//! exception: it occupies the entire type byte with no address nibble.

use super::constants::{
    CMD_DATA, CMD_FULLDUP, CMD_HARDWARE, CMD_PERSIST, CMD_POLL, CMD_RETURN, CMD_SLOTTIME,
    CMD_TXDELAY, CMD_TXTAIL,
};

/// Recognized KISS / XKISS commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Data frame; payload is opaque to the codec
    Data,
    /// TX delay in 10 ms units (1-byte payload)
    TxDelay,
    /// P-persistence parameter (1-byte payload)
    Persistence,
    /// Slot time in 10 ms units (1-byte payload)
    SlotTime,
    /// TX tail in 10 ms units (1-byte payload, deprecated)
    TxTail,
    /// Full duplex on/off (1-byte payload)
    FullDuplex,
    /// Vendor-specific hardware command (opaque payload)
    SetHardware,
    /// XKISS multi-drop poll (empty payload)
    Poll,
    /// Exit KISS mode (empty payload, whole type byte)
    Return,
}

impl Command {
    /// Map a low nibble to a command. `None` for unassigned codes.
    ///
    /// RETURN never reaches this path; it is matched on the full type byte
    /// before nibble splitting.
    pub fn from_nibble(nibble: u8) -> Option<Self> {
        match nibble {
            CMD_DATA => Some(Command::Data),
            CMD_TXDELAY => Some(Command::TxDelay),
            CMD_PERSIST => Some(Command::Persistence),
            CMD_SLOTTIME => Some(Command::SlotTime),
            CMD_TXTAIL => Some(Command::TxTail),
            CMD_FULLDUP => Some(Command::FullDuplex),
            CMD_HARDWARE => Some(Command::SetHardware),
            CMD_POLL => Some(Command::Poll),
            _ => None,
        }
    }

    /// Wire nibble for this command (RETURN reports its full byte).
    pub fn nibble(self) -> u8 {
        match self {
            Command::Data => CMD_DATA,
            Command::TxDelay => CMD_TXDELAY,
            Command::Persistence => CMD_PERSIST,
            Command::SlotTime => CMD_SLOTTIME,
            Command::TxTail => CMD_TXTAIL,
            Command::FullDuplex => CMD_FULLDUP,
            Command::SetHardware => CMD_HARDWARE,
            Command::Poll => CMD_POLL,
            Command::Return => CMD_RETURN,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nibble_round_trip() {
        for cmd in [
            Command::Data,
            Command::TxDelay,
            Command::Persistence,
            Command::SlotTime,
            Command::TxTail,
            Command::FullDuplex,
            Command::SetHardware,
            Command::Poll,
        ] {
            assert_eq!(Command::from_nibble(cmd.nibble()), Some(cmd));
        }
    }

    #[test]
    fn test_unassigned_nibbles() {
        assert_eq!(Command::from_nibble(0x07), None);
        assert_eq!(Command::from_nibble(0x0C), None);
        assert_eq!(Command::from_nibble(0x0F), None);
    }
}
