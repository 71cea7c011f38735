//! Wire-level constants shared by all KISS variants
//!
//! References:
//! - Standard KISS: TAPR specification
//! - XKISS / Multi-Drop: G8BPQ / WK5M documentation
//! - SMACK: Stuttgart Modified Amateur radio CRC-KISS (SYMEK)

// Frame delimiters (shared across all modes)
pub const FEND: u8 = 0xC0;
pub const FESC: u8 = 0xDB;
pub const TFEND: u8 = 0xDC;
pub const TFESC: u8 = 0xDD;

// Standard KISS command nibbles
pub const CMD_DATA: u8 = 0x00;
pub const CMD_TXDELAY: u8 = 0x01;
pub const CMD_PERSIST: u8 = 0x02;
pub const CMD_SLOTTIME: u8 = 0x03;
pub const CMD_TXTAIL: u8 = 0x04;
pub const CMD_FULLDUP: u8 = 0x05;
pub const CMD_HARDWARE: u8 = 0x06;

/// XKISS multi-drop poll command
pub const CMD_POLL: u8 = 0x0E;

/// Exit KISS mode. Occupies the whole type byte, not just the low nibble.
pub const CMD_RETURN: u8 = 0xFF;

/// Bit 7 of the type byte marks a SMACK CRC-protected data frame
pub const SMACK_FLAG: u8 = 0x80;

/// SMACK CRC-16 polynomial (normal / non-reflected form)
pub const SMACK_POLY: u16 = 0x8005;

/// SMACK CRC-16 initial value
pub const SMACK_INIT: u16 = 0x0000;

// Type byte masks
pub const ADDR_MASK: u8 = 0xF0;
pub const CMD_MASK: u8 = 0x0F;

// Session defaults
pub const DEFAULT_BAUD_RATE: u32 = 9600;
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 100;
pub const DEFAULT_MAX_QUEUE_SIZE: usize = 100;
