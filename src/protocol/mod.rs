//! KISS / XKISS / SMACK wire protocol
//!
//! Pure codec layer: no I/O, no session state. The [`FrameDecoder`] splits a
//! byte stream into frames, [`frame::decode`] classifies and checks them,
//! and [`frame::encode`] produces wire bytes.

pub mod address;
pub mod checksum;
pub mod command;
pub mod constants;
pub mod decoder;
pub mod frame;

pub use command::Command;
pub use decoder::FrameDecoder;
pub use frame::Frame;
