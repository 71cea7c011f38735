//! KISS frame encode/decode
//!
//! Wire form: `FEND [type byte] [payload...] [trailer] FEND` with FEND/FESC
//! transparency escaping applied to everything between the delimiters. The
//! trailer is two CRC-16 bytes (LSB first) for SMACK data frames, one XOR
//! byte when the session runs in checksum mode, or absent.
//!
//! Checksums are computed over the unescaped bytes, type byte included. A
//! SMACK data frame carries bit 7 of the type byte set; the bit participates
//! in the CRC and is stripped before address/command classification.

use super::address;
use super::checksum::{append_crc, verify_crc, xor_checksum};
use super::command::Command;
use super::constants::{CMD_RETURN, FEND, FESC, SMACK_FLAG, TFEND, TFESC};
use crate::error::{Error, Result};

/// A decoded KISS frame
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    /// High nibble of the type byte: TNC address in multi-drop, port otherwise
    pub address: u8,
    pub command: Command,
    /// Post-unescaping, post-checksum-stripping payload bytes
    pub payload: Vec<u8>,
    /// A valid SMACK CRC-16 was verified and stripped
    pub had_crc: bool,
    /// A valid XOR checksum was verified and stripped
    pub had_xor: bool,
}

/// Encode a frame to its wire form.
///
/// `smack` requests SMACK CRC protection; it only takes effect on DATA
/// frames (command frames never carry the CRC). `xor` appends the XOR
/// checksum byte when SMACK does not apply. RETURN is encoded as the bare
/// 0xFF type byte with no trailer: the payload and checksum arguments are
/// ignored for it.
pub fn encode(
    address: u8,
    command: Command,
    payload: &[u8],
    smack: bool,
    xor: bool,
) -> Result<Vec<u8>> {
    let mut body = Vec::with_capacity(payload.len() + 4);

    if command == Command::Return {
        body.push(CMD_RETURN);
    } else {
        let smack_applied = smack && command == Command::Data;
        let mut type_byte = address::pack(address, command.nibble())?;
        if smack_applied {
            type_byte |= SMACK_FLAG;
        }
        body.push(type_byte);
        body.extend_from_slice(payload);
        if smack_applied {
            append_crc(&mut body);
        } else if xor {
            let x = xor_checksum(&body);
            body.push(x);
        }
    }

    let mut wire = Vec::with_capacity(body.len() + 2);
    wire.push(FEND);
    for &b in &body {
        match b {
            FEND => wire.extend_from_slice(&[FESC, TFEND]),
            FESC => wire.extend_from_slice(&[FESC, TFESC]),
            _ => wire.push(b),
        }
    }
    wire.push(FEND);
    Ok(wire)
}

/// Remove transparency escaping. Unknown escape sequences and a trailing
/// lone FESC are decode errors.
pub fn unescape(data: &[u8]) -> Result<Vec<u8>> {
    let mut out = Vec::with_capacity(data.len());
    let mut iter = data.iter();
    while let Some(&b) = iter.next() {
        if b == FESC {
            match iter.next() {
                Some(&TFEND) => out.push(FEND),
                Some(&TFESC) => out.push(FESC),
                Some(&other) => {
                    return Err(Error::FrameDecode(format!(
                        "invalid escape sequence FESC 0x{other:02X}"
                    )))
                }
                None => {
                    return Err(Error::FrameDecode("frame ends with dangling FESC".into()))
                }
            }
        } else {
            out.push(b);
        }
    }
    Ok(out)
}

/// Decode the bytes found between two FENDs (still in escaped form).
///
/// `xor_mode` controls whether a trailing XOR checksum byte is expected on
/// frames without the SMACK flag.
pub fn decode(stuffed: &[u8], xor_mode: bool) -> Result<Frame> {
    let raw = unescape(stuffed)?;
    if raw.is_empty() {
        return Err(Error::FrameDecode("empty frame".into()));
    }

    // RETURN occupies the whole type byte; match it before the SMACK bit
    // would be misread as a CRC flag.
    if raw[0] == CMD_RETURN {
        return Ok(Frame {
            address: 0,
            command: Command::Return,
            payload: raw[1..].to_vec(),
            had_crc: false,
            had_xor: false,
        });
    }

    let smack = raw[0] & SMACK_FLAG != 0;
    let (addr, nibble) = address::unpack(raw[0] & !SMACK_FLAG);
    let command = Command::from_nibble(nibble)
        .ok_or_else(|| Error::FrameDecode(format!("unknown command nibble 0x{nibble:02X}")))?;

    if smack {
        match verify_crc(&raw) {
            Ok(()) => Ok(Frame {
                address: addr,
                command,
                payload: raw[1..raw.len() - 2].to_vec(),
                had_crc: true,
                had_xor: false,
            }),
            Err((computed, received)) => Err(Error::Crc { received, computed }),
        }
    } else if xor_mode {
        if raw.len() < 2 {
            return Err(Error::FrameDecode("frame too short for XOR checksum".into()));
        }
        let received = raw[raw.len() - 1];
        let computed = xor_checksum(&raw[..raw.len() - 1]);
        if received != computed {
            return Err(Error::Checksum { received, computed });
        }
        Ok(Frame {
            address: addr,
            command,
            payload: raw[1..raw.len() - 1].to_vec(),
            had_crc: false,
            had_xor: true,
        })
    } else {
        Ok(Frame {
            address: addr,
            command,
            payload: raw[1..].to_vec(),
            had_crc: false,
            had_xor: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strip_fends(wire: &[u8]) -> &[u8] {
        assert_eq!(wire.first(), Some(&FEND));
        assert_eq!(wire.last(), Some(&FEND));
        &wire[1..wire.len() - 1]
    }

    #[test]
    fn test_encode_plain_data() {
        let wire = encode(0, Command::Data, b"Hello", false, false).unwrap();
        assert_eq!(wire, [0xC0, 0x00, 0x48, 0x65, 0x6C, 0x6C, 0x6F, 0xC0]);
    }

    #[test]
    fn test_encode_escapes_special_bytes() {
        let wire = encode(0, Command::Data, &[0xC0, 0xDB], false, false).unwrap();
        assert_eq!(wire, [0xC0, 0x00, 0xDB, 0xDC, 0xDB, 0xDD, 0xC0]);
    }

    #[test]
    fn test_encode_poll_multi_drop() {
        let wire = encode(5, Command::Poll, &[], false, false).unwrap();
        assert_eq!(wire, [0xC0, 0x5E, 0xC0]);
    }

    #[test]
    fn test_encode_smack_data() {
        let wire = encode(2, Command::Data, b"A", true, false).unwrap();
        // Type byte 0xA0 = SMACK flag | addr 2 | DATA, CRC appended LSB first
        assert_eq!(wire, [0xC0, 0xA0, 0x41, 0x8C, 0xC1, 0xC0]);
    }

    #[test]
    fn test_encode_xor_data() {
        let wire = encode(3, Command::Data, &[0x01, 0x02, 0x03], false, true).unwrap();
        assert_eq!(wire, [0xC0, 0x30, 0x01, 0x02, 0x03, 0x30, 0xC0]);
    }

    #[test]
    fn test_encode_return_bare() {
        let wire = encode(0, Command::Return, &[], false, true).unwrap();
        assert_eq!(wire, [0xC0, 0xFF, 0xC0]);
    }

    #[test]
    fn test_smack_never_applies_to_commands() {
        let wire = encode(4, Command::Poll, &[], true, false).unwrap();
        assert_eq!(wire, [0xC0, 0x4E, 0xC0]);
    }

    #[test]
    fn test_exactly_two_fends_regardless_of_payload() {
        let payload: Vec<u8> = (0u16..=255).map(|b| b as u8).collect();
        for (smack, xor) in [(false, false), (false, true), (true, false)] {
            let wire = encode(1, Command::Data, &payload, smack, xor).unwrap();
            let fends = wire.iter().filter(|&&b| b == FEND).count();
            assert_eq!(fends, 2);
            assert_eq!(wire[0], FEND);
            assert_eq!(*wire.last().unwrap(), FEND);
        }
    }

    #[test]
    fn test_round_trip_all_modes() {
        let payloads: [&[u8]; 4] = [b"", b"Hello", &[0xC0, 0xDB, 0xDC, 0xDD], &[0x00; 64]];
        for addr in 0..16 {
            for payload in payloads {
                for (smack, xor) in [(false, false), (false, true), (true, false), (true, true)] {
                    let wire = encode(addr, Command::Data, payload, smack, xor).unwrap();
                    let frame = decode(strip_fends(&wire), xor).unwrap();
                    assert_eq!(frame.address, addr);
                    assert_eq!(frame.command, Command::Data);
                    assert_eq!(frame.payload, payload);
                    assert_eq!(frame.had_crc, smack);
                    assert_eq!(frame.had_xor, xor && !smack);
                }
            }
        }
    }

    #[test]
    fn test_decode_bad_escape() {
        assert!(matches!(
            decode(&[0x00, FESC, 0x41], false),
            Err(Error::FrameDecode(_))
        ));
        assert!(matches!(
            decode(&[0x00, FESC], false),
            Err(Error::FrameDecode(_))
        ));
    }

    #[test]
    fn test_decode_unknown_command() {
        assert!(matches!(
            decode(&[0x0C, 0x01], false),
            Err(Error::FrameDecode(_))
        ));
    }

    #[test]
    fn test_decode_crc_mismatch() {
        let mut wire = encode(2, Command::Data, b"A", true, false).unwrap();
        // Corrupt the payload byte; CRC no longer matches
        wire[2] ^= 0x01;
        assert!(matches!(
            decode(strip_fends(&wire), false),
            Err(Error::Crc { .. })
        ));
    }

    #[test]
    fn test_decode_truncated_smack() {
        // SMACK flag set but only one trailer byte present
        assert!(matches!(decode(&[0xA0, 0x41], false), Err(Error::Crc { .. })));
    }

    #[test]
    fn test_decode_xor_mismatch() {
        assert!(matches!(
            decode(&[0x30, 0x01, 0x02, 0x03, 0x31], true),
            Err(Error::Checksum {
                received: 0x31,
                computed: 0x30
            })
        ));
    }

    #[test]
    fn test_smack_supersedes_xor_on_decode() {
        // XOR mode on, but the SMACK flag wins: trailer is the CRC
        let wire = encode(2, Command::Data, b"A", true, false).unwrap();
        let frame = decode(strip_fends(&wire), true).unwrap();
        assert!(frame.had_crc);
        assert!(!frame.had_xor);
        assert_eq!(frame.payload, b"A");
    }

    #[test]
    fn test_decode_return() {
        let frame = decode(&[0xFF], true).unwrap();
        assert_eq!(frame.command, Command::Return);
        assert!(frame.payload.is_empty());
    }
}
