//! Streaming frame extraction
//!
//! Serial reads deliver arbitrary byte chunks; this accumulator reassembles
//! the FEND-delimited frames across read boundaries. Back-to-back FENDs
//! (empty frames, commonly used as interframe idle fill) are ignored.

use super::constants::FEND;

/// Upper bound on the in-flight frame size. A line with no FENDs at all
/// (wrong baud rate, unframed garbage) would otherwise grow the buffer
/// without limit.
const MAX_FRAME_SIZE: usize = 8192;

/// Accumulates raw bytes and yields the escaped contents of each complete
/// frame (the bytes between two FENDs, transparency escaping still applied).
#[derive(Default)]
pub struct FrameDecoder {
    buffer: Vec<u8>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self {
            buffer: Vec::with_capacity(512),
        }
    }

    /// Feed a chunk of bytes; returns the completed frames in arrival order.
    pub fn push_bytes(&mut self, data: &[u8]) -> Vec<Vec<u8>> {
        let mut frames = Vec::new();
        for &byte in data {
            if byte == FEND {
                if !self.buffer.is_empty() {
                    frames.push(std::mem::take(&mut self.buffer));
                }
            } else {
                if self.buffer.len() >= MAX_FRAME_SIZE {
                    log::warn!(
                        "Dropping oversized frame fragment ({} bytes without FEND)",
                        self.buffer.len()
                    );
                    self.buffer.clear();
                }
                self.buffer.push(byte);
            }
        }
        frames
    }

    /// Bytes buffered for an incomplete frame
    pub fn pending(&self) -> usize {
        self.buffer.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_frame() {
        let mut dec = FrameDecoder::new();
        let frames = dec.push_bytes(&[0xC0, 0x00, 0x41, 0x42, 0xC0]);
        assert_eq!(frames, vec![vec![0x00, 0x41, 0x42]]);
        assert_eq!(dec.pending(), 0);
    }

    #[test]
    fn test_frame_split_across_reads() {
        let mut dec = FrameDecoder::new();
        assert!(dec.push_bytes(&[0xC0, 0x00, 0x41]).is_empty());
        assert_eq!(dec.pending(), 2);
        let frames = dec.push_bytes(&[0x42, 0xC0]);
        assert_eq!(frames, vec![vec![0x00, 0x41, 0x42]]);
    }

    #[test]
    fn test_back_to_back_fends_ignored() {
        let mut dec = FrameDecoder::new();
        let frames = dec.push_bytes(&[0xC0, 0xC0, 0xC0, 0x00, 0x41, 0xC0, 0xC0]);
        assert_eq!(frames, vec![vec![0x00, 0x41]]);
    }

    #[test]
    fn test_multiple_frames_one_read() {
        let mut dec = FrameDecoder::new();
        let frames = dec.push_bytes(&[0xC0, 0x5E, 0xC0, 0x00, 0x41, 0xC0]);
        assert_eq!(frames, vec![vec![0x5E], vec![0x00, 0x41]]);
    }

    #[test]
    fn test_shared_fend_between_frames() {
        // A single FEND both ends one frame and starts the next
        let mut dec = FrameDecoder::new();
        let frames = dec.push_bytes(&[0xC0, 0x5E, 0xC0, 0x6E, 0xC0]);
        assert_eq!(frames, vec![vec![0x5E], vec![0x6E]]);
    }

    #[test]
    fn test_oversize_fragment_dropped() {
        let mut dec = FrameDecoder::new();
        let garbage = vec![0x55u8; MAX_FRAME_SIZE + 10];
        assert!(dec.push_bytes(&garbage).is_empty());
        assert!(dec.pending() <= MAX_FRAME_SIZE);
        // Framing recovers once delimiters reappear
        let frames = dec.push_bytes(&[0xC0, 0xC0, 0x5E, 0xC0]);
        assert_eq!(frames.last().unwrap(), &vec![0x5E]);
    }
}
