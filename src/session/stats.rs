//! Session statistics counters
//!
//! Atomics so the reader and poller threads can count without touching the
//! session state lock.

use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Default)]
pub struct Stats {
    tx_frames: AtomicU64,
    rx_frames: AtomicU64,
    decode_errors: AtomicU64,
    crc_errors: AtomicU64,
    xor_errors: AtomicU64,
    overflows: AtomicU64,
    reconnects: AtomicU64,
}

impl Stats {
    pub fn inc_tx(&self) {
        self.tx_frames.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_rx(&self) {
        self.rx_frames.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_decode_errors(&self) {
        self.decode_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_crc_errors(&self) {
        self.crc_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_xor_errors(&self) {
        self.xor_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_overflows(&self) {
        self.overflows.fetch_add(1, Ordering::Relaxed);
    }

    pub fn inc_reconnects(&self) {
        self.reconnects.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            tx_frames: self.tx_frames.load(Ordering::Relaxed),
            rx_frames: self.rx_frames.load(Ordering::Relaxed),
            decode_errors: self.decode_errors.load(Ordering::Relaxed),
            crc_errors: self.crc_errors.load(Ordering::Relaxed),
            xor_errors: self.xor_errors.load(Ordering::Relaxed),
            overflows: self.overflows.load(Ordering::Relaxed),
            reconnects: self.reconnects.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of the session counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StatsSnapshot {
    pub tx_frames: u64,
    pub rx_frames: u64,
    pub decode_errors: u64,
    pub crc_errors: u64,
    pub xor_errors: u64,
    pub overflows: u64,
    pub reconnects: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let stats = Stats::default();
        stats.inc_tx();
        stats.inc_tx();
        stats.inc_rx();
        stats.inc_crc_errors();

        let snap = stats.snapshot();
        assert_eq!(snap.tx_frames, 2);
        assert_eq!(snap.rx_frames, 1);
        assert_eq!(snap.crc_errors, 1);
        assert_eq!(snap.xor_errors, 0);
    }
}
