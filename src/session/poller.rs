//! Active polling thread
//!
//! In active mode the host is the bus master: this loop transmits a POLL
//! frame to every configured target address each interval, prompting slave
//! TNCs to flush their queued data. POLL frames are constant for the life
//! of the session, so they are encoded once up front and the buffers reused
//! every cycle.

use super::Shared;
use crate::protocol::{frame, Command};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;

pub(super) fn poller_loop(shared: Arc<Shared>) {
    let mut polls = Vec::with_capacity(shared.config.poll_targets.len());
    for &addr in &shared.config.poll_targets {
        match frame::encode(addr, Command::Poll, &[], false, shared.config.checksum_mode) {
            Ok(bytes) => polls.push((addr, bytes)),
            Err(e) => log::error!("Cannot encode poll frame for address {}: {}", addr, e),
        }
    }

    let interval = shared.config.poll_interval();
    log::info!(
        "Active poller started: {} targets every {:?}",
        polls.len(),
        interval
    );

    while !shared.shutdown.load(Ordering::Relaxed) {
        for (addr, bytes) in &polls {
            if shared.shutdown.load(Ordering::Relaxed) {
                break;
            }
            match shared.write_frame(bytes) {
                Ok(()) => log::trace!("Polled address {}", addr),
                Err(e) => {
                    log::error!("Poll transmit to address {} failed: {}", addr, e);
                    if shared.failed.load(Ordering::Relaxed) {
                        log::error!("Transport failed, poller terminating");
                        return;
                    }
                }
            }
        }
        thread::sleep(interval);
    }

    log::info!("Poller thread exiting");
}
