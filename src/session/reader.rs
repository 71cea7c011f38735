//! Reader thread
//!
//! Continuously reads bytes from the transport, reassembles and decodes
//! frames, and dispatches them: DATA and POLL go to the user handlers, a
//! POLL addressed to us triggers the passive-mode queue drain, malformed
//! frames are counted and dropped. Handlers run on this thread; per-address
//! delivery order equals wire order.

use super::events::ErrorKind;
use super::Shared;
use crate::config::PollingMode;
use crate::error::Error;
use crate::protocol::{frame, Command, FrameDecoder};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use std::thread;
use std::time::Duration;

/// Idle sleep between empty reads, keeps the loop from spinning
const IDLE_SLEEP_MS: u64 = 2;

pub(super) fn reader_loop(shared: Arc<Shared>) {
    let mut decoder = FrameDecoder::new();
    let mut buf = [0u8; 1024];

    while !shared.shutdown.load(Ordering::Relaxed) {
        let read_result = {
            let mut guard = shared.port.lock();
            let Some(port) = guard.as_mut() else {
                break;
            };
            port.read(&mut buf)
        };

        match read_result {
            Ok(0) => thread::sleep(Duration::from_millis(IDLE_SLEEP_MS)),
            Ok(n) => {
                for raw in decoder.push_bytes(&buf[..n]) {
                    handle_raw_frame(&shared, &raw);
                }
            }
            Err(e) => {
                log::error!("Serial read failed: {}", e);
                if !reconnect_after_read_failure(&shared) {
                    shared.mark_failed("read failed and reconnect did not recover");
                    break;
                }
            }
        }
    }

    log::info!("Reader thread exiting");
}

/// Single reconnect attempt; the read that failed is simply retried by the
/// next loop iteration.
fn reconnect_after_read_failure(shared: &Shared) -> bool {
    let mut guard = shared.port.lock();
    let Some(port) = guard.as_mut() else {
        return false;
    };
    match port.reconnect() {
        Ok(()) => {
            shared.stats.inc_reconnects();
            log::info!("Transport reconnected after read failure");
            true
        }
        Err(e) => {
            log::error!("Reconnect failed: {}", e);
            false
        }
    }
}

fn handle_raw_frame(shared: &Shared, stuffed: &[u8]) {
    let frame = match frame::decode(stuffed, shared.config.checksum_mode) {
        Ok(frame) => frame,
        Err(e) => {
            record_decode_error(shared, e);
            return;
        }
    };
    shared.stats.inc_rx();

    // A verified SMACK CRC from a peer latches CRC mode for everything we
    // send back to it. One-way for the session lifetime.
    if frame.had_crc {
        let newly = { shared.state.lock().enable_smack(frame.address) };
        if newly {
            log::info!(
                "SMACK negotiated with address {}: CRC mode latched for transmit",
                frame.address
            );
        }
    }

    let (address, port) = if shared.config.multi_drop {
        (frame.address, 0)
    } else {
        (0, frame.address)
    };

    match frame.command {
        Command::Data => {
            log::debug!(
                "RX DATA addr={} port={} len={}",
                address,
                port,
                frame.payload.len()
            );
            let handler = shared.handlers.lock().on_frame.clone();
            if let Some(handler) = handler {
                handler(address, port, &frame.payload);
            }
        }
        Command::Poll => {
            log::debug!("RX POLL addr={}", address);
            let handler = shared.handlers.lock().on_poll.clone();
            if let Some(handler) = handler {
                handler(address);
            }
            if shared.config.polling_mode == PollingMode::Passive
                && address == shared.config.own_address
            {
                if let Err(e) = shared.flush_queue(port) {
                    log::error!("Poll-triggered drain failed: {}", e);
                }
            }
        }
        other => {
            // Config commands and RETURN are host-to-TNC; nothing to do on
            // the host side beyond noting them.
            log::debug!("Ignoring inbound {:?} frame from address {}", other, address);
        }
    }
}

fn record_decode_error(shared: &Shared, err: Error) {
    match err {
        Error::Crc { .. } => {
            shared.stats.inc_crc_errors();
            log::debug!("Dropped frame: {}", err);
            shared.emit_error(ErrorKind::Crc, err.to_string());
        }
        Error::Checksum { .. } => {
            shared.stats.inc_xor_errors();
            log::debug!("Dropped frame: {}", err);
            shared.emit_error(ErrorKind::Checksum, err.to_string());
        }
        _ => {
            shared.stats.inc_decode_errors();
            log::warn!("Dropped malformed frame: {}", err);
            shared.emit_error(ErrorKind::Decode, err.to_string());
        }
    }
}
