//! Session lifecycle and public API
//!
//! A session owns the transport and up to two background threads:
//!
//! 1. **Reader** (always): reads bytes, decodes frames, dispatches events,
//!    performs passive-mode drains. User handlers run on this thread.
//! 2. **Poller** (active mode only): transmits POLL frames to the configured
//!    target addresses every poll interval.
//!
//! The user context calls `send`, `poll`, `close` and swaps handlers.
//!
//! # Locking
//!
//! Three independent locks, never held across a user callback:
//!
//! - the **transport lock** serializes all reads and writes, which is what
//!   guarantees per-address transmit order;
//! - the **state lock** guards peer state (SMACK latches, port queues);
//! - the **handler lock** guards the callback slots; callers clone the
//!   handler `Arc` under it and invoke after release, so a handler may call
//!   `send` without deadlocking.
//!
//! # Failure model
//!
//! Any read or write failure triggers exactly one reconnect attempt. If
//! that also fails, the session enters a failed state: background threads
//! stop and `send` returns a transport error. Deeper retry policy belongs
//! to the caller.

mod events;
mod peer;
mod poller;
mod queue;
mod reader;
mod stats;

pub use events::{ErrorEvent, ErrorKind};
pub use stats::StatsSnapshot;

use crate::config::{PollingMode, SessionConfig};
use crate::error::{Error, Result};
use crate::protocol::{frame, Command};
use crate::transport::{SerialTransport, Transport};
use events::{ErrorKind as Kind, Handlers};
use parking_lot::Mutex;
use peer::PeerTable;
use queue::QueueEntry;
use stats::Stats;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// State shared between the user context and the background threads
pub(crate) struct Shared {
    config: SessionConfig,
    /// Transport lock; `None` once the session is closed
    port: Mutex<Option<Box<dyn Transport>>>,
    /// Peer state: SMACK latches and port queues
    state: Mutex<PeerTable>,
    handlers: Mutex<Handlers>,
    stats: Stats,
    shutdown: AtomicBool,
    failed: AtomicBool,
}

impl Shared {
    /// High nibble for a DATA frame: TNC address in multi-drop, port in
    /// plain KISS. The SMACK latch table is keyed by the same nibble.
    fn data_nibble(&self, address: u8, port: u8) -> u8 {
        if self.config.multi_drop {
            address
        } else {
            port
        }
    }

    fn emit_error(&self, kind: Kind, detail: String) {
        let handler = self.handlers.lock().on_error.clone();
        if let Some(handler) = handler {
            handler(&ErrorEvent { kind, detail });
        }
    }

    fn mark_failed(&self, detail: &str) {
        self.failed.store(true, Ordering::Relaxed);
        log::error!("Session entering failed state: {}", detail);
        self.emit_error(Kind::Transport, detail.to_string());
    }

    /// Write one encoded frame, with the single reconnect-and-retry the
    /// failure model allows. Never invokes handlers while holding the
    /// transport lock.
    fn write_frame(&self, bytes: &[u8]) -> Result<()> {
        if self.failed.load(Ordering::Relaxed) {
            return Err(Error::Transport("session is in failed state".into()));
        }

        let mut guard = self.port.lock();
        let port = match guard.as_mut() {
            Some(port) => port,
            None => return Err(Error::Closed),
        };

        let first_error = match write_and_flush(port.as_mut(), bytes) {
            Ok(()) => {
                self.stats.inc_tx();
                return Ok(());
            }
            Err(e) => e,
        };
        log::error!("Serial write failed: {}", first_error);

        if let Err(e) = port.reconnect() {
            let detail = format!("reconnect failed: {}", e);
            drop(guard);
            self.mark_failed(&detail);
            return Err(Error::Transport(detail));
        }
        self.stats.inc_reconnects();
        log::info!("Transport reconnected, retrying write");

        match write_and_flush(port.as_mut(), bytes) {
            Ok(()) => {
                self.stats.inc_tx();
                Ok(())
            }
            Err(e) => {
                let detail = format!("write failed after reconnect: {}", e);
                drop(guard);
                self.mark_failed(&detail);
                Err(Error::Transport(detail))
            }
        }
    }

    /// Drain one of our port queues onto the wire in FIFO order. A transmit
    /// failure aborts the drain and requeues the undelivered tail at the
    /// head, preserving order.
    fn flush_queue(&self, port: u8) -> Result<usize> {
        let own = self.config.own_address;
        let entries = { self.state.lock().drain(own, port) };
        if entries.is_empty() {
            return Ok(0);
        }

        let nibble = self.data_nibble(own, port);
        let smack = { self.state.lock().smack_enabled(nibble) };
        let oldest_wait = entries[0].enqueued_at.elapsed();
        let mut sent = 0;
        let mut iter = entries.into_iter();

        while let Some(entry) = iter.next() {
            let result = frame::encode(
                nibble,
                Command::Data,
                &entry.payload,
                smack,
                self.config.checksum_mode,
            )
            .and_then(|bytes| self.write_frame(&bytes));

            if let Err(e) = result {
                let mut tail = vec![entry];
                tail.extend(iter);
                let requeued = tail.len();
                self.state.lock().requeue_front(own, port, tail);
                log::warn!(
                    "Drain aborted for port {}: {} sent, {} requeued ({})",
                    port,
                    sent,
                    requeued,
                    e
                );
                return Err(e);
            }
            sent += 1;
        }

        log::info!(
            "Flushed {} queued frames for port {} (oldest waited {:?})",
            sent,
            port,
            oldest_wait
        );
        Ok(sent)
    }
}

fn write_and_flush(port: &mut dyn Transport, bytes: &[u8]) -> Result<()> {
    port.write_all(bytes)?;
    port.flush()
}

/// A KISS/XKISS/SMACK session over one serial link
///
/// Created by [`Session::open`]; closed explicitly with [`Session::close`]
/// or implicitly on drop. Statistics remain observable after close.
pub struct Session {
    shared: Arc<Shared>,
    reader_handle: Option<JoinHandle<()>>,
    poller_handle: Option<JoinHandle<()>>,
    closed: bool,
}

impl Session {
    /// Validate the configuration, open the serial port and start the
    /// background threads.
    pub fn open(config: SessionConfig) -> Result<Self> {
        config.validate()?;
        let transport = SerialTransport::open(&config.device, config.baud_rate)?;
        Self::open_with_transport(config, Box::new(transport))
    }

    /// Like [`Session::open`] but over a caller-supplied transport. Used
    /// with [`MockTransport`](crate::transport::MockTransport) in tests and
    /// available for custom byte-stream endpoints.
    pub fn open_with_transport(
        mut config: SessionConfig,
        transport: Box<dyn Transport>,
    ) -> Result<Self> {
        config.validate()?;

        if config.polling_mode != PollingMode::Off && !config.multi_drop {
            log::debug!("Polling mode implies multi-drop addressing, enabling it");
            config.multi_drop = true;
        }

        log::info!(
            "Session opening: device={}, polling={:?}, multi_drop={}, checksum={}, address={}, queue_size={}",
            config.device,
            config.polling_mode,
            config.multi_drop,
            config.checksum_mode,
            config.own_address,
            config.max_queue_size
        );

        let shared = Arc::new(Shared {
            state: Mutex::new(PeerTable::new(config.max_queue_size)),
            port: Mutex::new(Some(transport)),
            handlers: Mutex::new(Handlers::default()),
            stats: Stats::default(),
            shutdown: AtomicBool::new(false),
            failed: AtomicBool::new(false),
            config,
        });

        let reader_shared = Arc::clone(&shared);
        let reader_handle = thread::Builder::new()
            .name("xkiss-reader".to_string())
            .spawn(move || reader::reader_loop(reader_shared))
            .map_err(Error::Io)?;

        let poller_handle = if shared.config.polling_mode == PollingMode::Active {
            let poller_shared = Arc::clone(&shared);
            Some(
                thread::Builder::new()
                    .name("xkiss-poller".to_string())
                    .spawn(move || poller::poller_loop(poller_shared))
                    .map_err(Error::Io)?,
            )
        } else {
            None
        };

        Ok(Session {
            shared,
            reader_handle: Some(reader_handle),
            poller_handle,
            closed: false,
        })
    }

    /// Send a DATA payload on a port, addressed to our own context
    pub fn send(&self, payload: &[u8], port: u8) -> Result<()> {
        self.send_to(self.shared.config.own_address, port, payload)
    }

    /// Send a DATA payload to a specific peer address and port
    ///
    /// In passive mode this enqueues the payload until the bus master polls
    /// us; otherwise it transmits immediately. SMACK CRC is applied
    /// automatically once the peer has negotiated it; the XOR checksum
    /// applies when the session runs in checksum mode.
    pub fn send_to(&self, address: u8, port: u8, payload: &[u8]) -> Result<()> {
        self.ensure_open()?;
        check_nibble(address)?;
        check_nibble(port)?;

        if self.shared.config.polling_mode == PollingMode::Passive {
            let own = self.shared.config.own_address;
            let dropped = {
                self.shared
                    .state
                    .lock()
                    .enqueue(own, port, QueueEntry::new(port, payload.to_vec()))
            };
            if let Some(dropped) = dropped {
                self.shared.stats.inc_overflows();
                log::warn!("Queue overflow for port {} (dropped oldest)", dropped.port);
                let handler = self.shared.handlers.lock().on_overflow.clone();
                if let Some(handler) = handler {
                    handler(own, dropped.port, &dropped.payload);
                }
            }
            return Ok(());
        }

        let nibble = self.shared.data_nibble(address, port);
        let smack = { self.shared.state.lock().smack_enabled(nibble) };
        let bytes = frame::encode(
            nibble,
            Command::Data,
            payload,
            smack,
            self.shared.config.checksum_mode,
        )?;
        self.shared.write_frame(&bytes)
    }

    /// Synthetic drain: flush every one of our port queues as if a POLL for
    /// our address had arrived on each. Works in any mode; it is the only
    /// way to force a drain outside passive polling.
    pub fn poll(&self) -> Result<()> {
        self.ensure_open()?;
        for port in 0..16u8 {
            self.shared.flush_queue(port)?;
        }
        Ok(())
    }

    /// Transmit one POLL frame to a peer address
    pub fn poll_remote(&self, address: u8) -> Result<()> {
        self.ensure_open()?;
        check_nibble(address)?;
        let bytes = frame::encode(
            address,
            Command::Poll,
            &[],
            false,
            self.shared.config.checksum_mode,
        )?;
        self.shared.write_frame(&bytes)
    }

    // === Link parameter commands (host to TNC) ===
    //
    // `target` is the TNC address in multi-drop operation, the port number
    // in plain KISS.

    /// TX delay in 10 ms units
    pub fn set_tx_delay(&self, target: u8, value: u8) -> Result<()> {
        self.send_command(target, Command::TxDelay, &[value])
    }

    /// P-persistence parameter
    pub fn set_persistence(&self, target: u8, value: u8) -> Result<()> {
        self.send_command(target, Command::Persistence, &[value])
    }

    /// Slot time in 10 ms units
    pub fn set_slot_time(&self, target: u8, value: u8) -> Result<()> {
        self.send_command(target, Command::SlotTime, &[value])
    }

    /// TX tail in 10 ms units (deprecated by most TNCs, still accepted)
    pub fn set_tx_tail(&self, target: u8, value: u8) -> Result<()> {
        self.send_command(target, Command::TxTail, &[value])
    }

    /// Full duplex on/off
    pub fn set_full_duplex(&self, target: u8, on: bool) -> Result<()> {
        self.send_command(target, Command::FullDuplex, &[u8::from(on)])
    }

    /// Vendor-specific hardware command
    pub fn set_hardware(&self, target: u8, payload: &[u8]) -> Result<()> {
        self.send_command(target, Command::SetHardware, payload)
    }

    /// Tell the TNC to leave KISS mode. The frame is the bare 0xFF type
    /// byte; no address nibble, no checksum trailer.
    pub fn exit_kiss(&self) -> Result<()> {
        self.ensure_open()?;
        let bytes = frame::encode(0, Command::Return, &[], false, false)?;
        self.shared.write_frame(&bytes)
    }

    fn send_command(&self, target: u8, command: Command, payload: &[u8]) -> Result<()> {
        self.ensure_open()?;
        check_nibble(target)?;
        // Command frames never carry the SMACK CRC, negotiated or not
        let bytes = frame::encode(
            target,
            command,
            payload,
            false,
            self.shared.config.checksum_mode,
        )?;
        self.shared.write_frame(&bytes)
    }

    // === Handlers ===

    /// Handler for every valid DATA frame: `(address, port, payload)`
    pub fn set_on_frame<F>(&self, handler: F)
    where
        F: Fn(u8, u8, &[u8]) + Send + Sync + 'static,
    {
        self.shared.handlers.lock().on_frame = Some(Arc::new(handler));
    }

    /// Handler for every valid POLL frame: `(address)`
    pub fn set_on_poll<F>(&self, handler: F)
    where
        F: Fn(u8) + Send + Sync + 'static,
    {
        self.shared.handlers.lock().on_poll = Some(Arc::new(handler));
    }

    /// Handler for queue overflow drops: `(address, port, dropped_payload)`
    pub fn set_on_overflow<F>(&self, handler: F)
    where
        F: Fn(u8, u8, &[u8]) + Send + Sync + 'static,
    {
        self.shared.handlers.lock().on_overflow = Some(Arc::new(handler));
    }

    /// Handler for non-fatal decode/checksum/transport events
    pub fn set_on_error<F>(&self, handler: F)
    where
        F: Fn(&ErrorEvent) + Send + Sync + 'static,
    {
        self.shared.handlers.lock().on_error = Some(Arc::new(handler));
    }

    // === Observation ===

    /// Point-in-time statistics; still available after close
    pub fn stats(&self) -> StatsSnapshot {
        self.shared.stats.snapshot()
    }

    /// Whether SMACK CRC mode has been negotiated with a peer. The key is
    /// the type-byte high nibble: peer address in multi-drop, port in plain
    /// KISS. Out-of-range keys report false.
    pub fn smack_enabled(&self, address: u8) -> bool {
        if address > 0x0F {
            return false;
        }
        self.shared.state.lock().smack_enabled(address)
    }

    /// Entries currently queued for one of our ports (passive mode)
    pub fn queue_len(&self, port: u8) -> usize {
        if port > 0x0F {
            return 0;
        }
        self.shared
            .state
            .lock()
            .queue_len(self.shared.config.own_address, port)
    }

    /// Whether the transport failed permanently (reconnect did not recover)
    pub fn is_failed(&self) -> bool {
        self.shared.failed.load(Ordering::Relaxed)
    }

    /// Stop the background threads, discard queued frames and close the
    /// transport. Idempotent; statistics remain observable afterwards.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;

        log::info!("Closing session");
        self.shared.shutdown.store(true, Ordering::Relaxed);

        if let Some(handle) = self.reader_handle.take() {
            if handle.join().is_err() {
                log::error!("Reader thread panicked");
            }
        }
        if let Some(handle) = self.poller_handle.take() {
            if handle.join().is_err() {
                log::error!("Poller thread panicked");
            }
        }

        let dropped = self.shared.state.lock().clear_queues();
        if dropped > 0 {
            log::warn!("Discarded {} queued frames on close", dropped);
        }

        if let Some(mut port) = self.shared.port.lock().take() {
            let _ = port.flush();
        }

        log::info!("Session closed");
        Ok(())
    }

    fn ensure_open(&self) -> Result<()> {
        if self.closed {
            return Err(Error::Closed);
        }
        Ok(())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        let _ = self.close();
    }
}

fn check_nibble(value: u8) -> Result<()> {
    if value > 0x0F {
        return Err(Error::InvalidAddress(value));
    }
    Ok(())
}
