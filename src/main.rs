//! xkiss-io - KISS/XKISS/SMACK serial TNC monitor
//!
//! Opens a session on a serial device, prints every received frame and
//! event, and runs until interrupted. Exit codes: 0 clean close, 1
//! unrecoverable transport error, 2 configuration error.

use clap::{Parser, ValueEnum};
use std::process;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;
use xkiss_io::{Error, PollingMode, Result, Session, SessionConfig};

#[derive(Parser)]
#[command(name = "xkiss-io")]
#[command(about = "KISS/XKISS/SMACK serial TNC monitor")]
struct Args {
    /// TOML config file; command-line flags override its values
    #[arg(long)]
    config: Option<String>,

    /// Serial device path
    #[arg(short, long)]
    device: Option<String>,

    /// Baud rate
    #[arg(short, long)]
    baud: Option<u32>,

    /// Polling mode
    #[arg(long, value_enum)]
    polling: Option<PollingArg>,

    /// Active poll interval in seconds
    #[arg(long)]
    poll_interval: Option<f64>,

    /// Enable XOR checksum mode
    #[arg(long)]
    checksum: bool,

    /// Per-port queue capacity
    #[arg(long)]
    queue_size: Option<usize>,

    /// Multi-drop TNC address (0-15)
    #[arg(short, long)]
    address: Option<u8>,

    /// Enable debug logging
    #[arg(long)]
    debug: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PollingArg {
    Off,
    Active,
    Passive,
}

impl From<PollingArg> for PollingMode {
    fn from(arg: PollingArg) -> Self {
        match arg {
            PollingArg::Off => PollingMode::Off,
            PollingArg::Active => PollingMode::Active,
            PollingArg::Passive => PollingMode::Passive,
        }
    }
}

fn build_config(args: &Args) -> Result<SessionConfig> {
    let mut config = match (&args.config, &args.device) {
        (Some(path), _) => SessionConfig::load(path)?,
        (None, Some(device)) => SessionConfig::new(device),
        (None, None) => {
            return Err(Error::InvalidConfig(
                "either --config or --device is required".to_string(),
            ))
        }
    };

    if let Some(device) = &args.device {
        config.device = device.clone();
    }
    if let Some(baud) = args.baud {
        config.baud_rate = baud;
    }
    if let Some(polling) = args.polling {
        config.polling_mode = polling.into();
    }
    if let Some(interval) = args.poll_interval {
        if !interval.is_finite() || interval <= 0.0 {
            return Err(Error::InvalidConfig(
                "poll interval must be greater than 0".to_string(),
            ));
        }
        config.poll_interval_ms = (interval * 1000.0) as u64;
    }
    if args.checksum {
        config.checksum_mode = true;
    }
    if let Some(size) = args.queue_size {
        config.max_queue_size = size;
    }
    if let Some(address) = args.address {
        config.own_address = address;
    }

    config.validate()?;
    Ok(config)
}

fn run(config: SessionConfig) -> Result<()> {
    let mut session = Session::open(config)?;

    session.set_on_frame(|addr, port, payload| {
        let hex: String = payload.iter().map(|b| format!("{:02X}", b)).collect();
        log::info!("RX addr={} port={} len={}: {}", addr, port, payload.len(), hex);
    });
    session.set_on_poll(|addr| {
        log::debug!("POLL from address {}", addr);
    });
    session.set_on_overflow(|addr, port, _payload| {
        log::warn!("Queue overflow: addr={} port={} (dropped oldest)", addr, port);
    });
    session.set_on_error(|event| {
        log::warn!("{:?} error: {}", event.kind, event.detail);
    });

    // Ctrl-C flips the flag; the loop below notices and closes cleanly
    let running = Arc::new(AtomicBool::new(true));
    let r = Arc::clone(&running);
    ctrlc::set_handler(move || {
        log::info!("Received shutdown signal");
        r.store(false, Ordering::Relaxed);
    })
    .map_err(|e| Error::InvalidConfig(format!("Failed to set Ctrl-C handler: {}", e)))?;

    log::info!("xkiss-io running. Press Ctrl-C to stop.");

    while running.load(Ordering::Relaxed) {
        if session.is_failed() {
            session.close()?;
            return Err(Error::Transport("serial link lost".to_string()));
        }
        thread::sleep(Duration::from_millis(100));
    }

    let stats = session.stats();
    session.close()?;
    log::info!(
        "Session stats: tx={} rx={} crc_err={} xor_err={} overflows={} reconnects={}",
        stats.tx_frames,
        stats.rx_frames,
        stats.crc_errors,
        stats.xor_errors,
        stats.overflows,
        stats.reconnects
    );
    Ok(())
}

fn main() {
    let args = Args::parse();

    let default_level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_level))
        .init();

    let config = match build_config(&args) {
        Ok(config) => config,
        Err(e) => {
            log::error!("{}", e);
            process::exit(2);
        }
    };

    match run(config) {
        Ok(()) => {}
        Err(e @ (Error::InvalidConfig(_) | Error::InvalidAddress(_))) => {
            log::error!("{}", e);
            process::exit(2);
        }
        Err(e) => {
            log::error!("{}", e);
            process::exit(1);
        }
    }
}
