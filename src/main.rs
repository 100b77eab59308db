//! Entry point for `rdt-over-udp`.
//!
//! Parses CLI arguments, installs the logger, and hands the file to a
//! Go-Back-N [`Session`].  All protocol work lives in the library; `main.rs`
//! owns only process setup.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use clap::{ArgAction, Parser};

use rdt_over_udp::{
    FragmentReader, LossyTransport, Session, SessionConfig, SessionLog, SimulatorConfig,
    Transport, UdpTransport,
};

/// Send a file reliably over UDP using Go-Back-N.
#[derive(Parser)]
#[command(author, version, about, disable_help_flag = true)]
struct Cli {
    /// File to send.
    #[arg(short, long)]
    file: PathBuf,

    /// Receiver host name or address.
    #[arg(short, long)]
    host: String,

    /// Receiver UDP port.
    #[arg(short, long, default_value_t = 12345)]
    port: u16,

    /// Log level: 0 off, 1 error, 2 warn, 3 info, 4 debug, 5 trace.
    #[arg(short, long, default_value_t = 3, value_parser = clap::value_parser!(u8).range(0..=5))]
    debug: u8,

    /// Maximum number of unacknowledged fragments.
    #[arg(short, long, default_value_t = rdt_over_udp::config::DEFAULT_WINDOW_SIZE)]
    window: usize,

    /// Retransmission timeout in milliseconds.
    #[arg(short, long = "timeout-ms", default_value_t = 100)]
    timeout_ms: u64,

    /// Probability of dropping a datagram in either direction.
    #[arg(long, default_value_t = 0.0)]
    loss_rate: f64,

    /// Probability of flipping one bit of a datagram in either direction.
    #[arg(long, default_value_t = 0.0)]
    corrupt_rate: f64,

    /// Seed for the fault injector.
    #[arg(long, default_value_t = 0)]
    seed: u64,

    /// Print help.
    #[arg(long, action = ArgAction::Help)]
    help: Option<bool>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // `-d` sets the default filter; RUST_LOG still wins when present.
    let session_log = SessionLog::from_verbosity(cli.debug);
    env_logger::Builder::new()
        .filter_level(session_log.level())
        .parse_default_env()
        .init();

    let config = SessionConfig {
        window_size: cli.window,
        timeout: Duration::from_millis(cli.timeout_ms),
    };
    config.validate().context("invalid session configuration")?;

    let faults = SimulatorConfig {
        loss_rate: cli.loss_rate,
        corrupt_rate: cli.corrupt_rate,
        seed: cli.seed,
    };
    faults.validate().context("invalid fault injection settings")?;

    let reader = FragmentReader::open(&cli.file)
        .with_context(|| format!("cannot open {}", cli.file.display()))?;

    let udp = UdpTransport::connect(&cli.host, cli.port)
        .await
        .with_context(|| format!("cannot reach {}:{}", cli.host, cli.port))?;
    log::info!(
        "Sending {} to {} (window={}, timeout={:?})",
        cli.file.display(),
        udp.peer_addr,
        config.window_size,
        config.timeout
    );

    let transport: Box<dyn Transport> = if faults.is_transparent() {
        Box::new(udp)
    } else {
        log::info!(
            "Fault injection on: loss={} corrupt={} seed={}",
            faults.loss_rate,
            faults.corrupt_rate,
            faults.seed
        );
        Box::new(LossyTransport::new(udp, faults)?)
    };

    let mut session = Session::new(&config, transport, reader, session_log)?;
    let report = session.run().await.context("transfer failed")?;

    log::info!(
        "Done: {} bytes, {} timeouts, {} corrupt ACKs discarded, {:?}",
        report.bytes,
        report.stats.timeouts,
        report.stats.corrupt_discarded,
        report.elapsed
    );
    Ok(())
}
