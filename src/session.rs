//! Go-Back-N sender session: the ARQ driver.
//!
//! # Architecture
//!
//! ```text
//!   FragmentReader ──chunks──▶ ┌──────────────────────────┐
//!                              │         Session          │
//!                              │  ├── SendWindow (N slots)│ ──datagrams──▶ Transport
//!   RetransmitTimer ◀─start/── │  ├── all_sent / all_acked│ ◀────ACKs───── (lossy)
//!                     stop     │  └── SessionLog          │
//!                              └──────────────────────────┘
//! ```
//!
//! # One iteration ([`Session::poll_once`])
//!
//! 1. **Admission**: if the terminal fragment has not been sent and the
//!    window has room, read the next chunk and send it.  An empty chunk
//!    becomes the zero-length end-of-stream datagram.  The timer is armed
//!    when the datagram enters an empty window.
//! 2. **Acknowledgment**: take at most one datagram from the transport.
//!    A bad checksum is logged and dropped.  A valid cumulative ACK slides
//!    `base`; a drained window stops the timer, a partially drained one
//!    restarts it.
//! 3. **Timeout**: on expiry, every outstanding datagram is resent in
//!    ascending order and the timer is restarted.
//!
//! The session ends once the terminal fragment is acknowledged.  Loss and
//! corruption never surface as errors; only read and transport failures do.
//!
//! # Usage
//!
//! ```ignore
//! let transport = UdpTransport::connect("localhost", 12345).await?;
//! let reader = FragmentReader::open("input.bin")?;
//! let mut session = Session::new(&SessionConfig::default(), transport, reader, SessionLog::default())?;
//! let report = session.run().await?;
//! ```

use std::io::{self, Read};
use std::time::Duration;

use thiserror::Error;
use tokio::time::Instant;

use crate::config::{ConfigError, SessionConfig};
use crate::datagram::{validate_checksum, Datagram, DatagramError};
use crate::reader::FragmentReader;
use crate::session_log::SessionLog;
use crate::state::SessionPhase;
use crate::timer::{DeadlineTimer, RetransmitTimer};
use crate::transport::{Transport, TransportError};
use crate::window::{AckOutcome, SendWindow, WindowError};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Unrecoverable session failures.  The transfer either completes or ends
/// with one of these.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("failed to read input: {0}")]
    Read(#[source] io::Error),
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("invalid session configuration: {0}")]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Datagram(#[from] DatagramError),
    #[error(transparent)]
    Window(#[from] WindowError),
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

/// Running counters for one session.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TransferStats {
    /// Fragments admitted to the window, terminal fragment included.
    pub fragments: u64,
    /// Every datagram handed to the transport, first sends and resends.
    pub datagrams_sent: u64,
    /// Datagrams resent after a timeout.
    pub retransmissions: u64,
    /// Timer expiries.
    pub timeouts: u64,
    /// ACKs that moved `base` forward.
    pub acks_accepted: u64,
    /// Valid ACKs below `base`.
    pub acks_stale: u64,
    /// Valid ACKs naming a sequence number that was never sent.
    pub acks_out_of_window: u64,
    /// Received datagrams dropped for a bad checksum.
    pub corrupt_discarded: u64,
}

/// Summary returned by [`Session::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferReport {
    pub stats: TransferStats,
    /// Payload bytes read from the input.
    pub bytes: u64,
    pub elapsed: Duration,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

/// Sender side of one file transfer.
pub struct Session<T, M, R> {
    transport: T,
    timer: M,
    reader: FragmentReader<R>,
    window: SendWindow,
    log: SessionLog,

    /// The terminal zero-length fragment has been handed to the transport.
    all_sent: bool,
    /// `base` has moved past the terminal fragment.
    all_acked: bool,

    phase: SessionPhase,
    stats: TransferStats,
}

impl<T: Transport, R: Read> Session<T, DeadlineTimer, R> {
    /// Build a session that uses a [`DeadlineTimer`] with the configured
    /// timeout.
    pub fn new(
        config: &SessionConfig,
        transport: T,
        reader: FragmentReader<R>,
        log: SessionLog,
    ) -> Result<Self, SessionError> {
        let timer = DeadlineTimer::new(config.timeout);
        Self::with_timer(config, transport, timer, reader, log)
    }
}

impl<T: Transport, M: RetransmitTimer, R: Read> Session<T, M, R> {
    /// Build a session around an arbitrary timer.  `config.timeout` is only
    /// used by [`Session::new`]; a custom timer brings its own.
    pub fn with_timer(
        config: &SessionConfig,
        transport: T,
        timer: M,
        reader: FragmentReader<R>,
        log: SessionLog,
    ) -> Result<Self, SessionError> {
        config.validate()?;
        Ok(Self {
            transport,
            timer,
            reader,
            window: SendWindow::new(config.window_size)?,
            log,
            all_sent: false,
            all_acked: false,
            phase: SessionPhase::Filling,
            stats: TransferStats::default(),
        })
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    pub fn timer(&self) -> &M {
        &self.timer
    }

    pub fn timer_mut(&mut self) -> &mut M {
        &mut self.timer
    }

    pub fn window(&self) -> &SendWindow {
        &self.window
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn stats(&self) -> TransferStats {
        self.stats
    }

    pub fn all_sent(&self) -> bool {
        self.all_sent
    }

    pub fn all_acked(&self) -> bool {
        self.all_acked
    }

    /// `true` once every fragment, including the terminal one, is
    /// acknowledged.
    pub fn is_finished(&self) -> bool {
        self.all_sent && self.all_acked
    }

    // -----------------------------------------------------------------------
    // Driving the session
    // -----------------------------------------------------------------------

    /// Run the session to completion.
    ///
    /// Iterations that make no progress wait for the transport to become
    /// readable or for the retransmission deadline, whichever comes first.
    pub async fn run(&mut self) -> Result<TransferReport, SessionError> {
        let started = Instant::now();
        self.log.info(format_args!(
            "[gbn] starting transfer: window={}",
            self.window.capacity()
        ));

        while !self.is_finished() {
            if !self.poll_once()? {
                self.wait_for_event().await?;
            }
        }

        let report = TransferReport {
            stats: self.stats,
            bytes: self.reader.bytes_read(),
            elapsed: started.elapsed(),
        };
        self.log.info(format_args!(
            "[gbn] transfer complete: {} bytes in {} fragments, {} datagrams sent, {} retransmitted, {:?}",
            report.bytes,
            report.stats.fragments,
            report.stats.datagrams_sent,
            report.stats.retransmissions,
            report.elapsed
        ));
        Ok(report)
    }

    /// Run one admission / acknowledgment / timeout pass.
    ///
    /// Returns `Ok(true)` when the pass sent or received anything, so the
    /// caller knows another pass may make progress immediately.
    pub fn poll_once(&mut self) -> Result<bool, SessionError> {
        if self.is_finished() {
            return Ok(false);
        }
        let mut progressed = self.admit_next()?;
        progressed |= self.process_inbound()?;
        progressed |= self.check_timeout()?;
        self.update_phase();
        Ok(progressed)
    }

    /// Admission step.
    fn admit_next(&mut self) -> Result<bool, SessionError> {
        if self.all_sent || !self.window.can_admit() {
            return Ok(false);
        }

        let seq = self.window.next_seq().get();
        let chunk = self.reader.next_fragment().map_err(SessionError::Read)?;
        let mut datagram = if chunk.is_empty() {
            self.all_sent = true;
            self.log.info(format_args!("[gbn] → END seq={seq}"));
            Datagram::end_of_stream(seq)
        } else {
            Datagram::data(seq, chunk)?
        };

        let was_drained = self.window.is_drained();
        datagram.seal();
        self.transport.send(&datagram)?;
        self.stats.datagrams_sent += 1;
        self.stats.fragments += 1;
        self.log.debug(format_args!(
            "[gbn] → DATA seq={} len={} in_flight={}",
            seq,
            datagram.payload_len(),
            self.window.in_flight() + 1
        ));

        self.window.admit(datagram)?;
        if was_drained {
            self.timer.start();
        }
        Ok(true)
    }

    /// Acknowledgment step.
    fn process_inbound(&mut self) -> Result<bool, SessionError> {
        let Some(datagram) = self.transport.try_recv()? else {
            self.log.trace(format_args!("[gbn] nothing received"));
            return Ok(false);
        };

        if !validate_checksum(&datagram) {
            self.stats.corrupt_discarded += 1;
            self.log.warn(format_args!(
                "[gbn] ← datagram with bad checksum (ack={}); discarded",
                datagram.ack
            ));
            return Ok(true);
        }

        match self.window.apply_ack(datagram.ack) {
            AckOutcome::Advanced { retired } => {
                self.stats.acks_accepted += 1;
                self.log.debug(format_args!(
                    "[gbn] ← ACK ack={} slid={} base={}",
                    datagram.ack,
                    retired,
                    self.window.base()
                ));
                if self.window.is_drained() {
                    self.timer.stop();
                    if self.all_sent {
                        self.all_acked = true;
                    }
                } else {
                    self.timer.start();
                }
            }
            AckOutcome::Stale => {
                self.stats.acks_stale += 1;
                self.log.debug(format_args!(
                    "[gbn] ← stale ACK ack={} (base={})",
                    datagram.ack,
                    self.window.base()
                ));
            }
            AckOutcome::OutOfWindow => {
                self.stats.acks_out_of_window += 1;
                self.log.debug(format_args!(
                    "[gbn] ← ACK ack={} outside [{}, {}); ignored",
                    datagram.ack,
                    self.window.base(),
                    self.window.next_seq()
                ));
            }
        }
        Ok(true)
    }

    /// Timeout step: go back N.
    fn check_timeout(&mut self) -> Result<bool, SessionError> {
        if !self.timer.expired() {
            return Ok(false);
        }
        self.stats.timeouts += 1;
        self.log.warn(format_args!(
            "[gbn] timeout, retransmitting {} datagram(s) from base={}",
            self.window.in_flight(),
            self.window.base()
        ));

        for datagram in self.window.outstanding_mut() {
            datagram.seal();
            self.transport.send(datagram)?;
            self.stats.datagrams_sent += 1;
            self.stats.retransmissions += 1;
            self.log.debug(format_args!("[gbn] ↻ seq={}", datagram.seq));
        }

        if !self.window.is_drained() {
            self.timer.start();
        }
        Ok(true)
    }

    fn update_phase(&mut self) {
        let phase = SessionPhase::from_flags(self.all_sent, self.all_acked, self.window.can_admit());
        if phase != self.phase {
            self.log.debug(format_args!("[gbn] phase {} → {}", self.phase, phase));
            self.phase = phase;
        }
    }

    async fn wait_for_event(&self) -> Result<(), SessionError> {
        let readable = std::future::poll_fn(|cx| self.transport.poll_recv_ready(cx));
        match self.timer.deadline() {
            Some(deadline) => {
                tokio::select! {
                    ready = readable => ready.map_err(TransportError::from)?,
                    _ = tokio::time::sleep_until(deadline) => {}
                }
            }
            None => readable.await.map_err(TransportError::from)?,
        }
        Ok(())
    }
}
