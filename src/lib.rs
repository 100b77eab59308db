//! `rdt-over-udp`: a Go-Back-N reliable file sender over UDP.
//!
//! # Architecture
//!
//! ```text
//!  ┌────────────────┐  ≤255-byte chunks  ┌───────────────────────────┐
//!  │ FragmentReader │───────────────────▶│          Session          │
//!  └────────────────┘                    │  SendWindow + one timer   │
//!                                        └────┬─────────────────▲────┘
//!                                   datagrams │                 │ cumulative ACKs
//!                                        ┌────▼─────────────────┴────┐
//!                                        │   LossyTransport (opt.)   │
//!                                        └────┬─────────────────▲────┘
//!                                        ┌────▼─────────────────┴────┐
//!                                        │       UdpTransport        │
//!                                        └───────────────────────────┘
//! ```
//!
//! Each module has a single responsibility:
//! - [`datagram`]     : wire format and the Internet checksum
//! - [`seq`]          : 16-bit sequence arithmetic that skips 0
//! - [`window`]       : fixed-capacity ring of unacknowledged datagrams
//! - [`timer`]        : the single retransmission timer
//! - [`transport`]    : unreliable send / non-blocking receive capability
//! - [`socket`]       : UDP transport on a connected tokio socket
//! - [`simulator`]    : seeded loss and corruption injection
//! - [`reader`]       : splits the input into fragments
//! - [`config`]       : window size and timeout
//! - [`session_log`]  : per-session leveled logger
//! - [`state`]        : session phases
//! - [`session`]      : the Go-Back-N driver

pub mod config;
pub mod datagram;
pub mod reader;
pub mod seq;
pub mod session;
pub mod session_log;
pub mod simulator;
pub mod socket;
pub mod state;
pub mod timer;
pub mod transport;
pub mod window;

pub use config::{ConfigError, SessionConfig};
pub use datagram::{Datagram, DatagramError, MAX_PAYLOAD_LENGTH};
pub use reader::FragmentReader;
pub use session::{Session, SessionError, TransferReport, TransferStats};
pub use session_log::SessionLog;
pub use simulator::{LossyTransport, SimulatorConfig};
pub use socket::UdpTransport;
pub use transport::{Transport, TransportError};
pub use window::WindowError;
