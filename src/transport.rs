//! Unreliable datagram transport capability.
//!
//! The session never talks to a socket directly; it consumes a
//! [`Transport`], which may silently lose, corrupt, reorder or delay what it
//! carries.  Implementations:
//! - [`crate::socket::UdpTransport`]: a connected tokio UDP socket.
//! - [`crate::simulator::LossyTransport`]: fault injection around any other
//!   transport.
//!
//! Both operations are non-blocking.  [`Transport::poll_recv_ready`] exists
//! only so the async runner can sleep until something arrives instead of
//! spinning.

use std::io;
use std::task::{Context, Poll};

use thiserror::Error;

use crate::datagram::Datagram;

/// Errors a transport surfaces.  Every one of them is fatal to the session;
/// ordinary loss is never reported as an error.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("transport I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("could not resolve receiver address {0}")]
    Resolve(String),
}

/// Fire-and-forget send plus non-blocking receive.
pub trait Transport {
    /// Hand one datagram to the network.  Success says nothing about
    /// delivery.
    fn send(&mut self, datagram: &Datagram) -> Result<(), TransportError>;

    /// Take the next received datagram, if any.  Returns `Ok(None)`
    /// immediately when nothing is queued.  The checksum is not verified.
    fn try_recv(&mut self) -> Result<Option<Datagram>, TransportError>;

    /// Register interest in the next inbound datagram.
    ///
    /// The default is always ready, which suits in-memory transports whose
    /// `try_recv` is cheap.
    fn poll_recv_ready(&self, _cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        Poll::Ready(Ok(()))
    }
}

impl<T: Transport + ?Sized> Transport for Box<T> {
    fn send(&mut self, datagram: &Datagram) -> Result<(), TransportError> {
        (**self).send(datagram)
    }

    fn try_recv(&mut self) -> Result<Option<Datagram>, TransportError> {
        (**self).try_recv()
    }

    fn poll_recv_ready(&self, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        (**self).poll_recv_ready(cx)
    }
}
