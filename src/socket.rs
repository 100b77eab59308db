//! UDP transport.
//!
//! [`UdpTransport`] is a thin wrapper around `tokio::net::UdpSocket` that
//! speaks [`crate::datagram::Datagram`] instead of raw bytes.  All protocol
//! logic lives elsewhere; this module owns only byte I/O.
//!
//! The socket is *connected* to the receiver, so stray datagrams from other
//! peers are filtered by the kernel.  Receives use `try_recv`, which never
//! blocks; the async runner waits on [`Transport::poll_recv_ready`] instead.

use std::io;
use std::net::SocketAddr;
use std::task::{Context, Poll};

use tokio::net::UdpSocket;

use crate::datagram::{Datagram, MAX_DATAGRAM_LEN};
use crate::transport::{Transport, TransportError};

/// Receive buffer size.  Larger than any valid datagram so oversized junk
/// is read in one piece and then rejected by the decoder.
const RECV_BUF_LEN: usize = 2 * MAX_DATAGRAM_LEN;

/// A connected, datagram-oriented UDP transport.
#[derive(Debug)]
pub struct UdpTransport {
    /// Address this socket is bound to (filled in after OS assigns ephemeral port).
    pub local_addr: SocketAddr,
    /// Receiver address the socket is connected to.
    pub peer_addr: SocketAddr,
    inner: UdpSocket,
    buf: Vec<u8>,
}

impl UdpTransport {
    /// Resolve `host:port`, bind an ephemeral local port of the matching
    /// address family and connect to the receiver.
    pub async fn connect(host: &str, port: u16) -> Result<Self, TransportError> {
        let peer_addr = tokio::net::lookup_host((host, port))
            .await?
            .find(SocketAddr::is_ipv4)
            .ok_or_else(|| TransportError::Resolve(format!("{host}:{port}")))?;
        Self::connect_addr(peer_addr).await
    }

    /// Bind an ephemeral local port and connect to `peer_addr`.
    pub async fn connect_addr(peer_addr: SocketAddr) -> Result<Self, TransportError> {
        let bind_addr: SocketAddr = if peer_addr.is_ipv4() {
            ([0, 0, 0, 0], 0).into()
        } else {
            ([0u16; 8], 0).into()
        };
        let inner = UdpSocket::bind(bind_addr).await?;
        inner.connect(peer_addr).await?;
        let local_addr = inner.local_addr()?;
        log::debug!("[udp] bound {local_addr} → {peer_addr}");
        Ok(Self {
            local_addr,
            peer_addr,
            inner,
            buf: vec![0u8; RECV_BUF_LEN],
        })
    }
}

impl Transport for UdpTransport {
    fn send(&mut self, datagram: &Datagram) -> Result<(), TransportError> {
        let bytes = datagram.encode();
        match self.inner.try_send(&bytes) {
            Ok(_) => Ok(()),
            // A full socket buffer or an ICMP error from an earlier datagram
            // is indistinguishable from loss on the wire.
            Err(e) if is_loss(&e) => {
                log::warn!("[udp] send of seq={} dropped: {e}", datagram.seq);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    fn try_recv(&mut self) -> Result<Option<Datagram>, TransportError> {
        loop {
            let n = match self.inner.try_recv(&mut self.buf) {
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(None),
                Err(e) if is_loss(&e) => {
                    log::warn!("[udp] receive reported {e}; treating as loss");
                    continue;
                }
                Err(e) => return Err(e.into()),
            };
            match Datagram::decode(&self.buf[..n]) {
                Ok(datagram) => return Ok(Some(datagram)),
                Err(e) => {
                    log::warn!("[udp] discarding undecodable datagram ({n} bytes): {e}");
                    return Ok(None);
                }
            }
        }
    }

    fn poll_recv_ready(&self, cx: &mut Context<'_>) -> Poll<io::Result<()>> {
        self.inner.poll_recv_ready(cx)
    }
}

/// Errors that mean "this datagram went nowhere" rather than "the socket is
/// broken".  Connection refused is the kernel relaying an ICMP port
/// unreachable, typically because the receiver has not started yet.
fn is_loss(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::ConnectionRefused
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn round_trip_over_loopback() {
        let peer = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let peer_addr = peer.local_addr().unwrap();
        let mut transport = UdpTransport::connect_addr(peer_addr).await.unwrap();
        assert!(transport.try_recv().unwrap().is_none());

        let mut d = Datagram::data(1, b"ping".to_vec()).unwrap();
        d.seal();
        transport.send(&d).unwrap();

        let mut buf = [0u8; 64];
        let (n, from) = peer.recv_from(&mut buf).await.unwrap();
        assert_eq!(from.port(), transport.local_addr.port());
        assert_eq!(Datagram::decode(&buf[..n]).unwrap(), d);

        let mut ack = Datagram::ack(1);
        ack.seal();
        peer.send_to(&ack.encode(), from).await.unwrap();

        std::future::poll_fn(|cx| transport.poll_recv_ready(cx))
            .await
            .unwrap();
        assert_eq!(transport.try_recv().unwrap(), Some(ack));
    }

    #[tokio::test]
    async fn undecodable_bytes_are_dropped() {
        let peer = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let mut transport = UdpTransport::connect_addr(peer.local_addr().unwrap())
            .await
            .unwrap();
        let port = transport.local_addr.port();
        peer.send_to(&[1, 2, 3], ("127.0.0.1", port)).await.unwrap();

        std::future::poll_fn(|cx| transport.poll_recv_ready(cx))
            .await
            .unwrap();
        assert!(transport.try_recv().unwrap().is_none());
    }

    #[tokio::test]
    async fn connect_resolves_localhost() {
        let peer = UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = peer.local_addr().unwrap().port();
        let transport = UdpTransport::connect("localhost", port).await.unwrap();
        assert_eq!(transport.peer_addr.port(), port);
    }
}
