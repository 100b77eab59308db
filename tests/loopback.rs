//! End-to-end transfers over the loopback interface.
//!
//! A minimal Go-Back-N receiver runs as a separate tokio task on a real UDP
//! socket; the sender session runs with [`Session::run`] against a
//! [`UdpTransport`], optionally behind the fault injector.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

use rdt_over_udp::datagram::validate_checksum;
use rdt_over_udp::{
    Datagram, FragmentReader, LossyTransport, Session, SessionConfig, SessionLog,
    SimulatorConfig, Transport, UdpTransport,
};

/// Spawn a receiver on an ephemeral loopback port.  The reassembled file is
/// delivered through the returned channel once the terminal fragment
/// arrives; the task keeps ACKing until aborted, in case the final ACK is
/// lost.
async fn spawn_receiver() -> (SocketAddr, oneshot::Receiver<Vec<u8>>, JoinHandle<()>) {
    let sock = UdpSocket::bind("127.0.0.1:0").await.expect("bind failed");
    let addr = sock.local_addr().unwrap();
    let (done_tx, done_rx) = oneshot::channel();

    let task = tokio::spawn(async move {
        let mut done_tx = Some(done_tx);
        let mut expected: u16 = 1;
        let mut file = Vec::new();
        let mut buf = [0u8; 1024];
        loop {
            let (n, from) = sock.recv_from(&mut buf).await.expect("receiver recv");
            let Ok(datagram) = Datagram::decode(&buf[..n]) else {
                continue;
            };
            if !validate_checksum(&datagram) {
                continue;
            }
            if datagram.seq == expected {
                if datagram.is_end_of_stream() {
                    if let Some(tx) = done_tx.take() {
                        let _ = tx.send(std::mem::take(&mut file));
                    }
                } else {
                    file.extend_from_slice(datagram.payload());
                }
                expected = if expected == u16::MAX { 1 } else { expected + 1 };
            }
            if expected != 1 {
                let mut ack = Datagram::ack(expected - 1);
                ack.seal();
                sock.send_to(&ack.encode(), from).await.expect("receiver send");
            }
        }
    });

    (addr, done_rx, task)
}

/// Write `data` to a fresh file under the system temp directory.
fn temp_input(name: &str, data: &[u8]) -> PathBuf {
    let path = std::env::temp_dir().join(format!("rdt-over-udp-{}-{name}.bin", std::process::id()));
    std::fs::write(&path, data).expect("write temp input");
    path
}

fn sample(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i * 31 % 256) as u8).collect()
}

async fn transfer<T: Transport>(transport: T, path: &Path, config: &SessionConfig) -> u64 {
    let reader = FragmentReader::open(path).expect("open input");
    let mut session = Session::new(config, transport, reader, SessionLog::off()).expect("session");
    let report = tokio::time::timeout(Duration::from_secs(20), session.run())
        .await
        .expect("transfer timed out")
        .expect("transfer failed");
    assert!(session.is_finished());
    report.bytes
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[tokio::test]
async fn file_arrives_intact_over_loopback() {
    let data = sample(50 * 255 + 123);
    let path = temp_input("clean", &data);
    let (addr, done, receiver) = spawn_receiver().await;

    let udp = UdpTransport::connect_addr(addr).await.expect("connect");
    let sent = transfer(udp, &path, &SessionConfig::default()).await;

    let received = tokio::time::timeout(Duration::from_secs(5), done)
        .await
        .expect("receiver never finished")
        .expect("receiver dropped");
    receiver.abort();
    let _ = std::fs::remove_file(&path);

    assert_eq!(sent, data.len() as u64);
    assert_eq!(received, data);
}

#[tokio::test]
async fn empty_file_over_loopback() {
    let path = temp_input("empty", &[]);
    let (addr, done, receiver) = spawn_receiver().await;

    let udp = UdpTransport::connect("localhost", addr.port()).await.expect("connect");
    let sent = transfer(udp, &path, &SessionConfig::default()).await;

    let received = done.await.expect("receiver dropped");
    receiver.abort();
    let _ = std::fs::remove_file(&path);

    assert_eq!(sent, 0);
    assert!(received.is_empty());
}

#[tokio::test]
async fn file_survives_simulated_loss_and_corruption() {
    let data = sample(80 * 255 + 1);
    let path = temp_input("lossy", &data);
    let (addr, done, receiver) = spawn_receiver().await;

    let udp = UdpTransport::connect_addr(addr).await.expect("connect");
    let faults = SimulatorConfig {
        loss_rate: 0.15,
        corrupt_rate: 0.05,
        seed: 99,
    };
    let config = SessionConfig {
        window_size: 8,
        timeout: Duration::from_millis(20),
    };
    let sent = transfer(LossyTransport::new(udp, faults).expect("valid fault rates"), &path, &config).await;

    let received = tokio::time::timeout(Duration::from_secs(5), done)
        .await
        .expect("receiver never finished")
        .expect("receiver dropped");
    receiver.abort();
    let _ = std::fs::remove_file(&path);

    assert_eq!(sent, data.len() as u64);
    assert_eq!(received, data);
}
