//! UDP ingestion socket.
//!
//! One datagram is one logical unit; nothing is buffered across reads. The
//! receive loop hands each datagram to the [`Session`] and returns to the
//! socket immediately, leaving lookups and logging to spawned tasks.

use std::{future::Future, io, net::SocketAddr};

use tokio::net::UdpSocket;

use crate::session::{IngestOutcome, Session};

/// Largest datagram the loop accepts.
const MAX_DATAGRAM: usize = 65_535;

#[derive(Debug)]
pub struct UdpListener {
    socket: UdpSocket,
    local_addr: SocketAddr,
}

impl UdpListener {
    pub async fn bind(addr: SocketAddr) -> io::Result<Self> {
        let socket = UdpSocket::bind(addr).await.map_err(|e| {
            tracing::error!(%addr, error = %e, "failed to bind UDP socket");
            e
        })?;
        let local_addr = socket.local_addr()?;
        tracing::info!(%local_addr, "listening for logger datagrams");
        Ok(Self { socket, local_addr })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Receives until `shutdown` resolves or the socket fails.
    pub async fn run(self, session: Session, shutdown: impl Future<Output = ()>) -> io::Result<()> {
        let mut buf = vec![0u8; MAX_DATAGRAM];
        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                received = self.socket.recv_from(&mut buf) => {
                    let (n, src) = received?;
                    tracing::trace!(%src, bytes = n, "datagram");
                    if let IngestOutcome::Status(Some(notice)) = session.ingest(&buf[..n]).await {
                        tracing::warn!(%notice, "possible dupe");
                    }
                }
                () = &mut shutdown => {
                    tracing::info!("listener stopping");
                    return Ok(());
                }
            }
        }
    }
}
