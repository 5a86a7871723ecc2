//! UDP transport implementation.

use super::Transport;
use crate::error::{Error, Result};
use crate::util::bind_ephemeral_udp_socket;
use bytes::Bytes;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::UdpSocket;
use tokio::time::timeout;

/// UDP transport for a single device.
///
/// Each `UdpTransport` owns a connected UDP socket to one target.
#[derive(Clone)]
pub struct UdpTransport {
    inner: Arc<UdpTransportInner>,
}

struct UdpTransportInner {
    socket: UdpSocket,
    target: SocketAddr,
}

impl UdpTransport {
    /// Connect to a target address.
    ///
    /// Creates an ephemeral UDP socket bound to the target's address family.
    pub async fn connect(target: SocketAddr) -> Result<Self> {
        tracing::debug!(target: "albedo_snmp::transport", { snmp.target = %target }, "connecting UDP transport");

        let io_err = |source| Error::Network { target, source }.boxed();

        let socket = bind_ephemeral_udp_socket(target).await.map_err(io_err)?;
        socket.connect(target).await.map_err(io_err)?;
        let local_addr = socket.local_addr().map_err(io_err)?;

        tracing::debug!(
            target: "albedo_snmp::transport",
            { snmp.target = %target, snmp.local_addr = %local_addr },
            "UDP transport connected"
        );

        Ok(Self {
            inner: Arc::new(UdpTransportInner {
                socket,
                target,
            }),
        })
    }
}

impl Transport for UdpTransport {
    async fn send(&self, data: &[u8]) -> Result<()> {
        tracing::trace!(
            target: "albedo_snmp::transport",
            { snmp.target = %self.inner.target, snmp.bytes = data.len() },
            "UDP send"
        );
        self.inner.socket.send(data).await.map_err(|source| {
            Error::Network {
                target: self.inner.target,
                source,
            }
            .boxed()
        })?;
        Ok(())
    }

    async fn recv(&self, request_id: i32, recv_timeout: Duration) -> Result<(Bytes, SocketAddr)> {
        let mut buf = vec![0u8; 65535];

        match timeout(recv_timeout, self.inner.socket.recv(&mut buf)).await {
            Ok(Ok(len)) => {
                buf.truncate(len);
                tracing::trace!(
                    target: "albedo_snmp::transport",
                    { snmp.target = %self.inner.target, snmp.bytes = len },
                    "UDP recv complete"
                );
                Ok((Bytes::from(buf), self.inner.target))
            }
            Ok(Err(source)) => Err(Error::Network {
                target: self.inner.target,
                source,
            }
            .boxed()),
            Err(_) => {
                tracing::trace!(
                    target: "albedo_snmp::transport",
                    { snmp.target = %self.inner.target, snmp.request_id = request_id },
                    "UDP recv timeout"
                );
                Err(Error::Timeout {
                    target: self.inner.target,
                    elapsed: recv_timeout,
                    retries: 0,
                }
                .boxed())
            }
        }
    }

    fn peer_addr(&self) -> SocketAddr {
        self.inner.target
    }
}
