//! Datagram transports under the SNMPv2c [`Client`](crate::client::Client).
//!
//! A device session talks through one connected [`UdpTransport`]. Wire-level
//! tests script agent replies with [`MockTransport`] (feature `testing`).

mod udp;

#[cfg(any(test, feature = "testing"))]
mod mock;

pub use udp::*;

#[cfg(any(test, feature = "testing"))]
pub use mock::*;

use crate::error::Result;
use bytes::Bytes;
use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

/// One device's request/response channel.
///
/// Clones share the same socket; it is released with the last clone.
pub trait Transport: Send + Sync + Clone {
    /// Send one encoded message.
    fn send(&self, data: &[u8]) -> impl Future<Output = Result<()>> + Send;

    /// Wait up to `timeout` for the next datagram from the target.
    ///
    /// `request_id` is only for logging; matching replies to requests is the
    /// client's job.
    fn recv(
        &self,
        request_id: i32,
        timeout: Duration,
    ) -> impl Future<Output = Result<(Bytes, SocketAddr)>> + Send;

    /// The agent this transport talks to.
    fn peer_addr(&self) -> SocketAddr;
}
